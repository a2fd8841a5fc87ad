use crate::errors::FormatError;
use crate::keys::{local::ARRAY_MARKER, ValueType};

/// A value in the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `<d>` or `<dict>`
    Dict(Dict),

    /// `<s>`
    String(String),

    /// `<i>`
    Int(i64),

    /// `<r>`
    Real(f64),

    /// `<t/>`. False is the absence of the pair, so a dictionary drops a
    /// pair when it is set to false.
    Bool(bool),
}

impl Node {
    /// Parse scalar text as the given type.
    ///
    /// Booleans accept `1`, `t`, and `true` (case-insensitive) as true and
    /// anything else as false.
    pub fn from_text(text: &str, kind: ValueType) -> Result<Node, FormatError> {
        match kind {
            ValueType::String => Ok(Node::String(text.to_string())),
            ValueType::Int => text
                .trim()
                .parse()
                .map(Node::Int)
                .map_err(|_| FormatError::InvalidScalar {
                    tag: "i",
                    value: text.to_string(),
                }),
            ValueType::Real => text
                .trim()
                .parse()
                .map(Node::Real)
                .map_err(|_| FormatError::InvalidScalar {
                    tag: "r",
                    value: text.to_string(),
                }),
            ValueType::Bool => {
                let text = text.trim();
                let truthy = text == "1"
                    || text.eq_ignore_ascii_case("t")
                    || text.eq_ignore_ascii_case("true");
                Ok(Node::Bool(truthy))
            }
        }
    }

    /// The scalar type of this node, `None` for dictionaries
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Node::Dict(_) => None,
            Node::String(_) => Some(ValueType::String),
            Node::Int(_) => Some(ValueType::Int),
            Node::Real(_) => Some(ValueType::Real),
            Node::Bool(_) => Some(ValueType::Bool),
        }
    }

    /// Text form of a scalar. Dictionaries and false render as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Node::Dict(_) => String::new(),
            Node::String(x) => x.clone(),
            Node::Int(x) => x.to_string(),
            Node::Real(x) => x.to_string(),
            Node::Bool(true) => String::from("1"),
            Node::Bool(false) => String::new(),
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Node::Dict(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Node::Dict(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(x) => Some(x),
            _ => None,
        }
    }

    /// Integer value. Strings holding a number are converted, as the game
    /// is not consistent about which ids it writes as `<s>`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::Int(x) => Some(*x),
            Node::String(x) => x.trim().parse().ok(),
            Node::Bool(x) => Some(i64::from(*x)),
            _ => None,
        }
    }
}

impl From<Dict> for Node {
    fn from(x: Dict) -> Self {
        Node::Dict(x)
    }
}

impl From<&str> for Node {
    fn from(x: &str) -> Self {
        Node::String(x.to_string())
    }
}

impl From<String> for Node {
    fn from(x: String) -> Self {
        Node::String(x)
    }
}

impl From<i64> for Node {
    fn from(x: i64) -> Self {
        Node::Int(x)
    }
}

impl From<bool> for Node {
    fn from(x: bool) -> Self {
        Node::Bool(x)
    }
}

/// An ordered sequence of key and value pairs.
///
/// Lookups are by key; insertion order is kept so re-serialized documents
/// stay close to the source. Arrays are dictionaries whose first pair is the
/// `_isArr` marker followed by `k_0`, `k_1`, ... entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict {
    entries: Vec<(String, Node)>,
}

impl Dict {
    /// An empty dictionary
    pub const fn new() -> Dict {
        Dict {
            entries: Vec::new(),
        }
    }

    /// An empty array: a dictionary holding only the array marker
    pub fn array() -> Dict {
        let mut result = Dict::new();
        result.set(ARRAY_MARKER, Node::Bool(true));
        result
    }

    /// True if the first pair is the array marker
    pub fn is_array(&self) -> bool {
        matches!(self.entries.first(), Some((k, Node::Bool(true))) if k == ARRAY_MARKER)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key and value pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over key and value pairs in order, with mutable values
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// The pair at a given position
    pub fn get_index(&self, index: usize) -> Option<(&str, &Node)> {
        self.entries.get(index).map(|(k, v)| (k.as_str(), v))
    }

    /// The pair at a given position, with a mutable value
    pub fn get_index_mut(&mut self, index: usize) -> Option<(&str, &mut Node)> {
        self.entries.get_mut(index).map(|(k, v)| (k.as_str(), v))
    }

    /// Position of the first pair with the given key
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Find the value of the first pair with the given key
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Find the value of the first pair with the given key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Replace the value of an existing pair in place, or append a new pair.
    /// Setting `Bool(false)` removes the pair.
    pub fn set<K: Into<String>>(&mut self, key: K, value: Node) {
        let key = key.into();
        if matches!(value, Node::Bool(false)) {
            self.remove(&key);
            return;
        }

        match self.get_mut(&key) {
            Some(existing) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// [`Dict::set`] with a value given as text of a declared type
    pub fn set_text<K: Into<String>>(
        &mut self,
        key: K,
        text: &str,
        kind: ValueType,
    ) -> Result<(), FormatError> {
        let value = Node::from_text(text, kind)?;
        self.set(key, value);
        Ok(())
    }

    /// Insert a pair at a position, shifting later pairs back. Inserting
    /// `Bool(false)` removes any pair with that key instead.
    pub fn insert<K: Into<String>>(&mut self, index: usize, key: K, value: Node) {
        let key = key.into();
        if matches!(value, Node::Bool(false)) {
            self.remove(&key);
            return;
        }

        let index = index.min(self.entries.len());
        self.entries.insert(index, (key, value));
    }

    /// Remove the first pair with the given key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let index = self.position(key)?;
        Some(self.entries.remove(index).1)
    }

    /// Remove the pair at a position
    pub fn remove_index(&mut self, index: usize) -> Option<(String, Node)> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// Change the key of the pair at a position
    pub fn rename_index<K: Into<String>>(&mut self, index: usize, key: K) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.0 = key.into();
        }
    }

    /// The dictionary stored under a key, created and appended if absent
    /// or if the key holds a scalar
    pub fn dict_entry<K: Into<String>>(&mut self, key: K) -> &mut Dict {
        let key = key.into();
        let index = match self.position(&key) {
            Some(index) => {
                if !matches!(self.entries[index].1, Node::Dict(_)) {
                    self.entries[index].1 = Node::Dict(Dict::new());
                }
                index
            }
            None => {
                self.entries.push((key, Node::Dict(Dict::new())));
                self.entries.len() - 1
            }
        };

        match &mut self.entries[index].1 {
            Node::Dict(x) => x,
            _ => unreachable!("entry was just set to a dictionary"),
        }
    }
}

impl FromIterator<(String, Node)> for Dict {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Dict {
            entries: iter
                .into_iter()
                .filter(|(_, v)| !matches!(v, Node::Bool(false)))
                .collect(),
        }
    }
}

impl IntoIterator for Dict {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
