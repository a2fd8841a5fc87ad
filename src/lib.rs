/*!

Read, edit, and write [Geometry Dash](https://en.wikipedia.org/wiki/Geometry_Dash) save files,
and share single levels as files.

The game keeps the player's created levels in `CCLocalLevels.dat` and account
data in `CCGameManager.dat`. Both are XML property lists that have been
gzipped, XOR'd, and base64 encoded. gdshare undoes that envelope, exposes the
property list as a tree, and layers typed accessors for levels on top.

## Features

- ✔ Lossless: decode and re-encode a save without disturbing unrelated keys
- ✔ Typed: level keys are addressed by name through a registry of protocol ids
- ✔ Safe: saves are written atomically and hostile input is bounded in depth
- ✔ Portable: export levels as `.gmd`, `.gmd2`, or `.lvl` and import them back

## Quick Start

Open the level list, look a level up by name, and export it.

```rust,no_run
use gdshare::{LocalLevels, NoProgress, ShareFormat};

let mut store = LocalLevels::open_default()?;
for level in store.levels() {
    println!("{} by {} ({} objects)", level.name(), level.creator(), level.object_count()?);
}

store.export_level("my level", "exports/", ShareFormat::Gmd2)?;
store.import_level_from("downloads/Bloodbath.gmd")?;
store.save(true, NoProgress)?;
# Ok::<(), gdshare::Error>(())
```

## Levels

A [`Level`] is a view over one level's dictionary. Keys can be read and
written by their registry name, and the layered values (the base64
description, the compressed object string) are decoded on access.

```rust
use gdshare::{Level, LevelLength};

let mut level = Level::new();
level.set_name("Stereo Madness 2");
level.set_key("length", "3")?;
level.set_data("kS38,1_40_2_125;1,1,2,15,3,15;");

assert_eq!(level.length()?, LevelLength::Long);
assert_eq!(level.object_count()?, 1);
# Ok::<(), gdshare::Error>(())
```

## One Level Lower

The envelope transforms live in [`codec`] and the property list tree in
[`plist`], for when a save needs to be inspected without the typed layer.

```rust
use gdshare::codec;
use gdshare::keys::FILE_KEY;
use gdshare::plist::Document;

let xml = r#"<?xml version="1.0"?><plist version="1.0" gjver="2.0"><dict><k>LLM_02</k><i>35</i></dict></plist>"#;
let file = codec::encode_envelope(xml, FILE_KEY);

let text = codec::decode_envelope(&file, FILE_KEY)?;
let doc = Document::parse(&text)?;
assert_eq!(doc.print(false), xml);
# Ok::<(), Box<dyn std::error::Error>>(())
```

*/

mod ccfile;
pub mod codec;
mod errors;
pub mod keys;
mod level;
pub mod plist;
pub mod share;

pub use self::ccfile::*;
pub use self::errors::*;
pub use self::level::{sort_levels, Level, LevelLength, SortOrder};
pub use self::share::ShareFormat;
