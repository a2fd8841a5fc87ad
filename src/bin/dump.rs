//! Decode a save file or a shared level and print its XML.
//!
//! `save` accepts `CCLocalLevels.dat` and `CCGameManager.dat`, `level`
//! accepts `.gmd`, `.gmd2`, and `.lvl` files, and `meta` prints the JSON
//! summary stored in a `.gmd2` archive.

use gdshare::{share, SaveFile};
use std::error;
use std::io::{self, Write};
use std::path::Path;

fn main() -> Result<(), Box<dyn error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 3 {
        let program = args.first().map_or("dump", String::as_str);
        eprintln!("Usage: {} <save|level|meta> <file>", program);
        std::process::exit(1);
    }

    let body_type = &args[1];
    let file_path = Path::new(&args[2]);

    let mut stdout = io::stdout().lock();
    match body_type.as_str() {
        "save" => {
            let file = SaveFile::open(file_path)?;
            stdout.write_all(file.print(true).as_bytes())?;
        }
        "level" => {
            let level = share::import(file_path)?;
            stdout.write_all(level.print(true).as_bytes())?;
        }
        "meta" => {
            let data = std::fs::read(file_path)?;
            match share::archive_meta(&data)? {
                Some(meta) => writeln!(stdout, "{}", serde_json::to_string_pretty(&meta)?)?,
                None => {
                    eprintln!("{} has no readable metadata", file_path.display());
                    std::process::exit(1);
                }
            }
        }
        _ => {
            eprintln!(
                "Error: body type must be 'save', 'level', or 'meta', got '{}'",
                body_type
            );
            std::process::exit(1);
        }
    }

    Ok(())
}
