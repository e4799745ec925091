//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `uniact_core` linkage and schema
//!   bootstrap.
//! - Keep output deterministic for quick local sanity checks.

use uniact_core::db::migrations::latest_version;
use uniact_core::db::open_db_in_memory;

fn main() {
    println!("uniact_core ping={}", uniact_core::ping());
    println!("uniact_core version={}", uniact_core::core_version());

    match open_db_in_memory() {
        Ok(_conn) => println!("uniact_core schema_version={}", latest_version()),
        Err(err) => {
            eprintln!("uniact_core bootstrap failed: {err}");
            std::process::exit(1);
        }
    }
}
