use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use payroster::{program, setup_store, VERSION};

/// CSV the roster is seeded from on first run.
const CSV_PATH: &str = "employees.csv";

/// SQLite store kept next to the program.
const DB_PATH: &str = "employees.db";

fn main() -> Result<()> {
    println!("🗄️  Employee Records v{}", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Open the store
    let conn = Connection::open(DB_PATH)
        .with_context(|| format!("Failed to open database at {}", DB_PATH))?;
    setup_store(&conn)?;
    println!("✓ Store ready at {} (WAL mode)", DB_PATH);

    // 2. Seed from CSV when empty, then run the menu
    program::run(&conn, Path::new(CSV_PATH))?;

    Ok(())
}
