// Employee Records - Core Library
// Exposes all modules for use in the console program and tests

pub mod db;
pub mod employee;
pub mod importer;
pub mod program;

// Full-screen roster browser, only built with the TUI stack
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use db::{
    EmployeeEvent, RosterStats, SeedRecord,
    setup_store, insert_employee, seed_employees,
    all_employees, get_employee, find_by_last_name, count_employees,
    update_weekly_salary, apply_raise, delete_employee,
    insert_event, events_for_employee, recent_events,
    record_seed, last_seed, roster_stats,
};
pub use employee::{format_currency, Employee};
pub use importer::{file_checksum, import_csv, ImportError, ImportResult};
pub use program::{ensure_seeded, run, run_loop, MAX_MENU_CHOICES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
