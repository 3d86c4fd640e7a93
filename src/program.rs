// Console program - seed the store from CSV, then run the numbered menu.
//
// All reads and writes go through injected handles so the whole loop can be
// driven from tests with a Cursor and a Vec.

use anyhow::Result;
use rusqlite::Connection;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::db::{self, SeedRecord};
use crate::employee::{format_currency, Employee};
use crate::importer::{self, ImportError};

/// Number of menu entries. The last one exits.
pub const MAX_MENU_CHOICES: u32 = 10;

/// Actor recorded on the audit trail for menu-driven changes.
pub const CONSOLE_ACTOR: &str = "console";

// ============================================================================
// SEEDING
// ============================================================================

/// Seed the store from the employee CSV, but only when the store is empty.
///
/// A missing or empty file is reported and the program carries on with
/// whatever the store holds; a malformed row is fatal.
pub fn ensure_seeded(conn: &Connection, csv_path: &Path, out: &mut impl Write) -> Result<()> {
    if db::count_employees(conn)? > 0 {
        return Ok(());
    }

    let mut imported = Vec::new();
    match importer::import_csv(csv_path, &mut imported) {
        Ok(count) => {
            // Checksum before any insert: a read failure here leaves the
            // store empty, so the next run can seed again.
            let checksum = importer::file_checksum(csv_path)?;

            db::seed_employees(conn, &imported)?;

            let record = SeedRecord::new(&csv_path.display().to_string(), &checksum, count as i64);
            db::record_seed(conn, &record)?;

            writeln!(
                out,
                "✓ Seeded {} employees from {}",
                count,
                csv_path.display()
            )?;
        }
        Err(ImportError::FileNotFound { path }) => {
            writeln!(
                out,
                "✗ The employee file {} could not be found. Starting with an empty roster.",
                path.display()
            )?;
        }
        Err(ImportError::EmptyFile { path }) => {
            writeln!(
                out,
                "✗ The employee file {} is empty. Starting with an empty roster.",
                path.display()
            )?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

// ============================================================================
// MENU LOOP
// ============================================================================

/// Seed if needed, then run the menu against real stdin/stdout.
pub fn run(conn: &Connection, csv_path: &Path) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut input = stdin.lock();
    let mut output = stdout.lock();

    ensure_seeded(conn, csv_path, &mut output)?;
    run_loop(conn, &mut input, &mut output)
}

/// Display the menu, dispatch selections, repeat until exit or end of input.
pub fn run_loop(conn: &Connection, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    loop {
        let selection = match display_menu_and_get_selection(input, out)? {
            Some(choice) => choice,
            // Input closed; same as choosing exit.
            None => break,
        };

        if selection == MAX_MENU_CHOICES {
            break;
        }

        dispatch(conn, selection, input, out)?;
    }

    writeln!(out, "\n👋 Goodbye!")?;
    Ok(())
}

fn print_menu(out: &mut impl Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "📋 Employee Records")?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(out, " 1. List all employees")?;
    writeln!(out, " 2. Find an employee by number")?;
    writeln!(out, " 3. Search employees by last name")?;
    writeln!(out, " 4. Add a new employee")?;
    writeln!(out, " 5. Change an employee's weekly salary")?;
    writeln!(out, " 6. Give an employee a raise")?;
    writeln!(out, " 7. Remove an employee")?;
    writeln!(out, " 8. Show an employee's history")?;
    writeln!(out, " 9. Browse the roster (full screen)")?;
    writeln!(out, "10. Exit")?;
    Ok(())
}

/// Keep prompting until the user enters a number on the menu, re-displaying
/// the menu after a bad entry. `None` means the input stream ended.
fn display_menu_and_get_selection(
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<u32>> {
    loop {
        print_menu(out)?;
        write!(out, "Your selection: ")?;
        out.flush()?;

        let line = match read_line(input)? {
            Some(line) => line,
            None => return Ok(None),
        };

        match line.parse::<u32>() {
            Ok(choice) if (1..=MAX_MENU_CHOICES).contains(&choice) => return Ok(Some(choice)),
            _ => writeln!(
                out,
                "✗ Please enter a number between 1 and {}.",
                MAX_MENU_CHOICES
            )?,
        }
    }
}

fn dispatch(
    conn: &Connection,
    choice: u32,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    match choice {
        1 => list_all_employees(conn, out),
        2 => find_employee(conn, input, out),
        3 => search_by_last_name(conn, input, out),
        4 => add_employee(conn, input, out),
        5 => change_weekly_salary(conn, input, out),
        6 => give_raise(conn, input, out),
        7 => remove_employee(conn, input, out),
        8 => show_history(conn, input, out),
        9 => launch_browser(conn, out),
        // Selection is validated before dispatch.
        _ => Ok(()),
    }
}

// ============================================================================
// PROMPT HELPERS
// ============================================================================

/// Read one trimmed line. `None` means end of input.
fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_text(
    input: &mut impl BufRead,
    out: &mut impl Write,
    label: &str,
) -> Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    read_line(input)
}

/// Prompt for an employee number. A non-integer entry cancels back to the
/// menu with a message.
fn prompt_i64(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<i64>> {
    let line = match prompt_text(input, out, label)? {
        Some(line) => line,
        None => return Ok(None),
    };

    match line.parse::<i64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            writeln!(out, "✗ That is not a whole number.")?;
            Ok(None)
        }
    }
}

fn prompt_f64(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<f64>> {
    let line = match prompt_text(input, out, label)? {
        Some(line) => line,
        None => return Ok(None),
    };

    match line.parse::<f64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            writeln!(out, "✗ That is not a number.")?;
            Ok(None)
        }
    }
}

// ============================================================================
// MENU HANDLERS
// ============================================================================

fn list_all_employees(conn: &Connection, out: &mut impl Write) -> Result<()> {
    let employees = db::all_employees(conn)?;

    if employees.is_empty() {
        writeln!(out, "The roster is empty.")?;
        return Ok(());
    }

    writeln!(out)?;
    for employee in &employees {
        writeln!(out, "{:>4}  {}", employee.id.unwrap_or_default(), employee)?;
    }

    Ok(())
}

fn find_employee(conn: &Connection, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let id = match prompt_i64(input, out, "Employee number: ")? {
        Some(id) => id,
        None => return Ok(()),
    };

    match db::get_employee(conn, id)? {
        Some(employee) => {
            writeln!(out, "\n{employee}")?;
            writeln!(out, "Yearly salary: {}", employee.formatted_yearly_salary())?;
        }
        None => writeln!(out, "✗ No employee with number {id}.")?,
    }

    Ok(())
}

fn search_by_last_name(
    conn: &Connection,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let last_name = match prompt_text(input, out, "Last name: ")? {
        Some(name) => name,
        None => return Ok(()),
    };

    let matches = db::find_by_last_name(conn, &last_name)?;

    if matches.is_empty() {
        writeln!(out, "✗ No employees with the last name {last_name}.")?;
        return Ok(());
    }

    writeln!(out)?;
    for employee in &matches {
        writeln!(out, "{:>4}  {}", employee.id.unwrap_or_default(), employee)?;
    }

    Ok(())
}

fn add_employee(conn: &Connection, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let first_name = match prompt_text(input, out, "First name: ")? {
        Some(name) => name,
        None => return Ok(()),
    };
    let last_name = match prompt_text(input, out, "Last name: ")? {
        Some(name) => name,
        None => return Ok(()),
    };
    let weekly_salary = match prompt_f64(input, out, "Weekly salary: ")? {
        Some(value) => value,
        None => return Ok(()),
    };

    let employee = Employee::new(first_name, last_name, weekly_salary);
    let stored = db::insert_employee(conn, &employee, CONSOLE_ACTOR)?;

    writeln!(
        out,
        "✓ Added employee {} ({} {})",
        stored.id.unwrap_or_default(),
        stored.first_name,
        stored.last_name
    )?;

    Ok(())
}

fn change_weekly_salary(
    conn: &Connection,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let id = match prompt_i64(input, out, "Employee number: ")? {
        Some(id) => id,
        None => return Ok(()),
    };
    let new_salary = match prompt_f64(input, out, "New weekly salary: ")? {
        Some(value) => value,
        None => return Ok(()),
    };

    if db::update_weekly_salary(conn, id, new_salary, CONSOLE_ACTOR)? {
        writeln!(
            out,
            "✓ Weekly salary for employee {} is now {}",
            id,
            format_currency(new_salary)
        )?;
    } else {
        writeln!(out, "✗ No employee with number {id}.")?;
    }

    Ok(())
}

fn give_raise(conn: &Connection, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let id = match prompt_i64(input, out, "Employee number: ")? {
        Some(id) => id,
        None => return Ok(()),
    };
    let percentage = match prompt_f64(input, out, "Raise percentage: ")? {
        Some(value) => value,
        None => return Ok(()),
    };

    match db::apply_raise(conn, id, percentage, CONSOLE_ACTOR)? {
        Some(employee) => writeln!(
            out,
            "✓ New weekly salary: {}",
            employee.formatted_weekly_salary()
        )?,
        None => writeln!(out, "✗ No employee with number {id}.")?,
    }

    Ok(())
}

fn remove_employee(
    conn: &Connection,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let id = match prompt_i64(input, out, "Employee number: ")? {
        Some(id) => id,
        None => return Ok(()),
    };

    if !db::delete_employee(conn, id, CONSOLE_ACTOR)? {
        writeln!(out, "✗ No employee with number {id}.")?;
        return Ok(());
    }

    writeln!(out, "✓ Employee {id} removed.")?;

    // Query the store again to confirm the row is really gone.
    match db::get_employee(conn, id)? {
        None => writeln!(out, "✓ Verified: employee {id} no longer exists.")?,
        Some(_) => writeln!(out, "✗ Verification failed: employee {id} is still present!")?,
    }

    Ok(())
}

fn show_history(conn: &Connection, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let line = match prompt_text(input, out, "Employee number (blank for recent activity): ")? {
        Some(line) => line,
        None => return Ok(()),
    };

    if line.is_empty() {
        return show_recent_activity(conn, out);
    }

    let id = match line.parse::<i64>() {
        Ok(id) => id,
        Err(_) => {
            writeln!(out, "✗ That is not a whole number.")?;
            return Ok(());
        }
    };

    let events = db::events_for_employee(conn, id)?;

    if events.is_empty() {
        writeln!(out, "No history for employee {id}.")?;
        return Ok(());
    }

    match db::get_employee(conn, id)? {
        Some(employee) => writeln!(out, "\n{}", employee.full_name())?,
        None => writeln!(out, "\n(employee {id} is no longer on the roster)")?,
    }

    for event in &events {
        writeln!(
            out,
            "{}  {:<16} {} [{}]",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            event.data,
            event.actor
        )?;
    }

    Ok(())
}

/// Most recent events across the whole store, newest first.
fn show_recent_activity(conn: &Connection, out: &mut impl Write) -> Result<()> {
    let events = db::recent_events(conn, 10)?;

    if events.is_empty() {
        writeln!(out, "No activity recorded yet.")?;
        return Ok(());
    }

    writeln!(out)?;
    for event in &events {
        writeln!(
            out,
            "{}  {:<16} employee {:<4} {} [{}]",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            event.employee_id,
            event.data,
            event.actor
        )?;
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn launch_browser(conn: &Connection, out: &mut impl Write) -> Result<()> {
    crate::ui::browse_roster(conn)?;
    writeln!(out, "✓ Roster browser closed")?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn launch_browser(_conn: &Connection, out: &mut impl Write) -> Result<()> {
    writeln!(out, "✗ The roster browser is not available in this build.")?;
    writeln!(out, "  Rebuild with: cargo build --features tui")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
