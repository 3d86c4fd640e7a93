use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::employee::Employee;

/// Event for the employee audit trail. Every mutation of the roster is
/// recorded as one of these, so the store can answer "what happened to
/// employee N" long after the row itself changed or disappeared.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmployeeEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub employee_id: i64,
    pub data: serde_json::Value,
    pub actor: String,
}

impl EmployeeEvent {
    pub fn new(event_type: &str, employee_id: i64, data: serde_json::Value, actor: &str) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            employee_id,
            data,
            actor: actor.to_string(),
        }
    }
}

pub fn setup_store(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Employees Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            weekly_salary REAL NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS employee_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            employee_id INTEGER NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Seed History Table (which CSV the roster was loaded from)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS seed_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_file TEXT NOT NULL,
            checksum TEXT NOT NULL,
            row_count INTEGER NOT NULL,
            seeded_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_employees_last_name ON employees(last_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_employee ON employee_events(employee_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON employee_events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// EMPLOYEE CRUD
// ============================================================================

fn row_to_employee(row: &rusqlite::Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: Some(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        weekly_salary: row.get(3)?,
    })
}

/// Insert one employee and return it with its assigned key.
pub fn insert_employee(conn: &Connection, employee: &Employee, actor: &str) -> Result<Employee> {
    conn.execute(
        "INSERT INTO employees (first_name, last_name, weekly_salary)
         VALUES (?1, ?2, ?3)",
        params![
            employee.first_name,
            employee.last_name,
            employee.weekly_salary
        ],
    )?;

    let id = conn.last_insert_rowid();

    let event = EmployeeEvent::new(
        "employee_added",
        id,
        serde_json::json!({
            "first_name": employee.first_name,
            "last_name": employee.last_name,
            "weekly_salary": employee.weekly_salary,
        }),
        actor,
    );
    insert_event(conn, &event)?;

    Ok(employee.clone().with_id(id))
}

/// Insert every imported employee, in file order. Keys come out sequential,
/// so row 1 of the CSV becomes employee 1.
pub fn seed_employees(conn: &Connection, employees: &[Employee]) -> Result<usize> {
    let mut inserted = 0;

    for employee in employees {
        insert_employee(conn, employee, "csv_importer")?;
        inserted += 1;
    }

    Ok(inserted)
}

pub fn count_employees(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;

    Ok(count)
}

pub fn all_employees(conn: &Connection) -> Result<Vec<Employee>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, weekly_salary
         FROM employees
         ORDER BY id",
    )?;

    let employees = stmt
        .query_map([], row_to_employee)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(employees)
}

pub fn get_employee(conn: &Connection, id: i64) -> Result<Option<Employee>> {
    let employee = conn
        .query_row(
            "SELECT id, first_name, last_name, weekly_salary
             FROM employees
             WHERE id = ?1",
            params![id],
            row_to_employee,
        )
        .optional()?;

    Ok(employee)
}

/// Exact last-name match, case-insensitive.
pub fn find_by_last_name(conn: &Connection, last_name: &str) -> Result<Vec<Employee>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, weekly_salary
         FROM employees
         WHERE last_name = ?1 COLLATE NOCASE
         ORDER BY id",
    )?;

    let employees = stmt
        .query_map(params![last_name], row_to_employee)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(employees)
}

/// Set a new weekly salary. Returns false when no such employee exists.
pub fn update_weekly_salary(
    conn: &Connection,
    id: i64,
    new_salary: f64,
    actor: &str,
) -> Result<bool> {
    let existing = match get_employee(conn, id)? {
        Some(employee) => employee,
        None => return Ok(false),
    };

    conn.execute(
        "UPDATE employees SET weekly_salary = ?1 WHERE id = ?2",
        params![new_salary, id],
    )?;

    let event = EmployeeEvent::new(
        "salary_updated",
        id,
        serde_json::json!({
            "from": existing.weekly_salary,
            "to": new_salary,
        }),
        actor,
    );
    insert_event(conn, &event)?;

    Ok(true)
}

/// Apply a percentage raise to one employee's weekly salary. The arithmetic
/// lives on the entity; this persists the result and returns the updated row.
pub fn apply_raise(
    conn: &Connection,
    id: i64,
    percentage: f64,
    actor: &str,
) -> Result<Option<Employee>> {
    let mut employee = match get_employee(conn, id)? {
        Some(employee) => employee,
        None => return Ok(None),
    };

    let before = employee.weekly_salary;
    employee.apply_percentage_raise(percentage);

    conn.execute(
        "UPDATE employees SET weekly_salary = ?1 WHERE id = ?2",
        params![employee.weekly_salary, id],
    )?;

    let event = EmployeeEvent::new(
        "raise_applied",
        id,
        serde_json::json!({
            "percentage": percentage,
            "from": before,
            "to": employee.weekly_salary,
        }),
        actor,
    );
    insert_event(conn, &event)?;

    Ok(Some(employee))
}

/// Delete one employee. Returns false when no such employee exists, so a
/// second call for the same key reports the row is already gone.
pub fn delete_employee(conn: &Connection, id: i64, actor: &str) -> Result<bool> {
    let existing = match get_employee(conn, id)? {
        Some(employee) => employee,
        None => return Ok(false),
    };

    conn.execute("DELETE FROM employees WHERE id = ?1", params![id])?;

    let event = EmployeeEvent::new(
        "employee_deleted",
        id,
        serde_json::json!({
            "first_name": existing.first_name,
            "last_name": existing.last_name,
            "weekly_salary": existing.weekly_salary,
        }),
        actor,
    );
    insert_event(conn, &event)?;

    Ok(true)
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &EmployeeEvent) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO employee_events (
            event_id, timestamp, event_type, employee_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.employee_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmployeeEvent> {
    let timestamp_str: String = row.get(1)?;
    let data_json: String = row.get(4)?;

    Ok(EmployeeEvent {
        event_id: row.get(0)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|_| rusqlite::Error::InvalidQuery)?
            .with_timezone(&Utc),
        event_type: row.get(2)?,
        employee_id: row.get(3)?,
        data: serde_json::from_str(&data_json).map_err(|_| rusqlite::Error::InvalidQuery)?,
        actor: row.get(5)?,
    })
}

/// Get events for a specific employee, newest first. Works for deleted
/// employees too; the trail outlives the row.
pub fn events_for_employee(conn: &Connection, employee_id: i64) -> Result<Vec<EmployeeEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, employee_id, data, actor
         FROM employee_events
         WHERE employee_id = ?1
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![employee_id], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Most recent events across the whole roster.
pub fn recent_events(conn: &Connection, limit: i64) -> Result<Vec<EmployeeEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, employee_id, data, actor
         FROM employee_events
         ORDER BY timestamp DESC, id DESC
         LIMIT ?1",
    )?;

    let events = stmt
        .query_map(params![limit], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// SEED HISTORY
// ============================================================================

/// One seeding run: which file, which bytes, how many rows.
#[derive(Debug, Clone)]
pub struct SeedRecord {
    pub source_file: String,
    pub checksum: String,
    pub row_count: i64,
    pub seeded_at: DateTime<Utc>,
}

impl SeedRecord {
    pub fn new(source_file: &str, checksum: &str, row_count: i64) -> Self {
        Self {
            source_file: source_file.to_string(),
            checksum: checksum.to_string(),
            row_count,
            seeded_at: Utc::now(),
        }
    }
}

pub fn record_seed(conn: &Connection, record: &SeedRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO seed_history (source_file, checksum, row_count, seeded_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            record.source_file,
            record.checksum,
            record.row_count,
            record.seeded_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

pub fn last_seed(conn: &Connection) -> Result<Option<SeedRecord>> {
    let record = conn
        .query_row(
            "SELECT source_file, checksum, row_count, seeded_at
             FROM seed_history
             ORDER BY id DESC
             LIMIT 1",
            [],
            |row| {
                let seeded_at_str: String = row.get(3)?;

                Ok(SeedRecord {
                    source_file: row.get(0)?,
                    checksum: row.get(1)?,
                    row_count: row.get(2)?,
                    seeded_at: DateTime::parse_from_rfc3339(&seeded_at_str)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?
                        .with_timezone(&Utc),
                })
            },
        )
        .optional()?;

    Ok(record)
}

// ============================================================================
// ROSTER STATISTICS
// ============================================================================

/// Aggregate view of the roster, computed in SQL.
#[derive(Debug, Clone)]
pub struct RosterStats {
    pub employee_count: i64,
    pub total_weekly: f64,
    pub average_weekly: f64,
    pub min_weekly: f64,
    pub max_weekly: f64,
}

pub fn roster_stats(conn: &Connection) -> Result<RosterStats> {
    let stats = conn.query_row(
        "SELECT
            COUNT(*),
            COALESCE(SUM(weekly_salary), 0),
            COALESCE(AVG(weekly_salary), 0),
            COALESCE(MIN(weekly_salary), 0),
            COALESCE(MAX(weekly_salary), 0)
         FROM employees",
        [],
        |row| {
            Ok(RosterStats {
                employee_count: row.get(0)?,
                total_weekly: row.get(1)?,
                average_weekly: row.get(2)?,
                min_weekly: row.get(3)?,
                max_weekly: row.get(4)?,
            })
        },
    )?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_store(&conn).unwrap();
        conn
    }

    fn sample_employee(first: &str, last: &str, weekly: f64) -> Employee {
        Employee::new(first.to_string(), last.to_string(), weekly)
    }

    #[test]
    fn test_setup_store_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_store(&conn).unwrap();
        setup_store(&conn).unwrap();

        assert_eq!(count_employees(&conn).unwrap(), 0);
    }

    #[test]
    fn test_insert_assigns_sequential_keys() {
        let conn = open_test_store();

        let first = insert_employee(&conn, &sample_employee("David", "Barnes", 835.00), "test")
            .unwrap();
        let second =
            insert_employee(&conn, &sample_employee("James", "Kirk", 453.00), "test").unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(count_employees(&conn).unwrap(), 2);
    }

    #[test]
    fn test_get_employee_roundtrip() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("Kathryn", "Janeway", 184.00), "test").unwrap();

        let found = get_employee(&conn, 1).unwrap().unwrap();

        assert_eq!(found.first_name, "Kathryn");
        assert_eq!(found.last_name, "Janeway");
        assert_eq!(found.weekly_salary, 184.00);
    }

    #[test]
    fn test_get_employee_missing_key_is_none() {
        let conn = open_test_store();

        assert!(get_employee(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_all_employees_in_key_order() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("David", "Barnes", 835.00), "test").unwrap();
        insert_employee(&conn, &sample_employee("James", "Kirk", 453.00), "test").unwrap();
        insert_employee(&conn, &sample_employee("Jean-Luc", "Picard", 290.00), "test").unwrap();

        let employees = all_employees(&conn).unwrap();

        assert_eq!(employees.len(), 3);
        assert_eq!(employees[0].last_name, "Barnes");
        assert_eq!(employees[2].last_name, "Picard");
    }

    #[test]
    fn test_find_by_last_name_is_case_insensitive() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("Jean-Luc", "Picard", 290.00), "test").unwrap();
        insert_employee(&conn, &sample_employee("James", "Kirk", 453.00), "test").unwrap();

        let found = find_by_last_name(&conn, "picard").unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Jean-Luc");

        assert!(find_by_last_name(&conn, "Sisko").unwrap().is_empty());
    }

    #[test]
    fn test_update_weekly_salary() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("James", "Kirk", 453.00), "test").unwrap();

        let changed = update_weekly_salary(&conn, 1, 500.00, "test").unwrap();

        assert!(changed);
        assert_eq!(get_employee(&conn, 1).unwrap().unwrap().weekly_salary, 500.00);
    }

    #[test]
    fn test_update_missing_employee_reports_false() {
        let conn = open_test_store();

        assert!(!update_weekly_salary(&conn, 9, 500.00, "test").unwrap());
    }

    #[test]
    fn test_apply_raise_persists_new_salary() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("Benjamin", "Sisko", 100.00), "test").unwrap();

        let raised = apply_raise(&conn, 1, 10.0, "test").unwrap().unwrap();

        assert!((raised.weekly_salary - 110.00).abs() < 1e-9);

        let stored = get_employee(&conn, 1).unwrap().unwrap();
        assert!((stored.weekly_salary - 110.00).abs() < 1e-9);
    }

    #[test]
    fn test_apply_raise_missing_employee_is_none() {
        let conn = open_test_store();

        assert!(apply_raise(&conn, 7, 10.0, "test").unwrap().is_none());
    }

    #[test]
    fn test_delete_then_get_returns_none() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("Jonathan", "Archer", 135.00), "test").unwrap();

        assert!(delete_employee(&conn, 1, "test").unwrap());
        assert!(get_employee(&conn, 1).unwrap().is_none());

        // Second attempt on the same key: already gone.
        assert!(!delete_employee(&conn, 1, "test").unwrap());
    }

    #[test]
    fn test_seed_inserts_all_rows_and_logs_events() {
        let conn = open_test_store();
        let roster = vec![
            sample_employee("David", "Barnes", 835.00),
            sample_employee("James", "Kirk", 453.00),
            sample_employee("Jean-Luc", "Picard", 290.00),
        ];

        let seeded = seed_employees(&conn, &roster).unwrap();

        assert_eq!(seeded, 3);
        assert_eq!(count_employees(&conn).unwrap(), 3);

        let events = events_for_employee(&conn, 1).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "employee_added");
        assert_eq!(events[0].actor, "csv_importer");
    }

    #[test]
    fn test_events_newest_first_and_survive_deletion() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("James", "Kirk", 453.00), "test").unwrap();
        update_weekly_salary(&conn, 1, 475.00, "test").unwrap();
        delete_employee(&conn, 1, "test").unwrap();

        let events = events_for_employee(&conn, 1).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, "employee_deleted");
        assert_eq!(events[1].event_type, "salary_updated");
        assert_eq!(events[2].event_type, "employee_added");
    }

    #[test]
    fn test_recent_events_honors_limit() {
        let conn = open_test_store();
        insert_employee(&conn, &sample_employee("David", "Barnes", 835.00), "test").unwrap();
        insert_employee(&conn, &sample_employee("James", "Kirk", 453.00), "test").unwrap();
        insert_employee(&conn, &sample_employee("Jean-Luc", "Picard", 290.00), "test").unwrap();

        let events = recent_events(&conn, 2).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].employee_id, 3);
        assert_eq!(events[1].employee_id, 2);
    }

    #[test]
    fn test_seed_history_roundtrip() {
        let conn = open_test_store();

        assert!(last_seed(&conn).unwrap().is_none());

        let record = SeedRecord::new("employees.csv", "abc123", 6);
        record_seed(&conn, &record).unwrap();

        let loaded = last_seed(&conn).unwrap().unwrap();
        assert_eq!(loaded.source_file, "employees.csv");
        assert_eq!(loaded.checksum, "abc123");
        assert_eq!(loaded.row_count, 6);
    }

    #[test]
    fn test_roster_stats() {
        let conn = open_test_store();

        let empty = roster_stats(&conn).unwrap();
        assert_eq!(empty.employee_count, 0);
        assert_eq!(empty.total_weekly, 0.0);

        insert_employee(&conn, &sample_employee("David", "Barnes", 800.00), "test").unwrap();
        insert_employee(&conn, &sample_employee("James", "Kirk", 400.00), "test").unwrap();

        let stats = roster_stats(&conn).unwrap();
        assert_eq!(stats.employee_count, 2);
        assert_eq!(stats.total_weekly, 1200.00);
        assert_eq!(stats.average_weekly, 600.00);
        assert_eq!(stats.min_weekly, 400.00);
        assert_eq!(stats.max_weekly, 800.00);
    }
}
