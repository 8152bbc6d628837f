//! `sd_store` - `DuckDB` storage layer for Shop Desk
//!
//! This crate provides:
//! - `DuckDB` connection management
//! - Schema creation and seeding for the scheduling tables
//! - Typed row inserts and read-all queries
//! - Natural-key resolution (customer name to surrogate key)

use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, instrument};

pub mod schema;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] duckdb::Error),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A customer row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

/// A mechanic row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mechanic {
    pub id: i64,
    pub name: String,
    pub hourly_rate: f64,
}

/// A service bay row; `mechanic_id` is null while the bay is unassigned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bay {
    pub id: i64,
    pub mechanic_id: Option<i64>,
}

/// A vehicle row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub customer_id: i64,
    pub description: String,
}

/// A service type row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub duration_minutes: i64,
}

/// An appointment row; `appointment_time` is RFC 3339 text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub vehicle_id: i64,
    pub service_id: i64,
    pub bay_id: i64,
    pub appointment_time: Option<String>,
}

/// Main storage handle
pub struct ShopStore {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl ShopStore {
    /// Open or create database at path
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if directory creation or database opening fails.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!(path = %path.display(), "Opening DuckDB database");

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.to_string_lossy().to_string(),
        })
    }

    /// Open in-memory database (for testing)
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if in-memory database setup fails.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: ":memory:".to_string(),
        })
    }

    /// Get access to the underlying connection
    #[must_use]
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Get database path
    #[must_use]
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Check whether the schema has already been created.
    ///
    /// Presence is judged by the sentinel table alone; the comparison is
    /// case-insensitive so a mixed-case creation cannot defeat the check.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the catalog query fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn schema_exists(&self) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        table_exists(&conn, schema::SENTINEL_TABLE)
    }

    /// Create the schema if it is not already present.
    ///
    /// Tables are created in dependency order (parents before children) and
    /// the mechanics, bays, and services tables are seeded with their fixed
    /// default rows. Returns `true` when the schema was created by this call,
    /// `false` when it was already present (the call is then a no-op).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if creating or seeding any table fails; no
    /// partial schema is retried or cleaned up, the error is fatal for the
    /// caller's run.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn ensure_schema(&self) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();

        if table_exists(&conn, schema::SENTINEL_TABLE)? {
            debug!("Schema already present");
            return Ok(false);
        }

        for table in schema::ALL_TABLES {
            info!(table = table.name, "Creating table");
            conn.execute_batch(table.create).map_err(|e| {
                StoreError::SchemaError(format!("Failed to create table {}: {e}", table.name))
            })?;

            if let Some(seed) = table.seed {
                debug!(table = table.name, "Seeding table");
                conn.execute_batch(seed).map_err(|e| {
                    StoreError::SchemaError(format!("Failed to seed table {}: {e}", table.name))
                })?;
            }
        }

        info!("Schema created");
        Ok(true)
    }

    /// Drop all tables and their sequences, children before parents.
    ///
    /// Uses drop-if-exists semantics so absent tables are not errors. Used
    /// only for test and reset paths.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a drop statement fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn teardown_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        for table in schema::ALL_TABLES.iter().rev() {
            debug!(table = table.name, "Dropping table");
            conn.execute_batch(&format!(
                "DROP TABLE IF EXISTS {}; DROP SEQUENCE IF EXISTS {};",
                table.name, table.sequence
            ))?;
        }

        info!("Schema dropped");
        Ok(())
    }

    /// Insert a customer row, returning its new surrogate key.
    ///
    /// Names are not checked for uniqueness; duplicates are permitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn insert_customer(&self, name: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let id: i64 = conn.query_row(
            "INSERT INTO customers (name) VALUES (?) RETURNING id",
            duckdb::params![name],
            |row| row.get(0),
        )?;
        debug!(id, name, "Inserted customer");
        Ok(id)
    }

    /// Insert a vehicle row, returning its new surrogate key.
    ///
    /// `customer_id` must reference an existing customer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails (including a foreign-key
    /// violation for an unknown customer id).
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn insert_vehicle(&self, customer_id: i64, description: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let id: i64 = conn.query_row(
            "INSERT INTO vehicles (customer_id, description) VALUES (?, ?) RETURNING id",
            duckdb::params![customer_id, description],
            |row| row.get(0),
        )?;
        debug!(id, customer_id, description, "Inserted vehicle");
        Ok(id)
    }

    /// Resolve a customer name to its surrogate key.
    ///
    /// Exact-match lookup; when several customers share the name, the first
    /// match by ascending id is authoritative. Returns `Ok(None)` when no row
    /// matches - not-found is a policy decision for the caller, never an
    /// error here.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails with a database error.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn find_customer_id(&self, name: &str) -> Result<Option<i64>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id FROM customers WHERE name = ? ORDER BY id ASC LIMIT 1",
            duckdb::params![name],
            |row| row.get(0),
        );

        match result {
            Ok(id) => Ok(Some(id)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all customers ordered by id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query preparation or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name FROM customers ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Customer {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut customers = Vec::new();
        for row in rows {
            customers.push(row?);
        }
        Ok(customers)
    }

    /// List all mechanics ordered by id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query preparation or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn list_mechanics(&self) -> Result<Vec<Mechanic>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, CAST(hourly_rate AS DOUBLE) FROM mechanics ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Mechanic {
                id: row.get(0)?,
                name: row.get(1)?,
                hourly_rate: row.get(2)?,
            })
        })?;

        let mut mechanics = Vec::new();
        for row in rows {
            mechanics.push(row?);
        }
        Ok(mechanics)
    }

    /// List all bays ordered by id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query preparation or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn list_bays(&self) -> Result<Vec<Bay>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, mechanic_id FROM bays ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Bay {
                id: row.get(0)?,
                mechanic_id: row.get(1)?,
            })
        })?;

        let mut bays = Vec::new();
        for row in rows {
            bays.push(row?);
        }
        Ok(bays)
    }

    /// List all vehicles ordered by id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query preparation or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, customer_id, description FROM vehicles ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Vehicle {
                id: row.get(0)?,
                customer_id: row.get(1)?,
                description: row.get(2)?,
            })
        })?;

        let mut vehicles = Vec::new();
        for row in rows {
            vehicles.push(row?);
        }
        Ok(vehicles)
    }

    /// List all services ordered by id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query preparation or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name, duration_minutes FROM services ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Service {
                id: row.get(0)?,
                name: row.get(1)?,
                duration_minutes: row.get(2)?,
            })
        })?;

        let mut services = Vec::new();
        for row in rows {
            services.push(row?);
        }
        Ok(services)
    }

    /// List all appointments ordered by id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if query preparation or row decoding fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn list_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, vehicle_id, service_id, bay_id, CAST(appointment_time AS VARCHAR) \
             FROM schedule ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Appointment {
                id: row.get(0)?,
                vehicle_id: row.get(1)?,
                service_id: row.get(2)?,
                bay_id: row.get(3)?,
                appointment_time: row.get(4)?,
            })
        })?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?);
        }
        Ok(appointments)
    }

    /// Count rows in one of the known tables
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the table name is not part of the schema or
    /// the count query fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal database mutex is poisoned.
    pub fn count_rows(&self, table: &str) -> Result<i64, StoreError> {
        if !schema::is_known_table(table) {
            return Err(StoreError::SchemaError(format!("Unknown table: {table}")));
        }
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}

/// Case-insensitive table existence check against the catalog.
fn table_exists(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM information_schema.tables WHERE lower(table_name) = lower(?)",
        duckdb::params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> ShopStore {
        let store = ShopStore::open_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    // =============================================================================
    // Schema Tests
    // =============================================================================

    #[test]
    fn test_open_memory() {
        let store = ShopStore::open_memory().unwrap();
        assert_eq!(store.db_path(), ":memory:");
    }

    #[test]
    fn test_schema_absent_until_ensured() {
        let store = ShopStore::open_memory().unwrap();
        assert!(!store.schema_exists().unwrap());
        assert!(store.ensure_schema().unwrap());
        assert!(store.schema_exists().unwrap());
    }

    #[test]
    fn test_ensure_schema_creates_all_tables() {
        let store = seeded_store();
        for table in schema::ALL_TABLES {
            // count_rows fails if the table does not exist
            assert!(store.count_rows(table.name).is_ok(), "{} missing", table.name);
        }
    }

    #[test]
    fn test_ensure_schema_idempotent() {
        let store = seeded_store();
        // Second call is a no-op and must not duplicate seed rows
        assert!(!store.ensure_schema().unwrap());
        assert_eq!(store.count_rows(schema::tables::MECHANICS).unwrap(), 2);
        assert_eq!(store.count_rows(schema::tables::BAYS).unwrap(), 2);
        assert_eq!(store.count_rows(schema::tables::SERVICES).unwrap(), 3);
    }

    #[test]
    fn test_seed_mechanics() {
        let store = seeded_store();
        let mechanics = store.list_mechanics().unwrap();
        assert_eq!(mechanics.len(), 2);
        assert_eq!(mechanics[0].id, 1);
        assert_eq!(mechanics[0].name, "Sue");
        assert!((mechanics[0].hourly_rate - 10.0).abs() < f64::EPSILON);
        assert_eq!(mechanics[1].id, 2);
        assert_eq!(mechanics[1].name, "Steve");
        assert!((mechanics[1].hourly_rate - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_seed_bays_assigned_by_position() {
        let store = seeded_store();
        let bays = store.list_bays().unwrap();
        assert_eq!(bays.len(), 2);
        assert_eq!(bays[0].mechanic_id, Some(1));
        assert_eq!(bays[1].mechanic_id, Some(2));
    }

    #[test]
    fn test_seed_services() {
        let store = seeded_store();
        let services = store.list_services().unwrap();
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].name, "Oil Change");
        assert_eq!(services[0].duration_minutes, 30);
        assert_eq!(services[1].name, "Tire Replacement");
        assert_eq!(services[1].duration_minutes, 60);
        assert_eq!(services[2].name, "Brakes");
        assert_eq!(services[2].duration_minutes, 180);
    }

    #[test]
    fn test_customers_and_vehicles_not_seeded() {
        let store = seeded_store();
        assert_eq!(store.count_rows(schema::tables::CUSTOMERS).unwrap(), 0);
        assert_eq!(store.count_rows(schema::tables::VEHICLES).unwrap(), 0);
        assert_eq!(store.count_rows(schema::tables::SCHEDULE).unwrap(), 0);
    }

    #[test]
    fn test_teardown_schema() {
        let store = seeded_store();
        store.teardown_schema().unwrap();
        assert!(!store.schema_exists().unwrap());
        // Dropping an already-dropped schema is not an error
        store.teardown_schema().unwrap();
    }

    #[test]
    fn test_teardown_then_ensure_reseeds() {
        let store = seeded_store();
        store.insert_customer("John Smith").unwrap();
        store.teardown_schema().unwrap();
        assert!(store.ensure_schema().unwrap());
        assert_eq!(store.count_rows(schema::tables::CUSTOMERS).unwrap(), 0);
        assert_eq!(store.count_rows(schema::tables::MECHANICS).unwrap(), 2);
    }

    // =============================================================================
    // Insert Tests
    // =============================================================================

    #[test]
    fn test_insert_customer_ids_monotonic() {
        let store = seeded_store();
        let first = store.insert_customer("John Smith").unwrap();
        let second = store.insert_customer("Jane Doe").unwrap();
        let third = store.insert_customer("John Smith").unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, 3);
    }

    #[test]
    fn test_insert_customer_duplicates_permitted() {
        let store = seeded_store();
        store.insert_customer("John Smith").unwrap();
        store.insert_customer("John Smith").unwrap();
        assert_eq!(store.count_rows(schema::tables::CUSTOMERS).unwrap(), 2);
    }

    #[test]
    fn test_insert_vehicle() {
        let store = seeded_store();
        let customer_id = store.insert_customer("John Smith").unwrap();
        let vehicle_id = store.insert_vehicle(customer_id, "Honda Civic").unwrap();
        assert_eq!(vehicle_id, 1);

        let vehicles = store.list_vehicles().unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].customer_id, customer_id);
        assert_eq!(vehicles[0].description, "Honda Civic");
    }

    #[test]
    fn test_insert_vehicle_unknown_customer_rejected() {
        let store = seeded_store();
        let result = store.insert_vehicle(99, "Ghost Car");
        assert!(result.is_err());
        assert_eq!(store.count_rows(schema::tables::VEHICLES).unwrap(), 0);
    }

    // =============================================================================
    // Resolver Tests
    // =============================================================================

    #[test]
    fn test_find_customer_id_hit() {
        let store = seeded_store();
        let id = store.insert_customer("John Smith").unwrap();
        assert_eq!(store.find_customer_id("John Smith").unwrap(), Some(id));
    }

    #[test]
    fn test_find_customer_id_miss() {
        let store = seeded_store();
        store.insert_customer("John Smith").unwrap();
        assert_eq!(store.find_customer_id("Unknown Person").unwrap(), None);
    }

    #[test]
    fn test_find_customer_id_exact_match_only() {
        let store = seeded_store();
        store.insert_customer("John Smith").unwrap();
        assert_eq!(store.find_customer_id("john smith").unwrap(), None);
        assert_eq!(store.find_customer_id("John").unwrap(), None);
    }

    #[test]
    fn test_find_customer_id_first_match_authoritative() {
        let store = seeded_store();
        let first = store.insert_customer("John Smith").unwrap();
        store.insert_customer("John Smith").unwrap();
        assert_eq!(store.find_customer_id("John Smith").unwrap(), Some(first));
    }

    // =============================================================================
    // Query Tests
    // =============================================================================

    #[test]
    fn test_list_customers_ordered_by_id() {
        let store = seeded_store();
        store.insert_customer("Bravo").unwrap();
        store.insert_customer("Alpha").unwrap();
        let customers = store.list_customers().unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].name, "Bravo");
        assert_eq!(customers[1].name, "Alpha");
        assert!(customers[0].id < customers[1].id);
    }

    #[test]
    fn test_list_appointments_empty() {
        let store = seeded_store();
        assert!(store.list_appointments().unwrap().is_empty());
    }

    #[test]
    fn test_count_rows_unknown_table() {
        let store = seeded_store();
        let result = store.count_rows("no_such_table");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown table"));
    }

    // =============================================================================
    // Persistence Tests
    // =============================================================================

    #[test]
    fn test_schema_check_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.duckdb");

        {
            let store = ShopStore::open(&path).unwrap();
            assert!(store.ensure_schema().unwrap());
            store.insert_customer("John Smith").unwrap();
        }

        let store = ShopStore::open(&path).unwrap();
        assert!(!store.ensure_schema().unwrap());
        let customers = store.list_customers().unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "John Smith");
    }
}
