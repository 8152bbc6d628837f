//! Schema definitions and constants

/// Table names
pub mod tables {
    pub const CUSTOMERS: &str = "customers";
    pub const MECHANICS: &str = "mechanics";
    pub const BAYS: &str = "bays";
    pub const VEHICLES: &str = "vehicles";
    pub const SERVICES: &str = "services";
    pub const SCHEDULE: &str = "schedule";
}

/// The table whose presence marks an initialized schema.
pub const SENTINEL_TABLE: &str = tables::CUSTOMERS;

/// Definition of one table: DDL, optional seed rows, and the sequence
/// backing its surrogate key.
pub struct TableDef {
    pub name: &'static str,
    pub sequence: &'static str,
    pub create: &'static str,
    pub seed: Option<&'static str>,
}

/// All tables in dependency order (parents before children).
///
/// Creation walks this slice forward; teardown walks it in reverse so
/// foreign-key dependents are dropped before their parents.
pub const ALL_TABLES: &[TableDef] = &[
    TableDef {
        name: tables::CUSTOMERS,
        sequence: "customers_id_seq",
        create: r"
            CREATE SEQUENCE customers_id_seq START 1;
            CREATE TABLE customers (
                id BIGINT PRIMARY KEY DEFAULT nextval('customers_id_seq'),
                name VARCHAR(60) NOT NULL
            );
        ",
        seed: None,
    },
    TableDef {
        name: tables::MECHANICS,
        sequence: "mechanics_id_seq",
        create: r"
            CREATE SEQUENCE mechanics_id_seq START 1;
            CREATE TABLE mechanics (
                id BIGINT PRIMARY KEY DEFAULT nextval('mechanics_id_seq'),
                name VARCHAR(60) NOT NULL,
                hourly_rate DECIMAL(10, 2) NOT NULL CHECK (hourly_rate >= 0)
            );
        ",
        seed: Some(
            r"
            INSERT INTO mechanics (name, hourly_rate) VALUES ('Sue', 10.00);
            INSERT INTO mechanics (name, hourly_rate) VALUES ('Steve', 9.00);
        ",
        ),
    },
    TableDef {
        name: tables::BAYS,
        sequence: "bays_id_seq",
        create: r"
            CREATE SEQUENCE bays_id_seq START 1;
            CREATE TABLE bays (
                id BIGINT PRIMARY KEY DEFAULT nextval('bays_id_seq'),
                mechanic_id BIGINT REFERENCES mechanics(id)
            );
        ",
        // One bay per seed mechanic, matched by position.
        seed: Some(
            r"
            INSERT INTO bays (mechanic_id) VALUES (1);
            INSERT INTO bays (mechanic_id) VALUES (2);
        ",
        ),
    },
    TableDef {
        name: tables::VEHICLES,
        sequence: "vehicles_id_seq",
        create: r"
            CREATE SEQUENCE vehicles_id_seq START 1;
            CREATE TABLE vehicles (
                id BIGINT PRIMARY KEY DEFAULT nextval('vehicles_id_seq'),
                customer_id BIGINT NOT NULL REFERENCES customers(id),
                description VARCHAR(60) NOT NULL
            );
        ",
        seed: None,
    },
    TableDef {
        name: tables::SERVICES,
        sequence: "services_id_seq",
        create: r"
            CREATE SEQUENCE services_id_seq START 1;
            CREATE TABLE services (
                id BIGINT PRIMARY KEY DEFAULT nextval('services_id_seq'),
                name VARCHAR(60) NOT NULL,
                duration_minutes INTEGER NOT NULL CHECK (duration_minutes >= 0)
            );
        ",
        seed: Some(
            r"
            INSERT INTO services (name, duration_minutes) VALUES ('Oil Change', 30);
            INSERT INTO services (name, duration_minutes) VALUES ('Tire Replacement', 60);
            INSERT INTO services (name, duration_minutes) VALUES ('Brakes', 180);
        ",
        ),
    },
    TableDef {
        name: tables::SCHEDULE,
        sequence: "schedule_id_seq",
        create: r"
            CREATE SEQUENCE schedule_id_seq START 1;
            CREATE TABLE schedule (
                id BIGINT PRIMARY KEY DEFAULT nextval('schedule_id_seq'),
                vehicle_id BIGINT NOT NULL REFERENCES vehicles(id),
                service_id BIGINT NOT NULL REFERENCES services(id),
                bay_id BIGINT NOT NULL REFERENCES bays(id),
                appointment_time TIMESTAMP
            );
        ",
        // Populated later from scheduling input, never at creation time.
        seed: None,
    },
];

/// Check whether a name refers to one of the known tables.
#[must_use]
pub fn is_known_table(name: &str) -> bool {
    ALL_TABLES.iter().any(|t| t.name == name)
}
