//! `sd_ingest` - Record parsing and ingestion pipeline for Shop Desk
//!
//! This crate provides:
//! - Line classification for the operational record file
//! - Partitioning of records into per-type groups
//! - The ingestion pipeline applying one input file to the store
//!
//! # Ingestion Design Principles
//!
//! 1. **Customers before vehicles**: every customer record is committed
//!    before any vehicle resolution starts, so a vehicle line may reference
//!    a customer appearing later in the same file
//! 2. **Fail-soft per record**: a storage error on one insert is logged and
//!    counted, never aborts the rest of the batch
//! 3. **Silent drop**: unresolvable and malformed records are skipped by
//!    policy, not reported as errors

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sd_store::ShopStore;

pub mod parser;

pub use parser::{parse_line, parse_records, Record, VehicleRecord};

/// Classified records partitioned by type, intra-group input order preserved.
#[derive(Debug, Clone, Default)]
pub struct RecordGroups {
    pub customers: Vec<String>,
    pub vehicles: Vec<VehicleRecord>,
    pub services: Vec<String>,
    /// Lines that classified to nothing: unknown tags, empty payloads,
    /// malformed vehicle payloads.
    pub ignored: u64,
}

/// Partition every line of `input` into per-type groups.
#[must_use]
pub fn partition(input: &str) -> RecordGroups {
    let mut groups = RecordGroups::default();

    for line in input.lines() {
        match parser::parse_line(line) {
            Some(Record::Customer { name }) => groups.customers.push(name),
            Some(Record::Vehicle(vehicle)) => groups.vehicles.push(vehicle),
            Some(Record::Service { text }) => groups.services.push(text),
            None => groups.ignored += 1,
        }
    }

    groups
}

/// Counters describing one ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSummary {
    pub customers_inserted: u64,
    pub vehicles_inserted: u64,
    /// Vehicle records dropped because their customer name resolved to no row.
    pub vehicles_skipped: u64,
    /// Service records classified; no insertion path exists for them.
    pub services_seen: u64,
    pub lines_ignored: u64,
    /// Per-record storage failures that were absorbed.
    pub insert_failures: u64,
}

/// Applies one input file to the store.
pub struct Ingestor<'a> {
    store: &'a ShopStore,
}

impl<'a> Ingestor<'a> {
    #[must_use]
    pub fn new(store: &'a ShopStore) -> Self {
        Self { store }
    }

    /// Ingest the contents of one record file.
    ///
    /// Customers are inserted first, in input order and without any
    /// uniqueness check. Vehicles follow, each resolved against the customer
    /// table by exact name; unresolvable vehicles are dropped. Services are
    /// counted but never inserted. Storage failures are isolated to the
    /// record that hit them.
    pub fn ingest(&self, input: &str) -> IngestSummary {
        let groups = partition(input);
        let mut summary = IngestSummary {
            services_seen: groups.services.len() as u64,
            lines_ignored: groups.ignored,
            ..IngestSummary::default()
        };

        for name in &groups.customers {
            match self.store.insert_customer(name) {
                Ok(_) => summary.customers_inserted += 1,
                Err(e) => {
                    warn!(customer = name.as_str(), error = %e, "Customer insert failed");
                    summary.insert_failures += 1;
                }
            }
        }

        for vehicle in &groups.vehicles {
            match self.store.find_customer_id(&vehicle.customer_name) {
                Ok(Some(customer_id)) => {
                    match self.store.insert_vehicle(customer_id, &vehicle.description) {
                        Ok(_) => summary.vehicles_inserted += 1,
                        Err(e) => {
                            warn!(
                                customer = vehicle.customer_name.as_str(),
                                error = %e,
                                "Vehicle insert failed"
                            );
                            summary.insert_failures += 1;
                        }
                    }
                }
                Ok(None) => {
                    debug!(
                        customer = vehicle.customer_name.as_str(),
                        "Vehicle dropped, customer not found"
                    );
                    summary.vehicles_skipped += 1;
                }
                Err(e) => {
                    warn!(
                        customer = vehicle.customer_name.as_str(),
                        error = %e,
                        "Customer lookup failed"
                    );
                    summary.insert_failures += 1;
                }
            }
        }

        info!(
            customers = summary.customers_inserted,
            vehicles = summary.vehicles_inserted,
            skipped = summary.vehicles_skipped,
            ignored = summary.lines_ignored,
            "Ingest complete"
        );
        summary
    }
}
