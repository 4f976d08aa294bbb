#![deny(missing_docs)]
#![doc = "Core records, tables and error types shared by the business proximity pipeline."]

pub mod columns;
pub mod date;
pub mod errors;
pub mod provenance;
pub mod record;
pub mod table;

pub use columns::{
    ColumnSchema, ADJACENT_COUNT, AVG_NEAREST_DISTANCE, OPERATING_PERIOD, PROXIMITY_FLAG,
};
pub use date::{format_date, parse_date};
pub use errors::{ErrorInfo, ProxError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use record::{extract_records, BusinessRecord, Location};
pub use table::{industry_name, Table};
