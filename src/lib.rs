// Bike Rental Reports - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod value;       // Cell values, total order, currency rounding
pub mod error;       // ReportError
pub mod entities;    // Customer, Bike, Rental, MembershipType, Membership
pub mod store;       // Relation Store: Relation, joins, Snapshot
pub mod sort;        // Multi-key ordering, nulls and rollups last
pub mod aggregation; // GROUP BY / GROUPING SETS / CUBE
pub mod pricing;     // Category discount table
pub mod config;      // ReportConfig
pub mod catalog;     // The eight reports
pub mod output;      // Table / CSV / JSON rendering
pub mod db;          // SQLite + CSV adapter
pub mod seed;        // Sample dataset
pub mod logging;     // tracing subscriber setup

// Re-export commonly used types
pub use value::{round_currency, Value};
pub use error::{ReportError, Result};
pub use entities::{
    Bike, BikeStatus, Customer, Entity, Membership, MembershipType, QualityIssue, Rental,
};
pub use store::{
    nested_loop_join, on_eq, JoinKind, Record, ReferentialGap, Relation, RelationStore, Snapshot,
};
pub use sort::{sort_relation, SortKey, SortOrder};
pub use aggregation::{
    Aggregate, AggregateFn, AggregationPlan, GroupKey, Grouped, GroupedRow, GroupingMode, KeyPart,
};
pub use pricing::{Discount, DiscountTable};
pub use config::{ReportConfig, SegmentThresholds};
pub use catalog::{Report, ReportCatalog, ReportColumn, ReportKind};
pub use output::{render, render_all, OutputFormat};
pub use db::{
    count_rows, insert_snapshot, load_csv_dir, load_snapshot, open_database, setup_database,
    ImportStats,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
