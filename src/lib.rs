//! escoba - Data-Cleaning Utilities for Arrow Tables
//!
//! Frequency tabulation ("tabyl") and duplicate-row detection over Arrow
//! `RecordBatch` data, without requiring a full data-frame engine.
//!
//! # Design Principles
//!
//! 1. **Pure Rust** - No FFI, no runtime; operates on in-memory batches
//! 2. **Arrow native** - `RecordBatch` in, `RecordBatch` out; categorical
//!    columns are dictionary arrays whose value set is the declared level
//!    sequence
//! 3. **Deterministic** - Every result has a fully specified row and
//!    column order
//!
//! # Quick Start
//!
//! ```no_run
//! use escoba::Tabulator;
//! # let batch: arrow::array::RecordBatch = unimplemented!();
//!
//! // One-way frequency table with counts and percentages
//! let freq = Tabulator::new().one_way(&batch, "species").unwrap();
//!
//! // Two-way contingency table
//! let cross = Tabulator::new()
//!     .show_na(false)
//!     .two_way(&batch, "species", "habitat")
//!     .unwrap();
//! println!("{} rows", cross.table.num_rows());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::float_cmp,
        clippy::too_many_lines
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::map_unwrap_or)]

pub mod categorical;
pub mod cell;
pub mod dupes;
pub mod error;
pub mod group;
pub mod selector;
pub mod tabyl;

pub use categorical::Levels;
pub use cell::CellValue;
pub use dupes::find_dupes;
pub use error::{Error, Result};
pub use group::{count_groups, GroupCount, GroupedCounts};
pub use selector::ColumnSelector;
pub use tabyl::{Tabulator, Tabyl, TabylKind, TabylOutput, TabylPartition};

/// Crate version, for downstream diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
