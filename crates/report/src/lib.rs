//! Reports for wallflux runs.
//!
//! - [`write_csv`] and [`write_csv_file`] export per-sample diagnostics as CSV
//!
//! # Features
//!
//! - `plot` — Enables [`Figure`], a four-panel egui view of a run.
//!   This feature adds dependencies on `eframe` and `egui_plot`.
//!
//! [`Figure`]: plot::Figure

mod table;

#[cfg(feature = "plot")]
pub mod plot;

pub use table::{ReportError, Row, write_csv, write_csv_file};
