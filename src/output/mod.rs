//! Output module for exports and reports
//!
//! This module handles:
//! - Exporting download links to a text sink
//! - Loading and printing harvest statistics

mod export;
pub mod stats;

pub use export::export_links;
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
