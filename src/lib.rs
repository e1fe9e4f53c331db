//! Core library surface for the Medwise terminal app.
//!
//! The bin target only wires these pieces together; the search, analysis and
//! persistence layers stay usable on their own.
pub mod analysis;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod db;
pub mod logging;
pub mod models;
pub mod search;
pub mod text;
pub mod ui;

pub use analysis::{analyze_alternatives, AlternativesReport};
pub use config::{data_dir, load_config, AppConfig, CONFIG_FILE_NAME};
pub use dataset::Dataset;
pub use db::ensure_schema;
pub use logging::init_logging;
pub use models::Medicine;
pub use search::{lookup, SearchIndex, SearchOptions};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
