// CarScope - core/mod.rs
//
// Core business logic layer: the listing model, the cleaning pipeline,
// ad hoc filters, summary statistics and export.
// Must NOT depend on: platform, app, or the SQLite store.

pub mod clean;
pub mod export;
pub mod filter;
pub mod model;
pub mod stats;
