//! `ordercheck-recon`: ERP vs affiliate-feed order reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns the partner table
//! annotated with a validation status per row. No CLI or IO dependencies.

pub mod classify;
pub mod config;
pub mod courier;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod index;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod value;

pub use config::ReconPolicy;
pub use engine::run;
pub use error::ReconError;
pub use model::{Cell, ReconResult, Status, Table};
