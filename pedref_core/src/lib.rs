#![forbid(unsafe_code)]

//! Core domain model and business logic for the Pedref pediatric
//! emergency reference system.
//!
//! This crate provides:
//! - Domain types (bounds, sizing charts, dose specs, patient profile)
//! - The bundled reference catalog with one-time range normalization
//! - Weight estimation, formula registry, and dose calculation
//! - An offline-first collection store with idempotent seeding
//! - The resolution engine façade consumed by presentation code

pub mod types;
pub mod error;
pub mod bounds;
pub mod formulas;
pub mod estimator;
pub mod dose;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod seeder;
pub mod connectivity;
pub mod profile;
pub mod records;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use estimator::EstimationMethod;
pub use store::FileStore;
pub use seeder::seed_if_empty;
pub use profile::{load_profile, reset_profile, save_profile};
pub use engine::ResolutionEngine;
