//! # boq_core - Bill of Quantities Estimation Engine
//!
//! `boq_core` turns what an estimator specifies (a product recipe and the
//! quantity to install, or a wall's type and dimensions) into purchasable
//! material quantities and an invoice-ready total. All inputs and outputs are
//! JSON-serializable so the web front end can store what the user entered and
//! re-run the engine on every read.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **Total**: Calculators normalize bad numbers instead of failing
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Exact money**: Tax and round-off are computed in decimal
//!
//! ## Quick Start
//!
//! ```rust
//! use boq_core::calculations::wall::{compute, WallType};
//! use boq_core::calculations::financial::finalize;
//!
//! let takeoff = compute(Some(WallType::Gypsum), Some(10.0), Some(8.0), "single", 0.0);
//! assert!(takeoff.is_some());
//!
//! let totals = finalize(105.50);
//! assert!(totals.reconciles());
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Recipe scaling, wall takeoff, tax and round-off
//! - [`project`] - Project container, metadata, settings and summary
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - `.boq` files: atomic saves and locked edits

pub mod calculations;
pub mod errors;
pub mod file_io;
pub mod lenient;
pub mod project;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{EstimateError, EstimateResult};
pub use file_io::{create_project, load_project, save_project, update_project, EditLock, LockHolder};
pub use project::{BoqSummary, EstimateSettings, Project, ProjectMetadata};
