//! # Project Batch Driver Common Library
//!
//! Shared code for every operation family of the batch driver:
//! - Error taxonomy for fatal, pre-flight conditions
//! - Environment-sourced configuration (credentials, scheme set)
//! - Process log bootstrap
//! - Work list (CSV) reader

pub mod config;
pub mod error;
pub mod logging;
pub mod worklist;

pub use config::{Credentials, SchemeKind, SchemeSet};
pub use error::{Error, Result};
pub use worklist::{WorkListEntry, WorkListReader, WorkRow};
