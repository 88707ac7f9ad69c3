//! Local-first data layer core: domain records, repository contracts, the sync
//! orchestrator and the session controller.
//!
//! Storage and HTTP live in sibling crates; this crate only defines the ports
//! they plug into.

pub mod config;
pub mod errors;
pub mod models;
pub mod net;
pub mod repository;
pub mod secrets;
pub mod session;
pub mod sync;

pub use errors::{Error, Result};
