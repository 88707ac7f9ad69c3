//! Sync orchestration: connectivity tracking, repository fan-out and the periodic timer.

mod connectivity;
mod orchestrator;
mod sync_model;

pub use connectivity::*;
pub use orchestrator::*;
pub use sync_model::*;
