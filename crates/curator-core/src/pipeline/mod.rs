//! Curation pipeline components.
//!
//! - **discovery**: Find image files in directories
//! - **validate**: Size limits and magic-byte media type detection
//! - **queue**: The ordered list of images to curate
//! - **results**: Ordered per-image outcomes and run summaries
//! - **runner**: The sequential, cancellable scoring/annotation loop

pub mod discovery;
pub mod queue;
pub mod results;
pub mod runner;
pub mod validate;

// Re-exports for convenient access
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use queue::{AddReport, ImageQueue};
pub use results::{ResultSet, RunSummary};
pub use runner::{BatchPipeline, RunSnapshot, RunState, StopHandle};
pub use validate::Validator;
