//! DreamMap analysis pipeline
//!
//! Provides:
//! - `AnalysisOrchestrator`: prompt gate, inference + validation (required)
//!   joined with the moon phase lookup (best-effort), then persistence
//! - `SubmissionGuard` / `SessionRegistry`: at most one in-flight submission
//!   per session
//! - Record stores implementing `PersistenceGateway`

pub mod orchestrator;
pub mod session;
pub mod store;

pub use orchestrator::*;
pub use session::*;
pub use store::*;
