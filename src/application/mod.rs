//! Application layer: experiment orchestration and trial execution.

pub mod orchestrator;
pub mod trial_executor;
pub mod trial_queue;

pub use orchestrator::{ExperimentOrchestrator, ExperimentReceipt, ExperimentResults};
pub use trial_executor::TrialExecutor;
pub use trial_queue::{JobHandler, TrialQueue};
