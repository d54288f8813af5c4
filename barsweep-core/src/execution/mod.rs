//! Order execution against historical bars.

pub mod simulator;

pub use simulator::{ExecutionSimulator, FillResult, RejectReason, SubmitOutcome};
