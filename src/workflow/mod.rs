pub mod engine;
pub mod stamping;
pub mod transitions;

pub use engine::WorkflowEngine;
pub use transitions::TransitionOutcome;
