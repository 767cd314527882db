// Award Flow Library - Sponsored-Research Award Workflow
// This exposes the core components for testing and integration

pub mod assignment;
pub mod audit;
pub mod award;
pub mod config;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod proposal;
pub mod sections;
pub mod telemetry;
pub mod validation;
pub mod workflow;

// Re-export key types for easy access
pub use audit::AuditTrailEntry;
pub use award::bundle::{Award, AwardBundle};
pub use award::state::WorkflowState;
pub use award::types::{AwardId, AwardStatus, SectionId, Stage, StageAssignments, UserRef};
pub use config::{AwardFlowConfig, NotificationConfig};
pub use error::{NotificationError, RepositoryError, WorkflowError};
pub use notify::{LoggingSender, Notification, NotificationDispatcher, NotificationSender};
pub use persistence::{AwardRepository, InMemoryRepository, JsonFileRepository};
pub use proposal::{Proposal, ProposalRecord};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{TransitionOutcome, WorkflowEngine};
