pub mod bundle;
pub mod state;
pub mod types;

pub use bundle::{Award, AwardBundle};
pub use state::WorkflowState;
pub use types::{AwardId, AwardStatus, SectionId, Stage, StageAssignments, UserRef};
