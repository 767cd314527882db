use serde::{Deserialize, Serialize};

use super::types::AwardStatus;

/// Workflow position of an award as an explicit tagged state instead of a
/// status integer crossed with independent routing booleans. Invalid flag
/// combinations are unrepresentable by construction; the boolean views the
/// rest of the crate consumes are derived accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    /// Normal single-track flow.
    Sequential { status: AwardStatus },
    /// Negotiation and setup teams working concurrently.
    ParallelNegotiationSetup { status: AwardStatus },
    /// Negotiation paired with a modification section instead of setup.
    ParallelNegotiationModification { status: AwardStatus, common: bool },
    /// Setup-stage work redirected into a modification section.
    RoutedToModification { status: AwardStatus },
}

impl WorkflowState {
    pub fn new() -> Self {
        WorkflowState::Sequential {
            status: AwardStatus::New,
        }
    }

    pub fn status(&self) -> AwardStatus {
        match *self {
            WorkflowState::Sequential { status }
            | WorkflowState::ParallelNegotiationSetup { status }
            | WorkflowState::ParallelNegotiationModification { status, .. }
            | WorkflowState::RoutedToModification { status } => status,
        }
    }

    pub fn set_status(&mut self, new_status: AwardStatus) {
        match self {
            WorkflowState::Sequential { status }
            | WorkflowState::ParallelNegotiationSetup { status }
            | WorkflowState::ParallelNegotiationModification { status, .. }
            | WorkflowState::RoutedToModification { status } => *status = new_status,
        }
    }

    /// Collapse any parallel or routed track back to the sequential flow,
    /// keeping the current status.
    pub fn collapse_to_sequential(&mut self) {
        *self = WorkflowState::Sequential {
            status: self.status(),
        };
    }

    /// Negotiation half of a dual negotiation/setup track is still active.
    pub fn dual_negotiation(&self) -> bool {
        matches!(self, WorkflowState::ParallelNegotiationSetup { status }
            if *status == AwardStatus::Negotiation)
    }

    /// Setup is running as the parallel half of a dual track.
    pub fn dual_setup(&self) -> bool {
        matches!(self, WorkflowState::ParallelNegotiationSetup { .. })
    }

    pub fn dual_modification(&self) -> bool {
        matches!(self, WorkflowState::ParallelNegotiationModification { .. })
    }

    pub fn common_modification(&self) -> bool {
        matches!(
            self,
            WorkflowState::ParallelNegotiationModification { common: true, .. }
        )
    }

    pub fn routed_to_modification(&self) -> bool {
        matches!(self, WorkflowState::RoutedToModification { .. })
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}
