use serde::{Deserialize, Serialize};

pub type AwardId = u64;
pub type SectionId = u64;

/// Primary workflow position of an award. Status only ever increases, except
/// when a new modification cycle resets the award back to `Intake`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AwardStatus {
    New = 0,
    Intake = 1,
    Negotiation = 2,
    Setup = 3,
    ManagementSubaward = 4,
    Closeout = 5,
    Complete = 6,
}

impl AwardStatus {
    pub fn next(self) -> Option<AwardStatus> {
        use AwardStatus::*;
        match self {
            New => Some(Intake),
            Intake => Some(Negotiation),
            Negotiation => Some(Setup),
            Setup => Some(ManagementSubaward),
            ManagementSubaward => Some(Closeout),
            Closeout => Some(Complete),
            Complete => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == AwardStatus::Complete
    }

    pub fn label(self) -> &'static str {
        use AwardStatus::*;
        match self {
            New => "New",
            Intake => "Award Intake",
            Negotiation => "Award Negotiation",
            Setup => "Award Setup",
            ManagementSubaward => "Subaward & Award Management",
            Closeout => "Award Closeout",
            Complete => "Complete",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One workflow stage. Audit entries, assignment slots and the stage registry
/// are all keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    ProposalIntake,
    Acceptance,
    Negotiation,
    Setup,
    Modification,
    Subaward,
    Management,
    Closeout,
}

impl Stage {
    /// Stable name used as the `workflow_step` key in the audit trail.
    pub fn name(self) -> &'static str {
        use Stage::*;
        match self {
            ProposalIntake => "ProposalIntake",
            Acceptance => "AwardAcceptance",
            Negotiation => "AwardNegotiation",
            Setup => "AwardSetup",
            Modification => "AwardModification",
            Subaward => "Subaward",
            Management => "AwardManagement",
            Closeout => "AwardCloseout",
        }
    }
}

/// A reference to an assigned user. The workflow core never authenticates;
/// users arrive fully resolved from the directory boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub username: String,
    pub full_name: String,
    pub email: String,
}

impl UserRef {
    pub fn new(username: &str, full_name: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
        }
    }
}

/// Per-stage user assignments for one award.
///
/// Acceptance, setup, management and closeout must be staffed at creation;
/// the rest are optional and an unstaffed stage is auto-skipped by `advance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageAssignments {
    pub acceptance: UserRef,
    pub negotiation: Option<UserRef>,
    pub setup: UserRef,
    pub modification: Option<UserRef>,
    pub subaward: Option<UserRef>,
    pub management: UserRef,
    pub closeout: UserRef,
}

impl StageAssignments {
    /// Base stage-to-user mapping. Overrides (dual-track, modification
    /// routing) live in the assignment resolver, not here.
    pub fn for_stage(&self, stage: Stage) -> Option<&UserRef> {
        use Stage::*;
        match stage {
            ProposalIntake => None,
            Acceptance => Some(&self.acceptance),
            Negotiation => self.negotiation.as_ref(),
            Setup => Some(&self.setup),
            Modification => self.modification.as_ref(),
            Subaward => self.subaward.as_ref(),
            Management => Some(&self.management),
            Closeout => Some(&self.closeout),
        }
    }
}
