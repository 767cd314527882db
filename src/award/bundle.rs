use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditTrailEntry, GENERATION_ORIGINAL};
use crate::award::state::WorkflowState;
use crate::award::types::{AwardId, AwardStatus, SectionId, StageAssignments};
use crate::proposal::Proposal;
use crate::sections::types::{
    AwardAcceptance, AwardCloseout, AwardManagement, AwardModification, AwardNegotiation,
    AwardSetup, PtaNumber, Subaward,
};

/// The aggregate root. Field storage only; transition rules live in
/// `workflow::transitions`, assignment rules in `assignment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
    pub id: AwardId,
    pub state: WorkflowState,
    pub creation_date: DateTime<Utc>,
    pub assignments: StageAssignments,
    /// Subaward and management share one status, so their completion is
    /// tracked independently.
    pub subaward_done: bool,
    pub management_done: bool,
}

impl Award {
    pub fn status(&self) -> AwardStatus {
        self.state.status()
    }
}

/// One award with all of its child rows: the unit the persistence boundary
/// loads and saves atomically. Every transition mutates an owned bundle and
/// either the whole result is persisted or none of it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardBundle {
    /// Optimistic-concurrency token checked by the repository on save.
    pub version: u64,
    pub award: Award,
    pub proposals: Vec<Proposal>,
    pub acceptances: Vec<AwardAcceptance>,
    pub negotiations: Vec<AwardNegotiation>,
    pub setup: AwardSetup,
    pub modifications: Vec<AwardModification>,
    pub subawards: Vec<Subaward>,
    pub management: AwardManagement,
    pub closeout: AwardCloseout,
    pub pta_numbers: Vec<PtaNumber>,
    pub audit: Vec<AuditTrailEntry>,
    next_section_id: SectionId,
}

impl AwardBundle {
    /// Create a new award with every stage's section pre-provisioned, plus a
    /// dummy proposal placeholder, so each stage has an editable record
    /// before it becomes active.
    pub fn new(id: AwardId, assignments: StageAssignments, now: DateTime<Utc>) -> Self {
        let mut bundle = Self {
            version: 0,
            award: Award {
                id,
                state: WorkflowState::new(),
                creation_date: now,
                assignments,
                subaward_done: false,
                management_done: false,
            },
            proposals: Vec::new(),
            acceptances: Vec::new(),
            negotiations: Vec::new(),
            setup: AwardSetup::new(0, id),
            modifications: Vec::new(),
            subawards: Vec::new(),
            management: AwardManagement::new(0, id),
            closeout: AwardCloseout::new(0, id),
            pta_numbers: Vec::new(),
            audit: Vec::new(),
            next_section_id: 1,
        };

        let proposal_id = bundle.alloc_section_id();
        bundle.proposals.push(Proposal::dummy(proposal_id, id, now));
        let acceptance_id = bundle.alloc_section_id();
        bundle
            .acceptances
            .push(AwardAcceptance::new(acceptance_id, id, now));
        let negotiation_id = bundle.alloc_section_id();
        bundle
            .negotiations
            .push(AwardNegotiation::new(negotiation_id, id, now));
        bundle.setup.id = bundle.alloc_section_id();
        bundle.management.id = bundle.alloc_section_id();
        bundle.closeout.id = bundle.alloc_section_id();
        bundle
    }

    pub fn alloc_section_id(&mut self) -> SectionId {
        let id = self.next_section_id;
        self.next_section_id += 1;
        id
    }

    /// Generation label for audit entries: "Original Award" until a second
    /// acceptance cycle exists, then "Modification #N".
    pub fn generation_label(&self) -> String {
        let count = self.acceptances.len();
        if count < 2 {
            GENERATION_ORIGINAL.to_string()
        } else {
            format!("Modification #{}", count - 1)
        }
    }

    /// Label of the modification track itself, regardless of how many
    /// cycles exist yet.
    pub fn modification_label(&self) -> String {
        format!("Modification #{}", self.acceptances.len().saturating_sub(1))
    }

    /// Most recent non-dummy proposal, if one has been ingested.
    pub fn most_recent_proposal(&self) -> Option<&Proposal> {
        self.proposals.iter().filter(|p| !p.dummy).last()
    }

    pub fn first_real_proposal(&self) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.is_first_proposal && !p.dummy)
    }

    /// First-created PTA number, which drives back-propagation.
    pub fn first_pta_number(&self) -> Option<&PtaNumber> {
        self.pta_numbers.iter().min_by_key(|p| p.id)
    }

    /// Latest pending (not yet edited) modification row.
    pub fn latest_pending_modification_mut(&mut self) -> Option<&mut AwardModification> {
        self.modifications
            .iter_mut()
            .filter(|m| !m.is_edited)
            .max_by_key(|m| m.id)
    }

    /// Latest modification row regardless of edited state.
    pub fn latest_modification_mut(&mut self) -> Option<&mut AwardModification> {
        self.modifications.iter_mut().max_by_key(|m| m.id)
    }

    /// Latest edited modification row, used when stamping completion of the
    /// modification track.
    pub fn latest_edited_modification_mut(&mut self) -> Option<&mut AwardModification> {
        self.modifications
            .iter_mut()
            .filter(|m| m.is_edited)
            .max_by_key(|m| m.id)
    }

    /// Latest subaward by creation date.
    pub fn latest_subaward_mut(&mut self) -> Option<&mut Subaward> {
        self.subawards
            .iter_mut()
            .max_by_key(|s| (s.creation_date, s.id))
    }
}
