use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::award::types::{AwardId, SectionId};

/// EAS award status codes carried on acceptance and PTA records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasStatus {
    Active,
    OnHold,
    AtRisk,
    Closed,
}

impl EasStatus {
    pub fn code(self) -> &'static str {
        match self {
            EasStatus::Active => "A",
            EasStatus::OnHold => "OH",
            EasStatus::AtRisk => "AR",
            EasStatus::Closed => "C",
        }
    }
}

/// Where a negotiation currently stands. New cycles always start in the
/// queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NegotiationStatus {
    #[default]
    InQueue,
    InProgress,
    WaitingForSponsor,
    WaitingForPi,
    WaitingForOtherDepartment,
}

impl NegotiationStatus {
    pub fn code(self) -> &'static str {
        match self {
            NegotiationStatus::InQueue => "IQ",
            NegotiationStatus::InProgress => "IP",
            NegotiationStatus::WaitingForSponsor => "WFS",
            NegotiationStatus::WaitingForPi => "WFP",
            NegotiationStatus::WaitingForOtherDepartment => "WFO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NegotiationStatus::InQueue => "In queue",
            NegotiationStatus::InProgress => "In progress",
            NegotiationStatus::WaitingForSponsor => "Waiting for sponsor",
            NegotiationStatus::WaitingForPi => "Waiting for PI",
            NegotiationStatus::WaitingForOtherDepartment => "Waiting for other department",
        }
    }
}

/// "Waiting for X" codes used on setup and modification sections. The label
/// text doubles as the audit-trail step key for wait-reason entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitReason {
    RevisedBudget,
    PiAccess,
    CostShareApproval,
    Fcoi,
    ProposalSubmission,
    SponsorClarity,
    NewOrgNeeded,
    InternalClarification,
    DocumentsNotOnFile,
}

impl WaitReason {
    pub fn code(self) -> &'static str {
        match self {
            WaitReason::RevisedBudget => "RB",
            WaitReason::PiAccess => "PA",
            WaitReason::CostShareApproval => "CA",
            WaitReason::Fcoi => "FC",
            WaitReason::ProposalSubmission => "PS",
            WaitReason::SponsorClarity => "SC",
            WaitReason::NewOrgNeeded => "NO",
            WaitReason::InternalClarification => "IC",
            WaitReason::DocumentsNotOnFile => "DC",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WaitReason::RevisedBudget => "Revised Budget",
            WaitReason::PiAccess => "PI Access",
            WaitReason::CostShareApproval => "Cost Share Approval",
            WaitReason::Fcoi => "FCOI",
            WaitReason::ProposalSubmission => "Proposal Submission",
            WaitReason::SponsorClarity => "Sponsor Clarity",
            WaitReason::NewOrgNeeded => "New Org needed",
            WaitReason::InternalClarification => "Internal Clarification",
            WaitReason::DocumentsNotOnFile => "Documents not on file",
        }
    }
}

/// Setup worklist priority recorded on the current acceptance. Lower rank
/// sorts first; awards without a priority sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupPriority {
    One,
    Two,
    Three,
    Four,
    Five,
    Nine,
}

impl SetupPriority {
    pub fn code(self) -> &'static str {
        match self {
            SetupPriority::One => "on",
            SetupPriority::Two => "tw",
            SetupPriority::Three => "th",
            SetupPriority::Four => "fo",
            SetupPriority::Five => "fi",
            SetupPriority::Nine => "ni",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            SetupPriority::One => 1,
            SetupPriority::Two => 2,
            SetupPriority::Three => 3,
            SetupPriority::Four => 4,
            SetupPriority::Five => 5,
            SetupPriority::Nine => 9,
        }
    }
}

/// Subrecipient risk level on a subaward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubawardRisk {
    Low,
    Medium,
    High,
}

/// Cycle-aware intake record. Exactly one row per award carries
/// `current_modification = true`; prior cycles are kept for history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardAcceptance {
    pub id: SectionId,
    pub award_id: AwardId,
    pub creation_date: DateTime<Utc>,
    pub current_modification: bool,
    /// Generation label: `None` for the original award, "Modification #N"
    /// afterwards.
    pub award_text: Option<String>,
    pub eas_status: Option<EasStatus>,
    pub new_funding: Option<bool>,
    pub phs_funded: Option<bool>,
    pub fcoi_cleared_date: Option<NaiveDate>,
    pub setup_priority: Option<SetupPriority>,
    pub priority_by_director: Option<bool>,
    pub project_title: String,
    pub award_issue_date: Option<NaiveDate>,
    pub award_acceptance_date: Option<NaiveDate>,
    pub agency_award_number: String,
    pub sponsor_award_number: String,
    pub award_total_costs: Option<f64>,
    pub award_direct_costs: Option<f64>,
    pub award_indirect_costs: Option<f64>,
    pub pta_modification: Option<bool>,
    pub acceptance_completion_date: Option<DateTime<Utc>>,
}

impl AwardAcceptance {
    pub fn new(id: SectionId, award_id: AwardId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            award_id,
            creation_date: now,
            current_modification: true,
            award_text: None,
            eas_status: None,
            new_funding: None,
            phs_funded: None,
            fcoi_cleared_date: None,
            setup_priority: None,
            priority_by_director: None,
            project_title: String::new(),
            award_issue_date: None,
            award_acceptance_date: None,
            agency_award_number: String::new(),
            sponsor_award_number: String::new(),
            award_total_costs: None,
            award_direct_costs: None,
            award_indirect_costs: None,
            pta_modification: None,
            acceptance_completion_date: None,
        }
    }
}

/// Cycle-aware negotiation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardNegotiation {
    pub id: SectionId,
    pub award_id: AwardId,
    pub creation_date: DateTime<Utc>,
    pub current_modification: bool,
    pub award_text: Option<String>,
    pub date_assigned: Option<DateTime<Utc>>,
    pub negotiation_status: NegotiationStatus,
    pub negotiation_notes: String,
    pub comments: String,
    pub negotiation_completion_date: Option<DateTime<Utc>>,
}

impl AwardNegotiation {
    pub fn new(id: SectionId, award_id: AwardId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            award_id,
            creation_date: now,
            current_modification: true,
            award_text: None,
            date_assigned: None,
            negotiation_status: NegotiationStatus::InQueue,
            negotiation_notes: String::new(),
            comments: String::new(),
            negotiation_completion_date: None,
        }
    }
}

/// Singleton setup record per award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardSetup {
    pub id: SectionId,
    pub award_id: AwardId,
    pub date_assigned: Option<DateTime<Utc>>,
    pub short_name: String,
    pub project_title: String,
    pub agency_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub wait_for: Option<WaitReason>,
    pub date_wait_for_updated: Option<DateTime<Utc>>,
    pub setup_completion_date: Option<DateTime<Utc>>,
}

impl AwardSetup {
    pub fn new(id: SectionId, award_id: AwardId) -> Self {
        Self {
            id,
            award_id,
            date_assigned: None,
            short_name: String::new(),
            project_title: String::new(),
            agency_name: String::new(),
            start_date: None,
            end_date: None,
            wait_for: None,
            date_wait_for_updated: None,
            setup_completion_date: None,
        }
    }
}

/// Modification-track counterpart of the setup record. Created by cloning
/// the setup section when setup work is redirected, and freshly at the start
/// of each modification cycle. `is_edited = false` marks the pending row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardModification {
    pub id: SectionId,
    pub award_id: AwardId,
    pub date_assigned: Option<DateTime<Utc>>,
    pub is_edited: bool,
    pub short_name: String,
    pub project_title: String,
    pub agency_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub wait_for: Option<WaitReason>,
    pub date_wait_for_updated: Option<DateTime<Utc>>,
    pub modification_completion_date: Option<DateTime<Utc>>,
}

impl AwardModification {
    pub fn new(id: SectionId, award_id: AwardId) -> Self {
        Self {
            id,
            award_id,
            date_assigned: None,
            is_edited: false,
            short_name: String::new(),
            project_title: String::new(),
            agency_name: String::new(),
            start_date: None,
            end_date: None,
            wait_for: None,
            date_wait_for_updated: None,
            modification_completion_date: None,
        }
    }

    /// Clone the relevant fields of a setup section into a fresh pending
    /// modification row. Identity, edited flag, completion date and wait
    /// reason are deliberately not carried over.
    pub fn cloned_from_setup(id: SectionId, setup: &AwardSetup) -> Self {
        Self {
            id,
            award_id: setup.award_id,
            date_assigned: setup.date_assigned,
            is_edited: false,
            short_name: setup.short_name.clone(),
            project_title: setup.project_title.clone(),
            agency_name: setup.agency_name.clone(),
            start_date: setup.start_date,
            end_date: setup.end_date,
            wait_for: None,
            date_wait_for_updated: None,
            modification_completion_date: None,
        }
    }
}

/// Independent subaward row; an award can carry any number of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subaward {
    pub id: SectionId,
    pub award_id: AwardId,
    pub creation_date: DateTime<Utc>,
    pub risk: Option<SubawardRisk>,
    pub amount: Option<f64>,
    pub agreement_type: String,
    pub subaward_start: Option<NaiveDate>,
    pub subaward_end: Option<NaiveDate>,
    pub subaward_completion_date: Option<DateTime<Utc>>,
}

impl Subaward {
    pub fn new(id: SectionId, award_id: AwardId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            award_id,
            creation_date: now,
            risk: None,
            amount: None,
            agreement_type: String::new(),
            subaward_start: None,
            subaward_end: None,
            subaward_completion_date: None,
        }
    }
}

/// Singleton management record per award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardManagement {
    pub id: SectionId,
    pub award_id: AwardId,
    pub date_assigned: Option<DateTime<Utc>>,
    pub management_completion_date: Option<DateTime<Utc>>,
}

impl AwardManagement {
    pub fn new(id: SectionId, award_id: AwardId) -> Self {
        Self {
            id,
            award_id,
            date_assigned: None,
            management_completion_date: None,
        }
    }
}

/// Singleton closeout record per award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardCloseout {
    pub id: SectionId,
    pub award_id: AwardId,
    pub date_assigned: Option<DateTime<Utc>>,
    pub closeout_completion_date: Option<DateTime<Utc>>,
}

impl AwardCloseout {
    pub fn new(id: SectionId, award_id: AwardId) -> Self {
        Self {
            id,
            award_id,
            date_assigned: None,
            closeout_completion_date: None,
        }
    }
}

/// PTA (project/task/award) number under the setup stage. Not cycle-tracked.
/// The first row back-propagates shared fields onto the proposal and current
/// acceptance via the explicit reconciliation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtaNumber {
    pub id: SectionId,
    pub award_id: AwardId,
    pub creation_date: DateTime<Utc>,
    pub project_number: String,
    pub task_number: String,
    pub award_number: String,
    pub agency_name: String,
    pub agency_award_number: String,
    pub sponsor_award_number: String,
    pub who_is_prime: String,
    pub eas_status: Option<EasStatus>,
    pub project_title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_pta_amount: Option<f64>,
}
