//! Static stage registry.
//!
//! Maps each workflow stage to its responsible-group name, the status at
//! which it becomes editable, and whether its records are cycle-aware. This
//! replaces per-call dynamic lookup by section-name string: everything is
//! resolved against this table at compile time.

use crate::award::types::{AwardStatus, Stage};

#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub stage: Stage,
    /// Name of the institutional group that staffs this stage.
    pub group: &'static str,
    /// An award must have reached this status for the stage to be editable.
    pub edit_status: AwardStatus,
    /// Whether records of this stage follow the current-cycle pattern.
    pub cycle_aware: bool,
}

pub const STAGE_REGISTRY: &[StageSpec] = &[
    StageSpec {
        stage: Stage::ProposalIntake,
        group: "Proposal Intake",
        edit_status: AwardStatus::New,
        cycle_aware: false,
    },
    StageSpec {
        stage: Stage::Acceptance,
        group: "Award Acceptance",
        edit_status: AwardStatus::Intake,
        cycle_aware: true,
    },
    StageSpec {
        stage: Stage::Negotiation,
        group: "Award Negotiation",
        edit_status: AwardStatus::Negotiation,
        cycle_aware: true,
    },
    StageSpec {
        stage: Stage::Setup,
        group: "Award Setup",
        edit_status: AwardStatus::Setup,
        cycle_aware: false,
    },
    StageSpec {
        stage: Stage::Modification,
        group: "Award Modification",
        edit_status: AwardStatus::Setup,
        cycle_aware: false,
    },
    StageSpec {
        stage: Stage::Subaward,
        group: "Subaward Management",
        edit_status: AwardStatus::ManagementSubaward,
        cycle_aware: false,
    },
    StageSpec {
        stage: Stage::Management,
        group: "Award Management",
        edit_status: AwardStatus::ManagementSubaward,
        cycle_aware: false,
    },
    StageSpec {
        stage: Stage::Closeout,
        group: "Award Closeout",
        edit_status: AwardStatus::Closeout,
        cycle_aware: false,
    },
];

pub fn spec_for(stage: Stage) -> &'static StageSpec {
    STAGE_REGISTRY
        .iter()
        .find(|spec| spec.stage == stage)
        .expect("every stage is registered")
}

/// Stages whose sections are active at the given status.
pub fn active_stages(status: AwardStatus) -> &'static [Stage] {
    match status {
        AwardStatus::New | AwardStatus::Complete => &[],
        AwardStatus::Intake => &[Stage::Acceptance],
        AwardStatus::Negotiation => &[Stage::Negotiation],
        AwardStatus::Setup => &[Stage::Setup],
        AwardStatus::ManagementSubaward => &[Stage::Subaward, Stage::Management],
        AwardStatus::Closeout => &[Stage::Closeout],
    }
}

/// Stages editable at or before the given status. A dual
/// negotiation/setup track opens editing one status ahead.
pub fn editable_stages(status: AwardStatus, dual_track: bool) -> Vec<Stage> {
    let horizon = if dual_track {
        status.next().unwrap_or(status)
    } else {
        status
    };
    STAGE_REGISTRY
        .iter()
        .filter(|spec| spec.edit_status <= horizon)
        .map(|spec| spec.stage)
        .collect()
}
