//! Assignment resolver: which user(s) are responsible for an award at its
//! current workflow position, honoring dual-track and modification routing,
//! plus the priority-ordered setup worklist.

use crate::award::bundle::{Award, AwardBundle};
use crate::award::types::{AwardId, AwardStatus, Stage, UserRef};
use crate::sections::registry;

/// Resolve the user responsible for one stage.
///
/// When the award is on the negotiation/modification dual track, setup work
/// belongs to the modification user. An explicit modification override always
/// resolves to the modification user regardless of stage. Stages with no
/// mapped user slot resolve to `None` rather than erroring.
pub fn resolve_user(award: &Award, stage: Stage, modification_override: bool) -> Option<&UserRef> {
    let mut stage = stage;
    if stage == Stage::Setup && award.state.dual_modification() {
        stage = Stage::Modification;
    }
    if modification_override {
        stage = Stage::Modification;
    }
    award.assignments.for_stage(stage)
}

/// Users responsible for all currently active sections, in stage order,
/// skipping unstaffed slots.
pub fn resolve_active_users(award: &Award) -> Vec<&UserRef> {
    let status = award.status();

    if award.state.dual_negotiation() && status == AwardStatus::Negotiation {
        return collect(award, &[Stage::Negotiation, Stage::Setup]);
    }
    if award.state.dual_modification() && status == AwardStatus::Negotiation {
        return collect(award, &[Stage::Negotiation, Stage::Modification]);
    }
    if award.state.routed_to_modification() && status == AwardStatus::Setup {
        return collect(award, &[Stage::Modification]);
    }

    registry::active_stages(status)
        .iter()
        .filter_map(|&stage| resolve_user(award, stage, false))
        .collect()
}

fn collect<'a>(award: &'a Award, stages: &[Stage]) -> Vec<&'a UserRef> {
    stages
        .iter()
        .filter_map(|&stage| resolve_user(award, stage, false))
        .collect()
}

/// Comma-delimited display list of the active users' full names.
pub fn active_user_names(award: &Award) -> String {
    resolve_active_users(award)
        .iter()
        .map(|u| u.full_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether the given user currently owns setup-track work on this award.
/// Mirrors the worklist filter: setup assignments on the sequential or dual
/// track, and modification assignments when routed or dual-modification.
fn in_setup_worklist(award: &Award, user: &UserRef) -> bool {
    let status = award.status();
    let setup_is_user = award.assignments.setup.username == user.username;
    let modification_is_user = award
        .assignments
        .modification
        .as_ref()
        .is_some_and(|u| u.username == user.username);

    (setup_is_user
        && award.state.dual_setup()
        && matches!(status, AwardStatus::Negotiation | AwardStatus::Setup))
        || (setup_is_user
            && status == AwardStatus::Setup
            && !award.state.routed_to_modification())
        || (modification_is_user
            && status == AwardStatus::Setup
            && award.state.routed_to_modification())
        || (modification_is_user
            && status == AwardStatus::Negotiation
            && award.state.dual_modification())
}

/// Setup worklist for one user, ordered by the current acceptance's setup
/// priority (rank ascending, unset last), then by acceptance creation date.
pub fn setup_worklist(bundles: &mut [AwardBundle], user: &UserRef) -> Vec<AwardId> {
    let mut entries: Vec<(u8, chrono::DateTime<chrono::Utc>, AwardId)> = Vec::new();

    for bundle in bundles.iter_mut() {
        if !in_setup_worklist(&bundle.award, user) {
            continue;
        }
        let award_id = bundle.award.id;
        let acceptance = crate::sections::store::current_acceptance(bundle);
        let rank = acceptance.setup_priority.map(|p| p.rank()).unwrap_or(u8::MAX);
        entries.push((rank, acceptance.creation_date, award_id));
    }

    entries.sort();
    entries.into_iter().map(|(_, _, id)| id).collect()
}
