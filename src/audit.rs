//! Audit trail recorder.
//!
//! Tracks when each workflow step started and finished, per award, per
//! modification generation, per assigned user. Recording is idempotent under
//! retry of the same logical transition: at most one open entry exists per
//! key, and a closed entry is never re-closed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::award::bundle::AwardBundle;
use crate::award::types::Stage;
use crate::sections::types::WaitReason;

pub const GENERATION_ORIGINAL: &str = "Original Award";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    pub award_id: u64,
    /// "Original Award" or "Modification #N".
    pub generation: String,
    /// Stage name or wait-reason label.
    pub workflow_step: String,
    pub assigned_user: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_completed: Option<DateTime<Utc>>,
}

impl AuditTrailEntry {
    pub fn is_open(&self) -> bool {
        self.date_completed.is_none()
    }
}

/// Record one step of the current state into the trail.
///
/// If an open entry exists for the key it is closed; a closed entry is left
/// alone; otherwise a fresh open entry is created.
pub fn record_state_entry(
    bundle: &mut AwardBundle,
    generation: &str,
    step: &str,
    assigned_user: Option<String>,
    now: DateTime<Utc>,
) {
    let award_id = bundle.award.id;
    if let Some(entry) = bundle.audit.iter_mut().find(|e| {
        e.generation == generation && e.workflow_step == step && e.assigned_user == assigned_user
    }) {
        if entry.is_open() {
            entry.date_completed = Some(now);
            tracing::debug!(
                award.id = award_id,
                step = step,
                generation = generation,
                "closed audit trail entry"
            );
        }
        return;
    }

    bundle.audit.push(AuditTrailEntry {
        award_id,
        generation: generation.to_string(),
        workflow_step: step.to_string(),
        assigned_user,
        date_created: now,
        date_completed: None,
    });
    tracing::debug!(
        award.id = award_id,
        step = step,
        generation = generation,
        "opened audit trail entry"
    );
}

/// Convenience wrapper keyed by stage, resolving the stage's assigned user.
pub fn record_stage_entry(
    bundle: &mut AwardBundle,
    generation: &str,
    stage: Stage,
    now: DateTime<Utc>,
) {
    let user = crate::assignment::resolve_user(&bundle.award, stage, false)
        .map(|u| u.full_name.clone());
    record_state_entry(bundle, generation, stage.name(), user, now);
}

/// Record a change of an award's "waiting for X" reason.
///
/// Closes the open entry for the old reason, opens one for the new reason.
/// A transition into "no reason" closes without reopening.
pub fn record_wait_reason_change(
    bundle: &mut AwardBundle,
    old_reason: Option<WaitReason>,
    new_reason: Option<WaitReason>,
    stage: Stage,
    now: DateTime<Utc>,
) {
    let generation = bundle.generation_label();
    let user = crate::assignment::resolve_user(&bundle.award, stage, false)
        .map(|u| u.full_name.clone());

    if let Some(old) = old_reason {
        if let Some(entry) = bundle.audit.iter_mut().find(|e| {
            e.generation == generation
                && e.workflow_step == old.label()
                && e.assigned_user == user
                && e.is_open()
        }) {
            entry.date_completed = Some(now);
        }
    }

    if let Some(new) = new_reason {
        let already_open = bundle.audit.iter().any(|e| {
            e.generation == generation
                && e.workflow_step == new.label()
                && e.assigned_user == user
                && e.is_open()
        });
        if !already_open {
            let award_id = bundle.award.id;
            bundle.audit.push(AuditTrailEntry {
                award_id,
                generation: generation.clone(),
                workflow_step: new.label().to_string(),
                assigned_user: user,
                date_created: now,
                date_completed: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::award::types::{StageAssignments, UserRef};
    use chrono::Duration;

    fn bundle() -> AwardBundle {
        AwardBundle::new(
            1,
            StageAssignments {
                acceptance: UserRef::new("aa", "Alice Adams", "aa@example.edu"),
                negotiation: None,
                setup: UserRef::new("su", "Sam Usher", "su@example.edu"),
                modification: None,
                subaward: None,
                management: UserRef::new("mg", "Mona Green", "mg@example.edu"),
                closeout: UserRef::new("co", "Carl Oats", "co@example.edu"),
            },
            Utc::now(),
        )
    }

    #[test]
    fn recording_the_same_key_twice_yields_one_closed_row() {
        let mut bundle = bundle();
        let opened = Utc::now();
        let closed = opened + Duration::hours(2);

        record_state_entry(&mut bundle, GENERATION_ORIGINAL, "AwardSetup", None, opened);
        assert_eq!(bundle.audit.len(), 1);
        assert!(bundle.audit[0].is_open());

        record_state_entry(&mut bundle, GENERATION_ORIGINAL, "AwardSetup", None, closed);
        assert_eq!(bundle.audit.len(), 1);
        assert_eq!(bundle.audit[0].date_completed, Some(closed));
        assert_eq!(bundle.audit[0].date_created, opened);
    }

    #[test]
    fn closed_rows_are_never_reclosed() {
        let mut bundle = bundle();
        let opened = Utc::now();
        let closed = opened + Duration::hours(1);
        let later = opened + Duration::hours(5);

        record_state_entry(&mut bundle, GENERATION_ORIGINAL, "AwardSetup", None, opened);
        record_state_entry(&mut bundle, GENERATION_ORIGINAL, "AwardSetup", None, closed);
        record_state_entry(&mut bundle, GENERATION_ORIGINAL, "AwardSetup", None, later);

        assert_eq!(bundle.audit.len(), 1);
        assert_eq!(bundle.audit[0].date_completed, Some(closed));
    }

    #[test]
    fn generations_track_separate_rows_for_the_same_step() {
        let mut bundle = bundle();
        let now = Utc::now();

        record_state_entry(&mut bundle, GENERATION_ORIGINAL, "AwardAcceptance", None, now);
        record_state_entry(&mut bundle, "Modification #1", "AwardAcceptance", None, now);

        assert_eq!(bundle.audit.len(), 2);
        assert!(bundle.audit.iter().all(|e| e.is_open()));
    }

    #[test]
    fn wait_reason_change_closes_old_and_opens_new() {
        let mut bundle = bundle();
        let first = Utc::now();
        let second = first + Duration::hours(3);

        record_wait_reason_change(
            &mut bundle,
            None,
            Some(WaitReason::RevisedBudget),
            Stage::Setup,
            first,
        );
        record_wait_reason_change(
            &mut bundle,
            Some(WaitReason::RevisedBudget),
            Some(WaitReason::Fcoi),
            Stage::Setup,
            second,
        );

        let revised = bundle
            .audit
            .iter()
            .find(|e| e.workflow_step == "Revised Budget")
            .unwrap();
        assert_eq!(revised.date_completed, Some(second));

        let fcoi = bundle.audit.iter().find(|e| e.workflow_step == "FCOI").unwrap();
        assert!(fcoi.is_open());
        assert_eq!(fcoi.assigned_user.as_deref(), Some("Sam Usher"));
    }
}
