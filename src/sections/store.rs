//! Section store: access to cycle-aware rows with the single-current-cycle
//! invariant enforced, and cloning of sections into a new modification cycle.

use chrono::{DateTime, Utc};

use crate::award::bundle::AwardBundle;
use crate::award::types::SectionId;
use crate::sections::types::NegotiationStatus;

/// Index of the current acceptance row.
///
/// If more than one row claims `current_modification = true` (a historical
/// data-consistency bug), all but the most recently created are demoted and
/// the survivor returned. The repair is logged, not fatal.
pub fn current_acceptance_index(bundle: &mut AwardBundle) -> usize {
    let mut current: Vec<usize> = bundle
        .acceptances
        .iter()
        .enumerate()
        .filter(|(_, a)| a.current_modification)
        .map(|(i, _)| i)
        .collect();

    if current.len() > 1 {
        tracing::warn!(
            award.id = bundle.award.id,
            rows = current.len(),
            "multiple current acceptance rows found, demoting extras"
        );
        current.sort_by_key(|&i| {
            (
                bundle.acceptances[i].creation_date,
                bundle.acceptances[i].id,
            )
        });
        let survivor = *current.last().expect("non-empty");
        for &i in &current {
            if i != survivor {
                bundle.acceptances[i].current_modification = false;
            }
        }
        return survivor;
    }

    current
        .first()
        .copied()
        .expect("award always has a current acceptance")
}

pub fn current_acceptance_mut(
    bundle: &mut AwardBundle,
) -> &mut crate::sections::types::AwardAcceptance {
    let idx = current_acceptance_index(bundle);
    &mut bundle.acceptances[idx]
}

pub fn current_acceptance(bundle: &mut AwardBundle) -> &crate::sections::types::AwardAcceptance {
    let idx = current_acceptance_index(bundle);
    &bundle.acceptances[idx]
}

/// Index of the current negotiation row, with the same self-healing repair.
pub fn current_negotiation_index(bundle: &mut AwardBundle) -> usize {
    let mut current: Vec<usize> = bundle
        .negotiations
        .iter()
        .enumerate()
        .filter(|(_, n)| n.current_modification)
        .map(|(i, _)| i)
        .collect();

    if current.len() > 1 {
        tracing::warn!(
            award.id = bundle.award.id,
            rows = current.len(),
            "multiple current negotiation rows found, demoting extras"
        );
        current.sort_by_key(|&i| {
            (
                bundle.negotiations[i].creation_date,
                bundle.negotiations[i].id,
            )
        });
        let survivor = *current.last().expect("non-empty");
        for &i in &current {
            if i != survivor {
                bundle.negotiations[i].current_modification = false;
            }
        }
        return survivor;
    }

    current
        .first()
        .copied()
        .expect("award always has a current negotiation")
}

pub fn current_negotiation_mut(
    bundle: &mut AwardBundle,
) -> &mut crate::sections::types::AwardNegotiation {
    let idx = current_negotiation_index(bundle);
    &mut bundle.negotiations[idx]
}

/// Close the current acceptance cycle and clone it into a fresh current row.
///
/// The clone gets a new identity and label, cleared completion and issue
/// dates, and cleared review flags; the source row is demoted to history.
pub fn clone_acceptance_into_new_cycle(
    bundle: &mut AwardBundle,
    label: &str,
    now: DateTime<Utc>,
) -> SectionId {
    let idx = current_acceptance_index(bundle);
    let new_id = bundle.alloc_section_id();

    let source = &mut bundle.acceptances[idx];
    source.current_modification = false;

    let mut clone = source.clone();
    clone.id = new_id;
    clone.creation_date = now;
    clone.current_modification = true;
    clone.award_text = Some(label.to_string());
    clone.acceptance_completion_date = None;
    clone.fcoi_cleared_date = None;
    clone.new_funding = None;
    clone.award_issue_date = None;
    clone.award_acceptance_date = None;

    bundle.acceptances.push(clone);
    new_id
}

/// Close the current negotiation cycle and clone it into a fresh current
/// row, reset back to the queue.
pub fn clone_negotiation_into_new_cycle(
    bundle: &mut AwardBundle,
    label: &str,
    now: DateTime<Utc>,
) -> SectionId {
    let idx = current_negotiation_index(bundle);
    let new_id = bundle.alloc_section_id();

    let source = &mut bundle.negotiations[idx];
    source.current_modification = false;

    let mut clone = source.clone();
    clone.id = new_id;
    clone.creation_date = now;
    clone.date_assigned = None;
    clone.current_modification = true;
    clone.award_text = Some(label.to_string());
    clone.negotiation_completion_date = None;
    clone.negotiation_status = NegotiationStatus::InQueue;
    clone.comments = String::new();
    clone.negotiation_notes = String::new();

    bundle.negotiations.push(clone);
    new_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::award::types::{StageAssignments, UserRef};
    use crate::sections::types::AwardAcceptance;
    use chrono::{Duration, Utc};

    fn assignments() -> StageAssignments {
        StageAssignments {
            acceptance: UserRef::new("aa", "Alice Adams", "aa@example.edu"),
            negotiation: None,
            setup: UserRef::new("su", "Sam Usher", "su@example.edu"),
            modification: None,
            subaward: None,
            management: UserRef::new("mg", "Mona Green", "mg@example.edu"),
            closeout: UserRef::new("co", "Carl Oats", "co@example.edu"),
        }
    }

    #[test]
    fn duplicate_current_rows_are_demoted_to_the_newest() {
        let now = Utc::now();
        let mut bundle = AwardBundle::new(1, assignments(), now);

        // Inject a second current row, newer than the provisioned one.
        let rogue_id = bundle.alloc_section_id();
        let rogue = AwardAcceptance::new(rogue_id, 1, now + Duration::hours(1));
        bundle.acceptances.push(rogue);

        let idx = current_acceptance_index(&mut bundle);
        assert_eq!(bundle.acceptances[idx].id, rogue_id);
        assert_eq!(
            bundle
                .acceptances
                .iter()
                .filter(|a| a.current_modification)
                .count(),
            1
        );
    }

    #[test]
    fn cycle_clone_resets_cycle_fields_and_demotes_source() {
        let now = Utc::now();
        let mut bundle = AwardBundle::new(1, assignments(), now);
        {
            let acceptance = current_acceptance_mut(&mut bundle);
            acceptance.project_title = "Sensor Networks".to_string();
            acceptance.award_issue_date = Some(now.date_naive());
            acceptance.acceptance_completion_date = Some(now);
        }

        let new_id = clone_acceptance_into_new_cycle(&mut bundle, "Modification #1", now);

        let old = &bundle.acceptances[0];
        assert!(!old.current_modification);

        let new = bundle.acceptances.iter().find(|a| a.id == new_id).unwrap();
        assert!(new.current_modification);
        assert_eq!(new.award_text.as_deref(), Some("Modification #1"));
        assert_eq!(new.project_title, "Sensor Networks");
        assert!(new.award_issue_date.is_none());
        assert!(new.acceptance_completion_date.is_none());
    }

    #[test]
    fn negotiation_clone_returns_to_queue() {
        let now = Utc::now();
        let mut bundle = AwardBundle::new(1, assignments(), now);
        {
            let negotiation = current_negotiation_mut(&mut bundle);
            negotiation.negotiation_status = NegotiationStatus::WaitingForSponsor;
            negotiation.comments = "redlines pending".to_string();
        }

        let new_id = clone_negotiation_into_new_cycle(&mut bundle, "Modification #1", now);
        let new = bundle.negotiations.iter().find(|n| n.id == new_id).unwrap();
        assert_eq!(new.negotiation_status, NegotiationStatus::InQueue);
        assert!(new.comments.is_empty());
        assert!(new.date_assigned.is_none());
    }
}
