//! Transition behavior of the award state machine: sequential walks, stage
//! skipping, the dual tracks, and the management/subaward gate.

use chrono::Utc;

use award_flow::award::bundle::AwardBundle;
use award_flow::award::types::{AwardStatus, Stage, StageAssignments, UserRef};
use award_flow::config::NotificationConfig;
use award_flow::error::WorkflowError;
use award_flow::workflow::transitions;

fn config() -> NotificationConfig {
    NotificationConfig {
        url_hostname: "http://awards.test".to_string(),
        from_address: "workflow@awards.test".to_string(),
        phs_funded_recipients: vec!["compliance@awards.test".to_string()],
    }
}

fn fully_staffed() -> StageAssignments {
    StageAssignments {
        acceptance: UserRef::new("aa", "Alice Adams", "aa@example.edu"),
        negotiation: Some(UserRef::new("ng", "Nina Gold", "ng@example.edu")),
        setup: UserRef::new("su", "Sam Usher", "su@example.edu"),
        modification: Some(UserRef::new("md", "Mel Drake", "md@example.edu")),
        subaward: Some(UserRef::new("sb", "Seth Bond", "sb@example.edu")),
        management: UserRef::new("mg", "Mona Green", "mg@example.edu"),
        closeout: UserRef::new("co", "Carl Oats", "co@example.edu"),
    }
}

fn minimally_staffed() -> StageAssignments {
    StageAssignments {
        negotiation: None,
        modification: None,
        subaward: None,
        ..fully_staffed()
    }
}

fn new_bundle(assignments: StageAssignments) -> AwardBundle {
    let mut bundle = AwardBundle::new(1, assignments, Utc::now());
    // Awards move straight from creation into intake.
    transitions::advance(&mut bundle, None, &config(), Utc::now()).unwrap();
    bundle
}

#[test]
fn new_award_lands_at_intake_with_empty_audit_trail() {
    let mut bundle = AwardBundle::new(1, fully_staffed(), Utc::now());
    let outcome = transitions::advance(&mut bundle, None, &config(), Utc::now()).unwrap();

    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Intake);
    assert!(bundle.audit.is_empty());

    // The intake user is told the award landed on their desk.
    assert_eq!(outcome.notifications.len(), 1);
    assert_eq!(
        outcome.notifications[0].recipients,
        vec!["aa@example.edu".to_string()]
    );
}

#[test]
fn unstaffed_negotiation_is_skipped_on_advance() {
    let mut bundle = new_bundle(minimally_staffed());
    let outcome = transitions::advance(&mut bundle, None, &config(), Utc::now()).unwrap();

    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Setup);
    assert!(bundle.setup.date_assigned.is_some());

    // With no negotiator, intake's completion lands on the acceptance cycle.
    let acceptance = bundle
        .acceptances
        .iter()
        .find(|a| a.current_modification)
        .unwrap();
    assert!(acceptance.acceptance_completion_date.is_some());
    assert!(bundle
        .audit
        .iter()
        .any(|e| e.workflow_step == "AwardSetup" && e.is_open()));
}

#[test]
fn sequential_walk_reaches_complete() {
    let now = Utc::now();
    let mut bundle = new_bundle(fully_staffed());

    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Negotiation);

    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Setup);
    let negotiation = bundle
        .negotiations
        .iter()
        .find(|n| n.current_modification)
        .unwrap();
    assert!(negotiation.negotiation_completion_date.is_some());

    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::ManagementSubaward);
    assert!(bundle.setup.setup_completion_date.is_some());

    // Subaward finishing alone does not move the status.
    let outcome =
        transitions::advance(&mut bundle, Some(Stage::Subaward), &config(), now).unwrap();
    assert!(!outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::ManagementSubaward);

    let outcome =
        transitions::advance(&mut bundle, Some(Stage::Management), &config(), now).unwrap();
    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Closeout);
    assert!(bundle.management.management_completion_date.is_some());

    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Complete);
    assert!(bundle.closeout.closeout_completion_date.is_some());

    let err = transitions::advance(&mut bundle, None, &config(), now).unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}

#[test]
fn management_subaward_requires_a_triggering_stage() {
    let now = Utc::now();
    let mut bundle = new_bundle(fully_staffed());
    for _ in 0..3 {
        transitions::advance(&mut bundle, None, &config(), now).unwrap();
    }
    assert_eq!(bundle.award.status(), AwardStatus::ManagementSubaward);

    let err = transitions::advance(&mut bundle, None, &config(), now).unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            status: AwardStatus::ManagementSubaward
        }
    ));
}

#[test]
fn management_finishing_first_also_holds_for_subaward() {
    let now = Utc::now();
    let mut bundle = new_bundle(fully_staffed());
    for _ in 0..3 {
        transitions::advance(&mut bundle, None, &config(), now).unwrap();
    }
    assert_eq!(bundle.award.status(), AwardStatus::ManagementSubaward);

    let outcome =
        transitions::advance(&mut bundle, Some(Stage::Management), &config(), now).unwrap();
    assert!(!outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::ManagementSubaward);
    assert!(bundle.management.management_completion_date.is_some());

    let outcome =
        transitions::advance(&mut bundle, Some(Stage::Subaward), &config(), now).unwrap();
    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Closeout);
}

#[test]
fn unstaffed_subaward_auto_completes_with_management() {
    let now = Utc::now();
    let mut bundle = new_bundle(minimally_staffed());
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::ManagementSubaward);

    let outcome =
        transitions::advance(&mut bundle, Some(Stage::Management), &config(), now).unwrap();
    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Closeout);
    // No subaward user, no subaward audit entry.
    assert!(!bundle.audit.iter().any(|e| e.workflow_step == "Subaward"));
}

#[test]
fn dual_split_activates_negotiation_and_setup_together() {
    let now = Utc::now();
    let mut bundle = new_bundle(fully_staffed());

    let outcome = transitions::split_to_parallel_tracks(&mut bundle, true, &config(), now).unwrap();
    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Negotiation);
    assert!(bundle.award.state.dual_negotiation());
    assert!(bundle.setup.date_assigned.is_some());

    // Both halves have open audit entries.
    assert!(bundle
        .audit
        .iter()
        .any(|e| e.workflow_step == "AwardNegotiation" && e.is_open()));
    assert!(bundle
        .audit
        .iter()
        .any(|e| e.workflow_step == "AwardSetup" && e.is_open()));

    // Setup's half completes as the award moves through the setup status.
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Setup);
    assert!(bundle.award.state.dual_setup());
    assert!(!bundle.award.state.dual_negotiation());

    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::ManagementSubaward);
    assert!(!bundle.award.state.dual_setup());
}

#[test]
fn split_without_dual_mode_stays_sequential() {
    let now = Utc::now();
    let mut bundle = new_bundle(fully_staffed());

    transitions::split_to_parallel_tracks(&mut bundle, false, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Negotiation);
    assert!(!bundle.award.state.dual_setup());
}

#[test]
fn routed_setup_clones_into_a_pending_modification() {
    let now = Utc::now();
    let mut bundle = new_bundle(minimally_staffed());
    bundle.award.assignments.modification = Some(UserRef::new("md", "Mel Drake", "md@example.edu"));

    let outcome =
        transitions::mark_modification_flow(&mut bundle, true, false, &config(), now).unwrap();
    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Setup);
    assert!(bundle.award.state.routed_to_modification());

    assert_eq!(bundle.modifications.len(), 1);
    assert!(!bundle.modifications[0].is_edited);

    // The modification track's audit entry carries its own generation label.
    assert!(bundle
        .audit
        .iter()
        .any(|e| e.workflow_step == "AwardModification" && e.generation == "Modification #0"));
}

#[test]
fn dual_modification_pairing_marks_common_work() {
    let now = Utc::now();
    let mut bundle = new_bundle(fully_staffed());

    transitions::route_to_modification_track(&mut bundle, true, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Negotiation);
    assert!(bundle.award.state.dual_modification());
    assert!(bundle.award.state.common_modification());
}

#[test]
fn track_operations_reject_awards_already_off_the_sequential_track() {
    let now = Utc::now();
    let mut bundle = new_bundle(fully_staffed());
    transitions::split_to_parallel_tracks(&mut bundle, true, &config(), now).unwrap();

    let err =
        transitions::route_to_modification_track(&mut bundle, true, &config(), now).unwrap_err();
    assert!(matches!(err, WorkflowError::UnsupportedCombination { .. }));

    let err =
        transitions::mark_modification_flow(&mut bundle, true, false, &config(), now).unwrap_err();
    assert!(matches!(err, WorkflowError::UnsupportedCombination { .. }));
}
