//! Modification cycles: closing out the current acceptance and negotiation
//! cycles, cloning fresh current rows, and resetting the award to intake.

use chrono::Utc;

use award_flow::award::bundle::AwardBundle;
use award_flow::award::types::{AwardStatus, Stage, StageAssignments, UserRef};
use award_flow::config::NotificationConfig;
use award_flow::error::WorkflowError;
use award_flow::sections::store;
use award_flow::workflow::transitions;

fn config() -> NotificationConfig {
    NotificationConfig {
        url_hostname: "http://awards.test".to_string(),
        from_address: "workflow@awards.test".to_string(),
        phs_funded_recipients: vec!["compliance@awards.test".to_string()],
    }
}

fn assignments() -> StageAssignments {
    StageAssignments {
        acceptance: UserRef::new("aa", "Alice Adams", "aa@example.edu"),
        negotiation: Some(UserRef::new("ng", "Nina Gold", "ng@example.edu")),
        setup: UserRef::new("su", "Sam Usher", "su@example.edu"),
        modification: Some(UserRef::new("md", "Mel Drake", "md@example.edu")),
        subaward: None,
        management: UserRef::new("mg", "Mona Green", "mg@example.edu"),
        closeout: UserRef::new("co", "Carl Oats", "co@example.edu"),
    }
}

fn completed_award() -> AwardBundle {
    let now = Utc::now();
    let mut bundle = AwardBundle::new(1, assignments(), now);
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    for _ in 0..3 {
        transitions::advance(&mut bundle, None, &config(), now).unwrap();
    }
    transitions::advance(&mut bundle, Some(Stage::Management), &config(), now).unwrap();
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Complete);
    bundle
}

#[test]
fn first_modification_resets_the_award_to_intake() {
    let now = Utc::now();
    let mut bundle = completed_award();

    let outcome =
        transitions::create_modification_cycle(&mut bundle, "Modification", &config(), now)
            .unwrap();
    assert!(outcome.advanced);
    assert_eq!(bundle.award.status(), AwardStatus::Intake);
    assert_eq!(bundle.generation_label(), "Modification #1");

    // Fresh current rows, prior cycles demoted with their completion dates.
    assert_eq!(bundle.acceptances.len(), 2);
    let old = &bundle.acceptances[0];
    assert!(!old.current_modification);
    assert!(old.acceptance_completion_date.is_some());

    let current = store::current_acceptance(&mut bundle);
    assert_eq!(current.award_text.as_deref(), Some("Modification #1"));
    assert!(current.acceptance_completion_date.is_none());
    assert!(current.award_issue_date.is_none());

    assert_eq!(bundle.negotiations.len(), 2);

    // A fresh pending modification row is opened for the new cycle.
    assert_eq!(bundle.modifications.len(), 1);
    assert!(!bundle.modifications[0].is_edited);

    // The new generation's intake entry is open in the audit trail.
    assert!(bundle
        .audit
        .iter()
        .any(|e| e.generation == "Modification #1"
            && e.workflow_step == "AwardAcceptance"
            && e.is_open()));
}

#[test]
fn modification_cycles_are_numbered_by_prior_acceptances() {
    let now = Utc::now();
    let mut bundle = completed_award();

    transitions::create_modification_cycle(&mut bundle, "Modification", &config(), now).unwrap();
    transitions::create_modification_cycle(&mut bundle, "Modification", &config(), now).unwrap();

    assert_eq!(bundle.acceptances.len(), 3);
    assert_eq!(bundle.generation_label(), "Modification #2");
    let current = store::current_acceptance(&mut bundle);
    assert_eq!(current.award_text.as_deref(), Some("Modification #2"));
}

#[test]
fn phs_funded_awards_trigger_a_compliance_notification() {
    let now = Utc::now();
    let mut bundle = completed_award();
    store::current_acceptance_mut(&mut bundle).phs_funded = Some(true);

    let outcome =
        transitions::create_modification_cycle(&mut bundle, "Modification", &config(), now)
            .unwrap();

    let compliance = outcome
        .notifications
        .iter()
        .find(|n| n.recipients == vec!["compliance@awards.test".to_string()])
        .expect("compliance notification queued");
    assert!(compliance.body.contains("PHS funded"));
}

#[test]
fn modification_clears_routing_and_done_flags() {
    let now = Utc::now();
    let mut bundle = completed_award();
    bundle.award.subaward_done = true;
    bundle.award.management_done = true;

    transitions::create_modification_cycle(&mut bundle, "Modification", &config(), now).unwrap();
    assert!(!bundle.award.subaward_done);
    assert!(!bundle.award.management_done);
    assert!(!bundle.award.state.routed_to_modification());
    assert!(!bundle.award.state.dual_setup());
}

#[test]
fn modification_reset_closes_prior_generation_audit_ranges() {
    let now = Utc::now();
    let mut bundle = AwardBundle::new(1, assignments(), now);
    transitions::advance(&mut bundle, None, &config(), now).unwrap();

    // Dual negotiation/modification pairing leaves the modification track's
    // audit range open all the way through completion.
    transitions::route_to_modification_track(&mut bundle, true, &config(), now).unwrap();
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    transitions::advance(&mut bundle, Some(Stage::Management), &config(), now).unwrap();
    transitions::advance(&mut bundle, None, &config(), now).unwrap();
    assert_eq!(bundle.award.status(), AwardStatus::Complete);
    assert!(bundle
        .audit
        .iter()
        .any(|e| e.workflow_step == "AwardModification" && e.is_open()));

    transitions::create_modification_cycle(&mut bundle, "Modification", &config(), now).unwrap();

    for entry in &bundle.audit {
        if entry.is_open() {
            assert_eq!(entry.workflow_step, "AwardAcceptance");
        }
    }
    assert!(bundle
        .audit
        .iter()
        .any(|e| e.workflow_step == "AwardModification" && !e.is_open()));
}

#[test]
fn new_awards_cannot_start_a_modification() {
    let now = Utc::now();
    let mut bundle = AwardBundle::new(1, assignments(), now);

    let err = transitions::create_modification_cycle(&mut bundle, "Modification", &config(), now)
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            status: AwardStatus::New
        }
    ));
}

#[test]
fn rejected_modification_leaves_the_bundle_untouched() {
    let now = Utc::now();
    let mut bundle = completed_award();
    let snapshot = bundle.clone();

    let err =
        transitions::create_modification_cycle(&mut bundle, "   ", &config(), now).unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    assert_eq!(bundle.award.status(), snapshot.award.status());
    assert_eq!(bundle.acceptances.len(), snapshot.acceptances.len());
    assert_eq!(bundle.negotiations.len(), snapshot.negotiations.len());
    assert_eq!(bundle.modifications.len(), snapshot.modifications.len());
    assert_eq!(bundle.audit, snapshot.audit);
}
