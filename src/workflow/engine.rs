//! Workflow orchestrator.
//!
//! Every operation follows the same shape: load the bundle, validate, apply
//! one transition in memory, save the whole bundle, then dispatch whatever
//! notifications the transition queued. Notifications go out only after the
//! save has committed, and a delivery failure never fails the operation.

use chrono::Utc;
use std::sync::Arc;

use crate::assignment;
use crate::audit;
use crate::award::bundle::AwardBundle;
use crate::award::types::{AwardId, SectionId, Stage, StageAssignments, UserRef};
use crate::config::NotificationConfig;
use crate::error::WorkflowError;
use crate::notify::{self, NotificationDispatcher, NotificationSender};
use crate::persistence::AwardRepository;
use crate::proposal::{self, ProposalRecord};
use crate::sections::store;
use crate::sections::types::{AwardAcceptance, PtaNumber, WaitReason};
use crate::telemetry;
use crate::validation;
use crate::workflow::transitions::{self, TransitionOutcome};

pub struct WorkflowEngine {
    repository: Arc<dyn AwardRepository>,
    dispatcher: NotificationDispatcher,
    notifications: NotificationConfig,
}

impl WorkflowEngine {
    pub fn new(
        repository: Arc<dyn AwardRepository>,
        sender: Arc<dyn NotificationSender>,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            repository,
            dispatcher: NotificationDispatcher::new(sender),
            notifications,
        }
    }

    /// Create a new award and move it straight into intake.
    pub async fn create_award(
        &self,
        assignments: StageAssignments,
    ) -> Result<AwardBundle, WorkflowError> {
        let correlation_id = telemetry::generate_correlation_id();
        let span = telemetry::create_workflow_span("create_award", None, Some(&correlation_id));
        let _guard = span.enter();

        let now = Utc::now();
        let id = self.repository.next_award_id().await?;
        let mut bundle = AwardBundle::new(id, assignments, now);

        let outcome = transitions::advance(&mut bundle, None, &self.notifications, now)?;
        self.repository.create(&bundle).await?;
        self.dispatcher.dispatch(outcome.notifications).await;

        tracing::info!(award.id = id, "award created");
        Ok(bundle)
    }

    pub async fn load(&self, id: AwardId) -> Result<AwardBundle, WorkflowError> {
        Ok(self.repository.load(id).await?)
    }

    /// Advance the award to its next step. At the management/subaward status
    /// the triggering stage must be named; elsewhere it is ignored.
    pub async fn advance(
        &self,
        id: AwardId,
        triggering_stage: Option<Stage>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition(id, "advance", |bundle, config, now| {
            let missing = validation::validate_before_advance(bundle, triggering_stage);
            if !missing.is_empty() {
                return Err(WorkflowError::MissingFields(missing));
            }
            transitions::advance(bundle, triggering_stage, config, now)
        })
        .await
    }

    /// Hand intake off to negotiation and setup, in parallel when requested.
    pub async fn split_to_parallel_tracks(
        &self,
        id: AwardId,
        dual_mode: bool,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition(id, "split_to_parallel_tracks", |bundle, config, now| {
            transitions::split_to_parallel_tracks(bundle, dual_mode, config, now)
        })
        .await
    }

    /// Hand intake off to the negotiation/modification pairing.
    pub async fn route_to_modification_track(
        &self,
        id: AwardId,
        dual_modification: bool,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition(id, "route_to_modification_track", |bundle, config, now| {
            transitions::route_to_modification_track(bundle, dual_modification, config, now)
        })
        .await
    }

    /// Route or keep setup work on the normal track.
    pub async fn mark_modification_flow(
        &self,
        id: AwardId,
        modification_flag: bool,
        setup_flag: bool,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition(id, "mark_modification_flow", |bundle, config, now| {
            transitions::mark_modification_flow(bundle, modification_flag, setup_flag, config, now)
        })
        .await
    }

    /// Start a new modification cycle, resetting the award to intake.
    pub async fn create_modification_cycle(
        &self,
        id: AwardId,
        label: &str,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition(id, "create_modification_cycle", |bundle, config, now| {
            transitions::create_modification_cycle(bundle, label, config, now)
        })
        .await
    }

    /// Attach an imported proposal to the award.
    pub async fn ingest_proposal(
        &self,
        id: AwardId,
        record: ProposalRecord,
    ) -> Result<SectionId, WorkflowError> {
        let mut bundle = self.repository.load(id).await?;
        let proposal_id = proposal::ingest_proposal(&mut bundle, record, Utc::now());
        self.repository.save(&bundle).await?;
        Ok(proposal_id)
    }

    /// Apply an edit to the current acceptance cycle, firing the FCOI and
    /// PHS notifications when those fields are newly set.
    pub async fn update_current_acceptance<F>(
        &self,
        id: AwardId,
        apply: F,
    ) -> Result<(), WorkflowError>
    where
        F: FnOnce(&mut AwardAcceptance),
    {
        let mut bundle = self.repository.load(id).await?;
        let (old_fcoi, old_phs) = {
            let acceptance = store::current_acceptance(&mut bundle);
            (acceptance.fcoi_cleared_date, acceptance.phs_funded)
        };

        apply(store::current_acceptance_mut(&mut bundle));

        let (new_fcoi, new_phs) = {
            let acceptance = store::current_acceptance(&mut bundle);
            (acceptance.fcoi_cleared_date, acceptance.phs_funded)
        };

        let mut queued = Vec::new();
        if let (None, Some(cleared)) = (old_fcoi, new_fcoi) {
            queued.push(notify::fcoi_cleared(&bundle, &self.notifications, cleared));
        }
        if old_phs != Some(true) && new_phs == Some(true) {
            let with_modification = bundle.acceptances.len() > 1;
            queued.push(notify::phs_funded(
                &bundle,
                &self.notifications,
                with_modification,
            ));
        }

        self.repository.save(&bundle).await?;
        self.dispatcher.dispatch(queued).await;
        Ok(())
    }

    /// Save a PTA number and, if it is the first for this award, reconcile
    /// its shared fields back onto the proposal and acceptance.
    pub async fn save_pta_number(
        &self,
        id: AwardId,
        mut pta: PtaNumber,
    ) -> Result<SectionId, WorkflowError> {
        let mut bundle = self.repository.load(id).await?;
        pta.id = bundle.alloc_section_id();
        pta.award_id = id;
        let pta_id = pta.id;
        bundle.pta_numbers.push(pta);
        proposal::reconcile_first_pta(&mut bundle, pta_id);
        self.repository.save(&bundle).await?;
        Ok(pta_id)
    }

    /// Change the "waiting for" reason on the setup or modification section,
    /// recording the change as audit trail time ranges.
    pub async fn set_wait_reason(
        &self,
        id: AwardId,
        stage: Stage,
        new_reason: Option<WaitReason>,
    ) -> Result<(), WorkflowError> {
        let mut bundle = self.repository.load(id).await?;
        let now = Utc::now();

        let old_reason = match stage {
            Stage::Setup => {
                let old = bundle.setup.wait_for;
                bundle.setup.wait_for = new_reason;
                bundle.setup.date_wait_for_updated = Some(now);
                old
            }
            Stage::Modification => {
                let Some(modification) = bundle.latest_pending_modification_mut() else {
                    return Err(WorkflowError::Validation(
                        "no pending modification to set a wait reason on".to_string(),
                    ));
                };
                let old = modification.wait_for;
                modification.wait_for = new_reason;
                modification.date_wait_for_updated = Some(now);
                old
            }
            _ => {
                return Err(WorkflowError::Validation(format!(
                    "stage {} does not carry a wait reason",
                    stage.name()
                )))
            }
        };

        if old_reason != new_reason {
            audit::record_wait_reason_change(&mut bundle, old_reason, new_reason, stage, now);
        }
        self.repository.save(&bundle).await?;
        Ok(())
    }

    /// Setup worklist for one user, ordered by priority then age.
    pub async fn setup_worklist(&self, user: &UserRef) -> Result<Vec<AwardId>, WorkflowError> {
        let mut bundles = self.repository.load_all().await?;
        Ok(assignment::setup_worklist(&mut bundles, user))
    }

    async fn transition<F>(
        &self,
        id: AwardId,
        operation: &str,
        apply: F,
    ) -> Result<TransitionOutcome, WorkflowError>
    where
        F: FnOnce(
            &mut AwardBundle,
            &NotificationConfig,
            chrono::DateTime<Utc>,
        ) -> Result<TransitionOutcome, WorkflowError>,
    {
        let correlation_id = telemetry::generate_correlation_id();
        let span = telemetry::create_workflow_span(operation, Some(id), Some(&correlation_id));
        let _guard = span.enter();

        let mut bundle = self.repository.load(id).await?;
        let mut outcome = apply(&mut bundle, &self.notifications, Utc::now())?;
        self.repository.save(&bundle).await?;

        let notifications = std::mem::take(&mut outcome.notifications);
        self.dispatcher.dispatch(notifications).await;
        Ok(outcome)
    }
}
