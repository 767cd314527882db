//! Proposal records and the one-shot reconciliation steps that sync fields
//! between proposals, the current acceptance, the setup section and the
//! first PTA number.
//!
//! Reconciliation is invoked explicitly by the orchestrator after a save,
//! never from inside an entity's own persistence path, so there are no
//! hidden save-triggers-save chains.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::award::bundle::AwardBundle;
use crate::award::types::{AwardId, SectionId};
use crate::sections::store;

/// Proposal data as produced by the external feed adapters. A dummy row is
/// provisioned at award creation so the aggregate is never proposal-less.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: SectionId,
    pub award_id: AwardId,
    pub dummy: bool,
    pub is_first_proposal: bool,
    pub creation_date: DateTime<Utc>,
    pub principal_investigator: String,
    pub project_title: String,
    pub agency_name: String,
    pub who_is_prime: String,
    pub project_start_date: Option<NaiveDate>,
    pub project_end_date: Option<NaiveDate>,
    pub total_costs: Option<f64>,
    pub total_direct_costs: Option<f64>,
    pub total_indirect_costs: Option<f64>,
}

impl Proposal {
    pub fn dummy(id: SectionId, award_id: AwardId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            award_id,
            dummy: true,
            is_first_proposal: false,
            creation_date: now,
            principal_investigator: String::new(),
            project_title: String::new(),
            agency_name: String::new(),
            who_is_prime: String::new(),
            project_start_date: None,
            project_end_date: None,
            total_costs: None,
            total_direct_costs: None,
            total_indirect_costs: None,
        }
    }
}

/// Incoming proposal payload from an import adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub principal_investigator: String,
    pub project_title: String,
    pub agency_name: String,
    pub who_is_prime: String,
    pub project_start_date: Option<NaiveDate>,
    pub project_end_date: Option<NaiveDate>,
    pub total_costs: Option<f64>,
    pub total_direct_costs: Option<f64>,
    pub total_indirect_costs: Option<f64>,
}

/// Attach an imported proposal to the award and copy its cost and title
/// fields onto the current acceptance.
pub fn ingest_proposal(
    bundle: &mut AwardBundle,
    record: ProposalRecord,
    now: DateTime<Utc>,
) -> SectionId {
    let id = bundle.alloc_section_id();
    let is_first = bundle.first_real_proposal().is_none();
    let award_id = bundle.award.id;
    bundle.proposals.push(Proposal {
        id,
        award_id,
        dummy: false,
        is_first_proposal: is_first,
        creation_date: now,
        principal_investigator: record.principal_investigator,
        project_title: record.project_title.clone(),
        agency_name: record.agency_name,
        who_is_prime: record.who_is_prime,
        project_start_date: record.project_start_date,
        project_end_date: record.project_end_date,
        total_costs: record.total_costs,
        total_direct_costs: record.total_direct_costs,
        total_indirect_costs: record.total_indirect_costs,
    });

    let acceptance = store::current_acceptance_mut(bundle);
    acceptance.project_title = record.project_title;
    acceptance.award_total_costs = record.total_costs;
    acceptance.award_direct_costs = record.total_direct_costs;
    acceptance.award_indirect_costs = record.total_indirect_costs;

    tracing::info!(award.id = award_id, proposal.id = id, "ingested proposal");
    id
}

/// Copy shared proposal fields onto the setup section. Run when an award
/// reaches the setup stage.
pub fn copy_proposal_into_setup(bundle: &mut AwardBundle) {
    let Some(proposal) = bundle.most_recent_proposal() else {
        return;
    };
    let start = proposal.project_start_date;
    let end = proposal.project_end_date;
    let title = proposal.project_title.clone();
    let agency = proposal.agency_name.clone();

    bundle.setup.start_date = start;
    bundle.setup.end_date = end;
    bundle.setup.project_title = title;
    bundle.setup.agency_name = agency;
}

/// Back-propagate fields from the first PTA number onto the most recent
/// proposal and the current acceptance.
///
/// One-directional and one-shot: later PTA rows never propagate, and nothing
/// here triggers further saves.
pub fn reconcile_first_pta(bundle: &mut AwardBundle, pta_id: SectionId) {
    let Some(first) = bundle.first_pta_number() else {
        return;
    };
    if first.id != pta_id {
        return;
    }
    let first = first.clone();

    if let Some(proposal) = bundle.proposals.iter_mut().filter(|p| !p.dummy).last() {
        proposal.agency_name = first.agency_name.clone();
        proposal.who_is_prime = first.who_is_prime.clone();
        proposal.project_title = first.project_title.clone();
        proposal.project_start_date = first.start_date;
        proposal.project_end_date = first.end_date;
    }

    let acceptance = store::current_acceptance_mut(bundle);
    acceptance.agency_award_number = first.agency_award_number.clone();
    acceptance.sponsor_award_number = first.sponsor_award_number.clone();
    acceptance.eas_status = first.eas_status;
    acceptance.project_title = first.project_title.clone();

    tracing::debug!(
        award.id = bundle.award.id,
        pta.id = pta_id,
        "reconciled first PTA number onto proposal and acceptance"
    );
}
