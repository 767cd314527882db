//! Explicit per-entity field descriptors.
//!
//! Read-only projections (admin display, search-field enumeration, the
//! minimum-field validator) consume these tables instead of introspecting the
//! structs, so "what fields exist" is decoupled from "how they render".

use crate::sections::types::{
    AwardAcceptance, AwardModification, AwardNegotiation, AwardSetup, Subaward,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    DateTime,
    Flag,
    Money,
    Code,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
}

const fn field(name: &'static str, kind: FieldKind, label: &'static str) -> FieldDescriptor {
    FieldDescriptor { name, kind, label }
}

/// Schema surface every validatable section exposes.
pub trait SectionSchema {
    fn schema() -> &'static [FieldDescriptor];

    /// Fields that must hold a value before the section's stage can be
    /// completed.
    fn minimum_fields() -> &'static [&'static str] {
        &[]
    }

    /// Whether the named field currently holds a value. Unknown names report
    /// as unset.
    fn is_field_set(&self, name: &str) -> bool;
}

const ACCEPTANCE_SCHEMA: &[FieldDescriptor] = &[
    field("eas_status", FieldKind::Code, "EAS status"),
    field("new_funding", FieldKind::Flag, "New Funding?"),
    field("phs_funded", FieldKind::Flag, "PHS funded?"),
    field("fcoi_cleared_date", FieldKind::Date, "FCOI cleared date"),
    field("setup_priority", FieldKind::Code, "Award Setup Priority"),
    field("project_title", FieldKind::Text, "Project Title"),
    field("award_issue_date", FieldKind::Date, "Award issue date"),
    field(
        "award_acceptance_date",
        FieldKind::Date,
        "Award acceptance date",
    ),
    field(
        "agency_award_number",
        FieldKind::Text,
        "Agency award number",
    ),
    field(
        "sponsor_award_number",
        FieldKind::Text,
        "Prime Award # (if subawardee)",
    ),
    field("award_total_costs", FieldKind::Money, "Total award costs"),
    field(
        "award_direct_costs",
        FieldKind::Money,
        "Total award direct costs",
    ),
    field(
        "award_indirect_costs",
        FieldKind::Money,
        "Total award indirect costs",
    ),
    field(
        "acceptance_completion_date",
        FieldKind::DateTime,
        "Completion Date",
    ),
];

impl SectionSchema for AwardAcceptance {
    fn schema() -> &'static [FieldDescriptor] {
        ACCEPTANCE_SCHEMA
    }

    fn minimum_fields() -> &'static [&'static str] {
        &["award_issue_date"]
    }

    fn is_field_set(&self, name: &str) -> bool {
        match name {
            "eas_status" => self.eas_status.is_some(),
            "new_funding" => self.new_funding.is_some(),
            "phs_funded" => self.phs_funded.is_some(),
            "fcoi_cleared_date" => self.fcoi_cleared_date.is_some(),
            "setup_priority" => self.setup_priority.is_some(),
            "project_title" => !self.project_title.is_empty(),
            "award_issue_date" => self.award_issue_date.is_some(),
            "award_acceptance_date" => self.award_acceptance_date.is_some(),
            "agency_award_number" => !self.agency_award_number.is_empty(),
            "sponsor_award_number" => !self.sponsor_award_number.is_empty(),
            "award_total_costs" => self.award_total_costs.is_some(),
            "award_direct_costs" => self.award_direct_costs.is_some(),
            "award_indirect_costs" => self.award_indirect_costs.is_some(),
            "acceptance_completion_date" => self.acceptance_completion_date.is_some(),
            _ => false,
        }
    }
}

const NEGOTIATION_SCHEMA: &[FieldDescriptor] = &[
    field("negotiation_status", FieldKind::Code, "Negotiation status"),
    field("negotiation_notes", FieldKind::Text, "Negotiation notes"),
    field("comments", FieldKind::Text, "Comments"),
    field("date_assigned", FieldKind::DateTime, "Date assigned"),
    field(
        "negotiation_completion_date",
        FieldKind::DateTime,
        "Completion Date",
    ),
];

impl SectionSchema for AwardNegotiation {
    fn schema() -> &'static [FieldDescriptor] {
        NEGOTIATION_SCHEMA
    }

    fn is_field_set(&self, name: &str) -> bool {
        match name {
            "negotiation_status" => true,
            "negotiation_notes" => !self.negotiation_notes.is_empty(),
            "comments" => !self.comments.is_empty(),
            "date_assigned" => self.date_assigned.is_some(),
            "negotiation_completion_date" => self.negotiation_completion_date.is_some(),
            _ => false,
        }
    }
}

const SETUP_SCHEMA: &[FieldDescriptor] = &[
    field("short_name", FieldKind::Text, "Award short name"),
    field("project_title", FieldKind::Text, "Project Title"),
    field("agency_name", FieldKind::Text, "Agency name"),
    field("start_date", FieldKind::Date, "Start date"),
    field("end_date", FieldKind::Date, "End date"),
    field("wait_for", FieldKind::Code, "Waiting for"),
    field(
        "setup_completion_date",
        FieldKind::DateTime,
        "Completion Date",
    ),
];

impl SectionSchema for AwardSetup {
    fn schema() -> &'static [FieldDescriptor] {
        SETUP_SCHEMA
    }

    fn is_field_set(&self, name: &str) -> bool {
        match name {
            "short_name" => !self.short_name.is_empty(),
            "project_title" => !self.project_title.is_empty(),
            "agency_name" => !self.agency_name.is_empty(),
            "start_date" => self.start_date.is_some(),
            "end_date" => self.end_date.is_some(),
            "wait_for" => self.wait_for.is_some(),
            "setup_completion_date" => self.setup_completion_date.is_some(),
            _ => false,
        }
    }
}

const MODIFICATION_SCHEMA: &[FieldDescriptor] = &[
    field("short_name", FieldKind::Text, "Award short name"),
    field("project_title", FieldKind::Text, "Project Title"),
    field("agency_name", FieldKind::Text, "Agency name"),
    field("start_date", FieldKind::Date, "Start date"),
    field("end_date", FieldKind::Date, "End date"),
    field("wait_for", FieldKind::Code, "Waiting for"),
    field(
        "modification_completion_date",
        FieldKind::DateTime,
        "Completion Date",
    ),
];

impl SectionSchema for AwardModification {
    fn schema() -> &'static [FieldDescriptor] {
        MODIFICATION_SCHEMA
    }

    fn is_field_set(&self, name: &str) -> bool {
        match name {
            "short_name" => !self.short_name.is_empty(),
            "project_title" => !self.project_title.is_empty(),
            "agency_name" => !self.agency_name.is_empty(),
            "start_date" => self.start_date.is_some(),
            "end_date" => self.end_date.is_some(),
            "wait_for" => self.wait_for.is_some(),
            "modification_completion_date" => self.modification_completion_date.is_some(),
            _ => false,
        }
    }
}

const SUBAWARD_SCHEMA: &[FieldDescriptor] = &[
    field("risk", FieldKind::Code, "Risk"),
    field("amount", FieldKind::Money, "Amount"),
    field("agreement_type", FieldKind::Text, "Agreement type"),
    field("subaward_start", FieldKind::Date, "Subaward start"),
    field("subaward_end", FieldKind::Date, "Subaward end"),
];

impl SectionSchema for Subaward {
    fn schema() -> &'static [FieldDescriptor] {
        SUBAWARD_SCHEMA
    }

    fn minimum_fields() -> &'static [&'static str] {
        &["risk", "amount", "agreement_type"]
    }

    fn is_field_set(&self, name: &str) -> bool {
        match name {
            "risk" => self.risk.is_some(),
            "amount" => self.amount.is_some(),
            "agreement_type" => !self.agreement_type.is_empty(),
            "subaward_start" => self.subaward_start.is_some(),
            "subaward_end" => self.subaward_end.is_some(),
            _ => false,
        }
    }
}

/// Label lookup used when rendering a missing-field error.
pub fn label_for<S: SectionSchema>(name: &str) -> String {
    S::schema()
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.label.to_string())
        .unwrap_or_else(|| name.to_string())
}
