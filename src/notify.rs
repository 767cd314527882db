//! Notification dispatch.
//!
//! The workflow core decides *when* to notify and *whom*; delivery is an
//! external collaborator behind `NotificationSender`. Dispatch is strictly
//! best-effort: a failed send is logged and never rolls back or blocks the
//! transition that triggered it.

use async_trait::async_trait;
use std::sync::Arc;

use crate::award::bundle::AwardBundle;
use crate::award::types::Stage;
use crate::assignment;
use crate::config::NotificationConfig;
use crate::error::NotificationError;

pub const UPDATE_SUBJECT: &str = "Award Workflow Update";

/// A message queued by a transition, dispatched after the bundle commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError>;
}

/// Default sender: writes the message to the structured log. Real delivery
/// channels (SMTP relay, queue) implement `NotificationSender` at the
/// application edge.
#[derive(Debug, Default)]
pub struct LoggingSender;

#[async_trait]
impl NotificationSender for LoggingSender {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            recipients = ?recipients,
            subject = subject,
            body = body,
            "notification"
        );
        Ok(())
    }
}

/// Fans queued notifications out to the sender, swallowing delivery errors.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn NotificationSender>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn NotificationSender>) -> Self {
        Self { sender }
    }

    pub async fn dispatch(&self, notifications: Vec<Notification>) {
        for note in notifications {
            if note.recipients.is_empty() {
                continue;
            }
            if let Err(err) = self
                .sender
                .notify(&note.recipients, &note.subject, &note.body)
                .await
            {
                tracing::warn!(
                    subject = %note.subject,
                    recipients = ?note.recipients,
                    error = %err,
                    "notification delivery failed, continuing"
                );
            }
        }
    }
}

fn award_display(bundle: &AwardBundle) -> String {
    match bundle.first_real_proposal() {
        Some(p) if !p.project_title.is_empty() => {
            format!("Award for proposal \"{}\"", p.project_title)
        }
        _ => format!("Award #{}", bundle.award.id),
    }
}

fn award_url(bundle: &AwardBundle, config: &NotificationConfig) -> String {
    format!("{}/awards/{}", config.url_hostname, bundle.award.id)
}

fn pi_suffix(bundle: &AwardBundle) -> String {
    bundle
        .most_recent_proposal()
        .filter(|p| !p.principal_investigator.is_empty())
        .map(|p| format!(" (PI: {})", p.principal_investigator))
        .unwrap_or_default()
}

/// "Assigned to you" update sent to the users of the newly active sections.
/// With the modification override, it goes to the modification user instead.
pub fn stage_update(
    bundle: &AwardBundle,
    config: &NotificationConfig,
    modification_override: bool,
) -> Notification {
    let recipients = if modification_override {
        assignment::resolve_user(&bundle.award, Stage::Setup, true)
            .map(|u| vec![u.email.clone()])
            .unwrap_or_default()
    } else {
        assignment::resolve_active_users(&bundle.award)
            .iter()
            .map(|u| u.email.clone())
            .collect()
    };

    Notification {
        recipients,
        subject: UPDATE_SUBJECT.to_string(),
        body: format!(
            "{}{} has been assigned to you. Go to {} to review it.",
            award_display(bundle),
            pi_suffix(bundle),
            award_url(bundle, config)
        ),
    }
}

/// Courtesy note to the acceptance user when the award reaches setup.
pub fn setup_reached(bundle: &AwardBundle, config: &NotificationConfig) -> Notification {
    Notification {
        recipients: vec![bundle.award.assignments.acceptance.email.clone()],
        subject: UPDATE_SUBJECT.to_string(),
        body: format!(
            "{} has been sent to the Award Setup step. This is a notification only - \
you are not assigned to perform Award Setup for this award. You can view it here: {}",
            award_display(bundle),
            award_url(bundle, config)
        ),
    }
}

/// Heads-up to the subaward user when setup work begins.
pub fn subaward_heads_up(bundle: &AwardBundle, config: &NotificationConfig) -> Notification {
    let recipients = bundle
        .award
        .assignments
        .subaward
        .as_ref()
        .map(|u| vec![u.email.clone()])
        .unwrap_or_default();
    Notification {
        recipients,
        subject: UPDATE_SUBJECT.to_string(),
        body: format!(
            "{}{} has been assigned to Award Setup. Go to {} to review it.",
            award_display(bundle),
            pi_suffix(bundle),
            award_url(bundle, config)
        ),
    }
}

/// Sent to the setup user when the acceptance's FCOI cleared date is set.
pub fn fcoi_cleared(
    bundle: &AwardBundle,
    config: &NotificationConfig,
    cleared: chrono::NaiveDate,
) -> Notification {
    Notification {
        recipients: vec![bundle.award.assignments.setup.email.clone()],
        subject: UPDATE_SUBJECT.to_string(),
        body: format!(
            "The FCOI cleared date has been entered on {} - it is {}. You can view it here: {}",
            award_display(bundle),
            cleared,
            award_url(bundle, config)
        ),
    }
}

/// Sent to the configured compliance recipients when an award is marked PHS
/// funded.
pub fn phs_funded(
    bundle: &AwardBundle,
    config: &NotificationConfig,
    with_modification: bool,
) -> Notification {
    let suffix = if with_modification {
        " (Modification)"
    } else {
        ""
    };
    Notification {
        recipients: config.phs_funded_recipients.clone(),
        subject: UPDATE_SUBJECT.to_string(),
        body: format!(
            "PHS funded for {}{} has been received and requires FCOI verification. \
Please go to {} to review it.",
            award_display(bundle),
            suffix,
            award_url(bundle, config)
        ),
    }
}
