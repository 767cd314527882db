use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use award_flow::award::types::{Stage, StageAssignments, UserRef};
use award_flow::config::AwardFlowConfig;
use award_flow::notify::LoggingSender;
use award_flow::persistence::JsonFileRepository;
use award_flow::sections::registry;
use award_flow::sections::types::WaitReason;
use award_flow::workflow::WorkflowEngine;

#[derive(Parser)]
#[command(name = "award-flow")]
#[command(about = "Sponsored-research award workflow tracking")]
#[command(
    long_about = "Award Flow tracks sponsored-research awards through intake, negotiation, \
                  setup, management and closeout, with per-stage assignments, modification \
                  cycles and a full audit trail."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new award with its stage assignments
    Create {
        /// Acceptance user as username:Full Name:email
        #[arg(long)]
        acceptance: String,
        /// Negotiation user (omit when no negotiation is needed)
        #[arg(long)]
        negotiation: Option<String>,
        /// Setup user
        #[arg(long)]
        setup: String,
        /// Modification user
        #[arg(long)]
        modification: Option<String>,
        /// Subaward user
        #[arg(long)]
        subaward: Option<String>,
        /// Management user
        #[arg(long)]
        management: String,
        /// Closeout user
        #[arg(long)]
        closeout: String,
    },
    /// Show an award's current position, assignments and audit trail
    Show {
        id: u64,
    },
    /// Move an award to its next step
    Advance {
        id: u64,
        /// At the management/subaward step, which sub-stage finished
        #[arg(long, value_parser = ["subaward", "management"])]
        stage: Option<String>,
    },
    /// Hand intake off to negotiation and setup
    Split {
        id: u64,
        /// Run negotiation and setup concurrently
        #[arg(long)]
        dual: bool,
    },
    /// Hand intake off to the negotiation/modification pairing
    Route {
        id: u64,
        /// Run negotiation and modification concurrently
        #[arg(long)]
        dual: bool,
    },
    /// Route setup work into the modification track, or keep it on setup
    ModFlow {
        id: u64,
        /// Redirect setup work to the modification user
        #[arg(long)]
        modification: bool,
        /// Notify the setup-track user of the assignment
        #[arg(long)]
        notify_setup: bool,
    },
    /// Start a new modification cycle
    NewModification {
        id: u64,
        /// Generation label; "Modification" auto-numbers the cycle
        #[arg(long, default_value = "Modification")]
        label: String,
    },
    /// Set or clear the waiting-for reason on the setup or modification section
    Wait {
        id: u64,
        #[arg(long, value_parser = ["setup", "modification"])]
        stage: String,
        /// Reason code (RB, PA, CA, FC, PS, SC, NO, IC, DC); omit to clear
        #[arg(long)]
        reason: Option<String>,
    },
    /// List a user's setup worklist in priority order
    Worklist {
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    AwardFlowConfig::load_env_file()?;
    let config = AwardFlowConfig::load()?;
    award_flow::telemetry::init_telemetry(&config.observability)?;

    let repository = Arc::new(JsonFileRepository::new(&config.storage.data_dir).await?);
    let engine = WorkflowEngine::new(
        repository,
        Arc::new(LoggingSender),
        config.notifications.clone(),
    );

    let cli = Cli::parse();
    match cli.command {
        Commands::Create {
            acceptance,
            negotiation,
            setup,
            modification,
            subaward,
            management,
            closeout,
        } => {
            let assignments = StageAssignments {
                acceptance: parse_user(&acceptance)?,
                negotiation: negotiation.as_deref().map(parse_user).transpose()?,
                setup: parse_user(&setup)?,
                modification: modification.as_deref().map(parse_user).transpose()?,
                subaward: subaward.as_deref().map(parse_user).transpose()?,
                management: parse_user(&management)?,
                closeout: parse_user(&closeout)?,
            };
            let bundle = engine.create_award(assignments).await?;
            println!(
                "Created award #{} at {}",
                bundle.award.id,
                bundle.award.status().label()
            );
        }
        Commands::Show { id } => {
            let bundle = engine.load(id).await?;
            let status = bundle.award.status();
            println!("Award #{}", bundle.award.id);
            println!("  Status:     {} (step {})", status.label(), status.as_u8());
            println!("  Generation: {}", bundle.generation_label());
            println!(
                "  Active:     {}",
                award_flow::assignment::active_user_names(&bundle.award)
            );
            if let Some(negotiation) = bundle
                .negotiations
                .iter()
                .find(|n| n.current_modification)
            {
                println!(
                    "  Negotiation: {} [{}]",
                    negotiation.negotiation_status.label(),
                    negotiation.negotiation_status.code()
                );
            }
            if let Some(acceptance) = bundle.acceptances.iter().find(|a| a.current_modification) {
                if let Some(eas) = acceptance.eas_status {
                    println!("  EAS status: {}", eas.code());
                }
                if let Some(priority) = acceptance.setup_priority {
                    println!("  Setup priority: {}", priority.code());
                }
            }
            if let Some(reason) = bundle.setup.wait_for {
                println!("  Waiting for: {} [{}]", reason.label(), reason.code());
            }
            println!("  Editable sections:");
            let dual = bundle.award.state.dual_setup();
            for stage in registry::editable_stages(status, dual) {
                let spec = registry::spec_for(stage);
                if spec.cycle_aware {
                    println!(
                        "    {} ({}) [{}]",
                        stage.name(),
                        spec.group,
                        bundle.generation_label()
                    );
                } else {
                    println!("    {} ({})", stage.name(), spec.group);
                }
            }
            println!("  Audit trail:");
            for entry in &bundle.audit {
                let completed = entry
                    .date_completed
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| "open".to_string());
                println!(
                    "    [{}] {} ({}) {} -> {}",
                    entry.generation,
                    entry.workflow_step,
                    entry.assigned_user.as_deref().unwrap_or("unassigned"),
                    entry.date_created.to_rfc3339(),
                    completed
                );
            }
        }
        Commands::Advance { id, stage } => {
            let stage = match stage.as_deref() {
                Some("subaward") => Some(Stage::Subaward),
                Some("management") => Some(Stage::Management),
                _ => None,
            };
            let outcome = engine.advance(id, stage).await?;
            let bundle = engine.load(id).await?;
            if outcome.advanced {
                println!("Award #{} advanced to {}", id, bundle.award.status().label());
            } else {
                println!(
                    "Award #{} holding at {} until the partner stage finishes",
                    id,
                    bundle.award.status().label()
                );
            }
        }
        Commands::Split { id, dual } => {
            engine.split_to_parallel_tracks(id, dual).await?;
            let bundle = engine.load(id).await?;
            println!("Award #{} now at {}", id, bundle.award.status().label());
        }
        Commands::Route { id, dual } => {
            engine.route_to_modification_track(id, dual).await?;
            let bundle = engine.load(id).await?;
            println!("Award #{} now at {}", id, bundle.award.status().label());
        }
        Commands::ModFlow {
            id,
            modification,
            notify_setup,
        } => {
            engine
                .mark_modification_flow(id, modification, notify_setup)
                .await?;
            let bundle = engine.load(id).await?;
            println!("Award #{} now at {}", id, bundle.award.status().label());
        }
        Commands::NewModification { id, label } => {
            engine.create_modification_cycle(id, &label).await?;
            let bundle = engine.load(id).await?;
            println!(
                "Award #{} reset to {} as {}",
                id,
                bundle.award.status().label(),
                bundle.generation_label()
            );
        }
        Commands::Wait { id, stage, reason } => {
            let stage = match stage.as_str() {
                "setup" => Stage::Setup,
                _ => Stage::Modification,
            };
            let reason = reason.as_deref().map(parse_wait_reason).transpose()?;
            engine.set_wait_reason(id, stage, reason).await?;
            println!("Updated wait reason on award #{id}");
        }
        Commands::Worklist { username } => {
            let user = UserRef::new(&username, "", "");
            let ids = engine.setup_worklist(&user).await?;
            if ids.is_empty() {
                println!("No setup work assigned to {username}");
            } else {
                for id in ids {
                    println!("award #{id}");
                }
            }
        }
    }

    Ok(())
}

fn parse_user(raw: &str) -> Result<UserRef> {
    let mut parts = raw.splitn(3, ':');
    let username = parts
        .next()
        .filter(|s| !s.is_empty())
        .context("user must be username:Full Name:email")?;
    let full_name = parts.next().unwrap_or(username);
    let email = parts.next().unwrap_or("");
    Ok(UserRef::new(username, full_name, email))
}

const WAIT_REASONS: [WaitReason; 9] = [
    WaitReason::RevisedBudget,
    WaitReason::PiAccess,
    WaitReason::CostShareApproval,
    WaitReason::Fcoi,
    WaitReason::ProposalSubmission,
    WaitReason::SponsorClarity,
    WaitReason::NewOrgNeeded,
    WaitReason::InternalClarification,
    WaitReason::DocumentsNotOnFile,
];

fn parse_wait_reason(code: &str) -> Result<WaitReason> {
    WAIT_REASONS
        .into_iter()
        .find(|reason| reason.code().eq_ignore_ascii_case(code))
        .ok_or_else(|| anyhow!("unknown wait reason code: {code}"))
}
