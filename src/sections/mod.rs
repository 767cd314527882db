pub mod registry;
pub mod schema;
pub mod store;
pub mod types;

pub use registry::{active_stages, editable_stages, spec_for, StageSpec, STAGE_REGISTRY};
pub use schema::{FieldDescriptor, FieldKind, SectionSchema};
pub use types::{
    AwardAcceptance, AwardCloseout, AwardManagement, AwardModification, AwardNegotiation,
    AwardSetup, EasStatus, NegotiationStatus, PtaNumber, SetupPriority, Subaward, SubawardRisk,
    WaitReason,
};
