//! Core value types shared by every layer of the model-meter service.
//!
//! Nothing in this crate touches I/O: it is the closed set of types that
//! the store, pricing, metering, selection and API layers all agree on.

pub mod error;
pub mod keys;
pub mod org;
pub mod pricing;
pub mod selection;
pub mod usage;

pub use error::{ApiError, ErrorCode};
pub use keys::{DayKey, ScopeKey};
pub use org::{
    Application, CredentialRecord, EffectiveConfig, InferenceProfile, Organization, Overrides, QuotaScope, Subject,
};
pub use pricing::{LabelResolution, Pricebook, StaticModelEntry};
pub use selection::{ModeAdvisory, Recommendation, StickyReason, StickyState};
pub use usage::{CostBreakdown, DailyTotal, UsageStatus};
