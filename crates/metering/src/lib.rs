//! Idempotent sharded usage metering and the clock/calendar capability
//! (spec.md §4.F, §4.K).

pub mod clock;
mod errors;
mod sharding;
mod submit;

pub use clock::{Clock, ClockError, FixedClock, SystemClock};
pub use errors::MeteringError;
pub use sharding::shard_index;
pub use submit::{submit_usage, SubmitUsageOutcome, SubmitUsageRequest};
