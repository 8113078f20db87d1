use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeteringError {
    #[error("timestamp {submitted} is outside the accepted window around {now}")]
    TimestampOutOfRange { submitted: DateTime<Utc>, now: DateTime<Utc> },

    #[error(transparent)]
    Clock(#[from] crate::clock::ClockError),

    #[error(transparent)]
    Pricing(#[from] model_meter_pricing::PricingError),

    #[error(transparent)]
    Store(#[from] model_meter_store::StoreError),
}
