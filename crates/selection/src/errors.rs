use thiserror::Error;

#[derive(Debug, Clone)]
pub struct LabelQuotaDetail {
    pub label: String,
    pub cost_micros: u64,
    pub quota_micros: u64,
    pub quota_pct: f64,
}

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("every label in the ladder is over quota")]
    QuotaExceeded { detail: Vec<LabelQuotaDetail> },

    #[error("no historical data for the requested date")]
    NotFound,

    #[error("historical aggregate requested for a future or pre-retention date")]
    InvalidDate,

    #[error(transparent)]
    Store(#[from] model_meter_store::StoreError),

    #[error(transparent)]
    Clock(#[from] model_meter_metering::ClockError),
}
