use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    /// A price was not found at any of the three tiers. This is a
    /// programmer/configuration error, not a client mistake.
    #[error("pricing missing for model {model_id} on {date}")]
    PricingMissing { model_id: String, date: String },

    #[error("label {0} is not registered and not in the static pricebook")]
    UnknownLabel(String),

    #[error("calling_region is required to resolve a profile label")]
    MissingCallingRegion,

    #[error("profile has no entry for region {0}")]
    UnsupportedRegion(String),

    #[error("malformed inference profile ARN: {0}")]
    MalformedArn(String),

    #[error("inference profile region map must be non-empty")]
    EmptyRegionMap,

    #[error(transparent)]
    Store(#[from] model_meter_store::StoreError),
}
