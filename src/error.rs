//! Error types for farm operations.
//!
//! Every recoverable failure of a player action or a restore comes back as a
//! [`FarmError`]. Terminal crop states are not errors unless the caller asked
//! for something that needs a live crop (harvest).

/// Errors returned by farm actions, component operations and restores.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FarmError {
    /// The field index does not exist.
    #[error("field {0} does not exist")]
    InvalidField(usize),

    /// The field already holds a crop (growing, dead or harvested).
    #[error("field {0} is already occupied")]
    FieldOccupied(usize),

    /// No crop descriptor is registered under this name.
    #[error("unknown crop type: {0}")]
    InvalidCropType(String),

    /// Funds do not cover the cost of the action.
    #[error("insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds {
        /// Cost of the action.
        needed: f64,
        /// Funds at the time of the call.
        available: f64,
    },

    /// The field has no crop to act on.
    #[error("field {0} has no crop")]
    NoCrop(usize),

    /// The nutrient name is not one of N, P or K.
    #[error("invalid nutrient: {0}")]
    InvalidNutrient(String),

    /// The action name could not be parsed.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// The crop has not matured yet.
    #[error("crop is not mature")]
    NotMature,

    /// The crop is dead.
    #[error("crop is dead")]
    Dead,

    /// The crop was already harvested.
    #[error("crop was already harvested")]
    AlreadyHarvested,

    /// Storage holds no lots.
    #[error("storage is empty")]
    EmptyStorage,

    /// The storage index is out of range.
    #[error("storage index {0} is out of range")]
    InvalidIndex(usize),

    /// The market does not list this commodity.
    #[error("commodity not found on the market: {0}")]
    UnknownCommodity(String),

    /// The amount must be a positive finite number.
    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    /// The loan request exceeds the current credit line.
    #[error("credit limit exceeded: requested {requested:.2}, limit {limit:.2}")]
    CreditLimitExceeded {
        /// Requested amount.
        requested: f64,
        /// Maximum loan amount at the current credit score.
        limit: f64,
    },

    /// The game has ended; no further mutation is accepted.
    #[error("the game is over")]
    GameOver,

    /// The save record was written by an incompatible version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedSnapshotVersion(u32),

    /// The save record belongs to a different scenario than the engine.
    #[error("snapshot belongs to scenario '{found}', engine runs '{expected}'")]
    ScenarioMismatch {
        /// Scenario the engine was built for.
        expected: String,
        /// Scenario named in the save record.
        found: String,
    },
}
