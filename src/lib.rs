pub mod crops;
pub mod engine;
pub mod error;
pub mod farm;
pub mod growth;
pub mod loan;
pub mod market;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod soil;
pub mod storage;
pub mod systems;
pub mod weather;

pub use engine::{Engine, EngineBuilder, EngineSettings, FarmEvent, TickReport};
pub use error::FarmError;
pub use farm::Farm;
pub use scenario::{Scenario, ScenarioLoader};

/// Rounds half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
