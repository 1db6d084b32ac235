mod crops;
mod loan;
mod market;
mod storage;
mod weather;

pub use crops::CropSystem;
pub use loan::LoanSystem;
pub use market::MarketSystem;
pub use storage::StorageSystem;
pub use weather::WeatherSystem;
