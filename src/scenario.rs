use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::Deserialize;

use crate::{
    crops::{CropCatalog, CropType},
    farm::{Costs, Farm},
    loan::LoanAccount,
    market::{Market, MarketEntry},
    soil::{Npk, DEFAULT_POOL},
    weather::WeatherGenerator,
};

const HOURS_PER_DAY: u64 = 24;

fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

fn default_funds() -> f64 {
    10_000.0
}

fn default_fields() -> usize {
    5
}

fn default_soil() -> Npk {
    Npk::new(DEFAULT_POOL, DEFAULT_POOL, DEFAULT_POOL)
}

fn default_initial_debt() -> f64 {
    30_000.0
}

fn default_credit_score() -> u32 {
    100
}

fn default_monthly_payment() -> f64 {
    3_000.0
}

fn default_overdue_rate() -> f64 {
    0.05
}

fn default_repayment_day() -> u32 {
    28
}

fn default_debt_limit() -> f64 {
    100_000.0
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_start")]
    pub start: NaiveDateTime,
    /// Default run length in hours.
    #[serde(default)]
    pub hours: Option<u64>,
    /// 0 disables periodic snapshots.
    #[serde(default)]
    pub snapshot_interval_hours: u64,
    #[serde(default = "default_funds")]
    pub funds: f64,
    #[serde(default = "default_fields")]
    pub fields: usize,
    #[serde(default = "default_soil")]
    pub soil: Npk,
    #[serde(default)]
    pub costs: Costs,
    #[serde(default)]
    pub loan: LoanSettings,
    /// Replaces the built-in crop catalogue when present.
    #[serde(default)]
    pub crops: Option<Vec<CropType>>,
    /// Replaces the built-in commodity list when present.
    #[serde(default)]
    pub market: Option<Vec<CommoditySettings>>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoanSettings {
    #[serde(default = "default_initial_debt")]
    pub initial_debt: f64,
    #[serde(default = "default_credit_score")]
    pub credit_score: u32,
    #[serde(default = "default_monthly_payment")]
    pub base_monthly_payment: f64,
    #[serde(default = "default_overdue_rate")]
    pub overdue_interest_rate: f64,
    #[serde(default = "default_repayment_day")]
    pub repayment_day: u32,
    /// Debt above this ends the game.
    #[serde(default = "default_debt_limit")]
    pub default_debt_limit: f64,
}

impl Default for LoanSettings {
    fn default() -> Self {
        Self {
            initial_debt: default_initial_debt(),
            credit_score: default_credit_score(),
            base_monthly_payment: default_monthly_payment(),
            overdue_interest_rate: default_overdue_rate(),
            repayment_day: default_repayment_day(),
            default_debt_limit: default_debt_limit(),
        }
    }
}

impl LoanSettings {
    pub fn account(&self) -> LoanAccount {
        LoanAccount {
            total_debt: self.initial_debt,
            credit_score: self.credit_score.min(crate::loan::MAX_CREDIT_SCORE),
            base_monthly_payment: self.base_monthly_payment,
            overdue_interest_rate: self.overdue_interest_rate,
            repayment_day: self.repayment_day,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommoditySettings {
    pub name: String,
    pub base_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    #[serde(default)]
    pub rain_sensitive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn catalog(&self) -> CropCatalog {
        match &self.crops {
            Some(crops) => CropCatalog::new(crops.iter().cloned()),
            None => CropCatalog::standard(),
        }
    }

    pub fn build_market(&self) -> Result<Market> {
        let Some(commodities) = &self.market else {
            return Ok(Market::standard());
        };
        let mut entries = Vec::with_capacity(commodities.len());
        for commodity in commodities {
            ensure!(
                commodity.min_price <= commodity.base_price
                    && commodity.base_price <= commodity.max_price,
                "commodity {} has base price {} outside [{}, {}]",
                commodity.name,
                commodity.base_price,
                commodity.min_price,
                commodity.max_price
            );
            entries.push(MarketEntry::new(
                &commodity.name,
                commodity.base_price,
                commodity.min_price,
                commodity.max_price,
                commodity.rain_sensitive,
            ));
        }
        Ok(Market::new(entries))
    }

    /// Starting farm; `rng` draws the first day of weather.
    pub fn build_farm<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Farm> {
        ensure!(
            (1..=28).contains(&self.loan.repayment_day),
            "repayment_day must be within 1..=28, got {}",
            self.loan.repayment_day
        );
        let weather = WeatherGenerator::new(self.start, rng);
        let farm = Farm::new(weather, self.catalog())
            .with_funds(self.funds)
            .with_fields(self.fields, self.soil)
            .with_market(self.build_market()?)
            .with_loan(self.loan.account(), self.loan.default_debt_limit)
            .with_costs(self.costs.clone());
        Ok(farm)
    }

    pub fn hours(&self, override_hours: Option<u64>) -> u64 {
        override_hours
            .or(self.hours)
            .unwrap_or(30 * HOURS_PER_DAY)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn minimal_scenario_takes_defaults() {
        let scenario: Scenario = serde_yaml::from_str("name: bare\nseed: 3\n").unwrap();
        assert_eq!(scenario.funds, 10_000.0);
        assert_eq!(scenario.fields, 5);
        assert_eq!(scenario.costs, Costs::default());
        assert_eq!(scenario.loan.repayment_day, 28);
        assert_eq!(scenario.hours(None), 720);
        assert_eq!(scenario.hours(Some(5)), 5);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.start, default_start());

        let mut rng = ChaCha8Rng::seed_from_u64(scenario.seed);
        let farm = scenario.build_farm(&mut rng).unwrap();
        assert_eq!(farm.fields().len(), 5);
        assert_eq!(farm.loan().total_debt, 30_000.0);
        assert_eq!(farm.market().get_price("pork"), Some(24.0));
        assert_eq!(farm.catalog().len(), 9);
    }

    #[test]
    fn custom_market_is_validated() {
        let yaml = r#"
name: odd
seed: 1
market:
  - { name: wheat, base_price: 9.0, min_price: 1.0, max_price: 2.0 }
"#;
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert!(scenario.build_market().is_err());
    }

    #[test]
    fn loads_bundled_scenario() {
        let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
        let scenario = loader.load("scenarios/spring_farm.yaml").unwrap();
        assert_eq!(scenario.name, "spring_farm");
        assert!(scenario.fields > 0);
    }
}
