//! The farm: fields, funds and every player-facing action.
//!
//! `Farm` owns all simulation state. Systems mutate it once per tick; player
//! actions mutate it synchronously between ticks. Once the game is over every
//! mutating call returns [`FarmError::GameOver`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crops::CropCatalog;
use crate::error::FarmError;
use crate::growth::{CropInstance, CropRecord, HarvestRecord};
use crate::loan::{LoanAccount, RepaymentOutcome};
use crate::market::Market;
use crate::soil::{Npk, Nutrient, Soil};
use crate::storage::Storage;
use crate::weather::WeatherGenerator;

const FIELD_PRICE_GROWTH: f64 = 1.5;

fn default_water_cost() -> f64 {
    150.0
}

fn default_fertilize_cost() -> f64 {
    100.0
}

fn default_pesticide_cost() -> f64 {
    120.0
}

fn default_fertilizer_amount() -> f64 {
    25.0
}

fn default_field_base_price() -> f64 {
    5_000.0
}

fn default_storage_fee() -> f64 {
    2.0
}

/// Prices of everything the farm pays for apart from seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Costs {
    #[serde(default = "default_water_cost")]
    pub water: f64,
    #[serde(default = "default_fertilize_cost")]
    pub fertilize: f64,
    #[serde(default = "default_pesticide_cost")]
    pub pesticide: f64,
    /// Nutrient units added by one fertilize action.
    #[serde(default = "default_fertilizer_amount")]
    pub fertilizer_amount: f64,
    #[serde(default = "default_field_base_price")]
    pub field_base_price: f64,
    #[serde(default = "default_storage_fee")]
    pub storage_fee_per_lot: f64,
}

impl Default for Costs {
    fn default() -> Self {
        Self {
            water: default_water_cost(),
            fertilize: default_fertilize_cost(),
            pesticide: default_pesticide_cost(),
            fertilizer_amount: default_fertilizer_amount(),
            field_base_price: default_field_base_price(),
            storage_fee_per_lot: default_storage_fee(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Running,
    CreditExhausted,
    DebtLimitExceeded,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::Running
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameStatus::Running => "running",
            GameStatus::CreditExhausted => "game over: credit score exhausted",
            GameStatus::DebtLimitExceeded => "game over: debt limit exceeded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    Water,
    Fertilize(Nutrient),
    Pesticide,
}

impl FieldAction {
    pub fn fertilize(nutrient: &str) -> Result<Self, FarmError> {
        Ok(FieldAction::Fertilize(nutrient.parse()?))
    }

    pub fn cost(self, costs: &Costs) -> f64 {
        match self {
            FieldAction::Water => costs.water,
            FieldAction::Fertilize(_) => costs.fertilize,
            FieldAction::Pesticide => costs.pesticide,
        }
    }
}

/// Accepts `water`, `pesticide` and `fertilize:<nutrient>`.
impl FromStr for FieldAction {
    type Err = FarmError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        match value.split_once(':') {
            Some((verb, nutrient)) if verb.eq_ignore_ascii_case("fertilize") => {
                FieldAction::fertilize(nutrient)
            }
            Some(_) => Err(FarmError::InvalidAction(value.to_string())),
            None => match value.to_ascii_lowercase().as_str() {
                "water" => Ok(FieldAction::Water),
                "pesticide" => Ok(FieldAction::Pesticide),
                _ => Err(FarmError::InvalidAction(value.to_string())),
            },
        }
    }
}

impl fmt::Display for FieldAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldAction::Water => f.write_str("water"),
            FieldAction::Fertilize(nutrient) => write!(f, "fertilize:{nutrient}"),
            FieldAction::Pesticide => f.write_str("pesticide"),
        }
    }
}

/// Distinguishes "done and paid for" from "nothing to do".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    Applied { cost: f64 },
    Skipped,
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Applied { cost } => write!(f, "applied for {cost:.2}"),
            ActionOutcome::Skipped => f.write_str("crop is dead or harvested; nothing done"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    pub soil: Soil,
    pub crop: Option<CropInstance>,
}

impl Field {
    pub fn new(soil: Soil) -> Self {
        Self { soil, crop: None }
    }

    pub fn is_empty(&self) -> bool {
        self.crop.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Farm {
    pub(crate) funds: f64,
    pub(crate) fields: Vec<Field>,
    pub(crate) weather: WeatherGenerator,
    pub(crate) market: Market,
    pub(crate) storage: Storage,
    pub(crate) loan: LoanAccount,
    pub(crate) catalog: CropCatalog,
    pub(crate) costs: Costs,
    pub(crate) default_debt_limit: f64,
    pub(crate) status: GameStatus,
}

impl Farm {
    /// A farm with no fields, standard market and default finances.
    pub fn new(weather: WeatherGenerator, catalog: CropCatalog) -> Self {
        Self {
            funds: 10_000.0,
            fields: Vec::new(),
            weather,
            market: Market::standard(),
            storage: Storage::new(),
            loan: LoanAccount::default(),
            catalog,
            costs: Costs::default(),
            default_debt_limit: 100_000.0,
            status: GameStatus::Running,
        }
    }

    pub fn with_funds(mut self, funds: f64) -> Self {
        self.funds = funds;
        self
    }

    pub fn with_fields(mut self, count: usize, soil: Npk) -> Self {
        self.fields = (0..count).map(|_| Field::new(Soil::new(soil))).collect();
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn with_loan(mut self, loan: LoanAccount, default_debt_limit: f64) -> Self {
        self.loan = loan;
        self.default_debt_limit = default_debt_limit;
        self
    }

    pub fn with_costs(mut self, costs: Costs) -> Self {
        self.costs = costs;
        self
    }

    pub fn funds(&self) -> f64 {
        self.funds
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Result<&Field, FarmError> {
        self.fields.get(index).ok_or(FarmError::InvalidField(index))
    }

    pub fn weather(&self) -> &WeatherGenerator {
        &self.weather
    }

    pub fn now(&self) -> NaiveDateTime {
        self.weather.now()
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn loan(&self) -> &LoanAccount {
        &self.loan
    }

    pub fn catalog(&self) -> &CropCatalog {
        &self.catalog
    }

    pub fn costs(&self) -> &Costs {
        &self.costs
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    fn ensure_running(&self) -> Result<(), FarmError> {
        if self.status.is_over() {
            Err(FarmError::GameOver)
        } else {
            Ok(())
        }
    }

    fn field_mut(&mut self, index: usize) -> Result<&mut Field, FarmError> {
        self.fields.get_mut(index).ok_or(FarmError::InvalidField(index))
    }

    fn charge(&mut self, cost: f64) -> Result<(), FarmError> {
        if self.funds < cost {
            return Err(FarmError::InsufficientFunds {
                needed: cost,
                available: self.funds,
            });
        }
        self.funds -= cost;
        Ok(())
    }

    pub fn plant(&mut self, index: usize, crop_name: &str) -> Result<(), FarmError> {
        self.ensure_running()?;
        if !self.field(index)?.is_empty() {
            return Err(FarmError::FieldOccupied(index));
        }
        let crop = self.catalog.lookup(crop_name)?;
        let cost = crop.cost_per_mu;
        self.charge(cost)?;
        self.field_mut(index)?.crop = Some(CropInstance::plant(crop));
        info!(field = index, crop = crop_name, cost, "planted");
        Ok(())
    }

    /// Water, fertilize or spray a field.
    ///
    /// Fertilizer goes into the soil, so it needs no crop. Water and
    /// pesticide need one; on a dead or harvested crop they are skipped and
    /// nothing is charged.
    pub fn apply_action(
        &mut self,
        index: usize,
        action: FieldAction,
    ) -> Result<ActionOutcome, FarmError> {
        self.ensure_running()?;
        let cost = action.cost(&self.costs);
        let available = self.funds;
        let fertilizer_amount = self.costs.fertilizer_amount;
        let field = self.field_mut(index)?;

        if let FieldAction::Fertilize(nutrient) = action {
            if available < cost {
                return Err(FarmError::InsufficientFunds {
                    needed: cost,
                    available,
                });
            }
            field.soil.apply_fertilizer(nutrient, fertilizer_amount)?;
        } else {
            let crop = field.crop.as_mut().ok_or(FarmError::NoCrop(index))?;
            if crop.is_terminal() {
                return Ok(ActionOutcome::Skipped);
            }
            if available < cost {
                return Err(FarmError::InsufficientFunds {
                    needed: cost,
                    available,
                });
            }
            match action {
                FieldAction::Water => crop.water(),
                _ => crop.apply_pesticide(cost),
            };
        }

        self.funds -= cost;
        info!(field = index, %action, cost, "field action");
        Ok(ActionOutcome::Applied { cost })
    }

    /// Harvests a field's crop into storage. The harvested crop stays in the
    /// field until [`Farm::clear_field`].
    pub fn harvest(&mut self, index: usize) -> Result<HarvestRecord, FarmError> {
        self.ensure_running()?;
        let crop = self
            .field_mut(index)?
            .crop
            .as_mut()
            .ok_or(FarmError::NoCrop(index))?;
        let record = crop.harvest()?;
        info!(
            field = index,
            crop = %record.name,
            yield_kg = record.yield_kg,
            nutrition = record.nutrition,
            "harvested"
        );
        self.storage.add(record.clone());
        Ok(record)
    }

    /// Detaches whatever crop the field holds.
    pub fn clear_field(&mut self, index: usize) -> Result<Option<CropInstance>, FarmError> {
        self.ensure_running()?;
        Ok(self.field_mut(index)?.crop.take())
    }

    /// Sells one stored lot at today's price; returns the proceeds.
    pub fn sell(&mut self, storage_index: usize) -> Result<f64, FarmError> {
        self.ensure_running()?;
        if self.storage.is_empty() {
            return Err(FarmError::EmptyStorage);
        }
        let lot = self
            .storage
            .get(storage_index)
            .ok_or(FarmError::InvalidIndex(storage_index))?;
        let price = self
            .market
            .get_price(&lot.name)
            .ok_or_else(|| FarmError::UnknownCommodity(lot.name.clone()))?;
        let bonus = lot.quality_bonus();
        let receipt = self.storage.sell(storage_index, price, bonus)?;
        self.funds += receipt.value;
        info!(crop = %receipt.lot.name, price, value = receipt.value, "sold");
        Ok(receipt.value)
    }

    /// Sells every lot the market has a price for; returns the total.
    pub fn sell_all(&mut self) -> Result<f64, FarmError> {
        self.ensure_running()?;
        if self.storage.is_empty() {
            return Err(FarmError::EmptyStorage);
        }
        let mut total = 0.0;
        for index in (0..self.storage.len()).rev() {
            let priced = self
                .storage
                .get(index)
                .is_some_and(|lot| self.market.get_price(&lot.name).is_some());
            if priced {
                total += self.sell(index)?;
            }
        }
        Ok(crate::round_to(total, 2))
    }

    pub fn borrow(&mut self, amount: f64) -> Result<(), FarmError> {
        self.ensure_running()?;
        self.loan.borrow(amount)?;
        self.funds += amount;
        info!(
            amount,
            debt = self.loan.total_debt,
            credit_score = self.loan.credit_score,
            "borrowed"
        );
        Ok(())
    }

    /// Settles this month's installment from current funds.
    pub fn repay_due(&mut self) -> Result<RepaymentOutcome, FarmError> {
        self.ensure_running()?;
        let outcome = self.loan.repay(self.funds);
        self.funds -= outcome.paid();
        Ok(outcome)
    }

    /// `base × 1.5^(fields − 1)`.
    pub fn next_field_price(&self) -> f64 {
        let exponent = self.fields.len().saturating_sub(1) as i32;
        self.costs.field_base_price * FIELD_PRICE_GROWTH.powi(exponent)
    }

    /// Buys one more field with default soil; returns its index.
    pub fn buy_field(&mut self) -> Result<usize, FarmError> {
        self.ensure_running()?;
        let price = self.next_field_price();
        self.charge(price)?;
        self.fields.push(Field::default());
        info!(field = self.fields.len() - 1, price, "bought field");
        Ok(self.fields.len() - 1)
    }

    /// Moves to a game-over status the first time its condition holds.
    /// Returns the new status only on that transition.
    pub fn check_game_over(&mut self) -> Option<GameStatus> {
        if self.status.is_over() {
            return None;
        }
        let status = if self.loan.credit_score == 0 {
            GameStatus::CreditExhausted
        } else if self.loan.total_debt > self.default_debt_limit {
            GameStatus::DebtLimitExceeded
        } else {
            return None;
        };
        self.status = status;
        Some(status)
    }

    pub fn snapshot(&self) -> FarmSnapshot {
        FarmSnapshot {
            funds: self.funds,
            now: self.weather.now(),
            weather: self.weather.clone(),
            fields: self
                .fields
                .iter()
                .map(|field| FieldRecord {
                    soil: field.soil.pools(),
                    crop: field.crop.as_ref().map(CropInstance::to_record),
                })
                .collect(),
            market: self.market.clone(),
            storage: self.storage.clone(),
            loan: self.loan.clone(),
            costs: self.costs.clone(),
            default_debt_limit: self.default_debt_limit,
            status: self.status,
        }
    }

    /// Rebuilds a farm, resolving crop names through `catalog`.
    pub fn from_snapshot(snapshot: FarmSnapshot, catalog: CropCatalog) -> Result<Self, FarmError> {
        let fields = snapshot
            .fields
            .iter()
            .map(|record| {
                let crop = record
                    .crop
                    .as_ref()
                    .map(|crop| CropInstance::from_record(crop, &catalog))
                    .transpose()?;
                Ok(Field {
                    soil: Soil::new(record.soil),
                    crop,
                })
            })
            .collect::<Result<Vec<_>, FarmError>>()?;
        Ok(Self {
            funds: snapshot.funds,
            fields,
            weather: snapshot.weather,
            market: snapshot.market,
            storage: snapshot.storage,
            loan: snapshot.loan,
            catalog,
            costs: snapshot.costs,
            default_debt_limit: snapshot.default_debt_limit,
            status: snapshot.status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub soil: Npk,
    pub crop: Option<CropRecord>,
}

/// Complete farm state as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub funds: f64,
    pub now: NaiveDateTime,
    pub weather: WeatherGenerator,
    pub fields: Vec<FieldRecord>,
    pub market: Market,
    pub storage: Storage,
    pub loan: LoanAccount,
    pub costs: Costs,
    pub default_debt_limit: f64,
    pub status: GameStatus,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn farm() -> Farm {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let start = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Farm::new(WeatherGenerator::new(start, &mut rng), CropCatalog::standard())
            .with_fields(3, Npk::new(100.0, 100.0, 100.0))
    }

    #[test]
    fn planting_validates_field_crop_and_funds() {
        let mut farm = farm();
        assert_eq!(farm.plant(9, "wheat"), Err(FarmError::InvalidField(9)));
        assert_eq!(
            farm.plant(0, "cabbage"),
            Err(FarmError::InvalidCropType("cabbage".into()))
        );

        farm.plant(0, "wheat").unwrap();
        assert_eq!(farm.funds(), 9_700.0);
        assert_eq!(farm.plant(0, "corn"), Err(FarmError::FieldOccupied(0)));

        farm.funds = 100.0;
        assert_eq!(
            farm.plant(1, "grape"),
            Err(FarmError::InsufficientFunds {
                needed: 450.0,
                available: 100.0
            })
        );
        assert!(farm.fields()[1].is_empty());
    }

    #[test]
    fn parses_actions() {
        assert_eq!("water".parse::<FieldAction>(), Ok(FieldAction::Water));
        assert_eq!(
            "fertilize:K".parse::<FieldAction>(),
            Ok(FieldAction::Fertilize(Nutrient::K))
        );
        assert_eq!(
            "fertilize:Ca".parse::<FieldAction>(),
            Err(FarmError::InvalidNutrient("Ca".into()))
        );
        assert_eq!(
            "dance".parse::<FieldAction>(),
            Err(FarmError::InvalidAction("dance".into()))
        );
    }

    #[test]
    fn actions_charge_and_apply() {
        let mut farm = farm();
        assert_eq!(
            farm.apply_action(0, FieldAction::Water),
            Err(FarmError::NoCrop(0))
        );

        let outcome = farm
            .apply_action(0, FieldAction::Fertilize(Nutrient::N))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Applied { cost: 100.0 });
        assert_eq!(farm.fields()[0].soil.get(Nutrient::N), 125.0);

        farm.plant(0, "tomato").unwrap();
        farm.apply_action(0, FieldAction::Pesticide).unwrap();
        let crop = farm.fields()[0].crop.as_ref().unwrap();
        assert_eq!(crop.pesticide_effect_hours(), 48);
        assert_eq!(crop.total_cost(), 350.0 + 120.0);
        assert_eq!(farm.funds(), 10_000.0 - 100.0 - 350.0 - 120.0);
    }

    #[test]
    fn actions_on_terminal_crops_are_free_no_ops() {
        let mut farm = farm();
        farm.plant(2, "corn").unwrap();
        let mut record = farm.fields[2].crop.as_ref().unwrap().to_record();
        record.dead = true;
        farm.fields[2].crop = Some(CropInstance::from_record(&record, &farm.catalog).unwrap());

        let funds = farm.funds();
        assert_eq!(
            farm.apply_action(2, FieldAction::Water),
            Ok(ActionOutcome::Skipped)
        );
        assert_eq!(farm.funds(), funds);
        assert_eq!(farm.harvest(2), Err(FarmError::Dead));

        assert!(farm.clear_field(2).unwrap().is_some());
        assert!(farm.fields()[2].is_empty());
    }

    #[test]
    fn field_prices_grow_geometrically() {
        let mut farm = farm();
        assert_eq!(farm.next_field_price(), 5_000.0 * 1.5 * 1.5);
        farm.funds = 20_000.0;
        assert_eq!(farm.buy_field(), Ok(3));
        assert_eq!(farm.funds(), 20_000.0 - 11_250.0);
        assert_eq!(farm.next_field_price(), 5_000.0 * 1.5f64.powi(3));
        assert!(matches!(
            farm.buy_field(),
            Err(FarmError::InsufficientFunds { .. })
        ));
        assert_eq!(farm.fields().len(), 4);
    }

    #[test]
    fn harvest_and_sell_flow_through_storage() {
        let mut farm = farm();
        assert_eq!(farm.sell_all(), Err(FarmError::EmptyStorage));
        farm.plant(0, "wheat").unwrap();
        let mut record = farm.fields[0].crop.as_ref().unwrap().to_record();
        record.matured = true;
        farm.fields[0].crop = Some(CropInstance::from_record(&record, &farm.catalog).unwrap());

        let harvest = farm.harvest(0).unwrap();
        assert_eq!(farm.storage().len(), 1);
        assert_eq!(farm.harvest(0), Err(FarmError::AlreadyHarvested));
        assert_eq!(farm.sell(3), Err(FarmError::InvalidIndex(3)));

        let funds = farm.funds();
        let value = farm.sell_all().unwrap();
        let expected = harvest.yield_kg * 2.0 * ((harvest.nutrition + 100.0) / 200.0);
        assert!((value - expected).abs() < 0.01);
        assert!((farm.funds() - (funds + value)).abs() < 1e-9);
        assert!(farm.storage().is_empty());
    }

    #[test]
    fn borrowing_credits_funds_and_game_over_locks_actions() {
        let mut farm = farm();
        farm.borrow(1_000.0).unwrap();
        assert_eq!(farm.funds(), 11_000.0);
        assert_eq!(farm.check_game_over(), None);

        farm.loan.credit_score = 0;
        assert_eq!(farm.check_game_over(), Some(GameStatus::CreditExhausted));
        assert_eq!(farm.check_game_over(), None, "reported once");
        assert_eq!(farm.plant(0, "wheat"), Err(FarmError::GameOver));
        assert_eq!(farm.borrow(10.0), Err(FarmError::GameOver));
        assert_eq!(farm.buy_field(), Err(FarmError::GameOver));
    }

    #[test]
    fn debt_over_the_limit_ends_the_game() {
        let mut farm = farm();
        farm.loan.total_debt = 100_000.01;
        assert_eq!(farm.check_game_over(), Some(GameStatus::DebtLimitExceeded));
        assert!(farm.status().is_over());
    }

    #[test]
    fn snapshot_round_trip() {
        let mut farm = farm();
        farm.plant(1, "soybean").unwrap();
        farm.apply_action(2, FieldAction::Fertilize(Nutrient::P)).unwrap();
        let snapshot = farm.snapshot();
        let restored = Farm::from_snapshot(snapshot.clone(), CropCatalog::standard()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);

        let empty = CropCatalog::default();
        assert_eq!(
            Farm::from_snapshot(snapshot, empty).unwrap_err(),
            FarmError::InvalidCropType("soybean".into())
        );
    }
}
