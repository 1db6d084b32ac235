//! Post-harvest inventory: freshness decay, storage fees and sale valuation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::FarmError;
use crate::growth::HarvestRecord;
use crate::round_to;

const BASE_DECAY: f64 = 1.0;
const DECAY_PER_DAY_OF_AGE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageLot {
    pub name: String,
    pub yield_kg: f64,
    pub nutrition: f64,
    pub freshness: f64,
    pub cost_basis: f64,
    pub quality_tags: Vec<String>,
    pub age_days: u32,
}

impl From<HarvestRecord> for StorageLot {
    fn from(record: HarvestRecord) -> Self {
        Self {
            name: record.name,
            yield_kg: record.yield_kg,
            nutrition: record.nutrition,
            freshness: record.freshness.clamp(0.0, 100.0),
            cost_basis: record.cost,
            quality_tags: record.quality_tags,
            age_days: 0,
        }
    }
}

impl StorageLot {
    /// `1.0 + 0.1` per quality tag.
    pub fn quality_bonus(&self) -> f64 {
        1.0 + 0.1 * self.quality_tags.len() as f64
    }

    pub fn sale_value(&self, market_price: f64, quality_bonus: f64) -> f64 {
        let condition = (self.nutrition * 0.5 + self.freshness * 0.5) / 100.0;
        round_to(self.yield_kg * market_price * condition * quality_bonus, 2).max(0.0)
    }
}

/// Money received for one lot.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleReceipt {
    pub lot: StorageLot,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    lots: Vec<StorageLot>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: HarvestRecord) {
        self.lots.push(StorageLot::from(record));
    }

    /// Ages every lot by a day and returns the day's storage fee.
    ///
    /// Older lots lose freshness faster; the loss is scaled by a random
    /// factor in `[0.8, 1.2]`.
    pub fn update_all<R: Rng + ?Sized>(&mut self, rng: &mut R, fee_per_lot: f64) -> f64 {
        for lot in &mut self.lots {
            lot.age_days += 1;
            let decay = (BASE_DECAY + DECAY_PER_DAY_OF_AGE * lot.age_days as f64)
                * rng.gen_range(0.8..=1.2);
            lot.freshness = (lot.freshness - decay).max(0.0);
        }
        self.lots.len() as f64 * fee_per_lot
    }

    pub fn sell(
        &mut self,
        index: usize,
        market_price: f64,
        quality_bonus: f64,
    ) -> Result<SaleReceipt, FarmError> {
        if self.lots.is_empty() {
            return Err(FarmError::EmptyStorage);
        }
        if index >= self.lots.len() {
            return Err(FarmError::InvalidIndex(index));
        }
        let lot = self.lots.remove(index);
        let value = lot.sale_value(market_price, quality_bonus);
        Ok(SaleReceipt { lot, value })
    }

    pub fn lots(&self) -> &[StorageLot] {
        &self.lots
    }

    pub fn get(&self, index: usize) -> Option<&StorageLot> {
        self.lots.get(index)
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn record(name: &str, tags: &[&str]) -> HarvestRecord {
        HarvestRecord {
            name: name.to_string(),
            yield_kg: 300.0,
            nutrition: 80.0,
            freshness: 100.0,
            cost: 350.0,
            quality_tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    #[test]
    fn freshness_only_goes_down_and_floors_at_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut storage = Storage::new();
        storage.add(record("tomato", &[]));
        let mut previous = 100.0;
        for _ in 0..60 {
            storage.update_all(&mut rng, 2.0);
            let freshness = storage.lots()[0].freshness;
            assert!(freshness <= previous);
            assert!(freshness >= 0.0);
            previous = freshness;
        }
        assert_eq!(previous, 0.0);
        assert_eq!(storage.lots()[0].age_days, 60);
    }

    #[test]
    fn decay_accelerates_with_age() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut storage = Storage::new();
        storage.add(record("wheat", &[]));
        storage.update_all(&mut rng, 0.0);
        let first_day_loss = 100.0 - storage.lots()[0].freshness;
        // day one: 1.5 × [0.8, 1.2]
        assert!((1.2..=1.8).contains(&first_day_loss));
        for _ in 0..8 {
            storage.update_all(&mut rng, 0.0);
        }
        let before = storage.lots()[0].freshness;
        storage.update_all(&mut rng, 0.0);
        // day ten: 6.0 × [0.8, 1.2]
        assert!(before - storage.lots()[0].freshness > 4.79);
    }

    #[test]
    fn fee_is_charged_per_lot() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut storage = Storage::new();
        assert_eq!(storage.update_all(&mut rng, 2.0), 0.0);
        storage.add(record("corn", &[]));
        storage.add(record("rice", &[]));
        assert_eq!(storage.update_all(&mut rng, 2.0), 4.0);
    }

    #[test]
    fn sale_value_blends_nutrition_and_freshness() {
        let mut storage = Storage::new();
        storage.add(record("wheat", &["high-gluten"]));
        let bonus = storage.lots()[0].quality_bonus();
        assert!((bonus - 1.1).abs() < 1e-12);

        let receipt = storage.sell(0, 2.0, bonus).unwrap();
        // 300 × 2.0 × 0.9 × 1.1
        assert_eq!(receipt.value, 594.0);
        assert_eq!(receipt.lot.name, "wheat");
        assert!(storage.is_empty());
    }

    #[test]
    fn sell_validates_index() {
        let mut storage = Storage::new();
        assert_eq!(storage.sell(0, 2.0, 1.0).unwrap_err(), FarmError::EmptyStorage);
        storage.add(record("corn", &[]));
        storage.add(record("rice", &[]));
        assert_eq!(storage.sell(2, 2.0, 1.0).unwrap_err(), FarmError::InvalidIndex(2));
        assert_eq!(storage.len(), 2);

        let receipt = storage.sell(1, 2.6, 1.0).unwrap();
        assert_eq!(receipt.lot.name, "rice");
        assert!(receipt.value >= 0.0);
        assert_eq!(storage.len(), 1);
    }
}
