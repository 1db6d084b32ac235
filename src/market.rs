//! Bounded random-walk commodity prices.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::round_to;
use crate::weather::DailyWeather;

const DAILY_SWING: f64 = 0.05;
const HEAVY_RAIN_MM: f64 = 20.0;
const RAIN_DRIFT: f64 = 0.03;
const EXTREME_DRIFT: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub name: String,
    pub price: f64,
    pub base_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Heavy rain cuts supply of this commodity and lifts its price.
    #[serde(default)]
    pub rain_sensitive: bool,
}

fn default_unit() -> String {
    "kg".to_string()
}

impl MarketEntry {
    pub fn new(name: &str, base_price: f64, min_price: f64, max_price: f64, rain_sensitive: bool) -> Self {
        Self {
            name: name.to_string(),
            price: base_price,
            base_price,
            min_price,
            max_price,
            unit: default_unit(),
            rain_sensitive,
        }
    }

    fn update_price<R: Rng + ?Sized>(&mut self, weather: &DailyWeather, rng: &mut R) {
        let mut change_rate = rng.gen_range(-DAILY_SWING..=DAILY_SWING);
        if weather.rainfall_total > HEAVY_RAIN_MM && self.rain_sensitive {
            change_rate += RAIN_DRIFT;
        }
        if weather.extreme_event.is_some() {
            change_rate += EXTREME_DRIFT;
        }
        let next = self.price * (1.0 + change_rate);
        self.price = round_to(next.clamp(self.min_price, self.max_price), 2);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    entries: Vec<MarketEntry>,
}

impl Market {
    pub fn new(entries: Vec<MarketEntry>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            MarketEntry::new("wheat", 2.0, 1.5, 2.5, true),
            MarketEntry::new("corn", 2.2, 1.6, 2.8, true),
            MarketEntry::new("rice", 2.6, 2.0, 3.2, true),
            MarketEntry::new("soybean", 3.1, 2.4, 4.0, true),
            MarketEntry::new("strawberry", 10.0, 6.0, 15.0, true),
            MarketEntry::new("tomato", 3.5, 2.5, 4.8, true),
            MarketEntry::new("chili", 6.5, 4.5, 8.5, true),
            MarketEntry::new("apple", 4.0, 3.0, 5.5, false),
            MarketEntry::new("cucumber", 3.2, 2.2, 4.5, false),
            MarketEntry::new("grape", 6.0, 4.0, 8.0, false),
            MarketEntry::new("egg", 5.0, 3.8, 6.5, false),
            MarketEntry::new("milk", 4.2, 3.5, 5.0, false),
            MarketEntry::new("pork", 24.0, 18.0, 32.0, false),
        ])
    }

    /// One day of price movement for every commodity.
    pub fn update_prices<R: Rng + ?Sized>(&mut self, weather: &DailyWeather, rng: &mut R) {
        for entry in &mut self.entries {
            entry.update_price(weather, rng);
        }
    }

    pub fn get_price(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.price)
    }

    pub fn entries(&self) -> &[MarketEntry] {
        &self.entries
    }
}
