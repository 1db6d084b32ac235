//! Per-field nutrient pools and daily nutrient uptake.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crops::{CropType, SpecialTrait};
use crate::error::FarmError;

/// Nitrogen returned to the soil each day by a nitrogen-fixing crop.
pub const NITROGEN_FIXATION_PER_DAY: f64 = 0.5;

/// Default starting amount of each nutrient in a fresh field.
pub const DEFAULT_POOL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    N,
    P,
    K,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::N, Nutrient::P, Nutrient::K];
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Nutrient::N => "N",
            Nutrient::P => "P",
            Nutrient::K => "K",
        };
        f.write_str(label)
    }
}

impl FromStr for Nutrient {
    type Err = FarmError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "n" | "nitrogen" => Ok(Nutrient::N),
            "p" | "phosphorus" => Ok(Nutrient::P),
            "k" | "potassium" => Ok(Nutrient::K),
            _ => Err(FarmError::InvalidNutrient(value.to_string())),
        }
    }
}

/// One value per nutrient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Npk {
    pub n: f64,
    pub p: f64,
    pub k: f64,
}

impl Npk {
    pub fn new(n: f64, p: f64, k: f64) -> Self {
        Self { n, p, k }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::N => self.n,
            Nutrient::P => self.p,
            Nutrient::K => self.k,
        }
    }

    pub fn get_mut(&mut self, nutrient: Nutrient) -> &mut f64 {
        match nutrient {
            Nutrient::N => &mut self.n,
            Nutrient::P => &mut self.p,
            Nutrient::K => &mut self.k,
        }
    }

    pub fn total(&self) -> f64 {
        self.n + self.p + self.k
    }
}

/// Result of one day of nutrient uptake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uptake {
    pub ideal: Npk,
    pub actual: Npk,
}

impl Uptake {
    /// Fraction of the ideal total the crop actually received today.
    pub fn satisfaction(&self) -> f64 {
        let ideal = self.ideal.total();
        if ideal > 0.0 {
            self.actual.total() / ideal
        } else {
            1.0
        }
    }

    /// Per-nutrient fraction of the ideal amount; 1.0 when none was wanted.
    pub fn ratio(&self, nutrient: Nutrient) -> f64 {
        let ideal = self.ideal.get(nutrient);
        if ideal > 0.0 {
            self.actual.get(nutrient) / ideal
        } else {
            1.0
        }
    }
}

/// Nutrient pools of a single field. Pools never go negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Soil {
    pools: Npk,
}

impl Default for Soil {
    fn default() -> Self {
        Self::new(Npk::new(DEFAULT_POOL, DEFAULT_POOL, DEFAULT_POOL))
    }
}

impl Soil {
    pub fn new(pools: Npk) -> Self {
        Self {
            pools: Npk::new(pools.n.max(0.0), pools.p.max(0.0), pools.k.max(0.0)),
        }
    }

    pub fn pools(&self) -> Npk {
        self.pools
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        self.pools.get(nutrient)
    }

    pub fn apply_fertilizer(&mut self, nutrient: Nutrient, amount: f64) -> Result<(), FarmError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(FarmError::InvalidAmount(amount));
        }
        *self.pools.get_mut(nutrient) += amount;
        Ok(())
    }

    /// Fertilizer by nutrient name, as typed by a player.
    pub fn apply_named_fertilizer(&mut self, name: &str, amount: f64) -> Result<Nutrient, FarmError> {
        let nutrient: Nutrient = name.parse()?;
        self.apply_fertilizer(nutrient, amount)?;
        Ok(nutrient)
    }

    /// Draws one day of nutrients for `crop`.
    ///
    /// The crop's total uptake is split by its preference ratio; each
    /// nutrient is capped at what the pool holds. Nitrogen fixers return a
    /// fixed amount of N afterwards.
    pub fn daily_uptake(&mut self, crop: &CropType) -> Uptake {
        let preference = crop.npk_preference;
        let total_pref = preference.total();
        let mut ideal = Npk::default();
        let mut actual = Npk::default();
        for nutrient in Nutrient::ALL {
            let share = if total_pref > 0.0 {
                preference.get(nutrient) / total_pref
            } else {
                0.0
            };
            let want = (crop.npk_uptake * share).max(0.0);
            let pool = self.pools.get_mut(nutrient);
            let take = want.min(*pool);
            *pool = (*pool - take).max(0.0);
            *ideal.get_mut(nutrient) = want;
            *actual.get_mut(nutrient) = take;
        }

        if crop.special_trait == Some(SpecialTrait::NitrogenFixer) {
            self.pools.n += NITROGEN_FIXATION_PER_DAY;
        }

        Uptake { ideal, actual }
    }
}
