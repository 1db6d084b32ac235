//! Hourly crop state machine.
//!
//! A [`CropInstance`] lives inline in its field and is advanced one hour at a
//! time with that hour's [`WeatherSample`] and the field's [`Soil`]. Every
//! 24th hour runs the daily block: nutrient uptake, growth, maturity and a
//! disease roll. `dead` and `harvested` are terminal; updates on a terminal
//! crop do nothing and report `None`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::crops::{CropCatalog, CropType};
use crate::error::FarmError;
use crate::round_to;
use crate::soil::{Npk, Nutrient, Soil};
use crate::weather::WeatherSample;

pub const MAX_HEALTH: f64 = 100.0;
pub const MAX_WATER: f64 = 120.0;
pub const MAX_SUN_STRESS: f64 = 100.0;
pub const INITIAL_WATER: f64 = 100.0;

const HOURS_PER_DAY: u32 = 24;
const EVAPORATION_BASE_TEMP: f64 = 10.0;
const RAIN_EFFECTIVENESS: f64 = 2.0;
const NIGHT_SUNLIGHT: f64 = 1.0;
const SUN_STRESS_GAIN: f64 = 2.0;
const SUN_STRESS_DECAY: f64 = 1.0;
const SUN_STRESS_LIMIT: f64 = 50.0;
const SUN_STRESS_PENALTY: f64 = 0.02;
const NUTRIENT_FLOOR: f64 = 0.6;
const NUTRIENT_PENALTY: f64 = 5.0;
const DROUGHT_THRESHOLD: f64 = 30.0;
const DROUGHT_PENALTY: f64 = 0.1;
const WATERLOG_THRESHOLD: f64 = 115.0;
const WATERLOG_PENALTY: f64 = 0.2;
const TEMPERATURE_PENALTY: f64 = 0.5;
const EXTREME_WEATHER_PENALTY: f64 = 1.0;
const RECOVERY_PER_HOUR: f64 = 0.2;
const QUALITY_THRESHOLD: f64 = 0.9;
const DISEASE_DAMAGE: f64 = 10.0;
const PESTICIDE_FACTOR: f64 = 0.1;
const MIN_YIELD_FACTOR: f64 = 0.2;

pub const WATERING_AMOUNT: f64 = 30.0;
pub const PESTICIDE_HOURS: u32 = 48;

/// Named cause of a current health penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageTag {
    Nutrient,
    WaterShortage,
    Waterlogging,
    Temperature,
    ExtremeWeather,
    Light,
    Disease,
}

impl DamageTag {
    /// Tags re-evaluated from scratch every hour by the health step.
    const CONDITIONS: [DamageTag; 5] = [
        DamageTag::Nutrient,
        DamageTag::WaterShortage,
        DamageTag::Waterlogging,
        DamageTag::Temperature,
        DamageTag::ExtremeWeather,
    ];
}

impl fmt::Display for DamageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DamageTag::Nutrient => "nutrient",
            DamageTag::WaterShortage => "water-shortage",
            DamageTag::Waterlogging => "waterlogging",
            DamageTag::Temperature => "temperature",
            DamageTag::ExtremeWeather => "extreme-weather",
            DamageTag::Light => "light",
            DamageTag::Disease => "disease",
        };
        f.write_str(label)
    }
}

/// Cumulative per-nutrient satisfaction since planting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientHistory {
    pub sums: Npk,
    pub total_days: u32,
}

impl NutrientHistory {
    pub fn average(&self, nutrient: Nutrient) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        self.sums.get(nutrient) / self.total_days as f64
    }

    pub fn overall_average(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        self.sums.total() / (self.total_days as f64 * 3.0)
    }
}

/// What changed during one hourly update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourOutcome {
    pub new_tags: Vec<DamageTag>,
    pub day_completed: bool,
    pub matured: bool,
    pub disease: bool,
    pub died: bool,
}

/// A harvested crop ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    pub name: String,
    pub yield_kg: f64,
    pub nutrition: f64,
    pub freshness: f64,
    pub cost: f64,
    pub quality_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropInstance {
    crop: Arc<CropType>,
    hour_counter: u32,
    day_counter: u32,
    growth_points: f64,
    health: f64,
    water_level: f64,
    sun_stress: f64,
    nutrients: NutrientHistory,
    quality_tags: BTreeSet<String>,
    pesticide_effect_hours: u32,
    damage_reasons: BTreeSet<DamageTag>,
    matured: bool,
    dead: bool,
    harvested: bool,
    total_cost: f64,
}

impl CropInstance {
    pub fn plant(crop: Arc<CropType>) -> Self {
        let total_cost = crop.cost_per_mu;
        Self {
            crop,
            hour_counter: 0,
            day_counter: 0,
            growth_points: 0.0,
            health: MAX_HEALTH,
            water_level: INITIAL_WATER,
            sun_stress: 0.0,
            nutrients: NutrientHistory::default(),
            quality_tags: BTreeSet::new(),
            pesticide_effect_hours: 0,
            damage_reasons: BTreeSet::new(),
            matured: false,
            dead: false,
            harvested: false,
            total_cost,
        }
    }

    pub fn crop_type(&self) -> &CropType {
        &self.crop
    }

    pub fn name(&self) -> &str {
        &self.crop.name
    }

    pub fn hour_counter(&self) -> u32 {
        self.hour_counter
    }

    pub fn day_counter(&self) -> u32 {
        self.day_counter
    }

    pub fn growth_points(&self) -> f64 {
        self.growth_points
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn water_level(&self) -> f64 {
        self.water_level
    }

    pub fn sun_stress(&self) -> f64 {
        self.sun_stress
    }

    pub fn nutrient_history(&self) -> &NutrientHistory {
        &self.nutrients
    }

    pub fn quality_tags(&self) -> &BTreeSet<String> {
        &self.quality_tags
    }

    pub fn pesticide_effect_hours(&self) -> u32 {
        self.pesticide_effect_hours
    }

    pub fn damage_reasons(&self) -> &BTreeSet<DamageTag> {
        &self.damage_reasons
    }

    pub fn is_matured(&self) -> bool {
        self.matured
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_harvested(&self) -> bool {
        self.harvested
    }

    pub fn is_terminal(&self) -> bool {
        self.dead || self.harvested
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Today's disease probability; pesticide cuts it to a tenth.
    pub fn disease_chance(&self) -> f64 {
        if self.pesticide_effect_hours > 0 {
            self.crop.disease_chance * PESTICIDE_FACTOR
        } else {
            self.crop.disease_chance
        }
    }

    /// Advances the crop by one hour. Returns `None` on a terminal crop.
    pub fn update_hour<R: Rng + ?Sized>(
        &mut self,
        weather: &WeatherSample,
        soil: &mut Soil,
        rng: &mut R,
    ) -> Option<HourOutcome> {
        if self.is_terminal() {
            return None;
        }
        let before = self.damage_reasons.clone();
        let mut outcome = HourOutcome::default();

        self.hour_counter += 1;
        if self.hour_counter % HOURS_PER_DAY == 0 {
            self.day_counter += 1;
            outcome.day_completed = true;
            self.daily_update(soil, rng, &mut outcome);
        }

        self.update_water(weather);
        self.update_sun_stress(weather);
        self.update_health(weather);

        self.pesticide_effect_hours = self.pesticide_effect_hours.saturating_sub(1);

        if self.health <= 0.0 {
            self.health = 0.0;
            self.dead = true;
            outcome.died = true;
        }

        outcome.new_tags = self.damage_reasons.difference(&before).copied().collect();
        Some(outcome)
    }

    fn daily_update<R: Rng + ?Sized>(&mut self, soil: &mut Soil, rng: &mut R, outcome: &mut HourOutcome) {
        let uptake = soil.daily_uptake(&self.crop);
        self.nutrients.total_days += 1;
        for nutrient in Nutrient::ALL {
            *self.nutrients.sums.get_mut(nutrient) += uptake.ratio(nutrient);
        }
        self.growth_points += uptake.satisfaction();

        if !self.matured && self.growth_points >= self.crop.grow_days {
            self.matured = true;
            self.finalize_quality_tags();
            outcome.matured = true;
        }

        if rng.gen::<f64>() < self.disease_chance() {
            self.health -= DISEASE_DAMAGE;
            self.damage_reasons.insert(DamageTag::Disease);
            outcome.disease = true;
        }
    }

    fn finalize_quality_tags(&mut self) {
        if self.nutrients.total_days == 0 {
            return;
        }
        for (nutrient, tag) in &self.crop.quality_tags {
            if self.nutrients.average(*nutrient) >= QUALITY_THRESHOLD {
                self.quality_tags.insert(tag.clone());
            }
        }
    }

    fn update_water(&mut self, weather: &WeatherSample) {
        let consumption = self.crop.water_need / HOURS_PER_DAY as f64;
        let evaporation = (weather.sunlight / 10.0)
            * ((weather.temperature - EVAPORATION_BASE_TEMP).max(0.0) / 20.0);
        self.water_level -= consumption + evaporation;

        if weather.rainfall > 0.0 {
            self.water_level += weather.rainfall * RAIN_EFFECTIVENESS;
            self.damage_reasons.remove(&DamageTag::WaterShortage);
        }

        self.water_level = self.water_level.clamp(0.0, MAX_WATER);
    }

    fn update_sun_stress(&mut self, weather: &WeatherSample) {
        let intensity = weather.sunlight;
        let (ideal, tolerance) = self.crop.sun_preference;
        let out_of_range = intensity > NIGHT_SUNLIGHT
            && !(ideal - tolerance..=ideal + tolerance).contains(&intensity);

        if out_of_range {
            self.sun_stress = (self.sun_stress + SUN_STRESS_GAIN).min(MAX_SUN_STRESS);
            self.damage_reasons.insert(DamageTag::Light);
        } else {
            self.sun_stress = (self.sun_stress - SUN_STRESS_DECAY).max(0.0);
            self.damage_reasons.remove(&DamageTag::Light);
        }
    }

    fn drought_threshold(&self) -> f64 {
        DROUGHT_THRESHOLD * (1.0 - 0.5 * self.crop.drought_tolerance.clamp(0.0, 1.0))
    }

    fn update_health(&mut self, weather: &WeatherSample) {
        for tag in DamageTag::CONDITIONS {
            self.damage_reasons.remove(&tag);
        }

        let avg_satisfaction = if self.day_counter > 0 {
            self.growth_points / self.day_counter as f64
        } else {
            1.0
        };
        if avg_satisfaction < NUTRIENT_FLOOR {
            self.health -= (NUTRIENT_FLOOR - avg_satisfaction) * NUTRIENT_PENALTY;
            self.damage_reasons.insert(DamageTag::Nutrient);
        }

        let threshold = self.drought_threshold();
        if self.water_level < threshold {
            self.health -= (threshold - self.water_level) * DROUGHT_PENALTY;
            self.damage_reasons.insert(DamageTag::WaterShortage);
        } else if self.water_level > WATERLOG_THRESHOLD {
            self.health -= (self.water_level - WATERLOG_THRESHOLD) * WATERLOG_PENALTY;
            self.damage_reasons.insert(DamageTag::Waterlogging);
        }

        let (min_temp, max_temp) = self.crop.temp_range;
        if !(min_temp..=max_temp).contains(&weather.temperature) {
            self.health -= TEMPERATURE_PENALTY;
            self.damage_reasons.insert(DamageTag::Temperature);
        }

        if weather.extreme_event.is_some() {
            self.health -= EXTREME_WEATHER_PENALTY;
            self.damage_reasons.insert(DamageTag::ExtremeWeather);
        }

        if self.sun_stress > SUN_STRESS_LIMIT {
            self.health -= (self.sun_stress - SUN_STRESS_LIMIT) * SUN_STRESS_PENALTY;
            self.damage_reasons.insert(DamageTag::Light);
        }

        if self.damage_reasons.is_empty() {
            self.health += RECOVERY_PER_HOUR;
        }
        self.health = self.health.clamp(0.0, MAX_HEALTH);
    }

    /// Adds water; returns false on a terminal crop.
    pub fn water(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.water_level = (self.water_level + WATERING_AMOUNT).min(MAX_WATER);
        self.damage_reasons.remove(&DamageTag::WaterShortage);
        true
    }

    /// Starts a pesticide window and clears disease; returns false on a
    /// terminal crop.
    pub fn apply_pesticide(&mut self, cost: f64) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.pesticide_effect_hours = PESTICIDE_HOURS;
        self.damage_reasons.remove(&DamageTag::Disease);
        self.total_cost += cost;
        true
    }

    /// Harvests a matured, living crop. Leaves state untouched on failure.
    pub fn harvest(&mut self) -> Result<HarvestRecord, FarmError> {
        if self.harvested {
            return Err(FarmError::AlreadyHarvested);
        }
        if self.dead {
            return Err(FarmError::Dead);
        }
        if !self.matured {
            return Err(FarmError::NotMature);
        }

        self.harvested = true;
        let factor = (MIN_YIELD_FACTOR + self.nutrients.overall_average() * (1.0 - MIN_YIELD_FACTOR))
            .clamp(MIN_YIELD_FACTOR, 1.0);
        Ok(HarvestRecord {
            name: self.crop.name.clone(),
            yield_kg: round_to(self.crop.yield_per_mu * factor, 1),
            nutrition: round_to(self.health, 1),
            freshness: 100.0,
            cost: self.total_cost,
            quality_tags: self.quality_tags.iter().cloned().collect(),
        })
    }

    pub fn to_record(&self) -> CropRecord {
        CropRecord {
            crop_type: self.crop.name.clone(),
            hour_counter: self.hour_counter,
            day_counter: self.day_counter,
            growth_points: self.growth_points,
            health: self.health,
            water_level: self.water_level,
            sun_stress: self.sun_stress,
            nutrients: self.nutrients,
            quality_tags: self.quality_tags.iter().cloned().collect(),
            pesticide_effect_hours: self.pesticide_effect_hours,
            damage_reasons: self.damage_reasons.iter().copied().collect(),
            matured: self.matured,
            dead: self.dead,
            harvested: self.harvested,
            total_cost: self.total_cost,
        }
    }

    pub fn from_record(record: &CropRecord, catalog: &CropCatalog) -> Result<Self, FarmError> {
        Ok(Self {
            crop: catalog.lookup(&record.crop_type)?,
            hour_counter: record.hour_counter,
            day_counter: record.day_counter,
            growth_points: record.growth_points.max(0.0),
            health: record.health.clamp(0.0, MAX_HEALTH),
            water_level: record.water_level.clamp(0.0, MAX_WATER),
            sun_stress: record.sun_stress.clamp(0.0, MAX_SUN_STRESS),
            nutrients: record.nutrients,
            quality_tags: record.quality_tags.iter().cloned().collect(),
            pesticide_effect_hours: record.pesticide_effect_hours,
            damage_reasons: record.damage_reasons.iter().copied().collect(),
            matured: record.matured,
            dead: record.dead,
            harvested: record.harvested,
            total_cost: record.total_cost,
        })
    }
}

/// Flat persisted form of a [`CropInstance`]; the descriptor is stored by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    pub crop_type: String,
    pub hour_counter: u32,
    pub day_counter: u32,
    pub growth_points: f64,
    pub health: f64,
    pub water_level: f64,
    pub sun_stress: f64,
    pub nutrients: NutrientHistory,
    pub quality_tags: Vec<String>,
    pub pesticide_effect_hours: u32,
    pub damage_reasons: Vec<DamageTag>,
    pub matured: bool,
    pub dead: bool,
    pub harvested: bool,
    pub total_cost: f64,
}
