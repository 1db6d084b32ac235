//! Immutable crop descriptors and the name → descriptor catalogue.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FarmError;
use crate::soil::{Npk, Nutrient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialTrait {
    NitrogenFixer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropType {
    pub name: String,
    /// Growth points needed to mature (one point per fully fed day).
    pub grow_days: f64,
    /// Tolerated temperature band in °C, inclusive.
    pub temp_range: (f64, f64),
    /// 0..1; widens the drought threshold.
    pub drought_tolerance: f64,
    pub cost_per_mu: f64,
    pub yield_per_mu: f64,
    /// Daily disease probability without pesticide.
    pub disease_chance: f64,
    /// Daily water consumption.
    pub water_need: f64,
    /// (ideal intensity, tolerance)
    pub sun_preference: (f64, f64),
    pub npk_preference: Npk,
    /// Total nutrients drawn per day.
    pub npk_uptake: f64,
    #[serde(default)]
    pub quality_tags: BTreeMap<Nutrient, String>,
    #[serde(default)]
    pub special_trait: Option<SpecialTrait>,
}

#[allow(clippy::too_many_arguments)]
fn crop(
    name: &str,
    grow_days: f64,
    temp_range: (f64, f64),
    drought_tolerance: f64,
    cost_per_mu: f64,
    yield_per_mu: f64,
    disease_chance: f64,
    water_need: f64,
    sun_preference: (f64, f64),
    npk_preference: (f64, f64, f64),
    npk_uptake: f64,
    quality_tag: (Nutrient, &str),
) -> CropType {
    let mut quality_tags = BTreeMap::new();
    quality_tags.insert(quality_tag.0, quality_tag.1.to_string());
    CropType {
        name: name.to_string(),
        grow_days,
        temp_range,
        drought_tolerance,
        cost_per_mu,
        yield_per_mu,
        disease_chance,
        water_need,
        sun_preference,
        npk_preference: Npk::new(npk_preference.0, npk_preference.1, npk_preference.2),
        npk_uptake,
        quality_tags,
        special_trait: None,
    }
}

/// Restore-time lookup table from crop name to shared descriptor.
#[derive(Debug, Clone, Default)]
pub struct CropCatalog {
    crops: BTreeMap<String, Arc<CropType>>,
}

impl CropCatalog {
    pub fn new(crops: impl IntoIterator<Item = CropType>) -> Self {
        Self {
            crops: crops
                .into_iter()
                .map(|crop| (crop.name.clone(), Arc::new(crop)))
                .collect(),
        }
    }

    // One crop per entry, in `crop()` argument order.
    #[rustfmt::skip]
    pub fn standard() -> Self {
        let mut soybean = crop(
            "soybean", 9.0, (16.0, 30.0), 0.5, 300.0, 360.0, 0.01, 4.0, (7.0, 3.0),
            (2.0, 4.0, 3.0), 2.0, (Nutrient::N, "high-protein"),
        );
        soybean.special_trait = Some(SpecialTrait::NitrogenFixer);

        Self::new([
            crop(
                "wheat", 9.0, (10.0, 25.0), 0.6, 300.0, 350.0, 0.01, 3.0, (6.0, 3.0),
                (4.0, 2.0, 1.0), 2.0, (Nutrient::N, "high-gluten"),
            ),
            crop(
                "corn", 10.0, (15.0, 30.0), 0.4, 320.0, 400.0, 0.02, 5.0, (7.0, 2.0),
                (5.0, 2.0, 2.0), 2.5, (Nutrient::N, "high-protein"),
            ),
            crop(
                "tomato", 7.0, (18.0, 28.0), 0.3, 350.0, 300.0, 0.05, 6.0, (8.0, 2.0),
                (3.0, 2.0, 5.0), 2.2, (Nutrient::K, "high-sugar"),
            ),
            crop(
                "rice", 11.0, (20.0, 32.0), 0.1, 360.0, 380.0, 0.03, 10.0, (6.0, 3.0),
                (4.0, 2.0, 3.0), 2.8, (Nutrient::N, "premium"),
            ),
            soybean,
            crop(
                "strawberry", 6.0, (16.0, 26.0), 0.3, 400.0, 180.0, 0.06, 5.0, (5.0, 2.0),
                (2.0, 3.0, 4.0), 1.8, (Nutrient::K, "high-sugar"),
            ),
            crop(
                "chili", 8.0, (20.0, 32.0), 0.3, 350.0, 260.0, 0.04, 5.0, (8.0, 2.0),
                (3.0, 2.0, 4.0), 2.1, (Nutrient::K, "spicy"),
            ),
            crop(
                "cucumber", 6.0, (18.0, 30.0), 0.4, 320.0, 240.0, 0.03, 7.0, (6.0, 3.0),
                (2.0, 3.0, 6.0), 2.3, (Nutrient::P, "crisp"),
            ),
            crop(
                "grape", 10.0, (15.0, 28.0), 0.4, 450.0, 300.0, 0.05, 4.0, (8.0, 2.0),
                (2.0, 2.0, 5.0), 2.6, (Nutrient::K, "high-sugar"),
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CropType>> {
        self.crops.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<CropType>, FarmError> {
        self.crops
            .get(name)
            .cloned()
            .ok_or_else(|| FarmError::InvalidCropType(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.crops.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}
