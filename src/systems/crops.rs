use anyhow::Result;
use tracing::{debug, info};

use crate::{
    engine::{FarmEvent, System, SystemContext},
    farm::Farm,
    rng::SystemRng,
};

/// Advances every living crop by the hour just sampled.
pub struct CropSystem;

impl CropSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CropSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CropSystem {
    fn name(&self) -> &str {
        "crops"
    }

    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        farm: &mut Farm,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let Some(sample) = farm.weather.current().copied() else {
            return Ok(());
        };
        for (index, field) in farm.fields.iter_mut().enumerate() {
            let Some(crop) = field.crop.as_mut() else {
                continue;
            };
            let Some(outcome) = crop.update_hour(&sample, &mut field.soil, rng) else {
                continue;
            };
            let name = crop.name().to_string();

            for tag in outcome.new_tags {
                debug!(field = index, crop = %name, %tag, "damage");
                ctx.emit(FarmEvent::DamageTagged {
                    field: index,
                    crop: name.clone(),
                    tag,
                });
            }
            if outcome.disease {
                info!(field = index, crop = %name, health = crop.health(), "disease");
                ctx.emit(FarmEvent::CropDiseased {
                    field: index,
                    crop: name.clone(),
                });
            }
            if outcome.matured {
                info!(field = index, crop = %name, day = crop.day_counter(), "matured");
                ctx.emit(FarmEvent::CropMatured {
                    field: index,
                    crop: name.clone(),
                });
            }
            if outcome.died {
                info!(field = index, crop = %name, "died");
                ctx.emit(FarmEvent::CropDied {
                    field: index,
                    crop: name,
                });
            }
        }
        Ok(())
    }
}
