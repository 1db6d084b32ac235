use anyhow::Result;
use tracing::info;

use crate::{
    engine::{FarmEvent, System, SystemContext},
    farm::Farm,
    rng::SystemRng,
};

/// Draws the hour's weather and, on crossing midnight, the new day.
pub struct WeatherSystem;

impl WeatherSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WeatherSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WeatherSystem {
    fn name(&self) -> &str {
        "weather"
    }

    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        farm: &mut Farm,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        farm.weather.update_hour(rng);
        if farm.weather.is_new_day() {
            let date = farm.weather.now().date();
            farm.weather.start_new_day(date, rng);
            let today = farm.weather.today();
            info!(
                %date,
                rainfall_total = today.rainfall_total,
                extreme_event = ?today.extreme_event,
                "new day"
            );
            ctx.day_started = true;
            ctx.emit(FarmEvent::DayStarted {
                date,
                rainfall_total: today.rainfall_total,
                extreme_event: today.extreme_event,
            });
        }
        Ok(())
    }
}
