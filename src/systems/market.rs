use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{FarmEvent, System, SystemContext},
    farm::Farm,
    rng::SystemRng,
};

pub struct MarketSystem;

impl MarketSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarketSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MarketSystem {
    fn name(&self) -> &str {
        "market"
    }

    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        farm: &mut Farm,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !ctx.day_started {
            return Ok(());
        }
        let today = farm.weather.today();
        farm.market.update_prices(&today, rng);
        for entry in farm.market.entries() {
            debug!(commodity = %entry.name, price = entry.price, "price");
        }
        ctx.emit(FarmEvent::PricesUpdated { date: today.date });
        Ok(())
    }
}
