use anyhow::Result;
use tracing::info;

use crate::{
    engine::{FarmEvent, System, SystemContext},
    farm::Farm,
    rng::SystemRng,
};

/// Ages stored lots once a day and deducts the storage fee, even into
/// negative funds.
pub struct StorageSystem;

impl StorageSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StorageSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for StorageSystem {
    fn name(&self) -> &str {
        "storage"
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
        let fee = farm
            .storage
            .update_all(rng, farm.costs.storage_fee_per_lot);
        if fee > 0.0 {
            farm.funds -= fee;
            info!(fee, lots = farm.storage.len(), funds = farm.funds, "storage fee");
            ctx.emit(FarmEvent::StorageFee { amount: fee });
        }
        Ok(())
    }
}
