use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    crops::CropCatalog,
    error::FarmError,
    farm::{Farm, GameStatus},
    growth::DamageTag,
    loan::RepaymentOutcome,
    rng::{RngManager, SystemRng},
    scenario::Scenario,
    snapshot::{SaveRecord, SnapshotWriter, SAVE_VERSION},
    weather::ExtremeEvent,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Weather, crops, market, storage and loan, in tick order.
    pub fn with_farm_systems(self) -> Self {
        use crate::systems::{CropSystem, LoanSystem, MarketSystem, StorageSystem, WeatherSystem};
        self.with_system(WeatherSystem::new())
            .with_system(CropSystem::new())
            .with_system(MarketSystem::new())
            .with_system(StorageSystem::new())
            .with_system(LoanSystem::new())
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
            tick: 0,
        }
    }
}

/// Something worth telling the player about, raised during a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FarmEvent {
    DayStarted {
        date: NaiveDate,
        rainfall_total: f64,
        extreme_event: Option<ExtremeEvent>,
    },
    DamageTagged {
        field: usize,
        crop: String,
        tag: DamageTag,
    },
    CropDiseased {
        field: usize,
        crop: String,
    },
    CropMatured {
        field: usize,
        crop: String,
    },
    CropDied {
        field: usize,
        crop: String,
    },
    PricesUpdated {
        date: NaiveDate,
    },
    StorageFee {
        amount: f64,
    },
    LoanSettled {
        outcome: RepaymentOutcome,
    },
    GameOver {
        status: GameStatus,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    /// Simulated clock after the tick.
    pub at: NaiveDateTime,
    pub events: Vec<FarmEvent>,
    pub snapshot_path: Option<PathBuf>,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
    tick: u64,
}

impl Engine {
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Builds the scenario's starting farm, drawing its first day of weather
    /// from the engine's `weather` stream.
    pub fn spawn_farm(&mut self, scenario: &Scenario) -> Result<Farm> {
        let mut rng = self.rng.stream("weather");
        scenario.build_farm(&mut rng)
    }

    /// Advances the farm by one simulated hour.
    pub fn tick(&mut self, farm: &mut Farm) -> Result<TickReport> {
        if farm.status().is_over() {
            return Err(FarmError::GameOver.into());
        }
        self.tick += 1;
        let mut ctx = SystemContext {
            tick: self.tick,
            scenario_name: &self.settings.scenario_name,
            day_started: false,
            events: Vec::new(),
        };
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&mut ctx, farm, &mut rng_stream)?;
        }
        let mut events = ctx.events;

        if let Some(status) = farm.check_game_over() {
            warn!(
                tick = self.tick,
                %status,
                credit_score = farm.loan().credit_score,
                debt = farm.loan().total_debt,
                "game over"
            );
            events.push(FarmEvent::GameOver { status });
        }

        let snapshot_path = if self.snapshot_writer.is_due(self.tick) {
            let record = self.capture(farm);
            Some(self.snapshot_writer.write(&record)?)
        } else {
            None
        };

        Ok(TickReport {
            tick: self.tick,
            at: farm.now(),
            events,
            snapshot_path,
        })
    }

    /// Runs up to `ticks` hours, stopping early once the game is over.
    pub fn run(&mut self, farm: &mut Farm, ticks: u64) -> Result<()> {
        self.run_with_hook(farm, ticks, |_, _| {})
    }

    /// Like [`Engine::run`], handing every tick's report to `hook` together
    /// with the farm so a driver can react between ticks.
    pub fn run_with_hook<F>(&mut self, farm: &mut Farm, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TickReport, &mut Farm),
    {
        for _ in 0..ticks {
            if farm.status().is_over() {
                debug!(tick = self.tick, "run stopped: game over");
                break;
            }
            let report = self.tick(farm)?;
            hook(&report, farm);
        }
        Ok(())
    }

    /// Complete engine state: farm plus every RNG stream position.
    pub fn capture(&self, farm: &Farm) -> SaveRecord {
        SaveRecord {
            version: SAVE_VERSION,
            scenario: self.settings.scenario_name.clone(),
            tick: self.tick,
            farm: farm.snapshot(),
            rng: self.rng.state(),
        }
    }

    /// Resumes from `record`; the engine continues exactly where the saved
    /// one left off.
    pub fn restore(&mut self, record: SaveRecord, catalog: CropCatalog) -> Result<Farm> {
        if record.version != SAVE_VERSION {
            return Err(FarmError::UnsupportedSnapshotVersion(record.version).into());
        }
        if record.scenario != self.settings.scenario_name {
            return Err(FarmError::ScenarioMismatch {
                expected: self.settings.scenario_name.clone(),
                found: record.scenario,
            }
            .into());
        }
        let farm = Farm::from_snapshot(record.farm, catalog)?;
        self.rng = RngManager::from_state(&record.rng);
        self.tick = record.tick;
        Ok(farm)
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub scenario_name: &'a str,
    /// Set by the weather system when this tick crossed midnight.
    pub day_started: bool,
    pub events: Vec<FarmEvent>,
}

impl SystemContext<'_> {
    pub fn emit(&mut self, event: FarmEvent) {
        self.events.push(event);
    }
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        farm: &mut Farm,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
