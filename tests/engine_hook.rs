use farmsim::{
    engine::{EngineBuilder, EngineSettings, FarmEvent},
    scenario::ScenarioLoader,
};
use tempfile::tempdir;

#[test]
fn engine_runs_hook_each_tick() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/spring_farm.yaml")
        .expect("scenario should load");
    let temp = tempdir().expect("tempdir");
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: 0,
        snapshot_dir: temp.path().to_path_buf(),
    };
    let mut engine = EngineBuilder::new(settings).with_farm_systems().build();
    let mut farm = engine.spawn_farm(&scenario).expect("farm builds");

    let mut ticks = Vec::new();
    let mut day_starts = Vec::new();
    engine
        .run_with_hook(&mut farm, 48, |report, _| {
            ticks.push(report.tick);
            if report
                .events
                .iter()
                .any(|event| matches!(event, FarmEvent::DayStarted { .. }))
            {
                day_starts.push(report.tick);
            }
        })
        .expect("run succeeds");

    assert_eq!(ticks.len(), 48);
    assert_eq!(ticks.first().copied(), Some(1));
    assert_eq!(ticks.last().copied(), Some(48));
    assert_eq!(day_starts, vec![24, 48]);
    assert_eq!(engine.current_tick(), 48);
    assert_eq!(
        farm.now(),
        scenario.start + chrono::Duration::hours(48),
        "one tick is one simulated hour"
    );
}

#[test]
fn hook_can_act_on_the_farm_between_ticks() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader.load("scenarios/spring_farm.yaml").unwrap();
    let temp = tempdir().unwrap();
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: 0,
        snapshot_dir: temp.path().to_path_buf(),
    };
    let mut engine = EngineBuilder::new(settings).with_farm_systems().build();
    let mut farm = engine.spawn_farm(&scenario).unwrap();
    let start_funds = farm.funds();

    engine
        .run_with_hook(&mut farm, 3, |report, farm| {
            if report.tick == 2 {
                farm.plant(0, "wheat").unwrap();
            }
        })
        .unwrap();

    let crop = farm.fields()[0].crop.as_ref().expect("planted by the hook");
    assert_eq!(crop.hour_counter(), 1);
    assert_eq!(farm.funds(), start_funds - 300.0);
}
