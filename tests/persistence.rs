use farmsim::{
    engine::{Engine, EngineBuilder, EngineSettings},
    farm::FieldAction,
    snapshot, FarmError, Scenario, ScenarioLoader,
};
use tempfile::tempdir;

fn scenario() -> Scenario {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/spring_farm.yaml")
        .expect("scenario should load")
}

fn engine(scenario: &Scenario, dir: &std::path::Path, interval: u64) -> Engine {
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: interval,
        snapshot_dir: dir.to_path_buf(),
    };
    EngineBuilder::new(settings).with_farm_systems().build()
}

#[test]
fn snapshots_land_at_the_configured_interval() {
    let scenario = scenario();
    let temp = tempdir().unwrap();
    let mut engine = engine(&scenario, temp.path(), 24);
    let mut farm = engine.spawn_farm(&scenario).unwrap();

    let mut written = Vec::new();
    engine
        .run_with_hook(&mut farm, 72, |report, _| {
            if let Some(path) = &report.snapshot_path {
                written.push(path.clone());
            }
        })
        .unwrap();

    let dir = temp.path().join("spring_farm");
    assert_eq!(
        written,
        vec![
            dir.join("tick_000024.json"),
            dir.join("tick_000048.json"),
            dir.join("tick_000072.json"),
        ]
    );
    let record = snapshot::load(&written[1]).unwrap();
    assert_eq!(record.tick, 48);
    assert_eq!(record.scenario, "spring_farm");
    assert_eq!(record.farm.fields.len(), 5);
}

#[test]
fn resumed_run_matches_uninterrupted_run() {
    let scenario = scenario();
    let temp = tempdir().unwrap();
    let mut original = engine(&scenario, temp.path(), 0);
    let mut farm = original.spawn_farm(&scenario).unwrap();
    farm.plant(0, "wheat").unwrap();
    farm.plant(1, "strawberry").unwrap();
    farm.plant(2, "soybean").unwrap();
    original.run(&mut farm, 30).unwrap();
    farm.apply_action(1, FieldAction::Pesticide).unwrap();
    original.run(&mut farm, 100).unwrap();

    let saved = original.capture(&farm);
    let path = temp.path().join("save.json");
    std::fs::write(&path, serde_json::to_string(&saved).unwrap()).unwrap();

    let mut resumed = engine(&scenario, temp.path(), 0);
    let mut resumed_farm = resumed
        .restore(snapshot::load(&path).unwrap(), scenario.catalog())
        .unwrap();
    assert_eq!(resumed.current_tick(), 130);
    assert_eq!(resumed.capture(&resumed_farm), saved);

    original.run(&mut farm, 200).unwrap();
    resumed.run(&mut resumed_farm, 200).unwrap();
    assert_eq!(resumed.capture(&resumed_farm), original.capture(&farm));
}

#[test]
fn restore_rejects_unknown_versions_and_crops() {
    let scenario = scenario();
    let temp = tempdir().unwrap();
    let mut source = engine(&scenario, temp.path(), 0);
    let mut farm = source.spawn_farm(&scenario).unwrap();
    farm.plant(0, "chili").unwrap();
    let record = source.capture(&farm);

    let mut future = record.clone();
    future.version = 99;
    let err = engine(&scenario, temp.path(), 0)
        .restore(future, scenario.catalog())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<FarmError>(),
        Some(&FarmError::UnsupportedSnapshotVersion(99))
    );

    let mut renamed = record;
    if let Some(crop) = renamed.farm.fields[0].crop.as_mut() {
        crop.crop_type = "kale".into();
    }
    let err = engine(&scenario, temp.path(), 0)
        .restore(renamed, scenario.catalog())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<FarmError>(),
        Some(&FarmError::InvalidCropType("kale".into()))
    );
}

#[test]
fn restore_rejects_a_save_from_another_scenario() {
    let scenario = scenario();
    let temp = tempdir().unwrap();
    let mut source = engine(&scenario, temp.path(), 0);
    let mut farm = source.spawn_farm(&scenario).unwrap();
    source.run(&mut farm, 5).unwrap();
    let record = source.capture(&farm);

    let mut other = scenario.clone();
    other.name = "autumn_farm".into();
    let err = engine(&other, temp.path(), 0)
        .restore(record, scenario.catalog())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<FarmError>(),
        Some(&FarmError::ScenarioMismatch {
            expected: "autumn_farm".into(),
            found: "spring_farm".into(),
        })
    );
}
