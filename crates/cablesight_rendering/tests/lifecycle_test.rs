//! # Engine Lifecycle Tests
//!
//! Mount, resize, suspend, unmount and failure against the headless backend.
//! The resource invariant is checked through the backend's books: after any
//! teardown nothing the engine allocated may still be live.

use std::cell::Cell;
use std::rc::Rc;

use cablesight_rendering::{
    Engine, EngineError, HeadlessBackend, HostContainer, LifecycleState, ResourceKind, CABLE_LAYERS,
};
use cablesight_shared::{EngineConfig, FaultMode, Subsystem, TextureSettings};

type TestEngine = Engine<HeadlessBackend, HostContainer>;

fn small_config() -> EngineConfig {
    EngineConfig {
        texture_seed: Some(42),
        textures: TextureSettings {
            braid: 32,
            speckle: 32,
            metal: 32,
            copper: 32,
            mesh: 32,
            treeing: 32,
            water: 32,
            screen_width: 64,
            screen_height: 32,
        },
        ..EngineConfig::default()
    }
}

fn engine_with(width: u32, height: u32, config: EngineConfig) -> TestEngine {
    Engine::new(HeadlessBackend::new(), HostContainer::new(width, height), config).unwrap()
}

fn engine(width: u32, height: u32) -> TestEngine {
    engine_with(width, height, small_config())
}

/// Drives `frames` refreshes at 60 Hz starting at `start` seconds.
fn run(engine: &mut TestEngine, start: f64, frames: u32) -> u32 {
    let mut ticked = 0;
    for i in 0..frames {
        if engine.on_display_refresh(start + f64::from(i) / 60.0).unwrap().is_some() {
            ticked += 1;
        }
    }
    ticked
}

fn assert_nothing_live(engine: &TestEngine) {
    let backend = engine.backend();
    assert_eq!(backend.live_counts().total(), 0, "{:?}", backend.live_counts());
    assert_eq!(backend.live_surfaces(), 0);
    assert_eq!(backend.double_releases(), 0);
    assert_eq!(engine.host().attached_count(), 0);
}

/// Test: The default configuration and layer stack mount cleanly and tick
/// through every fault mode.
#[test]
fn test_default_config_mounts() {
    let config = EngineConfig {
        texture_seed: Some(3),
        ..EngineConfig::default()
    };
    let mut engine = engine_with(1280, 720, config);
    engine.mount().unwrap();

    assert_eq!(engine.state(), LifecycleState::Mounted);
    assert!(engine.last_error().is_none());
    assert_eq!(engine.mounts(), 1);
    assert_eq!(engine.host().attached_count(), 1);

    let graph = engine.assembly().unwrap().graph();
    for spec in &CABLE_LAYERS {
        assert!(graph.find(&format!("layer-{}", spec.name)).is_some(), "missing {}", spec.name);
    }

    for (k, mode) in FaultMode::ALL.into_iter().enumerate() {
        engine.inputs().update(|i| i.fault_mode = mode);
        assert_eq!(run(&mut engine, k as f64, 20), 20, "{mode}");
        assert_eq!(engine.state(), LifecycleState::Mounted, "{mode}");
    }

    engine.unmount();
    assert_nothing_live(&engine);
}

/// Test: After unmount no geometry, material, texture or surface is live.
#[test]
fn test_unmount_releases_everything() {
    let mut engine = engine(800, 600);
    engine.inputs().update(|i| {
        i.fault_mode = FaultMode::ElectricalTreeing;
        i.is_scanning = true;
    });
    engine.mount().unwrap();
    assert!(engine.backend().live_counts().total() > 0);
    assert_eq!(run(&mut engine, 0.0, 90), 90);

    engine.unmount();
    assert_eq!(engine.state(), LifecycleState::Unmounted);
    assert_nothing_live(&engine);
}

/// Test: A second mount on the same host builds nothing new.
#[test]
fn test_mount_is_idempotent() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    let created = engine.backend().created_counts();

    engine.mount().unwrap();
    engine.mount().unwrap();
    assert_eq!(engine.state(), LifecycleState::Mounted);
    assert_eq!(engine.mounts(), 1);
    assert_eq!(engine.backend().created_counts(), created);
    assert_eq!(engine.backend().live_surfaces(), 1);
    assert_eq!(engine.host().attached_count(), 1);
    assert_eq!(engine.host().attach_calls(), 1);
}

/// Test: A zero-size host defers mounting until a valid resize.
#[test]
fn test_scenario_pending_until_valid_resize() {
    let mut engine = engine(0, 0);
    engine.mount().unwrap();
    assert_eq!(engine.state(), LifecycleState::Pending { width: 0, height: 0 });
    assert_eq!(engine.backend().created_counts().total(), 0);

    engine.resize(16, 16).unwrap();
    assert_eq!(engine.state(), LifecycleState::Pending { width: 16, height: 16 });

    engine.resize(800, 600).unwrap();
    assert_eq!(engine.state(), LifecycleState::Mounted);
    assert_eq!(engine.mounts(), 1);
    assert_eq!(engine.surface_size(), Some((800, 600)));
    assert_eq!(engine.backend().live_surfaces(), 1);

    engine.resize(800, 600).unwrap();
    assert_eq!(engine.mounts(), 1);
}

/// Test: Unmount then mount returns to the same resource count.
#[test]
fn test_scenario_remount_restores_baseline() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    let baseline = engine.backend().live_counts();
    run(&mut engine, 0.0, 45);

    engine.unmount();
    assert_nothing_live(&engine);

    engine.mount().unwrap();
    assert_eq!(engine.state(), LifecycleState::Mounted);
    assert_eq!(engine.mounts(), 2);
    assert_eq!(engine.backend().live_counts(), baseline);
    assert_eq!(engine.host().attached_count(), 1);
    assert_eq!(run(&mut engine, 10.0, 5), 5);
}

/// Test: Resizing a mounted engine updates the projection without a rebuild.
#[test]
fn test_resize_keeps_scene() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    let created = engine.backend().created_counts();

    engine.resize(1024, 512).unwrap();
    assert_eq!(engine.state(), LifecycleState::Mounted);
    assert_eq!(engine.surface_size(), Some((1024, 512)));
    let aspect = engine.camera().map(|c| c.aspect()).unwrap();
    assert!((aspect - 2.0).abs() < 1e-6);
    assert_eq!(engine.backend().created_counts(), created);
    assert_eq!(engine.mounts(), 1);
}

/// Test: Shrinking below the minimum suspends ticking; growing resumes it.
#[test]
fn test_suspend_and_resume() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    assert_eq!(run(&mut engine, 0.0, 10), 10);

    engine.resize(8, 8).unwrap();
    assert_eq!(engine.state(), LifecycleState::Suspended { width: 8, height: 8 });
    assert_eq!(run(&mut engine, 1.0, 20), 0);
    assert_eq!(engine.stats().total_frames, 10);
    assert_eq!(engine.stats().ignored_refreshes, 20);

    engine.resize(640, 480).unwrap();
    assert_eq!(engine.state(), LifecycleState::Mounted);
    assert_eq!(run(&mut engine, 2.0, 10), 10);
    assert_eq!(engine.stats().total_frames, 20);
    assert_eq!(engine.mounts(), 1);
}

/// Test: No refresh ticks once the engine is torn down.
#[test]
fn test_no_tick_after_unmount() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    run(&mut engine, 0.0, 3);
    let passes = engine.backend().passes();

    engine.unmount();
    assert_eq!(run(&mut engine, 1.0, 30), 0);
    assert_eq!(engine.backend().passes(), passes);

    engine.unmount();
    assert_eq!(engine.state(), LifecycleState::Unmounted);
}

/// Test: Unmount while Pending abandons the mount without touching the backend.
#[test]
fn test_unmount_from_pending() {
    let mut engine = engine(0, 0);
    engine.mount().unwrap();
    engine.unmount();
    assert_eq!(engine.state(), LifecycleState::Unmounted);

    engine.resize(800, 600).unwrap();
    assert_eq!(engine.state(), LifecycleState::Unmounted);
    assert_eq!(engine.backend().created_counts().total(), 0);
}

/// Test: A refused surface is non-fatal and retried on the next resize.
#[test]
fn test_refused_surface_stays_pending() {
    let mut engine = engine(800, 600);
    engine.backend_mut().refuse_surfaces(true);
    engine.mount().unwrap();
    assert_eq!(engine.state(), LifecycleState::Pending { width: 800, height: 600 });

    engine.backend_mut().refuse_surfaces(false);
    engine.resize(800, 600).unwrap();
    assert_eq!(engine.state(), LifecycleState::Mounted);
}

/// Test: Context loss mid-run fails the instance and releases everything.
#[test]
fn test_context_loss_is_terminal() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    run(&mut engine, 0.0, 20);

    engine.backend_mut().lose_context();
    assert_eq!(engine.on_display_refresh(1.0), Err(EngineError::ContextLost));
    assert_eq!(engine.state(), LifecycleState::Failed);
    assert_eq!(engine.last_error(), Some(&EngineError::ContextLost));
    assert_nothing_live(&engine);

    assert_eq!(engine.on_display_refresh(1.1), Ok(None));
    engine.unmount();
    assert_eq!(engine.state(), LifecycleState::Failed);
    assert_eq!(engine.mount(), Err(EngineError::ContextLost));
}

/// Test: An allocation failure while building leaves nothing behind.
#[test]
fn test_allocation_failure_during_mount() {
    let mut engine = engine(800, 600);
    engine.backend_mut().fail_next_allocation(ResourceKind::Material);

    let err = engine.mount().unwrap_err();
    assert_eq!(err, EngineError::AllocationFailed { kind: ResourceKind::Material });
    assert_eq!(engine.state(), LifecycleState::Failed);
    assert_nothing_live(&engine);
}

/// Test: Every tick renders exactly once; gated subsystems follow the table.
#[test]
fn test_one_render_per_tick() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();

    let mut last = None;
    for i in 0..30 {
        last = engine.on_display_refresh(f64::from(i) / 60.0).unwrap();
    }
    let last = last.unwrap();
    assert_eq!(last.frame_number, 30);
    assert_eq!(last.render_passes, 1);
    for subsystem in Subsystem::ALL {
        assert!(last.ran(subsystem), "{} due at frame 30", subsystem.name());
    }

    let stats = engine.stats();
    assert_eq!(engine.backend().passes(), 30);
    assert_eq!(stats.render_passes, 30);
    assert_eq!(stats.runs(Subsystem::SensorTelemetry), 2);
    assert_eq!(stats.runs(Subsystem::ScreenRedraw), 3);
    assert_eq!(stats.runs(Subsystem::IndicatorBlink), 10);
    assert_eq!(stats.runs(Subsystem::HistorySample), 6);
    assert_eq!(engine.backend().last_pass().map(|p| p.frame), Some(30));
}

/// Test: A mode change lands on the next tick.
#[test]
fn test_mode_change_applies_next_tick() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    run(&mut engine, 0.0, 5);
    let heat = engine.assembly().map(|a| a.overlays.heat).unwrap();
    let visible = |engine: &TestEngine| engine.assembly().unwrap().graph().node(heat).unwrap().is_visible();
    assert!(!visible(&engine));

    engine.inputs().update(|i| i.fault_mode = FaultMode::JointOverheat);
    assert!(!visible(&engine));
    engine.on_display_refresh(0.5).unwrap();
    assert!(visible(&engine));

    engine.inputs().set(cablesight_shared::EngineInputs::default());
    engine.on_display_refresh(0.6).unwrap();
    assert!(!visible(&engine));
}

/// Test: Scanning spins the sensor and shows the ring.
#[test]
fn test_scanning_moves_sensor() {
    let mut engine = engine(800, 600);
    engine.mount().unwrap();
    run(&mut engine, 0.0, 10);
    let assembly = engine.assembly().unwrap();
    let ring = assembly.overlays.scan_ring;
    assert_eq!(assembly.sensor.orbit_angle(), 0.0);
    assert!(!assembly.graph().node(ring).unwrap().is_visible());

    engine.inputs().update(|i| i.is_scanning = true);
    run(&mut engine, 1.0, 30);
    let assembly = engine.assembly().unwrap();
    assert!(assembly.sensor.orbit_angle() > 0.0);
    assert!(assembly.graph().node(ring).unwrap().is_visible());
}

/// Test: The auto-demo callback fires once per mount.
#[test]
fn test_auto_demo_fires_once_per_mount() {
    let mut config = small_config();
    config.timing.auto_demo_cycle_secs = 1.0;
    let mut engine = engine_with(800, 600, config);
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    engine.set_completion_callback(move || counter.set(counter.get() + 1));
    engine.inputs().update(|i| i.is_auto_demo = true);

    engine.mount().unwrap();
    run(&mut engine, 0.0, 30);
    assert_eq!(fired.get(), 0);
    run(&mut engine, 0.5, 150);
    assert_eq!(fired.get(), 1);

    engine.unmount();
    engine.mount().unwrap();
    run(&mut engine, 0.0, 180);
    assert_eq!(fired.get(), 2);
}
