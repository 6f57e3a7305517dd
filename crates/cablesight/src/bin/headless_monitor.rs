//! # Headless Monitor
//!
//! Drives the engine from a simulated 60 Hz display against the headless
//! backend and prints every telemetry sample the engine forwards.
//!
//! ```bash
//! # Defaults, 20 simulated seconds
//! headless_monitor
//!
//! # Custom config, fault mode and duration
//! RUST_LOG=debug headless_monitor engine.toml joint-overheat 45
//! ```
//!
//! Arguments (all optional, positional): config path (`-` for defaults),
//! initial fault mode, simulated seconds. With `auto` as the mode the
//! monitor cycles through every fault mode, auto-demo style.

use std::cell::Cell;
use std::rc::Rc;

use cablesight::prelude::*;
use cablesight::shared::NOMINAL_REFRESH_HZ;
use tracing_subscriber::EnvFilter;

const DEFAULT_SECONDS: u32 = 20;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.first().map(String::as_str) {
        None | Some("-") => EngineConfig::default(),
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("   ✗ FATAL: {err}");
                std::process::exit(1);
            }
        },
    };
    let cycling = args.get(1).is_some_and(|m| m == "auto");
    let initial_mode = match args.get(1) {
        Some(name) if !cycling => FaultMode::parse_lenient(name),
        _ => config.initial_fault_mode,
    };
    let seconds = args
        .get(2)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_SECONDS);

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                 CABLESIGHT HEADLESS MONITOR");
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Mode:     {}", if cycling { "auto (cycling)" } else { initial_mode.name() });
    println!("  Duration: {seconds} s at {NOMINAL_REFRESH_HZ} Hz");
    println!();

    if let Err(err) = run(config, initial_mode, cycling, seconds) {
        eprintln!("   ✗ FATAL: {err}");
        std::process::exit(1);
    }
}

fn run(config: EngineConfig, initial_mode: FaultMode, cycling: bool, seconds: u32) -> EngineResult<()> {
    let cycle_secs = config.timing.auto_demo_cycle_secs;
    let mut engine = Engine::new(HeadlessBackend::new(), HostContainer::new(1280, 720), config)?;

    let (tx, rx) = crossbeam_channel::unbounded::<TelemetrySample>();
    engine.set_telemetry_sink(tx);
    let demo_done = Rc::new(Cell::new(false));
    let flag = Rc::clone(&demo_done);
    engine.set_completion_callback(move || flag.set(true));

    let inputs = engine.inputs();
    inputs.set(EngineInputs {
        fault_mode: initial_mode,
        is_scanning: true,
        is_auto_demo: cycling,
    });
    engine.mount()?;

    let total_frames = seconds * NOMINAL_REFRESH_HZ;
    let dwell = (cycle_secs / FaultMode::ALL.len() as f32).max(1.0);
    let mut mode_index = 0usize;

    for frame in 0..total_frames {
        let now = f64::from(frame) / f64::from(NOMINAL_REFRESH_HZ);

        if cycling && now as f32 >= dwell * (mode_index + 1) as f32 {
            mode_index += 1;
            let mode = FaultMode::ALL[mode_index % FaultMode::ALL.len()];
            inputs.update(|i| i.fault_mode = mode);
        }

        // Host collapses for a second midway through the run
        if frame == total_frames / 2 {
            engine.host_mut().set_size(0, 0);
            engine.resize(0, 0)?;
        } else if frame == total_frames / 2 + NOMINAL_REFRESH_HZ {
            engine.host_mut().set_size(1280, 720);
            engine.resize(1280, 720)?;
        }

        engine.on_display_refresh(now)?;

        for sample in rx.try_iter() {
            println!(
                "  t={now:7.2}s  T={:6.2}°C  PD={:7.1}pC  V={:7.2}kV  I={:6.1}A  vib={:.3}  tanδ={:.5}",
                sample.temperature,
                sample.partial_discharge,
                sample.voltage,
                sample.current,
                sample.vibration,
                sample.dielectric_loss
            );
        }
    }

    let stats = engine.stats();
    engine.unmount();
    tracing::info!(frames = stats.total_frames, state = %engine.state(), "monitor finished");

    println!();
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  Frames:       {}", stats.total_frames);
    println!("  Render passes:{:>6}", stats.render_passes);
    println!("  Telemetry:    {}", stats.telemetry_emitted);
    println!("  Ignored:      {} refreshes", stats.ignored_refreshes);
    println!("  Avg tick:     {} µs (worst {} µs)", stats.avg_frame_time_us, stats.worst_frame_time_us);
    println!("  Auto-demo:    {}", if demo_done.get() { "complete" } else { "not complete" });
    println!("  Live after unmount: {}", engine.backend().live_counts().total());
    println!("═══════════════════════════════════════════════════════════════════");
    Ok(())
}
