use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel::{bounded, Sender, TrySendError};
use log::LevelFilter;
use message::{Twist, Vector3, ZephyrMessage};
use signal_hook::consts::{SIGINT, SIGTERM};
use thread_priority::{
    RealtimeThreadSchedulePolicy, ScheduleParams, ThreadBuilder, ThreadPriority, ThreadSchedulePolicy
};

use zephyr::config::{ZephyrParameters, CONFIG_FILE};
use zephyr::log::Logger;
use zephyr::mock::{ManualTicks, MockHost, MockPublisher};
use zephyr::FlightController;

const SIM_STEP: Duration = Duration::from_millis(1);
const REMOTE_PERIOD: Duration = Duration::from_millis(20);

fn main() -> Result<()> {
    let mut log_sink = Logger::init(LevelFilter::Info);

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let parameters = ZephyrParameters::load(&path)?;

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, term.clone()).context("Registering SIGINT")?;
    signal_hook::flag::register(SIGTERM, term.clone()).context("Registering SIGTERM")?;

    let host = MockHost::airframe();
    let publisher = MockPublisher::new(1);
    let ticks = ManualTicks::new();
    let (command_tx, command_rx) = bounded(parameters.command_queue_size);

    let mut controller = FlightController::new(
        &parameters,
        Box::new(host.clone()),
        Box::new(publisher.clone()),
        Box::new(ticks.clone()),
        command_rx,
    )?;

    let simulation = {
        let term = term.clone();
        ThreadBuilder::default()
            .name("simulation")
            .policy(ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo))
            .priority(ThreadPriority::from_posix(ScheduleParams {
                sched_priority: 40,
            }))
            .spawn_careless(move || simulate(host, ticks, term))
            .context("Cannot spawn simulation thread")?
    };
    let remote = {
        let term = term.clone();
        thread::Builder::new()
            .name("remote".into())
            .spawn(move || remote(command_tx, term))
            .context("Cannot spawn remote thread")?
    };

    while !term.load(Ordering::Relaxed) {
        log_sink.handle_logs();
        thread::sleep(Duration::from_millis(10));
    }

    controller.shutdown();
    let _ = simulation.join();
    let _ = remote.join();
    log::info!("{} poses published on {}", publisher.published().len(), parameters.pose_topic());
    log_sink.handle_logs();

    Ok(())
}

fn simulate(host: MockHost, ticks: ManualTicks, term: Arc<AtomicBool>) {
    while !term.load(Ordering::Relaxed) {
        host.step(SIM_STEP);
        ticks.fire();
        thread::sleep(SIM_STEP);
    }
}

/// Scripted pilot: steady throttle with a slow pitch and roll sweep
fn remote(commands: Sender<Vec<u8>>, term: Arc<AtomicBool>) {
    let start = Instant::now();
    while !term.load(Ordering::Relaxed) {
        let t = start.elapsed().as_secs_f64();
        let twist = Twist {
            linear: Vector3 {
                x: 0.6,
                ..Default::default()
            },
            angular: Vector3 {
                x: 0.05 * (0.5 * t).cos(),
                y: 0.1 * (0.5 * t).sin(),
                z: 0.0,
            },
        };
        match ZephyrMessage::Control(twist).encode() {
            Ok(frame) => match commands.try_send(frame) {
                Ok(()) | Err(TrySendError::Full(_)) => (),
                Err(TrySendError::Disconnected(_)) => break,
            },
            Err(e) => log::error!("{:#}", e),
        }
        thread::sleep(REMOTE_PERIOD);
    }
}
