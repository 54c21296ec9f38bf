//! End to end tests of the flight controller against the in-process host

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Sender};
use message::{Twist, Vector3, ZephyrMessage};
use zephyr::config::{ActuatorParameters, PidConfig, ZephyrParameters};
use zephyr::mock::{ManualTicks, MockHost, MockPublisher};
use zephyr::types::{ActuatorKind, FlightCommand};
use zephyr::{FlightController, Phase};

const EPSILON: f64 = 1e-9;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn parameters() -> ZephyrParameters {
    ZephyrParameters {
        actuators: vec![
            ActuatorParameters {
                name: "propeller_joint".into(),
                kind: ActuatorKind::Propeller,
                pid: Some(PidConfig::proportional(1.0)),
            },
            ActuatorParameters {
                name: "flap_left_joint".into(),
                kind: ActuatorKind::FlapLeft,
                pid: Some(PidConfig::proportional(2.0)),
            },
            ActuatorParameters {
                name: "flap_right_joint".into(),
                kind: ActuatorKind::FlapRight,
                pid: Some(PidConfig::proportional(2.0)),
            },
        ],
        ..Default::default()
    }
}

struct Rig {
    host: MockHost,
    publisher: MockPublisher,
    ticks: ManualTicks,
    commands: Sender<Vec<u8>>,
    controller: FlightController,
}

fn rig(parameters: &ZephyrParameters, host: MockHost, subscribers: usize) -> Rig {
    let publisher = MockPublisher::new(subscribers);
    let ticks = ManualTicks::new();
    let (commands, frames) = unbounded();
    let controller = FlightController::new(
        parameters,
        Box::new(host.clone()),
        Box::new(publisher.clone()),
        Box::new(ticks.clone()),
        frames,
    )
    .unwrap();
    Rig {
        host,
        publisher,
        ticks,
        commands,
        controller,
    }
}

fn frame(throttle: f64, pitch: f64, roll: f64) -> Vec<u8> {
    ZephyrMessage::Control(Twist {
        linear: Vector3 {
            x: throttle,
            ..Default::default()
        },
        angular: Vector3 {
            x: roll,
            y: pitch,
            z: 0.0,
        },
    })
    .encode()
    .unwrap()
}

/// Wait until the ingestor stored `expected`
fn wait_for(controller: &FlightController, expected: FlightCommand) {
    let start = Instant::now();
    while controller.shared_command().latest() != Some(expected) {
        assert!(start.elapsed() < Duration::from_secs(5), "Command never reached the shared state");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn canonical_airframe_outputs() {
    let rig = rig(&parameters(), MockHost::airframe(), 0);
    assert_eq!(rig.controller.phase(), Phase::Ready);

    rig.commands.send(frame(0.5, 0.1, 0.0)).unwrap();
    wait_for(
        &rig.controller,
        FlightCommand {
            throttle: 0.5,
            pitch: 0.1,
            roll: 0.0,
        },
    );
    rig.ticks.fire();

    assert_eq!(rig.controller.phase(), Phase::Running);
    assert!(close(rig.host.effort("propeller_joint").unwrap(), 0.5));
    assert!(close(rig.host.effort("flap_left_joint").unwrap(), -0.2));
    assert!(close(rig.host.effort("flap_right_joint").unwrap(), -0.2));
}

#[test]
fn no_command_only_publishes_pose() {
    let rig = rig(&parameters(), MockHost::airframe(), 1);
    for _ in 0..500 {
        rig.host.advance(Duration::from_millis(1));
        rig.ticks.fire();
    }
    assert_eq!(rig.host.efforts_applied(), 0);
    // 101ms, 202ms, 303ms, 404ms
    assert_eq!(rig.publisher.published().len(), 4);
}

#[test]
fn no_subscriber_no_pose() {
    let rig = rig(&parameters(), MockHost::airframe(), 0);
    rig.commands.send(frame(0.2, 0.0, 0.0)).unwrap();
    for _ in 0..500 {
        rig.host.advance(Duration::from_millis(1));
        rig.ticks.fire();
    }
    assert!(rig.publisher.published().is_empty());
}

#[test]
fn missing_handle_leaves_actuator_inert() {
    let mut parameters = parameters();
    parameters.actuators[1].pid = Some(PidConfig {
        i: 1.0,
        ..PidConfig::proportional(2.0)
    });
    let host = MockHost::new(&["propeller_joint", "flap_right_joint"]);
    let rig = rig(&parameters, host, 0);
    assert_eq!(rig.controller.phase(), Phase::Ready);
    assert!(rig.controller.inspect(|control| control.actuators()[1].is_inert()));

    rig.commands.send(frame(0.5, 0.1, 0.0)).unwrap();
    wait_for(
        &rig.controller,
        FlightCommand {
            throttle: 0.5,
            pitch: 0.1,
            roll: 0.0,
        },
    );
    for _ in 0..3 {
        rig.host.advance(Duration::from_millis(10));
        rig.ticks.fire();
    }

    assert_eq!(rig.host.efforts_applied(), 6);
    assert_eq!(rig.host.effort("flap_left_joint"), None);
    assert!(close(rig.host.effort("flap_right_joint").unwrap(), -0.2));
    // The inert flap never ran its controller
    let integral = rig.controller.inspect(|control| control.actuators()[1].pid().unwrap().integral());
    assert_eq!(integral, 0.0);
}

#[test]
fn failing_actuator_does_not_stop_the_others() {
    let rig = rig(&parameters(), MockHost::airframe(), 0);
    rig.host.fail_actuator("propeller_joint", true);
    rig.commands.send(frame(0.5, 0.0, 0.1)).unwrap();
    wait_for(
        &rig.controller,
        FlightCommand {
            throttle: 0.5,
            pitch: 0.0,
            roll: 0.1,
        },
    );
    rig.ticks.fire();

    assert_eq!(rig.host.effort("propeller_joint"), None);
    assert!(close(rig.host.effort("flap_left_joint").unwrap(), 0.2));
    assert!(close(rig.host.effort("flap_right_joint").unwrap(), -0.2));
}

#[test]
fn latest_command_wins_and_garbage_is_dropped() {
    let rig = rig(&parameters(), MockHost::airframe(), 0);
    rig.commands.send(frame(0.1, 0.2, 0.3)).unwrap();
    rig.commands.send(frame(0.4, 0.5, 0.6)).unwrap();
    rig.commands.send(vec![0xba, 0xd0]).unwrap();
    rig.commands.send(frame(f64::NAN, 0.0, 0.0)).unwrap();
    rig.commands.send(frame(0.7, 0.0, 0.0)).unwrap();

    let expected = FlightCommand {
        throttle: 0.7,
        pitch: 0.0,
        roll: 0.0,
    };
    wait_for(&rig.controller, expected);
    rig.ticks.fire();
    assert!(close(rig.host.effort("propeller_joint").unwrap(), 0.7));
}

#[test]
fn missing_role_is_fatal() {
    let mut parameters = parameters();
    parameters.actuators.retain(|actuator| actuator.kind != ActuatorKind::FlapLeft);
    let (_commands, frames) = unbounded();
    let result = FlightController::new(
        &parameters,
        Box::new(MockHost::airframe()),
        Box::new(MockPublisher::new(0)),
        Box::new(ManualTicks::new()),
        frames,
    );
    assert!(result.is_err());
}

#[test]
fn shutdown_disconnects_before_releasing() {
    let mut rig = rig(&parameters(), MockHost::airframe(), 1);
    assert_eq!(rig.ticks.connections(), 1);
    rig.commands.send(frame(0.5, 0.0, 0.0)).unwrap();

    rig.controller.shutdown();
    assert_eq!(rig.controller.phase(), Phase::Stopped);
    assert_eq!(rig.ticks.connections(), 0);
    assert!(rig.controller.inspect(|control| control.actuators().is_empty()));

    rig.host.advance(Duration::from_secs(1));
    rig.ticks.fire();
    assert_eq!(rig.host.efforts_applied(), 0);
    assert!(rig.publisher.published().is_empty());

    // Idempotent
    rig.controller.shutdown();
    assert_eq!(rig.controller.phase(), Phase::Stopped);
}
