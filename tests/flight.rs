use cubeflight::config::{SimConfig, ThrustCombine};
use cubeflight::controller::{FlightKey, FrameLoop, InputEvent, InputState};
use cubeflight::model::{Camera, SimulationState, START_POSITION};
use glam::{Quat, Vec3};

const FRAME_MS: f64 = 16.0;

fn setup(config: SimConfig) -> (FrameLoop, SimulationState, InputState) {
    (FrameLoop::new(config, 800, 600), SimulationState::new(), InputState::new())
}

#[test]
fn first_frame_at_rest_looks_from_start_position() {
    let (frame_loop, mut state, mut input) = setup(SimConfig::default());

    let frame = frame_loop.step(&mut state, &mut input, FRAME_MS);

    assert_eq!(state.orientation, Quat::IDENTITY);
    assert_eq!(state.position, START_POSITION);
    assert_eq!(state.velocity, Vec3::ZERO);
    assert!(frame.look.is_none());
    let expected = frame_loop.camera.view_proj(Quat::IDENTITY, START_POSITION);
    assert!(frame.view_proj.abs_diff_eq(expected, 1e-6));
    assert_eq!(Camera::view(Quat::IDENTITY, START_POSITION).w_axis.z, -6.0);
}

#[test]
fn holding_thrust_moves_forward_at_bounded_speed() {
    let (frame_loop, mut state, mut input) = setup(SimConfig::default());
    input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));

    let mut last_z = state.position.z;
    for _ in 0..100 {
        frame_loop.step(&mut state, &mut input, FRAME_MS);
        assert!(state.position.z >= last_z);
        last_z = state.position.z;
    }

    assert!(state.position.z > START_POSITION.z);
    assert!(state.position.x.abs() < 1e-6);
    assert!(state.position.y.abs() < 1e-6);
    assert!(state.speed() > 0.0);
    assert!(state.speed() < 0.5);
    assert_eq!(state.orientation, Quat::IDENTITY);
}

#[test]
fn releasing_thrust_coasts_to_a_stop() {
    let (frame_loop, mut state, mut input) = setup(SimConfig::default());
    input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));
    for _ in 0..10 {
        frame_loop.step(&mut state, &mut input, FRAME_MS);
    }
    input.process_event(&InputEvent::KeyUp(FlightKey::Thrust));

    for _ in 0..1000 {
        frame_loop.step(&mut state, &mut input, FRAME_MS);
    }
    assert_eq!(state.velocity, Vec3::ZERO);
}

#[test]
fn orientation_stays_unit_through_long_flights() {
    let (frame_loop, mut state, mut input) = setup(SimConfig::default());
    input.process_event(&InputEvent::PointerLockChanged { locked: true });
    input.process_event(&InputEvent::KeyDown(FlightKey::RollRight));

    for i in 0..10_000 {
        let sign = if i % 500 < 250 { 1.0 } else { -1.0 };
        input.process_event(&InputEvent::MouseMove { dx: 37.0 * sign, dy: -13.0 });
        frame_loop.step(&mut state, &mut input, FRAME_MS);
        assert!((state.orientation.length() - 1.0).abs() < 1e-4);
    }
    assert!(state.angular_rate.max_abs() <= 4.0);
}

#[test]
fn focus_loss_releases_held_keys() {
    let (frame_loop, mut state, mut input) = setup(SimConfig::default());
    input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));
    frame_loop.step(&mut state, &mut input, FRAME_MS);
    let speed = state.speed();

    input.process_event(&InputEvent::FocusLost);
    frame_loop.step(&mut state, &mut input, FRAME_MS);
    assert!(state.speed() < speed);
}

#[test]
fn opposing_keys_let_the_later_one_win_by_default() {
    let (frame_loop, mut state, mut input) = setup(SimConfig::default());
    input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));
    input.process_event(&InputEvent::KeyDown(FlightKey::Reverse));

    frame_loop.step(&mut state, &mut input, FRAME_MS);
    assert!(state.velocity.z < 0.0);

    let (frame_loop, mut state, mut input) = setup(SimConfig::default());
    input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));
    input.process_event(&InputEvent::KeyDown(FlightKey::StrafeRight));

    frame_loop.step(&mut state, &mut input, FRAME_MS);
    assert!(state.velocity.x < 0.0);
    assert!(state.velocity.z.abs() < 1e-6);
}

#[test]
fn accumulate_cancels_opposing_keys() {
    let config = SimConfig { thrust_combine: ThrustCombine::Accumulate, ..SimConfig::default() };
    let (frame_loop, mut state, mut input) = setup(config);
    input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));
    input.process_event(&InputEvent::KeyDown(FlightKey::Reverse));

    frame_loop.step(&mut state, &mut input, FRAME_MS);
    assert_eq!(state.velocity, Vec3::ZERO);
    assert_eq!(state.position, START_POSITION);
}

#[test]
fn mouse_is_ignored_until_pointer_lock() {
    let (frame_loop, mut state, mut input) = setup(SimConfig::default());
    input.process_event(&InputEvent::MouseMove { dx: 200.0, dy: 50.0 });
    frame_loop.step(&mut state, &mut input, FRAME_MS);
    assert_eq!(state.orientation, Quat::IDENTITY);

    input.process_event(&InputEvent::PointerLockChanged { locked: true });
    input.process_event(&InputEvent::MouseMove { dx: 200.0, dy: 50.0 });
    let frame = frame_loop.step(&mut state, &mut input, FRAME_MS);
    assert!(frame.look.is_some());
    assert_ne!(state.orientation, Quat::IDENTITY);
}
