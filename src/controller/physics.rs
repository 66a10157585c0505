use glam::{Quat, Vec3};

use crate::config::{SimConfig, ThrustCombine};
use crate::controller::input::{FlightKey, KeyState};
use crate::model::SimulationState;

/// Direction the scene moves toward the viewer under forward thrust.
///
/// Third row of the orientation's rotation matrix, i.e. the inverse
/// rotation applied to +Z.
pub fn forward_axis(q: Quat) -> Vec3 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    Vec3::new(
        2.0 * (x * z - w * y),
        2.0 * (y * z + w * x),
        1.0 - 2.0 * (x * x + y * y),
    )
}

/// First row of the rotation matrix, the inverse rotation applied to +X
pub fn left_axis(q: Quat) -> Vec3 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    Vec3::new(
        1.0 - 2.0 * (y * y + z * z),
        2.0 * (x * y - w * z),
        2.0 * (x * z + w * y),
    )
}

/// Thrust keys to velocity, velocity to position, with constant braking
pub struct ThrustIntegrator {
    config: SimConfig,
}

impl ThrustIntegrator {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// World-space thrust for this frame
    pub fn thrust_vector(&self, keys: &KeyState, orientation: Quat, dt_ms: f32) -> Vec3 {
        let gain = self.config.thrust_gain * (dt_ms / self.config.nominal_frame_ms);
        let forward = forward_axis(orientation);
        let left = left_axis(orientation);

        let impulses = [
            (FlightKey::Thrust, forward),
            (FlightKey::Reverse, -forward),
            (FlightKey::StrafeLeft, left),
            (FlightKey::StrafeRight, -left),
        ];

        let mut thrust = Vec3::ZERO;
        for (key, dir) in impulses {
            if !keys.is_down(key) {
                continue;
            }
            match self.config.thrust_combine {
                ThrustCombine::Overwrite => thrust = dir * gain,
                ThrustCombine::Accumulate => thrust += dir * gain,
            }
        }
        thrust
    }

    pub fn update(&self, state: &mut SimulationState, keys: &KeyState, dt_ms: f32) {
        let thrust = self.thrust_vector(keys, state.orientation, dt_ms);
        if thrust.length_squared() > 0.0 {
            state.velocity += thrust;
        }

        state.position += state.velocity;

        // normalize_or_zero keeps a resting ship at exactly zero
        let braking = -state.velocity.normalize_or_zero() * self.config.brake_gain;
        state.velocity += braking;

        if let Some(max_speed) = self.config.max_speed {
            state.velocity = state.velocity.clamp_length_max(max_speed);
        }

        if state.velocity.length() < self.config.velocity_epsilon {
            state.velocity = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: f32 = 16.0;

    fn integrator() -> ThrustIntegrator {
        ThrustIntegrator::new(SimConfig::default())
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn axes_match_inverse_rotation() {
        let q = (Quat::from_rotation_y(0.9) * Quat::from_rotation_x(-0.4) * Quat::from_rotation_z(1.3)).normalize();
        assert!(approx(forward_axis(q), q.inverse() * Vec3::Z));
        assert!(approx(left_axis(q), q.inverse() * Vec3::X));
        assert_eq!(forward_axis(Quat::IDENTITY), Vec3::Z);
        assert_eq!(left_axis(Quat::IDENTITY), Vec3::X);
    }

    #[test]
    fn thrust_scales_with_frame_time() {
        let keys = KeyState::new().with(FlightKey::Thrust);
        let t16 = integrator().thrust_vector(&keys, Quat::IDENTITY, 16.0);
        let t32 = integrator().thrust_vector(&keys, Quat::IDENTITY, 32.0);
        assert!(approx(t16, Vec3::new(0.0, 0.0, 0.005)));
        assert!(approx(t32, Vec3::new(0.0, 0.0, 0.01)));
    }

    #[test]
    fn opposite_keys_overwrite_by_default() {
        let keys = KeyState::new().with(FlightKey::Thrust).with(FlightKey::Reverse);
        let thrust = integrator().thrust_vector(&keys, Quat::IDENTITY, FRAME_MS);
        assert!(approx(thrust, Vec3::new(0.0, 0.0, -0.005)));

        let keys = KeyState::new().with(FlightKey::Thrust).with(FlightKey::StrafeLeft);
        let thrust = integrator().thrust_vector(&keys, Quat::IDENTITY, FRAME_MS);
        assert!(approx(thrust, Vec3::new(0.005, 0.0, 0.0)));
    }

    #[test]
    fn opposite_keys_cancel_when_accumulating() {
        let integ = ThrustIntegrator::new(SimConfig {
            thrust_combine: ThrustCombine::Accumulate,
            ..SimConfig::default()
        });
        let keys = KeyState::new()
            .with(FlightKey::StrafeLeft)
            .with(FlightKey::StrafeRight);
        assert_eq!(integ.thrust_vector(&keys, Quat::IDENTITY, FRAME_MS), Vec3::ZERO);

        let keys = KeyState::new().with(FlightKey::Thrust).with(FlightKey::StrafeRight);
        assert!(approx(
            integ.thrust_vector(&keys, Quat::IDENTITY, FRAME_MS),
            Vec3::new(-0.005, 0.0, 0.005)
        ));
    }

    #[test]
    fn slow_velocity_snaps_to_zero() {
        let mut state = SimulationState::new();
        state.velocity = Vec3::new(0.0009, 0.0, 0.0);
        integrator().update(&mut state, &KeyState::new(), FRAME_MS);
        assert_eq!(state.velocity, Vec3::ZERO);
    }

    #[test]
    fn resting_state_stays_finite() {
        let mut state = SimulationState::new();
        integrator().update(&mut state, &KeyState::new(), FRAME_MS);
        assert_eq!(state.velocity, Vec3::ZERO);
        assert_eq!(state.position, crate::model::START_POSITION);
    }

    #[test]
    fn braking_is_constant_magnitude() {
        let mut state = SimulationState::new();
        state.velocity = Vec3::new(0.0, 0.3, 0.4);
        integrator().update(&mut state, &KeyState::new(), FRAME_MS);
        assert!((state.velocity.length() - (0.5 - 0.0003)).abs() < 1e-6);
        assert!(approx(state.position, crate::model::START_POSITION + Vec3::new(0.0, 0.3, 0.4)));
    }

    #[test]
    fn held_thrust_is_bounded_and_monotonic() {
        let integ = integrator();
        let bound = 0.005 / 0.0003;
        let keys = KeyState::new().with(FlightKey::Thrust);
        let mut state = SimulationState::new();
        let mut last = 0.0;
        for _ in 0..5_000 {
            integ.update(&mut state, &keys, FRAME_MS);
            let speed = state.speed();
            assert!(speed + 1e-4 >= last);
            assert!(speed <= bound + 1e-3);
            last = speed;
        }
        assert!(last > bound * 0.99);
    }

    #[test]
    fn unclamped_speed_grows_linearly() {
        let integ = ThrustIntegrator::new(SimConfig { max_speed: None, ..SimConfig::default() });
        let keys = KeyState::new().with(FlightKey::Thrust);
        let mut state = SimulationState::new();
        for _ in 0..10 {
            integ.update(&mut state, &keys, FRAME_MS);
        }
        assert!((state.speed() - 10.0 * (0.005 - 0.0003)).abs() < 1e-5);
    }
}
