use glam::{Quat, Vec2};

use crate::config::{RollPrecedence, SimConfig};
use crate::controller::input::{FlightKey, KeyState};
use crate::model::{AngularRate, SimulationState};

/// Turns mouse motion and the roll keys into angular rates and composes
/// them into the orientation quaternion.
pub struct OrientationIntegrator {
    config: SimConfig,
}

impl OrientationIntegrator {
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    pub fn roll_input(&self, keys: &KeyState) -> f32 {
        let left = keys.is_down(FlightKey::RollLeft);
        let right = keys.is_down(FlightKey::RollRight);
        match (left, right, self.config.roll_precedence) {
            (true, true, RollPrecedence::LeftWins) => -1.0,
            (true, true, RollPrecedence::RightWins) => 1.0,
            (true, true, RollPrecedence::Cancel) => 0.0,
            (true, false, _) => -1.0,
            (false, true, _) => 1.0,
            (false, false, _) => 0.0,
        }
    }

    /// Accumulate input, damp, then clamp
    pub fn update_rates(&self, rate: &mut AngularRate, roll: f32, look: Vec2) {
        let c = &self.config;

        rate.roll += roll * c.roll_gain;
        rate.yaw += look.x * c.yaw_gain;
        rate.pitch += look.y * c.pitch_gain;

        rate.roll -= rate.roll * c.rate_damping;
        rate.yaw -= rate.yaw * c.rate_damping;
        rate.pitch -= rate.pitch * c.rate_damping;

        rate.roll = rate.roll.clamp(-c.max_roll_rate, c.max_roll_rate);
        rate.yaw = rate.yaw.clamp(-c.max_yaw_rate, c.max_yaw_rate);
        rate.pitch = rate.pitch.clamp(-c.max_pitch_rate, c.max_pitch_rate);
    }

    /// `look` is the consumed mouse delta; `None` means no pointer is
    /// attached and nothing changes this frame, roll included.
    pub fn update(&self, state: &mut SimulationState, keys: &KeyState, look: Option<Vec2>) {
        let Some(look) = look else {
            return;
        };

        let roll = self.roll_input(keys);
        self.update_rates(&mut state.angular_rate, roll, look);

        // Pre-multiplying applies the increment in world space
        let increment = incremental_rotation(&state.angular_rate);
        state.orientation = (increment * state.orientation).normalize();
    }
}

/// Rates are Euler angles in degrees, composed as roll * yaw * pitch
pub fn incremental_rotation(rate: &AngularRate) -> Quat {
    Quat::from_rotation_z(rate.roll.to_radians())
        * Quat::from_rotation_y(rate.yaw.to_radians())
        * Quat::from_rotation_x(rate.pitch.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrator() -> OrientationIntegrator {
        OrientationIntegrator::new(SimConfig::default())
    }

    #[test]
    fn roll_left_wins_by_default() {
        let keys = KeyState::new().with(FlightKey::RollLeft).with(FlightKey::RollRight);
        assert_eq!(integrator().roll_input(&keys), -1.0);
        assert_eq!(integrator().roll_input(&KeyState::new().with(FlightKey::RollRight)), 1.0);
        assert_eq!(integrator().roll_input(&KeyState::new()), 0.0);
    }

    #[test]
    fn roll_precedence_is_configurable() {
        let keys = KeyState::new().with(FlightKey::RollLeft).with(FlightKey::RollRight);
        let right = OrientationIntegrator::new(SimConfig {
            roll_precedence: RollPrecedence::RightWins,
            ..SimConfig::default()
        });
        let cancel = OrientationIntegrator::new(SimConfig {
            roll_precedence: RollPrecedence::Cancel,
            ..SimConfig::default()
        });
        assert_eq!(right.roll_input(&keys), 1.0);
        assert_eq!(cancel.roll_input(&keys), 0.0);
    }

    #[test]
    fn extreme_mouse_delta_hits_clamp() {
        let mut state = SimulationState::new();
        integrator().update(&mut state, &KeyState::new(), Some(Vec2::new(1_000_000.0, -1_000_000.0)));
        assert_eq!(state.angular_rate.yaw, 1.0);
        assert_eq!(state.angular_rate.pitch, -1.0);
    }

    #[test]
    fn roll_rate_clamps_at_four() {
        let mut rate = AngularRate { roll: 10.0, ..AngularRate::ZERO };
        integrator().update_rates(&mut rate, 1.0, Vec2::ZERO);
        assert_eq!(rate.roll, 4.0);
    }

    #[test]
    fn rates_decay_geometrically() {
        let integ = integrator();
        let mut rate = AngularRate { roll: 3.0, yaw: 0.8, pitch: -0.6 };
        let start = rate;
        for n in 1..=10 {
            integ.update_rates(&mut rate, 0.0, Vec2::ZERO);
            let factor = 0.9f32.powi(n);
            assert!((rate.roll - start.roll * factor).abs() < 1e-5);
            assert!((rate.yaw - start.yaw * factor).abs() < 1e-5);
            assert!((rate.pitch - start.pitch * factor).abs() < 1e-5);
        }
        for _ in 0..200 {
            integ.update_rates(&mut rate, 0.0, Vec2::ZERO);
        }
        assert!(rate.max_abs() < 1e-6);
    }

    #[test]
    fn gate_closed_without_pointer() {
        let mut state = SimulationState::new();
        state.angular_rate.yaw = 0.5;
        let keys = KeyState::new().with(FlightKey::RollRight);
        integrator().update(&mut state, &keys, None);
        assert_eq!(state.angular_rate.yaw, 0.5);
        assert_eq!(state.angular_rate.roll, 0.0);
        assert_eq!(state.orientation, Quat::IDENTITY);
    }

    #[test]
    fn roll_applies_without_mouse_motion() {
        let mut state = SimulationState::new();
        let keys = KeyState::new().with(FlightKey::RollRight);
        integrator().update(&mut state, &keys, Some(Vec2::ZERO));
        assert!((state.angular_rate.roll - 0.081).abs() < 1e-6);
        assert!(state.orientation.z > 0.0);
        assert_ne!(state.orientation, Quat::IDENTITY);
    }

    #[test]
    fn increment_is_premultiplied() {
        let mut state = SimulationState::new();
        let base = Quat::from_rotation_x(0.4);
        state.orientation = base;
        integrator().update(&mut state, &KeyState::new(), Some(Vec2::new(100.0, 0.0)));
        let expected = (incremental_rotation(&state.angular_rate) * base).normalize();
        assert!(state.orientation.dot(expected).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn orientation_stays_unit_length() {
        let integ = integrator();
        let mut state = SimulationState::new();
        for frame in 0..10_000u32 {
            let dx = ((frame % 37) as f32 - 18.0) * 3.0;
            let dy = ((frame % 23) as f32 - 11.0) * 2.0;
            let mut keys = KeyState::new();
            if frame % 5 == 0 {
                keys.set(FlightKey::RollLeft, true);
            }
            integ.update(&mut state, &keys, Some(Vec2::new(dx, dy)));
            assert!((state.orientation.length() - 1.0).abs() < 1e-3, "frame {frame}");
        }
    }
}
