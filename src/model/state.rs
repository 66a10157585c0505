use glam::{Quat, Vec3};

/// Camera translation at program start, places the scene six units ahead
pub const START_POSITION: Vec3 = Vec3::new(0.0, 0.0, -6.0);

/// Per-axis angular rates in degrees per frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngularRate {
    pub roll: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl AngularRate {
    pub const ZERO: Self = Self { roll: 0.0, yaw: 0.0, pitch: 0.0 };

    pub fn max_abs(&self) -> f32 {
        self.roll.abs().max(self.yaw.abs()).max(self.pitch.abs())
    }
}

/// Everything the integrators mutate, owned by the frame loop
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub orientation: Quat,
    pub angular_rate: AngularRate,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            angular_rate: AngularRate::ZERO,
            position: START_POSITION,
            velocity: Vec3::ZERO,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}
