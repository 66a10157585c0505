/// Which roll key wins when both are held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollPrecedence {
    #[default]
    LeftWins,
    RightWins,
    /// Both held means no roll input
    Cancel,
}

/// How thrust from several directional keys held in the same frame combines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThrustCombine {
    /// Keys are evaluated forward, reverse, left, right; the last held one
    /// replaces the thrust vector of the earlier ones.
    #[default]
    Overwrite,
    /// Every held key contributes and opposite keys cancel out.
    Accumulate,
}

/// Tuning for the flight integrators and the projection.
///
/// Angular gains and damping are per frame, not per second: the mouse delta
/// and roll keys are sampled once per frame. Only thrust is scaled by the
/// frame time, relative to `nominal_frame_ms`.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub roll_gain: f32,
    pub yaw_gain: f32,
    pub pitch_gain: f32,
    /// Fraction of every angular rate removed each update
    pub rate_damping: f32,
    pub max_roll_rate: f32,
    pub max_yaw_rate: f32,
    pub max_pitch_rate: f32,
    pub roll_precedence: RollPrecedence,

    pub thrust_gain: f32,
    /// Magnitude of the braking vector added against velocity each frame
    pub brake_gain: f32,
    /// Velocities shorter than this snap to zero
    pub velocity_epsilon: f32,
    /// Terminal speed in units per frame, `None` disables the clamp
    pub max_speed: Option<f32>,
    pub thrust_combine: ThrustCombine,

    pub nominal_frame_ms: f32,
    /// Upper bound for a single frame delta, guards the first frame and stalls
    pub max_frame_ms: f32,

    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        let thrust_gain = 0.005;
        let brake_gain = 0.0003;
        Self {
            roll_gain: 0.09,
            yaw_gain: 0.002,
            pitch_gain: 0.002,
            rate_damping: 0.10,
            max_roll_rate: 4.0,
            max_yaw_rate: 1.0,
            max_pitch_rate: 1.0,
            roll_precedence: RollPrecedence::LeftWins,

            thrust_gain,
            brake_gain,
            velocity_epsilon: 0.001,
            max_speed: Some(thrust_gain / brake_gain),
            thrust_combine: ThrustCombine::Overwrite,

            nominal_frame_ms: 16.0,
            max_frame_ms: 100.0,

            fov_y_degrees: 60.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

impl SimConfig {
    /// Clamp a raw frame delta into the range the integrators accept
    pub fn clamp_frame_ms(&self, dt_ms: f64) -> f32 {
        if dt_ms.is_finite() {
            dt_ms.clamp(0.0, self.max_frame_ms as f64) as f32
        } else {
            0.0
        }
    }
}
