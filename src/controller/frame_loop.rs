use glam::{Mat4, Vec2};
use tracing::trace;

use crate::config::SimConfig;
use crate::controller::input::InputState;
use crate::controller::orientation::OrientationIntegrator;
use crate::controller::physics::ThrustIntegrator;
use crate::model::{Camera, SimulationState};

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4) -> Self {
        Self { view_proj: view_proj.to_cols_array_2d() }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub transform: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn new(transform: Mat4) -> Self {
        Self { transform: transform.to_cols_array_2d() }
    }
}

/// Output of one simulation step, handed to the renderer
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame {
    pub view_proj: Mat4,
    /// Frame time actually integrated, after clamping
    pub dt_ms: f32,
    /// Mouse delta consumed this frame, `None` when no pointer was attached
    pub look: Option<Vec2>,
}

/// Runs the integrators in order and composes the view-projection matrix.
///
/// The host owns scheduling and calls [`FrameLoop::step`] once per frame.
pub struct FrameLoop {
    pub camera: Camera,
    config: SimConfig,
    orientation: OrientationIntegrator,
    thrust: ThrustIntegrator,
}

impl FrameLoop {
    pub fn new(config: SimConfig, width: u32, height: u32) -> Self {
        Self {
            camera: Camera::new(width, height, &config),
            orientation: OrientationIntegrator::new(config.clone()),
            thrust: ThrustIntegrator::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    /// Input first, then physics, then the matrix for this frame's draw
    pub fn step(&self, state: &mut SimulationState, input: &mut InputState, dt_ms: f64) -> RenderFrame {
        let dt_ms = self.config.clamp_frame_ms(dt_ms);

        let look = input.consume_look();
        let keys = input.keys;

        self.orientation.update(state, &keys, look);
        self.thrust.update(state, &keys, dt_ms);

        trace!(
            pos = ?state.position,
            vel = ?state.velocity,
            rot = ?state.orientation,
            "frame stepped"
        );

        RenderFrame {
            view_proj: self.camera.view_proj(state.orientation, state.position),
            dt_ms,
            look,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::{FlightKey, InputEvent};

    #[test]
    fn step_consumes_mouse_delta_once() {
        let frame_loop = FrameLoop::new(SimConfig::default(), 800, 600);
        let mut state = SimulationState::new();
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.process_event(&InputEvent::MouseMove { dx: 40.0, dy: 0.0 });

        let first = frame_loop.step(&mut state, &mut input, 16.0);
        assert_eq!(first.look, Some(Vec2::new(40.0, 0.0)));
        let yaw_after_first = state.angular_rate.yaw;
        assert!(yaw_after_first > 0.0);

        let second = frame_loop.step(&mut state, &mut input, 16.0);
        assert_eq!(second.look, Some(Vec2::ZERO));
        assert!(state.angular_rate.yaw < yaw_after_first);
    }

    #[test]
    fn step_composes_from_updated_state() {
        let frame_loop = FrameLoop::new(SimConfig::default(), 800, 600);
        let mut state = SimulationState::new();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));

        let frame = frame_loop.step(&mut state, &mut input, 16.0);
        let expected = frame_loop.camera.view_proj(state.orientation, state.position);
        assert_eq!(frame.view_proj, expected);
        assert!(state.position.z > -6.0);
    }

    #[test]
    fn long_stall_is_clamped() {
        let frame_loop = FrameLoop::new(SimConfig::default(), 800, 600);
        let mut state = SimulationState::new();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(FlightKey::Thrust));

        let frame = frame_loop.step(&mut state, &mut input, 60_000.0);
        assert_eq!(frame.dt_ms, 100.0);
        let max_thrust = 0.005 * 100.0 / 16.0;
        assert!(state.velocity.length() <= max_thrust);
    }

    #[test]
    fn uniforms_are_column_major() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(CameraUniform::new(m).view_proj[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(TransformUniform::new(m).transform[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }
}
