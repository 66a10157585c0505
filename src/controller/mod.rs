// CONTROLLER: Input, flight integrators, and the per-frame update
pub mod input;
pub mod orientation;
pub mod physics;
pub mod frame_loop;

pub use input::{FlightKey, InputEvent, InputProcessor, InputState, KeyBindings, KeyState};
pub use orientation::OrientationIntegrator;
pub use physics::ThrustIntegrator;
pub use frame_loop::{CameraUniform, FrameLoop, RenderFrame, TransformUniform};
