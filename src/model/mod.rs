// MODEL: Simulation state and scene data
pub mod camera;
pub mod registry;
pub mod scene;
pub mod state;

pub use camera::Camera;
pub use registry::ModelRegistry;
pub use scene::{Scene, SceneInstance};
pub use state::{AngularRate, SimulationState, START_POSITION};
