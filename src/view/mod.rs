// VIEW: Rendering and graphics
pub mod render;
pub mod gpu_init;

pub use render::{plan_draws, DrawStats, OverlayFrame, RenderState};
pub use gpu_init::GpuContext;
