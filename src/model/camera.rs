use glam::{Mat4, Quat, Vec3};

use crate::config::SimConfig;

/// Perspective parameters and the view-projection composition
pub struct Camera {
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32, config: &SimConfig) -> Self {
        let mut camera = Self {
            fov_y: config.fov_y_degrees.to_radians(),
            aspect: 1.0,
            z_near: config.z_near,
            z_far: config.z_far,
        };
        camera.set_aspect(width, height);
        camera
    }

    /// Zero-sized viewports (minimized windows) keep the previous aspect
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    /// Rotation first, then translation, so the camera turns about itself
    /// rather than orbiting the world origin.
    pub fn view(orientation: Quat, position: Vec3) -> Mat4 {
        Mat4::from_quat(orientation) * Mat4::from_translation(position)
    }

    pub fn view_proj(&self, orientation: Quat, position: Vec3) -> Mat4 {
        self.projection() * Self::view(orientation, position)
    }
}
