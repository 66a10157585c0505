use glam::{Mat4, Vec3};

/// A named mesh placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInstance {
    pub model: String,
    pub position: Vec3,
    pub scale: Option<Vec3>,
}

impl SceneInstance {
    pub fn new(model: impl Into<String>, position: Vec3) -> Self {
        Self { model: model.into(), position, scale: None }
    }

    pub fn scaled(model: impl Into<String>, position: Vec3, scale: Vec3) -> Self {
        Self { model: model.into(), position, scale: Some(scale) }
    }

    /// Translate, then scale in the translated frame
    pub fn model_matrix(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        match self.scale {
            Some(scale) => translation * Mat4::from_scale(scale),
            None => translation,
        }
    }
}

/// Ordered list of instances. Order is draw order only.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    instances: Vec<SceneInstance>,
}

impl Scene {
    pub fn new() -> Self {
        Self { instances: Vec::new() }
    }

    /// Pillars of cubes around the origin between two flat slabs
    pub fn cube_field() -> Self {
        let mut scene = Self::new();
        for p in [
            [1.0, 2.0, 0.0],
            [-1.0, 2.0, 0.0],
            [-1.0, -2.0, 0.0],
            [-3.0, 2.0, 0.0],
            [-3.0, -2.0, 0.0],
            [-3.0, 2.0, 2.0],
            [-3.0, -2.0, 2.0],
            [3.0, -2.0, 2.0],
            [1.0, -2.0, 0.0],
        ] {
            scene.add(SceneInstance::new("cube", Vec3::from_array(p)));
        }
        scene.add(SceneInstance::scaled("cube", Vec3::new(1.0, -2.0, -5.0), Vec3::new(10.0, 10.0, 2.0)));
        scene.add(SceneInstance::scaled("cube", Vec3::new(1.0, -2.0, 15.0), Vec3::new(10.0, 10.0, 0.2)));
        scene
    }

    pub fn add(&mut self, instance: SceneInstance) {
        self.instances.push(instance);
    }

    pub fn instances(&self) -> &[SceneInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
