use std::collections::HashMap;

use tracing::warn;

use crate::error::ModelError;

/// Named mesh buffers, filled once at startup and read at draw time.
///
/// Generic over the buffer type so lookups work without a GPU.
pub struct ModelRegistry<B> {
    models: HashMap<String, B>,
}

impl<B> ModelRegistry<B> {
    pub fn new() -> Self {
        Self { models: HashMap::new() }
    }

    /// Registering a name twice replaces the earlier buffers
    pub fn register(&mut self, name: impl Into<String>, buffers: B) {
        let name = name.into();
        if self.models.insert(name.clone(), buffers).is_some() {
            warn!(model = %name, "model registered twice, replacing buffers");
        }
    }

    pub fn get(&self, name: &str) -> Result<&B, ModelError> {
        self.models
            .get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<B> Default for ModelRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}
