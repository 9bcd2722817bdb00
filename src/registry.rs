//! Level registry
//!
//! Levels are registered with their height field, then prepared in one
//! explicit pass before any query. Nothing is built at registration time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::TrackError;
use crate::terrain::{Obstacle, ScatterOutput, scatter_mountains};
use crate::track::{HeightField, Level, LevelDef};

/// Ordered set of levels, addressable by id
#[derive(Debug, Default)]
pub struct LevelRegistry {
    levels: Vec<Level>,
    /// Id -> index into `levels`
    index: HashMap<String, usize>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a level; ids must be unique
    pub fn register(
        &mut self,
        def: LevelDef,
        height: impl HeightField + 'static,
    ) -> Result<&mut Level, TrackError> {
        self.register_shared(def, Arc::new(height))
    }

    pub fn register_shared(
        &mut self,
        def: LevelDef,
        height: Arc<dyn HeightField>,
    ) -> Result<&mut Level, TrackError> {
        if self.index.contains_key(&def.id) {
            return Err(TrackError::DuplicateLevel { id: def.id });
        }
        let i = self.levels.len();
        self.index.insert(def.id.clone(), i);
        self.levels.push(Level::with_shared_height(def, height));
        Ok(&mut self.levels[i])
    }

    /// Register every level in a JSON array, asking `height_for` for each one's field
    ///
    /// All or nothing: on a duplicate id (against the registry or within the
    /// array) nothing is registered.
    pub fn load_json<F>(&mut self, json: &str, mut height_for: F) -> Result<usize, TrackError>
    where
        F: FnMut(&LevelDef) -> Arc<dyn HeightField>,
    {
        let defs = LevelDef::list_from_json(json)?;
        {
            let mut batch = HashSet::with_capacity(defs.len());
            for def in &defs {
                if self.index.contains_key(&def.id) || !batch.insert(def.id.as_str()) {
                    return Err(TrackError::DuplicateLevel { id: def.id.clone() });
                }
            }
        }

        let count = defs.len();
        for def in defs {
            let height = height_for(&def);
            self.register_shared(def, height)?;
        }
        log::debug!("Loaded {} level(s) from JSON", count);
        Ok(count)
    }

    /// Build every level's curve; stops at the first invalid level
    pub fn prepare_all(&mut self) -> Result<(), TrackError> {
        for level in &mut self.levels {
            level.prepare()?;
        }
        log::info!("Prepared {} level(s)", self.levels.len());
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Level, TrackError> {
        self.index
            .get(id)
            .map(|&i| &self.levels[i])
            .ok_or_else(|| TrackError::UnknownLevel { id: id.to_string() })
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Level, TrackError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.levels[i]),
            None => Err(TrackError::UnknownLevel { id: id.to_string() }),
        }
    }

    /// Scatter mountains for one prepared level
    pub fn populate(
        &self,
        id: &str,
        obstacles: &mut Vec<Obstacle>,
    ) -> Result<ScatterOutput, TrackError> {
        scatter_mountains(self.get(id)?, obstacles)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.id())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
