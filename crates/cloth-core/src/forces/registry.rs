use std::collections::BTreeMap;

use glam::Vec3;

/// What a custom force sees of a particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSample {
    pub index: usize,
    pub position: Vec3,
    /// Implicit velocity (position delta over the last substep).
    pub displacement: Vec3,
    pub mass: f32,
}

/// A custom force strategy: pure function of particle state and simulation time.
pub type CustomForce = fn(&ParticleSample, f32) -> Vec3;

/// Named custom forces, evaluated in name order for every free particle.
#[derive(Clone, Debug, Default)]
pub struct ForceRegistry {
    entries: BTreeMap<String, CustomForce>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `force` under `name`. Returns the strategy it replaced, if any.
    pub fn register(&mut self, name: impl Into<String>, force: CustomForce) -> Option<CustomForce> {
        self.entries.insert(name.into(), force)
    }

    pub fn unregister(&mut self, name: &str) -> Option<CustomForce> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Sum of every registered strategy for one particle.
    pub fn evaluate(&self, sample: &ParticleSample, time: f32) -> Vec3 {
        self.entries.values().map(|f| f(sample, time)).sum()
    }
}
