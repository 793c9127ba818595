use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::signed_noise;

/// Directional wind with turbulent gusts.
///
/// Stateless: the contribution is a pure function of position and time, so a
/// field can be re-supplied every frame without carrying history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindField {
    /// Blow direction. Normalized on evaluation; zero means gusts only.
    pub direction: Vec3,
    pub strength: f32,
    /// Gust amplitude as a fraction of `strength`.
    pub turbulence: f32,
    /// Gust frequency in Hz.
    pub frequency: f32,
}

impl Default for WindField {
    fn default() -> Self {
        Self {
            direction: Vec3::X,
            strength: 1.0,
            turbulence: 0.1,
            frequency: 1.0,
        }
    }
}

impl WindField {
    pub fn new(direction: Vec3, strength: f32, turbulence: f32, frequency: f32) -> Self {
        Self {
            direction,
            strength,
            turbulence,
            frequency,
        }
    }

    /// Force this field applies at `pos` and time `time`.
    ///
    /// Steady part `direction * strength` plus a gust term whose components are
    /// independent value-noise channels in [-1,1], so the gust magnitude never
    /// exceeds `strength * turbulence * sqrt(3)`.
    pub fn force_at(&self, pos: Vec3, time: f32) -> Vec3 {
        let steady = self.direction.normalize_or_zero() * self.strength;
        if self.turbulence == 0.0 {
            return steady;
        }

        // Spatial phase offset so the whole patch does not gust in lockstep.
        let phase = pos.x * 0.37 + pos.y * 0.61 + pos.z * 0.23;
        let t = time * self.frequency + phase;
        let gust = Vec3::new(
            signed_noise(t),
            signed_noise(t + 17.3),
            signed_noise(t + 41.9),
        );

        steady + gust * (self.strength * self.turbulence)
    }
}
