//! Solar heating heuristic that spawns thermals.
//!
//! The ground is divided into square columns keyed by integer `(x, z)`
//! coordinates. Each update, every column near the observer soaks up heat in
//! proportion to how high the sun stands, with a little random jitter. A column
//! whose heat crosses the spawn threshold releases a thermal and starts over.
//! Columns left behind cool off and are forgotten once they hold no heat.
//!
//! ```text
//! heat += heat_rate * max(0, -sun.y) * dt * jitter     jitter ∈ [0.5, 1.5]
//! ```
//!
//! All randomness comes from a seeded generator and columns are visited in a
//! fixed order, so a given seed and input sequence always spawns the same
//! thermals.

use super::thermal::{Thermal, ThermalParams};
use crate::core_types::{FalloffCurve, Vec3};
use crate::error::{require_non_negative, require_positive, require_range, ConfigError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest accepted [`ThermalSpawnerConfig::heating_radius`].
pub const MAX_HEATING_RADIUS: u32 = 64;

/// Ground height lookup used to place thermal origins.
pub trait TerrainHeight {
    /// Terrain height (m) at world `(x, z)`.
    fn height_at(&self, x: f32, z: f32) -> f32;
}

/// Level ground at a fixed height.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatTerrain {
    /// Ground height (m)
    pub height: f32,
}

impl TerrainHeight for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }
}

/// Configuration for a [`ThermalSpawner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalSpawnerConfig {
    /// Direction sunlight travels (pointing down when the sun is up)
    pub sun_direction: Vec3,
    /// Heat gained per second under an overhead sun
    pub heat_rate: f32,
    /// Heat at which a column releases a thermal
    pub spawn_threshold: f32,
    /// Edge length of one ground column (m)
    pub column_size: f32,
    /// Columns heated on each side of the observer's column
    pub heating_radius: u32,
    /// Heat lost per second by columns outside the heated window
    pub cooling_rate: f32,
    /// Peak vertical speed range for spawned thermals (m/s)
    pub strength_range: (f32, f32),
    /// Lifetime range for spawned thermals (s)
    pub lifetime_range: (f32, f32),
    /// Radius of spawned thermals (m)
    pub thermal_radius: f32,
    /// Cloud base of spawned thermals (m)
    pub cloud_base_height: f32,
    /// Wind spawned thermals lean with (m/s)
    pub prevailing_wind: Vec3,
    /// Lift profile of spawned thermals
    pub falloff: FalloffCurve,
    /// Random seed
    pub seed: u64,
}

impl Default for ThermalSpawnerConfig {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(0.3, -0.9, 0.3),
            heat_rate: 0.01,
            spawn_threshold: 1.0,
            column_size: 400.0,
            heating_radius: 2,
            cooling_rate: 0.002,
            strength_range: (1.5, 4.5),
            lifetime_range: (180.0, 600.0),
            thermal_radius: 60.0,
            cloud_base_height: 1200.0,
            prevailing_wind: Vec3::zeros(),
            falloff: FalloffCurve::soft_core(),
            seed: 0x5EED,
        }
    }
}

impl ThermalSpawnerConfig {
    /// Check every parameter.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for non-positive sizes or threshold, a
    /// negative heat or cooling rate, a heating radius above
    /// [`MAX_HEATING_RADIUS`], or an inverted strength or lifetime range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sun_direction.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::NotFinite {
                name: "sun_direction",
            });
        }
        require_non_negative("heat_rate", self.heat_rate)?;
        require_positive("spawn_threshold", self.spawn_threshold)?;
        require_positive("column_size", self.column_size)?;
        require_non_negative("cooling_rate", self.cooling_rate)?;
        if self.heating_radius > MAX_HEATING_RADIUS {
            return Err(ConfigError::TooLarge {
                name: "heating_radius",
                value: self.heating_radius as f32,
                max: MAX_HEATING_RADIUS as f32,
            });
        }
        require_positive("thermal_radius", self.thermal_radius)?;
        let (min_speed, max_speed) = self.strength_range;
        require_range("strength_range", min_speed, max_speed)?;
        require_non_negative("strength_range", min_speed)?;
        let (min_life, max_life) = self.lifetime_range;
        require_range("lifetime_range", min_life, max_life)?;
        require_non_negative("lifetime_range", min_life)?;
        Ok(())
    }
}

/// Accumulates per-column solar heat and turns it into thermals.
#[derive(Debug, Clone)]
pub struct ThermalSpawner {
    config: ThermalSpawnerConfig,
    heat: FxHashMap<(i32, i32), f32>,
    rng: StdRng,
    spawned: u64,
}

impl ThermalSpawner {
    /// Create a spawner with empty heat columns.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the configuration fails
    /// [`ThermalSpawnerConfig::validate`].
    pub fn new(config: ThermalSpawnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            heat: FxHashMap::default(),
            spawned: 0,
            config,
        })
    }

    /// Spawner configuration.
    #[must_use]
    pub fn config(&self) -> &ThermalSpawnerConfig {
        &self.config
    }

    /// Column key containing a world position.
    #[must_use]
    pub fn column_key(&self, position: Vec3) -> (i32, i32) {
        (
            (position.x / self.config.column_size).floor() as i32,
            (position.z / self.config.column_size).floor() as i32,
        )
    }

    /// Heat stored in a column (zero if never heated).
    #[must_use]
    pub fn heat_at(&self, key: (i32, i32)) -> f32 {
        self.heat.get(&key).copied().unwrap_or(0.0)
    }

    /// Number of columns currently holding heat or inside the heated window.
    #[must_use]
    pub fn tracked_columns(&self) -> usize {
        self.heat.len()
    }

    /// Thermals released since construction.
    #[must_use]
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Heat the columns around `center` for `dt` seconds.
    ///
    /// Columns outside the window around `center` cool by `cooling_rate * dt`
    /// and are dropped once empty.
    ///
    /// Returns the thermals released by columns that crossed the threshold.
    pub fn accumulate(
        &mut self,
        center: Vec3,
        dt: f32,
        terrain: &(impl TerrainHeight + ?Sized),
    ) -> Vec<Thermal> {
        let mut released = Vec::new();
        if !dt.is_finite() || dt <= 0.0 {
            return released;
        }
        let insolation = (-self.config.sun_direction.y).max(0.0);
        if insolation == 0.0 {
            return released;
        }

        let (cx, cz) = self.column_key(center);
        let reach = self.config.heating_radius as i32;
        for kx in cx.saturating_sub(reach)..=cx.saturating_add(reach) {
            for kz in cz.saturating_sub(reach)..=cz.saturating_add(reach) {
                let jitter = self.rng.random_range(0.5..=1.5_f32);
                let gained = self.config.heat_rate * insolation * dt * jitter;
                let heat = self.heat.entry((kx, kz)).or_insert(0.0);
                *heat += gained;
                if *heat < self.config.spawn_threshold {
                    continue;
                }
                *heat = 0.0;
                if let Some(thermal) = self.release((kx, kz), terrain) {
                    released.push(thermal);
                }
            }
        }

        let window = self.config.heating_radius;
        let cooling = self.config.cooling_rate * dt;
        let before = self.heat.len();
        self.heat.retain(|&(kx, kz), heat| {
            if kx.abs_diff(cx) <= window && kz.abs_diff(cz) <= window {
                return true;
            }
            *heat -= cooling;
            *heat > 0.0
        });
        if self.heat.len() < before {
            debug!(
                "Forgot {} cooled columns, {} tracked",
                before - self.heat.len(),
                self.heat.len()
            );
        }
        released
    }

    /// Build a thermal at the centre of a column.
    fn release(
        &mut self,
        key: (i32, i32),
        terrain: &(impl TerrainHeight + ?Sized),
    ) -> Option<Thermal> {
        let size = self.config.column_size;
        let x = (key.0 as f32 + 0.5) * size;
        let z = (key.1 as f32 + 0.5) * size;
        let ground = terrain.height_at(x, z);
        let (min_speed, max_speed) = self.config.strength_range;
        let (min_life, max_life) = self.config.lifetime_range;
        let params = ThermalParams {
            origin: Vec3::new(x, ground, z),
            prevailing_wind: self.config.prevailing_wind,
            vertical_speed: self.rng.random_range(min_speed..=max_speed),
            radius: self.config.thermal_radius,
            falloff: self.config.falloff.clone(),
            cloud_base_height: self.config.cloud_base_height.max(ground),
            lifetime_s: self.rng.random_range(min_life..=max_life),
        };
        match Thermal::new(params) {
            Ok(thermal) => {
                self.spawned += 1;
                debug!(
                    "Spawned thermal at ({:.0}, {:.0}, {:.0}): {:.1} m/s for {:.0}s",
                    x,
                    ground,
                    z,
                    thermal.vertical_speed(),
                    thermal.lifetime_remaining()
                );
                Some(thermal)
            }
            Err(e) => {
                debug!("Skipped thermal at column {:?}: {}", key, e);
                None
            }
        }
    }
}
