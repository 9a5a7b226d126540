//! Fixed-timestep glider simulation
//!
//! Ties the control smoothing, force model, instruments and the layered wind
//! together. The caller owns the rigid body: each tick it passes the current
//! state in and applies the returned forces to its integrator.

use crate::atmosphere::{
    FlatTerrain, TerrainHeight, ThermalSpawner, ThermalSpawnerConfig, WindField,
};
use crate::core_types::Vec3;
use crate::error::{require_positive, ConfigError};
use crate::flight::{
    AircraftState, ControlConfig, ControlState, ControlTargets, FlightModel, FlightModelConfig,
    ForceSet,
};
use crate::grid::{FluidGrid, FluidGridConfig, StepScheduler};
use crate::instruments::{InstrumentPanel, Telemetry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything needed to build a [`GliderSimulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Fixed tick rate (Hz)
    pub ticks_per_second: f32,
    /// Aerodynamic tuning
    pub flight: FlightModelConfig,
    /// Control smoothing and sustainer
    pub controls: ControlConfig,
    /// Uniform wind everywhere (m/s)
    pub static_wind: Vec3,
    /// Slowly evolving wind grid; `None` disables it
    pub grid: Option<FluidGridConfig>,
    /// Solar heating thermal generator; `None` disables it
    pub spawner: Option<ThermalSpawnerConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 50.0,
            flight: FlightModelConfig::default(),
            controls: ControlConfig::default(),
            static_wind: Vec3::zeros(),
            grid: None,
            spawner: None,
        }
    }
}

impl SimulationConfig {
    /// Validate every nested configuration.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("ticks_per_second", self.ticks_per_second)?;
        self.flight.validate()?;
        self.controls.validate()?;
        if let Some(grid) = &self.grid {
            grid.validate()?;
        }
        if let Some(spawner) = &self.spawner {
            spawner.validate()?;
        }
        Ok(())
    }
}

/// Output of one [`GliderSimulation::tick`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Forces for the integrator
    pub forces: ForceSet,
    /// Instrument readings
    pub telemetry: Telemetry,
    /// Whether the wind grid advanced this tick
    pub grid_stepped: bool,
}

/// Glider simulation driven at a fixed rate.
pub struct GliderSimulation {
    config: SimulationConfig,
    dt: f32,
    model: FlightModel,
    controls: ControlState,
    instruments: InstrumentPanel,
    wind: WindField,
    grid_schedule: Option<StepScheduler>,
    spawner: Option<ThermalSpawner>,
    terrain: Box<dyn TerrainHeight>,
    ticks: u64,
}

impl std::fmt::Debug for GliderSimulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GliderSimulation")
            .field("config", &self.config)
            .field("dt", &self.dt)
            .field("model", &self.model)
            .field("controls", &self.controls)
            .field("instruments", &self.instruments)
            .field("wind", &self.wind)
            .field("grid_schedule", &self.grid_schedule)
            .field("spawner", &self.spawner)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl GliderSimulation {
    /// Build a simulation over flat ground at height zero.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when any part of `config` is invalid.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Creating glider simulation at {:.0} Hz (grid: {}, spawner: {})",
            config.ticks_per_second,
            config.grid.is_some(),
            config.spawner.is_some()
        );

        let model = FlightModel::new(config.flight)?;
        let controls = ControlState::new(config.controls)?;
        let mut wind = WindField::new(config.static_wind);
        let mut grid_schedule = None;
        if let Some(grid_config) = &config.grid {
            grid_schedule = Some(StepScheduler::new(
                grid_config.sim_period_s,
                config.ticks_per_second,
            ));
            wind = wind.with_grid(FluidGrid::new(grid_config.clone())?);
        }
        let spawner = config.spawner.clone().map(ThermalSpawner::new).transpose()?;

        Ok(Self {
            dt: 1.0 / config.ticks_per_second,
            instruments: InstrumentPanel::new(config.flight.gravity),
            config,
            model,
            controls,
            wind,
            grid_schedule,
            spawner,
            terrain: Box::new(FlatTerrain::default()),
            ticks: 0,
        })
    }

    /// Replace the ground used to place spawned thermals.
    pub fn with_terrain(mut self, terrain: impl TerrainHeight + 'static) -> Self {
        self.terrain = Box::new(terrain);
        self
    }

    /// Advance one fixed tick.
    ///
    /// # Arguments
    ///
    /// * `state` - Aircraft state read from the integrator
    /// * `targets` - Pilot control targets for this tick
    ///
    /// # Returns
    ///
    /// Forces to apply, instrument readings and whether the grid stepped
    pub fn tick(&mut self, state: &AircraftState, targets: &ControlTargets) -> TickReport {
        let dt = self.dt;

        // 1. Ease controls and run the sustainer
        self.controls.update(targets, dt);

        // 2. Forces from the current wind
        let forces = self.model.compute_forces(state, &self.controls, &self.wind);

        // 3. Instruments
        let telemetry = self.instruments.update(
            state,
            &forces.air,
            self.controls.sustainer.fraction(),
            dt,
        );

        // 4. Grid macro-step on its own cadence
        let grid_stepped = match (self.grid_schedule.as_mut(), self.config.grid.as_ref()) {
            (Some(schedule), Some(grid_config)) => {
                schedule.tick() && self.wind.step_grid(grid_config.sim_period_s)
            }
            _ => false,
        };

        // 5. Thermal lifetimes
        self.wind.advance_sources(dt);

        // 6. Solar heating
        if let Some(spawner) = &mut self.spawner {
            for thermal in spawner.accumulate(state.position, dt, self.terrain.as_ref()) {
                self.wind.add_source(thermal);
            }
        }

        self.ticks += 1;
        if grid_stepped {
            debug!(
                "Tick {}: grid stepped, {} wind sources, altitude {:.1}m",
                self.ticks,
                self.wind.sources().len(),
                telemetry.altitude
            );
        }

        TickReport {
            forces,
            telemetry,
            grid_stepped,
        }
    }

    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Ticks taken so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time in seconds.
    pub fn simulation_time(&self) -> f32 {
        self.ticks as f32 * self.dt
    }

    /// Configuration in use.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Force model.
    pub fn model(&self) -> &FlightModel {
        &self.model
    }

    /// Smoothed controls.
    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    /// Composited wind.
    pub fn wind(&self) -> &WindField {
        &self.wind
    }

    /// Mutable wind, for placing thermals or editing the grid.
    pub fn wind_mut(&mut self) -> &mut WindField {
        &mut self.wind
    }

    /// Thermal generator, when enabled.
    pub fn spawner(&self) -> Option<&ThermalSpawner> {
        self.spawner.as_ref()
    }
}
