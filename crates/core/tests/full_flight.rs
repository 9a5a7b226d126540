//! Whole-simulation runs against a simple rigid-body integrator.

mod common;

use glider_sim_core::{
    AircraftState, ControlTargets, FluidGridConfig, GlideRatio, GliderSimulation, RigidBody,
    SimulationConfig, StepScheduler, Thermal, ThermalParams, ThermalSpawnerConfig, Vec3,
};
use nalgebra::UnitQuaternion;

/// Semi-implicit Euler integrator with a scalar moment of inertia.
struct TestBody {
    state: AircraftState,
    force: Vec3,
    torque: Vec3,
    inertia: f32,
    angular_damping: f32,
}

impl TestBody {
    fn new(state: AircraftState) -> Self {
        Self {
            state,
            force: Vec3::zeros(),
            torque: Vec3::zeros(),
            inertia: 2000.0,
            angular_damping: 2.0,
        }
    }

    fn integrate(&mut self, dt: f32) {
        let s = &mut self.state;
        s.velocity += self.force / s.mass * dt;
        s.position += s.velocity * dt;
        s.angular_velocity += self.torque / self.inertia * dt;
        s.angular_velocity *= (1.0 - self.angular_damping * dt).max(0.0);
        s.orientation = UnitQuaternion::from_scaled_axis(s.angular_velocity * dt) * s.orientation;
        self.force = Vec3::zeros();
        self.torque = Vec3::zeros();
    }
}

impl RigidBody for TestBody {
    fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    fn add_force_at_position(&mut self, force: Vec3, position: Vec3) {
        self.force += force;
        self.torque += (position - self.state.position).cross(&force);
    }

    fn add_relative_torque(&mut self, torque: Vec3) {
        self.torque += self.state.orientation * torque;
    }
}

fn launch() -> AircraftState {
    AircraftState {
        position: Vec3::new(100.0, 400.0, 100.0),
        velocity: Vec3::new(0.0, 0.0, 22.0),
        ..AircraftState::default()
    }
}

fn grid_config() -> FluidGridConfig {
    FluidGridConfig {
        width: 1000.0,
        height: 600.0,
        cell_width: 100.0,
        cell_height: 100.0,
        sim_period_s: 1.0,
        solver_iterations: 8,
        ..FluidGridConfig::default()
    }
}

fn fly(sim: &mut GliderSimulation, body: &mut TestBody, seconds: f32) -> usize {
    let ticks = (seconds / sim.dt()).round() as usize;
    let mut grid_steps = 0;
    for _ in 0..ticks {
        let report = sim.tick(&body.state, &ControlTargets::default());
        report.forces.apply_to(body);
        body.integrate(sim.dt());
        if report.grid_stepped {
            grid_steps += 1;
        }
    }
    grid_steps
}

#[test]
fn test_scheduler_cadence() {
    let mut scheduler = StepScheduler::new(1.0, 50.0);
    let fired: Vec<usize> = (0..200).filter(|_| scheduler.tick()).collect();
    assert_eq!(fired, vec![0, 50, 100, 150]);
    assert_eq!(scheduler.period_ticks(), 50);
}

#[test]
fn test_ten_second_flight_stays_finite() {
    let mut sim = GliderSimulation::new(SimulationConfig {
        static_wind: Vec3::new(1.5, 0.0, -2.0),
        grid: Some(grid_config()),
        ..SimulationConfig::default()
    })
    .unwrap();
    let mut body = TestBody::new(launch());

    let grid_steps = fly(&mut sim, &mut body, 10.0);

    assert_eq!(grid_steps, 10);
    assert_eq!(sim.ticks(), 500);
    let s = body.state;
    assert!(s.position.iter().all(|c| c.is_finite()), "{s:?}");
    assert!(s.velocity.iter().all(|c| c.is_finite()), "{s:?}");
    assert!(s.velocity.norm() < 200.0, "{s:?}");
    assert!(s.orientation.coords.iter().all(|c| c.is_finite()));

    let report = sim.tick(&body.state, &ControlTargets::default());
    assert_eq!(report.telemetry.altitude, body.state.position.y);
    assert!(report.telemetry.climb_rate.is_some());
    assert!(report.telemetry.compensated_climb.is_some());
}

#[test]
fn test_thermal_under_the_glider_adds_lift() {
    let run = |with_thermal: bool| {
        let mut sim = GliderSimulation::new(SimulationConfig::default()).unwrap();
        if with_thermal {
            sim.wind_mut().add_source(
                Thermal::new(ThermalParams {
                    origin: Vec3::new(100.0, 0.0, 100.0),
                    vertical_speed: 4.0,
                    radius: 200.0,
                    ..ThermalParams::default()
                })
                .unwrap(),
            );
        }
        let mut body = TestBody::new(launch());
        let report = sim.tick(&body.state, &ControlTargets::default());
        report.forces.apply_to(&mut body);
        body.force
    };
    let calm = run(false);
    let rising = run(true);
    assert!(rising.y > calm.y, "calm {calm:?} rising {rising:?}");
}

#[test]
fn test_identical_runs_are_deterministic() {
    let config = SimulationConfig {
        grid: Some(grid_config()),
        spawner: Some(ThermalSpawnerConfig {
            heat_rate: 0.5,
            seed: 42,
            ..ThermalSpawnerConfig::default()
        }),
        ..SimulationConfig::default()
    };
    let run = || {
        let mut sim = GliderSimulation::new(config.clone()).unwrap();
        let mut body = TestBody::new(launch());
        fly(&mut sim, &mut body, 4.0);
        (body.state, sim.wind().sources().len())
    };
    let (first, first_sources) = run();
    let (second, second_sources) = run();
    assert_eq!(first, second);
    assert_eq!(first_sources, second_sources);
}

#[test]
fn test_glide_ratio_reported_while_descending() {
    let mut sim = GliderSimulation::new(SimulationConfig::default()).unwrap();
    let mut state = launch();
    state.velocity = Vec3::new(0.0, -1.0, 20.0);
    let dt = sim.dt();

    for _ in 0..4 {
        sim.tick(&state, &ControlTargets::default());
        state.position += state.velocity * dt;
    }
    match sim.tick(&state, &ControlTargets::default()).telemetry.glide_ratio {
        GlideRatio::Ratio(ratio) => assert!((ratio - 20.0).abs() < 0.5, "ratio {ratio}"),
        other => panic!("expected a ratio, got {other:?}"),
    }
}
