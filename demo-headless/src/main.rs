use clap::Parser;
use glider_sim_core::{
    AircraftState, ControlTargets, FluidGridConfig, GlideRatio, GliderSimulation, RigidBody,
    SimulationConfig, Telemetry, Thermal, ThermalParams, ThermalSpawnerConfig, Vec3,
};
use nalgebra::UnitQuaternion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

/// Headless glider flight through thermals
#[derive(Parser, Debug)]
#[command(name = "glider-headless")]
#[command(about = "Headless glider flight demo", long_about = None)]
struct Args {
    /// Flight duration in seconds
    #[arg(short, long, default_value_t = 120.0)]
    duration: f32,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 50.0)]
    tps: f32,

    /// Launch altitude in meters
    #[arg(short, long, default_value_t = 600.0)]
    altitude: f32,

    /// Launch airspeed in m/s
    #[arg(short, long, default_value_t = 24.0)]
    speed: f32,

    /// Static wind from the west in m/s
    #[arg(long, default_value_t = 2.0)]
    wind_east: f32,

    /// Static wind from the south in m/s
    #[arg(long, default_value_t = 0.0)]
    wind_north: f32,

    /// Thermals placed at random around the launch point
    #[arg(short, long, default_value_t = 6)]
    thermals: u32,

    /// Random seed for thermal placement and solar heating
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Enable the evolving wind grid
    #[arg(short, long)]
    grid: bool,

    /// Enable solar heating to release new thermals
    #[arg(long)]
    sun: bool,

    /// Constant roll input (positive banks right)
    #[arg(long, default_value_t = 0.0)]
    roll: f32,

    /// Constant elevator input (positive pitches nose down)
    #[arg(long, default_value_t = 0.0)]
    elevator: f32,

    /// Run the sustainer from launch
    #[arg(long)]
    motor: bool,

    /// Report interval in seconds
    #[arg(short, long, default_value_t = 5.0)]
    report_interval: f32,
}

/// Semi-implicit Euler rigid body with a scalar inertia.
struct Body {
    state: AircraftState,
    force: Vec3,
    torque: Vec3,
    inertia: f32,
    angular_damping: f32,
}

impl Body {
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

impl RigidBody for Body {
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

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    println!("=== Glider Simulation Demo ===\n");

    let static_wind = Vec3::new(args.wind_east, 0.0, args.wind_north);
    let config = SimulationConfig {
        ticks_per_second: args.tps,
        static_wind,
        grid: args.grid.then(|| FluidGridConfig {
            origin: Vec3::new(-2000.0, 0.0, -2000.0),
            width: 4000.0,
            height: 2000.0,
            cell_width: 200.0,
            cell_height: 100.0,
            initial_cell: glider_sim_core::Cell {
                wind: static_wind * 0.5,
                ..glider_sim_core::Cell::default()
            },
            ..FluidGridConfig::default()
        }),
        spawner: args.sun.then(|| ThermalSpawnerConfig {
            seed: args.seed,
            prevailing_wind: static_wind,
            ..ThermalSpawnerConfig::default()
        }),
        ..SimulationConfig::default()
    };

    let mut sim = match GliderSimulation::new(config) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    for _ in 0..args.thermals {
        let params = ThermalParams {
            origin: Vec3::new(
                rng.random_range(-1500.0..=1500.0),
                0.0,
                rng.random_range(-500.0..=2500.0),
            ),
            prevailing_wind: static_wind,
            vertical_speed: rng.random_range(1.5..=4.5),
            radius: rng.random_range(40.0..=120.0),
            lifetime_s: args.duration * 2.0,
            ..ThermalParams::default()
        };
        match Thermal::new(params) {
            Ok(thermal) => sim.wind_mut().add_source(thermal),
            Err(err) => eprintln!("Skipping thermal: {err}"),
        }
    }
    println!(
        "Placed {} thermals, static wind ({:.1}, {:.1}) m/s, grid: {}, sun: {}\n",
        sim.wind().sources().len(),
        static_wind.x,
        static_wind.z,
        args.grid,
        args.sun
    );

    let mut body = Body {
        state: AircraftState {
            position: Vec3::new(0.0, args.altitude, 0.0),
            velocity: Vec3::new(0.0, 0.0, args.speed),
            ..AircraftState::default()
        },
        force: Vec3::zeros(),
        torque: Vec3::zeros(),
        inertia: 2000.0,
        angular_damping: 2.0,
    };

    let targets = ControlTargets::default()
        .with_roll(args.roll)
        .with_elevator(args.elevator);
    let dt = sim.dt();
    let total_ticks = (args.duration / dt).round() as u64;
    let report_every = ((args.report_interval / dt).round() as u64).max(1);

    println!(
        "{:>7} {:>8} {:>7} {:>7} {:>7} {:>7} {:>8} {:>6}",
        "time", "alt", "ias", "gs", "vario", "te", "L/D", "batt"
    );

    let mut landed = false;
    for tick in 0..total_ticks {
        let mut frame_targets = targets;
        frame_targets.toggle_sustainer = args.motor && tick == 0;

        let report = sim.tick(&body.state, &frame_targets);
        report.forces.apply_to(&mut body);
        body.integrate(dt);

        if tick % report_every == 0 {
            print_row(sim.simulation_time(), &report.telemetry);
        }
        if body.state.position.y <= 0.0 {
            landed = true;
            break;
        }
    }

    println!();
    if landed {
        println!("Landed after {:.1}s", sim.simulation_time());
    } else {
        println!("Still airborne after {:.1}s", sim.simulation_time());
    }
    let p = body.state.position;
    println!(
        "Final position ({:.0}, {:.0}, {:.0}), {} wind sources active",
        p.x,
        p.y,
        p.z,
        sim.wind().sources().len()
    );
    if let Some(spawner) = sim.spawner() {
        println!("Solar heating released {} thermals", spawner.spawned());
    }
}

fn print_row(time: f32, t: &Telemetry) {
    let vario = t.climb_rate.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
    let te = t
        .compensated_climb
        .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
    let glide = match t.glide_ratio {
        GlideRatio::Climbing => "climb".to_string(),
        GlideRatio::Unknown => "-".to_string(),
        GlideRatio::Ratio(r) => format!("{r:.1}"),
    };
    println!(
        "{:>7.1} {:>8.1} {:>7.1} {:>7.1} {:>7} {:>7} {:>8} {:>5.0}%",
        time,
        t.altitude,
        t.airspeed,
        t.ground_speed,
        vario,
        te,
        glide,
        t.battery_fraction * 100.0
    );
}
