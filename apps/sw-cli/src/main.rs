use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use sw_core::units::radians_to_degrees;
use sw_sim::{SimResult, Simulation, SwitchConfig, ToleranceReport, ToleranceStrategy};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sw-cli")]
#[command(about = "Balance switch equilibrium and tolerance calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reference configuration as YAML
    Defaults,
    /// Place robots on the switch and report angle, level status and tolerances
    Evaluate {
        /// Configuration YAML file (reference values if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Robot as MASS@X (pounds at inches from the pivot), in slot order
        #[arg(short, long = "robot", value_parser = parse_robot)]
        robots: Vec<RobotPlacement>,
        /// Find tolerance edges by bisection only
        #[arg(long)]
        bisect: bool,
    },
}

#[derive(Clone, Copy, Debug)]
struct RobotPlacement {
    mass: f64,
    x: f64,
}

fn parse_robot(arg: &str) -> Result<RobotPlacement, String> {
    let (mass, x) = arg
        .split_once('@')
        .ok_or_else(|| format!("expected MASS@X, got '{arg}'"))?;
    let mass = mass
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad mass '{mass}': {e}"))?;
    let x = x
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad position '{x}': {e}"))?;
    if !(mass.is_finite() && x.is_finite()) {
        return Err(format!("non-finite value in '{arg}'"));
    }
    Ok(RobotPlacement { mass, x })
}

fn main() -> SimResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Defaults => cmd_defaults(),
        Commands::Evaluate {
            config,
            robots,
            bisect,
        } => cmd_evaluate(config.as_deref(), &robots, bisect),
    }
}

fn cmd_defaults() -> SimResult<()> {
    print!("{}", SwitchConfig::default().to_yaml_string()?);
    Ok(())
}

fn cmd_evaluate(config_path: Option<&Path>, robots: &[RobotPlacement], bisect: bool) -> SimResult<()> {
    let config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            SwitchConfig::load_yaml(path)?
        }
        None => SwitchConfig::default(),
    };

    let max_weight = config.max_robot_weight;
    let half = config.half_handle();
    let mut sim = Simulation::new(config)?;

    for (i, robot) in robots.iter().enumerate() {
        // The simulation takes values as given; keep them in the physical range here
        let mass = robot.mass.clamp(0.0, max_weight);
        let x = robot.x.clamp(-half, half);
        if mass != robot.mass || x != robot.x {
            println!("robot {}: clamped to {mass}@{x}", i + 1);
        }
        sim.place_robot(i, mass, x)?;
    }

    let strategy = if bisect {
        ToleranceStrategy::Bisection
    } else {
        ToleranceStrategy::ClosedFormFirst
    };

    match sim.equilibrium_angle() {
        Some(angle) => println!(
            "Equilibrium angle: {:.4} rad ({:.3}°)",
            angle,
            radians_to_degrees(angle)
        ),
        None => println!("Equilibrium angle: undefined"),
    }
    println!("Level: {}", if sim.is_level() { "yes" } else { "no" });

    for i in 0..sim.robot_count() {
        let robot = *sim.robot(i)?;
        let mass = robot.mass(sim.graph());
        let x = robot.relative_position(sim.graph()).x;
        let report = sim.tolerance_with(i, strategy)?;
        println!("Robot {}: {mass} lb @ {x} in", i + 1);
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ToleranceReport) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "undefined".to_string(), |v| format!("{v:.4}"));
    println!("  tolerance: -{} / +{}", fmt(report.minus), fmt(report.plus));
    println!("  ideal x:   {}", fmt(report.ideal_x));
}
