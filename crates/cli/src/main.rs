use std::path::PathBuf;

use analysis::{ComfortReport, ComfortTargets};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use controller::{presets, FuzzyController, LinguisticVariable};
use sim::{
    Actuator, Actuators, FallbackPolicy, Quantity, SensorReadings, SimConfig, Simulation, Trace,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Emit {
    /// One JSON object per timestep
    Trace,
    /// Comfort report and action statistics
    Summary,
    /// Membership curves of the controllers and the charting reference
    Membership,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Fallback {
    Hold,
    Zero,
}

#[derive(Parser, Debug)]
#[command(
    name = "fuzzy-climate-sim",
    version,
    about = "Closed-loop fuzzy climate control simulation"
)]
struct Args {
    /// TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated duration in hours
    #[arg(long)]
    hours: Option<f64>,

    /// Time resolution in minutes
    #[arg(long)]
    resolution_minutes: Option<f64>,

    /// RNG seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Re-evaluate the controllers every N steps
    #[arg(long)]
    update_interval: Option<usize>,

    /// Action recorded when a controller reaches no consensus
    #[arg(value_enum, long)]
    fallback: Option<Fallback>,

    /// Force the heating action to a fixed value in [-10, 10]
    #[arg(long, allow_hyphen_values = true)]
    pin_heating: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pin_dehumidifier: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pin_ventilation: Option<f64>,

    #[arg(value_enum, long, default_value = "trace")]
    emit: Emit,
}

#[derive(serde::Serialize)]
struct TraceRow {
    t_h: f64,
    temperature: f64,
    humidity: f64,
    moisture: f64,
    temperature_base: f64,
    humidity_base: f64,
    moisture_base: f64,
    smoothed: SensorReadings,
    dehumidifier: f64,
    ventilation: f64,
    heating: f64,
    recomputed: bool,
    fallback: Vec<String>,
}

#[derive(serde::Serialize)]
struct ActionStats {
    mean: f64,
    min: f64,
    max: f64,
    fallbacks: usize,
}

#[derive(serde::Serialize)]
struct Summary {
    steps: usize,
    comfort: ComfortReport,
    actions: Actuators<ActionStats>,
}

#[derive(serde::Serialize)]
struct Curves {
    variable: String,
    sets: Vec<(String, Vec<(f64, f64)>)>,
}

#[derive(serde::Serialize)]
struct ControllerCurves {
    controller: String,
    inputs: Vec<Curves>,
    output: Curves,
}

#[derive(serde::Serialize)]
struct Membership {
    controllers: Vec<ControllerCurves>,
    plot_reference: Vec<Curves>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = build_config(&args)?;
    let sim = Simulation::standard(config).context("building simulation")?;

    match args.emit {
        Emit::Membership => {
            let doc = membership(&sim)?;
            println!("{}", serde_json::to_string(&doc)?);
        }
        Emit::Trace => {
            let (trace, _) = run(&sim)?;
            for s in &trace.steps {
                let fallback = Actuator::ALL
                    .iter()
                    .filter(|a| a.of(&s.fallbacks))
                    .map(|a| a.to_string())
                    .collect();
                let row = TraceRow {
                    t_h: s.time_h,
                    temperature: s.updated.temperature,
                    humidity: s.updated.humidity,
                    moisture: s.updated.moisture,
                    temperature_base: s.base.temperature,
                    humidity_base: s.base.humidity,
                    moisture_base: s.base.moisture,
                    smoothed: s.smoothed,
                    dehumidifier: s.actions.dehumidifier,
                    ventilation: s.actions.ventilation,
                    heating: s.actions.heating,
                    recomputed: s.recomputed,
                    fallback,
                };
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Emit::Summary => {
            let (trace, report) = run(&sim)?;
            let actuators = Actuators {
                dehumidifier: Actuator::Dehumidifier,
                ventilation: Actuator::Ventilation,
                heating: Actuator::Heating,
            };
            let summary = Summary {
                steps: trace.len(),
                comfort: report,
                actions: actuators.map(|a| action_stats(&trace, a)),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Runs the loop and logs how each quantity fared against its comfort band.
fn run(sim: &Simulation) -> Result<(Trace, ComfortReport)> {
    let disturbances = sim.disturbances().context("generating disturbances")?;
    let trace = sim.run(&disturbances)?;
    let report = ComfortReport::evaluate(
        &ComfortTargets::default(),
        &trace.time(),
        &trace.updated(Quantity::Temperature),
        &trace.updated(Quantity::Humidity),
        &trace.updated(Quantity::Moisture),
    );

    let responses = [report.temperature, report.humidity, report.moisture];
    for (q, r) in Quantity::ALL.iter().zip(responses) {
        info!(quantity = %q, rise_time_h = ?r.rise_time(), response = ?r, "comfort band");
    }
    Ok((trace, report))
}

fn init_tracing() {
    // stderr keeps stdout free for JSON
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_config(args: &Args) -> Result<SimConfig> {
    let mut cfg = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };

    if let Some(h) = args.hours {
        cfg.duration_hours = h;
    }
    if let Some(m) = args.resolution_minutes {
        cfg.resolution_minutes = m;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(n) = args.update_interval {
        cfg.update_interval = n;
    }
    if let Some(f) = args.fallback {
        cfg.fallback = match f {
            Fallback::Hold => FallbackPolicy::HoldPrevious,
            Fallback::Zero => FallbackPolicy::Zero,
        };
    }
    cfg.pinned.heating = args.pin_heating.or(cfg.pinned.heating);
    cfg.pinned.dehumidifier = args.pin_dehumidifier.or(cfg.pinned.dehumidifier);
    cfg.pinned.ventilation = args.pin_ventilation.or(cfg.pinned.ventilation);

    cfg.validate()?;
    Ok(cfg)
}

fn action_stats(trace: &Trace, a: Actuator) -> ActionStats {
    let series = trace.actions(a);
    let n = series.len().max(1) as f64;
    ActionStats {
        mean: series.iter().sum::<f64>() / n,
        min: series.iter().copied().fold(f64::INFINITY, f64::min),
        max: series.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        fallbacks: trace.fallback_count(a),
    }
}

fn curves(v: &LinguisticVariable) -> Curves {
    Curves {
        variable: v.name().to_string(),
        sets: v.sample_curves(),
    }
}

fn controller_curves(c: &FuzzyController) -> ControllerCurves {
    ControllerCurves {
        controller: c.name().to_string(),
        inputs: c.inputs().iter().map(curves).collect(),
        output: curves(c.output()),
    }
}

fn membership(sim: &Simulation) -> Result<Membership> {
    let bank = sim.controllers();
    Ok(Membership {
        controllers: [&bank.dehumidifier, &bank.ventilation, &bank.heating]
            .into_iter()
            .map(controller_curves)
            .collect(),
        plot_reference: presets::plot_reference()?.iter().map(curves).collect(),
    })
}
