mod model;
mod svg;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use graphvis_layout::{
    Canvas, CountedTicks, ExecutionMode, IntervalTicks, LayoutOutcome, Simulation, SimulationConfig, Tick,
    TickSource,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CANVAS: Canvas = Canvas::new(800.0, 600.0);

#[derive(Parser, Debug)]
#[command(name = "graphvis", version, about = "Force-directed layout of KDL graph descriptions")]
struct Args {
    /// KDL graph description
    input: PathBuf,

    /// SVG of the final layout. Defaults to stdout.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write final positions and convergence info as JSON
    #[arg(short = 'p', long)]
    positions: Option<PathBuf>,

    /// Canvas width, overriding the model
    #[arg(short = 'w', long)]
    width: Option<f64>,

    /// Canvas height, overriding the model
    #[arg(short = 'H', long)]
    height: Option<f64>,

    /// Execution mode, overriding the config file
    #[arg(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// Random seed for reproducible layouts
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Simulation config JSON; missing fields keep their defaults
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write an SVG frame per rendered tick into this directory
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Only keep every n-th frame
    #[arg(long, default_value_t = 1)]
    frame_every: u64,

    /// Keep the positions from the model instead of scattering nodes
    #[arg(long)]
    no_randomize: bool,

    /// Pace ticks at the configured frame interval
    #[arg(long)]
    realtime: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Batch,
    Animated,
    SlideToEnd,
}

impl From<Mode> for ExecutionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Batch => ExecutionMode::Batch,
            Mode::Animated => ExecutionMode::Animated,
            Mode::SlideToEnd => ExecutionMode::SlideToEnd,
        }
    }
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_randomize {
        config.randomize_initial = false;
    }
    Ok(config)
}

fn resolve_canvas(args: &Args, model: Option<Canvas>) -> Canvas {
    let base = model.unwrap_or(DEFAULT_CANVAS);
    Canvas::new(args.width.unwrap_or(base.width), args.height.unwrap_or(base.height))
}

fn write_frame(dir: &Path, index: u64, sim: &Simulation) -> Result<()> {
    let path = dir.join(format!("frame-{index:06}.svg"));
    fs::write(&path, svg::render_svg(sim.graph(), sim.canvas()))
        .with_context(|| format!("writing frame {}", path.display()))?;
    debug!(frame = index, "frame written");
    Ok(())
}

/// Tick `sim` until its run finishes, recording frames along the way.
fn run_layout(
    sim: &mut Simulation,
    ticks: &mut dyn TickSource,
    frames_dir: Option<&Path>,
    frame_every: u64,
) -> Result<LayoutOutcome> {
    let frame_every = frame_every.max(1);
    if !sim.start()? {
        bail!("layout is already running");
    }
    if let Some(dir) = frames_dir {
        write_frame(dir, 0, sim)?;
    }

    let mut count = 0;
    while ticks.next_tick() {
        count += 1;
        match sim.tick() {
            Tick::Finished(outcome) => {
                if let Some(dir) = frames_dir {
                    write_frame(dir, count, sim)?;
                }
                return Ok(outcome);
            }
            Tick::Failed(err) => return Err(err.into()),
            Tick::Idle => bail!("layout stopped unexpectedly"),
            Tick::Stepped(_) | Tick::Slid { .. } => {
                if let Some(dir) = frames_dir {
                    if count % frame_every == 0 {
                        write_frame(dir, count, sim)?;
                    }
                }
            }
        }
    }
    bail!("tick source ran dry after {count} ticks")
}

fn run(args: &Args) -> Result<()> {
    let content =
        fs::read_to_string(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let model = model::parse_model(&content).with_context(|| format!("parsing {}", args.input.display()))?;
    let config = load_config(args)?;
    let canvas = resolve_canvas(args, model.canvas);
    info!(
        nodes = model.graph.nodes.len(),
        edges = model.graph.edges.len(),
        width = canvas.width,
        height = canvas.height,
        "model loaded"
    );

    let interval = Duration::from_millis(config.frame_interval_ms);
    let mut sim = Simulation::from_data(&model.graph, canvas, config)?;

    if let Some(dir) = &args.frames_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut ticks: Box<dyn TickSource> = if args.realtime {
        Box::new(IntervalTicks::new(interval))
    } else {
        Box::new(CountedTicks::new(u64::MAX))
    };
    let outcome = run_layout(&mut sim, ticks.as_mut(), args.frames_dir.as_deref(), args.frame_every)?;

    let rendered = svg::render_svg(sim.graph(), &canvas);
    match &args.output {
        Some(path) => fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().write_all(rendered.as_bytes())?,
    }
    if let Some(path) = &args.positions {
        let json = serde_json::to_string_pretty(&outcome)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    run(&args)
}
