//! Simulation driver.
//!
//! A [`Simulation`] owns the graph for the length of a run and moves
//! between two states, `Idle` and `Running`. Every call is synchronous and
//! short: an external scheduler decides when the next [`Simulation::tick`]
//! happens, and stopping that scheduler simply leaves the run paused.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, trace, warn};

use crate::bounds::{fits, move_within_bounds};
use crate::config::{ExecutionMode, SimulationConfig};
use crate::error::{LayoutError, Result};
use crate::forces::compute_forces;
use crate::graph::{Graph, GraphData};
use crate::placement::scatter;
use crate::slider::{SlideFrame, Slider};
use crate::tick::TickSource;
use crate::types::{Canvas, NodeId, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Movement produced by a single iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub iteration: u64,
    pub max_displacement: f64,
}

/// Final positions of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOutcome {
    pub positions: BTreeMap<NodeId, Vector2>,
    /// `false` when `max_iterations` ran out before the layout settled.
    pub converged: bool,
    pub iterations: u64,
}

/// What a single [`Simulation::tick`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// One physics iteration ran and the layout is still moving.
    Stepped(StepReport),
    /// One frame of the closing slide was applied.
    Slid { frame: u32, total: u32 },
    /// The run completed and the driver is idle again.
    Finished(LayoutOutcome),
    /// No run in progress.
    Idle,
    /// The run could not continue and was aborted.
    Failed(LayoutError),
}

type StepHook = Box<dyn FnMut(u64, f64)>;
type CompleteHook = Box<dyn FnMut(&LayoutOutcome)>;

pub struct Simulation {
    graph: Graph,
    canvas: Canvas,
    config: SimulationConfig,
    rng: StdRng,
    state: RunState,
    iteration: u64,
    converged: bool,
    frozen: bool,
    slide: Option<Slider>,
    on_step: Option<StepHook>,
    on_complete: Option<CompleteHook>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("graph", &self.graph)
            .field("canvas", &self.canvas)
            .field("mode", &self.config.mode)
            .field("state", &self.state)
            .field("iteration", &self.iteration)
            .field("frozen", &self.frozen)
            .finish()
    }
}

impl Simulation {
    pub fn new(graph: Graph, canvas: Canvas, config: SimulationConfig) -> Result<Self> {
        config.validate().map_err(LayoutError::InvalidConfig)?;
        if !canvas.is_valid() {
            return Err(LayoutError::InvalidCanvas {
                width: canvas.width,
                height: canvas.height,
            });
        }
        check_fits(&graph, &canvas)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            graph,
            canvas,
            config,
            rng,
            state: RunState::Idle,
            iteration: 0,
            converged: false,
            frozen: false,
            slide: None,
            on_step: None,
            on_complete: None,
        })
    }

    /// Validate loader records and build a simulation over them.
    pub fn from_data(data: &GraphData, canvas: Canvas, config: SimulationConfig) -> Result<Self> {
        Self::new(Graph::from_data(data)?, canvas, config)
    }

    /// Called after every iteration with the iteration number and the
    /// largest displacement. Not called while the layout is frozen.
    pub fn set_on_step(&mut self, hook: impl FnMut(u64, f64) + 'static) {
        self.on_step = Some(Box::new(hook));
    }

    /// Called once each time a run finishes.
    pub fn set_on_complete(&mut self, hook: impl FnMut(&LayoutOutcome) + 'static) {
        self.on_complete = Some(Box::new(hook));
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the graph, only between runs. Nodes added here
    /// are checked against the canvas by the next [`Simulation::start`].
    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        match self.state {
            RunState::Idle => Some(&mut self.graph),
            RunState::Running => None,
        }
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// True while a slide-to-end run is solving out of sight.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current positions, whether or not a run is in progress.
    pub fn outcome(&self) -> LayoutOutcome {
        LayoutOutcome {
            positions: self.graph.nodes().map(|n| (n.id(), n.center())).collect(),
            converged: self.converged,
            iterations: self.iteration,
        }
    }

    /// Begin a run. Returns `false` and changes nothing if one is already
    /// in progress. Fails if a node no longer fits the canvas.
    pub fn start(&mut self) -> Result<bool> {
        if self.is_running() {
            debug!("layout already running, start ignored");
            return Ok(false);
        }
        check_fits(&self.graph, &self.canvas)?;
        self.state = RunState::Running;
        self.iteration = 0;
        self.converged = false;
        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            mode = ?self.config.mode,
            "layout started"
        );

        if self.config.randomize_initial {
            scatter(&mut self.graph, &self.canvas, &mut self.rng);
        } else {
            for i in 0..self.graph.node_count() {
                let center = self.graph.node_at(i).center();
                move_within_bounds(&mut self.graph, i, center, &self.canvas);
            }
        }

        if self.config.mode == ExecutionMode::SlideToEnd {
            if let Err(err) = self.prepare_slide() {
                self.abort();
                return Err(err);
            }
        }
        Ok(true)
    }

    /// Solve with the graph frozen, then rewind it and set up the slide
    /// from the start snapshot to the solved positions.
    fn prepare_slide(&mut self) -> Result<()> {
        let start = self.graph.position_snapshot();
        let listener = self.graph.take_listener();
        self.frozen = true;
        self.solve();
        self.frozen = false;
        let end = self.graph.position_snapshot();
        for (i, &center) in start.iter().enumerate() {
            self.graph.set_center_at(i, center);
        }
        self.graph.restore_listener(listener);

        debug!(
            frames = self.config.slide_frame_count,
            iterations = self.iteration,
            "sliding to solved layout"
        );
        self.slide = Some(Slider::new(start, end, self.config.slide_frame_count)?);
        Ok(())
    }

    /// Run one physics iteration over the whole graph.
    fn iterate(&mut self) -> StepReport {
        self.iteration += 1;
        let forces = compute_forces(
            &self.graph,
            &self.canvas,
            &self.config.forces,
            self.iteration,
            &mut self.rng,
        );
        let cooling = self.config.cooling_factor(self.iteration);

        let mut max_displacement: f64 = 0.0;
        for (i, force) in forces.into_iter().enumerate() {
            let center = self.graph.node_at(i).center();
            let moved = move_within_bounds(&mut self.graph, i, center.add(force.scale(cooling)), &self.canvas);
            max_displacement = max_displacement.max(moved);
        }

        trace!(iteration = self.iteration, max_displacement, "iteration");
        if !self.frozen {
            if let Some(hook) = self.on_step.as_mut() {
                hook(self.iteration, max_displacement);
            }
        }
        StepReport {
            iteration: self.iteration,
            max_displacement,
        }
    }

    fn is_settled(&mut self, report: &StepReport) -> bool {
        if report.max_displacement <= self.config.epsilon {
            self.converged = true;
            return true;
        }
        report.iteration >= self.config.max_iterations
    }

    /// Iterate until the layout settles or the iteration budget runs out.
    fn solve(&mut self) {
        loop {
            let report = self.iterate();
            if self.is_settled(&report) {
                break;
            }
        }
    }

    fn finish(&mut self) -> LayoutOutcome {
        self.state = RunState::Idle;
        self.slide = None;
        let outcome = self.outcome();
        if outcome.converged {
            info!(iterations = outcome.iterations, "layout converged");
        } else {
            warn!(
                iterations = outcome.iterations,
                epsilon = self.config.epsilon,
                "layout stopped at the iteration limit without converging"
            );
        }
        if let Some(hook) = self.on_complete.as_mut() {
            hook(&outcome);
        }
        outcome
    }

    /// Advance the current run by one unit of the configured mode: the whole
    /// solve in batch mode, one iteration when animated, one slide frame in
    /// slide-to-end mode.
    pub fn tick(&mut self) -> Tick {
        if !self.is_running() {
            return Tick::Idle;
        }
        match self.config.mode {
            ExecutionMode::Batch => {
                self.solve();
                Tick::Finished(self.finish())
            }
            ExecutionMode::Animated => {
                let report = self.iterate();
                if self.is_settled(&report) {
                    Tick::Finished(self.finish())
                } else {
                    Tick::Stepped(report)
                }
            }
            ExecutionMode::SlideToEnd => {
                let frame = match self.slide.as_mut() {
                    Some(slider) => slider.tick(&mut self.graph),
                    None => Ok(SlideFrame::Done),
                };
                match frame {
                    Ok(SlideFrame::Moved { frame, total }) => Tick::Slid { frame, total },
                    Ok(SlideFrame::Finished | SlideFrame::Done) => Tick::Finished(self.finish()),
                    Err(err) => {
                        warn!(%err, "slide failed, layout aborted");
                        self.abort();
                        Tick::Failed(err.into())
                    }
                }
            }
        }
    }

    /// Start a run and tick it to completion.
    pub fn run(&mut self) -> Result<LayoutOutcome> {
        if !self.start()? {
            return Err(LayoutError::AlreadyRunning);
        }
        loop {
            match self.tick() {
                Tick::Finished(outcome) => return Ok(outcome),
                Tick::Failed(err) => return Err(err),
                Tick::Idle => return Ok(self.outcome()),
                Tick::Stepped(_) | Tick::Slid { .. } => {}
            }
        }
    }

    /// Tick the run for as long as `ticks` keeps producing ticks, starting
    /// one first if idle. Returns `None` if the source stopped before the
    /// run finished; calling again resumes where it left off.
    pub fn drive<T: TickSource + ?Sized>(&mut self, ticks: &mut T) -> Result<Option<LayoutOutcome>> {
        if !self.is_running() {
            self.start()?;
        }
        while ticks.next_tick() {
            match self.tick() {
                Tick::Finished(outcome) => return Ok(Some(outcome)),
                Tick::Failed(err) => return Err(err),
                _ => {}
            }
        }
        Ok(None)
    }

    /// Abandon the current run without firing the completion hook. Nodes
    /// stay where the last tick left them.
    pub fn abort(&mut self) {
        if self.is_running() {
            debug!(iteration = self.iteration, "layout aborted");
        }
        self.state = RunState::Idle;
        self.slide = None;
        self.frozen = false;
    }
}

/// Every node must fit the canvas at its own and at its current radius.
fn check_fits(graph: &Graph, canvas: &Canvas) -> Result<()> {
    for node in graph.nodes() {
        let radius = node.radius().max(node.base_radius());
        if !fits(canvas, radius) {
            return Err(LayoutError::NodeTooLarge {
                id: node.id(),
                radius,
                width: canvas.width,
                height: canvas.height,
            });
        }
    }
    Ok(())
}
