//! Force-directed layout for small graphs.
//!
//! Nodes are circles on a bounded canvas. Unconnected nodes push each
//! other apart, edges pull their ends toward an ideal length, and the
//! canvas sides push nodes inward. A [`Simulation`] integrates those
//! forces until the layout settles, either in one call, one iteration per
//! tick, or as a solve followed by a smooth slide to the result.
//!
//! ```ignore
//! use graphvis_layout::*;
//!
//! let mut graph = Graph::new();
//! graph.add_node(Node::new(0, "a").with_radius(20.0)?)?;
//! graph.add_node(Node::new(1, "b").with_radius(20.0)?)?;
//! graph.connect(0, 1, false)?;
//!
//! let mut sim = Simulation::new(graph, Canvas::new(800.0, 600.0), SimulationConfig::default())?;
//! let outcome = sim.run()?;
//! ```

mod bounds;
mod config;
mod error;
mod forces;
mod graph;
mod placement;
mod simulation;
mod slider;
mod tick;
mod types;

pub use bounds::{clamp_center, fits, move_within_bounds};
pub use config::{ExecutionMode, ForceConfig, MIN_CLEARANCE, SimulationConfig, cooling_factor};
pub use error::{LayoutError, Result};
pub use forces::{collision_jitter, compute_forces, repulsion_between, side_repulsion, spring_between};
pub use graph::{
    CHAR_WIDTH, Edge, EdgeSpec, Graph, GraphData, GraphError, NODE_PADDING, Node, NodeEvent, NodeSpec,
    estimate_radius, node_id, outline_point,
};
pub use placement::{SpacingLimits, random_point, scatter, shuffle_targets, spaced_scatter};
pub use simulation::{LayoutOutcome, RunState, Simulation, StepReport, Tick};
pub use slider::{SlideFrame, Slider, SliderError};
pub use tick::{CountedTicks, IntervalTicks, TickSource};
pub use types::{Canvas, NodeId, Vector2};
