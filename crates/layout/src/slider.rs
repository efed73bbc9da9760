//! Snapshot interpolation.
//!
//! A [`Slider`] glides every node from a captured start snapshot to an end
//! snapshot over a fixed number of frames. Each frame moves a node by its
//! remaining distance divided by the frames left, measured from where the
//! node is now, so motion eases out and the last frame lands exactly on
//! the target.

use tracing::debug;

use crate::bounds::move_within_bounds;
use crate::graph::Graph;
use crate::types::{Canvas, Vector2};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SliderError {
    #[error("start snapshot has {start} positions but end snapshot has {end}")]
    LengthMismatch { start: usize, end: usize },
    #[error("snapshots hold {snapshot} positions but the graph has {nodes} nodes")]
    GraphMismatch { snapshot: usize, nodes: usize },
    #[error("a slide needs at least one frame")]
    NoFrames,
}

/// Result of advancing a slide by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideFrame {
    /// Frame `n` of `total` was applied and more remain.
    Moved { frame: u32, total: u32 },
    /// The final frame was applied; nodes sit on the end snapshot.
    Finished,
    /// Nothing left to do.
    Done,
}

type EndAction = Box<dyn FnMut()>;

pub struct Slider {
    start: Vec<Vector2>,
    end: Vec<Vector2>,
    frames: u32,
    frame: u32,
    bounds: Option<Canvas>,
    on_end: Option<EndAction>,
}

impl std::fmt::Debug for Slider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slider")
            .field("nodes", &self.start.len())
            .field("frames", &self.frames)
            .field("frame", &self.frame)
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl Slider {
    pub fn new(start: Vec<Vector2>, end: Vec<Vector2>, frames: u32) -> Result<Self, SliderError> {
        if start.len() != end.len() {
            return Err(SliderError::LengthMismatch {
                start: start.len(),
                end: end.len(),
            });
        }
        if frames == 0 {
            return Err(SliderError::NoFrames);
        }
        Ok(Self {
            start,
            end,
            frames,
            frame: 0,
            bounds: None,
            on_end: None,
        })
    }

    /// Slide from the graph's current positions to `end`.
    pub fn from_graph(graph: &Graph, end: Vec<Vector2>, frames: u32) -> Result<Self, SliderError> {
        Self::new(graph.position_snapshot(), end, frames)
    }

    /// Clamp every intermediate position to `canvas`.
    pub fn within_bounds(mut self, canvas: Canvas) -> Self {
        self.bounds = Some(canvas);
        self
    }

    /// Callback fired once when the final frame has been applied.
    pub fn on_end(mut self, action: impl FnMut() + 'static) -> Self {
        self.on_end = Some(Box::new(action));
        self
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Frames applied so far.
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= self.frames
    }

    pub fn start_snapshot(&self) -> &[Vector2] {
        &self.start
    }

    pub fn end_snapshot(&self) -> &[Vector2] {
        &self.end
    }

    fn check(&self, graph: &Graph) -> Result<(), SliderError> {
        if graph.node_count() != self.end.len() {
            return Err(SliderError::GraphMismatch {
                snapshot: self.end.len(),
                nodes: graph.node_count(),
            });
        }
        Ok(())
    }

    /// Apply the next frame to `graph`.
    pub fn tick(&mut self, graph: &mut Graph) -> Result<SlideFrame, SliderError> {
        if self.is_finished() {
            return Ok(SlideFrame::Done);
        }
        self.check(graph)?;

        let remaining = f64::from(self.frames - self.frame);
        for (i, &target) in self.end.iter().enumerate() {
            let center = graph.node_at(i).center();
            let step = center.distance_to(target) / remaining;
            let next = center.add(center.direction_to(target).scale(step));
            match &self.bounds {
                Some(canvas) => {
                    move_within_bounds(graph, i, next, canvas);
                }
                None => graph.set_center_at(i, next),
            }
        }

        self.frame += 1;
        if !self.is_finished() {
            return Ok(SlideFrame::Moved {
                frame: self.frame,
                total: self.frames,
            });
        }

        // Land exactly on the targets regardless of rounding.
        for (i, &target) in self.end.iter().enumerate() {
            match &self.bounds {
                Some(canvas) => {
                    move_within_bounds(graph, i, target, canvas);
                }
                None => graph.set_center_at(i, target),
            }
        }
        debug!(frames = self.frames, nodes = self.end.len(), "slide finished");
        if let Some(action) = self.on_end.as_mut() {
            action();
        }
        Ok(SlideFrame::Finished)
    }

    /// Apply every remaining frame.
    pub fn run(&mut self, graph: &mut Graph) -> Result<(), SliderError> {
        while self.tick(graph)? != SlideFrame::Done {}
        Ok(())
    }

    /// Put the nodes back on the start snapshot and restart the slide.
    pub fn rewind(&mut self, graph: &mut Graph) -> Result<(), SliderError> {
        self.check(graph)?;
        for (i, &center) in self.start.iter().enumerate() {
            graph.set_center_at(i, center);
        }
        self.frame = 0;
        Ok(())
    }
}
