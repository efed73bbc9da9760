use serde::{Deserialize, Serialize};

/// Minimum gap kept between node outlines by spaced placement.
pub const MIN_CLEARANCE: f64 = 30.0;

/// Constants of the physical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Inverse-square constant between unconnected nodes.
    pub repulsion_constant: f64,
    /// Inverse-square constant between a node and each canvas side.
    pub side_repulsion_constant: f64,
    pub spring_constant: f64,
    /// Separation a spring pulls its endpoints towards.
    pub ideal_edge_length: f64,
    /// Magnitude of the jitter applied to coincident nodes at iteration 1.
    pub collision_constant: f64,
    pub sides_repel: bool,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion_constant: 10_000.0,
            side_repulsion_constant: 1_000.0,
            spring_constant: 1.0,
            ideal_edge_length: MIN_CLEARANCE * 3.0,
            collision_constant: 1.0,
            sides_repel: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Run to completion inside a single call.
    #[default]
    Batch,
    /// One iteration per tick.
    Animated,
    /// Solve without exposing intermediate frames, then glide from the
    /// start snapshot to the result.
    SlideToEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub forces: ForceConfig,
    /// Largest per-node displacement still considered "moving".
    pub epsilon: f64,
    /// Forces at iteration `t` are scaled by `cooling_base^t`.
    pub cooling_base: f64,
    pub max_iterations: u64,
    pub mode: ExecutionMode,
    pub slide_frame_count: u32,
    /// Suggested delay between ticks for schedulers driving the engine.
    pub frame_interval_ms: u64,
    /// Scatter nodes randomly before the first iteration.
    pub randomize_initial: bool,
    /// Seed for every random decision of a run; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            forces: ForceConfig::default(),
            epsilon: 0.05,
            cooling_base: 0.99999,
            max_iterations: 1_000_000_000,
            mode: ExecutionMode::Batch,
            slide_frame_count: 3000,
            frame_interval_ms: 1,
            randomize_initial: true,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check every tunable, returning a description of the first bad one.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("repulsion_constant", self.forces.repulsion_constant),
            ("side_repulsion_constant", self.forces.side_repulsion_constant),
            ("spring_constant", self.forces.spring_constant),
            ("ideal_edge_length", self.forces.ideal_edge_length),
            ("collision_constant", self.forces.collision_constant),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(format!("epsilon must be non-negative, got {}", self.epsilon));
        }
        if !(self.cooling_base > 0.0 && self.cooling_base < 1.0) {
            return Err(format!(
                "cooling_base must lie in (0, 1), got {}",
                self.cooling_base
            ));
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        if self.slide_frame_count == 0 {
            return Err("slide_frame_count must be at least 1".to_string());
        }
        Ok(())
    }

    /// Multiplier applied to forces at `iteration`.
    pub fn cooling_factor(&self, iteration: u64) -> f64 {
        cooling_factor(self.cooling_base, iteration)
    }
}

/// `base^iteration`, strictly decreasing towards 0 for `0 < base < 1`.
pub fn cooling_factor(base: f64, iteration: u64) -> f64 {
    match i32::try_from(iteration) {
        Ok(t) => base.powi(t),
        Err(_) => base.powf(iteration as f64),
    }
}
