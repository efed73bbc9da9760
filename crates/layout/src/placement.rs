//! Random placement of nodes on the canvas.

use rand::Rng;
use tracing::{debug, warn};

use crate::bounds::move_within_bounds;
use crate::config::MIN_CLEARANCE;
use crate::graph::Graph;
use crate::types::{Canvas, Vector2};

/// Uniformly random point anywhere on the canvas.
pub fn random_point<R: Rng>(canvas: &Canvas, rng: &mut R) -> Vector2 {
    Vector2::new(
        rng.random_range(0.0..=canvas.width),
        rng.random_range(0.0..=canvas.height),
    )
}

/// Give every node the largest radius, then drop each at a random point,
/// clamped into the canvas. No spacing is enforced.
pub fn scatter<R: Rng>(graph: &mut Graph, canvas: &Canvas, rng: &mut R) {
    graph.match_largest(true);
    for i in 0..graph.node_count() {
        let point = random_point(canvas, rng);
        move_within_bounds(graph, i, point, canvas);
    }
}

/// A fresh random target for every node, leaving the nodes where they are.
/// Pair with [`crate::Slider`] to animate a shuffle without physics.
pub fn shuffle_targets<R: Rng>(graph: &Graph, canvas: &Canvas, rng: &mut R) -> Vec<Vector2> {
    graph
        .nodes()
        .map(|node| {
            let r = node.radius();
            Vector2::new(
                rng.random_range(r..=(canvas.width - r).max(r)),
                rng.random_range(r..=(canvas.height - r).max(r)),
            )
        })
        .collect()
}

/// Limits for [`spaced_scatter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacingLimits {
    /// Whole-layout retries before giving up.
    pub attempts: u32,
    /// Random positions tried per node within one attempt.
    pub moves_per_node: u32,
    /// Gap every node must keep from every other node.
    pub min_space: f64,
}

impl Default for SpacingLimits {
    fn default() -> Self {
        Self {
            attempts: 4000,
            moves_per_node: 1000,
            min_space: MIN_CLEARANCE,
        }
    }
}

fn is_valid_at(graph: &Graph, i: usize, canvas: &Canvas, min_space: f64) -> bool {
    let node = graph.node_at(i);
    graph.is_within_bounds(node, canvas) && node.is_clear_of(graph.nodes(), min_space)
}

/// Random placement that searches for a tidy layout: every node inside the
/// canvas, `min_space` away from the others, and no edge running through a
/// node it does not belong to.
///
/// Returns `true` if such a layout was found. The nodes keep the last
/// attempt either way.
pub fn spaced_scatter<R: Rng>(
    graph: &mut Graph,
    canvas: &Canvas,
    limits: SpacingLimits,
    rng: &mut R,
) -> bool {
    graph.match_largest(true);
    let n = graph.node_count();

    for attempt in 1..=limits.attempts {
        for i in 0..n {
            let point = random_point(canvas, rng);
            graph.set_center_at(i, point);
        }

        let mut can_move = true;
        for i in 0..n {
            let mut moves = 0;
            while can_move && !is_valid_at(graph, i, canvas, limits.min_space) {
                if moves == limits.moves_per_node {
                    debug!(node = graph.node_at(i).id(), "no free position, keeping the rest as placed");
                    can_move = false;
                    break;
                }
                let point = random_point(canvas, rng);
                graph.set_center_at(i, point);
                moves += 1;
            }
        }

        if can_move && !graph.any_edge_crosses_node() {
            debug!(attempt, "spaced placement found");
            return true;
        }
    }

    warn!(attempts = limits.attempts, "no spaced placement found");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn graph_of(count: u32, radius: f64) -> Graph {
        let mut graph = Graph::new();
        for id in 0..count {
            graph
                .add_node(Node::new(id, "n").with_radius(radius).unwrap())
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_scatter_keeps_nodes_inside() {
        let canvas = Canvas::new(300.0, 200.0);
        let mut graph = graph_of(20, 10.0);
        let mut rng = StdRng::seed_from_u64(11);
        scatter(&mut graph, &canvas, &mut rng);
        for node in graph.nodes() {
            assert!(graph.is_within_bounds(node, &canvas));
        }
    }

    #[test]
    fn test_scatter_uses_largest_radius() {
        let canvas = Canvas::new(300.0, 300.0);
        let mut graph = Graph::new();
        graph.add_node(Node::new(0, "a").with_radius(4.0).unwrap()).unwrap();
        graph.add_node(Node::new(1, "b").with_radius(9.0).unwrap()).unwrap();
        scatter(&mut graph, &canvas, &mut StdRng::seed_from_u64(2));
        assert!(graph.nodes().all(|n| n.radius() == 9.0));
    }

    #[test]
    fn test_shuffle_targets_leaves_nodes() {
        let canvas = Canvas::new(100.0, 100.0);
        let graph = graph_of(5, 10.0);
        let targets = shuffle_targets(&graph, &canvas, &mut StdRng::seed_from_u64(5));
        assert_eq!(targets.len(), 5);
        assert!(targets.iter().all(|t| t.x >= 10.0 && t.x <= 90.0 && t.y >= 10.0 && t.y <= 90.0));
        assert!(graph.nodes().all(|n| n.center() == Vector2::ZERO));
    }

    #[test]
    fn test_spaced_scatter_finds_layout_on_roomy_canvas() {
        let canvas = Canvas::new(1000.0, 1000.0);
        let mut graph = graph_of(4, 10.0);
        graph.connect(0, 1, false).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        assert!(spaced_scatter(&mut graph, &canvas, SpacingLimits::default(), &mut rng));
        for i in 0..graph.node_count() {
            assert!(is_valid_at(&graph, i, &canvas, MIN_CLEARANCE));
        }
    }

    #[test]
    fn test_spaced_scatter_gives_up_when_crowded() {
        let canvas = Canvas::new(60.0, 60.0);
        let mut graph = graph_of(3, 25.0);
        let limits = SpacingLimits {
            attempts: 3,
            moves_per_node: 10,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        assert!(!spaced_scatter(&mut graph, &canvas, limits, &mut rng));
    }
}
