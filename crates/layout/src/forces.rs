//! Force model.
//!
//! Connected nodes are joined by logarithmic springs, every other pair
//! repels with an inverse-square law, and each canvas side repels like a
//! point charge sitting at the node's perpendicular projection onto it.
//! Forces for a whole iteration are computed from one consistent snapshot
//! of positions before anything moves.

use rand::Rng;

use crate::config::ForceConfig;
use crate::graph::Graph;
use crate::types::{Canvas, Vector2};

/// Inverse-square push on `on`, directed away from `source`.
///
/// Returns zero when the two points coincide; callers that care about that
/// case substitute [`collision_jitter`].
pub fn repulsion_between(source: Vector2, on: Vector2, constant: f64) -> Vector2 {
    let distance = source.distance_to(on);
    if distance == 0.0 {
        return Vector2::ZERO;
    }
    source
        .direction_to(on)
        .scale(constant / (distance * distance))
}

/// Logarithmic spring acting on the node at `on`, anchored at `other`.
/// Attractive beyond `ideal_length`, repulsive inside it, zero at it.
pub fn spring_between(on: Vector2, other: Vector2, constant: f64, ideal_length: f64) -> Vector2 {
    let distance = on.distance_to(other);
    if distance == 0.0 {
        return Vector2::ZERO;
    }
    on.direction_to(other)
        .scale(constant * (distance / ideal_length).ln())
}

/// Combined push of the four canvas sides on a node centred at `center`.
pub fn side_repulsion(center: Vector2, canvas: &Canvas, constant: f64) -> Vector2 {
    let sides = [
        Vector2::new(center.x, 0.0),
        Vector2::new(center.x, canvas.height),
        Vector2::new(0.0, center.y),
        Vector2::new(canvas.width, center.y),
    ];
    sides
        .into_iter()
        .map(|side| repulsion_between(side, center, constant))
        .fold(Vector2::ZERO, Vector2::add)
}

/// Random force of magnitude `constant / iteration` used when two centres
/// coincide. Iterations are numbered from 1.
pub fn collision_jitter<R: Rng>(rng: &mut R, iteration: u64, constant: f64) -> Vector2 {
    let magnitude = constant / iteration.max(1) as f64;
    loop {
        let direction = Vector2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0));
        if direction.magnitude() > 0.0 {
            return direction.normalize().scale(magnitude);
        }
    }
}

/// Net force on every node, in node order, for `iteration`.
pub fn compute_forces<R: Rng>(
    graph: &Graph,
    canvas: &Canvas,
    config: &ForceConfig,
    iteration: u64,
    rng: &mut R,
) -> Vec<Vector2> {
    let centers = graph.position_snapshot();
    let n = centers.len();
    let mut forces = vec![Vector2::ZERO; n];

    for i in 0..n {
        let mut force = Vector2::ZERO;
        for j in 0..n {
            if i == j {
                continue;
            }
            let (on, other) = (centers[i], centers[j]);
            force += if on == other {
                collision_jitter(rng, iteration, config.collision_constant)
            } else if graph.are_connected_at(i, j) {
                spring_between(on, other, config.spring_constant, config.ideal_edge_length)
            } else {
                repulsion_between(other, on, config.repulsion_constant)
            };
        }
        if config.sides_repel {
            force += side_repulsion(centers[i], canvas, config.side_repulsion_constant);
        }
        forces[i] = force;
    }

    forces
}
