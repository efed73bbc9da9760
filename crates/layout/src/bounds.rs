//! Bounded position updates.
//!
//! Every node movement performed by the engine goes through
//! [`move_within_bounds`], which keeps the whole bounding circle inside the
//! canvas: `r <= x <= width - r` and `r <= y <= height - r`.

use crate::graph::{Graph, Node, outline_point};
use crate::types::{Canvas, Vector2};

/// Clamp `proposed` so that a circle of the node's radius centred there
/// stays inside `canvas`.
pub fn clamp_center(node: &Node, proposed: Vector2, canvas: &Canvas) -> Vector2 {
    let r = node.radius();
    let Vector2 { mut x, mut y } = proposed;

    let center = proposed;
    if y <= 0.0 || outline_point(center, r, Vector2::new(x, 0.0)).y <= 0.0 {
        y = r;
    } else if y >= canvas.height
        || outline_point(center, r, Vector2::new(x, canvas.height)).y >= canvas.height
    {
        y = far_side_center(canvas.height, r);
    }

    // Horizontal sides are probed from the vertically clamped centre.
    let center = Vector2::new(x, y);
    if x <= 0.0 || outline_point(center, r, Vector2::new(0.0, y)).x <= 0.0 {
        x = r;
    } else if x >= canvas.width
        || outline_point(center, r, Vector2::new(canvas.width, y)).x >= canvas.width
    {
        x = far_side_center(canvas.width, r);
    }

    Vector2::new(x, y)
}

/// Largest centre coordinate with `center + r <= limit`. Plain `limit - r`
/// can round up by one ulp.
fn far_side_center(limit: f64, r: f64) -> f64 {
    let mut center = limit - r;
    while center > 0.0 && center + r > limit {
        center = f64::from_bits(center.to_bits() - 1);
    }
    center
}

/// Move the node at position `i` towards `proposed`, clamped to the canvas.
/// Returns how far the centre actually travelled.
pub fn move_within_bounds(graph: &mut Graph, i: usize, proposed: Vector2, canvas: &Canvas) -> f64 {
    let node = graph.node_at(i);
    let start = node.center();
    let end = clamp_center(node, proposed, canvas);
    graph.set_center_at(i, end);
    start.distance_to(end)
}

/// True if a circle of `radius` fits inside the canvas at all.
pub fn fits(canvas: &Canvas, radius: f64) -> bool {
    2.0 * radius <= canvas.width && 2.0 * radius <= canvas.height
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(radius: f64) -> Node {
        Node::new(0, "n").with_radius(radius).unwrap()
    }

    fn assert_contained(center: Vector2, r: f64, canvas: &Canvas) {
        assert!(center.x - r >= 0.0, "left edge crossed: {center}");
        assert!(center.y - r >= 0.0, "top edge crossed: {center}");
        assert!(center.x + r <= canvas.width, "right edge crossed: {center}");
        assert!(center.y + r <= canvas.height, "bottom edge crossed: {center}");
    }

    #[test]
    fn test_origin_clamps_to_radius() {
        let canvas = Canvas::new(100.0, 100.0);
        let n = node(7.5);
        assert_eq!(clamp_center(&n, Vector2::ZERO, &canvas), Vector2::new(7.5, 7.5));
    }

    #[test]
    fn test_inside_point_is_untouched() {
        let canvas = Canvas::new(200.0, 100.0);
        let n = node(10.0);
        let p = Vector2::new(50.0, 60.0);
        assert_eq!(clamp_center(&n, p, &canvas), p);
    }

    #[test]
    fn test_far_outside_points_are_contained() {
        let canvas = Canvas::new(800.0, 600.0);
        let r = 25.0;
        let n = node(r);
        let probes = [
            Vector2::new(-1e9, -1e9),
            Vector2::new(1e9, 1e9),
            Vector2::new(-5.0, 300.0),
            Vector2::new(400.0, 599.0),
            Vector2::new(799.0, 1.0),
            Vector2::new(1e6, -3.0),
            Vector2::new(24.9, 575.1),
            Vector2::new(f64::MAX, f64::MIN),
            Vector2::new(10.0, -100.0),
            Vector2::new(790.0, 700.0),
        ];
        for p in probes {
            assert_contained(clamp_center(&n, p, &canvas), r, &canvas);
        }
    }

    #[test]
    fn test_fractional_sizes_stay_contained() {
        let cases = [
            (231.63116129203135, 231.63116129203135, 36.37148990284929),
            (800.1, 600.3, 25.7),
            (100.0 / 3.0, 70.0 / 3.0, 11.0 / 7.0),
            (0.3, 0.7, 0.1),
        ];
        for (width, height, r) in cases {
            let canvas = Canvas::new(width, height);
            let n = node(r);
            for p in [
                Vector2::new(1e9, 1e9),
                Vector2::new(width, height),
                Vector2::new(width - r * 0.5, height - r * 0.5),
                Vector2::new(-1e9, 1e9),
            ] {
                assert_contained(clamp_center(&n, p, &canvas), r, &canvas);
            }
        }

        let canvas = Canvas::new(231.63116129203135, 231.63116129203135);
        let mut graph = Graph::new();
        graph.add_node(node(36.37148990284929)).unwrap();
        move_within_bounds(&mut graph, 0, Vector2::new(1e9, 1e9), &canvas);
        assert!(graph.is_within_bounds(graph.node_at(0), &canvas));
    }

    #[test]
    fn test_move_reports_distance() {
        let canvas = Canvas::new(100.0, 100.0);
        let mut graph = Graph::new();
        graph
            .add_node(node(10.0).with_center(Vector2::new(50.0, 50.0)))
            .unwrap();
        let moved = move_within_bounds(&mut graph, 0, Vector2::new(50.0, 200.0), &canvas);
        assert_eq!(graph.node_at(0).center(), Vector2::new(50.0, 90.0));
        assert_eq!(moved, 40.0);
    }

    #[test]
    fn test_fits() {
        let canvas = Canvas::new(100.0, 60.0);
        assert!(fits(&canvas, 30.0));
        assert!(!fits(&canvas, 30.1));
    }
}
