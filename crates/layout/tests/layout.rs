use graphvis_layout::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing_test::traced_test;

fn node_at(id: NodeId, radius: f64, x: f64, y: f64) -> Node {
    Node::new(id, format!("n{id}"))
        .with_radius(radius)
        .unwrap()
        .with_center(Vector2::new(x, y))
}

fn fixed(mode: ExecutionMode) -> SimulationConfig {
    SimulationConfig {
        mode,
        randomize_initial: false,
        seed: Some(7),
        ..Default::default()
    }
}

fn pair() -> Graph {
    let mut graph = Graph::new();
    graph.add_node(node_at(1, 20.0, 150.0, 300.0)).unwrap();
    graph.add_node(node_at(2, 20.0, 650.0, 300.0)).unwrap();
    graph.connect(1, 2, false).unwrap();
    graph
}

fn star(leaves: u32) -> Graph {
    let mut graph = Graph::new();
    graph.add_node(node_at(0, 25.0, 0.0, 0.0)).unwrap();
    for id in 1..=leaves {
        graph.add_node(node_at(id, 15.0, 0.0, 0.0)).unwrap();
        graph.connect(0, id, id % 2 == 0).unwrap();
    }
    graph
}

fn assert_inside(graph: &Graph, canvas: &Canvas) {
    for node in graph.nodes() {
        assert!(
            graph.is_within_bounds(node, canvas),
            "node {} at {} escaped the canvas",
            node.id(),
            node.center()
        );
    }
}

#[test]
fn test_pair_settles_near_ideal_length() {
    let canvas = Canvas::new(800.0, 600.0);
    let mut sim = Simulation::new(pair(), canvas, fixed(ExecutionMode::Batch)).unwrap();
    let outcome = sim.run().unwrap();

    assert!(outcome.converged);
    let a = outcome.positions[&1];
    let b = outcome.positions[&2];
    let distance = a.distance_to(b);
    // A spring at rest within epsilon satisfies |ln(d / ideal)| <= epsilon.
    let epsilon = sim.config().epsilon;
    let ideal = sim.config().forces.ideal_edge_length;
    assert!(
        distance >= ideal * (-epsilon).exp() && distance <= ideal * epsilon.exp(),
        "settled at {distance}"
    );
    assert_inside(sim.graph(), &canvas);
}

#[test]
fn test_coincident_nodes_separate_after_one_iteration() {
    let canvas = Canvas::new(800.0, 600.0);
    let mut graph = Graph::new();
    for id in 0..4 {
        graph.add_node(node_at(id, 10.0, 400.0, 300.0)).unwrap();
    }
    let mut sim = Simulation::new(graph, canvas, fixed(ExecutionMode::Animated)).unwrap();
    assert!(sim.drive(&mut CountedTicks::new(1)).unwrap().is_none());
    assert_eq!(sim.iteration(), 1);

    let positions = sim.graph().position_snapshot();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            assert!(positions[i].distance_to(positions[j]) > 0.0);
        }
    }
}

#[test]
fn test_clamp_from_origin() {
    let canvas = Canvas::new(100.0, 100.0);
    let mut graph = Graph::new();
    graph.add_node(node_at(0, 12.0, 50.0, 50.0)).unwrap();
    move_within_bounds(&mut graph, 0, Vector2::ZERO, &canvas);
    assert_eq!(graph.node_at(0).center(), Vector2::new(12.0, 12.0));
}

#[test]
fn test_slider_moves_linearly_then_lands() {
    let mut graph = Graph::new();
    graph.add_node(node_at(0, 5.0, 0.0, 0.0)).unwrap();
    let mut slider = Slider::from_graph(&graph, vec![Vector2::new(100.0, 0.0)], 10).unwrap();

    slider.tick(&mut graph).unwrap();
    assert_eq!(graph.node_at(0).center(), Vector2::new(10.0, 0.0));
    slider.run(&mut graph).unwrap();
    assert_eq!(graph.node_at(0).center(), Vector2::new(100.0, 0.0));
}

#[test]
fn test_same_seed_replays_exactly() {
    let canvas = Canvas::new(700.0, 500.0);
    let config = SimulationConfig {
        seed: Some(1234),
        ..Default::default()
    };
    let first = Simulation::new(star(6), canvas, config.clone()).unwrap().run().unwrap();
    let second = Simulation::new(star(6), canvas, config).unwrap().run().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_tighter_epsilon_never_halts_sooner() {
    let canvas = Canvas::new(700.0, 500.0);
    let mut previous = 0;
    for epsilon in [1.0, 0.5, 0.1, 0.05, 0.01] {
        let config = SimulationConfig {
            epsilon,
            seed: Some(99),
            ..Default::default()
        };
        let outcome = Simulation::new(star(4), canvas, config).unwrap().run().unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations >= previous, "epsilon {epsilon} halted sooner");
        previous = outcome.iterations;
    }
}

#[test]
fn test_halts_within_iteration_cap() {
    let canvas = Canvas::new(700.0, 500.0);
    for cap in [1, 10, 250] {
        let config = SimulationConfig {
            max_iterations: cap,
            epsilon: 0.0,
            seed: Some(3),
            ..Default::default()
        };
        let outcome = Simulation::new(star(5), canvas, config).unwrap().run().unwrap();
        assert!(outcome.iterations <= cap);
    }
}

#[test]
#[traced_test]
fn test_iteration_cap_is_reported() {
    let canvas = Canvas::new(800.0, 600.0);
    let config = SimulationConfig {
        max_iterations: 3,
        ..fixed(ExecutionMode::Animated)
    };
    let mut sim = Simulation::new(pair(), canvas, config).unwrap();
    let outcome = sim.run().unwrap();
    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 3);
    assert!(logs_contain("without converging"));
}

#[test]
fn test_start_is_not_reentrant() {
    let canvas = Canvas::new(800.0, 600.0);
    let mut sim = Simulation::new(pair(), canvas, fixed(ExecutionMode::Animated)).unwrap();
    assert!(sim.start().unwrap());
    assert!(!sim.start().unwrap());
    assert_eq!(sim.run(), Err(LayoutError::AlreadyRunning));
    assert!(sim.is_running());
    sim.drive(&mut CountedTicks::new(u64::MAX)).unwrap().unwrap();
    assert!(sim.start().unwrap());
}

#[test]
fn test_hooks_follow_the_run() {
    let canvas = Canvas::new(800.0, 600.0);
    let steps = Rc::new(Cell::new(0u64));
    let finished = Rc::new(RefCell::new(None));

    let mut sim = Simulation::new(pair(), canvas, fixed(ExecutionMode::Batch)).unwrap();
    let counter = steps.clone();
    sim.set_on_step(move |iteration, _| counter.set(iteration));
    let sink = finished.clone();
    sim.set_on_complete(move |outcome| *sink.borrow_mut() = Some(outcome.clone()));

    let outcome = sim.run().unwrap();
    assert_eq!(steps.get(), outcome.iterations);
    assert_eq!(finished.borrow().as_ref(), Some(&outcome));
}

#[test]
fn test_slide_to_end_matches_batch_and_hides_the_solve() {
    let canvas = Canvas::new(700.0, 500.0);
    let batch = Simulation::new(star(3), canvas, fixed(ExecutionMode::Batch))
        .unwrap()
        .run()
        .unwrap();

    let moves = Rc::new(Cell::new(0usize));
    let mut graph = star(3);
    let counter = moves.clone();
    graph.set_listener(move |event| {
        if matches!(event, NodeEvent::Moved { .. }) {
            counter.set(counter.get() + 1);
        }
    });
    let config = SimulationConfig {
        slide_frame_count: 10,
        ..fixed(ExecutionMode::SlideToEnd)
    };
    let mut sim = Simulation::new(graph, canvas, config).unwrap();

    assert!(sim.start().unwrap());
    // Only the initial clamp of four nodes is observed.
    assert_eq!(moves.get(), 4);

    let outcome = loop {
        if let Tick::Finished(outcome) = sim.tick() {
            break outcome;
        }
    };
    assert_eq!(outcome, batch);
    assert_eq!(moves.get(), 4 + 10 * 4 + 4);
}

#[test]
fn test_animated_run_pauses_and_resumes() {
    let canvas = Canvas::new(800.0, 600.0);
    let mut paused = Simulation::new(pair(), canvas, fixed(ExecutionMode::Animated)).unwrap();
    assert!(paused.drive(&mut CountedTicks::new(5)).unwrap().is_none());
    assert_eq!(paused.iteration(), 5);
    let resumed = paused.drive(&mut CountedTicks::new(u64::MAX)).unwrap().unwrap();

    let straight = Simulation::new(pair(), canvas, fixed(ExecutionMode::Animated))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(resumed, straight);
}

#[test]
fn test_setup_errors() {
    let mut graph = Graph::new();
    graph.add_node(node_at(0, 60.0, 50.0, 50.0)).unwrap();
    let err = Simulation::new(graph, Canvas::new(100.0, 100.0), SimulationConfig::default()).unwrap_err();
    assert!(matches!(err, LayoutError::NodeTooLarge { id: 0, .. }));

    let err = Simulation::new(pair(), Canvas::new(-1.0, 100.0), SimulationConfig::default()).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidCanvas { .. }));

    let data = GraphData {
        nodes: vec![NodeSpec {
            id: -4,
            label: "bad".to_string(),
            radius: None,
            weight: None,
        }],
        edges: vec![],
    };
    let err = Simulation::from_data(&data, Canvas::new(100.0, 100.0), SimulationConfig::default()).unwrap_err();
    assert_eq!(err, LayoutError::Graph(GraphError::NegativeNodeId(-4)));
}

#[test]
fn test_loader_records_run_end_to_end() {
    let data: GraphData = serde_json::from_str(
        r#"{
            "nodes": [
                {"id": 0, "label": "core"},
                {"id": 1, "label": "io", "weight": "3"},
                {"id": 2, "label": "db", "radius": 20}
            ],
            "edges": [
                {"from": 0, "to": 1},
                {"from": 0, "to": 2, "directed": true, "weight": "hot"}
            ]
        }"#,
    )
    .unwrap();
    let canvas = Canvas::new(900.0, 700.0);
    let config = SimulationConfig {
        seed: Some(21),
        ..Default::default()
    };
    let mut sim = Simulation::from_data(&data, canvas, config).unwrap();
    let outcome = sim.run().unwrap();

    assert!(outcome.converged);
    assert_eq!(outcome.positions.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_inside(sim.graph(), &canvas);
    assert_eq!(sim.graph().edge_between(0, 2, true).unwrap().weight(), Some("hot"));
}

#[test]
fn test_nodes_added_after_setup_are_checked_at_start() {
    let canvas = Canvas::new(600.0, 400.0);
    let mut graph = Graph::new();
    graph.add_node(node_at(0, 20.0, 100.0, 100.0)).unwrap();
    let mut sim = Simulation::new(graph, canvas, fixed(ExecutionMode::Batch)).unwrap();

    sim.graph_mut()
        .unwrap()
        .add_node(Node::new(1, "big").with_radius(300.0).unwrap())
        .unwrap();
    let err = sim.run().unwrap_err();
    assert_eq!(
        err,
        LayoutError::NodeTooLarge {
            id: 1,
            radius: 300.0,
            width: 600.0,
            height: 400.0,
        }
    );
    assert!(!sim.is_running());
}
