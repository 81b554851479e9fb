use std::time::Duration;

use cabinet_configurator::{
    configurator::{animator::DoorAnimator, classify},
    data_structures::{
        instance::Instance,
        scene_graph::{Aabb, Geometry, MaterialSlot, NodeId, SceneGraph},
    },
};
use cgmath::{Deg, Rad, Vector3};

const FRAME: Duration = Duration::from_millis(16);

fn add(graph: &mut SceneGraph, name: &str, x: f32, yaw: f32) -> NodeId {
    let mut local = Instance::from(Vector3::new(x, 0.0, 0.0));
    local.set_yaw(Rad(yaw));
    graph.add_node(
        None,
        name,
        local,
        Some(Geometry {
            bounds: Aabb::from_size(0.5, 1.8, 0.02),
        }),
        MaterialSlot::default(),
    )
}

fn animator(graph: &SceneGraph) -> DoorAnimator {
    let parts = classify::classify(graph);
    DoorAnimator::new(graph, &parts, 5.0, Deg(90.0))
}

fn yaw(graph: &SceneGraph, id: NodeId) -> f32 {
    graph[id].local.yaw().0
}

#[test]
fn doors_open_in_opposite_directions() {
    let mut graph = SceneGraph::new();
    let left = add(&mut graph, "LeftDoor", -0.25, 0.0);
    let right = add(&mut graph, "RightDoor", 0.25, 0.0);
    let mut animator = animator(&graph);

    animator.set_open(true);
    assert_eq!(animator.target(left), Some(Rad::from(Deg(-90.0))));
    assert_eq!(animator.target(right), Some(Rad::from(Deg(90.0))));
    assert!(animator.tick(FRAME, &mut graph));
    assert!(yaw(&graph, left) < 0.0);
    assert!(yaw(&graph, right) > 0.0);
}

#[test]
fn easing_converges_without_overshoot() {
    let mut graph = SceneGraph::new();
    let left = add(&mut graph, "LeftDoor", -0.25, 0.0);
    let mut animator = animator(&graph);
    animator.set_open(true);

    let target = Rad::from(Deg(-90.0f32)).0;
    let mut previous = yaw(&graph, left);
    for _ in 0..600 {
        animator.tick(FRAME, &mut graph);
        let current = yaw(&graph, left);
        assert!(current <= previous, "{} moved away from the target", current);
        assert!(current >= target, "{} overshot {}", current, target);
        previous = current;
    }
    assert!((previous - target).abs() < 1e-3);
}

#[test]
fn a_long_frame_lands_exactly_on_the_target() {
    let mut graph = SceneGraph::new();
    let right = add(&mut graph, "RightDoor", 0.25, 0.0);
    let mut animator = animator(&graph);
    animator.set_open(true);

    animator.tick(Duration::from_secs(1), &mut graph);
    assert_eq!(graph[right].local.yaw(), Rad::from(Deg(90.0)));
    // at rest nothing changes
    assert!(!animator.tick(FRAME, &mut graph));
}

#[test]
fn closing_returns_to_the_captured_reference() {
    let mut graph = SceneGraph::new();
    let right = add(&mut graph, "RightDoor", 0.25, 0.3);
    let mut animator = animator(&graph);

    animator.set_open(true);
    animator.tick(Duration::from_secs(1), &mut graph);
    assert!((yaw(&graph, right) - (0.3 + std::f32::consts::FRAC_PI_2)).abs() < 1e-5);

    animator.set_open(false);
    assert!(!animator.is_open());
    animator.tick(Duration::from_secs(1), &mut graph);
    assert!((yaw(&graph, right) - 0.3).abs() < 1e-6);
}

#[test]
fn glass_swings_with_the_doors_on_its_side() {
    let mut graph = SceneGraph::new();
    add(&mut graph, "LeftDoor", -0.25, 0.0);
    let left_glass = add(&mut graph, "LeftGlass", -0.25, 0.0);
    let right_glass = add(&mut graph, "RightGlass", 0.25, 0.0);
    let mut animator = animator(&graph);

    let animated: Vec<_> = animator.animated_nodes().collect();
    assert!(animated.contains(&left_glass));
    // no right door, so the right pane stays put
    assert!(!animated.contains(&right_glass));

    animator.set_open(true);
    animator.tick(Duration::from_secs(1), &mut graph);
    assert_eq!(graph[left_glass].local.yaw(), Rad::from(Deg(-90.0)));
    assert_eq!(yaw(&graph, right_glass), 0.0);
}

#[test]
fn an_unclassified_cabinet_is_inert() {
    let mut graph = SceneGraph::new();
    let body = graph.add_node(
        None,
        "Body",
        Instance::new(),
        Some(Geometry {
            bounds: Aabb::from_size(1.0, 0.5, 0.6),
        }),
        MaterialSlot::default(),
    );
    let mut animator = animator(&graph);
    assert!(animator.is_inert());
    animator.set_open(true);
    assert!(!animator.tick(Duration::from_secs(1), &mut graph));
    assert_eq!(yaw(&graph, body), 0.0);
}
