use cabinet_configurator::{
    ConfiguratorError,
    configurator::classify::{self, PartRole, Side},
    data_structures::{
        instance::Instance,
        scene_graph::{Aabb, Geometry, MaterialSlot, NodeId, SceneGraph, SourceMaterial},
    },
};
use cgmath::{Rad, Vector3};

fn mesh(graph: &mut SceneGraph, parent: Option<NodeId>, name: &str, x: f32, size: [f32; 3]) -> NodeId {
    graph.add_node(
        parent,
        name,
        Instance::from(Vector3::new(x, 0.0, 0.0)),
        Some(Geometry {
            bounds: Aabb::from_size(size[0], size[1], size[2]),
        }),
        MaterialSlot::default(),
    )
}

/// Body, two named doors, a glass pane and a handle under one root.
fn named_cabinet() -> (SceneGraph, [NodeId; 5]) {
    let mut graph = SceneGraph::new();
    let root = graph.add_node(None, "Cabinet", Instance::new(), None, MaterialSlot::default());
    let body = mesh(&mut graph, Some(root), "Body", 0.0, [1.0, 2.0, 0.6]);
    let left = mesh(&mut graph, Some(root), "LeftDoor", -0.25, [0.5, 1.9, 0.02]);
    let right = mesh(&mut graph, Some(root), "Door_R", 0.25, [0.5, 1.9, 0.02]);
    let glass = mesh(&mut graph, Some(left), "GlassPane", 0.0, [0.4, 1.0, 0.01]);
    let handle = mesh(&mut graph, Some(right), "Handle", 0.2, [0.02, 0.2, 0.02]);
    (graph, [body, left, right, glass, handle])
}

#[test]
fn named_parts_are_classified_by_name_and_side() {
    let (graph, [body, left, right, glass, handle]) = named_cabinet();
    let parts = classify::classify(&graph);

    assert_eq!(parts.left_doors, vec![left]);
    assert_eq!(parts.right_doors, vec![right]);
    assert_eq!(parts.glass, vec![glass]);
    assert_eq!(parts.role(body), PartRole::Unclassified);
    assert_eq!(parts.role(handle), PartRole::Unclassified);
    assert!(parts.check_doors("cabinet.glb").is_ok());
}

#[test]
fn names_match_case_insensitively() {
    let mut graph = SceneGraph::new();
    let drawer = mesh(&mut graph, None, "TOP_DRAWER", -0.1, [0.5, 0.2, 0.5]);
    let front = mesh(&mut graph, None, "FrontPanel", 0.4, [0.5, 0.2, 0.5]);
    let window = mesh(&mut graph, None, "Window.001", 0.0, [0.5, 0.5, 0.01]);
    let parts = classify::classify(&graph);

    assert_eq!(parts.role(drawer), PartRole::LeftDoor);
    assert_eq!(parts.role(front), PartRole::RightDoor);
    assert_eq!(parts.role(window), PartRole::Glass);
}

#[test]
fn glass_wins_over_door_names() {
    let mut graph = SceneGraph::new();
    let node = mesh(&mut graph, None, "door_glass", 0.3, [0.5, 1.0, 0.01]);
    let parts = classify::classify(&graph);
    assert!(parts.is_glass(node));
    assert!(parts.right_doors.is_empty());
}

#[test]
fn see_through_source_materials_are_glass() {
    let mut graph = SceneGraph::new();
    let translucent = [
        SourceMaterial {
            alpha_blend: true,
            ..Default::default()
        },
        SourceMaterial {
            base_color: [1.0, 1.0, 1.0, 0.4],
            ..Default::default()
        },
        SourceMaterial {
            transmission: 1.0,
            ..Default::default()
        },
    ];
    let ids: Vec<_> = translucent
        .into_iter()
        .enumerate()
        .map(|(i, source)| {
            graph.add_node(
                None,
                format!("pane{}", i),
                Instance::new(),
                Some(Geometry {
                    bounds: Aabb::from_size(1.0, 1.0, 0.01),
                }),
                MaterialSlot::Source(source),
            )
        })
        .collect();
    let parts = classify::classify(&graph);
    assert_eq!(parts.glass, ids);
}

#[test]
fn the_origin_belongs_to_the_left() {
    let mut graph = SceneGraph::new();
    let node = mesh(&mut graph, None, "door", 0.0, [0.5, 1.0, 0.02]);
    assert_eq!(Side::of(&graph[node]), Side::Left);
    assert_eq!(classify::classify(&graph).role(node), PartRole::LeftDoor);
}

#[test]
fn tall_slim_meshes_become_doors_when_no_name_matches() {
    let mut graph = SceneGraph::new();
    let body = mesh(&mut graph, None, "Object_1", 0.0, [1.0, 0.9, 0.6]);
    let left = mesh(&mut graph, None, "Object_2", -0.25, [0.5, 1.8, 0.02]);
    let right = mesh(&mut graph, None, "Object_3", 0.25, [0.5, 1.8, 0.02]);
    let shelf = mesh(&mut graph, None, "Object_4", 0.0, [0.9, 0.02, 0.5]);
    let parts = classify::classify(&graph);

    assert_eq!(parts.left_doors, vec![left]);
    assert_eq!(parts.right_doors, vec![right]);
    assert_eq!(parts.role(body), PartRole::Unclassified);
    assert_eq!(parts.role(shelf), PartRole::Unclassified);
}

#[test]
fn the_shape_fallback_is_skipped_when_a_door_was_named() {
    let mut graph = SceneGraph::new();
    let door = mesh(&mut graph, None, "door", 0.3, [0.5, 0.4, 0.5]);
    let tall = mesh(&mut graph, None, "Object_2", -0.25, [0.5, 1.8, 0.02]);
    let parts = classify::classify(&graph);
    assert_eq!(parts.right_doors, vec![door]);
    assert_eq!(parts.role(tall), PartRole::Unclassified);
}

#[test]
fn the_shape_fallback_uses_world_space_extents() {
    let mut graph = SceneGraph::new();
    // lying on its side: wide locally, but rotated a quarter turn about z it stands upright
    let mut local = Instance::from(Vector3::new(0.4, 0.0, 0.0));
    local.rotation.z = Rad(std::f32::consts::FRAC_PI_2);
    let node = graph.add_node(
        None,
        "Object_1",
        local,
        Some(Geometry {
            bounds: Aabb::from_size(1.8, 0.5, 0.02),
        }),
        MaterialSlot::default(),
    );
    let parts = classify::classify(&graph);
    assert_eq!(parts.right_doors, vec![node]);
}

#[test]
fn nothing_door_like_is_ambiguous() {
    let mut graph = SceneGraph::new();
    mesh(&mut graph, None, "Body", 0.0, [1.0, 0.5, 0.6]);
    let parts = classify::classify(&graph);
    assert!(!parts.has_doors());
    assert!(matches!(
        parts.check_doors("cabinet.glb"),
        Err(ConfiguratorError::ClassificationAmbiguity { path }) if path == "cabinet.glb"
    ));
}

#[test]
fn classification_is_idempotent() {
    let (mut graph, _) = named_cabinet();
    let first = classify::classify(&graph);
    classify::apply_glass(&mut graph, &first);
    let second = classify::classify(&graph);
    assert_eq!(first, second);
}

#[test]
fn glass_parts_get_the_shared_glass_material() {
    let (mut graph, [body, _, _, glass, _]) = named_cabinet();
    let parts = classify::classify(&graph);
    classify::apply_glass(&mut graph, &parts);
    assert_eq!(graph[glass].material, MaterialSlot::Glass);
    assert_eq!(graph[body].material, MaterialSlot::default());
}

#[test]
fn reference_yaw_is_captured_at_classification() {
    let mut graph = SceneGraph::new();
    let mut local = Instance::from(Vector3::new(0.3, 0.0, 0.0));
    local.set_yaw(Rad(0.5));
    let door = graph.add_node(
        None,
        "door",
        local,
        Some(Geometry {
            bounds: Aabb::from_size(0.5, 1.0, 0.02),
        }),
        MaterialSlot::default(),
    );
    let parts = classify::classify(&graph);
    graph[door].local.set_yaw(Rad(1.2));
    assert_eq!(parts.reference_yaw(door), Some(Rad(0.5)));
}

#[test]
fn two_named_doors_without_glass() {
    let mut graph = SceneGraph::new();
    let left = mesh(&mut graph, None, "LeftDoor", -0.3, [0.5, 1.9, 0.02]);
    let right = mesh(&mut graph, None, "RightDoor", 0.4, [0.5, 1.9, 0.02]);
    let parts = classify::classify(&graph);

    assert_eq!(parts.left_doors, vec![left]);
    assert_eq!(parts.right_doors, vec![right]);
    assert!(parts.glass.is_empty());
}

#[test]
fn a_single_upright_mesh_right_of_the_origin_becomes_a_right_door() {
    let mut graph = SceneGraph::new();
    let node = mesh(&mut graph, None, "Object_1", 0.2, [0.1, 0.5, 0.1]);
    let parts = classify::classify(&graph);

    assert_eq!(parts.right_doors, vec![node]);
    assert!(parts.left_doors.is_empty());
    assert!(parts.glass.is_empty());
}
