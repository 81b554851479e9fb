use std::time::Duration;

use cabinet_configurator::{
    configurator::{
        animator::DoorAnimator,
        classify::{self, PartRole},
    },
    data_structures::scene_graph::MaterialSlot,
    resources::parse_glb,
};
use cgmath::{Deg, Rad};

/// Wraps a JSON document and its binary chunk into a GLB container.
fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin);
    out
}

/// A 0.5 x 2 upright quad: four positions followed by six u16 indices.
fn quad_buffer() -> Vec<u8> {
    let positions: [[f32; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0],
        [0.5, 2.0, 0.0],
        [0.0, 2.0, 0.0],
    ];
    let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];
    let mut bin: Vec<u8> = positions
        .iter()
        .flatten()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    bin.extend(indices.iter().flat_map(|i| i.to_le_bytes()));
    bin
}

// RightDoor is turned 30 degrees about y: [0, sin(15), 0, cos(15)]
const CABINET: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [ { "nodes": [0] } ],
  "nodes": [
    { "name": "Cabinet", "children": [1, 2, 3, 4] },
    { "name": "LeftDoor", "mesh": 0, "translation": [-0.3, 0.0, 0.0] },
    { "name": "RightDoor", "mesh": 0, "translation": [0.3, 0.0, 0.0],
      "rotation": [0.0, 0.25881904, 0.0, 0.9659258] },
    { "name": "Pane", "mesh": 1, "translation": [-0.3, 0.0, 0.01] },
    { "name": "Handle", "mesh": 0, "translation": [0.1, 1.0, 0.02] }
  ],
  "meshes": [
    { "name": "Leaf", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] },
    { "name": "Sheet", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 1 } ] }
  ],
  "materials": [
    { "name": "Oak", "pbrMetallicRoughness": { "baseColorFactor": [0.8, 0.6, 0.4, 1.0] } },
    { "name": "Clear", "alphaMode": "BLEND", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 1.0, 1.0, 0.3] } }
  ],
  "buffers": [ { "byteLength": 60 } ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 48, "target": 34962 },
    { "buffer": 0, "byteOffset": 48, "byteLength": 12, "target": 34963 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [0.5, 2.0, 0.0] },
    { "bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR" }
  ]
}"#;

#[test]
fn parses_the_node_hierarchy_with_geometry() {
    let scene = parse_glb(&glb(CABINET, &quad_buffer())).unwrap();
    let graph = &scene.graph;

    assert_eq!(graph.len(), 5);
    let root = graph.find_by_name("Cabinet").unwrap();
    assert_eq!(graph.roots(), &[root]);
    assert!(!graph[root].is_mesh());
    assert_eq!(graph[root].children.len(), 4);

    let left = graph.find_by_name("LeftDoor").unwrap();
    assert_eq!(graph[left].parent, Some(root));
    assert_eq!(graph[left].local.position.x, -0.3);
    let bounds = graph[left].geometry.as_ref().unwrap().bounds;
    assert_eq!(bounds.size().y, 2.0);

    let right = graph.find_by_name("RightDoor").unwrap();
    let yaw: Rad<f32> = Deg(30.0).into();
    assert!((graph[right].local.yaw().0 - yaw.0).abs() < 1e-4);
}

#[test]
fn reads_primitives_with_default_attributes() {
    let scene = parse_glb(&glb(CABINET, &quad_buffer())).unwrap();
    assert_eq!(scene.primitives.len(), 4);

    let left = scene.graph.find_by_name("LeftDoor").unwrap();
    let primitives: Vec<_> = scene.primitives_of(left).collect();
    assert_eq!(primitives.len(), 1);
    assert_eq!(primitives[0].vertices.len(), 4);
    assert_eq!(primitives[0].indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(primitives[0].material, Some(0));
    assert_eq!(primitives[0].vertices[2].tex_coords, [0.0, 0.0]);
    assert_eq!(primitives[0].vertices[2].normal, [0.0, 1.0, 0.0]);
}

#[test]
fn keeps_the_authored_materials() {
    let scene = parse_glb(&glb(CABINET, &quad_buffer())).unwrap();
    assert_eq!(scene.materials.len(), 2);
    assert_eq!(scene.materials[0].name, "Oak");
    assert!(!scene.materials[0].alpha_blend);
    assert!(scene.materials[1].alpha_blend);
    assert!(scene.images.is_empty());

    let pane = scene.graph.find_by_name("Pane").unwrap();
    match &scene.graph[pane].material {
        MaterialSlot::Source(source) => {
            assert_eq!(source.index, Some(1));
            assert!(source.is_translucent());
        }
        other => panic!("unexpected material {:?}", other),
    }
}

#[test]
fn a_parsed_cabinet_classifies_and_animates() {
    let mut scene = parse_glb(&glb(CABINET, &quad_buffer())).unwrap();
    let graph = &mut scene.graph;
    let left = graph.find_by_name("LeftDoor").unwrap();
    let right = graph.find_by_name("RightDoor").unwrap();
    let pane = graph.find_by_name("Pane").unwrap();
    let handle = graph.find_by_name("Handle").unwrap();

    let parts = classify::classify(graph);
    assert_eq!(parts.role(left), PartRole::LeftDoor);
    assert_eq!(parts.role(right), PartRole::RightDoor);
    assert_eq!(parts.role(pane), PartRole::Glass);
    assert_eq!(parts.role(handle), PartRole::Unclassified);

    let mut animator = DoorAnimator::new(graph, &parts, 5.0, Deg(90.0));
    animator.set_open(true);
    animator.tick(Duration::from_secs(1), graph);
    let expected: Rad<f32> = Deg(120.0).into();
    assert!((graph[right].local.yaw().0 - expected.0).abs() < 1e-4);
    assert!((graph[pane].local.yaw().0 + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
}

#[test]
fn rejects_external_buffers_in_a_glb() {
    let json = CABINET.replace(
        r#"{ "byteLength": 60 }"#,
        r#"{ "byteLength": 60, "uri": "cabinet.bin" }"#,
    );
    assert!(parse_glb(&glb(&json, &quad_buffer())).is_err());
}
