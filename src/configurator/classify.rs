//! One-time classification of the cabinet's mesh nodes into functional parts.
//!
//! Rules are evaluated in a fixed order per mesh node, depth-first pre-order:
//!
//! 1. glass: the name mentions glass or a window, or the authored material is see-through
//! 2. door: the name mentions a door, drawer or front; the side follows the local x position
//! 3. only when no door was found: any non-glass mesh taller than it is wide and deep
//!
//! The result is cached by the cabinet flow for the lifetime of the loaded asset.

use std::collections::HashMap;

use cgmath::Rad;

use crate::{
    data_structures::scene_graph::{MaterialSlot, MeshNode, NodeId, SceneGraph},
    error::ConfiguratorError,
};

const GLASS_KEYWORDS: [&str; 2] = ["glass", "window"];
const DOOR_KEYWORDS: [&str; 3] = ["door", "drawer", "front"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Parts at or left of the origin open to the left.
    pub fn of(node: &MeshNode) -> Self {
        if node.local.position.x <= 0.0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartRole {
    Glass,
    LeftDoor,
    RightDoor,
    Unclassified,
}

impl PartRole {
    fn door(side: Side) -> Self {
        match side {
            Side::Left => PartRole::LeftDoor,
            Side::Right => PartRole::RightDoor,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartClassification {
    pub left_doors: Vec<NodeId>,
    pub right_doors: Vec<NodeId>,
    pub glass: Vec<NodeId>,
    roles: HashMap<NodeId, PartRole>,
    reference_yaw: HashMap<NodeId, Rad<f32>>,
}

impl PartClassification {
    pub fn role(&self, id: NodeId) -> PartRole {
        self.roles.get(&id).copied().unwrap_or(PartRole::Unclassified)
    }

    pub fn is_glass(&self, id: NodeId) -> bool {
        self.role(id) == PartRole::Glass
    }

    /// Rotation about the vertical axis at load time, the closed position of the part.
    pub fn reference_yaw(&self, id: NodeId) -> Option<Rad<f32>> {
        self.reference_yaw.get(&id).copied()
    }

    pub fn has_doors(&self) -> bool {
        !self.left_doors.is_empty() || !self.right_doors.is_empty()
    }

    pub fn has_side(&self, side: Side) -> bool {
        match side {
            Side::Left => !self.left_doors.is_empty(),
            Side::Right => !self.right_doors.is_empty(),
        }
    }

    /// Door toggling has nothing to animate when no door was found.
    pub fn check_doors(&self, path: &str) -> Result<(), ConfiguratorError> {
        if self.has_doors() {
            Ok(())
        } else {
            Err(ConfiguratorError::ClassificationAmbiguity {
                path: path.to_string(),
            })
        }
    }

    fn insert(&mut self, graph: &SceneGraph, id: NodeId, role: PartRole) {
        match role {
            PartRole::Glass => self.glass.push(id),
            PartRole::LeftDoor => self.left_doors.push(id),
            PartRole::RightDoor => self.right_doors.push(id),
            PartRole::Unclassified => return,
        }
        self.roles.insert(id, role);
        self.reference_yaw.insert(id, graph[id].local.yaw());
    }
}

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| name.contains(keyword))
}

fn is_see_through(material: &MaterialSlot) -> bool {
    match material {
        MaterialSlot::Glass => true,
        MaterialSlot::Source(source) => source.is_translucent(),
        MaterialSlot::Surface { .. } => false,
    }
}

/// Name and material rules; the shape fallback runs separately once all nodes were seen.
fn classify_by_rules(node: &MeshNode) -> PartRole {
    let name = node.name.to_lowercase();
    if contains_any(&name, &GLASS_KEYWORDS) || is_see_through(&node.material) {
        PartRole::Glass
    } else if contains_any(&name, &DOOR_KEYWORDS) {
        PartRole::door(Side::of(node))
    } else {
        PartRole::Unclassified
    }
}

/// Tall and slim in world space: the vertical extent beats both horizontal ones.
fn is_door_shaped(graph: &SceneGraph, id: NodeId) -> bool {
    graph
        .world_bounds(id)
        .map(|bounds| {
            let size = bounds.size();
            size.y > size.x && size.y > size.z
        })
        .unwrap_or(false)
}

pub fn classify(graph: &SceneGraph) -> PartClassification {
    let mut parts = PartClassification::default();
    for id in graph.meshes() {
        let role = classify_by_rules(&graph[id]);
        parts.insert(graph, id, role);
    }

    if !parts.has_doors() {
        log::debug!("No door matched by name, falling back to bounding box shapes");
        let candidates: Vec<NodeId> = graph
            .meshes()
            .filter(|id| !parts.is_glass(*id) && is_door_shaped(graph, *id))
            .collect();
        for id in candidates {
            let role = PartRole::door(Side::of(&graph[id]));
            parts.insert(graph, id, role);
        }
    }

    log::info!(
        "Classified {} left door, {} right door and {} glass parts",
        parts.left_doors.len(),
        parts.right_doors.len(),
        parts.glass.len()
    );
    parts
}

/// Puts the shared glass material on every glass part.
pub fn apply_glass(graph: &mut SceneGraph, parts: &PartClassification) {
    for id in &parts.glass {
        graph[*id].material = MaterialSlot::Glass;
    }
}
