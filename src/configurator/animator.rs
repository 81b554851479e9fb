//! Hinge animation of the door parts.

use std::time::Duration;

use cgmath::Rad;

use crate::{
    configurator::classify::{PartClassification, Side},
    data_structures::scene_graph::{NodeId, SceneGraph},
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Hinge {
    node: NodeId,
    side: Side,
    reference: Rad<f32>,
}

/// Eases every door part toward its open or closed angle, once per frame.
///
/// Only the rotation about the vertical axis is written. There is no completion
/// event, the parts simply converge.
#[derive(Clone, Debug)]
pub struct DoorAnimator {
    hinges: Vec<Hinge>,
    open: bool,
    rate: f32,
    open_angle: Rad<f32>,
}

impl DoorAnimator {
    pub fn new(
        graph: &SceneGraph,
        parts: &PartClassification,
        rate: f32,
        open_angle: impl Into<Rad<f32>>,
    ) -> Self {
        let doors = parts
            .left_doors
            .iter()
            .map(|id| (*id, Side::Left))
            .chain(parts.right_doors.iter().map(|id| (*id, Side::Right)));
        // glass swings with the doors on its side, if that side has any
        let glass = parts
            .glass
            .iter()
            .map(|id| (*id, Side::of(&graph[*id])))
            .filter(|(_, side)| parts.has_side(*side));
        let hinges = doors
            .chain(glass)
            .map(|(node, side)| Hinge {
                node,
                side,
                reference: parts
                    .reference_yaw(node)
                    .unwrap_or_else(|| graph[node].local.yaw()),
            })
            .collect();
        Self {
            hinges,
            open: false,
            rate,
            open_angle: open_angle.into(),
        }
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Nothing to animate; the door toggle has no visible effect.
    pub fn is_inert(&self) -> bool {
        self.hinges.is_empty()
    }

    pub fn animated_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.hinges.iter().map(|hinge| hinge.node)
    }

    /// Angle the part is heading to: left opens negative, right positive.
    pub fn target(&self, node: NodeId) -> Option<Rad<f32>> {
        self.hinges
            .iter()
            .find(|hinge| hinge.node == node)
            .map(|hinge| self.target_of(hinge))
    }

    fn target_of(&self, hinge: &Hinge) -> Rad<f32> {
        if !self.open {
            return hinge.reference;
        }
        match hinge.side {
            Side::Left => hinge.reference - self.open_angle,
            Side::Right => hinge.reference + self.open_angle,
        }
    }

    /// Returns whether any rotation changed.
    pub fn tick(&self, dt: Duration, graph: &mut SceneGraph) -> bool {
        let factor = (dt.as_secs_f32() * self.rate).min(1.0);
        let mut moved = false;
        for hinge in &self.hinges {
            let target = self.target_of(hinge);
            let Some(node) = graph.get_mut(hinge.node) else {
                continue;
            };
            let yaw = node.local.yaw();
            if yaw == target {
                continue;
            }
            node.local.set_yaw(yaw + (target - yaw) * factor);
            moved = true;
        }
        moved
    }
}
