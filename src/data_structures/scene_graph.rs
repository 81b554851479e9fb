//! Scene graph and hierarchical scene organization.
//!
//! The loaded asset is kept as a flat arena of [`MeshNode`]s addressed by
//! [`NodeId`]. Other components (classifier, material binder, door animator) only
//! hold ids into the arena; they never reparent or remove nodes. The binder writes
//! material slots and the animator writes rotations, nothing else touches a node
//! after loading.

use std::ops::{Index, IndexMut};

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3};

use crate::data_structures::instance::Instance;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Axis aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// A box of the given size centered on the origin.
    pub fn from_size(x: f32, y: f32, z: f32) -> Self {
        Self {
            min: Point3::new(-x / 2.0, -y / 2.0, -z / 2.0),
            max: Point3::new(x / 2.0, y / 2.0, z / 2.0),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = [f32; 3]>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, [x, y, z]| {
            let point = Point3::new(x, y, z);
            Some(match bounds {
                None => Aabb::new(point, point),
                Some(bounds) => bounds.grow(point),
            })
        })
    }

    pub fn grow(self, point: Point3<f32>) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),
            max: Point3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            ),
        }
    }

    pub fn union(self, other: Aabb) -> Self {
        self.grow(other.min).grow(other.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    /// Transforms all eight corners and returns the box enclosing them.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = (0..8).map(|i| {
            let x = if i & 1 == 0 { self.min.x } else { self.max.x };
            let y = if i & 2 == 0 { self.min.y } else { self.max.y };
            let z = if i & 4 == 0 { self.min.z } else { self.max.z };
            let point = matrix.transform_point(Point3::new(x, y, z));
            [point.x, point.y, point.z]
        });
        // eight corners, never empty
        Aabb::from_points(corners).unwrap_or(*self)
    }
}

/// Material properties of a mesh as authored in the asset.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceMaterial {
    /// Index into the asset's material list, `None` for the glTF default material.
    pub index: Option<usize>,
    pub base_color: [f32; 4],
    pub alpha_blend: bool,
    pub transmission: f32,
}

impl SourceMaterial {
    pub fn opacity(&self) -> f32 {
        self.base_color[3]
    }

    /// Anything the asset authored as see-through.
    pub fn is_translucent(&self) -> bool {
        self.alpha_blend || self.transmission > 0.0 || self.opacity() < 1.0
    }
}

impl Default for SourceMaterial {
    fn default() -> Self {
        Self {
            index: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            alpha_blend: false,
            transmission: 0.0,
        }
    }
}

/// Which material a mesh node is currently drawn with.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialSlot {
    Source(SourceMaterial),
    /// The shared glass material; never replaced once assigned.
    Glass,
    /// A catalog surface, identified by the texture it samples.
    Surface { texture_source: String },
}

impl MaterialSlot {
    pub fn texture_source(&self) -> Option<&str> {
        match self {
            MaterialSlot::Surface { texture_source } => Some(texture_source),
            _ => None,
        }
    }
}

impl Default for MaterialSlot {
    fn default() -> Self {
        MaterialSlot::Source(SourceMaterial::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    /// Bounds of the vertex positions in node-local space.
    pub bounds: Aabb,
}

#[derive(Clone, Debug)]
pub struct MeshNode {
    pub name: String,
    pub local: Instance,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub geometry: Option<Geometry>,
    pub material: MaterialSlot,
    world: Matrix4<f32>,
}

impl MeshNode {
    pub fn is_mesh(&self) -> bool {
        self.geometry.is_some()
    }

    /// World matrix as of the last [`SceneGraph::update_world_transforms`].
    pub fn world(&self) -> Matrix4<f32> {
        self.world
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<MeshNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        local: Instance,
        geometry: Option<Geometry>,
        material: MaterialSlot,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MeshNode {
            name: name.into(),
            local,
            parent,
            children: Vec::new(),
            geometry,
            material,
            world: Matrix4::identity(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&MeshNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut MeshNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse().find(|id| self[*id].name == name)
    }

    /// Depth-first pre-order walk over all nodes, roots in insertion order.
    pub fn traverse(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
            Some(id)
        })
    }

    pub fn meshes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.traverse().filter(|id| self[*id].is_mesh())
    }

    /// World matrix computed from the current local transforms along the parent chain.
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let node = &self[id];
        let local = node.local.to_matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// World space bounds of the node's own geometry and all geometry below it.
    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        let own = self[id]
            .geometry
            .as_ref()
            .map(|geometry| geometry.bounds.transformed(&self.world_matrix(id)));
        self[id]
            .children
            .iter()
            .filter_map(|child| self.world_bounds(*child))
            .fold(own, |acc, bounds| match acc {
                Some(acc) => Some(acc.union(bounds)),
                None => Some(bounds),
            })
    }

    /// Recomputes the cached world matrices top-down.
    pub fn update_world_transforms(&mut self) {
        let mut stack: Vec<(NodeId, Matrix4<f32>)> = self
            .roots
            .iter()
            .map(|root| (*root, Matrix4::identity()))
            .collect();
        while let Some((id, parent_world)) = stack.pop() {
            let world = parent_world * self.nodes[id.0].local.to_matrix();
            self.nodes[id.0].world = world;
            stack.extend(self.nodes[id.0].children.iter().map(|child| (*child, world)));
        }
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.roots
            .iter()
            .filter_map(|root| self.world_bounds(*root))
            .reduce(Aabb::union)
    }
}

impl Index<NodeId> for SceneGraph {
    type Output = MeshNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for SceneGraph {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        &mut self.nodes[id.0]
    }
}
