//! In-memory scene
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Child
//! order is insertion order and is preserved through export and import.
//! Transform queries fold the parent chain on demand.

mod dynamic;
mod element;
mod node;

pub use dynamic::*;
pub use element::*;
pub use node::*;

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Error types for scene manipulation
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Node '{node}' is already a {from}, cannot become a {to}")]
    KindReassigned {
        node: String,
        from: ElementKind,
        to: ElementKind,
    },

    #[error("Unknown node id: {0:?}")]
    UnknownNode(NodeId),

    #[error("Broken hierarchy at {node:?}: {reason}")]
    BrokenHierarchy { node: NodeId, reason: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Index of a node in its [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Arena of scene nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scene saved with [`Scene::save`]
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)?;
        let scene: Scene = serde_json::from_str(&content)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check that ids are in range, parent and child links agree, and every
    /// node is reached exactly once from the roots.
    pub fn validate(&self) -> Result<(), SceneError> {
        let len = self.nodes.len();
        let in_range = |id: NodeId| {
            if id.0 < len {
                Ok(())
            } else {
                Err(SceneError::UnknownNode(id))
            }
        };

        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                in_range(parent)?;
            }
            for child in &node.children {
                in_range(*child)?;
                if self.nodes[child.0].parent != Some(NodeId(index)) {
                    return Err(SceneError::BrokenHierarchy {
                        node: *child,
                        reason: "child does not point back to its parent",
                    });
                }
            }
        }

        let mut stack = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            in_range(*root)?;
            if self.nodes[root.0].parent.is_some() {
                return Err(SceneError::BrokenHierarchy {
                    node: *root,
                    reason: "root has a parent",
                });
            }
            stack.push(*root);
        }

        let mut seen = vec![false; len];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.0], true) {
                return Err(SceneError::BrokenHierarchy {
                    node: id,
                    reason: "reached more than once",
                });
            }
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        if let Some(index) = seen.iter().position(|s| !s) {
            return Err(SceneError::BrokenHierarchy {
                node: NodeId(index),
                reason: "not reachable from a root",
            });
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn add_root(&mut self, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add under `parent`, or as a root when `parent` is `None`
    pub fn insert(&mut self, parent: Option<NodeId>, node: SceneNode) -> NodeId {
        match parent {
            Some(parent) => self.add_child(parent, node),
            None => self.add_root(node),
        }
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Direct child with the given name
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.node(*c).name == name)
    }

    /// Every node, depth-first in document order
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Ancestors from the parent upward
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        self.node(id).active && self.ancestors(id).all(|a| self.node(a).active)
    }

    /// Closest ancestor tagged as a container
    pub fn nearest_container(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.node(*a).is_container())
    }

    /// True when some ancestor is a container
    pub fn is_nested_in_container(&self, id: NodeId) -> bool {
        self.nearest_container(id).is_some()
    }

    /// Local transform of a single node
    pub fn local_matrix(&self, id: NodeId) -> Mat4 {
        let node = self.node(id);
        Mat4::from_scale_rotation_translation(
            node.scale.extend(1.0),
            node.rotation,
            node.position.extend(0.0),
        )
    }

    /// Full parent chain folded into one matrix
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        self.ancestors(id)
            .fold(self.local_matrix(id), |acc, a| self.local_matrix(a) * acc)
    }

    /// Chain folded up to, not including, the nearest container.
    /// Element coordinates in documents are expressed in this frame.
    pub fn container_transform(&self, id: NodeId) -> Mat4 {
        let mut acc = self.local_matrix(id);
        for a in self.ancestors(id) {
            if self.node(a).is_container() {
                break;
            }
            acc = self.local_matrix(a) * acc;
        }
        acc
    }

    /// Product of local scales up to, not including, the nearest container
    pub fn container_scale(&self, id: NodeId) -> Vec2 {
        let mut scale = self.node(id).scale;
        for a in self.ancestors(id) {
            if self.node(a).is_container() {
                break;
            }
            scale *= self.node(a).scale;
        }
        scale
    }

    pub fn world_position(&self, id: NodeId) -> Vec2 {
        self.world_transform(id).w_axis.truncate().truncate()
    }

    /// World-space axis-aligned bounds of a node's sprite as (min, max)
    pub fn world_bounds(&self, id: NodeId) -> Option<(Vec2, Vec2)> {
        let native = self.node(id).visual.as_ref()?.texture()?;
        let extent = native.as_vec2() / crate::units::PIXELS_PER_UNIT;
        let transform = self.world_transform(id);
        let corners = [
            Vec3::ZERO,
            Vec3::new(extent.x, 0.0, 0.0),
            Vec3::new(0.0, -extent.y, 0.0),
            Vec3::new(extent.x, -extent.y, 0.0),
        ]
        .map(|c| transform.transform_point3(c).truncate());

        let min = corners.iter().copied().reduce(Vec2::min)?;
        let max = corners.iter().copied().reduce(Vec2::max)?;
        Some((min, max))
    }

    /// Local position that places a node at `world` under `parent`
    pub fn local_point(&self, parent: Option<NodeId>, world: Vec2) -> Vec2 {
        match parent {
            Some(parent) => self
                .world_transform(parent)
                .inverse()
                .transform_point3(world.extend(0.0))
                .truncate(),
            None => world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_walk_is_depth_first() {
        let mut scene = Scene::new();
        let a = scene.add_root(SceneNode::new("a"));
        let a1 = scene.add_child(a, SceneNode::new("a1"));
        scene.add_child(a1, SceneNode::new("a1x"));
        scene.add_child(a, SceneNode::new("a2"));
        scene.add_root(SceneNode::new("b"));

        let names: Vec<_> = scene.walk().iter().map(|id| scene.node(*id).name.clone()).collect();
        assert_eq!(names, ["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn test_world_transform_folds_chain() {
        let mut scene = Scene::new();
        let root = scene.add_root(SceneNode::new("root").at(Vec2::new(1.0, 2.0)).scaled(Vec2::splat(2.0)));
        let child = scene.add_child(root, SceneNode::new("child").at(Vec2::new(0.5, 0.5)));
        assert!(approx(scene.world_position(child), Vec2::new(2.0, 3.0)));
    }

    #[test]
    fn test_container_frame_stops_at_container() {
        let mut scene = Scene::new();
        let group = scene.add_root(SceneNode::new("Factor_1").at(Vec2::new(10.0, 0.0)));
        let object = scene.add_child(group, SceneNode::tagged("house", Element::Object).at(Vec2::new(5.0, 5.0)));
        let wrapper = scene.add_child(object, SceneNode::new("wrap").at(Vec2::new(1.0, 0.0)).scaled(Vec2::splat(2.0)));
        let leaf = scene.add_child(wrapper, SceneNode::tagged("floor", Element::Platform).at(Vec2::new(1.0, 1.0)));

        let local = scene.container_transform(leaf).w_axis.truncate().truncate();
        assert!(approx(local, Vec2::new(3.0, 2.0)));
        assert_eq!(scene.container_scale(leaf), Vec2::splat(2.0));
        assert_eq!(scene.nearest_container(leaf), Some(object));
        assert!(scene.is_nested_in_container(leaf));
        assert!(!scene.is_nested_in_container(object));
        assert!(approx(scene.world_position(leaf), Vec2::new(18.0, 7.0)));
    }

    #[test]
    fn test_active_in_hierarchy() {
        let mut scene = Scene::new();
        let root = scene.add_root(SceneNode::new("root"));
        let child = scene.add_child(root, SceneNode::new("child"));
        assert!(scene.is_active_in_hierarchy(child));
        scene.node_mut(root).active = false;
        assert!(!scene.is_active_in_hierarchy(child));
    }

    #[test]
    fn test_local_point_inverts_parent() {
        let mut scene = Scene::new();
        let parent = scene.add_root(SceneNode::new("p").at(Vec2::new(2.0, 0.0)).scaled(Vec2::splat(2.0)));
        let local = scene.local_point(Some(parent), Vec2::new(4.0, 2.0));
        assert!(approx(local, Vec2::new(1.0, 1.0)));
        assert_eq!(scene.local_point(None, Vec2::ONE), Vec2::ONE);
    }

    #[test]
    fn test_world_bounds() {
        let mut scene = Scene::new();
        let id = scene.add_root(
            SceneNode::new("img")
                .at(Vec2::new(1.0, 1.0))
                .with_visual(Visual::new("wall", Some(NativeSize::new(200, 100)))),
        );
        let (min, max) = scene.world_bounds(id).unwrap();
        assert!(approx(min, Vec2::new(1.0, 0.0)));
        assert!(approx(max, Vec2::new(3.0, 1.0)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");

        let mut scene = Scene::new();
        let root = scene.add_root(SceneNode::tagged("obj", Element::Object).on_layer("1"));
        scene.add_child(root, SceneNode::tagged("cam", Element::Camera).at(Vec2::new(1.0, -1.0)));
        scene.save(&path).unwrap();

        let loaded = Scene::load(&path).unwrap();
        assert_eq!(loaded, scene);
        assert_eq!(loaded.children(root).len(), 1);
    }

    fn saved_json(scene: &Scene) -> serde_json::Value {
        serde_json::to_value(scene).unwrap()
    }

    fn load_patched(value: &serde_json::Value) -> Result<Scene, SceneError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        Scene::load(&path)
    }

    fn two_nodes() -> Scene {
        let mut scene = Scene::new();
        let root = scene.add_root(SceneNode::tagged("obj", Element::Object).on_layer("1"));
        scene.add_child(root, SceneNode::tagged("cam", Element::Camera));
        scene
    }

    #[test]
    fn test_load_rejects_dangling_child() {
        let mut value = saved_json(&two_nodes());
        value["nodes"][0]["children"] = serde_json::json!([7]);
        let result = load_patched(&value);
        assert!(matches!(result, Err(SceneError::UnknownNode(NodeId(7)))));

        let mut value = saved_json(&two_nodes());
        value["roots"] = serde_json::json!([0, 9]);
        assert!(matches!(load_patched(&value), Err(SceneError::UnknownNode(NodeId(9)))));
    }

    #[test]
    fn test_load_rejects_cycles_and_mismatched_links() {
        // cam lists itself as a child while pointing at obj
        let mut value = saved_json(&two_nodes());
        value["nodes"][1]["children"] = serde_json::json!([1]);
        assert!(matches!(load_patched(&value), Err(SceneError::BrokenHierarchy { .. })));

        // obj and cam point at each other and neither is reachable
        let mut value = saved_json(&two_nodes());
        value["nodes"][0]["parent"] = serde_json::json!(1);
        value["nodes"][1]["children"] = serde_json::json!([0]);
        value["roots"] = serde_json::json!([]);
        assert!(matches!(load_patched(&value), Err(SceneError::BrokenHierarchy { .. })));

        // cam listed as a root as well as a child
        let mut value = saved_json(&two_nodes());
        value["roots"] = serde_json::json!([0, 1]);
        assert!(matches!(load_patched(&value), Err(SceneError::BrokenHierarchy { .. })));

        assert!(load_patched(&saved_json(&two_nodes())).is_ok());
    }
}
