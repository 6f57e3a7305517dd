//! # Scene Graph
//!
//! Ownership tree of groups and meshes stored in a generational arena.
//!
//! ```text
//! root
//! ├── cable
//! │   ├── layer-conductor      (mesh: 1 geometry, 1+ materials)
//! │   ├── ...
//! │   └── layer-jacket
//! ├── sensor
//! │   ├── sensor-housing
//! │   ├── screen-0 .. screen-5
//! │   └── led-0 .. led-5
//! └── overlays
//! ```
//!
//! ## Invariants
//!
//! - A node exclusively owns its children; a mesh exclusively owns its
//!   geometry and material handles. Only maps are shared (refcounted).
//! - Teardown walks bottom-up: each node is unlinked from its parent, then
//!   its handles are released. Every node is released exactly once because
//!   removal takes it out of the arena.

use std::collections::HashMap;

use cablesight_core::{SlotArena, SlotHandle};
use cablesight_shared::Mat4;

use super::geometry::Geometry;
use super::material::MaterialLayer;
use super::transform::Transform;
use crate::backend::{DrawItem, GpuHandle, RenderBackend};
use crate::error::{EngineError, EngineResult};

/// Handle to a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(SlotHandle);

/// A material and its GPU handle.
#[derive(Debug)]
pub struct MaterialSlot {
    layer: MaterialLayer,
    handle: GpuHandle,
    dirty: bool,
}

impl MaterialSlot {
    /// Material parameters.
    #[must_use]
    pub const fn layer(&self) -> &MaterialLayer {
        &self.layer
    }

    /// GPU handle.
    #[must_use]
    pub const fn handle(&self) -> GpuHandle {
        self.handle
    }

    /// Returns true if parameters changed since the last flush.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Drawable leaf: one geometry, one or more materials.
#[derive(Debug)]
pub struct Mesh {
    geometry: GpuHandle,
    materials: Vec<MaterialSlot>,
}

impl Mesh {
    /// Geometry handle.
    #[must_use]
    pub const fn geometry(&self) -> GpuHandle {
        self.geometry
    }

    /// Material slots.
    #[must_use]
    pub fn materials(&self) -> &[MaterialSlot] {
        &self.materials
    }
}

/// Node payload.
#[derive(Debug)]
pub enum NodeKind {
    /// Transform-only grouping node.
    Group,
    /// Drawable leaf.
    Mesh(Mesh),
}

/// One scene node.
#[derive(Debug)]
pub struct Node {
    name: String,
    transform: Transform,
    visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    /// Unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local transform.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Own visibility flag (ancestors may still hide the node).
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Parent, `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Payload.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mesh payload, if this is a mesh.
    #[must_use]
    pub const fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }
}

/// What a teardown released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    /// Nodes removed.
    pub nodes: u32,
    /// Geometry handles released.
    pub geometries: u32,
    /// Material handles released.
    pub materials: u32,
    /// Shared textures whose last holder was released.
    pub textures: u32,
}

impl DisposeReport {
    fn absorb(&mut self, other: Self) {
        self.nodes += other.nodes;
        self.geometries += other.geometries;
        self.materials += other.materials;
        self.textures += other.textures;
    }
}

/// Scene ownership tree.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotArena<Node>,
    names: HashMap<String, NodeId>,
    root: NodeId,
}

impl SceneGraph {
    /// Name of the root group.
    pub const ROOT: &'static str = "root";

    /// Graph with only a root group.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotArena::with_capacity(64);
        let root = NodeId(nodes.insert(Node {
            name: Self::ROOT.to_string(),
            transform: Transform::IDENTITY,
            visible: true,
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Group,
        }));
        let mut names = HashMap::new();
        names.insert(Self::ROOT.to_string(), root);
        Self { nodes, names, root }
    }

    /// Root group.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if only the root remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Number of mesh nodes.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|(_, n)| n.mesh().is_some()).count()
    }

    /// Looks a node up by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Looks a node up by handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> EngineResult<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| EngineError::StaleNode(format!("#{}", id.0.index())))
    }

    fn check_insert(&mut self, parent: NodeId, name: &str) -> EngineResult<()> {
        self.node_mut(parent)?;
        if self.names.contains_key(name) {
            return Err(EngineError::InvalidGeometry(format!("duplicate node name `{name}`")));
        }
        Ok(())
    }

    fn insert(&mut self, parent: NodeId, name: String, transform: Transform, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.insert(Node {
            name: name.clone(),
            transform,
            visible: true,
            parent: Some(parent),
            children: Vec::new(),
            kind,
        }));
        self.names.insert(name, id);
        // Parent was checked by the caller
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Adds a group under `parent`.
    ///
    /// # Errors
    ///
    /// `StaleNode` if `parent` is gone, `InvalidGeometry` for a duplicate name.
    pub fn add_group(&mut self, parent: NodeId, name: impl Into<String>, transform: Transform) -> EngineResult<NodeId> {
        let name = name.into();
        self.check_insert(parent, &name)?;
        Ok(self.insert(parent, name, transform, NodeKind::Group))
    }

    /// Uploads `geometry` and `layers` and adds them as a mesh under `parent`.
    ///
    /// On failure everything uploaded by this call is released again and
    /// the layers give up their maps.
    ///
    /// # Errors
    ///
    /// `StaleNode`, `InvalidGeometry` (no layers, duplicate name) or a
    /// terminal backend error.
    pub fn spawn_mesh<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        parent: NodeId,
        name: impl Into<String>,
        geometry: &Geometry,
        layers: Vec<MaterialLayer>,
        transform: Transform,
    ) -> EngineResult<NodeId> {
        let name = name.into();
        let prepared = self.prepare_mesh(backend, parent, &name, geometry, &layers);
        let (geometry_handle, material_handles) = match prepared {
            Ok(handles) => handles,
            Err(err) => {
                for mut layer in layers {
                    layer.release_map(backend);
                }
                return Err(err);
            }
        };

        let materials = layers
            .into_iter()
            .zip(material_handles)
            .map(|(layer, handle)| MaterialSlot {
                layer,
                handle,
                dirty: false,
            })
            .collect();
        let mesh = Mesh {
            geometry: geometry_handle,
            materials,
        };

        Ok(self.insert(parent, name, transform, NodeKind::Mesh(mesh)))
    }

    fn prepare_mesh<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        parent: NodeId,
        name: &str,
        geometry: &Geometry,
        layers: &[MaterialLayer],
    ) -> EngineResult<(GpuHandle, Vec<GpuHandle>)> {
        self.check_insert(parent, name)?;
        if layers.is_empty() {
            return Err(EngineError::InvalidGeometry(format!("mesh `{name}` has no material")));
        }

        let geometry_handle = backend.create_geometry(geometry)?;
        let mut material_handles = Vec::with_capacity(layers.len());
        for layer in layers {
            match backend.create_material(layer) {
                Ok(handle) => material_handles.push(handle),
                Err(err) => {
                    for handle in material_handles {
                        backend.release(handle);
                    }
                    backend.release(geometry_handle);
                    return Err(err);
                }
            }
        }
        Ok((geometry_handle, material_handles))
    }

    /// Shows or hides a node and its subtree.
    ///
    /// # Errors
    ///
    /// `StaleNode` if the node is gone.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> EngineResult<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    /// Replaces a node's local transform.
    ///
    /// # Errors
    ///
    /// `StaleNode` if the node is gone.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> EngineResult<()> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    /// Mutable access to a mesh material; marks it for the next flush.
    ///
    /// # Errors
    ///
    /// `StaleNode` if the node is gone or has no such material.
    pub fn material_mut(&mut self, id: NodeId, index: usize) -> EngineResult<&mut MaterialLayer> {
        let node = self.node_mut(id)?;
        let name = node.name.clone();
        match &mut node.kind {
            NodeKind::Mesh(mesh) => match mesh.materials.get_mut(index) {
                Some(slot) => {
                    slot.dirty = true;
                    Ok(&mut slot.layer)
                }
                None => Err(EngineError::StaleNode(format!("{name}/material-{index}"))),
            },
            NodeKind::Group => Err(EngineError::StaleNode(format!("{name}/material-{index}"))),
        }
    }

    /// Pushes every dirty material to the backend. Returns how many.
    ///
    /// # Errors
    ///
    /// Terminal backend error.
    pub fn flush_materials<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> EngineResult<u32> {
        let mut flushed = 0;
        for (_, node) in self.nodes.iter_mut() {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                for slot in mesh.materials.iter_mut().filter(|s| s.dirty) {
                    backend.update_material(slot.handle, &slot.layer)?;
                    slot.dirty = false;
                    flushed += 1;
                }
            }
        }
        Ok(flushed)
    }

    /// Appends one draw per visible mesh material, parents first.
    pub fn collect_draws(&self, out: &mut Vec<DrawItem>) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.to_matrix();
            if let NodeKind::Mesh(mesh) = &node.kind {
                out.extend(mesh.materials.iter().map(|slot| DrawItem {
                    geometry: mesh.geometry,
                    material: slot.handle,
                    transform: world,
                }));
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }
    }

    /// Number of meshes that would be drawn (visible with all ancestors).
    #[must_use]
    pub fn visible_mesh_count(&self) -> usize {
        let mut draws = Vec::new();
        self.collect_draws(&mut draws);
        let mut geometries: Vec<GpuHandle> = draws.iter().map(|d| d.geometry).collect();
        geometries.dedup();
        geometries.len()
    }

    /// Removes `id` and its subtree bottom-up, releasing every handle.
    ///
    /// Removing the root empties the graph entirely.
    pub fn remove_subtree<B: RenderBackend + ?Sized>(&mut self, id: NodeId, backend: &mut B) -> DisposeReport {
        let mut report = DisposeReport::default();

        // Post-order: every child before its parent
        let mut order = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((node_id, expanded)) = stack.pop() {
            if expanded {
                order.push(node_id);
                continue;
            }
            if let Some(node) = self.nodes.get(node_id.0) {
                stack.push((node_id, true));
                stack.extend(node.children.iter().map(|&c| (c, false)));
            }
        }

        for node_id in order {
            self.unlink(node_id);
            if let Some(node) = self.nodes.remove(node_id.0) {
                self.names.remove(&node.name);
                report.absorb(Self::release_node(node, backend));
            }
        }
        report
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(id.0).and_then(|n| n.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            parent.children.retain(|&c| c != id);
        }
    }

    fn release_node<B: RenderBackend + ?Sized>(node: Node, backend: &mut B) -> DisposeReport {
        debug_assert!(node.parent.is_none() && node.children.is_empty());
        let mut report = DisposeReport {
            nodes: 1,
            ..DisposeReport::default()
        };
        if let NodeKind::Mesh(mesh) = node.kind {
            for mut slot in mesh.materials {
                backend.release(slot.handle);
                report.materials += 1;
                if slot.layer.release_map(backend) {
                    report.textures += 1;
                }
            }
            backend.release(mesh.geometry);
            report.geometries += 1;
        }
        report
    }

    /// Tears the whole graph down, bottom-up, exactly once.
    pub fn dispose<B: RenderBackend + ?Sized>(mut self, backend: &mut B) -> DisposeReport {
        let root = self.root;
        let report = self.remove_subtree(root, backend);
        tracing::debug!(
            "scene disposed: {} nodes, {} geometries, {} materials, {} textures",
            report.nodes,
            report.geometries,
            report.materials,
            report.textures
        );
        report
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, ResourceKind};

    fn layer() -> MaterialLayer {
        MaterialLayer::new([0.5; 3])
    }

    #[test]
    fn test_spawn_and_dispose() {
        let mut backend = HeadlessBackend::new();
        let mut graph = SceneGraph::new();
        let group = graph.add_group(graph.root(), "cable", Transform::IDENTITY).unwrap();
        let quad = Geometry::quad("q", 1.0, 1.0);
        graph
            .spawn_mesh(&mut backend, group, "a", &quad, vec![layer(), layer()], Transform::IDENTITY)
            .unwrap();
        graph
            .spawn_mesh(&mut backend, group, "b", &quad, vec![layer()], Transform::IDENTITY)
            .unwrap();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.mesh_count(), 2);
        assert_eq!(backend.live_counts().total(), 5);

        let report = graph.dispose(&mut backend);
        assert_eq!(report.nodes, 4);
        assert_eq!(report.geometries, 2);
        assert_eq!(report.materials, 3);
        assert_eq!(backend.live_counts().total(), 0);
        assert_eq!(backend.double_releases(), 0);
    }

    #[test]
    fn test_failed_spawn_releases_partial_upload() {
        let mut backend = HeadlessBackend::new();
        let mut graph = SceneGraph::new();
        backend.fail_next_allocation(ResourceKind::Material);
        let quad = Geometry::quad("q", 1.0, 1.0);
        let err = graph
            .spawn_mesh(&mut backend, graph.root(), "a", &quad, vec![layer()], Transform::IDENTITY)
            .unwrap_err();
        assert!(err.is_terminal());
        assert_eq!(backend.live_counts().total(), 0);
        assert!(graph.find("a").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut graph = SceneGraph::new();
        graph.add_group(graph.root(), "x", Transform::IDENTITY).unwrap();
        assert!(matches!(
            graph.add_group(graph.root(), "x", Transform::IDENTITY),
            Err(EngineError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_hidden_group_hides_subtree() {
        let mut backend = HeadlessBackend::new();
        let mut graph = SceneGraph::new();
        let group = graph.add_group(graph.root(), "g", Transform::IDENTITY).unwrap();
        let quad = Geometry::quad("q", 1.0, 1.0);
        graph
            .spawn_mesh(&mut backend, group, "m", &quad, vec![layer()], Transform::IDENTITY)
            .unwrap();
        assert_eq!(graph.visible_mesh_count(), 1);

        graph.set_visible(group, false).unwrap();
        assert_eq!(graph.visible_mesh_count(), 0);
    }

    #[test]
    fn test_remove_subtree_unlinks() {
        let mut backend = HeadlessBackend::new();
        let mut graph = SceneGraph::new();
        let group = graph.add_group(graph.root(), "g", Transform::IDENTITY).unwrap();
        let quad = Geometry::quad("q", 1.0, 1.0);
        graph
            .spawn_mesh(&mut backend, group, "m", &quad, vec![layer()], Transform::IDENTITY)
            .unwrap();

        let report = graph.remove_subtree(group, &mut backend);
        assert_eq!(report.nodes, 2);
        assert!(graph.node(graph.root()).unwrap().children().is_empty());
        assert!(graph.find("m").is_none());
        assert!(graph.set_visible(group, true).is_err());
    }

    #[test]
    fn test_material_flush() {
        let mut backend = HeadlessBackend::new();
        let mut graph = SceneGraph::new();
        let quad = Geometry::quad("q", 1.0, 1.0);
        let mesh = graph
            .spawn_mesh(&mut backend, graph.root(), "m", &quad, vec![layer()], Transform::IDENTITY)
            .unwrap();

        graph.material_mut(mesh, 0).unwrap().emissive_intensity = 2.0;
        assert_eq!(graph.flush_materials(&mut backend).unwrap(), 1);
        assert_eq!(graph.flush_materials(&mut backend).unwrap(), 0);
        assert!(graph.material_mut(mesh, 3).is_err());
    }
}
