//! Tag regions, the containers that own them and the factory that builds them.

mod factory;
mod handles;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::TagConfig;
use crate::geometry::RegionGeometry;
use crate::surface::{NodeId, SurfaceRenderer};

pub use factory::create_region;
pub use handles::{accepted_handle_keys, Edge, Handle, HandleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerId(pub usize);

/// Structural options a new region is furnished with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOptions {
    pub handles: Option<HandleSet>,
    pub edges: bool,
    pub drag: bool,
    /// Class suffix overrides for dots, keyed by handle.
    pub dot_labels: BTreeMap<Handle, String>,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            handles: Some(HandleSet::canonical()),
            edges: true,
            drag: true,
            dot_labels: BTreeMap::new(),
        }
    }
}

impl RegionOptions {
    pub fn from_config(config: &TagConfig) -> Self {
        let handles = config.dots.handle_set();
        let dot_labels = config
            .dot_labels
            .iter()
            .filter(|(handle, _)| handles.is_some_and(|set| set.contains(**handle)))
            .map(|(handle, label)| (*handle, label.clone()))
            .collect();
        Self {
            handles,
            edges: config.edges,
            drag: config.drag,
            dot_labels,
        }
    }

    /// Suffix of the `crop-tag-dot--*` class for `handle`.
    pub fn dot_class_suffix(&self, handle: Handle) -> &str {
        self.dot_labels
            .get(&handle)
            .map(String::as_str)
            .unwrap_or(handle.position())
    }

    pub const fn edge_handles_enabled(&self) -> bool {
        self.edges && self.drag
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub container: ContainerId,
    #[serde(skip)]
    pub node: NodeId,
    #[serde(flatten)]
    pub geometry: RegionGeometry,
    pub drag_enabled: bool,
    pub handles: Option<HandleSet>,
    pub edge_handles_enabled: bool,
    #[serde(skip)]
    pub(crate) dot_nodes: Vec<(Handle, NodeId)>,
    #[serde(skip)]
    pub(crate) edge_nodes: Vec<(Edge, NodeId)>,
}

impl Region {
    pub fn dot_node(&self, handle: Handle) -> Option<NodeId> {
        self.dot_nodes
            .iter()
            .find_map(|(candidate, node)| (*candidate == handle).then_some(*node))
    }

    pub fn edge_node(&self, edge: Edge) -> Option<NodeId> {
        self.edge_nodes
            .iter()
            .find_map(|(candidate, node)| (*candidate == edge).then_some(*node))
    }

    pub(crate) fn apply_geometry<R: SurfaceRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        geometry: RegionGeometry,
    ) {
        self.geometry = geometry;
        renderer.set_attribute(self.node, "style", &geometry.to_css());
    }
}

/// Masked overlay bound to one settled image; origin of its regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: ContainerId,
    pub image: NodeId,
    pub wrapper: NodeId,
    pub mask: NodeId,
    regions: Vec<Region>,
}

impl Container {
    pub fn new(id: ContainerId, image: NodeId, wrapper: NodeId, mask: NodeId) -> Self {
        Self {
            id,
            image,
            wrapper,
            mask,
            regions: Vec::new(),
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    pub(crate) fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|region| region.id == id)
    }

    pub(crate) fn push_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    pub(crate) fn remove_region<R: SurfaceRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        id: RegionId,
    ) -> Option<Region> {
        let index = self.regions.iter().position(|region| region.id == id)?;
        let region = self.regions.remove(index);
        renderer.remove_child(self.mask, region.node);
        Some(region)
    }
}
