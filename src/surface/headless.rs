use std::collections::{BTreeMap, HashMap};

use super::{ImageStatus, ListenerId, NodeId, PointerEventKind, SurfaceRenderer};
use crate::geometry::ContainerBox;

#[derive(Debug, Clone, Default)]
struct HeadlessNode {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    inner_html: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layout: Option<ContainerBox>,
    natural_size: Option<(u32, u32)>,
}

/// In-memory node tree used when no real display surface is attached.
///
/// Nodes without an explicit layout box take their parent's box, which is how
/// wrapper and mask nodes (`width: 100%; height: 100%`) behave on a page.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    nodes: HashMap<NodeId, HeadlessNode>,
    root: NodeId,
    next_node: u64,
    listeners: BTreeMap<u64, PointerEventKind>,
    next_listener: u64,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            HeadlessNode {
                tag: "body".to_string(),
                ..HeadlessNode::default()
            },
        );
        Self {
            nodes,
            root,
            next_node: 1,
            listeners: BTreeMap::new(),
            next_listener: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_layout(&mut self, node: NodeId, layout: ContainerBox) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.layout = Some(layout);
        }
    }

    /// Marks an image node as complete with the given natural size. A zero
    /// dimension models a broken image that finished loading.
    pub fn mark_image_complete(&mut self, node: NodeId, width: u32, height: u32) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.natural_size = Some((width, height));
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.nodes
            .get(&node)
            .map(|entry| entry.classes.clone())
            .unwrap_or_default()
    }

    pub fn inner_html(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node)?.inner_html.as_deref()
    }

    pub fn listener_count(&self, kind: PointerEventKind) -> usize {
        self.listeners.values().filter(|value| **value == kind).count()
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get(&child).and_then(|entry| entry.parent) else {
            return;
        };
        if let Some(parent_entry) = self.nodes.get_mut(&parent) {
            parent_entry.children.retain(|existing| *existing != child);
        }
        if let Some(entry) = self.nodes.get_mut(&child) {
            entry.parent = None;
        }
    }

    fn attach_at(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if parent == child || !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child)
        {
            tracing::warn!(?parent, ?child, "ignoring attach of unknown or self node");
            return;
        }
        self.detach(child);
        if let Some(parent_entry) = self.nodes.get_mut(&parent) {
            let index = index
                .unwrap_or(parent_entry.children.len())
                .min(parent_entry.children.len());
            parent_entry.children.insert(index, child);
        }
        if let Some(entry) = self.nodes.get_mut(&child) {
            entry.parent = Some(parent);
        }
    }
}

impl SurfaceRenderer for HeadlessSurface {
    fn create_element(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
        inner_html: Option<&str>,
    ) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node = self.next_node.saturating_add(1);
        self.nodes.insert(
            node,
            HeadlessNode {
                tag: tag.to_string(),
                inner_html: inner_html.filter(|html| !html.is_empty()).map(str::to_string),
                ..HeadlessNode::default()
            },
        );
        for (name, value) in attributes {
            self.set_attribute(node, name, value);
        }
        node
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(entry) = self.nodes.get_mut(&node) else {
            return;
        };
        if name == "class" {
            entry.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            entry.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let entry = self.nodes.get(&node)?;
        if name == "class" {
            return Some(entry.classes.join(" "));
        }
        entry.attributes.get(name).cloned()
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach_at(parent, child, None);
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        let index = self
            .nodes
            .get(&parent)
            .and_then(|entry| entry.children.iter().position(|id| *id == reference));
        self.attach_at(parent, child, index);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) == Some(parent) {
            self.detach(child);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|entry| entry.tag.clone())
    }

    fn image_status(&self, node: NodeId) -> Option<ImageStatus> {
        let entry = self.nodes.get(&node)?;
        if !entry.tag.eq_ignore_ascii_case("img") {
            return None;
        }
        let (natural_width, natural_height) = entry.natural_size.unwrap_or((0, 0));
        Some(ImageStatus {
            src: entry.attributes.get("src").cloned().unwrap_or_default(),
            complete: entry.natural_size.is_some(),
            natural_width,
            natural_height,
        })
    }

    fn bounding_box(&self, node: NodeId) -> ContainerBox {
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(entry) = self.nodes.get(&id) else {
                break;
            };
            if let Some(layout) = entry.layout {
                return layout;
            }
            current = entry.parent;
        }
        ContainerBox::default()
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            if !entry.classes.iter().any(|existing| existing == class) {
                entry.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(entry) = self.nodes.get_mut(&node) {
            entry.classes.retain(|existing| existing != class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|entry| entry.classes.iter().any(|existing| existing == class))
    }

    fn add_global_listener(&mut self, kind: PointerEventKind) -> ListenerId {
        let id = self.next_listener;
        self.next_listener = self.next_listener.saturating_add(1);
        self.listeners.insert(id, kind);
        ListenerId(id)
    }

    fn remove_global_listener(&mut self, listener: ListenerId) -> bool {
        self.listeners.remove(&listener.0).is_some()
    }
}
