use super::{Container, Edge, Region, RegionId, RegionOptions};
use crate::geometry::{compute_anchor_position, ContainerBox, PointerPoint, RegionGeometry};
use crate::surface::{SurfaceRenderer, CROPTAG_DOT, CROPTAG_EDGE, CROPTAG_TAG};

/// Materializes a zero-size region at the pointer-down location and appends
/// its node, dots and edges to the container's mask.
pub fn create_region<'c, R: SurfaceRenderer + ?Sized>(
    renderer: &mut R,
    container: &'c mut Container,
    id: RegionId,
    pointer: PointerPoint,
    container_box: ContainerBox,
    options: &RegionOptions,
) -> &'c Region {
    let (top_pct, left_pct) = compute_anchor_position(container_box, pointer).to_percent(container_box);
    let geometry = RegionGeometry::at(top_pct, left_pct);

    let class = region_class(options.drag);
    let node = renderer.create_element(
        "div",
        &[("class", class.as_str()), ("style", geometry.to_css().as_str())],
        None,
    );

    let mut dot_nodes = Vec::new();
    if let Some(handles) = options.handles {
        for handle in handles.iter() {
            let class = format!("{CROPTAG_DOT} {CROPTAG_DOT}--{}", options.dot_class_suffix(handle));
            let dot = renderer.create_element("div", &[("class", class.as_str())], None);
            renderer.append_child(node, dot);
            dot_nodes.push((handle, dot));
        }
    }

    let mut edge_nodes = Vec::new();
    if options.edge_handles_enabled() {
        for edge in Edge::ALL {
            let class = format!(
                "{CROPTAG_EDGE} {CROPTAG_EDGE}--drag {CROPTAG_EDGE}--{}",
                edge.name()
            );
            let edge_node = renderer.create_element("div", &[("class", class.as_str())], None);
            renderer.append_child(node, edge_node);
            edge_nodes.push((edge, edge_node));
        }
    }

    renderer.append_child(container.mask, node);
    tracing::debug!(
        region = id.0,
        container = container.id.0,
        top_pct,
        left_pct,
        dots = dot_nodes.len(),
        edges = edge_nodes.len(),
        "region created"
    );

    container.push_region(Region {
        id,
        container: container.id,
        node,
        geometry,
        drag_enabled: options.drag,
        handles: options.handles,
        edge_handles_enabled: options.edge_handles_enabled(),
        dot_nodes,
        edge_nodes,
    });
    let index = container.regions.len() - 1;
    &container.regions[index]
}

fn region_class(drag: bool) -> String {
    if drag {
        format!("{CROPTAG_TAG} {CROPTAG_TAG}--drag")
    } else {
        CROPTAG_TAG.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{ContainerId, Handle, HandleSet};
    use crate::surface::{HeadlessSurface, CROPTAG_MASK};

    fn mounted_container(surface: &mut HeadlessSurface) -> (Container, ContainerBox) {
        let root = surface.root();
        let wrapper = surface.create_element("div", &[], None);
        let image = surface.create_element("img", &[("src", "a.png")], None);
        let mask = surface.create_element("div", &[("class", CROPTAG_MASK)], None);
        surface.append_child(root, wrapper);
        surface.append_child(wrapper, image);
        surface.append_child(wrapper, mask);
        let container_box = ContainerBox::new(0.0, 0.0, 400.0, 200.0);
        surface.set_layout(wrapper, container_box);
        (
            Container::new(ContainerId(0), image, wrapper, mask),
            container_box,
        )
    }

    #[test]
    fn default_options_attach_all_dots_edges_and_drag_marker() {
        let mut surface = HeadlessSurface::new();
        let (mut container, container_box) = mounted_container(&mut surface);
        let region = create_region(
            &mut surface,
            &mut container,
            RegionId(1),
            PointerPoint::new(50.0, 50.0),
            container_box,
            &RegionOptions::default(),
        )
        .clone();

        assert_eq!(region.geometry, RegionGeometry::at(25.0, 12.5));
        assert_eq!(region.dot_nodes.len(), 8);
        assert_eq!(region.edge_nodes.len(), 4);
        assert!(region.edge_handles_enabled);
        assert!(surface.has_class(region.node, "crop-tag-element--drag"));
        assert_eq!(surface.parent(region.node), Some(container.mask));
        assert_eq!(surface.children(region.node).len(), 12);

        let top_left = region.dot_node(Handle::TopLeft).expect("top-left dot");
        assert_eq!(
            surface.attribute(top_left, "class").as_deref(),
            Some("crop-tag-dot crop-tag-dot--top-left")
        );
        let bottom = region.edge_node(Edge::Bottom).expect("bottom edge");
        assert_eq!(
            surface.attribute(bottom, "class").as_deref(),
            Some("crop-tag-edge crop-tag-edge--drag crop-tag-edge--bottom")
        );
    }

    #[test]
    fn disabled_drag_drops_edges_and_marker_but_keeps_dots() {
        let mut surface = HeadlessSurface::new();
        let (mut container, container_box) = mounted_container(&mut surface);
        let options = RegionOptions {
            handles: Some(HandleSet::from_handles([Handle::TopLeft, Handle::BottomRight])),
            edges: true,
            drag: false,
            ..RegionOptions::default()
        };
        let region = create_region(
            &mut surface,
            &mut container,
            RegionId(1),
            PointerPoint::new(10.0, 10.0),
            container_box,
            &options,
        )
        .clone();

        assert!(region.edge_nodes.is_empty());
        assert!(!region.edge_handles_enabled);
        assert!(!region.drag_enabled);
        assert!(!surface.has_class(region.node, "crop-tag-element--drag"));
        assert!(surface.has_class(region.node, CROPTAG_TAG));
        assert_eq!(
            region.dot_nodes.iter().map(|(handle, _)| *handle).collect::<Vec<_>>(),
            vec![Handle::TopLeft, Handle::BottomRight]
        );
    }

    #[test]
    fn disabled_dots_attach_no_handles() {
        let mut surface = HeadlessSurface::new();
        let (mut container, container_box) = mounted_container(&mut surface);
        let options = RegionOptions {
            handles: None,
            edges: false,
            drag: true,
            ..RegionOptions::default()
        };
        let region = create_region(
            &mut surface,
            &mut container,
            RegionId(7),
            PointerPoint::new(0.0, 0.0),
            container_box,
            &options,
        )
        .clone();

        assert!(region.handles.is_none());
        assert!(surface.children(region.node).is_empty());
        assert_eq!(container.regions().len(), 1);
        assert_eq!(container.region(RegionId(7)).map(|r| r.id), Some(RegionId(7)));
    }

    #[test]
    fn dot_labels_override_class_suffix() {
        let mut surface = HeadlessSurface::new();
        let (mut container, container_box) = mounted_container(&mut surface);
        let options = RegionOptions {
            handles: Some(HandleSet::from_handles([Handle::TopLeft, Handle::Right])),
            dot_labels: [(Handle::TopLeft, "nw".to_string())].into_iter().collect(),
            ..RegionOptions::default()
        };
        let region = create_region(
            &mut surface,
            &mut container,
            RegionId(1),
            PointerPoint::new(10.0, 10.0),
            container_box,
            &options,
        )
        .clone();

        let class_of = |handle| {
            region
                .dot_node(handle)
                .and_then(|node| surface.attribute(node, "class"))
        };
        assert_eq!(class_of(Handle::TopLeft).as_deref(), Some("crop-tag-dot crop-tag-dot--nw"));
        assert_eq!(
            class_of(Handle::Right).as_deref(),
            Some("crop-tag-dot crop-tag-dot--right")
        );
    }

    #[test]
    fn region_style_is_written_in_percent() {
        let mut surface = HeadlessSurface::new();
        let (mut container, container_box) = mounted_container(&mut surface);
        let node = create_region(
            &mut surface,
            &mut container,
            RegionId(1),
            PointerPoint::new(200.0, 100.0),
            container_box,
            &RegionOptions::default(),
        )
        .node;
        assert_eq!(
            surface.attribute(node, "style").as_deref(),
            Some("position: absolute; top: 50%; left: 50%; width: 0%; height: 0%;")
        );
    }
}
