use crate::geometry::{compute_drag_geometry, ContainerBox, PointerPoint, RegionGeometry};
use crate::region::{create_region, Container, ContainerId, RegionId, RegionOptions};
use crate::surface::{ListenerId, NodeId, PointerEventKind, SurfaceRenderer, CROPTAG_MASK, CROPTAG_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

/// State of one create-or-resize gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub id: SessionId,
    pub region: RegionId,
    pub container: ContainerId,
    pub anchor: PointerPoint,
    pub container_box: ContainerBox,
    pub initial_top_pct: f64,
    pub initial_left_pct: f64,
    move_listener: ListenerId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionUpdate {
    Started {
        session: SessionId,
        region: RegionId,
    },
    Moved {
        session: SessionId,
        region: RegionId,
        geometry: RegionGeometry,
        resized: bool,
    },
    Finished {
        session: SessionId,
        region: RegionId,
        geometry: RegionGeometry,
    },
}

/// Drives pointer-down → pointer-move* → pointer-up for a single surface.
///
/// At most one session is active; the global move listener lives exactly as
/// long as that session.
#[derive(Debug)]
pub struct DragController {
    options: RegionOptions,
    session: Option<DragSession>,
    next_session: u64,
    next_region: u64,
}

impl DragController {
    pub fn new(options: RegionOptions) -> Self {
        Self {
            options,
            session: None,
            next_session: 1,
            next_region: 1,
        }
    }

    pub fn options(&self) -> &RegionOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    pub fn active_session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn next_state(&self, event: PointerEventKind) -> Option<SessionState> {
        use PointerEventKind::*;
        match (self.state(), event) {
            (SessionState::Idle, Down) => Some(SessionState::Active),
            (SessionState::Active, Move) => Some(SessionState::Active),
            (SessionState::Active, Up) => Some(SessionState::Idle),
            _ => None,
        }
    }

    /// Maps a pointer-down target to the index of the container whose mask it
    /// hits. With edges enabled a hit on a region resolves to its container.
    pub fn resolve_container<R: SurfaceRenderer + ?Sized>(
        &self,
        renderer: &R,
        containers: &[Container],
        target: NodeId,
    ) -> Option<usize> {
        let mut node = target;
        if self.options.edges && renderer.has_class(node, CROPTAG_TAG) {
            node = renderer.parent(node)?;
        }
        if !renderer.has_class(node, CROPTAG_MASK) {
            return None;
        }
        containers.iter().position(|container| container.mask == node)
    }

    pub fn pointer_down<R: SurfaceRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        containers: &mut [Container],
        target: NodeId,
        point: PointerPoint,
    ) -> Option<SessionUpdate> {
        if self.next_state(PointerEventKind::Down).is_none() {
            tracing::debug!(?target, "pointer-down ignored while a drag session is active");
            return None;
        }
        let Some(index) = self.resolve_container(renderer, containers, target) else {
            tracing::trace!(?target, "pointer-down outside any masked container");
            return None;
        };

        let container = &mut containers[index];
        let container_box = renderer.bounding_box(container.mask);
        let region_id = RegionId(self.next_region);
        self.next_region = self.next_region.saturating_add(1);
        let region = create_region(
            renderer,
            container,
            region_id,
            point,
            container_box,
            &self.options,
        );
        let (initial_top_pct, initial_left_pct) = (region.geometry.top_pct, region.geometry.left_pct);

        let session = DragSession {
            id: SessionId(self.next_session),
            region: region_id,
            container: container.id,
            anchor: point,
            container_box,
            initial_top_pct,
            initial_left_pct,
            move_listener: renderer.add_global_listener(PointerEventKind::Move),
        };
        self.next_session = self.next_session.saturating_add(1);
        tracing::debug!(
            session = session.id.0,
            region = region_id.0,
            container = session.container.0,
            from = ?SessionState::Idle,
            to = ?SessionState::Active,
            "drag session started"
        );
        let update = SessionUpdate::Started {
            session: session.id,
            region: region_id,
        };
        self.session = Some(session);
        Some(update)
    }

    pub fn pointer_move<R: SurfaceRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        containers: &mut [Container],
        point: PointerPoint,
    ) -> Option<SessionUpdate> {
        let session = self.session.as_ref()?;
        let geometry = compute_drag_geometry(
            session.container_box,
            session.initial_top_pct,
            session.initial_left_pct,
            session.anchor,
            point,
        );
        let Some(region) = containers
            .get_mut(session.container.0)
            .and_then(|container| container.region_mut(session.region))
        else {
            tracing::warn!(session = session.id.0, "active region vanished during drag");
            return None;
        };
        let resized = region.geometry.width_pct != geometry.width_pct
            || region.geometry.height_pct != geometry.height_pct;
        region.apply_geometry(renderer, geometry);
        Some(SessionUpdate::Moved {
            session: session.id,
            region: session.region,
            geometry,
            resized,
        })
    }

    /// Ends the active session and detaches its move listener. A pointer-up
    /// without a session is a no-op.
    pub fn pointer_up<R: SurfaceRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        containers: &[Container],
    ) -> Option<SessionUpdate> {
        let Some(session) = self.session.take() else {
            tracing::trace!("pointer-up without an active drag session");
            return None;
        };
        if !renderer.remove_global_listener(session.move_listener) {
            tracing::warn!(session = session.id.0, "move listener was already detached");
        }
        let geometry = containers
            .get(session.container.0)
            .and_then(|container| container.region(session.region))
            .map(|region| region.geometry)
            .unwrap_or_default();
        tracing::debug!(
            session = session.id.0,
            region = session.region.0,
            from = ?SessionState::Active,
            to = ?SessionState::Idle,
            "drag session finished"
        );
        Some(SessionUpdate::Finished {
            session: session.id,
            region: session.region,
            geometry,
        })
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(RegionOptions::default())
    }
}

impl std::fmt::Display for DragController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;

    fn surface_with_container() -> (HeadlessSurface, Vec<Container>) {
        let mut surface = HeadlessSurface::new();
        let root = surface.root();
        let wrapper = surface.create_element("div", &[], None);
        let image = surface.create_element("img", &[("src", "a.png")], None);
        let mask = surface.create_element("div", &[("class", CROPTAG_MASK)], None);
        surface.append_child(root, wrapper);
        surface.append_child(wrapper, image);
        surface.append_child(wrapper, mask);
        surface.set_layout(wrapper, ContainerBox::new(100.0, 100.0, 400.0, 200.0));
        (
            surface,
            vec![Container::new(ContainerId(0), image, wrapper, mask)],
        )
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn next_state_tracks_valid_and_ignored_events() {
        let mut controller = DragController::default();
        assert_eq!(controller.next_state(PointerEventKind::Down), Some(SessionState::Active));
        assert_eq!(controller.next_state(PointerEventKind::Move), None);
        assert_eq!(controller.next_state(PointerEventKind::Up), None);

        let (mut surface, mut containers) = surface_with_container();
        let mask = containers[0].mask;
        controller
            .pointer_down(&mut surface, &mut containers, mask, PointerPoint::new(150.0, 150.0))
            .expect("pointer-down on mask starts a session");
        assert_eq!(controller.next_state(PointerEventKind::Down), None);
        assert_eq!(controller.next_state(PointerEventKind::Move), Some(SessionState::Active));
        assert_eq!(controller.next_state(PointerEventKind::Up), Some(SessionState::Idle));
    }

    #[test]
    fn full_gesture_shapes_region_in_percent() {
        let (mut surface, mut containers) = surface_with_container();
        let mut controller = DragController::default();
        let mask = containers[0].mask;

        let started = controller
            .pointer_down(&mut surface, &mut containers, mask, PointerPoint::new(150.0, 150.0))
            .expect("session should start");
        let SessionUpdate::Started { region, .. } = started else {
            panic!("unexpected update {started:?}");
        };
        assert_eq!(surface.listener_count(PointerEventKind::Move), 1);

        let moved = controller
            .pointer_move(&mut surface, &mut containers, PointerPoint::new(350.0, 250.0))
            .expect("move should update region");
        assert!(matches!(moved, SessionUpdate::Moved { resized: true, .. }));

        let finished = controller
            .pointer_up(&mut surface, &containers)
            .expect("up should finish the session");
        assert!(matches!(finished, SessionUpdate::Finished { .. }));
        assert_eq!(controller.state(), SessionState::Idle);
        assert_eq!(surface.listener_count(PointerEventKind::Move), 0);

        let geometry = containers[0].region(region).expect("region exists").geometry;
        assert_close(geometry.left_pct, 12.5);
        assert_close(geometry.top_pct, 25.0);
        assert_close(geometry.width_pct, 50.0);
        assert_close(geometry.height_pct, 50.0);
    }

    #[test]
    fn repeated_move_to_same_point_is_idempotent() {
        let (mut surface, mut containers) = surface_with_container();
        let mut controller = DragController::default();
        let mask = containers[0].mask;
        controller.pointer_down(&mut surface, &mut containers, mask, PointerPoint::new(150.0, 150.0));

        let first = controller.pointer_move(&mut surface, &mut containers, PointerPoint::new(200.0, 180.0));
        let second = controller.pointer_move(&mut surface, &mut containers, PointerPoint::new(200.0, 180.0));
        let (Some(SessionUpdate::Moved { geometry: a, .. }), Some(SessionUpdate::Moved { geometry: b, resized, .. })) =
            (first, second)
        else {
            panic!("both moves should update the region");
        };
        assert_eq!(a, b);
        assert!(!resized);
    }

    #[test]
    fn pointer_down_while_active_creates_no_second_region() {
        let (mut surface, mut containers) = surface_with_container();
        let mut controller = DragController::default();
        let mask = containers[0].mask;
        controller
            .pointer_down(&mut surface, &mut containers, mask, PointerPoint::new(150.0, 150.0))
            .expect("session should start");
        controller.pointer_move(&mut surface, &mut containers, PointerPoint::new(250.0, 200.0));
        let before = containers[0].regions()[0].geometry;

        let ignored =
            controller.pointer_down(&mut surface, &mut containers, mask, PointerPoint::new(400.0, 250.0));
        assert!(ignored.is_none());
        assert_eq!(containers[0].regions().len(), 1);
        assert_eq!(containers[0].regions()[0].geometry, before);
        assert_eq!(surface.listener_count(PointerEventKind::Move), 1);
    }

    #[test]
    fn pointer_down_outside_mask_is_ignored() {
        let (mut surface, mut containers) = surface_with_container();
        let mut controller = DragController::default();
        let image = containers[0].image;
        assert!(controller
            .pointer_down(&mut surface, &mut containers, image, PointerPoint::new(150.0, 150.0))
            .is_none());
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(containers[0].regions().is_empty());
    }

    #[test]
    fn pointer_down_on_region_resolves_to_owning_container_when_edges_enabled() {
        let (mut surface, mut containers) = surface_with_container();
        let mut controller = DragController::default();
        let mask = containers[0].mask;
        controller.pointer_down(&mut surface, &mut containers, mask, PointerPoint::new(150.0, 150.0));
        controller.pointer_up(&mut surface, &containers);
        let region_node = containers[0].regions()[0].node;

        assert_eq!(controller.resolve_container(&surface, &containers, region_node), Some(0));
        controller
            .pointer_down(&mut surface, &mut containers, region_node, PointerPoint::new(200.0, 150.0))
            .expect("pointer-down on a region starts a new session in its container");
        assert_eq!(containers[0].regions().len(), 2);

        let no_edges = DragController::new(RegionOptions {
            edges: false,
            ..RegionOptions::default()
        });
        assert_eq!(no_edges.resolve_container(&surface, &containers, region_node), None);
    }

    #[test]
    fn pointer_up_without_session_is_a_no_op() {
        let (mut surface, containers) = surface_with_container();
        let mut controller = DragController::default();
        assert!(controller.pointer_up(&mut surface, &containers).is_none());
        assert!(controller.pointer_up(&mut surface, &containers).is_none());
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn move_without_session_does_nothing() {
        let (mut surface, mut containers) = surface_with_container();
        let mut controller = DragController::default();
        assert!(controller
            .pointer_move(&mut surface, &mut containers, PointerPoint::new(10.0, 10.0))
            .is_none());
    }

    #[test]
    fn region_ids_follow_creation_order_across_sessions() {
        let (mut surface, mut containers) = surface_with_container();
        let mut controller = DragController::default();
        let mask = containers[0].mask;
        for x in [120.0, 180.0, 240.0] {
            controller.pointer_down(&mut surface, &mut containers, mask, PointerPoint::new(x, 150.0));
            controller.pointer_up(&mut surface, &containers);
        }
        let ids = containers[0]
            .regions()
            .iter()
            .map(|region| region.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![RegionId(1), RegionId(2), RegionId(3)]);
    }
}
