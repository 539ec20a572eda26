use crate::readiness::ImageRef;
use crate::region::Region;
use crate::surface::NodeId;

pub const CROPTAG_READY: &str = "croptag.ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagEventKind {
    Ready,
    DragStart,
    Drag,
    Resize,
    DragStop,
}

impl TagEventKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ready => CROPTAG_READY,
            Self::DragStart => "croptag.dragstart",
            Self::Drag => "croptag.drag",
            Self::Resize => "croptag.resize",
            Self::DragStop => "croptag.dragstop",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TagEvent<'a> {
    /// Dispatched once per settled image; every dispatch carries all images.
    Ready {
        image: NodeId,
        payload: &'a [ImageRef],
        bubbles: bool,
        cancelable: bool,
    },
    DragStart {
        region: &'a Region,
    },
    Drag {
        region: &'a Region,
    },
    Resize {
        region: &'a Region,
    },
    DragStop {
        region: &'a Region,
    },
}

impl TagEvent<'_> {
    pub const fn kind(&self) -> TagEventKind {
        match self {
            Self::Ready { .. } => TagEventKind::Ready,
            Self::DragStart { .. } => TagEventKind::DragStart,
            Self::Drag { .. } => TagEventKind::Drag,
            Self::Resize { .. } => TagEventKind::Resize,
            Self::DragStop { .. } => TagEventKind::DragStop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

type Handler = Box<dyn FnMut(&TagEvent<'_>)>;

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(HandlerId, TagEventKind, Handler)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: TagEventKind, handler: impl FnMut(&TagEvent<'_>) + 'static) -> HandlerId {
        self.next_id = self.next_id.saturating_add(1);
        let id = HandlerId(self.next_id);
        self.handlers.push((id, kind, Box::new(handler)));
        id
    }

    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(candidate, _, _)| *candidate != id);
        self.handlers.len() != before
    }

    /// Calls every handler registered for the event's kind, in registration
    /// order, and returns how many ran.
    pub fn emit(&mut self, event: &TagEvent<'_>) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for (_, _, handler) in self
            .handlers
            .iter_mut()
            .filter(|(_, registered, _)| *registered == kind)
        {
            handler(event);
            delivered += 1;
        }
        tracing::trace!(event = kind.name(), delivered, "event emitted");
        delivered
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
