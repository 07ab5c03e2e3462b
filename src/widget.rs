//! Widget arena: nodes, kinds, bindings and tree geometry.
//!
//! Every widget lives in one [`SlotMap`] owned by [`WidgetTree`] and is addressed by
//! a [`WidgetId`]. Parents own their children through the `children` list; the
//! `parent` field is a plain back-reference. Windows and popups are not packed into
//! their parent's children. Their `parent` only records ownership (for modality and
//! cascading destruction) while the window manager stacks hold them for painting.
//!
//! # Coordinate Frames
//!
//! - A top-level widget (root, window, popup) stores its rect in screen coordinates.
//! - Any other widget stores its rect in its parent's *content frame*: the parent's
//!   inner area (below a window's title bar) shifted by the parent's view offset.
//! - Chrome widgets (window decorations) sit in the parent's inner frame and do not
//!   scroll with the view.
//!
//! Absolute positions are recomputed from the ancestor chain on every call and
//! never cached.

use std::collections::HashMap;
use std::rc::Rc;

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use slotmap::{SlotMap, new_key_type};

use crate::app::Application;
use crate::config::{CONTENT_MARGIN, TITLE_HEIGHT};
use crate::container::View;
use crate::error::UiError;
use crate::event::{Event, Trigger};
use crate::popup::{PopupData, PopupItem};
use crate::scrollbar::{ScrollStep, Scrollbar};
use crate::style::{DEFAULT_STYLE, Style};
use crate::widgets::{Button, Graph, ImageView, Label, ProgressBar};
use crate::window::WindowData;

new_key_type! {
    /// Handle into the widget arena. Stale handles resolve to nothing.
    pub struct WidgetId;
}

/// Callback bound to a widget. Receives the application, the widget the binding
/// belongs to, and the event in that widget's local coordinates.
pub type Handler = Rc<dyn Fn(&mut Application, WidgetId, &Event)>;

/// Predicate for non-rectangular widgets, given a point relative to the widget's
/// top-left corner.
pub type ShapeFn = Rc<dyn Fn(Point) -> bool>;

/// Whether a widget reacts to input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Enabled,
    Disabled,
}

// =============================================================================
// Widget Kinds
// =============================================================================

/// Kind-specific data of a widget.
pub enum WidgetKind {
    Root,
    Panel,
    Label(Label),
    Button(Button),
    Image(ImageView),
    ProgressBar(ProgressBar),
    Graph(Graph),
    Scrollbar(Scrollbar),
    ScrollStep(ScrollStep),
    ScrollThumb,
    Window(WindowData),
    Popup(PopupData),
    PopupItem(PopupItem),
    PopupSeparator,
}

impl WidgetKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Panel => "panel",
            Self::Label(_) => "label",
            Self::Button(_) => "button",
            Self::Image(_) => "image",
            Self::ProgressBar(_) => "progress bar",
            Self::Graph(_) => "graph",
            Self::Scrollbar(_) => "scrollbar",
            Self::ScrollStep(_) => "scroll button",
            Self::ScrollThumb => "scroll thumb",
            Self::Window(_) => "window",
            Self::Popup(_) => "popup",
            Self::PopupItem(_) => "popup item",
            Self::PopupSeparator => "popup separator",
        }
    }

    /// Kinds that own and clip children.
    #[inline]
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Root | Self::Panel | Self::Scrollbar(_) | Self::Window(_) | Self::Popup(_)
        )
    }

    /// Kinds stacked by the window manager instead of being packed.
    #[inline]
    pub const fn is_floating(&self) -> bool { matches!(self, Self::Window(_) | Self::Popup(_)) }

    /// Kinds whose rect is in screen coordinates.
    #[inline]
    pub const fn is_toplevel(&self) -> bool { matches!(self, Self::Root | Self::Window(_) | Self::Popup(_)) }

    /// Whether callbacks may be bound to `trigger` on this kind.
    pub const fn supports(
        &self,
        trigger: Trigger,
    ) -> bool {
        match trigger {
            Trigger::Quit => matches!(self, Self::Root),
            Trigger::GainFocus | Trigger::LoseFocus => matches!(self, Self::Root | Self::Window(_)),
            Trigger::Click => matches!(self, Self::Button(_) | Self::PopupItem(_)),
            _ => true,
        }
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Ordered handler lists per trigger.
#[derive(Default, Clone)]
pub struct Bindings {
    handlers: HashMap<Trigger, Vec<Handler>>,
}

impl Bindings {
    pub fn add(
        &mut self,
        trigger: Trigger,
        handler: Handler,
    ) {
        self.handlers.entry(trigger).or_default().push(handler);
    }

    /// Handlers for `trigger` in binding order, cloned so they can run while the
    /// tree is mutated.
    pub fn handlers(
        &self,
        trigger: Trigger,
    ) -> Vec<Handler> {
        self.handlers.get(&trigger).cloned().unwrap_or_default()
    }

    pub fn has(
        &self,
        trigger: Trigger,
    ) -> bool {
        self.handlers.get(&trigger).is_some_and(|list| !list.is_empty())
    }
}

// =============================================================================
// Node
// =============================================================================

/// Arena entry for one widget.
pub struct Node {
    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: Vec<WidgetId>,
    pub(crate) rect: Rectangle,
    pub(crate) style: Rc<Style>,
    pub(crate) state: WidgetState,
    pub(crate) visible: bool,
    pub(crate) packed: bool,
    /// Positioned in the parent's inner frame, unaffected by its view offset.
    pub(crate) chrome: bool,
    pub(crate) view: View,
    pub(crate) shape: Option<ShapeFn>,
    pub(crate) bindings: Bindings,
    pub(crate) kind: WidgetKind,
}

impl Node {
    fn new(
        parent: Option<WidgetId>,
        rect: Rectangle,
        style: Rc<Style>,
        kind: WidgetKind,
    ) -> Self {
        let mut node = Self {
            parent,
            children: Vec::new(),
            rect,
            style,
            state: WidgetState::Enabled,
            visible: true,
            packed: false,
            chrome: false,
            view: View::default(),
            shape: None,
            bindings: Bindings::default(),
            kind,
        };
        node.view.content = node.view_size();
        node
    }

    #[inline]
    pub const fn rect(&self) -> Rectangle { self.rect }

    #[inline]
    pub const fn parent(&self) -> Option<WidgetId> { self.parent }

    #[inline]
    pub fn children(&self) -> &[WidgetId] { &self.children }

    #[inline]
    pub fn style(&self) -> &Style { &self.style }

    #[inline]
    pub const fn state(&self) -> WidgetState { self.state }

    #[inline]
    pub const fn is_visible(&self) -> bool { self.visible }

    #[inline]
    pub const fn is_enabled(&self) -> bool { matches!(self.state, WidgetState::Enabled) }

    #[inline]
    pub const fn kind(&self) -> &WidgetKind { &self.kind }

    /// Offset of the inner frame from the widget's top-left corner.
    pub const fn inset(&self) -> Point {
        match &self.kind {
            WidgetKind::Window(window) if window.title.is_some() => Point::new(0, TITLE_HEIGHT as i32),
            _ => Point::zero(),
        }
    }

    /// Size of the visible part of the content frame.
    pub const fn view_size(&self) -> Size {
        let inset = self.inset();
        Size::new(self.rect.size.width, self.rect.size.height.saturating_sub(inset.y as u32))
    }

    /// Whether `local` (relative to the top-left corner) passes the shape predicate.
    pub fn accepts(
        &self,
        local: Point,
    ) -> bool {
        self.shape.as_ref().is_none_or(|shape| shape(local))
    }
}

// =============================================================================
// Widget Tree
// =============================================================================

/// Arena-backed retained widget tree rooted at the screen-sized root widget.
pub struct WidgetTree {
    arena: SlotMap<WidgetId, Node>,
    root: WidgetId,
}

impl WidgetTree {
    /// Create a tree holding only a root widget covering `screen`.
    pub fn new(screen: Size) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node::new(
            None,
            Rectangle::new(Point::zero(), screen),
            Rc::new(DEFAULT_STYLE),
            WidgetKind::Root,
        ));
        Self { arena, root }
    }

    #[inline]
    pub const fn root(&self) -> WidgetId { self.root }

    #[inline]
    pub fn contains(
        &self,
        id: WidgetId,
    ) -> bool {
        self.arena.contains_key(id)
    }

    #[inline]
    pub fn get(
        &self,
        id: WidgetId,
    ) -> Option<&Node> {
        self.arena.get(id)
    }

    #[inline]
    pub fn get_mut(
        &mut self,
        id: WidgetId,
    ) -> Option<&mut Node> {
        self.arena.get_mut(id)
    }

    /// Like [`get`](Self::get) but reports stale handles as an error.
    pub fn node(
        &self,
        id: WidgetId,
    ) -> Result<&Node, UiError> {
        self.arena.get(id).ok_or(UiError::UnknownWidget(id))
    }

    pub fn node_mut(
        &mut self,
        id: WidgetId,
    ) -> Result<&mut Node, UiError> {
        self.arena.get_mut(id).ok_or(UiError::UnknownWidget(id))
    }

    pub fn len(&self) -> usize { self.arena.len() }

    pub fn is_empty(&self) -> bool { self.arena.is_empty() }

    /// Insert a detached widget owned by `parent`. It is neither drawn nor
    /// hit-tested until packed (or shown, for windows and popups).
    pub fn insert(
        &mut self,
        parent: Option<WidgetId>,
        rect: Rectangle,
        style: Rc<Style>,
        kind: WidgetKind,
    ) -> WidgetId {
        self.arena.insert(Node::new(parent, rect, style, kind))
    }

    /// Attach a widget to its parent's children, growing the parent's content size.
    pub fn pack(
        &mut self,
        id: WidgetId,
    ) -> Result<(), UiError> {
        let node = self.node(id)?;
        if node.kind.is_floating() || matches!(node.kind, WidgetKind::Root) {
            return Err(UiError::NotPackable { kind: node.kind.name() });
        }
        if node.packed {
            return Err(UiError::AlreadyPacked(id));
        }
        let parent_id = node.parent.ok_or(UiError::NoParent(id))?;
        let (chrome, rect) = (node.chrome, node.rect);

        let parent = self.node_mut(parent_id)?;
        if !parent.kind.is_container() {
            return Err(UiError::NotAContainer(parent_id));
        }
        parent.children.push(id);
        if !chrome {
            parent.view.grow_to(rect, CONTENT_MARGIN);
        }
        self.node_mut(id)?.packed = true;
        self.sync_scrollbars(parent_id);
        Ok(())
    }

    /// Detach a packed widget from its parent without destroying it.
    pub fn unpack(
        &mut self,
        id: WidgetId,
    ) {
        let Some(parent_id) = self.arena.get(id).and_then(|node| node.parent) else {
            return;
        };
        if let Some(parent) = self.arena.get_mut(parent_id) {
            parent.children.retain(|c| *c != id);
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.packed = false;
        }
    }

    #[inline]
    pub fn parent(
        &self,
        id: WidgetId,
    ) -> Option<WidgetId> {
        self.arena.get(id).and_then(|node| node.parent)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(
        &self,
        id: WidgetId,
    ) -> impl Iterator<Item = WidgetId> + '_ {
        let mut current = self.arena.get(id).and_then(|node| node.parent);
        core::iter::from_fn(move || {
            let id = current?;
            current = self.arena.get(id).and_then(|node| node.parent);
            Some(id)
        })
    }

    /// Whether `id` is `ancestor` or owned (transitively) by it.
    pub fn is_descendant(
        &self,
        id: WidgetId,
        ancestor: WidgetId,
    ) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Nearest top-level widget (root, window or popup) at or above `id`.
    pub fn toplevel(
        &self,
        id: WidgetId,
    ) -> WidgetId {
        core::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&a| self.arena.get(a).is_some_and(|node| node.kind.is_toplevel()))
            .unwrap_or(self.root)
    }

    /// Nearest window strictly above `id`.
    pub fn parent_window(
        &self,
        id: WidgetId,
    ) -> Option<WidgetId> {
        self.ancestors(id)
            .find(|&a| self.arena.get(a).is_some_and(|node| matches!(node.kind, WidgetKind::Window(_))))
    }

    /// Screen position of the widget's top-left corner.
    pub fn absolute_origin(
        &self,
        id: WidgetId,
    ) -> Point {
        let Some(node) = self.arena.get(id) else {
            return Point::zero();
        };
        if node.kind.is_toplevel() {
            return node.rect.top_left;
        }
        let Some(parent) = node.parent else {
            return node.rect.top_left;
        };
        let frame = if node.chrome { self.inner_origin(parent) } else { self.content_origin(parent) };
        frame + node.rect.top_left
    }

    /// Widget rect in screen coordinates.
    pub fn absolute_rect(
        &self,
        id: WidgetId,
    ) -> Rectangle {
        let size = self.arena.get(id).map_or(Size::zero(), |node| node.rect.size);
        Rectangle::new(self.absolute_origin(id), size)
    }

    /// Screen position of the widget's inner frame (below a title bar).
    pub fn inner_origin(
        &self,
        id: WidgetId,
    ) -> Point {
        let inset = self.arena.get(id).map_or(Point::zero(), Node::inset);
        self.absolute_origin(id) + inset
    }

    /// Screen position where a child rect at `(0, 0)` lands, view offset applied.
    pub fn content_origin(
        &self,
        id: WidgetId,
    ) -> Point {
        let offset = self.arena.get(id).map_or(Point::zero(), |node| node.view.offset);
        self.inner_origin(id) - offset
    }

    /// Whether the widget and every ancestor up to its top-level are visible.
    pub fn is_shown(
        &self,
        id: WidgetId,
    ) -> bool {
        let mut current = Some(id);
        while let Some(cid) = current {
            let Some(node) = self.arena.get(cid) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            if node.kind.is_toplevel() {
                return true;
            }
            current = node.parent;
        }
        true
    }

    /// `id`, its packed descendants, and every window or popup owned by any of them.
    pub fn subtree(
        &self,
        id: WidgetId,
    ) -> Vec<WidgetId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut out = vec![id];
        let mut scanned = 0;
        loop {
            while scanned < out.len() {
                if let Some(node) = self.arena.get(out[scanned]) {
                    out.extend(node.children.iter().copied());
                }
                scanned += 1;
            }
            let owned: Vec<WidgetId> = self
                .arena
                .iter()
                .filter(|(key, node)| {
                    node.kind.is_floating() && !out.contains(key) && node.parent.is_some_and(|p| out.contains(&p))
                })
                .map(|(key, _)| key)
                .collect();
            if owned.is_empty() {
                return out;
            }
            out.extend(owned);
        }
    }

    /// Detach `id` from its parent and drop every node in `ids` from the arena.
    pub(crate) fn remove_nodes(
        &mut self,
        id: WidgetId,
        ids: &[WidgetId],
    ) {
        self.unpack(id);
        for &rid in ids {
            if rid != self.root {
                self.arena.remove(rid);
            }
        }
    }

    /// Every live widget of a kind matching `pred`.
    pub fn find_all(
        &self,
        pred: impl Fn(&WidgetKind) -> bool,
    ) -> Vec<WidgetId> {
        self.arena.iter().filter(|(_, node)| pred(&node.kind)).map(|(id, _)| id).collect()
    }
}
