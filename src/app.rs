//! The application: widget tree, window manager, timers, pages and the fetch
//! bridge, driven by a fixed-rate frame loop.
//!
//! # Frame Loop
//!
//! ```text
//! poll platform events -> dispatch each -> fire due timers -> update()
//!     -> draw (root, windows oldest first, popups) -> present
//!     -> run deferred callbacks -> sleep for the rest of the frame
//! ```
//!
//! `update()` reads the newest published fetch snapshot once and hands it to the
//! current page's update hook and any registered update hooks. A fatal fetch error
//! still finishes the frame in flight before [`Application::run`] returns it.
//!
//! # Shutdown
//!
//! [`Application::shutdown`] stops the fetch worker with a bounded join first and
//! only then tears the widget tree down, so nothing publishes into a snapshot slot
//! whose consumer is gone.

use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;
use embedded_graphics::primitives::Rectangle;

use crate::assets::ImageStore;
use crate::config::AppConfig;
use crate::error::{AppError, FetchError, UiError};
use crate::event::{Event, Key, Trigger};
use crate::fetch::FetchBridge;
use crate::manager::WindowManager;
use crate::pages::PageRegistry;
use crate::profiling::FrameMetrics;
use crate::store::Snapshot;
use crate::style::{StyleClass, StyleKey, StyleValue, resolve};
use crate::timer::{Callback, Timers};
use crate::widget::{Node, WidgetId, WidgetKind, WidgetState, WidgetTree};

/// Host display and input source driven by [`Application::run`].
pub trait Platform {
    type Display: DrawTarget<Color = Rgb565>;

    /// Pending input, already translated into toolkit events.
    fn poll_events(&mut self) -> Vec<Event>;

    fn display(&mut self) -> &mut Self::Display;

    /// Push the drawn frame to the screen.
    fn present(&mut self);
}

/// How the application ended, for the host to map onto a process exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Normal,
    InternalError,
    WorkerJoinTimeout,
}

/// Per-frame hook receiving the current fetch snapshot.
pub type UpdateHook = Box<dyn FnMut(&mut Application, &Snapshot)>;

pub struct Application {
    pub(crate) tree: WidgetTree,
    pub(crate) wm: WindowManager,
    pub(crate) timers: Timers,
    pub(crate) deferred: Vec<Callback>,
    /// Time of the event or tick being processed.
    pub(crate) now: Instant,
    pub(crate) config: AppConfig,
    pub(crate) pages: PageRegistry,
    pub(crate) assets: ImageStore,
    fetch: Option<FetchBridge>,
    snapshot: Arc<Snapshot>,
    update_hooks: Vec<UpdateHook>,
    metrics: FrameMetrics,
    running: bool,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        let mut app = Self {
            tree: WidgetTree::new(config.screen),
            wm: WindowManager::default(),
            timers: Timers::default(),
            deferred: Vec::new(),
            now: Instant::now(),
            pages: PageRegistry::default(),
            assets: ImageStore::default(),
            fetch: None,
            snapshot: Arc::new(Snapshot::default()),
            update_hooks: Vec::new(),
            metrics: FrameMetrics::new(),
            running: true,
            config,
        };
        if app.config.fullscreen {
            let root = app.root();
            let escape: crate::widget::Handler = Rc::new(|app: &mut Self, _: WidgetId, _: &Event| app.exit());
            if let Some(node) = app.tree.get_mut(root) {
                node.bindings.add(Trigger::KeyDown(Key::Escape), escape);
            }
        }
        app
    }

    #[inline]
    pub const fn root(&self) -> WidgetId { self.tree.root() }

    #[inline]
    pub const fn tree(&self) -> &WidgetTree { &self.tree }

    #[inline]
    pub const fn config(&self) -> &AppConfig { &self.config }

    /// Time of the event or frame being processed.
    #[inline]
    pub const fn now(&self) -> Instant { self.now }

    #[inline]
    pub const fn metrics(&self) -> &FrameMetrics { &self.metrics }

    #[inline]
    pub const fn assets(&self) -> &ImageStore { &self.assets }

    #[inline]
    pub const fn assets_mut(&mut self) -> &mut ImageStore { &mut self.assets }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a detached widget owned by `parent` with the kind's default style
    /// plus `overrides`.
    pub fn create_styled(
        &mut self,
        parent: WidgetId,
        rect: Rectangle,
        kind: WidgetKind,
        class: StyleClass,
        overrides: &[(StyleKey, StyleValue)],
    ) -> Result<WidgetId, UiError> {
        self.tree.node(parent)?;
        let style = Rc::new(resolve(class, overrides)?);
        Ok(self.tree.insert(Some(parent), rect, style, kind))
    }

    pub fn create(
        &mut self,
        parent: WidgetId,
        rect: Rectangle,
        kind: WidgetKind,
    ) -> Result<WidgetId, UiError> {
        let class = style_class(&kind);
        self.create_styled(parent, rect, kind, class, &[])
    }

    /// Create and pack a widget.
    pub fn add(
        &mut self,
        parent: WidgetId,
        rect: Rectangle,
        kind: WidgetKind,
    ) -> Result<WidgetId, UiError> {
        self.add_styled(parent, rect, kind, &[])
    }

    pub fn add_styled(
        &mut self,
        parent: WidgetId,
        rect: Rectangle,
        kind: WidgetKind,
        overrides: &[(StyleKey, StyleValue)],
    ) -> Result<WidgetId, UiError> {
        let class = style_class(&kind);
        let id = self.create_styled(parent, rect, kind, class, overrides)?;
        self.pack(id)?;
        Ok(id)
    }

    pub fn pack(
        &mut self,
        id: WidgetId,
    ) -> Result<(), UiError> {
        self.tree.pack(id)
    }

    /// Bind `handler` to `trigger` on `id`. Handlers run in binding order.
    pub fn bind(
        &mut self,
        id: WidgetId,
        trigger: Trigger,
        handler: impl Fn(&mut Self, WidgetId, &Event) + 'static,
    ) -> Result<(), UiError> {
        let node = self.tree.node_mut(id)?;
        if !node.kind.supports(trigger) {
            return Err(UiError::UnsupportedBinding { trigger, kind: node.kind.name() });
        }
        node.bindings.add(trigger, Rc::new(handler));
        Ok(())
    }

    /// Restrict hit-testing of `id` to points accepted by `shape`.
    pub fn set_shape(
        &mut self,
        id: WidgetId,
        shape: impl Fn(Point) -> bool + 'static,
    ) -> Result<(), UiError> {
        self.tree.node_mut(id)?.shape = Some(Rc::new(shape));
        Ok(())
    }

    // =========================================================================
    // Widget State
    // =========================================================================

    pub fn widget(
        &self,
        id: WidgetId,
    ) -> Option<&Node> {
        self.tree.get(id)
    }

    #[inline]
    pub fn contains(
        &self,
        id: WidgetId,
    ) -> bool {
        self.tree.contains(id)
    }

    /// Show or hide a widget. Hiding a stacked window or an open popup takes it
    /// off its stack, so a hidden window can never stay active or modal.
    pub fn set_visible(
        &mut self,
        id: WidgetId,
        visible: bool,
    ) {
        if !visible && self.wm.windows.contains(&id) {
            self.hide_window(id);
            return;
        }
        if !visible && self.wm.popups.contains(&id) {
            self.close_popup(id);
            return;
        }
        if let Some(node) = self.tree.get_mut(id)
            && node.visible != visible
        {
            node.visible = visible;
            self.refresh_hover();
        }
    }

    pub fn set_state(
        &mut self,
        id: WidgetId,
        state: WidgetState,
    ) {
        if let Some(node) = self.tree.get_mut(id) {
            node.state = state;
        }
    }

    /// Replace the text of a label, button or popup item.
    pub fn set_text(
        &mut self,
        id: WidgetId,
        text: &str,
    ) -> Result<(), UiError> {
        let node = self.tree.node_mut(id)?;
        match &mut node.kind {
            WidgetKind::Label(label) => text.clone_into(&mut label.text),
            WidgetKind::Button(button) => text.clone_into(&mut button.text),
            WidgetKind::PopupItem(item) => text.clone_into(&mut item.text),
            other => return Err(UiError::WrongKind { id, expected: "text widget", actual: other.name() }),
        }
        Ok(())
    }

    pub fn set_progress(
        &mut self,
        id: WidgetId,
        value: f32,
    ) -> Result<(), UiError> {
        match &mut self.tree.node_mut(id)?.kind {
            WidgetKind::ProgressBar(bar) => {
                bar.set_value(value);
                Ok(())
            }
            other => Err(UiError::WrongKind { id, expected: "progress bar", actual: other.name() }),
        }
    }

    /// Append a sample to a graph.
    pub fn push_sample(
        &mut self,
        id: WidgetId,
        value: f32,
    ) -> Result<(), UiError> {
        match &mut self.tree.node_mut(id)?.kind {
            WidgetKind::Graph(graph) => {
                graph.push(value);
                Ok(())
            }
            other => Err(UiError::WrongKind { id, expected: "graph", actual: other.name() }),
        }
    }

    /// Show another image from the asset store.
    pub fn set_image(
        &mut self,
        id: WidgetId,
        key: &str,
    ) -> Result<(), UiError> {
        match &mut self.tree.node_mut(id)?.kind {
            WidgetKind::Image(image) => {
                key.clone_into(&mut image.key);
                Ok(())
            }
            other => Err(UiError::WrongKind { id, expected: "image", actual: other.name() }),
        }
    }

    pub fn view_offset(
        &self,
        id: WidgetId,
    ) -> Point {
        self.tree.get(id).map_or(Point::zero(), |node| node.view.offset)
    }

    pub fn set_view_offset(
        &mut self,
        id: WidgetId,
        offset: Point,
    ) {
        self.tree.set_view_offset(id, offset);
        self.tree.sync_scrollbars(id);
    }

    pub fn absolute_rect(
        &self,
        id: WidgetId,
    ) -> Rectangle {
        self.tree.absolute_rect(id)
    }

    pub const fn active_window(&self) -> Option<WidgetId> { self.wm.active }

    /// Shown windows, bottom to top.
    pub fn window_stack(&self) -> &[WidgetId] { &self.wm.windows }

    // =========================================================================
    // Frame Loop
    // =========================================================================

    /// Register a hook run on every `update()` with the current snapshot.
    pub fn on_update(
        &mut self,
        hook: impl FnMut(&mut Self, &Snapshot) + 'static,
    ) {
        self.update_hooks.push(Box::new(hook));
    }

    /// Hand the fetch bridge to the application. Its snapshots feed `update()`
    /// and page switches change its key list.
    pub fn attach_fetch(
        &mut self,
        bridge: FetchBridge,
    ) {
        self.snapshot = bridge.snapshot();
        self.fetch = Some(bridge);
        self.sync_fetch_keys();
    }

    pub const fn fetch(&self) -> Option<&FetchBridge> { self.fetch.as_ref() }

    /// Latest snapshot read by `update()`.
    pub fn snapshot(&self) -> &Snapshot { &self.snapshot }

    pub(crate) fn set_fetch_keys(
        &mut self,
        keys: Vec<String>,
    ) {
        if let Some(bridge) = &self.fetch {
            bridge.set_keys(keys);
        }
    }

    /// Read the newest snapshot and run the page and update hooks.
    pub fn update(&mut self) -> Result<(), AppError> {
        if let Some(bridge) = self.fetch.as_mut() {
            self.snapshot = bridge.refresh()?;
        }
        let snapshot = Arc::clone(&self.snapshot);
        self.update_page(&snapshot);

        let mut hooks = core::mem::take(&mut self.update_hooks);
        for hook in &mut hooks {
            hook(self, &snapshot);
        }
        hooks.append(&mut self.update_hooks);
        self.update_hooks = hooks;
        Ok(())
    }

    /// Run frames until [`exit`](Self::exit) or a fatal error.
    pub fn run<P: Platform>(
        &mut self,
        platform: &mut P,
    ) -> Result<(), AppError> {
        self.running = true;
        tracing::info!(
            width = self.config.screen.width,
            height = self.config.screen.height,
            frame_us = self.config.frame_time.as_micros() as u64,
            "frame loop started"
        );

        while self.running {
            let frame_start = Instant::now();

            for event in platform.poll_events() {
                self.dispatch(event);
            }
            self.tick(Instant::now());
            let outcome = self.update();

            let render_start = Instant::now();
            self.draw(platform.display());
            platform.present();
            let render_time = render_start.elapsed();

            self.run_deferred();

            if let Err(err) = outcome {
                tracing::error!(error = %err, "fatal error, leaving frame loop");
                self.running = false;
                return Err(err);
            }

            let sleep_time = self.config.frame_time.saturating_sub(frame_start.elapsed());
            if !sleep_time.is_zero() {
                thread::sleep(sleep_time);
            }
            self.metrics.record_frame(frame_start.elapsed(), render_time, sleep_time);
        }

        tracing::info!(frames = self.metrics.total_frames, "frame loop finished");
        Ok(())
    }

    /// End the frame loop after the current frame.
    pub fn exit(&mut self) {
        if self.running {
            tracing::info!("exit requested");
        }
        self.running = false;
    }

    #[inline]
    pub const fn is_running(&self) -> bool { self.running }

    /// Stop the fetch worker (bounded by `join_timeout`), then tear down the tree.
    ///
    /// An error from the frame loop takes precedence over a join timeout.
    pub fn shutdown(
        &mut self,
        outcome: &Result<(), AppError>,
        join_timeout: Duration,
    ) -> ExitStatus {
        self.running = false;
        let stopped = match self.fetch.take() {
            Some(bridge) => bridge.stop(join_timeout),
            None => Ok(()),
        };
        self.teardown();

        let status = match (outcome, &stopped) {
            (Err(err), _) => {
                if let Err(stop_err) = &stopped {
                    tracing::warn!(error = %stop_err, "fetch worker did not stop cleanly");
                }
                tracing::error!(error = %err, "application failed");
                ExitStatus::InternalError
            }
            (Ok(()), Err(FetchError::JoinTimeout(timeout))) => {
                tracing::error!(?timeout, "fetch worker join timed out");
                ExitStatus::WorkerJoinTimeout
            }
            (Ok(()), Err(stop_err)) => {
                tracing::error!(error = %stop_err, "fetch worker failed during shutdown");
                ExitStatus::InternalError
            }
            (Ok(()), Ok(())) => ExitStatus::Normal,
        };
        tracing::info!(?status, "shutdown complete");
        status
    }

    fn teardown(&mut self) {
        self.timers.clear();
        self.deferred.clear();
        self.update_hooks.clear();
        self.pages = PageRegistry::default();
        self.wm = WindowManager::default();
        self.tree = WidgetTree::new(self.config.screen);
    }
}

/// Default style family for a widget kind.
const fn style_class(kind: &WidgetKind) -> StyleClass {
    match kind {
        WidgetKind::Button(_) => StyleClass::Button,
        WidgetKind::Scrollbar(_) => StyleClass::Scrollbar,
        WidgetKind::ScrollStep(_) | WidgetKind::ScrollThumb => StyleClass::ScrollButton,
        WidgetKind::Window(_) => StyleClass::Window,
        WidgetKind::Popup(_) | WidgetKind::PopupSeparator => StyleClass::Popup,
        WidgetKind::PopupItem(_) => StyleClass::PopupItem,
        _ => StyleClass::Plain,
    }
}
