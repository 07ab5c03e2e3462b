// Crate-level lints: Allow common embedded/graphics patterns that pedantic lints flag
#![allow(clippy::cast_possible_truncation)] // Intentional f32->i32, u32->i32 casts for pixel math
#![allow(clippy::cast_precision_loss)] // u32/i32->f32 in graphics calculations
#![allow(clippy::cast_possible_wrap)] // u32->i32 wrapping is acceptable for our value ranges
#![allow(clippy::cast_sign_loss)] // i32->u32 where we know sign is positive
#![allow(clippy::similar_names)] // min_x/max_x etc in geometry code are clear

//! Widget toolkit core for small fixed-size vehicle dashboards.
//!
//! The toolkit draws onto any [`DrawTarget`](embedded_graphics::draw_target::DrawTarget)
//! with `Rgb565` pixels and takes input as already-translated [`Event`](event::Event)s,
//! so the same application runs on an SDL window or a framebuffer panel.
//!
//! # Architecture
//!
//! ```text
//!  sensor daemons ──► key-value store ◄── request sink (UI commands)
//!                          │
//!                   FetchBridge worker (retry, backoff)
//!                          │  latest Snapshot (swap)
//!                          ▼
//!  Platform ──events──► Application ──► pages / update hooks ──► widgets
//!      ▲                   │
//!      └──── present ◄── draw (root, windows, popups)
//! ```
//!
//! # Modules
//!
//! - [`style`]: typed style keys, per-class defaults and overrides
//! - [`widget`], [`container`]: the widget tree, geometry, scrolled views, hit-testing
//! - [`window`], [`popup`], [`manager`]: window stack, menus and event dispatch
//! - [`scrollbar`]: scrollbars linked to containers
//! - [`fetch`], [`store`]: background data bridge and the store contracts
//! - [`app`], [`pages`], [`render`], [`timer`]: frame loop, screens, drawing, timers

pub mod app;
pub mod assets;
pub mod colors;
pub mod config;
pub mod container;
pub mod error;
pub mod event;
pub mod fetch;
pub mod manager;
pub mod pages;
pub mod popup;
pub mod profiling;
pub mod render;
pub mod scrollbar;
pub mod store;
pub mod style;
pub mod text;
pub mod timer;
pub mod widget;
pub mod widgets;
pub mod window;

pub use app::{Application, ExitStatus, Platform};
pub use config::AppConfig;
pub use error::{AppError, FetchError, SourceError, UiError};
pub use event::{Event, Key, MouseButton, Trigger};
pub use fetch::{FetchBridge, FetchConfig};
pub use pages::PageId;
pub use store::{FetchSource, MemoryStore, RequestSink, Snapshot};
pub use widget::{WidgetId, WidgetKind, WidgetState};
