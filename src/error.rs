//! Error types.
//!
//! Construction and wiring mistakes surface as [`UiError`] at the call that made
//! them, never later during dispatch. Background I/O failures are [`SourceError`]s
//! inside the fetch worker; the worker escalates them as [`FetchError`] once its
//! retry budget is gone. [`AppError`] is what the frame loop hands back to the host.

use std::time::Duration;

use thiserror::Error;

use crate::event::Trigger;
use crate::pages::PageId;
use crate::style::StyleKey;
use crate::widget::WidgetId;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("widget {0:?} does not exist")]
    UnknownWidget(WidgetId),

    #[error("widget {0:?} has no parent to pack into")]
    NoParent(WidgetId),

    #[error("{kind} widgets are shown through the window manager, not packed")]
    NotPackable { kind: &'static str },

    #[error("widget {0:?} cannot hold children")]
    NotAContainer(WidgetId),

    #[error("widget {0:?} is already packed")]
    AlreadyPacked(WidgetId),

    #[error("{kind} widgets do not support {trigger} bindings")]
    UnsupportedBinding { trigger: Trigger, kind: &'static str },

    #[error("widget {id:?} is a {actual}, expected {expected}")]
    WrongKind {
        id: WidgetId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("style value for {key:?} has the wrong type")]
    StyleTypeMismatch { key: StyleKey },

    #[error("page {0:?} is not registered")]
    UnknownPage(PageId),
}

/// Failure reported by a [`FetchSource`](crate::store::FetchSource) or
/// [`RequestSink`](crate::store::RequestSink).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("connection lost: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl SourceError {
    /// Connectivity problems are retried; anything else is fatal immediately.
    #[inline]
    pub const fn is_transient(&self) -> bool { matches!(self, Self::Connection(_) | Self::Timeout) }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to spawn fetch worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("fetch source unavailable after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: SourceError },

    #[error("fetch source failed: {0}")]
    Source(SourceError),

    #[error("fetch worker did not stop within {0:?}")]
    JoinTimeout(Duration),

    #[error("fetch worker panicked")]
    WorkerPanicked,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{len} bytes is not a whole number of {width}px RGB565 rows")]
    InvalidSize { len: usize, width: u32 },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ui(#[from] UiError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_source_errors() {
        assert!(SourceError::Timeout.is_transient());
        assert!(SourceError::Connection("reset".into()).is_transient());
        assert!(!SourceError::Protocol("bad reply".into()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::RetriesExhausted { attempts: 6, last: SourceError::Timeout };
        assert_eq!(err.to_string(), "fetch source unavailable after 6 attempts: request timed out");

        let err = UiError::NotPackable { kind: "window" };
        assert!(err.to_string().starts_with("window widgets"));
    }
}
