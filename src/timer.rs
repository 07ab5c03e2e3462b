//! Application-scoped timers and the deferred post-frame queue.
//!
//! Timers are polled on the UI thread: [`Application::tick`] fires every timer whose
//! deadline has passed, oldest deadline first. Nothing runs on another thread and
//! nothing outlives the [`Application`] that scheduled it. Toolkit-internal timers
//! (double-click expiry, scrollbar repeat, sub-popup hover) share the same table as
//! user timers so destroying a widget can cancel everything that refers to it.

use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::app::Application;
use crate::widget::WidgetId;

new_key_type! {
    /// Handle of a scheduled timer.
    pub struct TimerId;
}

/// One-shot callback run by a user timer or the deferred queue.
pub type Callback = Box<dyn FnOnce(&mut Application)>;

/// What happens when a timer fires.
pub(crate) enum TimerAction {
    /// Double-click window elapsed without a second press.
    DoubleClickExpired,
    /// Held scrollbar button repeats its step.
    ScrollRepeat { step: WidgetId },
    /// Hover delay over a sub-popup item elapsed.
    OpenSubPopup { item: WidgetId },
    /// User callback from [`Application::after`].
    Callback(Callback),
}

impl TimerAction {
    fn widget(&self) -> Option<WidgetId> {
        match self {
            Self::ScrollRepeat { step } => Some(*step),
            Self::OpenSubPopup { item } => Some(*item),
            Self::DoubleClickExpired | Self::Callback(_) => None,
        }
    }
}

struct Timer {
    deadline: Instant,
    action: TimerAction,
}

/// Outstanding timers.
#[derive(Default)]
pub struct Timers {
    timers: SlotMap<TimerId, Timer>,
}

impl Timers {
    pub(crate) fn schedule(
        &mut self,
        deadline: Instant,
        action: TimerAction,
    ) -> TimerId {
        self.timers.insert(Timer { deadline, action })
    }

    /// Cancel a timer. Returns whether it was still pending.
    pub fn cancel(
        &mut self,
        id: TimerId,
    ) -> bool {
        self.timers.remove(id).is_some()
    }

    pub fn is_pending(
        &self,
        id: TimerId,
    ) -> bool {
        self.timers.contains_key(id)
    }

    pub fn len(&self) -> usize { self.timers.len() }

    pub fn is_empty(&self) -> bool { self.timers.is_empty() }

    /// Timers due at `now`, earliest deadline first.
    pub(crate) fn due(
        &self,
        now: Instant,
    ) -> Vec<TimerId> {
        let mut due: Vec<(TimerId, Instant)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.deadline <= now)
            .map(|(id, timer)| (id, timer.deadline))
            .collect();
        due.sort_by_key(|&(_, deadline)| deadline);
        due.into_iter().map(|(id, _)| id).collect()
    }

    /// Remove a timer and hand back its action, unless it was cancelled.
    pub(crate) fn take(
        &mut self,
        id: TimerId,
    ) -> Option<TimerAction> {
        self.timers.remove(id).map(|timer| timer.action)
    }

    /// Cancel timers that refer to any widget in `ids`.
    pub(crate) fn forget_widgets(
        &mut self,
        ids: &[WidgetId],
    ) {
        self.timers
            .retain(|_, timer| timer.action.widget().is_none_or(|widget| !ids.contains(&widget)));
    }

    pub(crate) fn clear(&mut self) {
        self.timers.clear();
    }
}

impl Application {
    /// Run `callback` once, `delay` after the current event time.
    pub fn after(
        &mut self,
        delay: Duration,
        callback: impl FnOnce(&mut Self) + 'static,
    ) -> TimerId {
        let deadline = self.now + delay;
        self.timers.schedule(deadline, TimerAction::Callback(Box::new(callback)))
    }

    /// Cancel a timer from [`after`](Self::after). Returns whether it was pending.
    pub fn cancel_timer(
        &mut self,
        id: TimerId,
    ) -> bool {
        self.timers.cancel(id)
    }

    /// Queue `callback` to run after the current frame has been drawn.
    pub fn defer(
        &mut self,
        callback: impl FnOnce(&mut Self) + 'static,
    ) {
        self.deferred.push(Box::new(callback));
    }

    /// Advance the clock to `now` and fire every due timer.
    pub fn tick(
        &mut self,
        now: Instant,
    ) {
        if now > self.now {
            self.now = now;
        }
        self.fire_due_timers();
    }

    pub(crate) fn fire_due_timers(&mut self) {
        // Taken one at a time so a callback can still cancel a later timer
        for id in self.timers.due(self.now) {
            let Some(action) = self.timers.take(id) else {
                continue;
            };
            match action {
                TimerAction::DoubleClickExpired => self.wm.expire_double_click(id),
                TimerAction::ScrollRepeat { step } => self.repeat_scroll_step(step, id),
                TimerAction::OpenSubPopup { item } => self.open_hovered_submenu(item, id),
                TimerAction::Callback(callback) => callback(self),
            }
        }
    }

    /// Run callbacks queued with [`defer`](Self::defer), including ones they queue.
    pub fn run_deferred(&mut self) {
        while !self.deferred.is_empty() {
            let batch = std::mem::take(&mut self.deferred);
            for callback in batch {
                callback(self);
            }
        }
    }
}
