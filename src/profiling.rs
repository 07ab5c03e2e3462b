//! Frame timing metrics.
//!
//! [`Application::run`](crate::app::Application::run) records every frame: total
//! time, time spent drawing and presenting, and time slept to hold the frame rate.
//! Min/max are kept over the whole run and the average is an exponential moving
//! average, so a single slow frame shows up in `max` but barely moves `avg`.

use core::fmt::Write;
use std::time::{Duration, Instant};

use heapless::String;

/// Frame timing statistics, in microseconds.
#[derive(Clone, Debug)]
pub struct FrameMetrics {
    /// Total time of the last frame (events + update + render + sleep)
    pub frame_time_us: u32,
    /// Draw and present time of the last frame
    pub render_time_us: u32,
    /// Rate-limiting sleep of the last frame
    pub sleep_time_us: u32,

    pub frame_time_min_us: u32,
    pub frame_time_max_us: u32,
    frame_time_avg_us: f32,

    /// Frames recorded since startup
    pub total_frames: u64,

    start_time: Instant,
}

impl FrameMetrics {
    /// Exponential moving average alpha.
    const EMA_ALPHA: f32 = 0.1;

    /// Empty metrics, starting the uptime clock.
    pub fn new() -> Self {
        Self {
            frame_time_us: 0,
            render_time_us: 0,
            sleep_time_us: 0,
            frame_time_min_us: u32::MAX,
            frame_time_max_us: 0,
            frame_time_avg_us: 0.0,
            total_frames: 0,
            start_time: Instant::now(),
        }
    }

    pub fn record_frame(
        &mut self,
        total_time: Duration,
        render_time: Duration,
        sleep_time: Duration,
    ) {
        let total_us = micros(total_time);
        self.frame_time_us = total_us;
        self.render_time_us = micros(render_time);
        self.sleep_time_us = micros(sleep_time);

        self.frame_time_min_us = self.frame_time_min_us.min(total_us);
        self.frame_time_max_us = self.frame_time_max_us.max(total_us);

        self.frame_time_avg_us = if self.total_frames == 0 {
            total_us as f32
        } else {
            Self::EMA_ALPHA.mul_add(total_us as f32, (1.0 - Self::EMA_ALPHA) * self.frame_time_avg_us)
        };
        self.total_frames += 1;
    }

    #[inline]
    pub const fn frame_time_avg_us(&self) -> u32 {
        self.frame_time_avg_us as u32
    }

    /// Frames per second implied by the average frame time.
    pub fn fps(&self) -> f32 {
        if self.frame_time_avg_us <= 0.0 { 0.0 } else { 1_000_000.0 / self.frame_time_avg_us }
    }

    #[inline]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Uptime as `HH:MM:SS`.
    pub fn uptime_string(&self) -> String<12> {
        format_hms(self.uptime().as_secs())
    }
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn micros(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

fn format_hms(secs: u64) -> String<12> {
    let mut out = String::new();
    // 12 bytes hold any hour count below 10^6
    write!(out, "{:02}:{:02}:{:02}", (secs / 3600).min(999_999), (secs % 3600) / 60, secs % 60).ok();
    out
}
