//! Simulated sensor and media daemons for the desktop build.
//!
//! A background thread writes GPS, network and media player values into the
//! shared store and consumes the command requests the UI publishes, standing in
//! for the daemons of the car computer. Values carry a short TTL so they read
//! as absent once the feed stops.

use core::fmt::Write;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use dashboard_ui::MemoryStore;

use crate::keys;

const FEED_PERIOD: Duration = Duration::from_millis(100);

/// Lifetime of a published value.
const VALUE_TTL: Duration = Duration::from_secs(2);

/// How often expired values and unconsumed requests are dropped from the store.
const PURGE_PERIOD: Duration = Duration::from_secs(1);

/// Title, artist, album, length in seconds.
const PLAYLIST: [(&str, &str, &str, u32); 4] = [
    ("Highway Star", "Deep Purple", "Machine Head", 365),
    ("Radar Love", "Golden Earring", "Moontan", 383),
    ("Roadrunner", "The Modern Lovers", "The Modern Lovers", 245),
    ("Autobahn", "Kraftwerk", "Autobahn", 1366),
];

/// Handle to the feed thread.
pub struct Feed {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Feed {
    pub fn start(store: MemoryStore) -> std::io::Result<Self> {
        let (stop, stopped) = crossbeam_channel::bounded(0);
        let handle = thread::Builder::new()
            .name("daemon-feed".into())
            .spawn(move || run(&store, &stopped))?;
        tracing::info!("simulated daemons started");
        Ok(Self { stop, handle })
    }

    /// Stop the thread and wait for it.
    pub fn stop(self) {
        let Self { stop, handle } = self;
        drop(stop);
        if handle.join().is_err() {
            tracing::warn!("daemon feed thread panicked");
        }
    }
}

fn run(
    store: &MemoryStore,
    stopped: &Receiver<()>,
) {
    let start = Instant::now();
    let mut player = Player::default();
    let mut last = start;
    let mut last_purge = start;

    loop {
        match stopped.recv_timeout(FEED_PERIOD) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let now = Instant::now();
        let t = now.duration_since(start).as_secs_f32();
        player.advance(now.duration_since(last).as_secs_f32());
        last = now;

        handle_requests(store, &mut player);
        publish_gps(store, t);
        publish_network(store, t);
        player.publish(store);

        if now.duration_since(last_purge) >= PURGE_PERIOD {
            store.purge_expired();
            last_purge = now;
        }
    }
    tracing::info!("simulated daemons stopped");
}

fn handle_requests(
    store: &MemoryStore,
    player: &mut Player,
) {
    if store.take_request(keys::REQ_MEDIA_NEXT).is_some() {
        player.next();
    }
    if store.take_request(keys::REQ_MEDIA_PREV).is_some() {
        player.prev();
    }
    if store.take_request(keys::REQ_MEDIA_PAUSE).is_some() {
        player.playing = !player.playing;
        tracing::info!(playing = player.playing, "media play state toggled");
    }
    for request in [keys::REQ_POWER_OFF, keys::REQ_POWER_REBOOT] {
        if let Some(params) = store.take_request(request) {
            tracing::warn!(request, ?params, "power request received, ignored in the simulator");
        }
    }
}

fn publish_gps(
    store: &MemoryStore,
    t: f32,
) {
    let mut speed = heapless::String::<16>::new();
    write!(speed, "{:.1}", fake_signal(t, 0.0, 130.0, 0.15)).ok();
    store.set_many(
        &[
            (keys::GPS_ALIVE, Some("1")),
            (keys::GPS_FIX, Some("3")),
            (keys::GPS_SPEED_KMH, Some(speed.as_str())),
        ],
        Some(VALUE_TTL),
    );
}

fn publish_network(
    store: &MemoryStore,
    t: f32,
) {
    let mut strength = heapless::String::<8>::new();
    write!(strength, "{:.0}", fake_signal(t, 5.0, 95.0, 0.05)).ok();
    store.set_many(
        &[
            (keys::NET_ETH0_IP, Some("192.168.8.2")),
            (keys::NET_WLAN0_IP, Some("10.0.0.23")),
            (keys::NET_WLAN0_SSID, Some("CarPi")),
            (keys::NET_WLAN0_STRENGTH, Some(strength.as_str())),
            // Second adapter present but not associated
            (keys::NET_WLAN1_STRENGTH, Some("-2")),
        ],
        Some(VALUE_TTL),
    );
}

/// Sine-wave value oscillating between `min` and `max`.
fn fake_signal(
    t: f32,
    min: f32,
    max: f32,
    freq: f32,
) -> f32 {
    let normalized = (t * freq).sin().mul_add(0.5, 0.5);
    min + normalized * (max - min)
}

// =============================================================================
// Media Player
// =============================================================================

#[derive(Debug)]
struct Player {
    track: usize,
    elapsed: f32,
    playing: bool,
}

impl Default for Player {
    fn default() -> Self { Self { track: 0, elapsed: 0.0, playing: true } }
}

impl Player {
    fn length(&self) -> f32 { PLAYLIST[self.track].3 as f32 }

    fn advance(
        &mut self,
        dt: f32,
    ) {
        if self.playing {
            self.elapsed += dt;
            if self.elapsed >= self.length() {
                self.next();
            }
        }
    }

    fn next(&mut self) {
        self.track = (self.track + 1) % PLAYLIST.len();
        self.elapsed = 0.0;
        tracing::info!(track = PLAYLIST[self.track].0, "next track");
    }

    /// Restart the track, or go back one if it just started.
    fn prev(&mut self) {
        if self.elapsed < 3.0 {
            self.track = (self.track + PLAYLIST.len() - 1) % PLAYLIST.len();
        }
        self.elapsed = 0.0;
        tracing::info!(track = PLAYLIST[self.track].0, "previous track");
    }

    fn publish(
        &self,
        store: &MemoryStore,
    ) {
        let (title, artist, album, length) = PLAYLIST[self.track];
        let mut time = heapless::String::<24>::new();
        write!(time, "{}:{}", self.elapsed as u32, length).ok();
        store.set_many(
            &[
                (keys::MEDIA_ALIVE, Some("1")),
                (keys::MEDIA_STATE, Some(if self.playing { "play" } else { "pause" })),
                (keys::MEDIA_TITLE, Some(title)),
                (keys::MEDIA_ARTIST, Some(artist)),
                (keys::MEDIA_ALBUM, Some(album)),
                (keys::MEDIA_TIME, Some(time.as_str())),
            ],
            Some(VALUE_TTL),
        );
    }
}

#[cfg(test)]
mod tests {
    use dashboard_ui::RequestSink;

    use super::*;

    #[test]
    fn test_fake_signal_range() {
        for i in 0..100 {
            let value = fake_signal(i as f32 * 0.37, 0.0, 130.0, 0.15);
            assert!((0.0..=130.0).contains(&value), "sample {value} out of range");
        }
    }

    #[test]
    fn test_player_wraps_playlist() {
        let mut player = Player::default();
        player.prev();
        assert_eq!(player.track, PLAYLIST.len() - 1, "prev at track start goes back");
        player.next();
        assert_eq!(player.track, 0);

        player.elapsed = 10.0;
        player.prev();
        assert_eq!(player.track, 0, "prev mid-track restarts it");
        assert_eq!(player.elapsed, 0.0);

        player.advance(player.length());
        assert_eq!(player.track, 1, "finished track advances");
    }

    #[test]
    fn test_requests_are_consumed() {
        let mut store = MemoryStore::new();
        let mut player = Player::default();
        store.publish_request(keys::REQ_MEDIA_PAUSE, &[]).unwrap();
        store.publish_request(keys::REQ_MEDIA_NEXT, &[]).unwrap();
        handle_requests(&store, &mut player);

        assert!(!player.playing);
        assert_eq!(player.track, 1);
        assert_eq!(store.get(keys::REQ_MEDIA_PAUSE), None, "request acknowledged");
    }

    #[test]
    fn test_feed_publishes_and_stops() {
        let store = MemoryStore::new();
        let feed = Feed::start(store.clone()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while store.get(keys::GPS_SPEED_KMH).is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        feed.stop();
        assert!(store.get(keys::GPS_SPEED_KMH).is_some());
        assert_eq!(store.get(keys::MEDIA_STATE).as_deref(), Some("play"));
    }
}
