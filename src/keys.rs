//! Store keys shared by the dashboard screens and the simulated daemons.

// GPS
pub const GPS_ALIVE: &str = "GPS.Alive";
pub const GPS_SPEED_KMH: &str = "GPS.Speed.KMH";
pub const GPS_FIX: &str = "GPS.Fix";

// Network
pub const NET_ETH0_IP: &str = "Net.eth0.IP";
pub const NET_WLAN0_IP: &str = "Net.wlan0.IP";
pub const NET_WLAN0_SSID: &str = "Net.wlan0.SSID";
pub const NET_WLAN0_STRENGTH: &str = "Net.wlan0.Strength";
pub const NET_WLAN1_IP: &str = "Net.wlan1.IP";
pub const NET_WLAN1_SSID: &str = "Net.wlan1.SSID";
pub const NET_WLAN1_STRENGTH: &str = "Net.wlan1.Strength";

// Media player
pub const MEDIA_ALIVE: &str = "Media.Alive";
pub const MEDIA_STATE: &str = "Media.State";
pub const MEDIA_TITLE: &str = "Media.Title";
pub const MEDIA_ARTIST: &str = "Media.Artist";
pub const MEDIA_ALBUM: &str = "Media.Album";
/// Elapsed and total seconds as `elapsed:total`.
pub const MEDIA_TIME: &str = "Media.Time";

// Requests
pub const REQ_MEDIA_PREV: &str = "Media.Command.Prev";
pub const REQ_MEDIA_PAUSE: &str = "Media.Command.Pause";
pub const REQ_MEDIA_NEXT: &str = "Media.Command.Next";
pub const REQ_POWER_OFF: &str = "Power.Command.Shutdown";
pub const REQ_POWER_REBOOT: &str = "Power.Command.Reboot";

/// Keys every page polls for the status bar.
pub const STATUS_KEYS: [&str; 4] = [NET_ETH0_IP, NET_WLAN0_STRENGTH, NET_WLAN1_STRENGTH, GPS_FIX];

/// Keys the network settings window lists.
pub const NETWORK_KEYS: [&str; 5] = [NET_ETH0_IP, NET_WLAN0_IP, NET_WLAN0_SSID, NET_WLAN1_IP, NET_WLAN1_SSID];

/// Owned key list for a page: the status keys plus `page_keys`.
pub fn page_keys(page_keys: &[&str]) -> Vec<String> {
    STATUS_KEYS
        .iter()
        .chain(NETWORK_KEYS.iter())
        .chain(page_keys)
        .map(|&key| key.to_owned())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect()
}
