use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Tidal";
pub const DEFAULT_ARTIST: &str = "Ready";
pub const DEFAULT_ACCENT_COLOR: &str = "#89b4fa";

const WEB_HOST: &str = "www.tidal.com";
const LISTEN_HOST: &str = "listen.tidal.com";

/// One cross-platform link offered by the share dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOption {
    pub service_name: String,
    pub url: String,
    pub accent_color: String,
}

/// Canonical record of what is currently playing.
///
/// `share_options` is `None` while links are unresolved or unavailable; it is
/// never an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub title: String,
    pub artist: String,
    pub cover_art: Option<Vec<u8>>,
    pub accent_color: String,
    pub track_url: Option<String>,
    pub is_playing: bool,
    pub share_options: Option<Vec<ShareOption>>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            artist: DEFAULT_ARTIST.to_string(),
            cover_art: None,
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            track_url: None,
            is_playing: false,
            share_options: None,
        }
    }
}

impl PlaybackState {
    /// Store a new track URL.  Returns the normalized URL when it differs
    /// from the current one; share options are invalidated in that case.
    pub fn set_track_url(&mut self, url: &str) -> Option<String> {
        let normalized = normalize_track_url(url);
        if self.track_url.as_deref() == Some(normalized.as_str()) {
            return None;
        }
        self.track_url = Some(normalized.clone());
        self.share_options = None;
        Some(normalized)
    }

    /// Replace the share options atomically.  An empty list means "nothing
    /// to share" and is stored as `None`.
    pub fn set_share_options(&mut self, options: Vec<ShareOption>) {
        self.share_options = if options.is_empty() {
            None
        } else {
            Some(options)
        };
    }
}

/// Point web-player links at the streaming host.
pub fn normalize_track_url(url: &str) -> String {
    url.replace(WEB_HOST, LISTEN_HOST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = PlaybackState::default();
        assert_eq!(state.title, "Tidal");
        assert_eq!(state.artist, "Ready");
        assert_eq!(state.accent_color, "#89b4fa");
        assert!(state.cover_art.is_none());
        assert!(state.track_url.is_none());
        assert!(!state.is_playing);
        assert!(state.share_options.is_none());
    }

    #[test]
    fn test_normalize_track_url() {
        assert_eq!(
            normalize_track_url("https://www.tidal.com/track/1"),
            "https://listen.tidal.com/track/1"
        );
        assert_eq!(
            normalize_track_url("https://listen.tidal.com/track/1"),
            "https://listen.tidal.com/track/1"
        );
    }

    #[test]
    fn test_set_track_url_clears_share_options() {
        let mut state = PlaybackState {
            share_options: Some(vec![ShareOption {
                service_name: "Tidal".into(),
                url: "https://listen.tidal.com/track/1".into(),
                accent_color: "#89dceb".into(),
            }]),
            ..Default::default()
        };
        let changed = state.set_track_url("https://www.tidal.com/track/2");
        assert_eq!(changed.as_deref(), Some("https://listen.tidal.com/track/2"));
        assert!(state.share_options.is_none());
    }

    #[test]
    fn test_set_track_url_same_value_is_noop() {
        let mut state = PlaybackState::default();
        state.set_track_url("https://listen.tidal.com/track/3");
        state.set_share_options(vec![ShareOption {
            service_name: "Spotify".into(),
            url: "https://open.spotify.com/track/x".into(),
            accent_color: "#a6e3a1".into(),
        }]);
        assert!(state
            .set_track_url("https://listen.tidal.com/track/3")
            .is_none());
        assert!(state.share_options.is_some());
    }

    #[test]
    fn test_empty_share_options_stored_as_none() {
        let mut state = PlaybackState::default();
        state.set_share_options(Vec::new());
        assert!(state.share_options.is_none());
    }
}
