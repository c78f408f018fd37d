//! Wire types for both sockets the bridge speaks:
//!
//! - the control-surface host (inbound `HostEvent`, outbound `HostMessage`)
//! - the player companion feed (outbound `SubscribeRequest`)
use serde::{Deserialize, Serialize};

/// Fields requested from the feed on every (re)connect.
pub const SUBSCRIBED_FIELDS: [&str; 8] = [
    "coverUrl",
    "track",
    "title",
    "artist",
    "playing",
    "album",
    "url",
    "vibrantColor",
];

const ACTION_PREFIX: &str = "wtf.paul.tidal.";

// ── feed ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub action: String,
    pub fields: Vec<String>,
}

impl SubscribeRequest {
    pub fn all_fields() -> Self {
        Self {
            action: "subscribe".to_string(),
            fields: SUBSCRIBED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ── control surface: inbound ──────────────────────────────────────────────────

/// Events pushed by the control-surface host.  Anything we do not act on
/// decodes as `Other`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    KeyDown { action: String, context: String },
    WillAppear { action: String, context: String },
    WillDisappear { action: String, context: String },
    #[serde(other)]
    Other,
}

impl HostEvent {
    pub fn decode(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Button actions declared by the plugin manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckAction {
    PlayPause,
    Next,
    Prev,
    Shuffle,
    Repeat,
    VolumeUp,
    VolumeDown,
    Share,
}

impl DeckAction {
    pub fn from_id(id: &str) -> Option<Self> {
        let action = match id.strip_prefix(ACTION_PREFIX)? {
            "playpause" => DeckAction::PlayPause,
            "next" => DeckAction::Next,
            "prev" => DeckAction::Prev,
            "shuffle" => DeckAction::Shuffle,
            "repeat" => DeckAction::Repeat,
            "volup" => DeckAction::VolumeUp,
            "voldown" => DeckAction::VolumeDown,
            "share" => DeckAction::Share,
            _ => return None,
        };
        Some(action)
    }

    /// Buttons with this action mirror play/pause as a two-state toggle.
    pub fn is_toggle(&self) -> bool {
        matches!(self, DeckAction::PlayPause)
    }
}

// ── control surface: outbound ─────────────────────────────────────────────────

/// Registration handshake sent once the host socket opens.  The event name
/// is supplied by the host at launch, so it is not part of `HostMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub event: String,
    pub uuid: String,
}

impl Registration {
    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostMessage {
    SetImage {
        context: String,
        payload: ImagePayload,
    },
    SetTitle {
        context: String,
        payload: TitlePayload,
    },
    SetState {
        context: String,
        payload: StatePayload,
    },
    ShowOk {
        context: String,
    },
    ShowAlert {
        context: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub image: String,
    pub target: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitlePayload {
    pub title: String,
    pub target: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePayload {
    pub state: u8,
}

impl HostMessage {
    pub fn set_image(context: &str, image: String) -> Self {
        HostMessage::SetImage {
            context: context.to_string(),
            payload: ImagePayload { image, target: 0 },
        }
    }

    /// Empty title so the host does not draw its own label over the image.
    pub fn clear_title(context: &str) -> Self {
        HostMessage::SetTitle {
            context: context.to_string(),
            payload: TitlePayload {
                title: String::new(),
                target: 0,
            },
        }
    }

    pub fn set_state(context: &str, playing: bool) -> Self {
        HostMessage::SetState {
            context: context.to_string(),
            payload: StatePayload {
                state: u8::from(playing),
            },
        }
    }

    pub fn show_ok(context: &str) -> Self {
        HostMessage::ShowOk {
            context: context.to_string(),
        }
    }

    pub fn show_alert(context: &str) -> Self {
        HostMessage::ShowAlert {
            context: context.to_string(),
        }
    }

    pub fn context(&self) -> &str {
        match self {
            HostMessage::SetImage { context, .. }
            | HostMessage::SetTitle { context, .. }
            | HostMessage::SetState { context, .. }
            | HostMessage::ShowOk { context }
            | HostMessage::ShowAlert { context } => context,
        }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
