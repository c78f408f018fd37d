//! Feed payload normalization.
//!
//! The player companion pushes two shapes over the same socket:
//!
//! ```text
//!   incremental   {"field": "artist", "value": {"name": "Björk"}}
//!   snapshot      {"title": "Jóga", "artist": "Björk", "playing": true,
//!                  "album": {"coverUrl": ".../640x640.jpg", "vibrantColor": "#aa3344"}}
//! ```
//!
//! `FeedPayload::classify` turns a raw JSON value into a typed payload and
//! `normalize` applies it to the canonical `PlaybackState`.  Equivalent data
//! in either shape yields the same state.
use deck_proto::state::PlaybackState;
use serde_json::{Map, Value};

/// Fields that apply regardless of payload shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonFields {
    pub track_url: Option<String>,
    pub accent_color: Option<String>,
}

/// One `{field, value}` update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Title(String),
    Artist(String),
    Playing(bool),
    CoverUrl(String),
    /// Track URL; already captured in `CommonFields`.
    Url,
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotFields {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub playing: Option<bool>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadKind {
    Incremental(FieldUpdate),
    Snapshot(SnapshotFields),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPayload {
    pub common: CommonFields,
    pub kind: PayloadKind,
}

/// What the engine has to do after a payload was applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// A visible field changed; the button image is stale.
    pub changed: bool,
    /// New play state, for the toggle buttons.
    pub play_state: Option<bool>,
    /// Cover art to fetch.
    pub cover_url: Option<String>,
    /// Normalized track URL whose share links must be resolved.
    pub resolve_links: Option<String>,
}

impl FeedPayload {
    /// Returns `None` for anything that is not a JSON object.
    pub fn classify(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;

        let incremental = match (obj.get("field").and_then(Value::as_str), obj.get("value")) {
            (Some(field), Some(value)) => Some((field, value)),
            _ => None,
        };

        let mut track_url = first_str(obj, &["url", "shareUrl"])
            .or_else(|| nested_str(obj, "track", "url"));
        if track_url.is_none() {
            if let Some(("url", value)) = incremental {
                track_url = non_empty(value.as_str());
            }
        }
        let accent_color =
            first_str(obj, &["vibrantColor"]).or_else(|| nested_str(obj, "album", "vibrantColor"));
        let common = CommonFields {
            track_url,
            accent_color,
        };

        let kind = match incremental {
            Some((field, value)) => PayloadKind::Incremental(field_update(field, value)),
            None => PayloadKind::Snapshot(snapshot_fields(obj)),
        };

        Some(Self { common, kind })
    }
}

fn field_update(field: &str, value: &Value) -> FieldUpdate {
    let update = match field {
        "title" | "track" => coerce_title(value).map(FieldUpdate::Title),
        "artist" => coerce_artist(value).map(FieldUpdate::Artist),
        "playing" => value.as_bool().map(FieldUpdate::Playing),
        "coverUrl" => non_empty(value.as_str()).map(FieldUpdate::CoverUrl),
        "url" => Some(FieldUpdate::Url),
        _ => None,
    };
    update.unwrap_or(FieldUpdate::Ignored)
}

fn snapshot_fields(obj: &Map<String, Value>) -> SnapshotFields {
    let title = ["track", "title"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| is_truthy(v))
        .and_then(coerce_title);

    SnapshotFields {
        title,
        artist: obj.get("artist").and_then(coerce_artist),
        playing: obj.get("playing").and_then(Value::as_bool),
        cover_url: first_str(obj, &["coverUrl"]).or_else(|| nested_str(obj, "album", "coverUrl")),
    }
}

/// Track titles arrive either as a string or as a track object.
fn coerce_title(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => first_str(obj, &["title", "track"]),
        other => non_empty(other.as_str()),
    }
}

/// Artists arrive either as a string or as an artist object.
fn coerce_artist(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => first_str(obj, &["name"]),
        other => non_empty(other.as_str()),
    }
}

fn first_str(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| non_empty(obj.get(*k).and_then(Value::as_str)))
}

fn nested_str(obj: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
    obj.get(parent)
        .and_then(Value::as_object)
        .and_then(|inner| first_str(inner, &[key]))
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Apply one payload to the canonical state.
pub fn normalize(state: &mut PlaybackState, payload: &FeedPayload) -> Outcome {
    let mut outcome = Outcome::default();

    if let Some(color) = &payload.common.accent_color {
        if state.accent_color != *color {
            state.accent_color = color.clone();
            outcome.changed = true;
        }
    }

    // Invalidates share links but is not visible on the button by itself.
    if let Some(url) = &payload.common.track_url {
        outcome.resolve_links = state.set_track_url(url);
    }

    match &payload.kind {
        PayloadKind::Incremental(update) => match update {
            FieldUpdate::Title(title) => set_title(state, title, &mut outcome),
            FieldUpdate::Artist(artist) => set_artist(state, artist, &mut outcome),
            FieldUpdate::Playing(playing) => set_playing(state, *playing, &mut outcome),
            FieldUpdate::CoverUrl(url) => outcome.cover_url = Some(url.clone()),
            FieldUpdate::Url | FieldUpdate::Ignored => {}
        },
        PayloadKind::Snapshot(fields) => {
            if let Some(title) = &fields.title {
                set_title(state, title, &mut outcome);
            }
            if let Some(artist) = &fields.artist {
                set_artist(state, artist, &mut outcome);
            }
            if let Some(playing) = fields.playing {
                set_playing(state, playing, &mut outcome);
            }
            outcome.cover_url = fields.cover_url.clone();
        }
    }

    outcome
}

fn set_title(state: &mut PlaybackState, title: &str, outcome: &mut Outcome) {
    if state.title != title {
        state.title = title.to_string();
        outcome.changed = true;
    }
}

fn set_artist(state: &mut PlaybackState, artist: &str, outcome: &mut Outcome) {
    if state.artist != artist {
        state.artist = artist.to_string();
        outcome.changed = true;
    }
}

fn set_playing(state: &mut PlaybackState, playing: bool, outcome: &mut Outcome) {
    if state.is_playing != playing {
        state.is_playing = playing;
        outcome.changed = true;
        outcome.play_state = Some(playing);
    }
}
