//! Button image composition.
//!
//! `render` is a pure function of `PlaybackState`: the same state always
//! produces the same bytes, so it is computed once per change and shared by
//! every button.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use deck_proto::state::PlaybackState;
use quick_xml::escape::escape;

pub const CANVAS_SIZE: u32 = 144;
pub const TITLE_MAX_CHARS: usize = 14;
pub const ARTIST_MAX_CHARS: usize = 18;

const ELLIPSIS: &str = "..";
const BACKGROUND: &str = "#1e1e2e";
const TITLE_COLOR: &str = "#cdd6f4";
const ARTIST_COLOR: &str = "#89dceb";
const PAUSED_COLOR: &str = "#f38ba8";
/// Top edge of the legibility gradient; it covers the lower 84px (~58%).
const GRADIENT_TOP: u32 = 60;

pub fn render(state: &PlaybackState) -> String {
    let svg = compose_svg(state);
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// The SVG document before it is wrapped in a data URI.
pub fn compose_svg(state: &PlaybackState) -> String {
    let size = CANVAS_SIZE;
    let title = escape(truncate(&state.title, TITLE_MAX_CHARS));
    let artist = escape(truncate(&state.artist, ARTIST_MAX_CHARS));

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}">"#
    );
    svg.push_str(&format!(
        r#"<rect width="{size}" height="{size}" fill="{BACKGROUND}" />"#
    ));

    if let Some(cover) = state.cover_art.as_deref().filter(|c| !c.is_empty()) {
        svg.push_str(&format!(
            r#"<image href="data:image/jpeg;base64,{}" width="{size}" height="{size}" preserveAspectRatio="xMidYMid slice" />"#,
            STANDARD.encode(cover)
        ));
    }

    svg.push_str(&format!(
        r#"<defs><linearGradient id="grad" x1="0%" y1="0%" x2="0%" y2="100%"><stop offset="0%" style="stop-color:{BACKGROUND};stop-opacity:0" /><stop offset="100%" style="stop-color:{BACKGROUND};stop-opacity:0.9" /></linearGradient></defs>"#
    ));
    svg.push_str(&format!(
        r#"<rect y="{GRADIENT_TOP}" width="{size}" height="{}" fill="url(#grad)" />"#,
        size - GRADIENT_TOP
    ));

    let center = size / 2;
    svg.push_str(&format!(
        r#"<text x="{center}" y="105" font-family="Arial, sans-serif" font-size="20" fill="{TITLE_COLOR}" font-weight="bold" text-anchor="middle">{title}</text>"#
    ));
    svg.push_str(&format!(
        r#"<text x="{center}" y="130" font-family="Arial, sans-serif" font-size="16" fill="{ARTIST_COLOR}" text-anchor="middle">{artist}</text>"#
    ));

    if !state.is_playing {
        svg.push_str(&format!(
            r#"<circle cx="125" cy="19" r="8" fill="{PAUSED_COLOR}" stroke="{TITLE_COLOR}" stroke-width="2" />"#
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Cut `text` to at most `max` characters, replacing the tail with `..`
/// when anything was dropped.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(ELLIPSIS.len())).collect();
    kept + ELLIPSIS
}
