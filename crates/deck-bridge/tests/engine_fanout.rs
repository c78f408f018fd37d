mod common;

use common::*;
use deck_bridge::engine::EngineEvent;
use deck_bridge::error::BridgeError;
use deck_bridge::render;
use deck_proto::protocol::{HostEvent, HostMessage};
use deck_proto::state::{PlaybackState, ShareOption};
use serde_json::json;

fn tidal_option(url: &str) -> ShareOption {
    ShareOption {
        service_name: "Tidal".into(),
        url: url.into(),
        accent_color: "#89dceb".into(),
    }
}

#[tokio::test]
async fn title_change_renders_once_for_three_contexts() {
    let mut h = harness(&config_for(&closed_port_url()));
    for ctx in ["a", "b", "c"] {
        h.appear(ACTION_NEXT, ctx).await;
    }
    assert!(h.drain_host().is_empty());

    h.feed(json!({"field": "title", "value": "Pagan Poetry"})).await;

    let sent = h.drain_host();
    assert_eq!(count_images(&sent), 3);
    assert_eq!(count_titles(&sent), 3);
    assert_eq!(h.engine.render_count(), 1);
}

#[tokio::test]
async fn play_transition_toggles_only_toggle_buttons_and_rerenders() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.appear(ACTION_NEXT, "generic").await;
    h.appear(ACTION_PLAYPAUSE, "toggle").await;

    h.feed(json!({"field": "playing", "value": true})).await;

    let sent = h.drain_host();
    assert_eq!(state_targets(&sent), vec![("toggle".to_string(), 1)]);
    assert_eq!(count_images(&sent), 2);
    assert_eq!(h.engine.render_count(), 1);
}

#[tokio::test]
async fn unchanged_payload_sends_nothing() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.appear(ACTION_NEXT, "a").await;

    h.feed(json!({"title": "Tidal", "artist": "Ready", "playing": false}))
        .await;

    assert!(h.drain_host().is_empty());
    assert_eq!(h.engine.render_count(), 0);
}

#[tokio::test]
async fn new_button_gets_idle_render_when_player_unreachable() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.appear(ACTION_NEXT, "fresh").await;

    let evt = h
        .pump_until(|e| matches!(e, EngineEvent::Snapshot(_)))
        .await;
    assert!(matches!(evt, EngineEvent::Snapshot(None)));
    h.engine.handle_event(evt).await.unwrap();

    let sent = h.drain_host();
    let expected = render::render(&PlaybackState::default());
    assert!(sent.contains(&HostMessage::set_image("fresh", expected)));
}

#[tokio::test]
async fn disappeared_button_receives_nothing() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.appear(ACTION_PLAYPAUSE, "gone").await;
    h.appear(ACTION_NEXT, "kept").await;
    h.engine
        .handle_event(EngineEvent::Host(HostEvent::WillDisappear {
            action: ACTION_PLAYPAUSE.into(),
            context: "gone".into(),
        }))
        .await
        .unwrap();
    assert_eq!(h.engine.registry().contexts().collect::<Vec<_>>(), vec!["kept"]);

    h.feed(json!({"playing": true, "title": "Cocoon"})).await;

    let sent = h.drain_host();
    assert!(sent.iter().all(|m| m.context() == "kept"));
    assert!(state_targets(&sent).is_empty());
}

#[tokio::test]
async fn link_failure_clears_previously_resolved_options() {
    let mut h = harness(&config_for(&closed_port_url()));

    h.feed(json!({"url": "https://www.tidal.com/track/1"})).await;
    h.engine
        .handle_event(EngineEvent::LinksResolved {
            generation: 1,
            result: Ok(vec![tidal_option("https://listen.tidal.com/track/1")]),
        })
        .await
        .unwrap();
    assert!(h.engine.state().share_options.is_some());

    // The real request goes to a closed port and fails at the network level
    let evt = h
        .pump_until(|e| matches!(e, EngineEvent::LinksResolved { .. }))
        .await;
    match &evt {
        EngineEvent::LinksResolved { generation, result } => {
            assert_eq!(*generation, 1);
            assert!(matches!(result, Err(BridgeError::Http(_))));
        }
        other => panic!("unexpected event {:?}", other),
    }
    h.engine.handle_event(evt).await.unwrap();

    assert!(h.engine.state().share_options.is_none());
}

#[tokio::test]
async fn stale_link_result_is_discarded() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.feed(json!({"url": "https://listen.tidal.com/track/1"})).await;
    h.feed(json!({"url": "https://listen.tidal.com/track/2"})).await;

    h.engine
        .handle_event(EngineEvent::LinksResolved {
            generation: 1,
            result: Ok(vec![tidal_option("https://listen.tidal.com/track/1")]),
        })
        .await
        .unwrap();
    assert!(h.engine.state().share_options.is_none());

    h.engine
        .handle_event(EngineEvent::LinksResolved {
            generation: 2,
            result: Ok(vec![tidal_option("https://listen.tidal.com/track/2")]),
        })
        .await
        .unwrap();
    assert_eq!(
        h.engine.state().share_options,
        Some(vec![tidal_option("https://listen.tidal.com/track/2")])
    );
}

#[tokio::test]
async fn stale_cover_is_discarded_and_current_cover_renders() {
    let base = closed_port_url();
    let mut h = harness(&config_for(&base));
    h.appear(ACTION_NEXT, "a").await;

    h.feed(json!({"field": "coverUrl", "value": format!("{}/old/80x80.jpg", base)}))
        .await;
    h.feed(json!({"field": "coverUrl", "value": format!("{}/new/80x80.jpg", base)}))
        .await;
    h.drain_host();

    h.engine
        .handle_event(EngineEvent::CoverFetched {
            generation: 1,
            result: Ok(vec![1, 1, 1]),
        })
        .await
        .unwrap();
    assert!(h.engine.state().cover_art.is_none());
    assert!(h.drain_host().is_empty());

    h.engine
        .handle_event(EngineEvent::CoverFetched {
            generation: 2,
            result: Ok(vec![2, 2, 2]),
        })
        .await
        .unwrap();
    assert_eq!(h.engine.state().cover_art, Some(vec![2, 2, 2]));
    assert_eq!(count_images(&h.drain_host()), 1);
}

#[tokio::test]
async fn failed_cover_keeps_art_and_flushes_deferred_render() {
    let base = closed_port_url();
    let mut h = harness(&config_for(&base));
    h.appear(ACTION_NEXT, "a").await;

    h.feed(json!({"field": "coverUrl", "value": format!("{}/a/80x80.jpg", base)}))
        .await;
    h.engine
        .handle_event(EngineEvent::CoverFetched {
            generation: 1,
            result: Ok(vec![9, 9]),
        })
        .await
        .unwrap();
    h.drain_host();

    // Title change waits for the new cover
    h.feed(json!({"title": "Vertebrae", "coverUrl": format!("{}/b/80x80.jpg", base)}))
        .await;
    assert!(h.drain_host().is_empty());

    h.engine
        .handle_event(EngineEvent::CoverFetched {
            generation: 2,
            result: Err(BridgeError::EmptyBody),
        })
        .await
        .unwrap();

    assert_eq!(h.engine.state().cover_art, Some(vec![9, 9]));
    assert_eq!(h.engine.state().title, "Vertebrae");
    assert_eq!(count_images(&h.drain_host()), 1);
}

#[tokio::test]
async fn share_key_without_links_alerts_only_that_button() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.appear(ACTION_SHARE, "share").await;
    h.appear(ACTION_NEXT, "other").await;

    h.engine
        .handle_event(EngineEvent::Host(HostEvent::KeyDown {
            action: ACTION_SHARE.into(),
            context: "share".into(),
        }))
        .await
        .unwrap();

    assert_eq!(h.drain_host(), vec![HostMessage::show_alert("share")]);
}

#[tokio::test]
async fn failed_transport_command_alerts_only_that_button() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.appear(ACTION_NEXT, "next").await;
    h.appear(ACTION_PLAYPAUSE, "toggle").await;

    h.engine
        .handle_event(EngineEvent::Host(HostEvent::KeyDown {
            action: ACTION_NEXT.into(),
            context: "next".into(),
        }))
        .await
        .unwrap();

    let msg = h
        .host_until(|m| matches!(m, HostMessage::ShowAlert { .. }))
        .await;
    assert_eq!(msg, HostMessage::show_alert("next"));
}

#[tokio::test]
async fn malformed_feed_payload_is_ignored() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.appear(ACTION_NEXT, "a").await;
    h.feed(json!(["not", "an", "object"])).await;
    h.feed(json!(42)).await;
    assert_eq!(h.engine.state(), &PlaybackState::default());
    assert!(h.drain_host().is_empty());
}

#[tokio::test]
async fn unfetchable_cover_does_not_strand_deferred_title() {
    let base = closed_port_url();
    let mut h = harness(&config_for(&base));
    h.appear(ACTION_NEXT, "a").await;

    h.feed(json!({"title": "Vertebrae", "coverUrl": format!("{}/b/80x80.jpg", base)}))
        .await;
    assert!(h.drain_host().is_empty());

    // Not an http URL, so no fetch starts and the pending one stays current
    h.feed(json!({"field": "coverUrl", "value": "tidal-cover-id/80x80.jpg"}))
        .await;
    assert_eq!(h.engine.cover_generation(), 1);

    h.engine
        .handle_event(EngineEvent::CoverFetched {
            generation: 1,
            result: Ok(vec![1, 2, 3]),
        })
        .await
        .unwrap();

    assert_eq!(h.engine.state().cover_art, Some(vec![1, 2, 3]));
    assert_eq!(h.engine.state().title, "Vertebrae");
    assert_eq!(count_images(&h.drain_host()), 1);
}

#[tokio::test]
async fn new_toggle_button_gets_current_play_state() {
    let mut h = harness(&config_for(&closed_port_url()));
    h.feed(json!({"field": "playing", "value": true})).await;

    h.appear(ACTION_PLAYPAUSE, "toggle").await;
    h.appear(ACTION_NEXT, "generic").await;
    for _ in 0..2 {
        let evt = h
            .pump_until(|e| matches!(e, EngineEvent::Snapshot(_)))
            .await;
        h.engine.handle_event(evt).await.unwrap();
    }

    let sent = h.drain_host();
    let targets = state_targets(&sent);
    assert!(!targets.is_empty());
    assert!(targets.iter().all(|t| t == &("toggle".to_string(), 1)));
}
