use std::collections::BTreeSet;

use deck_proto::protocol::HostMessage;
use deck_proto::state::PlaybackState;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRole {
    Generic,
    PlayPauseToggle,
}

/// Buttons currently visible on the control surface.  Membership only.
#[derive(Debug, Default)]
pub struct Registry {
    contexts: BTreeSet<String>,
    toggles: BTreeSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, context: &str, role: ContextRole) {
        self.contexts.insert(context.to_string());
        if role == ContextRole::PlayPauseToggle {
            self.toggles.insert(context.to_string());
        }
    }

    pub fn unregister(&mut self, context: &str) {
        self.contexts.remove(context);
        self.toggles.remove(context);
    }

    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.contexts.iter().map(String::as_str)
    }

    pub fn toggle_targets(&self) -> impl Iterator<Item = &str> {
        self.toggles.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Pushes rendered output to every registered button.
pub struct Dispatcher {
    host_tx: mpsc::Sender<HostMessage>,
    renders: u64,
}

impl Dispatcher {
    pub fn new(host_tx: mpsc::Sender<HostMessage>) -> Self {
        Self {
            host_tx,
            renders: 0,
        }
    }

    /// Number of images composed so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Render once and send the image plus an empty title to every context.
    pub async fn broadcast_render(
        &mut self,
        state: &PlaybackState,
        registry: &Registry,
    ) -> Result<()> {
        if registry.is_empty() {
            return Ok(());
        }
        let image = render::render(state);
        self.renders += 1;
        debug!(
            "render #{} -> {} contexts ({} bytes)",
            self.renders,
            registry.len(),
            image.len()
        );

        for context in registry.contexts() {
            self.send(HostMessage::set_image(context, image.clone()))
                .await?;
            self.send(HostMessage::clear_title(context)).await?;
        }
        Ok(())
    }

    /// Mirror the play state on toggle buttons only.
    pub async fn broadcast_toggle(&self, registry: &Registry, playing: bool) -> Result<()> {
        for context in registry.toggle_targets() {
            self.send(HostMessage::set_state(context, playing)).await?;
        }
        Ok(())
    }

    pub async fn send(&self, msg: HostMessage) -> Result<()> {
        self.host_tx
            .send(msg)
            .await
            .map_err(|_| BridgeError::ChannelClosed)
    }
}
