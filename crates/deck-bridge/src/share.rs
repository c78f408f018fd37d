//! Hand-off to the external share dialog.
//!
//! The dialog is a separate program.  We write the cover art and a JSON
//! description of the current track to temporary files, spawn the presenter
//! with the JSON path as its last argument, and delete both files once the
//! presenter exits.
use std::io::Write;
use std::path::{Path, PathBuf};

use deck_proto::config::ShareConfig;
use deck_proto::state::{PlaybackState, ShareOption};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub title: String,
    pub artist: String,
    pub cover_path: Option<PathBuf>,
    pub accent_color: String,
    pub share_options: Vec<ShareOption>,
}

/// Temp files backing one share dialog.  Dropping it removes them.
pub struct PreparedShare {
    pub request: ShareRequest,
    payload: NamedTempFile,
    _cover: Option<NamedTempFile>,
}

impl PreparedShare {
    pub fn payload_path(&self) -> &Path {
        self.payload.path()
    }
}

#[derive(Debug, Clone)]
pub struct SharePresenter {
    command: String,
    args: Vec<String>,
    temp_dir: PathBuf,
}

impl SharePresenter {
    pub fn from_config(config: &ShareConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.command.trim().is_empty()
    }

    /// Write the hand-off files.  `None` when there is nothing to share.
    pub fn prepare(&self, state: &PlaybackState) -> Result<Option<PreparedShare>> {
        let Some(options) = state.share_options.as_ref() else {
            return Ok(None);
        };

        let cover = match state.cover_art.as_deref() {
            Some(bytes) if !bytes.is_empty() => {
                let mut file = tempfile::Builder::new()
                    .prefix("tidal_cover")
                    .suffix(".jpg")
                    .tempfile_in(&self.temp_dir)?;
                file.write_all(bytes)?;
                file.flush()?;
                Some(file)
            }
            _ => None,
        };

        let request = ShareRequest {
            title: state.title.clone(),
            artist: state.artist.clone(),
            cover_path: cover.as_ref().map(|f| f.path().to_path_buf()),
            accent_color: state.accent_color.clone(),
            share_options: options.clone(),
        };

        let mut payload = tempfile::Builder::new()
            .prefix("tidal_share")
            .suffix(".json")
            .tempfile_in(&self.temp_dir)?;
        serde_json::to_writer_pretty(&mut payload, &request)?;
        payload.flush()?;

        Ok(Some(PreparedShare {
            request,
            payload,
            _cover: cover,
        }))
    }

    /// Spawn the presenter for the current track.  Returns `false` when there
    /// was nothing to share.
    pub fn present(&self, state: &PlaybackState) -> Result<bool> {
        let Some(prepared) = self.prepare(state)? else {
            return Ok(false);
        };

        let mut child = tokio::process::Command::new(&self.command)
            .args(&self.args)
            .arg(prepared.payload_path())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;
        info!(
            "share: presenter started for '{}' ({} links)",
            prepared.request.title,
            prepared.request.share_options.len()
        );

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("share: presenter exited with {}", status),
                Err(e) => warn!("share: waiting for presenter failed: {}", e),
            }
            drop(prepared);
        });
        Ok(true)
    }
}
