use clap::Parser;

/// Flags the control-surface host passes with a single dash.
const HOST_FLAGS: [&str; 4] = ["-port", "-pluginUUID", "-registerEvent", "-info"];

/// Launch arguments supplied by the control-surface host.
#[derive(Debug, Clone, Parser)]
#[command(name = "tidal-deck", version, about = "Tidal now-playing bridge for button decks")]
pub struct Cli {
    /// Port of the host's local WebSocket.
    #[arg(long)]
    pub port: u16,

    /// Identity to register with.
    #[arg(long = "pluginUUID")]
    pub plugin_uuid: String,

    /// Event name of the registration message.
    #[arg(long = "registerEvent")]
    pub register_event: String,

    /// Host/device description JSON (unused).
    #[arg(long)]
    pub info: Option<String>,
}

impl Cli {
    /// Parse host-style arguments (`-port 28196 -pluginUUID ...`).
    pub fn parse_host_args<I>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = String>,
    {
        Self::try_parse_from(normalize_host_args(args))
    }
}

/// Rewrite the host's single-dash long flags to `--flag`.
pub fn normalize_host_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            if HOST_FLAGS.contains(&arg.as_str()) {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect()
}
