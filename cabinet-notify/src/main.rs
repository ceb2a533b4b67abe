//! Notification listener (cabinet-notify) - Main entry point
//!
//! Connects one viewer session to the event stream and renders every
//! recognised notification to the terminal until interrupted or until the
//! transport gives up reconnecting.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cabinet_common::config::{
    self, TomlConfig, ENV_ROLE, ENV_STREAM_TOKEN, ENV_STREAM_URL, ENV_USER_ID,
};
use cabinet_common::CabinetRole;
use cabinet_notify::console::{ConsoleNoticeSink, LogPushNotifier, TerminalBell};
use cabinet_notify::{NotificationEffects, NotificationFanout, UnreadCounter};
use cabinet_stream::events::GAVE_UP;
use cabinet_stream::{handler, StreamTransport, TransportConfig};
use clap::Parser;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for cabinet-notify
#[derive(Parser, Debug)]
#[command(name = "cabinet-notify")]
#[command(about = "Live notification listener for a cabinet session")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/cabinet/notify.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stream base URL
    #[arg(long)]
    base_url: Option<String>,

    /// User whose stream to follow
    #[arg(short, long)]
    user_id: Option<String>,

    /// Bearer credential for the stream request
    #[arg(long)]
    token: Option<String>,

    /// Viewer role (artist, dj, producer, radio_station, venue, admin)
    #[arg(short, long)]
    role: Option<String>,

    /// Do not ring the terminal bell
    #[arg(long)]
    mute: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing; config loading already logs. The configured level
    // replaces the default filter once the file is read
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let toml_config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if !from_env {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&toml_config.logging.level)) {
            warn!("Failed to apply configured log level: {}", e);
        }
    }

    let base_url = config::require_value(
        "Stream base URL",
        args.base_url.as_deref(),
        ENV_STREAM_URL,
        toml_config.stream.base_url.as_deref(),
    )?;
    let user_id = config::require_value(
        "User id",
        args.user_id.as_deref(),
        ENV_USER_ID,
        toml_config.viewer.user_id.as_deref(),
    )?;
    let token = config::require_value("Stream token", args.token.as_deref(), ENV_STREAM_TOKEN, None)?;
    let role = config::resolve_value(
        args.role.as_deref(),
        ENV_ROLE,
        toml_config.viewer.role.map(|r| r.as_str()),
        None,
    )
    .map(|name| CabinetRole::parse(&name))
    .unwrap_or_default();

    info!("Starting cabinet-notify for user {} ({})", user_id, role);
    if role == CabinetRole::Unknown {
        warn!("No recognised viewer role configured, using generic labels");
    }

    let transport = StreamTransport::new(
        TransportConfig::new(base_url, user_id, token).with_settings(&toml_config.stream),
    );

    let effects = NotificationEffects::new(Arc::new(ConsoleNoticeSink))
        .with_audio(Arc::new(TerminalBell { muted: args.mute }))
        .with_push(Arc::new(LogPushNotifier));
    let fanout = NotificationFanout::new(transport.clone(), effects);
    let unread = UnreadCounter::new(transport.clone());

    let gave_up = Arc::new(Notify::new());
    let gave_up_handler = {
        let gave_up = Arc::clone(&gave_up);
        handler(move |_| gave_up.notify_one())
    };
    transport.on(GAVE_UP, Arc::clone(&gave_up_handler));

    unread.attach();
    fanout.attach(role, None);
    transport.connect();

    tokio::select! {
        _ = shutdown_signal() => {}
        _ = gave_up.notified() => {
            warn!("Event stream unavailable, giving up");
        }
    }

    transport.disconnect();
    fanout.detach();
    unread.detach();
    transport.off(GAVE_UP, &gave_up_handler);

    info!("Shutdown complete ({} unread notifications)", unread.count());
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
