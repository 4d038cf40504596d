use std::{env, fs::File, path::PathBuf};

use anyhow::Result;
use serde_json::{Value, json};
use studio_bridge::{
    Bridge, BridgeConfig, ChannelTransport, FunctionDeclaration, InitOptions, framing::serve,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
// Need this import to succeed in prod builds
#[allow(unused_imports)]
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
};

/// 1x1 transparent PNG.
const PLACEHOLDER_SCREENSHOT: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(
            env::var("STUDIO_BRIDGE_LOG").unwrap_or_else(|_| "studio_bridge=debug".to_string()),
        );

    // stdout carries frames, so logs go to a file
    let log_path =
        env::var("STUDIO_BRIDGE_LOG_FILE").unwrap_or_else(|_| "studio-bridge.log".to_string());
    fmt()
        .with_env_filter(filter)
        .with_writer(File::create(log_path)?)
        .init();

    let config = match env::var_os("STUDIO_BRIDGE_CONFIG") {
        Some(path) => BridgeConfig::load(&PathBuf::from(path))?,
        None => BridgeConfig::default(),
    };
    let screenshot = env::var("STUDIO_BRIDGE_SCREENSHOT")
        .unwrap_or_else(|_| PLACEHOLDER_SCREENSHOT.to_string());

    let (transport, outbound) = ChannelTransport::new();
    let bridge = Bridge::new(config, transport);

    let (echo_tx, mut echo_rx) = mpsc::unbounded_channel::<Value>();
    let init = bridge.init(
        InitOptions::new()
            .system_instructions(
                "You are connected to a test guest. Call `echo` to send text back to the chat.",
            )
            .function(FunctionDeclaration::new(
                "echo",
                "Repeats the given text in the chat view.",
                json!({
                    "type": "object",
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "The text to repeat.",
                        },
                    },
                    "required": ["text"],
                }),
                move |args| {
                    if echo_tx.send(args).is_err() {
                        warn!("Echo task is gone, dropping function call");
                    }
                },
            ))
            .screenshot_provider(move || {
                let screenshot = screenshot.clone();
                async move { Ok::<_, anyhow::Error>(screenshot) }
            }),
    )?;

    let guest = bridge.clone();
    tokio::spawn(async move {
        if let Err(e) = init.await {
            error!("Init did not complete: {}", e);
            return;
        }
        info!("Connected to host at {:?}", guest.origin());
        if let Err(e) = guest.chat("Guest connected.") {
            error!("Failed to greet host: {}", e);
        }

        while let Some(args) = echo_rx.recv().await {
            let text = match args.get("text").and_then(Value::as_str) {
                Some(text) => text.to_string(),
                None => args.to_string(),
            };
            if let Err(e) = guest.chat(text) {
                error!("Failed to echo: {}", e);
            }
        }
    });

    serve(bridge, outbound, tokio::io::stdin(), tokio::io::stdout()).await
}
