// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-line front-end for `relaylink`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relaylink::event::{AssistantEvent, next_event};
use relaylink::speech::LineListener;
use relaylink::{Action, AssistantConfig, Controller, EventBus, SerialLink, Voice, VoiceAssistant};

#[derive(Debug, Parser)]
#[command(name = "relaylink", version, about = "Drive a serial light and relay controller")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not run the speech synthesizer; only print what would be said.
    #[arg(long, global = true)]
    mute: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan for Bluetooth devices.
    Scan {
        /// Scan duration in seconds.
        #[arg(long)]
        seconds: Option<u64>,
        /// Print only the address of the device with this list number.
        #[arg(long)]
        pick: Option<usize>,
    },
    /// List serial ports.
    Ports,
    /// Send one action and print the reply.
    Send {
        /// Action name (`red-on`, `temperature`, ...) or wire command.
        action: Action,
        /// Serial port.
        #[arg(long)]
        port: Option<String>,
    },
    /// Run automatic mode until the threshold trips or Ctrl-C.
    Monitor {
        /// Serial port.
        #[arg(long)]
        port: Option<String>,
    },
    /// Voice loop, reading recognized speech from stdin lines.
    Assistant {
        /// Serial port.
        #[arg(long)]
        port: Option<String>,
    },
    /// List the action vocabulary.
    Actions,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relaylink=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AssistantConfig::resolve(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Scan { seconds, pick } => scan(&config, seconds, pick).await,
        Commands::Ports => {
            for port in SerialLink::available_ports() {
                println!("{port}");
            }
            Ok(())
        }
        Commands::Send { action, port } => {
            let config = config.with_port(port);
            let controller = controller(&config, cli.mute);
            connect(&controller, &config).await?;
            if let Some(reply) = controller.perform(action).await {
                println!("{reply}");
            }
            controller.disconnect().await;
            Ok(())
        }
        Commands::Monitor { port } => {
            let config = config.with_port(port);
            let controller = controller(&config, cli.mute);
            connect(&controller, &config).await?;
            monitor(&controller).await;
            controller.disconnect().await;
            Ok(())
        }
        Commands::Assistant { port } => {
            let config = config.with_port(port);
            assistant(&config, cli.mute).await
        }
        Commands::Actions => {
            for action in Action::ALL {
                println!(
                    "{:<12} {}",
                    action.as_str(),
                    action.wire_command().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}

fn controller(config: &AssistantConfig, mute: bool) -> Controller {
    let voice_config = config.voice_config();
    let mut voice = Voice::new(EventBus::new());
    if !mute {
        voice = voice.with_engine(voice_config.speaker());
    }
    print_transcript(voice.events());

    Controller::with_channel(
        relaylink::CommandChannel::new(voice).with_reply_window(config.reply_window()),
    )
    .with_monitor_config(config.monitor_config())
}

/// Mirrors the conversation on stdout.
fn print_transcript(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Some(event) = next_event(&mut rx).await {
            match event {
                AssistantEvent::Spoke { text } => println!("Assistant: {text}"),
                AssistantEvent::Heard { text } => println!("You: {text}"),
                _ => {}
            }
        }
    });
}

async fn connect(controller: &Controller, config: &AssistantConfig) -> Result<()> {
    let Some(serial) = config.serial_config() else {
        bail!("no serial port given (use --port or {})", relaylink::config::SERIAL_PORT_ENV);
    };
    controller
        .connect(&serial)
        .await
        .with_context(|| format!("connecting to {}", serial.port()))
}

async fn monitor(controller: &Controller) {
    let mut events = controller.events().subscribe();
    controller.set_automatic(true).await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                controller.set_automatic(false).await;
                break;
            }
            event = next_event(&mut events) => match event {
                Some(AssistantEvent::MonitorFinished { .. }) | None => break,
                Some(_) => {}
            },
        }
    }
}

async fn assistant(config: &AssistantConfig, mute: bool) -> Result<()> {
    let controller = Arc::new(controller(config, mute));
    if let Some(serial) = config.serial_config()
        && let Err(err) = controller.connect(&serial).await
    {
        tracing::warn!(error = %err, "Continuing without a serial link");
    }

    controller.greet().await;
    let assistant = VoiceAssistant::new(
        Arc::clone(&controller),
        LineListener::stdin(),
        &config.voice_config(),
    );

    tokio::select! {
        result = assistant.run() => {
            if let Err(err) = result {
                tracing::info!(error = %err, "Voice loop ended");
            }
        }
        _ = tokio::signal::ctrl_c() => {}
    }

    controller.shutdown().await;
    // Let the last spoken line reach stdout
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}

#[cfg(feature = "ble")]
async fn scan(config: &AssistantConfig, seconds: Option<u64>, pick: Option<usize>) -> Result<()> {
    use relaylink::discovery::{address_from_choice, spawn_discovery};

    let mut options = config.discovery_options();
    if let Some(seconds) = seconds {
        options = options.with_timeout(Duration::from_secs(seconds));
    }
    let devices = spawn_discovery(options, EventBus::new())
        .await
        .context("discovery task failed")?
        .context("scanning for Bluetooth devices")?;
    let choices: Vec<String> = devices.iter().map(ToString::to_string).collect();

    let Some(pick) = pick else {
        if choices.is_empty() {
            println!("No devices found");
        }
        for (number, choice) in choices.iter().enumerate() {
            println!("{:>3}. {choice}", number + 1);
        }
        return Ok(());
    };

    let Some(choice) = pick.checked_sub(1).and_then(|index| choices.get(index)) else {
        bail!("no device number {pick} ({} found)", choices.len());
    };
    let Some(address) = address_from_choice(choice) else {
        bail!("no address in {choice:?}");
    };
    println!("{address}");
    Ok(())
}

#[cfg(not(feature = "ble"))]
async fn scan(_config: &AssistantConfig, _seconds: Option<u64>, _pick: Option<usize>) -> Result<()> {
    bail!("built without Bluetooth support (enable the `ble` feature)")
}
