//! Application entry point: terminal host for the voice assistant.
//!
//! Each stdin line stands in for a final transcript from the recogniser
//! (see [`voice_assistant::transcript::lines`] for the line grammar).
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (first CLI argument, else the platform default
//!    `settings.toml`; defaults on first run) and validate it.
//! 3. Build the completion provider selected by `llm.provider` (see
//!    [`build_provider`]) and the [`Session`].
//! 4. Spawn the [`AssistantRunner`] and a printer for its events.
//! 5. Start the [`TranscriptAdapter`] and the stdin line reader.
//! 6. Handle host commands until `/quit` or end of input, then shut down
//!    without cancelling a call already in flight.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use voice_assistant::{
    config::AppConfig,
    llm::build_provider,
    pipeline::{AssistantCommand, AssistantEvent, AssistantRunner},
    session::Session,
    transcript::{read_lines, HostCommand, TranscriptAdapter, TranscriptEvent},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice assistant starting up");

    // 2. Configuration
    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::load_from(Path::new(&path))
            .with_context(|| format!("failed to load config from {}", path.to_string_lossy()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    config.validate().context("invalid configuration")?;

    // 3. Provider + session
    let provider = build_provider(&config.llm);
    log::info!(
        "completion provider: {} at {} (model {})",
        config.llm.provider.label(),
        config.llm.base_url(),
        config.llm.model()
    );
    if config.llm.resolved_api_key().is_none() {
        log::warn!(
            "no API key configured; set llm.api_key or {}",
            config.llm.provider.api_key_env()
        );
    }
    let session = Arc::new(Session::from_config(provider, &config));

    // 4. Runner + reply printer
    let (command_tx, command_rx) = mpsc::unbounded_channel::<AssistantCommand>();
    let (event_tx, mut event_rx) = mpsc::channel::<AssistantEvent>(32);

    let runner = tokio::spawn(AssistantRunner::new(Arc::clone(&session), event_tx).run(command_rx));

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                AssistantEvent::Thinking => println!("..."),
                AssistantEvent::Reply(reply) => println!("assistant> {}", reply.text),
                AssistantEvent::Cleared => println!("(conversation cleared)"),
            }
        }
    });

    // 5. Transcript adapter + stdin source
    let (transcript_tx, transcript_rx) = mpsc::channel::<TranscriptEvent>(16);
    let (host_tx, mut host_rx) = mpsc::channel::<HostCommand>(8);

    let submit_tx = command_tx.clone();
    let adapter = TranscriptAdapter::start(transcript_rx, move |text| {
        AssistantCommand::Submit(text).dispatch(&submit_tx);
    });

    let reader = tokio::spawn(read_lines(
        BufReader::new(tokio::io::stdin()),
        transcript_tx,
        host_tx,
    ));

    println!(
        "Speak by typing a line. Commands: /reset, /history, /quit. (history limit {})",
        session.history_limit()
    );

    // 6. Host command loop
    while let Some(command) = host_rx.recv().await {
        match command {
            HostCommand::Reset => {
                AssistantCommand::Reset.dispatch(&command_tx);
            }
            HostCommand::History => {
                println!("  [{}] system: {}", session.state().label(), session.system_prompt());
                for message in session.history() {
                    println!("  {}: {}", message.role(), message.content());
                }
            }
            HostCommand::Quit => break,
        }
    }

    // Shutdown: no new transcripts, but let queued and in-flight turns finish.
    adapter.stop();
    match reader.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("stdin reader failed: {e}"),
        Err(e) => log::warn!("stdin reader task panicked: {e}"),
    }
    adapter.join().await;
    drop(command_tx);

    runner.await.context("runner task panicked")?;
    printer.await.context("printer task panicked")?;

    log::info!("voice assistant shut down");
    Ok(())
}
