//! `ocrflow check` and `ocrflow run`

use crate::console_speech::ConsoleSpeech;
use crate::project;
use crate::render::{summary, Renderer};
use colored::Colorize;
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use of_core::config::AppConfig;
use of_core::speech::SpeechQueue;
use of_core::state::WorkflowSession;
use of_protocol::ipc::Event;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 256;

pub struct RunOptions {
    pub speak: bool,
    pub prompt: Option<String>,
    pub json: bool,
}

/// Build a session over the real HTTP adapters and add `images` to it.
async fn session_with_images(
    config: &AppConfig,
    images: &[PathBuf],
    events_tx: mpsc::Sender<Event>,
) -> Result<WorkflowSession> {
    let engine = of_core::http_engine(config)?;
    let session = WorkflowSession::new(
        engine,
        config.global.workflow.clone(),
        config.global.ocr.clone(),
        events_tx,
    );

    let added = session.add_images(project::read_images(images)?).await?;
    if added.len() < images.len() {
        eprintln!(
            "{} only the first {} image(s) are used",
            "warning:".yellow().bold(),
            added.len()
        );
    }
    Ok(session)
}

fn print_problems(problems: &[String]) {
    for problem in problems {
        println!("  {} {}", "✗".red(), problem);
    }
}

pub async fn check(dir: &Path, images: &[PathBuf]) -> Result<()> {
    let config = project::load(dir).await?;
    let (tx, _rx) = mpsc::channel(EVENT_BUFFER);
    let session = session_with_images(&config, images, tx).await?;

    let problems = session.problems().await;
    if problems.is_empty() {
        println!("{} ready to run", "✓".green());
        return Ok(());
    }
    print_problems(&problems);
    bail!("{} problem(s) found", problems.len())
}

pub async fn run(dir: &Path, images: &[PathBuf], options: RunOptions) -> Result<()> {
    let mut config = project::load(dir).await?;
    if let Some(prompt) = options.prompt {
        config.global.workflow.direct_prompt = Some(prompt);
    }

    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let mut session = session_with_images(&config, images, tx.clone()).await?;

    let speech = if options.speak || config.global.speech.enabled {
        let mut settings = config.global.speech.clone();
        settings.enabled = true;
        let queue = SpeechQueue::with_events(Arc::new(ConsoleSpeech::new()), settings, tx);
        session = session.with_speech(queue.clone());
        Some(queue)
    } else {
        None
    };

    let problems = session.problems().await;
    if !problems.is_empty() {
        print_problems(&problems);
        bail!("cannot start the workflow");
    }

    let renderer = Renderer::new(
        config.agents.iter().map(|a| (a.id.clone(), a.name.clone())),
        session
            .snapshot()
            .await
            .images
            .into_iter()
            .map(|i| (i.id, i.name)),
    );

    let started = session.start().await?;
    tracing::debug!(run_id = %started.run_id, "run started");

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let done = matches!(event, Event::WorkflowFinished { .. } | Event::WorkflowCancelled { .. });
                if !options.json {
                    if let Some(line) = renderer.line(&event) {
                        println!("{line}");
                    }
                }
                if done {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("{}", "cancelling...".yellow());
                session.cancel().await;
            }
        }
    }

    let outcome = started.handle.await?;

    if let Some(queue) = &speech {
        if !outcome.cancelled {
            wait_for_speech(queue).await;
        }
        queue.stop();
    }

    let state = session.snapshot().await;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("\n{}", summary(&state, &renderer));
    }

    if outcome.success() {
        Ok(())
    } else {
        Err(eyre!(outcome.error().unwrap_or_else(|| "workflow failed".to_string())))
    }
}

/// Let queued narration finish. A Ctrl-C skips the rest.
async fn wait_for_speech(queue: &SpeechQueue) {
    loop {
        let status = queue.status();
        if !status.playing && status.queue_length == 0 {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            _ = tokio::signal::ctrl_c() => return,
        }
    }
}
