use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use jarvis::assistant::Language;
use jarvis::audio::record_clip;
use jarvis::config::AssistantConfig;
use jarvis::kernel::DialogueController;
use jarvis::services::{LlmClient, PlannerApiClient};
use jarvis::TurnOutput;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_RECORD_SECS: u64 = 5;

const HELP: &str = "Type a request, or:
  :confirm        confirm the pending action
  :cancel         drop the pending action
  :record [secs]  speak instead of typing
  :state          show the dialogue state
  :quit           exit";

fn print_output(output: &TurnOutput) {
    for reply in &output.replies {
        println!("{}\n", reply);
    }
    if let Some(page) = output.navigate {
        println!("-> {}\n", page.path());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jarvis=info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Config + Services
    let config = AssistantConfig::from_env().context("loading configuration")?;
    tracing::info!(
        "Planner API at {}, model {}, locale {}",
        config.planner_api_url,
        config.llm_model,
        config.locale
    );
    let language = Language::for_locale(&config.locale).unwrap_or_default();

    let llm = Arc::new(LlmClient::new(&config));
    let planner = Arc::new(PlannerApiClient::new(&config));
    let mut controller = DialogueController::new(llm.clone(), planner.clone()).with_language(language);

    // 3. Console loop
    println!("{}\n", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Handlers resolve against whatever the planner holds right now.
        if let Err(e) = controller.refresh_snapshot(planner.as_ref()).await {
            tracing::warn!("Using stale planner data: {}", e);
        }

        let mut words = line.split_whitespace();
        let output = match words.next() {
            Some(":quit") => break,
            Some(":confirm") => controller.confirm().await,
            Some(":cancel") => controller.cancel().await,
            Some(":state") => {
                println!("{}\n", serde_json::to_string_pretty(controller.state())?);
                continue;
            }
            Some(":help") => {
                println!("{}\n", HELP);
                continue;
            }
            Some(":record") => {
                let secs = words
                    .next()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_RECORD_SECS);
                println!("Listening for {}s...", secs);
                match record_clip(Duration::from_secs(secs)).await {
                    Ok(clip) => controller.handle_audio(llm.as_ref(), &clip).await,
                    Err(e) => {
                        tracing::error!("Recording failed: {}", e);
                        controller.transport_failed(e.to_string()).await
                    }
                }
            }
            _ => controller.handle_transcript(line).await,
        };
        print_output(&output);
    }

    let summary = controller.finish();
    tracing::info!(
        "Session ended: {} commits, {} cancels",
        summary.commit_stats.succeeded,
        summary.dialogue_stats.cancels
    );
    Ok(())
}
