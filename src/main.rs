use anyhow::Context;
use input_replay_lib::{init_tracing, EffectLog, Recorder, RecorderConfig, RecorderSettings};
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "usage: input-replay [--settings FILE] [ACTIONS_FILE]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Input Replay v{}", env!("CARGO_PKG_VERSION"));

    let mut settings_path: Option<PathBuf> = None;
    let mut actions_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                settings_path = Some(args.next().context(USAGE)?.into());
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => actions_path = Some(arg.into()),
        }
    }

    let mut settings = match &settings_path {
        Some(path) => RecorderSettings::from_json_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => RecorderSettings {
            track_all_keys: true,
            ..Default::default()
        },
    };
    if let Some(path) = actions_path {
        settings.recording_path = path;
        settings.playback_path = None;
    }
    let config: RecorderConfig = settings.into_config()?;

    // Effects are logged rather than injected into the OS
    let actuator = Arc::new(EffectLog::new());
    let mut recorder = Recorder::new(config, actuator.clone());

    recorder
        .start_playback()
        .await
        .with_context(|| format!("failed to load {}", recorder.config().playback_path().display()))?;

    if let Some(canceller) = recorder.playback_canceller() {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling playback");
                canceller.cancel();
            }
        });
    }
    let summary = recorder.wait_playback().await?;

    if let Some(summary) = summary {
        tracing::info!(
            "Replayed {} of {} actions ({} effects) in {:?}",
            summary.completed,
            summary.total,
            actuator.len(),
            summary.elapsed
        );
    }
    Ok(())
}
