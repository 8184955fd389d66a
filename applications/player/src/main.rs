/// Cadence - terminal player for a cloud drive music folder
use anyhow::Context;
use cadence_audio::SymphoniaDecoder;
use cadence_audio_desktop::CpalDevice;
use cadence_core::LibraryStore;
use cadence_drive::DriveClient;
use cadence_player::{session, PlayerConfig, Uploader};
use cadence_playback::Controller;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "cadence=info,cadence_player=info,cadence_playback=info,cadence_drive=info,warn";

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Play the audio files in a cloud drive folder", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./cadence.toml if present)
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive playback session (default)
    Session,
    /// Print the tracks in the library folder
    List,
    /// Upload local audio files to the library folder
    Upload {
        /// Files to upload; non-audio files are skipped
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the session output on stdout stays readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let client = Arc::new(DriveClient::new(
        config.drive.clone(),
        config.auth.provider()?,
    )?);

    match cli.command.unwrap_or(Commands::Session) {
        Commands::Session => run_session(config, client).await?,
        Commands::List => list(&config, &client).await?,
        Commands::Upload { files } => upload(&config, client, &files).await?,
    }

    Ok(())
}

async fn run_session(config: PlayerConfig, client: Arc<DriveClient>) -> anyhow::Result<()> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let device = CpalDevice::open(events_tx).context("Failed to open audio output")?;
    let decoder = Arc::new(SymphoniaDecoder::with_target_rate(device.sample_rate()));

    let uploader = Uploader::new(Arc::clone(&client), config.playback.library_folder.clone());

    let (controller, handle) = Controller::new(
        config.playback,
        client as Arc<dyn LibraryStore>,
        decoder,
        device,
        events_rx,
    );
    let controller_task = tokio::spawn(controller.run());

    tracing::info!("Starting Cadence session");
    handle.refresh_library()?;

    let result = session::run(handle.clone(), uploader).await;

    // The controller may already be gone if the session ended on its account
    let _ = handle.shutdown();
    drop(handle);
    controller_task.await?;

    result?;
    Ok(())
}

async fn list(config: &PlayerConfig, client: &DriveClient) -> anyhow::Result<()> {
    let folder = client
        .find_or_create_folder(&config.playback.library_folder)
        .await?;
    let tracks = client.list_audio_files(&folder).await?;

    if tracks.is_empty() {
        println!("No audio files in '{}'", config.playback.library_folder);
        return Ok(());
    }

    println!("Tracks in '{}':", config.playback.library_folder);
    for (i, track) in tracks.iter().enumerate() {
        println!(
            "  {:>3}. {}  ({} KiB, {})",
            i + 1,
            track.display_name,
            track.byte_size / 1024,
            track.id
        );
    }
    Ok(())
}

async fn upload(
    config: &PlayerConfig,
    client: Arc<DriveClient>,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    let uploader = Uploader::new(client, config.playback.library_folder.clone());
    let summary = uploader.upload_all(files).await?;
    println!("{}", summary);

    if !summary.failed.is_empty() {
        anyhow::bail!("{} upload(s) failed", summary.failed.len());
    }
    Ok(())
}
