//! Kling CLI - Generate images and videos from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kling_client::{ClientConfig, Generation, ImageSource, MediaKind, PollPolicy, Session};
use kling_core::Quality;

/// Environment variable consulted before `--cookie`.
const COOKIE_ENV: &str = "KLING_COOKIE";

/// Kling CLI - Image and video generation
#[derive(Parser)]
#[command(name = "kling")]
#[command(about = "Generate images and videos with Kling", long_about = None)]
struct Cli {
    /// Browser cookie of a logged-in account (or set KLING_COOKIE)
    #[arg(short = 'U', long)]
    cookie: Option<String>,

    /// What to generate
    #[arg(short = 't', long = "type", value_enum, default_value = "image")]
    kind: OutputKind,

    /// Text prompt
    #[arg(short, long)]
    prompt: String,

    /// Local image to condition on
    #[arg(short = 'I', long)]
    image: Option<String>,

    /// Hosted image URL to condition on (ignored if --image is given)
    #[arg(long)]
    image_url: Option<String>,

    /// Directory for downloaded media
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Use the high quality video model
    #[arg(long)]
    high_quality: bool,

    /// Extend the generated video once more
    #[arg(long)]
    auto_extend: bool,

    /// Give up waiting for a task after this many seconds
    #[arg(long)]
    max_wait_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    Image,
    Video,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kling=info".parse()?))
        .init();

    let cookie = resolve_cookie(std::env::var(COOKIE_ENV).ok(), cli.cookie.clone())
        .ok_or("no cookie: set KLING_COOKIE or pass --cookie")?;

    let session = Session::connect(&cookie, client_config(&cli)).await?;
    info!(region = %session.region(), "Session established");

    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    let image = ImageSource::pick(cli.image.as_deref(), cli.image_url.as_deref());

    match cli.kind {
        OutputKind::Image => {
            let generation = session.generate_images(&cli.prompt, image.as_ref()).await?;
            save(&session, &generation, &cli.output_dir, MediaKind::Image).await?;
        }
        OutputKind::Video => {
            let quality = if cli.high_quality {
                Quality::High
            } else {
                Quality::Standard
            };
            let generation = session
                .generate_video(&cli.prompt, image.as_ref(), quality)
                .await?;
            save(&session, &generation, &cli.output_dir, MediaKind::Video).await?;

            if cli.auto_extend && !generation.is_empty() {
                let extended = session.extend_video(&generation.task.id).await?;
                save(&session, &extended, &cli.output_dir, MediaKind::Video).await?;
            }
        }
    }

    let points = session.account_points().await?;
    println!("Remaining points: {points:.2}");

    Ok(())
}

/// The environment wins over the flag. Blank values count as unset.
fn resolve_cookie(from_env: Option<String>, from_flag: Option<String>) -> Option<String> {
    from_env
        .into_iter()
        .chain(from_flag)
        .find(|cookie| !cookie.trim().is_empty())
}

fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(secs) = cli.max_wait_secs {
        let max_wait = Duration::from_secs(secs);
        config.image_poll = PollPolicy {
            max_wait,
            ..config.image_poll
        };
        config.video_poll = PollPolicy {
            max_wait,
            ..config.video_poll
        };
    }
    config
}

async fn save(
    session: &Session,
    generation: &Generation,
    dir: &Path,
    kind: MediaKind,
) -> Result<(), Box<dyn std::error::Error>> {
    if generation.is_empty() {
        println!("Task {}: no media produced", generation.task.id);
        return Ok(());
    }

    let paths = session.download(&generation.resources, dir, kind).await?;
    println!("Task {}:", generation.task.id);
    for (url, path) in generation.resources.iter().zip(&paths) {
        println!("  {}  <-  {}", path.display(), url);
    }
    Ok(())
}
