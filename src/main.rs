use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use facsimile::platform::{DirectorySaveTarget, LogNotifier};
use facsimile::{Action, Book, FolderNaming, Studio, StudioConfig};

/// Render a book's excerpts into image plates and save them as a zip archive
#[derive(Parser, Debug)]
#[command(name = "facsimile", version, about)]
struct Cli {
    /// Book document (JSON)
    book: PathBuf,

    /// Directory the archive is written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Plate text color, e.g. "#222222"
    #[arg(long)]
    text_color: Option<String>,

    /// Comma-separated background gradient stops, bottom to top
    #[arg(long)]
    background: Option<String>,

    /// Capture scale factor
    #[arg(long, default_value_t = 5)]
    scale: u32,

    /// Page position to activate before compiling (1-based, clamped)
    #[arg(long)]
    page: Option<i64>,

    /// Put this character between book id and page number in folder names
    #[arg(long)]
    separator: Option<char>,

    /// Maximum plates rasterized at once (defaults to the CPU count)
    #[arg(long)]
    jobs: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.book)
        .with_context(|| format!("reading {}", cli.book.display()))?;
    let book = Book::from_json(&text).with_context(|| format!("loading {}", cli.book.display()))?;

    let mut config = StudioConfig {
        capture_scale: cli.scale,
        ..Default::default()
    };
    if let Some(sep) = cli.separator {
        config.folder_naming = FolderNaming::Separated(sep);
    }
    if let Some(jobs) = cli.jobs {
        config.capture_concurrency = jobs;
    }

    let mut studio = Studio::builder(config)
        .save_target(DirectorySaveTarget::new(cli.out.clone()))
        .notifier(LogNotifier)
        .build()?;

    studio.dispatch(Action::Load(book)).await?;
    if let Some(color) = cli.text_color {
        studio.dispatch(Action::SetTextColor(color)).await?;
    }
    if let Some(stops) = cli.background {
        studio.dispatch(Action::SetBackground(stops)).await?;
    }
    if let Some(page) = cli.page {
        studio.dispatch(Action::SelectPage(page)).await?;
        log::info!("active page {}", studio.state().navigator());
    }

    studio.dispatch(Action::Compile).await?;
    if let Some(report) = studio.state().last_capture() {
        for (plate, reason) in &report.failed {
            log::error!("plate {} was not captured: {}", plate, reason);
        }
        if report.issued > 0 && report.completed.is_empty() {
            bail!("no plate could be captured");
        }
    }

    studio.dispatch(Action::Download).await?;
    match studio.state().last_export() {
        Some(saved) => println!("{}", saved.location),
        None => bail!("export finished without an archive"),
    }
    Ok(())
}
