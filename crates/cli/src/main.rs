use aura_edit_core::{
    config::Config,
    image_processing::ImageProcessor,
    init,
    prompt::suggest,
    AuraEdit, EditResult, SourceFile, MAX_FILES,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photos to edit (jpeg, png, webp, heic; at most 10 are used)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Edit instruction; defaults to a suggestion for the number of photos
    #[arg(short, long)]
    prompt: Option<String>,

    /// Override the model defined in .env
    #[arg(short, long)]
    model: Option<String>,

    /// Directory to save the generated PNG into
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the result as JSON instead of saving it
    #[arg(long)]
    json: bool,

    /// Print the suggested instruction and exit
    #[arg(long)]
    show_suggestion: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.show_suggestion {
        println!("{}", suggest(args.files.len().min(MAX_FILES)));
        return Ok(());
    }

    // Load config and override model if specified via CLI
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(m) = args.model {
        config.model_name = m;
    }

    let files = load_selection(&args.files)?;

    let app = AuraEdit::with_config(config);
    let mut session = app.session();

    let kept = session.select_files(files);
    if kept < args.files.len() {
        eprintln!("Only the first {} photos are used", kept);
    }
    if let Some(prompt) = args.prompt {
        session.set_prompt(prompt);
    }

    // Send to API
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.blue} {msg}")?
    );
    spinner.set_message(format!("Generating with {}...", app.config().model_name));
    spinner.enable_steady_tick(Duration::from_millis(100));

    if let Err(e) = session.generate() {
        spinner.finish_and_clear();
        let message = session
            .error_message()
            .map(str::to_string)
            .unwrap_or_else(|| e.to_string());
        bail!("{message}");
    }
    let outcome = session.wait().await.cloned();
    session.teardown();

    spinner.finish_and_clear();

    let Some(outcome) = outcome else {
        bail!("Generation finished without a result");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome {
        EditResult::Success { image_data_uri } => {
            if !args.json {
                let path = ImageProcessor::save_download(&image_data_uri, &args.out_dir)
                    .context("Failed to save generated image")?;
                println!("Saved {}", path.display());
            }
        }
        EditResult::Failure { message, .. } => {
            if !args.json {
                eprintln!("{}", message);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Reads the photos that fit in one selection.
///
/// Paths past [`MAX_FILES`] are never read, so they cannot fail the run.
fn load_selection(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .take(MAX_FILES)
        .map(|path| read_photo(path))
        .collect()
}

fn read_photo(path: &Path) -> Result<SourceFile> {
    SourceFile::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
}
