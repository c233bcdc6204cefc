use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use document_analyzer::utils::media;
use document_analyzer::{
    links, provider_from_config, section, AnalysisOrchestrator, AnalysisState, AnalyzerConfig,
    InputResolver, ResultPresenter, TextPresenter,
};
use std::path::PathBuf;
use tracing::{debug, error, info, Level};

#[derive(Parser)]
#[command(name = "document-analyzer", version, about = "Analyze a document from a file or a URL")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one analysis on an uploaded file or a remote document
    Analyze {
        /// Local document to upload
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,

        /// Declared media type of the file (defaults from its extension)
        #[arg(long, requires = "file")]
        media_type: Option<String>,

        /// Remote document URL
        #[arg(long)]
        url: Option<String>,

        /// Analysis service endpoint (overrides ANALYZER_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Simulated delay of the offline provider
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the embeddable form of a video link
    Embed { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = AnalyzerConfig::from_env()?;

    match cli.command {
        Command::Analyze {
            file,
            media_type,
            url,
            endpoint,
            delay_ms,
            json,
        } => {
            let config = config
                .with_endpoint(endpoint)
                .with_baseline_delay(delay_ms.unwrap_or(0));
            run_analyze(config, file, media_type, url, json).await
        }
        Command::Embed { url } => run_embed(&url),
    }
}

async fn run_analyze(
    config: AnalyzerConfig,
    file: Option<PathBuf>,
    media_type: Option<String>,
    url: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut resolver = InputResolver::from_config(&config);
    debug!("Accepting uploads declared as {}", resolver.accepted_media_type());

    if let Some(path) = file {
        let blob = media::load_upload(&path, media_type.as_deref())
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        resolver.set_upload(blob)?;
    } else if let Some(url) = url {
        resolver.set_remote_url(&url);
    }

    if let Some(preview) = resolver.preview_handle() {
        info!("Preview available at {}", preview);
    }

    let provider = provider_from_config(&config)?;
    let orchestrator = AnalysisOrchestrator::new(provider);
    info!("Using analysis provider: {}", orchestrator.provider_name());

    let reference = resolver.current_reference();
    let state = orchestrator.trigger(&reference).await?;

    if json {
        if let Some(result) = state.result() {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
    } else {
        let presenter = TextPresenter::new().with_numbered_section(section::RECOMMENDED_ACTIONS);
        print!("{}", presenter.render(&reference, &state));
    }

    match state {
        AnalysisState::Failed { reason } => {
            error!("Analysis failed: {}", reason);
            Err(anyhow!("analysis failed: {}", reason))
        }
        _ => Ok(()),
    }
}

fn run_embed(url: &str) -> anyhow::Result<()> {
    match links::canonicalize(url) {
        Some(reference) => {
            println!("id:    {}", reference.video_id);
            println!("embed: {}", reference.embed_url);
            Ok(())
        }
        None => Err(anyhow!("not a recognized video link: {}", url)),
    }
}
