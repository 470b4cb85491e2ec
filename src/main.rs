use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pr_review_pipeline::{
    agents::ReviewPipeline,
    config::Config,
    github::GitHubClient,
    llm::GeneratorFactory,
    reports::ReportGenerator,
    search::{ExaSearch, SearchProvider},
    types::{PipelineReport, ReviewRequest},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pr-review-agent")]
#[command(about = "Multi-agent pull request review with parallel fan-out and synthesis")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a GitHub Pull Request
    Review {
        /// GitHub repository name (owner/repo)
        #[arg(short, long)]
        repo: String,

        /// Pull request number
        #[arg(short, long)]
        pr_number: u64,

        /// GitHub token for API access
        #[arg(short, long, env = "GITHUB_TOKEN")]
        token: String,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "markdown")]
        output: String,

        /// Output file path (defaults to stdout)
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,

        /// Post the report back to the PR as a comment
        #[arg(long)]
        post_comment: bool,
    },

    /// Review a request described in a local JSON file
    ReviewLocal {
        /// Path to a JSON file with {description, files: [{filename, additions, deletions, patch}]}
        #[arg(short, long)]
        input: PathBuf,

        /// Output format (json, markdown, text)
        #[arg(short, long, default_value = "markdown")]
        output: String,

        /// Output file path (defaults to stdout)
        #[arg(short = 'f', long)]
        output_file: Option<PathBuf>,
    },

    /// Health check of the configured providers
    HealthCheck,

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(short, long, default_value = "pr-review-agent.yml")]
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(&cli.log_level)?;

    info!("Starting PR review agent");

    let config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Review {
            repo,
            pr_number,
            token,
            output,
            output_file,
            post_comment,
        } => {
            review_pr(
                repo,
                pr_number,
                token,
                output,
                output_file,
                post_comment,
                config,
            )
            .await?;
        }

        Commands::ReviewLocal {
            input,
            output,
            output_file,
        } => {
            review_local(input, output, output_file, config).await?;
        }

        Commands::HealthCheck => {
            health_check(config).await?;
        }

        Commands::Init { config_file } => {
            init_config(config_file).await?;
        }
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Load configuration: environment overrides on top of defaults, then
/// an explicit config file on top of that.
async fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    let mut config = Config::load_from_env()?;

    if let Some(path) = config_path {
        if path.exists() {
            info!("Loading configuration from: {:?}", path);
            let file_config = Config::load_from_file(path)
                .await
                .with_context(|| format!("Failed to load config file: {:?}", path))?;
            config.merge_with(file_config);
        } else {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
        }
    }

    config.validate()?;
    Ok(config)
}

/// Wire the pipeline from configuration
fn build_pipeline(config: &Config) -> Result<ReviewPipeline> {
    let generator = GeneratorFactory::create(config.generation.clone())?;

    let search: Option<Arc<dyn SearchProvider>> = if config.search.enabled {
        Some(Arc::new(
            ExaSearch::new(config.search.clone()).context("Failed to create search client")?,
        ))
    } else {
        warn!("Search is disabled; the security agent will report no verified findings");
        None
    };

    Ok(ReviewPipeline::new(generator, search, config))
}

/// Review a GitHub Pull Request
async fn review_pr(
    repo: String,
    pr_number: u64,
    token: String,
    output_format: String,
    output_file: Option<PathBuf>,
    post_comment: bool,
    config: Config,
) -> Result<()> {
    info!("Reviewing PR #{} in repository {}", pr_number, repo);

    let github_client = GitHubClient::new(token)?;

    let user = github_client
        .check_authentication()
        .await
        .context("GitHub authentication failed")?;
    info!("Authenticated to GitHub as {}", user);

    let request = github_client
        .fetch_review_request(&repo, pr_number)
        .await
        .context("Failed to fetch PR data from GitHub")?;

    info!("Fetched PR data: {} changed files", request.files.len());

    let pipeline = build_pipeline(&config)?;
    let report = pipeline.run(request).await.context("Review failed")?;

    output_report(&report, &output_format, output_file.as_ref()).await?;

    if post_comment || config.github.auto_comment {
        github_client
            .post_report_comment(&repo, pr_number, &report.markdown)
            .await?;
    }

    info!("PR review completed successfully");
    Ok(())
}

/// Review a request described in a local JSON file, without GitHub
async fn review_local(
    input: PathBuf,
    output_format: String,
    output_file: Option<PathBuf>,
    config: Config,
) -> Result<()> {
    let content = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("Failed to read input file: {:?}", input))?;

    let request: ReviewRequest =
        serde_json::from_str(&content).context("Failed to parse review request JSON")?;

    info!("Reviewing local request: {} changed files", request.files.len());

    let pipeline = build_pipeline(&config)?;
    let report = pipeline.run(request).await.context("Review failed")?;

    output_report(&report, &output_format, output_file.as_ref()).await?;

    info!("Local review completed successfully");
    Ok(())
}

/// Check the configured providers
async fn health_check(config: Config) -> Result<()> {
    info!("Performing provider health check");

    let pipeline = build_pipeline(&config)?;
    let status = pipeline.health_check().await;

    if status.healthy {
        println!("System Status: Healthy");
    } else {
        println!("System Status: Unhealthy");
    }
    for component in &status.components {
        println!(
            "  {}: {}",
            component.name,
            if component.healthy { "ok" } else { "failing" }
        );
    }

    if !status.healthy {
        std::process::exit(1);
    }

    Ok(())
}

/// Write a starter configuration file
async fn init_config(config_file: PathBuf) -> Result<()> {
    info!("Initializing configuration file: {:?}", config_file);

    if config_file.exists() {
        warn!("Configuration file already exists: {:?}", config_file);
        print!("Overwrite existing file? (y/N): ");
        use std::io::{self, Write};
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().to_lowercase().starts_with('y') {
            info!("Configuration initialization cancelled");
            return Ok(());
        }
    }

    Config::default()
        .save_to_file(&config_file)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    println!("Configuration file created: {:?}", config_file);
    println!("Edit this file to customize the pipeline behavior.");

    Ok(())
}

/// Output the report in the specified format
async fn output_report(
    report: &PipelineReport,
    format: &str,
    output_file: Option<&PathBuf>,
) -> Result<()> {
    let format = if ReportGenerator::supports(format) {
        format
    } else {
        warn!("Unknown output format '{}', using markdown", format);
        "markdown"
    };
    let content = ReportGenerator::new().generate(report, format)?;

    if let Some(file_path) = output_file {
        tokio::fs::write(file_path, &content)
            .await
            .with_context(|| format!("Failed to write output to: {:?}", file_path))?;
        info!("Report written to: {:?}", file_path);
    } else {
        println!("{}", content);
    }

    Ok(())
}
