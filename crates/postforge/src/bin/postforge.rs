//! postforge: generate long-form posts for configured sites, directly or from
//! a scheduled topic queue.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use postforge::config::{default_config_path, load_config, Config, SiteConfig};
use postforge::error::{ConfigError, PostforgeError};
use postforge::pipeline::{
    GenerationResult, Generator, PipelineConfig, ProgressEvent, ProgressReporter, RunOverrides,
    TracingProgress,
};
use postforge::queue::{run_item, QueueStatus, QueueStore};
use postforge::{telemetry, Capabilities, DestinationKind};

#[derive(Parser)]
#[command(name = "postforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate SEO-ready blog posts and publish them to files or Ghost")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "POSTFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one post
    Generate {
        #[arg(short, long)]
        site: String,

        #[arg(short, long)]
        topic: String,

        /// Primary SEO keyword (defaults to the topic)
        #[arg(short, long)]
        keyword: Option<String>,

        /// Target word count
        #[arg(long)]
        words: Option<u32>,

        /// Number of images, 0 to skip illustration
        #[arg(long)]
        images: Option<u32>,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Print the resolved settings and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage a site's topic queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Args)]
struct SiteArg {
    #[arg(short, long)]
    site: String,
}

#[derive(Subcommand)]
enum QueueAction {
    /// Generate the next due topic
    Run {
        #[command(flatten)]
        target: SiteArg,

        #[arg(long)]
        dry_run: bool,
    },
    /// List every queued topic
    List {
        #[command(flatten)]
        target: SiteArg,
    },
    /// Append a topic
    Add {
        #[command(flatten)]
        target: SiteArg,

        #[arg(short, long)]
        topic: String,

        /// Scheduled date, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        #[arg(short, long)]
        keyword: Option<String>,

        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Show counts and the next pending topic
    Status {
        #[command(flatten)]
        target: SiteArg,
    },
    /// Remove completed topics
    Clear {
        #[command(flatten)]
        target: SiteArg,
    },
}

impl QueueAction {
    fn site(&self) -> &str {
        match self {
            QueueAction::Run { target, .. }
            | QueueAction::List { target }
            | QueueAction::Add { target, .. }
            | QueueAction::Status { target }
            | QueueAction::Clear { target } => &target.site,
        }
    }
}

/// Prints `[{percent}%] {message}` for each event.
struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        println!("[{}%] {}", event.percent(), event.message());
    }
}

/// JSON log runs keep stdout clean and report progress as log records.
fn progress_reporter(json_logs: bool) -> Box<dyn ProgressReporter> {
    if json_logs {
        Box::new(TracingProgress)
    } else {
        Box::new(ConsoleProgress)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, PostforgeError> {
    let config = read_config(cli.config)?;
    let json_logs = cli.json_logs;

    match cli.command {
        Commands::Generate {
            site,
            topic,
            keyword,
            words,
            images,
            tags,
            dry_run,
        } => {
            let overrides = RunOverrides {
                keyword,
                word_count: words,
                image_count: images,
                tags,
            };
            generate(&config, &site, &topic, &overrides, dry_run, json_logs).await
        }
        Commands::Queue { action } => {
            let site = action.site().to_string();
            queue(&config, &site, action, json_logs).await
        }
    }
}

fn read_config(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let path = path.or_else(default_config_path).ok_or_else(|| ConfigError::Validation {
        message: "no config path given and no platform config directory".to_string(),
    })?;
    load_config(path)
}

fn print_plan(site: &SiteConfig, topic: &str, overrides: &RunOverrides) {
    let request = overrides.resolve(topic, site);
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("Site:       {} ({})", site.name, site.domain);
    println!("Topic:      {}", request.topic);
    println!(
        "Keyword:    {}",
        request.primary_keyword.as_deref().unwrap_or("(auto)")
    );
    println!("Words:      {}", request.target_word_count);
    println!("Images:     {}", request.target_image_count);
    println!("Tags:       {}", request.tags.join(", "));
    println!("Output:     {}", site.destination.kind());
    println!("{}", rule);
}

fn print_result(result: &GenerationResult) {
    let rule = "=".repeat(60);
    println!("{}", rule);
    match &result.summary {
        Some(summary) if result.success => {
            println!("SUCCESS!");
            println!("Title:      {}", summary.title);
            println!("Slug:       {}", summary.slug);
            println!("Words:      {}", summary.word_count);
            println!("Reading:    {}", summary.reading_time);
            println!("Images:     {}", summary.images_generated);
            println!("Duration:   {:.1}s", summary.duration.as_secs_f64());
            match summary.output.output_type {
                DestinationKind::Ghost => {
                    println!("Ghost URL:  {}", summary.output.url.as_deref().unwrap_or("-"));
                    println!(
                        "Post ID:    {}",
                        summary.output.post_id.as_deref().unwrap_or("-")
                    );
                }
                _ => println!("File:       {}", summary.output.location().unwrap_or_default()),
            }
        }
        _ => {
            println!("FAILED!");
            println!("Topic:      {}", result.topic);
            println!("Error:      {}", result.error.as_deref().unwrap_or("unknown error"));
        }
    }
    println!("{}", rule);
}

async fn generate(
    config: &Config,
    site_key: &str,
    topic: &str,
    overrides: &RunOverrides,
    dry_run: bool,
    json_logs: bool,
) -> Result<ExitCode, PostforgeError> {
    let pipeline = PipelineConfig::from_config(config, site_key)?;
    print_plan(&pipeline.site, topic, overrides);

    if dry_run {
        println!("DRY RUN - no content generated");
        return Ok(ExitCode::SUCCESS);
    }

    let generator = Generator::new(pipeline, Capabilities::from_config(&config.capabilities)?);
    let result = generator
        .run(topic, overrides, progress_reporter(json_logs).as_ref())
        .await;
    print_result(&result);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn queue(
    config: &Config,
    site_key: &str,
    action: QueueAction,
    json_logs: bool,
) -> Result<ExitCode, PostforgeError> {
    let store = QueueStore::new(&config.queue_directory);

    match action {
        QueueAction::Run { dry_run, .. } => {
            let queue = store.load(site_key)?;
            let Some((index, item)) = queue.next_pending() else {
                println!("No pending topics in queue");
                return Ok(ExitCode::SUCCESS);
            };
            println!("Processing queue item: {}", item.id);

            let pipeline = PipelineConfig::from_config(config, site_key)?;
            print_plan(&pipeline.site, &item.topic, &item.overrides());
            if dry_run {
                println!("DRY RUN - no content generated");
                return Ok(ExitCode::SUCCESS);
            }

            let generator = Capabilities::from_config(&config.capabilities)
                .map(|capabilities| Generator::new(pipeline, capabilities));
            let (result, outcome) = run_item(
                &store,
                site_key,
                index,
                item,
                generator,
                progress_reporter(json_logs).as_ref(),
            )
            .await?;
            print_result(&result);
            println!("Queue updated: item {} marked {}", index, outcome.label());

            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        QueueAction::List { .. } => {
            let queue = store.load(site_key)?;
            if queue.schedule.is_empty() {
                println!("No topics in queue for {}", site_key);
                return Ok(ExitCode::SUCCESS);
            }
            for item in &queue.schedule {
                let marker = match item.status {
                    QueueStatus::Pending => "[ ]",
                    QueueStatus::Completed => "[x]",
                    QueueStatus::Failed => "[!]",
                };
                println!("{} {} {}", marker, item.id, item.topic);
                if !item.keyword.is_empty() {
                    println!("    Keyword: {}", item.keyword);
                }
                if !item.tags.is_empty() {
                    println!("    Tags: {}", item.tags.join(", "));
                }
            }
            let summary = queue.status();
            println!(
                "Total: {} | Pending: {} | Completed: {} | Failed: {}",
                summary.total, summary.pending, summary.completed, summary.failed
            );
            Ok(ExitCode::SUCCESS)
        }
        QueueAction::Add {
            topic,
            date,
            keyword,
            tags,
            ..
        } => {
            let mut queue = store.load(site_key)?;
            let item = queue
                .add(&topic, date.as_deref(), keyword.as_deref(), tags.unwrap_or_default())
                .clone();
            let path = store.save(site_key, &mut queue)?;
            println!("Added topic: {}", item.topic);
            println!("  ID:        {}", item.id);
            println!(
                "  Scheduled: {}",
                item.scheduled_date.as_deref().unwrap_or(&item.id)
            );
            println!("Queue saved: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        QueueAction::Status { .. } => {
            let summary = store.load(site_key)?.status();
            println!("Total topics:    {}", summary.total);
            println!("Pending:         {}", summary.pending);
            println!("Completed:       {}", summary.completed);
            println!("Failed:          {}", summary.failed);
            if let Some(next) = summary.next {
                let date = next.scheduled_date.as_deref().unwrap_or(&next.id);
                println!("Next up: {} ({})", next.topic, date);
            }
            Ok(ExitCode::SUCCESS)
        }
        QueueAction::Clear { .. } => {
            let mut queue = store.load(site_key)?;
            let removed = queue.clear_completed();
            store.save(site_key, &mut queue)?;
            println!("Removed {} completed items", removed);
            Ok(ExitCode::SUCCESS)
        }
    }
}

