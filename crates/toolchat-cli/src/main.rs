use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;

use toolchat_core::chat::ChatContext;
use toolchat_core::config::{discover, ChatConfig, FileConfigProvider};
use toolchat_core::logging::{ConsoleLogger, FileLogger, LogLevel, Logger};

mod repl;

#[derive(Parser)]
#[command(author, version, about = "Chat with an LLM that can call MCP tools", long_about = None)]
struct Cli {
    /// Config file (defaults to .config/toolchat/config.yaml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Minimum log level (debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session (default)
    Chat,
    /// Answer a single query and exit
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Connect to the configured servers and list their tools
    Tools,
    /// Write a starter config to the workspace
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let logger = build_logger(&cli)?;

    match cli.command.as_ref().unwrap_or(&Command::Chat) {
        Command::Init { force } => init(*force),
        Command::Chat => {
            let context = open_context(&cli, logger).await?;
            let result = repl::run(&context).await;
            context.shutdown().await;
            result
        }
        Command::Ask { query } => {
            let context = open_context(&cli, logger).await?;
            let mut chat = context.orchestrator();
            let result = chat.process_query(&query.join(" ")).await;
            context.shutdown().await;
            println!("{}", result?);
            Ok(())
        }
        Command::Tools => {
            let context = open_context(&cli, logger).await?;
            list_tools(&context);
            context.shutdown().await;
            Ok(())
        }
    }
}

fn build_logger(cli: &Cli) -> Result<Arc<dyn Logger>> {
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        match LogLevel::parse(&cli.log_level) {
            Some(level) => level,
            None => bail!("unknown log level '{}'", cli.log_level),
        }
    };

    match &cli.log_file {
        Some(path) => {
            let logger = FileLogger::open(path, level)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Ok(Arc::new(logger))
        }
        None => Ok(Arc::new(ConsoleLogger::new().with_min_level(level))),
    }
}

async fn open_context(cli: &Cli, logger: Arc<dyn Logger>) -> Result<ChatContext> {
    let cwd = std::env::current_dir()?;
    let loaded = discover(cli.config.as_deref(), &cwd)?;
    match &loaded.source {
        Some(source) => logger.info(&format!(
            "[toolchat] Loaded {} config from {}",
            source.level().as_str(),
            source.path().display()
        )),
        None => logger.info("[toolchat] No config file found, using defaults"),
    }

    let context = ChatContext::from_config(loaded.config, logger).await?;
    for outcome in context.connect_report().outcomes.iter() {
        match &outcome.result {
            Ok(tools) => println!(
                "{} {} with tools: [{}]",
                style("Connected to").green(),
                outcome.provider,
                tools.join(", ")
            ),
            Err(e) => eprintln!("{} {}: {}", style("Failed to connect").red(), outcome.provider, e),
        }
    }
    Ok(context)
}

fn list_tools(context: &ChatContext) {
    let groups = context.multiplexer().tools_by_provider();
    if groups.is_empty() {
        println!("{}", style("No tools available").dim());
        return;
    }

    for (provider, tools) in groups {
        println!("{}", style(provider).bold());
        for tool in tools {
            println!("  {} {}", style(&tool.name).cyan(), style(&tool.description).dim());
        }
    }
}

fn init(force: bool) -> Result<()> {
    let provider = FileConfigProvider::workspace(std::env::current_dir()?);
    if provider.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            provider.path().display()
        );
    }
    provider.save(&ChatConfig::default())?;
    println!("Wrote {}", provider.path().display());
    Ok(())
}
