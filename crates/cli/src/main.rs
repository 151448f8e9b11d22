mod config;
mod error;

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gateway::catalog::introspect;
use gateway::{Gateway, Message, ProviderKind, TurnRequest};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "toolgate.toml";

#[derive(Parser)]
#[command(name = "toolgate")]
#[command(about = "Tool-calling gateway between chat models and tool servers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Tool server URL, overriding server.url
    #[arg(short, long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question, letting the model call tools
    Ask {
        /// The question; read from stdin when omitted
        question: Option<String>,
        /// Provider, overriding provider.kind
        #[arg(short, long)]
        provider: Option<ProviderArg>,
        /// Model, overriding provider.model
        #[arg(short, long)]
        model: Option<String>,
        /// System prompt for this turn
        #[arg(long)]
        system: Option<String>,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the tools a turn would see
    Tools {
        /// Only tools whose name or description mentions this
        #[arg(long)]
        category: Option<String>,
    },
    /// Show tool server information
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Openai,
    Anthropic,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Openai => Self::OpenAi,
            ProviderArg::Anthropic => Self::Anthropic,
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        match &e {
            Error::Gateway(inner) => eprintln!("Error [{}]: {inner}", inner.code()),
            other => eprintln!("Error: {other}"),
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gateway=info,mcp=info,toolgate=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config)?;
    tracing::debug!(path = %cli.config.display(), "loaded config");

    if cli.server.is_some() {
        config.server.url = cli.server;
    }

    match cli.command {
        Commands::Ask {
            question,
            provider,
            model,
            system,
            json,
        } => {
            if let Some(kind) = provider {
                config.provider.kind = kind.into();
            }
            if model.is_some() {
                config.provider.model = model;
            }
            cmd_ask(config, question, system, json).await
        }
        Commands::Tools { category } => cmd_tools(config, category.as_deref()).await,
        Commands::Info => cmd_info(config).await,
    }
}

async fn cmd_ask(
    config: Config,
    question: Option<String>,
    system: Option<String>,
    as_json: bool,
) -> Result<()> {
    let question = match question {
        Some(question) => question,
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            input
        }
    };
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::EmptyQuestion);
    }

    let provider = config.provider_config(|var| std::env::var(var).ok())?;

    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(question));

    let request = TurnRequest {
        messages,
        server_url: config.server.url,
        provider,
        declared_tools: Vec::new(),
    };

    let outcome = Gateway::new(config.gateway).run(request).await?;

    if as_json {
        let body = json!({
            "answer": outcome.message.text(),
            "rounds": outcome.rounds,
            "tool_results": outcome.tool_results,
            "usage": outcome.usage,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        for result in &outcome.tool_results {
            let status = if result.is_ok() { "ok" } else { "failed" };
            eprintln!("[tool] {} ({status})", result.tool_name);
        }
        println!("{}", outcome.message.text());
    }

    Ok(())
}

async fn cmd_tools(config: Config, category: Option<&str>) -> Result<()> {
    let gateway = Gateway::new(config.gateway);
    let server = Gateway::server_url(config.server.url.as_deref())?;
    let discovery = gateway.discover(&server).await?;
    let catalog = gateway.catalog(Vec::new(), discovery.tools);

    let listing = introspect(&catalog, category);
    println!(
        "{}",
        listing["formatted_response"].as_str().unwrap_or_default()
    );
    Ok(())
}

async fn cmd_info(config: Config) -> Result<()> {
    let gateway = Gateway::new(config.gateway);
    let server = Gateway::server_url(config.server.url.as_deref())?;
    let discovery = gateway.discover(&server).await?;

    println!("Server:   {server}");
    println!("Protocol: {}", discovery.info.protocol);
    println!("Version:  {}", discovery.info.version);
    println!("Tools:    {}", discovery.tools.len());
    for tool in &discovery.tools {
        println!("  - {}", tool.name);
    }
    Ok(())
}
