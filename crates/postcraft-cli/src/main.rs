mod config;
mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use postcraft_ai::{GeminiClient, GeminiConfig, Orchestrator};
use postcraft_core::keywords::extract;
use postcraft_core::{Background, WriterProfile};
use postcraft_engine::{GenerationService, RepairContext, RepairPass, validate};
use postcraft_news::NewsClient;
use postcraft_store::JsonFileStore;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::PostcraftConfig;

/// Provider name for identities asserted on the command line.
const CLI_PROVIDER: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "postcraft", version, about = "Political blog draft generator")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a draft from a request document.
    Generate {
        /// Request JSON, wrapped (`{data, auth}`) or bare.
        #[arg(long)]
        request: PathBuf,
        /// Data directory of the JSON profile store.
        #[arg(long, default_value = "data")]
        store: PathBuf,
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Act as this writer instead of using the request's credential.
        #[arg(long)]
        uid: Option<String>,
        /// Print the raw response document.
        #[arg(long)]
        json: bool,
    },
    /// Run the repair pass over a draft body and print the result.
    Repair {
        /// Writer profile JSON.
        #[arg(long)]
        profile: PathBuf,
        /// HTML or plain-text body.
        #[arg(long)]
        content: PathBuf,
    },
    /// Check a draft body against the acceptance gate.
    Validate {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        content: PathBuf,
        #[arg(long, default_value_t = 1700)]
        target: u32,
    },
    /// List checklist keywords found in background text.
    Keywords {
        /// Background items.
        #[arg(required = true)]
        background: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    tracing::info!("postcraft v{}", env!("CARGO_PKG_VERSION"));

    let config = PostcraftConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Generate {
            request,
            store,
            api_key,
            uid,
            json,
        } => generate(config, &request, &store, api_key, uid, json).await,
        Commands::Repair { profile, content } => {
            let profile: WriterProfile = read_json(&profile)?;
            let content = read_text(&content)?;
            println!("{}", RepairPass::standard().run(&content, &RepairContext::new(&profile)));
            Ok(())
        }
        Commands::Validate {
            profile,
            content,
            target,
        } => {
            let profile: WriterProfile = read_json(&profile)?;
            let content = read_text(&content)?;
            display::print_validation(&validate(&content, &profile, target));
            Ok(())
        }
        Commands::Keywords { background } => {
            display::print_checklist(&extract(&Background::List(background)));
            Ok(())
        }
    }
}

async fn generate(
    config: PostcraftConfig,
    request: &Path,
    store: &Path,
    api_key: String,
    uid: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut body: Value = read_json(request)?;
    let mut auth = config.auth.clone();
    if let Some(uid) = uid {
        let Some(obj) = body.as_object_mut() else {
            bail!("request {} is not a JSON object", request.display());
        };
        obj.insert(
            "auth".to_string(),
            json!({ "kind": "delegated", "provider": CLI_PROVIDER, "uid": uid }),
        );
        auth = auth.trust_provider(CLI_PROVIDER);
    }

    let gemini = GeminiClient::new(GeminiConfig {
        api_key,
        ..config.gemini.clone()
    });
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(gemini), config.orchestrator.clone()));
    let store = JsonFileStore::open(store)
        .await
        .with_context(|| format!("opening store {}", store.display()))?;

    let mut service = GenerationService::new(
        orchestrator,
        Arc::new(store),
        Arc::new(auth),
        config.engine.clone(),
    );
    if let Some(news) = config.news_client() {
        service = service.with_news(Arc::new(NewsClient::new(news.clone())));
    }

    let response = service.handle(body).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        display::print_response(&response);
    }
    if response["success"].as_bool() != Some(true) {
        bail!("generation failed: {}", response["error"]["code"]);
    }
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    serde_json::from_str(&read_text(path)?).with_context(|| format!("parsing {}", path.display()))
}
