//! `knowledgelib` CLI entry-point.
//!
//! Available sub-commands:
//! - `query`            — search knowledge units.
//! - `get-unit`         — fetch one unit as markdown or JSON.
//! - `list-domains`     — show the catalog summary.
//! - `describe`         — print the node and credential descriptions.
//! - `test-credentials` — check that the configured API URL/key work.
//!
//! Records are printed to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::{default_registry, CredentialStore, ExecutorConfig, InputItem, NodeDefinition, NodeExecutor};
use nodes::knowledgelib::{
    credential_description, node_description, test_credentials, KnowledgelibCredentials,
    CREDENTIAL_TYPE, NODE_NAME,
};
use nodes::ReqwestClient;

#[derive(Parser)]
#[command(
    name = "knowledgelib",
    about = "Query cited knowledge units from a knowledgelib.io catalog",
    version
)]
struct Cli {
    #[command(flatten)]
    connection: Connection,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Connection {
    /// Base URL of the catalog service.
    #[arg(long, global = true, env = "KNOWLEDGELIB_API_URL")]
    api_url: Option<String>,

    /// Optional API key, sent as a bearer token.
    #[arg(long, global = true, env = "KNOWLEDGELIB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// HTTP request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,
}

#[derive(Args)]
struct Batch {
    /// JSON file holding an array of input items; defaults to one empty item.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Emit `{error}` records for failing items instead of aborting.
    #[arg(long)]
    continue_on_fail: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search across all knowledge units by relevance.
    Query {
        /// Search text; `={{ $json.field }}` reads it from each input item.
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: u64,
        #[arg(long, default_value = "")]
        domain: String,
        /// Fetch the full markdown of every hit.
        #[arg(long)]
        full_content: bool,
        #[command(flatten)]
        batch: Batch,
    },
    /// Retrieve a specific knowledge unit by ID.
    GetUnit {
        unit_id: String,
        /// `md` or `json`.
        #[arg(long, default_value = "md")]
        format: String,
        #[command(flatten)]
        batch: Batch,
    },
    /// List all knowledge domains and unit counts.
    ListDomains {
        #[command(flatten)]
        batch: Batch,
    },
    /// Print the node and credential descriptions.
    Describe,
    /// Fetch the catalog with the configured credentials.
    TestCredentials,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn credential_store(connection: &Connection) -> CredentialStore {
    let mut store = CredentialStore::new();
    if connection.api_url.is_some() || connection.api_key.is_some() {
        store.insert(
            CREDENTIAL_TYPE,
            json!({
                "apiUrl": connection.api_url.clone().unwrap_or_default(),
                "apiKey": connection.api_key.clone().unwrap_or_default(),
            }),
        );
    }
    store
}

fn load_items(path: Option<&PathBuf>) -> anyhow::Result<Vec<InputItem>> {
    let Some(path) = path else {
        return Ok(vec![InputItem::default()]);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read input file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    match value {
        Value::Array(items) => Ok(items.into_iter().map(InputItem::from).collect()),
        _ => bail!("{} must contain a JSON array of items", path.display()),
    }
}

async fn run_node(connection: &Connection, parameters: Value, batch: &Batch) -> anyhow::Result<()> {
    let config = ExecutorConfig {
        request_timeout: std::time::Duration::from_secs(connection.timeout),
        ..ExecutorConfig::default()
    };
    let executor = NodeExecutor::with_config(
        default_registry(),
        Arc::new(credential_store(connection)),
        &config,
    )?;

    let items = load_items(batch.input.as_ref())?;
    let definition = NodeDefinition::new(NODE_NAME, NODE_NAME, parameters)
        .continue_on_fail(batch.continue_on_fail);

    let result = executor.run(&definition, &items).await?;
    println!("{}", serde_json::to_string_pretty(&result.items)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let connection = &cli.connection;

    match cli.command {
        Command::Query {
            query,
            limit,
            domain,
            full_content,
            batch,
        } => {
            let params = json!({
                "operation": "query",
                "query": query,
                "limit": limit,
                "domain": domain,
                "fetchFullContent": full_content,
            });
            run_node(connection, params, &batch).await
        }
        Command::GetUnit {
            unit_id,
            format,
            batch,
        } => {
            let params = json!({ "operation": "getUnit", "unitId": unit_id, "format": format });
            run_node(connection, params, &batch).await
        }
        Command::ListDomains { batch } => {
            run_node(connection, json!({ "operation": "listDomains" }), &batch).await
        }
        Command::Describe => {
            let out = json!({
                "node": node_description(),
                "credentials": [credential_description()],
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Command::TestCredentials => {
            let credentials = KnowledgelibCredentials::resolve(&credential_store(connection)).await;
            let http = ReqwestClient::with_settings(
                std::time::Duration::from_secs(connection.timeout),
                &ExecutorConfig::default().user_agent,
            )?;
            info!("Testing credentials against {}", credentials.api_url);
            match test_credentials(&http, &credentials).await {
                Ok(()) => {
                    println!("✅ Credentials accepted by {}", credentials.api_url);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("❌ Credential test failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
