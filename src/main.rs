//! ulogin - development driver for server-rendered login screens.
//!
//! Loads a captured screen context from a JSON file, shows what the SDK
//! sees, and can replay an action against a real tenant or as a dry run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ulogin_client::config::Settings;
use ulogin_client::context::ContextStore;
use ulogin_client::form::Fields;
use ulogin_client::http::HttpClient;
use ulogin_client::sink::{HttpFormSink, RecordingSink, SubmissionSink};
use ulogin_client::ScreenClient;

#[derive(Parser, Debug)]
#[command(name = "ulogin")]
#[command(about = "Universal Login screen context driver", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the typed view of a captured context
    Inspect {
        /// Path to the captured context JSON
        context: PathBuf,
    },
    /// Replay an action against the context's screen
    Submit {
        /// Path to the captured context JSON
        context: PathBuf,

        /// Server-side action name (e.g. "default", "resend-code")
        #[arg(short, long)]
        action: String,

        /// Extra form fields as key=value
        #[arg(short, long)]
        field: Vec<String>,

        /// Base URL of the rendered page; required unless --dry-run
        #[arg(short, long)]
        url: Option<String>,

        /// Print the prepared form instead of posting it
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .init();

    match args.command {
        Command::Inspect { context } => inspect(&context),
        Command::Submit {
            context,
            action,
            field,
            url,
            dry_run,
        } => submit(&settings, &context, &action, &field, url.as_deref(), dry_run).await,
    }
}

fn load_store(path: &PathBuf) -> Result<ContextStore> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read context file {}", path.display()))?;
    let store = ContextStore::new();
    store
        .install_json(&json)
        .context("context file did not parse as a screen context")?;
    Ok(store)
}

fn open(store: &ContextStore, sink: Arc<dyn SubmissionSink>) -> Result<ScreenClient> {
    // Empty identifier: the CLI drives whatever screen the capture holds.
    ScreenClient::open(store, sink, "").map_err(Into::into)
}

fn inspect(path: &PathBuf) -> Result<()> {
    let store = load_store(path)?;
    let client = open(&store, Arc::new(RecordingSink::new()))?;

    println!("screen:      {}", client.screen_name());
    if let Some(prompt) = client.prompt.name() {
        println!("prompt:      {prompt}");
    }
    if let Some(state) = client.transaction.state() {
        println!("state:       {state}");
    }
    if let Some(locale) = client.transaction.locale() {
        println!("locale:      {locale}");
    }
    if let Some(name) = client.client.name() {
        println!("application: {name}");
    }
    if let Some(org) = client.organization.name() {
        println!("organization: {org}");
    }

    for error in client.errors() {
        println!(
            "error:       [{}] {} (field: {})",
            error.code,
            error.message,
            error.field.as_deref().unwrap_or("-")
        );
    }

    if let Some(data) = client.screen.data() {
        println!("data:");
        for (key, value) in data {
            println!("  {key} = {value}");
        }
    }

    Ok(())
}

async fn submit(
    settings: &Settings,
    path: &PathBuf,
    action: &str,
    raw_fields: &[String],
    url: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let store = load_store(path)?;

    let mut fields = Fields::new();
    for pair in raw_fields {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("field `{pair}` is not key=value"))?;
        fields.set(key, value);
    }
    fields.set("action", action);

    if dry_run {
        let recorder = Arc::new(RecordingSink::new());
        let client = open(&store, recorder.clone())?;
        client.submit_raw(fields).await?;

        if let Some(form) = recorder.last() {
            let route = if form.route.is_empty() {
                "<current page>"
            } else {
                form.route.as_str()
            };
            println!("route: {route}");
            for (key, value) in &form.fields {
                println!("  {key} = {value}");
            }
        }
        return Ok(());
    }

    let url = url.context("--url is required unless --dry-run is set")?;
    let http = HttpClient::with_settings(&settings.http)?;
    let sink = Arc::new(HttpFormSink::new(http, url));
    let client = open(&store, sink)?;

    client.submit_raw(fields).await?;
    tracing::info!("submitted `{action}` to {url}");
    Ok(())
}
