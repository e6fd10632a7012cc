///
/// This module implements the CLI for publish-table: command parsing, the async `run`
/// entrypoint, and all user-visible output (progress lines, summaries, notices).
///
/// All pipeline logic (aggregation, schema, orchestration, probing) lives in
/// `publish-table-core`. This module only wires collaborators together:
/// settings file → Notion client → vault → records → publish → summary.
///
/// ## Commands
/// - `publish`: probe credentials (non-fatal), read the vault, publish with progress; Ctrl-C cancels.
/// - `check`: probe credentials; a failure is the exit status.
/// - `configure`: update credentials in the settings file and re-probe when they changed.
///
/// ## Programmatic use
/// Call [`run`] with a constructed [`Cli`]; integration tests do exactly that.
use crate::load_config::{load_config, load_config_file, save_config};
use crate::notion::NotionClient;
use anyhow::Result;
use clap::{Parser, Subcommand};
use publish_table_core::aggregate::aggregate;
use publish_table_core::cancel::CancellationToken;
use publish_table_core::contract::{NoteSource, Record};
use publish_table_core::probe::verify_access;
use publish_table_core::publish::{publish, PublishOutcome};
use publish_table_core::vault::FsVault;
use std::path::{Path, PathBuf};

/// CLI for publish-table: publish vault link notes as a Notion table.
#[derive(Parser)]
#[clap(
    name = "publish-table",
    version,
    about = "Publish link notes from a markdown vault as a fresh Notion database"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish every matching note as a row of a newly created Notion database
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Check that the configured API key can access the target page
    Check {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Update the Notion credentials stored in the config file
    Configure {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// New Notion integration token
        #[clap(long)]
        api_key: Option<String>,
        /// New target page id
        #[clap(long)]
        page_id: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish { config } => run_publish(&config).await,
        Commands::Check { config } => run_check(&config).await,
        Commands::Configure {
            config,
            api_key,
            page_id,
        } => run_configure(&config, api_key, page_id).await,
    }
}

async fn run_publish(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    tracing::info!(command = "publish", "Starting publish");

    let client = NotionClient::from_settings(&config.notion);
    if let Err(e) = verify_access(&client, &config.notion.page_id).await {
        tracing::warn!(command = "publish", error = %e, "Credential check failed, publishing anyway");
        eprintln!("[WARN] {e}");
    }

    let vault = FsVault::new(&config.vault.root);
    let notes = vault
        .collect_notes()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read vault: {e}"))?;
    let records = aggregate(&notes, &config.vault.filter());
    println!("Publishing table to Notion ({} entries)...", records.len());

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl-C received, cancelling publish");
                cancel.cancel();
            }
        })
    };

    let total = records.len();
    let mut done = 0usize;
    let mut on_progress = |record: &Record| {
        done += 1;
        println!("[{done}/{total}] {}", record.name);
    };

    let result = publish(
        &client,
        &config.notion.page_id,
        &records,
        Some(&mut on_progress),
        &cancel,
    )
    .await;
    ctrl_c.abort();

    match result {
        Ok(outcome) => {
            tracing::info!(command = "publish", ?outcome, "Publish complete");
            print!("{}", render_outcome(&outcome));
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            tracing::info!(command = "publish", "Publish cancelled by user");
            println!("Publish cancelled.");
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "publish", error = %e, "Publish failed");
            eprintln!("[ERROR] Failed to publish table to Notion");
            Err(anyhow::Error::new(e))
        }
    }
}

async fn run_check(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let client = NotionClient::from_settings(&config.notion);
    verify_access(&client, &config.notion.page_id).await?;
    println!(
        "Credentials OK: page {} is accessible.",
        config.notion.page_id
    );
    Ok(())
}

async fn run_configure(
    config_path: &Path,
    api_key: Option<String>,
    page_id: Option<String>,
) -> Result<()> {
    let mut config = load_config_file(config_path)?;
    let previous = config.notion.clone();

    if let Some(key) = api_key {
        config.notion.api_key = key;
    }
    if let Some(id) = page_id {
        config.notion.page_id = id;
    }
    save_config(config_path, &config)?;
    println!("Settings saved to {}.", config_path.display());

    if previous.credentials_changed(&config.notion) {
        tracing::info!(command = "configure", "Credentials changed, re-checking access");
        let client = NotionClient::from_settings(&config.notion);
        if let Err(e) = verify_access(&client, &config.notion.page_id).await {
            tracing::warn!(command = "configure", error = %e, "Credential check failed");
            eprintln!("[WARN] {e}");
        }
    }
    Ok(())
}

/// Human-readable summary of a finished run.
pub fn render_outcome(outcome: &PublishOutcome) -> String {
    let mut out = String::from("Table published to Notion\n");
    out.push_str(&format!("Database URL: {}\n", outcome.database_url));
    out.push_str(&format!("Entries Added: {}\n", outcome.entries_added));
    out.push_str(&format!("Created: {}\n", outcome.created_time));
    out.push_str(&format!("Last Edited: {}\n", outcome.last_edited_time));
    if !outcome.failed_entries.is_empty() {
        out.push_str(&format!(
            "Failed Entries ({}):\n",
            outcome.failed_entries.len()
        ));
        for failed in &outcome.failed_entries {
            out.push_str(&format!("  - {}: {}\n", failed.record.name, failed.reason));
        }
    }
    out
}
