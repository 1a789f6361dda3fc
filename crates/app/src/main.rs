use anyhow::{bail, Context, Result};
use billfold_core::HubType;
use billfold_import::{
    CommittedImport, FileKind, ImportSession, Profile, Stage, Vocabulary,
};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Imports a bank statement export and prints what the dashboard would ingest.
#[derive(Parser)]
#[command(name = "billfold", version, about = "Statement import pipeline for Billfold")]
struct Cli {
    /// CSV or XLSX statement export.
    file: PathBuf,

    /// Hub the batch belongs to: personal or business.
    #[arg(long, default_value = "personal")]
    hub: HubType,

    /// Account tag applied to every imported row.
    #[arg(long)]
    account: Option<String>,

    /// Confirm every suggested category without prompting.
    #[arg(long)]
    accept_all: bool,

    /// Vocabulary TOML to use instead of the built-in one.
    #[arg(long)]
    vocab: Option<PathBuf>,

    /// Write the committed batch to a JSON file.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let kind = FileKind::from_path(&cli.file)?;
    let data = tokio::time::timeout(READ_TIMEOUT, tokio::fs::read(&cli.file))
        .await
        .with_context(|| format!("timed out reading {}", cli.file.display()))?
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let mut profile = Profile {
        hub: cli.hub,
        account_tags: Vec::new(),
    };
    if let Some(account) = &cli.account {
        profile.account_tags = vec![account.clone()];
    }

    let mut session = match &cli.vocab {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let vocab = Arc::new(Vocabulary::from_toml(&text)?);
            let table = billfold_import::tabular::parse_bytes(&data, kind)?;
            ImportSession::with_vocabulary(table, profile, vocab)
        }
        None => ImportSession::from_bytes(&data, kind, profile)?,
    };

    // ── drive the wizard ──────────────────────────────────────────────────────
    session.map_columns()?;
    if session.stage() == Stage::Uploaded {
        let missing: Vec<String> = session
            .mapping()
            .missing()
            .iter()
            .map(|f| f.to_string())
            .collect();
        bail!(
            "could not detect required columns ({}) among headers: {}",
            missing.join(", "),
            session.columns().headers().join(", ")
        );
    }

    session.normalize(Local::now().date_naive())?;
    session.categorize()?;
    session.detect_recurring()?;

    if let Some(account) = &cli.account {
        session.set_account_tag(account)?;
    }
    if cli.accept_all {
        session.accept_all()?;
    }

    session.review()?;
    let committed = session.commit()?;
    print_report(&committed);

    if let Some(out) = &cli.out {
        let json =
            serde_json::to_string_pretty(&*committed).context("failed to serialize import")?;
        tokio::fs::write(out, json)
            .await
            .with_context(|| format!("failed to write {}", out.display()))?;
        tracing::info!("wrote committed import to {}", out.display());
    }

    Ok(())
}

fn print_report(import: &CommittedImport) {
    let s = &import.summary;
    println!(
        "Imported {} transactions ({} duplicates dropped)",
        s.transaction_count, s.duplicate_count
    );
    println!(
        "  categorized {} / uncategorized {}",
        s.categorized_count, s.uncategorized_count
    );
    println!("  income {}   expenses {}", s.income_total, s.expense_total);

    if !s.top_categories.is_empty() {
        println!("Top spending:");
        for t in &s.top_categories {
            println!("  {:<24} {}", t.category, t.outflow);
        }
    }

    if !import.bill_candidates.is_empty() {
        println!("Recurring bill candidates:");
        for g in &import.bill_candidates {
            println!(
                "  {:<24} {:>10}  {}  due day {}  confidence {}",
                g.display_name,
                g.average_amount.to_string(),
                g.frequency,
                g.estimated_due_day,
                g.confidence
            );
        }
    }
}
