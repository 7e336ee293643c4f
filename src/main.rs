mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CliConfig, Config, Report};
use settlement_core::{
    records::{self, AcceptedRow, CandidateRow, LedgerRow, RecordError},
    Ledger, SelectionPolicy, SettlementEngine, Transaction,
};
use std::fs::File;
use std::io::{self, Read, Write};
use tracing::{info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = CliConfig::parse();

    run(&config)?;

    info!("Settlement completed successfully");

    Ok(())
}

fn run<C: Config>(config: &C) -> Result<()> {
    let ledger = File::open(config.ledger_path()).context("Failed to open ledger file")?;
    let candidates =
        File::open(config.candidates_path()).context("Failed to open candidates file")?;

    let stdout = io::stdout();
    let handle = stdout.lock();

    settle_files(
        ledger,
        candidates,
        config.policy(),
        config.report(),
        handle,
    )
}

fn settle_files(
    ledger: impl Read,
    candidates: impl Read,
    policy: SelectionPolicy,
    report: Report,
    output: impl Write,
) -> Result<()> {
    let ledger = read_ledger(ledger)?;
    let candidates = read_candidates(candidates)?;
    let submitted = candidates.len();

    let mut engine = SettlementEngine::new(&ledger).with_policy(policy);
    let accepted = engine.apply_epoch(candidates);

    info!(
        "Accepted {} of {submitted} candidates, {} unspent outputs remain",
        accepted.len(),
        engine.ledger().len()
    );

    match report {
        Report::Ledger => write_ledger(engine.ledger(), output),
        Report::Accepted => write_accepted(&accepted, output),
    }
}

fn read_ledger(input: impl Read) -> Result<Ledger> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let rows = reader
        .deserialize::<LedgerRow>()
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to parse ledger")?;

    records::load_ledger(rows).context("Invalid ledger")
}

/// Reads candidate transactions, skipping every candidate that has a row
/// or field that cannot be parsed. A row whose label cannot be read is an
/// error, since it cannot be attributed to a candidate.
fn read_candidates(input: impl Read) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("Failed to read candidate header")?
        .clone();
    let label_column = headers
        .iter()
        .position(|header| header == "candidate")
        .context("Candidate file has no candidate column")?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read candidate row")?;
        let label = record
            .get(label_column)
            .and_then(|label| label.parse::<u32>().ok())
            .with_context(|| format!("Candidate row without a readable label: {record:?}"))?;

        rows.push(
            record
                .deserialize::<CandidateRow>(Some(&headers))
                .map_err(|e| (label, RecordError::MalformedRow(e.to_string()))),
        );
    }

    Ok(records::assemble_candidates(rows)
        .into_iter()
        .filter_map(|candidate| match candidate.transaction {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!("Skipping candidate {}: {e}", candidate.label);
                None
            }
        })
        .collect())
}

fn write_ledger(ledger: &Ledger, output: impl Write) -> Result<()> {
    let mut rows = ledger
        .iter()
        .map(|(id, record)| LedgerRow::new(id, record))
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| (&a.tx, a.index).cmp(&(&b.tx, b.index)));

    let mut writer = csv::WriterBuilder::new().from_writer(output);
    for row in &rows {
        writer
            .serialize(row)
            .context("Failed to serialize ledger row")?;
    }

    writer.flush().context("Failed to flush output")?;

    Ok(())
}

fn write_accepted(accepted: &[Transaction], output: impl Write) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(output);
    for tx in accepted {
        writer
            .serialize(AcceptedRow::new(tx))
            .context("Failed to serialize accepted transaction")?;
    }

    writer.flush().context("Failed to flush output")?;

    Ok(())
}
