use clap::{Parser, ValueEnum};
use settlement_core::SelectionPolicy;
use std::path::{Path, PathBuf};

/// What the binary writes to stdout once the epoch is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Report {
    /// The resulting unspent outputs
    Ledger,
    /// The accepted transactions, in acceptance order
    Accepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    Greedy,
    MultiPass,
}

impl From<Policy> for SelectionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Greedy => Self::Greedy,
            Policy::MultiPass => Self::MultiPass,
        }
    }
}

/// Trait for reading configuration parameters
pub trait Config {
    fn ledger_path(&self) -> &Path;
    fn candidates_path(&self) -> &Path;
    fn policy(&self) -> SelectionPolicy;
    fn report(&self) -> Report;
}

/// CLI configuration
#[derive(Parser, Debug)]
#[command(
    name = "utxo-settlement",
    about = "Settles a batch of candidate transactions against an unspent-output ledger",
    version
)]
pub struct CliConfig {
    /// Path to the CSV file holding the starting unspent outputs
    #[arg(value_name = "LEDGER_FILE")]
    ledger_file: PathBuf,

    /// Path to the CSV file holding the candidate transactions
    #[arg(value_name = "CANDIDATES_FILE")]
    candidates_file: PathBuf,

    /// How to choose among candidates that depend on each other
    #[arg(long, value_enum, default_value_t = Policy::Greedy)]
    policy: Policy,

    /// What to print once the epoch is settled
    #[arg(long, value_enum, default_value_t = Report::Ledger)]
    report: Report,
}

impl Config for CliConfig {
    fn ledger_path(&self) -> &Path {
        &self.ledger_file
    }

    fn candidates_path(&self) -> &Path {
        &self.candidates_file
    }

    fn policy(&self) -> SelectionPolicy {
        self.policy.into()
    }

    fn report(&self) -> Report {
        self.report
    }
}
