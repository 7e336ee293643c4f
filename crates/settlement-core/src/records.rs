//! Flat record types for reading ledgers and candidate batches from CSV
//! and writing settlement results back out.
//!
//! A ledger file has one row per unspent output:
//!
//! ```text
//! tx,index,owner,value
//! ```
//!
//! A candidate file spreads each transaction over several rows that share a
//! `candidate` label, one row per input or output:
//!
//! ```text
//! candidate,kind,tx,index,signature,owner,value
//! 1,input,<hash>,0,<signature>,,
//! 1,output,,,,<owner>,10.0
//! ```

use crate::crypto::{Hash, ParseError, PublicKey};
use crate::ledger::{Ledger, OutputRecord, UtxoId};
use crate::transaction::{Transaction, TransactionBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing {field}")]
    MissingField { field: &'static str },
    #[error("invalid {field}: {source}")]
    InvalidField {
        field: &'static str,
        source: ParseError,
    },
    #[error("negative value {value} for {utxo}")]
    NegativeValue { utxo: UtxoId, value: Decimal },
    #[error("output {utxo} listed twice")]
    DuplicateOutput { utxo: UtxoId },
    #[error("malformed row: {0}")]
    MalformedRow(String),
}

fn parse<T>(field: &'static str, value: &str) -> Result<T, RecordError>
where
    T: std::str::FromStr<Err = ParseError>,
{
    value
        .parse()
        .map_err(|source| RecordError::InvalidField { field, source })
}

fn require<T>(field: &'static str, value: Option<T>) -> Result<T, RecordError> {
    value.ok_or(RecordError::MissingField { field })
}

/// One unspent output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerRow {
    pub tx: String,
    pub index: u32,
    pub owner: String,
    pub value: Decimal,
}

impl LedgerRow {
    pub fn new(id: &UtxoId, record: &OutputRecord) -> Self {
        Self {
            tx: id.tx.to_string(),
            index: id.index,
            owner: record.owner.to_string(),
            value: record.value,
        }
    }

    pub fn parse(&self) -> Result<(UtxoId, OutputRecord), RecordError> {
        let utxo = UtxoId::new(parse("tx", &self.tx)?, self.index);
        if self.value < Decimal::ZERO {
            return Err(RecordError::NegativeValue {
                utxo,
                value: self.value,
            });
        }
        let record = OutputRecord::new(self.value, parse("owner", &self.owner)?);
        Ok((utxo, record))
    }
}

/// Builds a ledger from its rows. Any bad row fails the whole ledger.
pub fn load_ledger(rows: impl IntoIterator<Item = LedgerRow>) -> Result<Ledger, RecordError> {
    let mut ledger = Ledger::new();
    for row in rows {
        let (utxo, record) = row.parse()?;
        if ledger.insert(utxo, record).is_some() {
            return Err(RecordError::DuplicateOutput { utxo });
        }
    }
    Ok(ledger)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Input,
    Output,
}

/// One input or output of a candidate transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateRow {
    pub candidate: u32,
    pub kind: RowKind,
    #[serde(default)]
    pub tx: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub value: Option<Decimal>,
}

/// A candidate transaction assembled from its rows, or why it could not be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub label: u32,
    pub transaction: Result<Transaction, RecordError>,
}

/// Groups rows by candidate label, in order of each label's first
/// appearance, and builds one transaction per group. Inputs and outputs
/// keep their row order.
///
/// A row that could not be read arrives as `Err((label, error))` and fails
/// its whole group: building from the remaining rows would settle a
/// transaction the submitter never signed as a whole.
pub fn assemble_candidates(
    rows: impl IntoIterator<Item = Result<CandidateRow, (u32, RecordError)>>,
) -> Vec<Candidate> {
    let mut groups: Vec<(u32, Result<Vec<CandidateRow>, RecordError>)> = Vec::new();
    let mut positions: HashMap<u32, usize> = HashMap::new();

    for row in rows {
        let label = match &row {
            Ok(row) => row.candidate,
            Err((label, _)) => *label,
        };
        let position = *positions.entry(label).or_insert_with(|| {
            groups.push((label, Ok(Vec::new())));
            groups.len() - 1
        });

        let group = &mut groups[position].1;
        match row {
            Ok(row) => {
                if let Ok(rows) = group {
                    rows.push(row);
                }
            }
            // Only the first failure is kept.
            Err((_, error)) => {
                if group.is_ok() {
                    *group = Err(error);
                }
            }
        }
    }

    groups
        .into_iter()
        .map(|(label, rows)| Candidate {
            label,
            transaction: rows.and_then(|rows| build_candidate(&rows)),
        })
        .collect()
}

fn build_candidate(rows: &[CandidateRow]) -> Result<Transaction, RecordError> {
    let mut builder = TransactionBuilder::new();

    for row in rows {
        match row.kind {
            RowKind::Input => {
                let tx: Hash = parse("tx", require("tx", row.tx.as_deref())?)?;
                let utxo = UtxoId::new(tx, require("index", row.index)?);
                match row.signature.as_deref() {
                    Some(signature) => {
                        builder.add_signed_input(utxo, parse("signature", signature)?);
                    }
                    None => {
                        builder.add_input(utxo);
                    }
                }
            }
            RowKind::Output => {
                let owner: PublicKey = parse("owner", require("owner", row.owner.as_deref())?)?;
                let value = require("value", row.value)?;
                builder.add_output(value, owner);
            }
        }
    }

    Ok(builder.build())
}

/// One accepted transaction in a settlement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedRow {
    pub tx: String,
    pub inputs: usize,
    pub outputs: usize,
}

impl AcceptedRow {
    pub fn new(tx: &Transaction) -> Self {
        Self {
            tx: tx.id().to_string(),
            inputs: tx.inputs().len(),
            outputs: tx.outputs().len(),
        }
    }
}
