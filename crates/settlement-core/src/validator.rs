use crate::crypto::SignatureVerifier;
use crate::ledger::{Ledger, UtxoId};
use crate::transaction::Transaction;
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

/// Why a candidate transaction was refused.
///
/// Purely diagnostic: every variant means the same thing to the batch
/// processor, which drops the candidate without touching the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("input {input} spends {utxo}, which is not unspent")]
    MissingOutput { input: usize, utxo: UtxoId },
    #[error("input {input} is not authorized by the owner of the output it spends")]
    Unauthorized { input: usize },
    #[error("input {input} claims {utxo} a second time")]
    DuplicateInput { input: usize, utxo: UtxoId },
    #[error("output {output} has negative value {value}")]
    NegativeOutput { output: usize, value: Decimal },
    #[error("outputs total {outputs} but inputs only provide {inputs}")]
    InsufficientInput { inputs: Decimal, outputs: Decimal },
    #[error("value total overflows")]
    ValueOverflow,
}

/// Checks `tx` against `ledger` as it stands, without modifying anything.
///
/// A transaction is valid when
/// 1. every output it claims is unspent in `ledger`,
/// 2. every input carries a signature by the owner of the claimed output
///    over the signing payload for that input's position,
/// 3. no output is claimed twice,
/// 4. no output value is negative,
/// 5. inputs are worth at least as much as outputs.
///
/// The checks run in that order and the first failure is returned.
pub fn validate<V>(tx: &Transaction, ledger: &Ledger, verifier: &V) -> Result<(), Rejection>
where
    V: SignatureVerifier + ?Sized,
{
    // (1) fully, before any lookup below relies on it.
    let mut records = Vec::with_capacity(tx.inputs().len());
    for (input, claim) in tx.inputs().iter().enumerate() {
        let record = ledger.get(&claim.utxo).ok_or(Rejection::MissingOutput {
            input,
            utxo: claim.utxo,
        })?;
        records.push(record);
    }

    // (2)
    for (input, (claim, record)) in tx.inputs().iter().zip(&records).enumerate() {
        let authorized = match (&claim.signature, tx.signing_payload(input)) {
            (Some(signature), Some(payload)) => {
                verifier.verify(&record.owner, &payload, signature)
            }
            _ => false,
        };
        if !authorized {
            return Err(Rejection::Unauthorized { input });
        }
    }

    // (3)
    let mut claimed = HashSet::with_capacity(tx.inputs().len());
    for (input, claim) in tx.inputs().iter().enumerate() {
        if !claimed.insert(claim.utxo) {
            return Err(Rejection::DuplicateInput {
                input,
                utxo: claim.utxo,
            });
        }
    }

    // (4)
    if let Some((output, declared)) = tx
        .outputs()
        .iter()
        .enumerate()
        .find(|(_, declared)| declared.value < Decimal::ZERO)
    {
        return Err(Rejection::NegativeOutput {
            output,
            value: declared.value,
        });
    }

    // (5)
    let inputs = records
        .iter()
        .try_fold(Decimal::ZERO, |sum, record| sum.checked_add(record.value))
        .ok_or(Rejection::ValueOverflow)?;
    let outputs = tx
        .outputs()
        .iter()
        .try_fold(Decimal::ZERO, |sum, declared| sum.checked_add(declared.value))
        .ok_or(Rejection::ValueOverflow)?;

    if inputs < outputs {
        return Err(Rejection::InsufficientInput { inputs, outputs });
    }

    Ok(())
}

pub fn is_valid<V>(tx: &Transaction, ledger: &Ledger, verifier: &V) -> bool
where
    V: SignatureVerifier + ?Sized,
{
    validate(tx, ledger, verifier).is_ok()
}
