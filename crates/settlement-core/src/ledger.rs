use crate::crypto::{Hash, PublicKey};
use crate::transaction::Transaction;
use rust_decimal::Decimal;
use std::collections::hash_map::{self, HashMap};
use std::fmt::{Display, Formatter};

/// Points at one output: the producing transaction and the output's position in it.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct UtxoId {
    pub tx: Hash,
    pub index: u32,
}

impl UtxoId {
    pub const fn new(tx: Hash, index: u32) -> Self {
        Self { tx, index }
    }
}

impl Display for UtxoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tx, self.index)
    }
}

/// A spendable amount and the key that may spend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRecord {
    pub value: Decimal,
    pub owner: PublicKey,
}

impl OutputRecord {
    pub const fn new(value: Decimal, owner: PublicKey) -> Self {
        Self { value, owner }
    }
}

/// The set of outputs that have been produced but not yet consumed.
///
/// Cloning produces an independent copy; nothing is shared between clones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    utxos: HashMap<UtxoId, OutputRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &UtxoId) -> bool {
        self.utxos.contains_key(id)
    }

    pub fn get(&self, id: &UtxoId) -> Option<&OutputRecord> {
        self.utxos.get(id)
    }

    /// Returns the record previously stored under `id`, if any.
    pub fn insert(&mut self, id: UtxoId, record: OutputRecord) -> Option<OutputRecord> {
        self.utxos.insert(id, record)
    }

    pub fn remove(&mut self, id: &UtxoId) -> Option<OutputRecord> {
        self.utxos.remove(id)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, UtxoId, OutputRecord> {
        self.utxos.iter()
    }

    /// Sum of every unspent value, or `None` on overflow.
    pub fn total_value(&self) -> Option<Decimal> {
        self.utxos
            .values()
            .try_fold(Decimal::ZERO, |sum, record| sum.checked_add(record.value))
    }

    /// Consumes the inputs of `tx` and records its outputs.
    ///
    /// No validation happens here: callers settle only transactions that
    /// passed [`crate::validator::validate`] against this same ledger state.
    pub fn apply(&mut self, tx: &Transaction) {
        for input in tx.inputs() {
            self.utxos.remove(&input.utxo);
        }

        self.utxos.extend(tx.produced());
    }
}

impl FromIterator<(UtxoId, OutputRecord)> for Ledger {
    fn from_iter<I: IntoIterator<Item = (UtxoId, OutputRecord)>>(iter: I) -> Self {
        Self {
            utxos: iter.into_iter().collect(),
        }
    }
}

impl Extend<(UtxoId, OutputRecord)> for Ledger {
    fn extend<I: IntoIterator<Item = (UtxoId, OutputRecord)>>(&mut self, iter: I) {
        self.utxos.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = (&'a UtxoId, &'a OutputRecord);
    type IntoIter = hash_map::Iter<'a, UtxoId, OutputRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.utxos.iter()
    }
}
