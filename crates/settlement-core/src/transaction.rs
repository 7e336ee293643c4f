use crate::crypto::{Hash, PublicKey, Signature};
use crate::ledger::{Ledger, OutputRecord, UtxoId};
use rust_decimal::Decimal;
use thiserror::Error;

const SIGNING_DOMAIN: &[u8] = b"utxo-settlement/sighash/v1";
const TRANSACTION_DOMAIN: &[u8] = b"utxo-settlement/tx/v1";

/// Claims one unspent output. The signature is absent until the owner signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub utxo: UtxoId,
    pub signature: Option<Signature>,
}

/// A new amount handed to `owner`. Negative values are representable so
/// that the validator can reject them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub value: Decimal,
    pub owner: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("input index {index} out of range for {len} inputs")]
    InputOutOfRange { index: usize, len: usize },
}

/// Candidate transaction. Immutable once built; its id is derived from
/// every input (signatures included) and output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: Hash,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Transaction {
    pub const fn id(&self) -> &Hash {
        &self.id
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Bytes the owner of input `index` signs, or `None` if there is no such input.
    pub fn signing_payload(&self, index: usize) -> Option<Vec<u8>> {
        signing_payload(&self.inputs, &self.outputs, index)
    }

    /// Canonical encoding of the whole transaction.
    pub fn raw_bytes(&self) -> Vec<u8> {
        raw_bytes(&self.inputs, &self.outputs)
    }

    /// The outputs this transaction adds to a ledger, keyed by `(id, position)`.
    pub fn produced(&self) -> impl Iterator<Item = (UtxoId, OutputRecord)> + '_ {
        (0u32..).zip(&self.outputs).map(move |(index, output)| {
            (
                UtxoId::new(self.id, index),
                OutputRecord::new(output.value, output.owner),
            )
        })
    }

    /// Input value minus output value. `None` when an input is unknown to
    /// `ledger` or the arithmetic overflows.
    pub fn fee(&self, ledger: &Ledger) -> Option<Decimal> {
        let inputs = self.inputs.iter().try_fold(Decimal::ZERO, |sum, input| {
            sum.checked_add(ledger.get(&input.utxo)?.value)
        })?;
        let outputs = self
            .outputs
            .iter()
            .try_fold(Decimal::ZERO, |sum, output| sum.checked_add(output.value))?;
        inputs.checked_sub(outputs)
    }
}

/// Assembles a transaction: claim inputs, declare outputs, collect the
/// owners' signatures over [`TransactionBuilder::signing_payload`], then
/// [`TransactionBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, utxo: UtxoId) -> &mut Self {
        self.inputs.push(Input {
            utxo,
            signature: None,
        });
        self
    }

    /// Claims `utxo` with a signature produced elsewhere over this input's
    /// signing payload.
    pub fn add_signed_input(&mut self, utxo: UtxoId, signature: Signature) -> &mut Self {
        self.inputs.push(Input {
            utxo,
            signature: Some(signature),
        });
        self
    }

    pub fn add_output(&mut self, value: Decimal, owner: PublicKey) -> &mut Self {
        self.outputs.push(Output { value, owner });
        self
    }

    pub fn add_signature(
        &mut self,
        index: usize,
        signature: Signature,
    ) -> Result<&mut Self, TransactionError> {
        let len = self.inputs.len();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(TransactionError::InputOutOfRange { index, len })?;
        input.signature = Some(signature);
        Ok(self)
    }

    pub fn signing_payload(&self, index: usize) -> Option<Vec<u8>> {
        signing_payload(&self.inputs, &self.outputs, index)
    }

    pub fn build(&self) -> Transaction {
        Transaction {
            id: Hash::digest(&raw_bytes(&self.inputs, &self.outputs)),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        }
    }
}

fn signing_payload(inputs: &[Input], outputs: &[Output], index: usize) -> Option<Vec<u8>> {
    let input = inputs.get(index)?;

    let mut payload = SIGNING_DOMAIN.to_vec();
    payload.extend_from_slice(&(index as u64).to_be_bytes());
    encode_utxo(&mut payload, &input.utxo);
    encode_outputs(&mut payload, outputs);
    Some(payload)
}

fn raw_bytes(inputs: &[Input], outputs: &[Output]) -> Vec<u8> {
    let mut raw = TRANSACTION_DOMAIN.to_vec();
    raw.extend_from_slice(&(inputs.len() as u64).to_be_bytes());
    for input in inputs {
        encode_utxo(&mut raw, &input.utxo);
        match &input.signature {
            Some(signature) => {
                raw.push(1);
                raw.extend_from_slice(signature.as_bytes());
            }
            None => raw.push(0),
        }
    }
    encode_outputs(&mut raw, outputs);
    raw
}

fn encode_utxo(buffer: &mut Vec<u8>, utxo: &UtxoId) {
    buffer.extend_from_slice(utxo.tx.as_bytes());
    buffer.extend_from_slice(&utxo.index.to_be_bytes());
}

// Values are normalized so that 1.0 and 1.00 encode identically.
fn encode_outputs(buffer: &mut Vec<u8>, outputs: &[Output]) {
    buffer.extend_from_slice(&(outputs.len() as u64).to_be_bytes());
    for output in outputs {
        buffer.extend_from_slice(&output.value.normalize().serialize());
        buffer.extend_from_slice(output.owner.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utxo(seed: &[u8], index: u32) -> UtxoId {
        UtxoId::new(Hash::digest(seed), index)
    }

    fn owner(byte: u8) -> PublicKey {
        PublicKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_signing_payload_binds_input_position() {
        let mut builder = TransactionBuilder::new();
        builder
            .add_input(utxo(b"a", 0))
            .add_input(utxo(b"a", 0))
            .add_output(Decimal::ONE, owner(1));

        let first = builder.signing_payload(0).unwrap();
        let second = builder.signing_payload(1).unwrap();

        assert_ne!(first, second);
        assert_eq!(builder.signing_payload(2), None);
    }

    #[test]
    fn test_signing_payload_ignores_signatures() {
        let mut builder = TransactionBuilder::new();
        builder
            .add_input(utxo(b"a", 0))
            .add_input(utxo(b"b", 3))
            .add_output(Decimal::ONE, owner(1));
        let before = builder.signing_payload(1).unwrap();

        builder
            .add_signature(0, Signature::from_bytes([9; 64]))
            .unwrap();

        assert_eq!(builder.signing_payload(1).unwrap(), before);
        assert_eq!(builder.build().signing_payload(1).unwrap(), before);
    }

    #[test]
    fn test_add_signature_out_of_range() {
        let mut builder = TransactionBuilder::new();
        builder.add_input(utxo(b"a", 0));

        let err = builder
            .add_signature(1, Signature::from_bytes([0; 64]))
            .unwrap_err();

        assert_eq!(err, TransactionError::InputOutOfRange { index: 1, len: 1 });
    }

    #[test]
    fn test_id_covers_contents() {
        let mut builder = TransactionBuilder::new();
        builder
            .add_input(utxo(b"a", 0))
            .add_output(Decimal::ONE, owner(1));
        let unsigned = builder.build();

        assert_eq!(builder.build().id(), unsigned.id());

        builder
            .add_signature(0, Signature::from_bytes([1; 64]))
            .unwrap();
        let signed = builder.build();
        assert_ne!(signed.id(), unsigned.id());

        builder.add_output(Decimal::ZERO, owner(2));
        assert_ne!(builder.build().id(), signed.id());
    }

    #[test]
    fn test_id_ignores_decimal_scale() {
        let mut one = TransactionBuilder::new();
        one.add_input(utxo(b"a", 0))
            .add_output(Decimal::new(10, 1), owner(1));
        let mut other = TransactionBuilder::new();
        other
            .add_input(utxo(b"a", 0))
            .add_output(Decimal::new(100, 2), owner(1));

        assert_eq!(one.build().id(), other.build().id());
    }

    #[test]
    fn test_produced_keys_follow_output_order() {
        let mut builder = TransactionBuilder::new();
        builder
            .add_output(Decimal::ONE, owner(1))
            .add_output(Decimal::TWO, owner(2));
        let tx = builder.build();

        let produced = tx.produced().collect::<Vec<_>>();

        assert_eq!(
            produced,
            vec![
                (
                    UtxoId::new(*tx.id(), 0),
                    OutputRecord::new(Decimal::ONE, owner(1))
                ),
                (
                    UtxoId::new(*tx.id(), 1),
                    OutputRecord::new(Decimal::TWO, owner(2))
                ),
            ]
        );
    }

    #[test]
    fn test_fee() {
        let spent = utxo(b"genesis", 0);
        let ledger: Ledger = [(spent, OutputRecord::new(Decimal::TEN, owner(1)))]
            .into_iter()
            .collect();

        let mut builder = TransactionBuilder::new();
        builder
            .add_input(spent)
            .add_output(Decimal::new(7, 0), owner(2));
        assert_eq!(builder.build().fee(&ledger), Some(Decimal::new(3, 0)));

        let mut unknown = TransactionBuilder::new();
        unknown.add_input(utxo(b"missing", 0));
        assert_eq!(unknown.build().fee(&ledger), None);
    }
}
