//! Shared fixtures for unit tests: deterministic Ed25519 owners and a
//! genesis ledger they own.

use crate::crypto::{Hash, PublicKey, Signature};
use crate::ledger::{Ledger, OutputRecord, UtxoId};
use crate::transaction::{Transaction, TransactionBuilder};
use ed25519_dalek::{Signer, SigningKey};
use rust_decimal::Decimal;

pub fn signer(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn owner(key: &SigningKey) -> PublicKey {
    PublicKey::from_bytes(key.verifying_key().to_bytes())
}

/// Signs input `i` with `keys[i]` and builds the transaction.
pub fn sign_all(builder: &mut TransactionBuilder, keys: &[&SigningKey]) -> Transaction {
    for (index, key) in keys.iter().enumerate() {
        let payload = builder.signing_payload(index).unwrap();
        let signature = Signature::from_bytes(key.sign(&payload).to_bytes());
        builder.add_signature(index, signature).unwrap();
    }
    builder.build()
}

/// One genesis output per value, all owned by `key`.
pub fn genesis_ledger(key: &SigningKey, values: &[i64]) -> (Ledger, Vec<UtxoId>) {
    let genesis = Hash::digest(b"genesis");
    let ids = (0u32..)
        .zip(values)
        .map(|(index, _)| UtxoId::new(genesis, index))
        .collect::<Vec<_>>();
    let ledger: Ledger = ids
        .iter()
        .zip(values)
        .map(|(id, value)| (*id, OutputRecord::new(Decimal::new(*value, 0), owner(key))))
        .collect();
    (ledger, ids)
}
