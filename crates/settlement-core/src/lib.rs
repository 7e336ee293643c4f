pub mod crypto;
pub mod engine;
pub mod ledger;
pub mod records;
pub mod transaction;
pub mod validator;

#[cfg(test)]
mod test_utils;

pub use crypto::{Ed25519Verifier, Hash, PublicKey, Signature, SignatureVerifier};
pub use engine::{apply_epoch, apply_epoch_with, settle, SelectionPolicy, SettlementEngine};
pub use ledger::{Ledger, OutputRecord, UtxoId};
pub use transaction::{Input, Output, Transaction, TransactionBuilder};
pub use validator::{is_valid, validate, Rejection};

/// Settle one batch against a copy of `initial` and return the accepted
/// transactions together with the resulting ledger
pub fn settle_batch(
    initial: &Ledger,
    candidates: impl IntoIterator<Item = Transaction>,
) -> (Vec<Transaction>, Ledger) {
    let mut engine = SettlementEngine::new(initial);
    let accepted = engine.apply_epoch(candidates);

    (accepted, engine.into_ledger())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{genesis_ledger, owner, sign_all, signer};
    use rust_decimal::Decimal;

    #[test]
    fn test_settle_batch_leaves_initial_ledger() {
        let k = signer(1);
        let (genesis, ids) = genesis_ledger(&k, &[10]);

        let mut builder = TransactionBuilder::new();
        builder.add_input(ids[0]).add_output(Decimal::TEN, owner(&signer(2)));
        let tx = sign_all(&mut builder, &[&k]);

        let (accepted, settled) = settle_batch(&genesis, vec![tx.clone()]);

        assert_eq!(accepted, vec![tx.clone()]);
        assert!(settled.contains(&UtxoId::new(*tx.id(), 0)));
        assert!(genesis.contains(&ids[0]));
    }
}
