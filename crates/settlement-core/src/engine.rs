use crate::crypto::{Ed25519Verifier, SignatureVerifier};
use crate::ledger::Ledger;
use crate::transaction::Transaction;
use crate::validator::{self, Rejection};
use tracing::{debug, info};

/// How an epoch picks its accepted subset from the candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// One pass in the order given; a rejected candidate is never reconsidered.
    #[default]
    Greedy,
    /// Greedy passes over the still-rejected candidates until a pass accepts
    /// nothing, so a spend listed before its parent can still settle.
    MultiPass,
}

/// Validates `tx` against `ledger` and, if it passes, applies it.
///
/// A rejected transaction leaves `ledger` untouched.
pub fn settle<V>(tx: &Transaction, ledger: &mut Ledger, verifier: &V) -> Result<(), Rejection>
where
    V: SignatureVerifier + ?Sized,
{
    validator::validate(tx, ledger, verifier)?;
    ledger.apply(tx);
    Ok(())
}

/// Settles `candidates` one by one against the current state of `ledger`
/// and returns the accepted ones in input order.
///
/// The result depends on candidate order: a transaction that spends an
/// output created later in the same batch is rejected.
pub fn apply_epoch<V>(
    candidates: impl IntoIterator<Item = Transaction>,
    ledger: &mut Ledger,
    verifier: &V,
) -> Vec<Transaction>
where
    V: SignatureVerifier + ?Sized,
{
    apply_epoch_with(SelectionPolicy::Greedy, candidates, ledger, verifier)
}

pub fn apply_epoch_with<V>(
    policy: SelectionPolicy,
    candidates: impl IntoIterator<Item = Transaction>,
    ledger: &mut Ledger,
    verifier: &V,
) -> Vec<Transaction>
where
    V: SignatureVerifier + ?Sized,
{
    let mut accepted = Vec::new();
    let mut pending = settle_pass(candidates, ledger, verifier, &mut accepted);

    if policy == SelectionPolicy::MultiPass {
        loop {
            let before = pending.len();
            pending = settle_pass(pending, ledger, verifier, &mut accepted);
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
    }

    info!(
        accepted = accepted.len(),
        rejected = pending.len(),
        ?policy,
        "Epoch settled"
    );

    accepted
}

// Returns the candidates that were rejected, in order.
fn settle_pass<V>(
    candidates: impl IntoIterator<Item = Transaction>,
    ledger: &mut Ledger,
    verifier: &V,
    accepted: &mut Vec<Transaction>,
) -> Vec<Transaction>
where
    V: SignatureVerifier + ?Sized,
{
    let mut rejected = Vec::new();

    for tx in candidates {
        match settle(&tx, ledger, verifier) {
            Ok(()) => accepted.push(tx),
            Err(reason) => {
                debug!(tx = %tx.id(), %reason, "Rejected candidate");
                rejected.push(tx);
            }
        }
    }

    rejected
}

/// Owns a private copy of a ledger and settles epochs against it.
///
/// Every epoch needs `&mut self`, so two epochs can never run against the
/// same ledger at once; sharing an engine across threads requires the
/// caller to wrap it in a lock.
#[derive(Debug, Clone)]
pub struct SettlementEngine<V = Ed25519Verifier> {
    ledger: Ledger,
    verifier: V,
    policy: SelectionPolicy,
}

impl SettlementEngine {
    pub fn new(initial: &Ledger) -> Self {
        Self::with_verifier(initial, Ed25519Verifier)
    }
}

impl<V: SignatureVerifier> SettlementEngine<V> {
    /// Copies `initial`; the caller's ledger is never modified.
    pub fn with_verifier(initial: &Ledger, verifier: V) -> Self {
        Self {
            ledger: initial.clone(),
            verifier,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self, tx: &Transaction) -> Result<(), Rejection> {
        validator::validate(tx, &self.ledger, &self.verifier)
    }

    pub fn is_valid(&self, tx: &Transaction) -> bool {
        validator::is_valid(tx, &self.ledger, &self.verifier)
    }

    pub fn apply_epoch(
        &mut self,
        candidates: impl IntoIterator<Item = Transaction>,
    ) -> Vec<Transaction> {
        apply_epoch_with(self.policy, candidates, &mut self.ledger, &self.verifier)
    }

    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }
}
