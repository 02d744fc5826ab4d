//! Helpers for tests and benches. Enabled by the `test-helpers` feature.

use rand::Rng;

use crate::{AccountId, Amount};

/// Break `total` into between 1 and `max_parts` positive amounts that sum to
/// exactly `total`. Returns an empty schedule for a zero total.
pub fn random_schedule<R: Rng + ?Sized>(rng: &mut R, total: Amount, max_parts: usize) -> Vec<Amount> {
    let mut remaining = total.0;
    let mut parts = Vec::new();
    let max_parts = max_parts.max(1);
    while remaining > 0 {
        if parts.len() + 1 == max_parts {
            parts.push(Amount(remaining));
            break;
        }
        let piece = rng.gen_range(1..=remaining);
        parts.push(Amount(piece));
        remaining -= piece;
    }
    parts
}

/// `n` fresh payer identities.
#[must_use]
pub fn payers(n: usize) -> Vec<AccountId> {
    (0..n).map(|_| AccountId::new()).collect()
}
