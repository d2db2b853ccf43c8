//! Contribution aggregation
//!
//! Groups ledger transfers per recipient, then per sender. Multiple
//! transfers from the same sender to the same recipient collapse into one
//! contribution before any matching rule sees them.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::ids::DelegateId;
use types::transfer::Transfer;

/// Per-sender contribution totals received by one recipient.
pub type Contributions = BTreeMap<DelegateId, Decimal>;

/// Aggregate transfers into recipient → sender → total.
///
/// Recipients without transfers never appear. Iteration order is by id,
/// independent of ledger order. A total beyond `Decimal::MAX` is pinned
/// there.
pub fn aggregate<'a>(transfers: impl IntoIterator<Item = &'a Transfer>) -> BTreeMap<DelegateId, Contributions> {
    let mut by_recipient: BTreeMap<DelegateId, Contributions> = BTreeMap::new();
    for transfer in transfers {
        let total = by_recipient
            .entry(transfer.recipient)
            .or_default()
            .entry(transfer.sender)
            .or_insert(Decimal::ZERO);
        *total = total
            .checked_add(transfer.amount.as_decimal())
            .unwrap_or(Decimal::MAX);
    }
    by_recipient
}
