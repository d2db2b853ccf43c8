//! Pool allocation
//!
//! Splits a fixed matching pool across recipients according to their raw
//! demand:
//! - Undersubscribed (Σ raw ≤ pool): every recipient gets its raw demand,
//!   rounded down to the working precision.
//! - Oversubscribed (Σ raw > pool): raw demands are scaled by pool / Σ raw,
//!   rounded down, and the leftover units go to the largest fractional
//!   remainders (ties by recipient id). The total then equals the pool.
//!
//! The working precision is the configured one, widened to the pool's own
//! scale so an oversubscribed pool is always distributed exactly.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::ids::DelegateId;
use types::numeric::Amount;

use super::aggregate::Contributions;
use super::rule::{saturating_sum, MatchingRule};
use crate::config::MAX_PRECISION;

/// Match computed for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub recipient: DelegateId,
    /// Distinct senders after aggregation
    pub contributors: usize,
    /// Total received from all senders
    pub contributed: Amount,
    /// Demand before scaling
    pub raw_demand: Amount,
    /// Final share of the pool
    pub amount: Amount,
}

/// Whether raw demand had to be scaled down to fit the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Saturation {
    Undersubscribed,
    Oversubscribed,
}

/// Result of splitting one pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolAllocation {
    pub pool: Amount,
    pub total_raw_demand: Amount,
    pub distributed: Amount,
    pub saturation: Saturation,
    /// Sorted by recipient
    pub allocations: Vec<Allocation>,
}

impl PoolAllocation {
    /// Amount allocated to one recipient, zero when it received nothing.
    pub fn amount_for(&self, recipient: &DelegateId) -> Amount {
        self.allocations
            .binary_search_by(|a| a.recipient.cmp(recipient))
            .map(|i| self.allocations[i].amount)
            .unwrap_or(Amount::ZERO)
    }
}

/// Split `pool` across the aggregated contributions.
pub fn allocate(
    contributions: &BTreeMap<DelegateId, Contributions>,
    pool: Amount,
    rule: MatchingRule,
    precision: u32,
) -> PoolAllocation {
    let pool_dec = pool.as_decimal();
    let dp = precision.min(MAX_PRECISION).max(pool_dec.scale());
    let unit = Decimal::new(1, dp);

    let demands: Vec<(DelegateId, usize, Decimal, Decimal)> = contributions
        .iter()
        .map(|(recipient, by_sender)| {
            (
                *recipient,
                by_sender.len(),
                saturating_sum(by_sender.values().copied()),
                rule.raw_demand(by_sender),
            )
        })
        .collect();

    // None when the total does not fit in a Decimal, which is certainly
    // more than the pool
    let checked_total = demands
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(d.3));
    let total_raw = checked_total.unwrap_or(Decimal::MAX);
    let saturation = match checked_total {
        Some(total) if total <= pool_dec => Saturation::Undersubscribed,
        _ => Saturation::Oversubscribed,
    };

    let amounts: Vec<Decimal> = match saturation {
        Saturation::Undersubscribed => demands.iter().map(|d| floor(d.3, dp)).collect(),
        Saturation::Oversubscribed => {
            let (weights, weight_total) = match checked_total {
                Some(total) => (demands.iter().map(|d| d.3).collect::<Vec<_>>(), total),
                None => {
                    // Relative to the largest demand every weight lies in
                    // [0, 1], so the sum fits where the raw total did not
                    let largest = demands.iter().map(|d| d.3).max().unwrap_or(Decimal::ZERO);
                    let weights: Vec<Decimal> = demands
                        .iter()
                        .map(|d| d.3.checked_div(largest).unwrap_or(Decimal::ZERO))
                        .collect();
                    let total = saturating_sum(weights.iter().copied());
                    (weights, total)
                }
            };

            let exact: Vec<Decimal> = weights
                .iter()
                .map(|w| {
                    // Ratio first: weight × pool could overflow
                    w.checked_div(weight_total)
                        .and_then(|share| share.checked_mul(pool_dec))
                        .unwrap_or(Decimal::ZERO)
                })
                .collect();
            largest_remainder(&demands, &exact, pool_dec, dp, unit)
        }
    };

    let allocations: Vec<Allocation> = demands
        .iter()
        .zip(amounts)
        .map(|((recipient, contributors, contributed, raw), amount)| Allocation {
            recipient: *recipient,
            contributors: *contributors,
            contributed: to_amount(*contributed),
            raw_demand: to_amount(*raw),
            amount: to_amount(amount),
        })
        .collect();

    let distributed = allocations.iter().map(|a| a.amount).sum();

    PoolAllocation {
        pool,
        total_raw_demand: to_amount(total_raw),
        distributed,
        saturation,
        allocations,
    }
}

/// Round `exact` down to `dp` places, then hand out the missing units to
/// the largest remainders until the total reaches `target`.
fn largest_remainder(
    demands: &[(DelegateId, usize, Decimal, Decimal)],
    exact: &[Decimal],
    target: Decimal,
    dp: u32,
    unit: Decimal,
) -> Vec<Decimal> {
    let mut amounts: Vec<Decimal> = exact.iter().map(|e| floor(*e, dp)).collect();

    let mut order: Vec<usize> = (0..amounts.len()).collect();
    order.sort_by(|&a, &b| {
        let rem_a = exact[a] - amounts[a];
        let rem_b = exact[b] - amounts[b];
        rem_b.cmp(&rem_a).then_with(|| demands[a].0.cmp(&demands[b].0))
    });

    let mut leftover = target - amounts.iter().copied().sum::<Decimal>();
    let mut cursor = 0;
    while leftover >= unit && !order.is_empty() {
        amounts[order[cursor % order.len()]] += unit;
        leftover -= unit;
        cursor += 1;
    }

    // Division at 28 digits can overshoot by a hair; take it back from the
    // largest shares until the total no longer exceeds the pool
    if leftover < Decimal::ZERO {
        let mut by_size: Vec<usize> = (0..amounts.len()).collect();
        by_size.sort_by(|&a, &b| {
            amounts[b].cmp(&amounts[a]).then_with(|| demands[a].0.cmp(&demands[b].0))
        });
        for idx in by_size {
            if leftover >= Decimal::ZERO {
                break;
            }
            let take = amounts[idx].min(-leftover);
            amounts[idx] -= take;
            leftover += take;
        }
    }

    amounts
}

fn floor(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

fn to_amount(value: Decimal) -> Amount {
    Amount::try_new(value).unwrap_or(Amount::ZERO)
}
