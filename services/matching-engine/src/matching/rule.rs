//! Matching rules
//!
//! A rule turns the aggregated contributions of one recipient into a raw
//! match demand on the pool. The allocator later scales raw demands down
//! when they exceed the pool.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::Contributions;

/// Decimal places kept in quadratic raw demand.
const QUADRATIC_DP: u32 = 16;

/// Rule used to derive raw match demand from contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingRule {
    /// 1:1 match of everything a recipient received.
    ///
    /// Depends only on the recipient's total, so splitting one transfer
    /// across several senders never changes the match.
    #[default]
    Proportional,
    /// Capital-constrained liberal radicalism:
    /// `(Σ √c_s)² − Σ c_s` over per-sender totals `c_s`.
    ///
    /// Rewards breadth of support; a single sender earns no match.
    Quadratic,
}

impl MatchingRule {
    /// Raw demand for one recipient. Never negative.
    pub fn raw_demand(&self, contributions: &Contributions) -> Decimal {
        let total = saturating_sum(contributions.values().copied());
        match self {
            MatchingRule::Proportional => total,
            MatchingRule::Quadratic => {
                let root_sum = saturating_sum(
                    contributions
                        .values()
                        .map(|c| c.sqrt().unwrap_or(Decimal::ZERO)),
                );
                let squared = root_sum.checked_mul(root_sum).unwrap_or(Decimal::MAX);
                // sqrt is inexact in the last digits; drop that noise so
                // perfect squares come out exact and a lone sender is zero
                (squared - total)
                    .round_dp(QUADRATIC_DP)
                    .max(Decimal::ZERO)
            }
        }
    }
}

/// Sum that pins at `Decimal::MAX` instead of overflowing.
pub(crate) fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| acc.checked_add(v).unwrap_or(Decimal::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::DelegateId;

    fn contributions(values: &[i64]) -> Contributions {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (DelegateId::from_u128(i as u128 + 1), Decimal::from(*v)))
            .collect()
    }

    #[test]
    fn test_proportional_is_total() {
        let rule = MatchingRule::Proportional;
        assert_eq!(rule.raw_demand(&contributions(&[30])), Decimal::from(30));
        assert_eq!(rule.raw_demand(&contributions(&[10, 20])), Decimal::from(30));
    }

    #[test]
    fn test_quadratic_single_sender_earns_nothing() {
        let rule = MatchingRule::Quadratic;
        assert_eq!(rule.raw_demand(&contributions(&[100])), Decimal::ZERO);
    }

    #[test]
    fn test_quadratic_rewards_breadth() {
        let rule = MatchingRule::Quadratic;
        // (√4 + √4 + √4 + √4)² − 16 = 64 − 16 = 48
        let broad = rule.raw_demand(&contributions(&[4, 4, 4, 4]));
        assert_eq!(broad.round_dp(10), Decimal::from(48));

        // (√9 + √16)² − 25 = 49 − 25 = 24
        let narrow = rule.raw_demand(&contributions(&[9, 16]));
        assert_eq!(narrow.round_dp(10), Decimal::from(24));
        assert!(broad > narrow);
    }

    #[test]
    fn test_default_rule_is_proportional() {
        assert_eq!(MatchingRule::default(), MatchingRule::Proportional);
    }

    #[test]
    fn test_rule_serde_names() {
        let json = serde_json::to_string(&MatchingRule::Quadratic).unwrap();
        assert_eq!(json, "\"quadratic\"");
    }
}
