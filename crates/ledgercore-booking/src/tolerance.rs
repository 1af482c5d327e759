//! Per-currency tolerance inference.
//!
//! A transaction balances when its per-currency residual falls within an
//! inferred tolerance derived from the precision of the posting amounts
//! actually written down, rather than a single fixed epsilon.

use rust_decimal::Decimal;
use ledgercore_core::{IncompleteAmount, InternedStr, PriceAnnotation, Transaction};
use std::collections::HashMap;

/// Configuration controlling how per-currency tolerances are derived.
#[derive(Debug, Clone)]
pub struct ToleranceConfig {
    /// Explicit per-currency fallback tolerance (`inferred_tolerance_default CUR:DEC`).
    pub currency_defaults: HashMap<InternedStr, Decimal>,
    /// Wildcard fallback tolerance (`inferred_tolerance_default *:DEC`).
    pub wildcard_default: Option<Decimal>,
    /// Multiplier applied to `10^min_exp` (`inferred_tolerance_multiplier`).
    pub multiplier: Decimal,
    /// Whether cost/price amounts contribute to the precision calculation
    /// (`infer_tolerance_from_cost`).
    pub infer_from_cost: bool,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            currency_defaults: HashMap::new(),
            wildcard_default: None,
            multiplier: Decimal::new(5, 1), // 0.5
            infer_from_cost: false,
        }
    }
}

impl ToleranceConfig {
    /// Hard-coded final fallback used when nothing else applies.
    pub const HARD_CODED_DEFAULT: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

    /// Resolve the fallback tolerance for a currency that had no nonzero
    /// posting amounts in the transaction (lookup order: explicit currency
    /// key, wildcard, hard-coded `0.005`).
    #[must_use]
    pub fn fallback(&self, currency: &str) -> Decimal {
        self.currency_defaults
            .get(currency)
            .copied()
            .or(self.wildcard_default)
            .unwrap_or(Self::HARD_CODED_DEFAULT)
    }

    /// Parse a `CURRENCY:TOLERANCE` or `*:TOLERANCE` option value, inserting
    /// it into this config.
    pub fn add_default_spec(&mut self, spec: &str) -> Result<(), String> {
        let (currency, decimal) = spec
            .split_once(':')
            .ok_or_else(|| format!("malformed inferred_tolerance_default: {spec}"))?;
        let value: Decimal = decimal
            .parse()
            .map_err(|_| format!("malformed tolerance value: {decimal}"))?;
        if currency == "*" {
            self.wildcard_default = Some(value);
        } else {
            self.currency_defaults.insert(currency.into(), value);
        }
        Ok(())
    }
}

/// Track the minimum decimal exponent (most negative/most precise) seen
/// per currency among nonzero amounts.
fn note(min_exp: &mut HashMap<InternedStr, i32>, currency: &InternedStr, number: Decimal) {
    if number.is_zero() {
        return;
    }
    let exp = -(i32::try_from(number.scale()).unwrap_or(i32::MAX));
    min_exp
        .entry(currency.clone())
        .and_modify(|e| *e = (*e).min(exp))
        .or_insert(exp);
}

/// Compute the per-currency tolerance for a transaction per the inference
/// rule: `10^min_exp * multiplier`, where `min_exp` is the smallest (most
/// precise) exponent among the transaction's nonzero posting amounts for
/// that currency.
///
/// Currencies appearing in the transaction's residual but absent from the
/// returned map (no nonzero amount was written for them) must fall back to
/// [`ToleranceConfig::fallback`].
#[must_use]
pub fn calculate_tolerances(
    transaction: &Transaction,
    config: &ToleranceConfig,
) -> HashMap<InternedStr, Decimal> {
    let mut min_exp: HashMap<InternedStr, i32> = HashMap::new();

    for posting in &transaction.postings {
        let Some(IncompleteAmount::Complete(amount)) = &posting.units else {
            continue;
        };
        note(&mut min_exp, &amount.currency, amount.number);

        if !config.infer_from_cost {
            continue;
        }
        if let Some(cost) = &posting.cost {
            if let Some(currency) = &cost.currency {
                if let Some(per) = cost.number_per {
                    note(&mut min_exp, currency, per);
                }
                if let Some(total) = cost.number_total {
                    note(&mut min_exp, currency, total);
                }
            }
        }
        match &posting.price {
            Some(PriceAnnotation::Unit(p) | PriceAnnotation::Total(p)) => {
                note(&mut min_exp, &p.currency, p.number);
            }
            Some(PriceAnnotation::UnitIncomplete(inc) | PriceAnnotation::TotalIncomplete(inc)) => {
                if let Some(p) = inc.as_amount() {
                    note(&mut min_exp, &p.currency, p.number);
                }
            }
            _ => {}
        }
    }

    min_exp
        .into_iter()
        .map(|(currency, exp)| {
            let tol = Decimal::new(1, exp.unsigned_abs()) * config.multiplier;
            (currency, tol)
        })
        .collect()
}

/// Resolve the tolerance to use for a currency, falling back to
/// [`ToleranceConfig::fallback`] when the transaction had no nonzero amount
/// in that currency.
#[must_use]
pub fn tolerance_for(
    tolerances: &HashMap<InternedStr, Decimal>,
    config: &ToleranceConfig,
    currency: &str,
) -> Decimal {
    tolerances
        .get(currency)
        .copied()
        .unwrap_or_else(|| config.fallback(currency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use ledgercore_core::{Amount, NaiveDate, Posting};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn uses_most_precise_amount_per_currency() {
        // 100 (scale 0) and 50.00 (scale 2): min_exp is -2 (from 50.00), so
        // the tolerance is the finer one, 0.005, not the coarser 0.5.
        let txn = Transaction::new(date(2024, 1, 15), "Test")
            .with_posting(Posting::new("Assets:A", Amount::new(dec!(100), "USD")))
            .with_posting(Posting::new("Assets:B", Amount::new(dec!(-50.00), "USD")))
            .with_posting(Posting::new("Assets:C", Amount::new(dec!(-50), "USD")));

        let tolerances = calculate_tolerances(&txn, &ToleranceConfig::default());
        assert_eq!(tolerances.get("USD"), Some(&dec!(0.005)));
    }

    #[test]
    fn matches_spec_example_scale_3() {
        let txn = Transaction::new(date(2024, 1, 15), "Test")
            .with_posting(Posting::new("Assets:A", Amount::new(dec!(50.004), "USD")))
            .with_posting(Posting::new("Assets:B", Amount::new(dec!(-50.000), "USD")));

        let tolerances = calculate_tolerances(&txn, &ToleranceConfig::default());
        assert_eq!(tolerances.get("USD"), Some(&dec!(0.0005)));
    }

    #[test]
    fn falls_back_for_currency_with_no_nonzero_amount() {
        let txn = Transaction::new(date(2024, 1, 15), "Test");
        let tolerances = calculate_tolerances(&txn, &ToleranceConfig::default());
        assert!(tolerances.is_empty());

        let mut config = ToleranceConfig::default();
        config.add_default_spec("EUR:0.01").unwrap();
        assert_eq!(tolerance_for(&tolerances, &config, "EUR"), dec!(0.01));
        assert_eq!(
            tolerance_for(&tolerances, &config, "JPY"),
            ToleranceConfig::HARD_CODED_DEFAULT
        );
    }

    #[test]
    fn wildcard_default_applies_to_unseen_currencies() {
        let mut config = ToleranceConfig::default();
        config.add_default_spec("*:0.02").unwrap();
        let tolerances = HashMap::new();
        assert_eq!(tolerance_for(&tolerances, &config, "GBP"), dec!(0.02));
    }

    #[test]
    fn custom_multiplier_scales_result() {
        let mut config = ToleranceConfig::default();
        config.multiplier = dec!(1.0);
        let txn = Transaction::new(date(2024, 1, 15), "Test")
            .with_posting(Posting::new("Assets:A", Amount::new(dec!(50.00), "USD")));
        let tolerances = calculate_tolerances(&txn, &config);
        assert_eq!(tolerances.get("USD"), Some(&dec!(0.01)));
    }
}
