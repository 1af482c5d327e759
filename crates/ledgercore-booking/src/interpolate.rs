//! Transaction interpolation.
//!
//! Fills in missing posting amounts to balance transactions.

use rust_decimal::Decimal;
use rust_decimal::prelude::Signed;
use ledgercore_core::{Amount, IncompleteAmount, InternedStr, Transaction};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during interpolation.
#[derive(Debug, Clone, Error)]
pub enum InterpolationError {
    /// Multiple postings are missing amounts for the same currency.
    #[error("multiple postings missing amounts for currency {currency}")]
    MultipleMissing {
        /// The currency with multiple missing amounts.
        currency: InternedStr,
        /// Number of postings missing this currency.
        count: usize,
    },

    /// Cannot infer currency for a posting.
    #[error("cannot infer currency for posting to account {account}")]
    CannotInferCurrency {
        /// The account of the posting.
        account: InternedStr,
    },

    /// Transaction does not balance after interpolation.
    #[error("transaction does not balance: residual {residual} {currency}")]
    DoesNotBalance {
        /// The unbalanced currency.
        currency: InternedStr,
        /// The residual amount.
        residual: Decimal,
    },
}

/// Result of interpolation.
#[derive(Debug, Clone)]
pub struct InterpolationResult {
    /// The interpolated transaction.
    pub transaction: Transaction,
    /// Which posting indices were filled in.
    pub filled_indices: Vec<usize>,
    /// Residuals after interpolation (should all be near zero).
    pub residuals: HashMap<InternedStr, Decimal>,
}

/// Interpolate missing amounts in a transaction.
///
/// This function:
/// 1. Identifies postings with missing amounts
/// 2. For each currency, calculates the residual
/// 3. Fills in the missing amount to balance
///
/// # Rules
///
/// - At most one posting per currency can have a missing amount
/// - If a posting has a cost spec with a currency, that currency is used
/// - Otherwise, the posting gets the residual that makes the transaction balance
///
/// # Example
///
/// ```ignore
/// let txn = Transaction::new(date, "Test")
///     .with_posting(Posting::new("Expenses:Food", Amount::new(dec!(50.00), "USD")))
///     .with_posting(Posting::auto("Assets:Cash"));
///
/// let result = interpolate(&txn)?;
/// // Assets:Cash now has -50.00 USD
/// ```
pub fn interpolate(transaction: &Transaction) -> Result<InterpolationResult, InterpolationError> {
    // Clone the transaction for modification
    let mut result = transaction.clone();
    let mut filled_indices = Vec::new();

    // Calculate initial residuals from postings with amounts
    let mut residuals: HashMap<InternedStr, Decimal> = HashMap::new();
    let mut missing_by_currency: HashMap<InternedStr, Vec<usize>> = HashMap::new();
    let mut unassigned_missing: Vec<usize> = Vec::new();

    for (i, posting) in transaction.postings.iter().enumerate() {
        match &posting.units {
            Some(IncompleteAmount::Complete(amount)) => {
                // Determine the "weight" of this posting for balance purposes.
                // This must match the logic in calculate_residual().
                //
                // Rules:
                // - If there's a cost spec, weight is in cost currency (not units)
                // - If there's a price annotation (no cost), weight is in price currency
                // - Otherwise, weight is the units themselves

                if let Some(cost_spec) = &posting.cost {
                    // Cost-based posting: weight is in the cost currency
                    if let (Some(per_unit), Some(cost_curr)) =
                        (&cost_spec.number_per, &cost_spec.currency)
                    {
                        let cost_amount = amount.number * per_unit;
                        *residuals.entry(cost_curr.clone()).or_default() += cost_amount;
                    } else if let (Some(total), Some(cost_curr)) =
                        (&cost_spec.number_total, &cost_spec.currency)
                    {
                        // For total cost, sign depends on units sign
                        *residuals.entry(cost_curr.clone()).or_default() +=
                            *total * amount.number.signum();
                    } else {
                        // Empty cost spec: contributes nothing until a cost is inferred.
                    }
                } else if let Some(price) = &posting.price {
                    // Price annotation: converts units to price currency
                    match price {
                        ledgercore_core::PriceAnnotation::Unit(price_amt) => {
                            let converted = amount.number.abs() * price_amt.number;
                            *residuals.entry(price_amt.currency.clone()).or_default() +=
                                converted * amount.number.signum();
                        }
                        ledgercore_core::PriceAnnotation::Total(price_amt) => {
                            *residuals.entry(price_amt.currency.clone()).or_default() +=
                                price_amt.number * amount.number.signum();
                        }
                        ledgercore_core::PriceAnnotation::UnitIncomplete(inc) => {
                            if let Some(price_amt) = inc.as_amount() {
                                let converted = amount.number.abs() * price_amt.number;
                                *residuals.entry(price_amt.currency.clone()).or_default() +=
                                    converted * amount.number.signum();
                            } else {
                                // Can't calculate, fall back to units
                                *residuals.entry(amount.currency.clone()).or_default() +=
                                    amount.number;
                            }
                        }
                        ledgercore_core::PriceAnnotation::TotalIncomplete(inc) => {
                            if let Some(price_amt) = inc.as_amount() {
                                *residuals.entry(price_amt.currency.clone()).or_default() +=
                                    price_amt.number * amount.number.signum();
                            } else {
                                // Can't calculate, fall back to units
                                *residuals.entry(amount.currency.clone()).or_default() +=
                                    amount.number;
                            }
                        }
                        // Empty price annotations - fall back to units
                        ledgercore_core::PriceAnnotation::UnitEmpty
                        | ledgercore_core::PriceAnnotation::TotalEmpty => {
                            *residuals.entry(amount.currency.clone()).or_default() += amount.number;
                        }
                    }
                } else {
                    // Simple posting: weight is just the units
                    *residuals.entry(amount.currency.clone()).or_default() += amount.number;
                }
            }
            Some(IncompleteAmount::CurrencyOnly(currency)) => {
                // Currency known, number to be interpolated
                missing_by_currency
                    .entry(currency.clone())
                    .or_default()
                    .push(i);
            }
            Some(IncompleteAmount::NumberOnly(number)) => {
                // Number known, currency to be inferred
                // Try to get currency from cost or price
                let currency = posting
                    .cost
                    .as_ref()
                    .and_then(|c| c.currency.clone())
                    .or_else(|| {
                        posting.price.as_ref().and_then(|p| match p {
                            ledgercore_core::PriceAnnotation::Unit(a) => Some(a.currency.clone()),
                            ledgercore_core::PriceAnnotation::Total(a) => Some(a.currency.clone()),
                            ledgercore_core::PriceAnnotation::UnitIncomplete(inc)
                            | ledgercore_core::PriceAnnotation::TotalIncomplete(inc) => {
                                inc.as_amount().map(|a| a.currency.clone())
                            }
                            ledgercore_core::PriceAnnotation::UnitEmpty
                            | ledgercore_core::PriceAnnotation::TotalEmpty => None,
                        })
                    });

                if let Some(curr) = currency {
                    // We have currency from context, make it complete
                    *residuals.entry(curr.clone()).or_default() += *number;
                } else {
                    // Can't determine currency yet
                    unassigned_missing.push(i);
                }
            }
            None => {
                // Missing amount - try to determine currency from cost
                if let Some(cost_spec) = &posting.cost {
                    if let Some(currency) = &cost_spec.currency {
                        missing_by_currency
                            .entry(currency.clone())
                            .or_default()
                            .push(i);
                        continue;
                    }
                }
                // Can't determine currency yet
                unassigned_missing.push(i);
            }
        }
    }

    // Check for multiple missing in same currency
    for (currency, indices) in &missing_by_currency {
        if indices.len() > 1 {
            return Err(InterpolationError::MultipleMissing {
                currency: currency.clone(),
                count: indices.len(),
            });
        }
    }

    // Inference uniqueness: at most one posting in the whole transaction may
    // be missing an amount. More than one, whether pinned to a currency via
    // its cost spec or fully unassigned, is ambiguous.
    let total_missing: usize =
        missing_by_currency.values().map(Vec::len).sum::<usize>() + unassigned_missing.len();
    if total_missing > 1 {
        let currency = missing_by_currency
            .keys()
            .next()
            .cloned()
            .or_else(|| residuals.keys().next().cloned())
            .unwrap_or_else(|| InternedStr::from("?"));
        return Err(InterpolationError::MultipleMissing {
            currency,
            count: total_missing,
        });
    }

    // Fill in known-currency missing postings
    for (currency, indices) in missing_by_currency {
        let idx = indices[0];
        let residual = residuals.get(&currency).copied().unwrap_or(Decimal::ZERO);

        result.postings[idx].units = Some(IncompleteAmount::Complete(Amount::new(
            -residual, &currency,
        )));
        filled_indices.push(idx);

        // Update residual
        residuals.insert(currency, Decimal::ZERO);
    }

    // Handle the (at most one) fully unassigned missing posting: it must
    // absorb a single nonzero-residual currency to be unambiguous.
    if let Some(&idx) = unassigned_missing.first() {
        let non_zero_residuals: Vec<(InternedStr, Decimal)> = residuals
            .iter()
            .filter(|&(_, v)| !v.is_zero())
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        match non_zero_residuals.as_slice() {
            [] => {
                return Err(InterpolationError::CannotInferCurrency {
                    account: transaction.postings[idx].account.clone().into(),
                });
            }
            [(currency, residual)] => {
                result.postings[idx].units =
                    Some(IncompleteAmount::Complete(Amount::new(-*residual, currency)));
                filled_indices.push(idx);
            }
            _ => {
                return Err(InterpolationError::MultipleMissing {
                    currency: non_zero_residuals[0].0.clone(),
                    count: non_zero_residuals.len(),
                });
            }
        }
    }

    // Empty-cost inference: among postings with a positive amount and an
    // empty cost spec `{}` (which contributes nothing to the residual by
    // itself), a single such posting can absorb the single remaining
    // nonzero-currency residual by inferring its per-unit cost.
    let empty_cost_candidates: Vec<usize> = result
        .postings
        .iter()
        .enumerate()
        .filter_map(|(i, posting)| {
            let cost_spec = posting.cost.as_ref()?;
            if !cost_spec.is_empty() {
                return None;
            }
            let amount = posting.units.as_ref()?.as_amount()?;
            (amount.number > Decimal::ZERO).then_some(i)
        })
        .collect();

    if empty_cost_candidates.len() > 1 {
        return Err(InterpolationError::MultipleMissing {
            currency: result.postings[empty_cost_candidates[0]]
                .units
                .as_ref()
                .and_then(ledgercore_core::IncompleteAmount::as_amount)
                .map_or_else(|| InternedStr::from("?"), |a| a.currency.clone()),
            count: empty_cost_candidates.len(),
        });
    }

    if let Some(&idx) = empty_cost_candidates.first() {
        let non_zero_residuals: Vec<(InternedStr, Decimal)> = residuals
            .iter()
            .filter(|&(_, v)| !v.is_zero())
            .map(|(k, v)| (k.clone(), *v))
            .collect();

        if non_zero_residuals.len() > 1 {
            return Err(InterpolationError::MultipleMissing {
                currency: non_zero_residuals[0].0.clone(),
                count: non_zero_residuals.len(),
            });
        }

        if let [(currency, residual)] = non_zero_residuals.as_slice() {
            let amount = result.postings[idx]
                .units
                .as_ref()
                .and_then(ledgercore_core::IncompleteAmount::as_amount)
                .expect("filtered on Some(amount) above")
                .number;
            let per_unit = -*residual / amount;

            result.postings[idx].cost = Some(
                ledgercore_core::CostSpec::empty()
                    .with_number_per(per_unit)
                    .with_currency(currency.clone()),
            );

            residuals.insert(currency.clone(), Decimal::ZERO);
        }
    }

    // Recalculate final residuals
    let final_residuals = crate::calculate_residual(&result);

    Ok(InterpolationResult {
        transaction: result,
        filled_indices,
        residuals: final_residuals,
    })
}
