//! Beancount booking engine with interpolation.
//!
//! This crate provides:
//! - Transaction interpolation (filling in missing amounts)
//! - Transaction balancing verification
//! - Tolerance calculation
//!
//! # Interpolation
//!
//! When a transaction has exactly one posting per currency without an amount,
//! that amount can be calculated to make the transaction balance.
//!
//! ```ignore
//! use ledgercore_booking::interpolate;
//!
//! // Transaction with one missing amount
//! // 2024-01-15 * "Groceries"
//! //   Expenses:Food  50.00 USD
//! //   Assets:Cash               <- amount inferred as -50.00 USD
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod interpolate;
mod pad;
mod tolerance;

pub use interpolate::{InterpolationError, InterpolationResult, interpolate};
pub use pad::{
    PadError, PadResult, create_padding_transaction, expand_pads, merge_with_padding, process_pads,
};
pub use tolerance::{calculate_tolerances, tolerance_for, ToleranceConfig};

use rust_decimal::Decimal;
use rust_decimal::prelude::Signed;
use ledgercore_core::{IncompleteAmount, InternedStr, Transaction};
use std::collections::HashMap;

/// Calculate the residual (imbalance) of a transaction.
///
/// Returns a map of currency -> residual amount.
/// A balanced transaction has all residuals within tolerance.
#[must_use]
pub fn calculate_residual(transaction: &Transaction) -> HashMap<InternedStr, Decimal> {
    let mut residuals: HashMap<InternedStr, Decimal> = HashMap::new();

    for posting in &transaction.postings {
        // Only process complete amounts
        if let Some(IncompleteAmount::Complete(units)) = &posting.units {
            // Determine the "weight" of this posting for balance purposes.
            // - If there's a cost, the weight is in the cost currency (not units currency)
            // - If there's a price annotation, the weight is in the price currency (not units currency)
            // - Otherwise, the weight is just the units

            if let Some(cost_spec) = &posting.cost {
                // Cost-based posting: weight is in the cost currency
                if let (Some(per_unit), Some(cost_curr)) =
                    (&cost_spec.number_per, &cost_spec.currency)
                {
                    let cost_amount = units.number * per_unit;
                    *residuals.entry(cost_curr.clone()).or_default() += cost_amount;
                } else if let (Some(total), Some(cost_curr)) =
                    (&cost_spec.number_total, &cost_spec.currency)
                {
                    // For total cost, the sign depends on the units sign
                    *residuals.entry(cost_curr.clone()).or_default() +=
                        *total * units.number.signum();
                } else {
                    // Empty cost spec `{}` (or one lacking number/currency): the weight
                    // is empty and contributes nothing until a cost is inferred.
                }
            } else if let Some(price) = &posting.price {
                // Price annotation: converts units to price currency for balance purposes.
                // The weight is in the price currency, not the units currency.
                match price {
                    ledgercore_core::PriceAnnotation::Unit(price_amt) => {
                        let converted = units.number.abs() * price_amt.number;
                        *residuals.entry(price_amt.currency.clone()).or_default() +=
                            converted * units.number.signum();
                    }
                    ledgercore_core::PriceAnnotation::Total(price_amt) => {
                        *residuals.entry(price_amt.currency.clone()).or_default() +=
                            price_amt.number * units.number.signum();
                    }
                    // Incomplete price annotations - extract what we can
                    ledgercore_core::PriceAnnotation::UnitIncomplete(inc) => {
                        if let Some(price_amt) = inc.as_amount() {
                            let converted = units.number.abs() * price_amt.number;
                            *residuals.entry(price_amt.currency.clone()).or_default() +=
                                converted * units.number.signum();
                        } else {
                            // Can't calculate price conversion, fall back to units
                            *residuals.entry(units.currency.clone()).or_default() += units.number;
                        }
                    }
                    ledgercore_core::PriceAnnotation::TotalIncomplete(inc) => {
                        if let Some(price_amt) = inc.as_amount() {
                            *residuals.entry(price_amt.currency.clone()).or_default() +=
                                price_amt.number * units.number.signum();
                        } else {
                            // Can't calculate price conversion, fall back to units
                            *residuals.entry(units.currency.clone()).or_default() += units.number;
                        }
                    }
                    // Empty price annotations - fall back to units
                    ledgercore_core::PriceAnnotation::UnitEmpty
                    | ledgercore_core::PriceAnnotation::TotalEmpty => {
                        *residuals.entry(units.currency.clone()).or_default() += units.number;
                    }
                }
            } else {
                // Simple posting: weight is just the units
                *residuals.entry(units.currency.clone()).or_default() += units.number;
            }
        }
    }

    residuals
}

/// Check if a transaction is balanced within its inferred tolerance.
#[must_use]
pub fn is_balanced(transaction: &Transaction, config: &ToleranceConfig) -> bool {
    let residuals = calculate_residual(transaction);
    let tolerances = tolerance::calculate_tolerances(transaction, config);

    for (currency, residual) in residuals {
        let tol = tolerance::tolerance_for(&tolerances, config, &currency);
        if residual.abs() > tol {
            return false;
        }
    }

    true
}
