//! Pad directive processing and transaction reconstruction.
//!
//! This module provides functionality to:
//! - Process pad directives and calculate padding amounts
//! - Generate synthetic transactions representing padding adjustments
//!
//! # Pad Processing
//!
//! A `pad` directive inserts a synthetic transaction between the `pad` date and
//! the next `balance` assertion to make the balance match. The synthetic transaction
//! transfers funds from the source account to the target account.
//!
//! ```beancount
//! 2024-01-01 pad Assets:Bank Equity:Opening-Balances
//! 2024-01-02 balance Assets:Bank 1000.00 USD
//! ```
//!
//! This generates a synthetic transaction:
//! ```beancount
//! 2024-01-01 P "(Padding inserted for balance assertion)"
//!   Assets:Bank             1000.00 USD
//!   Equity:Opening-Balances -1000.00 USD
//! ```

use rust_decimal::Decimal;
use ledgercore_core::{
    Amount, Directive, InternedStr, Inventory, NaiveDate, Pad, Position, Posting, Transaction,
};
use std::collections::HashMap;
use std::ops::Neg;

/// Result of processing pad directives.
#[derive(Debug, Clone)]
pub struct PadResult {
    /// Original directives with pads removed.
    pub directives: Vec<Directive>,
    /// Synthetic padding transactions generated.
    pub padding_transactions: Vec<Transaction>,
    /// Any errors encountered during pad processing.
    pub errors: Vec<PadError>,
}

/// Error during pad processing.
#[derive(Debug, Clone)]
pub struct PadError {
    /// Date of the error.
    pub date: NaiveDate,
    /// Error message.
    pub message: String,
    /// Account involved.
    pub account: Option<InternedStr>,
}

impl PadError {
    /// Create a new pad error.
    pub fn new(date: NaiveDate, message: impl Into<String>) -> Self {
        Self {
            date,
            message: message.into(),
            account: None,
        }
    }

    /// Add account context.
    pub fn with_account(mut self, account: impl Into<InternedStr>) -> Self {
        self.account = Some(account.into());
        self
    }
}

/// Pending pad information.
#[derive(Debug, Clone)]
struct PendingPad {
    /// The pad directive.
    pad: Pad,
}

/// Process pad directives and generate synthetic transactions.
///
/// This function:
/// 1. Tracks account inventories
/// 2. When a pad is encountered, stores it as pending
/// 3. When a balance assertion is encountered for an account with a pending pad,
///    generates a synthetic transaction to make the balance match
/// 4. Returns the directives with synthetic transactions inserted
///
/// # Arguments
///
/// * `directives` - The directives to process (should be sorted by date)
///
/// # Returns
///
/// A `PadResult` containing:
/// - The original directives (with pads preserved for reference)
/// - Synthetic padding transactions
/// - Any errors encountered
pub fn process_pads(directives: &[Directive]) -> PadResult {
    let mut inventories: HashMap<String, Inventory> = HashMap::new();
    let mut pending_pads: HashMap<String, PendingPad> = HashMap::new();
    let mut padding_transactions = Vec::new();
    let mut errors = Vec::new();

    // Sort directives by date for processing
    let mut sorted: Vec<&Directive> = directives.iter().collect();
    sorted.sort_by_key(|d| d.date());

    for directive in sorted {
        match directive {
            Directive::Open(open) => {
                inventories.insert(open.account.clone(), Inventory::new());
            }

            Directive::Transaction(txn) => {
                // Update inventories
                for posting in &txn.postings {
                    if let Some(units) = posting.amount() {
                        if let Some(inv) = inventories.get_mut(&posting.account) {
                            let position = if let Some(cost_spec) = &posting.cost {
                                if let Some(cost) = cost_spec.resolve(units.number, txn.date) {
                                    Position::with_cost(units.clone(), cost)
                                } else {
                                    Position::simple(units.clone())
                                }
                            } else {
                                Position::simple(units.clone())
                            };
                            inv.add(position);
                        }
                    }
                }
            }

            Directive::Pad(pad) => {
                // Store pending pad
                pending_pads.insert(pad.account.clone(), PendingPad { pad: pad.clone() });
            }

            Directive::Balance(bal) => {
                // Check if there's a pending pad for this account
                if let Some(pending) = pending_pads.remove(&bal.account) {
                    // Calculate padding amount
                    let current = inventories
                        .get(&bal.account)
                        .map_or(Decimal::ZERO, |inv| inv.units(&bal.amount.currency));

                    let difference = bal.amount.number - current;

                    if difference != Decimal::ZERO {
                        // Generate synthetic transaction
                        let pad_txn = create_padding_transaction(
                            pending.pad.date,
                            &pending.pad.account,
                            &pending.pad.source_account,
                            &bal.amount,
                            difference,
                        );

                        // Apply to inventories
                        if let Some(inv) = inventories.get_mut(&pending.pad.account) {
                            inv.add(Position::simple(Amount::new(
                                difference,
                                &bal.amount.currency,
                            )));
                        }
                        if let Some(inv) = inventories.get_mut(&pending.pad.source_account) {
                            inv.add(Position::simple(Amount::new(
                                -difference,
                                &bal.amount.currency,
                            )));
                        }

                        padding_transactions.push(pad_txn);
                    }
                } else {
                    // No padding - just update inventory from existing transactions
                    // (already done in transaction processing)
                }
            }

            _ => {}
        }
    }

    // Check for unused pads (pad without corresponding balance)
    for (account, pending) in pending_pads {
        errors.push(
            PadError::new(
                pending.pad.date,
                format!(
                    "Pad directive for account {account} has no corresponding balance assertion"
                ),
            )
            .with_account(account),
        );
    }

    PadResult {
        directives: directives.to_vec(),
        padding_transactions,
        errors,
    }
}

/// Create a synthetic padding transaction.
///
/// `expected` is the asserted balance amount the pad is reconciling against;
/// its decimal precision is used to format both the expected and difference
/// figures in the narration, per the bit-exact padding narration format.
pub fn create_padding_transaction(
    date: NaiveDate,
    target_account: &str,
    source_account: &str,
    expected: &Amount,
    difference: Decimal,
) -> Transaction {
    let precision = expected.number.scale();
    let difference = difference.round_dp(precision);
    let narration = format!(
        "(Padding inserted for Balance of {:.prec$} {} for difference {:.prec$} {})",
        expected.number,
        expected.currency,
        difference,
        expected.currency,
        prec = precision as usize,
    );
    let amount = Amount::new(difference, &expected.currency);
    Transaction::new(date, narration)
        .with_flag('P')
        .with_posting(Posting::new(target_account, amount.clone()))
        .with_posting(Posting::new(source_account, amount.neg()))
}

/// Expand a ledger by replacing pad directives with synthetic transactions.
///
/// This is useful for reports that need to show explicit padding transactions.
///
/// # Arguments
///
/// * `directives` - The original directives
///
/// # Returns
///
/// A new list of directives with pad directives replaced by synthetic transactions.
pub fn expand_pads(directives: &[Directive]) -> Vec<Directive> {
    let result = process_pads(directives);

    let mut expanded: Vec<Directive> = Vec::new();

    // Sort original directives by date
    let mut sorted_originals: Vec<&Directive> = directives.iter().collect();
    sorted_originals.sort_by_key(|d| d.date());

    // Create a map of pad dates to padding transactions
    let mut pad_txns_by_date: HashMap<NaiveDate, Vec<&Transaction>> = HashMap::new();
    for txn in &result.padding_transactions {
        pad_txns_by_date.entry(txn.date).or_default().push(txn);
    }

    // Track which pad transactions we've inserted
    let mut inserted_pads: HashMap<NaiveDate, usize> = HashMap::new();

    for directive in sorted_originals {
        match directive {
            Directive::Pad(pad) => {
                // Replace pad with synthetic transaction if one was generated
                if let Some(txns) = pad_txns_by_date.get(&pad.date) {
                    let idx = inserted_pads.entry(pad.date).or_insert(0);
                    if *idx < txns.len() {
                        // Find the matching transaction for this pad
                        for txn in txns {
                            if txn.postings.iter().any(|p| p.account == pad.account) {
                                expanded.push(Directive::Transaction((*txn).clone()));
                                break;
                            }
                        }
                        *idx += 1;
                    }
                }
                // If no transaction was generated (difference was zero), omit the pad
            }
            other => {
                expanded.push(other.clone());
            }
        }
    }

    expanded
}

/// Merge original directives with padding transactions, maintaining date order.
///
/// Unlike `expand_pads`, this keeps the original pad directives and adds
/// the synthetic transactions alongside them.
pub fn merge_with_padding(directives: &[Directive]) -> Vec<Directive> {
    let result = process_pads(directives);

    let mut merged: Vec<Directive> = directives.to_vec();

    // Add padding transactions
    for txn in result.padding_transactions {
        merged.push(Directive::Transaction(txn));
    }

    // Sort by date
    merged.sort_by_key(ledgercore_core::Directive::date);

    merged
}
