//! FIFO lot selection uses acquisition (insertion) order, not the lot's
//! cost date. Under normal processing, postings are always applied in
//! chronological order, so insertion order and cost date coincide; this
//! test exercises the (rarer) case where they diverge and confirms FIFO
//! still follows insertion order as documented on `Inventory`.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use ledgercore_core::{Amount, BookingMethod, Cost, CostSpec, Inventory, Position};

#[test]
fn fifo_selects_by_insertion_order_even_when_dates_are_reversed() {
    let mut inv = Inventory::new();

    // Inserted first, even though its cost date is later.
    inv.add(Position::with_cost(
        Amount::new(dec!(10), "AAPL"),
        Cost::new(dec!(150), "USD").with_date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
    ));

    // Inserted second, even though its cost date is earlier.
    inv.add(Position::with_cost(
        Amount::new(dec!(10), "AAPL"),
        Cost::new(dec!(100), "USD").with_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
    ));

    let result = inv
        .reduce(
            &Amount::new(dec!(-5), "AAPL"),
            Some(&CostSpec::default()),
            BookingMethod::Fifo,
        )
        .expect("reduction should succeed");

    let cost_basis = result.cost_basis.expect("should have cost basis");
    assert_eq!(
        cost_basis.number,
        dec!(750),
        "FIFO should consume the first-inserted lot regardless of its cost date; got ${}",
        cost_basis.number
    );
}
