//! End-to-end executor scenarios against the simulated broker.
//!
//! Quotes and fills are pushed synchronously through the sink traits, so
//! every assertion runs deterministically with no wall-clock dependence:
//! window checks read quote timestamps and the sweep takes an explicit
//! clock argument.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use ashare_broker::{QuoteChannel, QuoteFeed, QuoteSink, SimBroker};
use ashare_core::{OrderKind, Price, QuoteResult, QuoteSnapshot, SecurityCode};
use ashare_exec::{Candidate, Executor, ExecutorConfig, Holding};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()
}

fn candidate(code: &str) -> Candidate {
    Candidate::new(
        SecurityCode::new(code),
        "Test",
        day(),
        dec!(20000),
        Price::new(dec!(9.00)),
        dec!(5),
        dec!(-5),
        dec!(2),
    )
}

fn holding(code: &str, volume: u64, hold_days: u32) -> Holding {
    Holding {
        code: SecurityCode::new(code),
        name: "Test".to_string(),
        volume,
        stoploss_price: Price::new(dec!(9.50)),
        hold_days,
    }
}

fn quote(code: &str, prev: Decimal, open: Decimal, last: Decimal, hm: (u32, u32)) -> QuoteResult {
    QuoteResult::ok(QuoteSnapshot {
        code: SecurityCode::new(code),
        name: "Test".to_string(),
        timestamp: day().and_hms_opt(hm.0, hm.1, 0).unwrap(),
        prev_close: Price::new(prev),
        today_open: Price::new(open),
        last: Price::new(last),
    })
}

/// Wire an executor to a fresh simulated broker with 50 000 usable capital.
fn setup(candidates: Vec<Candidate>, holdings: Vec<Holding>) -> (Arc<Executor>, Arc<SimBroker>) {
    let broker = Arc::new(SimBroker::new());
    broker.set_capital(dec!(50000));

    let executor = Arc::new(Executor::new(
        ExecutorConfig::for_day(day()),
        candidates,
        holdings,
        broker.clone(),
        broker.clone(),
        broker.clone(),
    ));
    broker.attach_quote_sink(executor.clone());
    broker.attach_fill_sink(executor.clone());

    (executor, broker)
}

// ======================================================================
// Buy pipeline
// ======================================================================

#[test]
fn test_buy_pipeline_full_flow() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);

    // Below the open: discovery runs but the buyable latch stays off.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.70), (9, 35))],
    );
    assert!(broker.registered_orders().is_empty());
    assert!(broker.is_subscribed(&SecurityCode::new("600000"), QuoteChannel::Candidate));

    // Above the open: the candidate buys and is finalized.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );

    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.kind, OrderKind::Buy);
    // max buy = 9.80 * 1.02 rounded to 10.00; floor = max(9.00, down limit 9.00).
    assert_eq!(order.price, Price::new(dec!(10.00)));
    assert_eq!(order.floor_price, Some(Price::new(dec!(9.00))));
    // volume = floor(min(20000, 50000) / 10.00)
    assert_eq!(order.volume, 2000);
    assert!(!broker.is_subscribed(&SecurityCode::new("600000"), QuoteChannel::Candidate));

    let runtimes = executor.runtimes();
    assert_eq!(runtimes.len(), 1);
    assert_eq!(runtimes[0].expected, 2000);
    assert_eq!(runtimes[0].remaining, 2000);
    assert!(runtimes[0].has_live_buy());

    // The decision is final: further quotes never produce a second order.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(10.10), (10, 1))],
    );
    assert_eq!(broker.registered_orders().len(), 1);
}

#[test]
fn test_open_price_is_recorded_once() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);

    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.70), (9, 35))],
    );

    // A later feed correction of the open must not reprice the buy: the
    // order is sized from the first recorded open (max buy 10.00), not
    // from 9.60 (which would give 9.79).
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.60), dec!(9.65), (9, 36))],
    );

    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].price, Price::new(dec!(10.00)));
}

#[test]
fn test_open_out_of_band_drops_candidate() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);

    // Open 9.40 is below the [9.50, 10.50] acceptance band.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.40), dec!(9.60), (9, 35))],
    );
    assert!(broker.registered_orders().is_empty());

    // The candidate is gone; the next quote only cleans up the feed.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.40), dec!(9.60), (9, 36))],
    );
    assert!(broker.registered_orders().is_empty());
    assert!(!broker.is_subscribed(&SecurityCode::new("600000"), QuoteChannel::Candidate));
}

#[test]
fn test_open_below_stoploss_drops_candidate() {
    let mut c = candidate("600000");
    c.stoploss_price = Price::new(dec!(9.90));
    let (executor, broker) = setup(vec![c], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);

    // Open 9.80 is inside the band but under the stop.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(10.00), (9, 35))],
    );
    assert!(broker.registered_orders().is_empty());
}

#[test]
fn test_quote_outside_accept_window_ignored() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);

    // 09:15 pre-open auction ticks carry no decision weight.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (9, 15))],
    );
    assert!(broker.registered_orders().is_empty());

    // The same quote inside the window goes through.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );
    assert_eq!(broker.registered_orders().len(), 1);
}

#[test]
fn test_stale_buy_date_drops_candidate() {
    let mut c = candidate("600000");
    c.buy_date = day().pred_opt().unwrap();
    let (executor, broker) = setup(vec![c], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);

    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );
    assert!(broker.registered_orders().is_empty());
}

// ======================================================================
// Capital gating
// ======================================================================

#[test]
fn test_insufficient_capital_skips_buy() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);
    // 15 000 usable < 90% of the 20 000 allotment.
    broker.set_capital(dec!(15000));

    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );
    assert!(broker.registered_orders().is_empty());

    // The pass consumed the candidate; restored capital changes nothing.
    broker.set_capital(dec!(50000));
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 1))],
    );
    assert!(broker.registered_orders().is_empty());
}

#[test]
fn test_budget_capped_by_usable_capital() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);
    // 19 000 clears the 90% gate but caps the budget below the allotment.
    broker.set_capital(dec!(19000));

    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );

    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].volume, 1900);
}

#[test]
fn test_capital_query_failure_blocks_buy() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);
    broker.set_capital_unavailable(true);

    // Usable collapses to zero on query failure, failing the gate.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );
    assert!(broker.registered_orders().is_empty());
    assert_eq!(executor.usable_capital(), Decimal::ZERO);
}

// ======================================================================
// Buy cap and the cancel cascade
// ======================================================================

#[test]
fn test_buy_cap_cascade_exactly_once() {
    let codes = ["600001", "600002", "600003", "600004"];
    let candidates = codes.iter().map(|c| candidate(c)).collect();
    let (executor, broker) = setup(candidates, vec![]);
    for code in &codes {
        broker.subscribe(SecurityCode::new(*code), QuoteChannel::Candidate);
    }
    broker.set_capital(dec!(100000));

    let mut cascade = executor.take_cascade_queue().unwrap();

    // All four become buyable before any fill arrives.
    for code in &codes {
        executor.on_quotes(
            QuoteChannel::Candidate,
            &[quote(code, dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
        );
    }
    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 4);

    // A zero-volume execution report is not a fill.
    broker.fill(orders[0].id, orders[0].price, 0);
    assert_eq!(executor.bought_count(), 0);

    // Three fills close the cap. The snapshot is queued exactly once.
    for order in &orders[..3] {
        broker.fill(order.id, order.price, order.volume);
    }
    assert_eq!(executor.bought_count(), 3);

    let cancel = cascade.try_recv().unwrap();
    let bought: HashSet<_> = codes[..3].iter().map(|c| SecurityCode::new(*c)).collect();
    assert_eq!(cancel.bought, bought);
    assert!(cascade.try_recv().is_err());

    // A second partial fill on a bought code never re-queues the cascade.
    broker.fill(orders[0].id, orders[0].price, 100);
    assert!(cascade.try_recv().is_err());

    // Applying the snapshot withdraws only the losing buy order.
    executor.apply_cascade(cancel);
    let withdrawn = broker.unregistered_orders();
    assert_eq!(withdrawn.len(), 1);
    assert_eq!(withdrawn[0].id, orders[3].id);

    let loser = executor
        .runtimes()
        .into_iter()
        .find(|r| r.code.as_str() == "600004")
        .unwrap();
    assert!(!loser.has_live_buy());
}

#[tokio::test]
async fn test_cascade_queue_drains_on_shutdown() {
    let codes = ["600001", "600002", "600003", "600004"];
    let candidates = codes.iter().map(|c| candidate(c)).collect();
    let (executor, broker) = setup(candidates, vec![]);
    for code in &codes {
        broker.subscribe(SecurityCode::new(*code), QuoteChannel::Candidate);
    }
    broker.set_capital(dec!(100000));

    let worker = executor.spawn_cascade_worker();
    assert!(worker.is_some());

    for code in &codes {
        executor.on_quotes(
            QuoteChannel::Candidate,
            &[quote(code, dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
        );
    }
    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 4);

    // Close the cap and shut down right away: the queued cancel must
    // still be applied before the worker handle resolves.
    for order in &orders[..3] {
        broker.fill(order.id, order.price, order.volume);
    }
    executor.shutdown_cascade(worker).await;

    let withdrawn = broker.unregistered_orders();
    assert_eq!(withdrawn.len(), 1);
    assert_eq!(withdrawn[0].id, orders[3].id);
    let loser = executor
        .runtimes()
        .into_iter()
        .find(|r| r.code.as_str() == "600004")
        .unwrap();
    assert!(!loser.has_live_buy());
}

#[test]
fn test_admission_full_blocks_new_buys() {
    let codes = ["600001", "600002", "600003", "600005"];
    let candidates = codes.iter().map(|c| candidate(c)).collect();
    let (executor, broker) = setup(candidates, vec![]);
    for code in &codes {
        broker.subscribe(SecurityCode::new(*code), QuoteChannel::Candidate);
    }
    broker.set_capital(dec!(100000));

    // Buy and fill the first three, closing the cap.
    for code in &codes[..3] {
        executor.on_quotes(
            QuoteChannel::Candidate,
            &[quote(code, dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
        );
    }
    for order in &broker.registered_orders() {
        broker.fill(order.id, order.price, order.volume);
    }
    assert_eq!(executor.bought_count(), 3);

    // The late arrival is refused outright and its feed cleaned up.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600005", dec!(10.00), dec!(9.80), dec!(9.90), (10, 5))],
    );
    assert_eq!(broker.registered_orders().len(), 3);
    assert!(!broker.is_subscribed(&SecurityCode::new("600005"), QuoteChannel::Candidate));
}

// ======================================================================
// Protective sweep and stoploss fills
// ======================================================================

#[test]
fn test_stoploss_sweep_idempotent_and_volume_monotone() {
    let (executor, broker) = setup(vec![], vec![holding("600010", 1000, 2)]);
    let in_window = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

    executor.sweep_stoploss(in_window);
    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].kind, OrderKind::Stoploss);
    assert_eq!(orders[0].price, Price::new(dec!(9.50)));
    assert_eq!(orders[0].volume, 1000);

    // Re-sweeping while the order is live publishes nothing new.
    executor.sweep_stoploss(in_window);
    assert_eq!(broker.registered_orders().len(), 1);

    // Partial fills decrement against the same live order; the sweep
    // stays quiet, so one stock never carries two protective orders.
    broker.fill(orders[0].id, orders[0].price, 400);
    executor.sweep_stoploss(in_window);
    assert_eq!(broker.registered_orders().len(), 1);
    assert_eq!(executor.runtimes()[0].remaining, 600);

    broker.fill(orders[0].id, orders[0].price, 300);
    assert_eq!(executor.runtimes()[0].remaining, 300);

    // The flattening fill retires the order with nothing left to protect.
    broker.fill(orders[0].id, orders[0].price, 300);
    let runtime = &executor.runtimes()[0];
    assert_eq!(runtime.remaining, 0);
    assert!(!runtime.has_exit_order());

    executor.sweep_stoploss(in_window);
    assert_eq!(broker.registered_orders().len(), 1);
}

#[test]
fn test_sweep_outside_window_is_noop() {
    let (executor, broker) = setup(vec![], vec![holding("600010", 1000, 2)]);

    executor.sweep_stoploss(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert!(broker.registered_orders().is_empty());
}

#[test]
fn test_overfill_is_rejected_without_state_damage() {
    let (executor, broker) = setup(vec![], vec![holding("600010", 1000, 2)]);
    executor.sweep_stoploss(NaiveTime::from_hms_opt(10, 0, 0).unwrap());

    let order = &broker.registered_orders()[0];
    broker.fill(order.id, order.price, 1500);

    // The violating fill is dropped and the runtime untouched.
    assert_eq!(executor.runtimes()[0].remaining, 1000);
}

// ======================================================================
// Limit-up opportunistic sell
// ======================================================================

#[test]
fn test_limit_up_sell_full_volume() {
    let (executor, broker) = setup(vec![], vec![holding("600020", 800, 3)]);
    broker.subscribe(SecurityCode::new("600020"), QuoteChannel::Holding);

    // Main board, prev close 10.00: up limit 11.00. Opened free of it.
    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600020", dec!(10.00), dec!(10.50), dec!(11.00), (10, 30))],
    );

    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].kind, OrderKind::Sell);
    assert_eq!(orders[0].price, Price::new(dec!(11.00)));
    assert_eq!(orders[0].volume, 800);

    // The holding is retired; the next quote tears down the feed.
    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600020", dec!(10.00), dec!(10.50), dec!(11.00), (10, 31))],
    );
    assert_eq!(broker.registered_orders().len(), 1);
    assert!(!broker.is_subscribed(&SecurityCode::new("600020"), QuoteChannel::Holding));
}

#[test]
fn test_limit_up_sell_skips_gap_locked_open() {
    let (executor, broker) = setup(vec![], vec![holding("600020", 800, 3)]);
    broker.subscribe(SecurityCode::new("600020"), QuoteChannel::Holding);

    // Opened straight at the limit: no exit.
    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600020", dec!(10.00), dec!(11.00), dec!(11.00), (10, 30))],
    );
    assert!(broker.registered_orders().is_empty());
}

#[test]
fn test_limit_up_sell_requires_seasoned_position() {
    let (executor, broker) = setup(vec![], vec![holding("600020", 800, 1)]);
    broker.subscribe(SecurityCode::new("600020"), QuoteChannel::Holding);

    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600020", dec!(10.00), dec!(10.50), dec!(11.00), (10, 30))],
    );
    assert!(broker.registered_orders().is_empty());
}

#[test]
fn test_limit_up_sell_off_limit_price() {
    let (executor, broker) = setup(vec![], vec![holding("600020", 800, 3)]);
    broker.subscribe(SecurityCode::new("600020"), QuoteChannel::Holding);

    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600020", dec!(10.00), dec!(10.50), dec!(10.80), (10, 30))],
    );
    assert!(broker.registered_orders().is_empty());
}

#[test]
fn test_star_board_limit_up_sell() {
    let mut h = holding("688001", 800, 3);
    h.code = SecurityCode::new("688001");
    let (executor, broker) = setup(vec![], vec![h]);
    broker.subscribe(SecurityCode::new("688001"), QuoteChannel::Holding);

    // STAR board: 20% band, up limit 12.00 from prev close 10.00.
    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("688001", dec!(10.00), dec!(10.50), dec!(12.00), (10, 30))],
    );

    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].price, Price::new(dec!(12.00)));
}

#[test]
fn test_inactive_holding_quote_unsubscribes() {
    let (executor, broker) = setup(vec![], vec![]);
    broker.subscribe(SecurityCode::new("600020"), QuoteChannel::Holding);

    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600020", dec!(10.00), dec!(10.50), dec!(11.00), (10, 30))],
    );
    assert!(!broker.is_subscribed(&SecurityCode::new("600020"), QuoteChannel::Holding));
}

// ======================================================================
// Cross-channel and run loop
// ======================================================================

#[test]
fn test_holding_quote_also_drives_candidate_buy() {
    // A code can be both an existing position and a fresh candidate.
    let (executor, broker) = setup(
        vec![candidate("600030")],
        vec![holding("600030", 500, 2)],
    );
    broker.subscribe(SecurityCode::new("600030"), QuoteChannel::Candidate);
    broker.subscribe(SecurityCode::new("600030"), QuoteChannel::Holding);

    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600030", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );

    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].kind, OrderKind::Buy);
}

#[test]
fn test_buy_preserves_exit_bookkeeping_on_shared_code() {
    let (executor, broker) = setup(
        vec![candidate("600030")],
        vec![holding("600030", 500, 2)],
    );
    broker.subscribe(SecurityCode::new("600030"), QuoteChannel::Candidate);
    broker.subscribe(SecurityCode::new("600030"), QuoteChannel::Holding);
    let in_window = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

    // The existing position stops out in full before the buy fires.
    executor.sweep_stoploss(in_window);
    let stop = broker.registered_orders()[0].clone();
    assert_eq!(stop.volume, 500);
    broker.fill(stop.id, stop.price, 500);
    assert_eq!(executor.runtimes()[0].remaining, 0);

    // The buy on the same code attaches its order to the existing
    // runtime without resetting the exit volumes.
    executor.on_quotes(
        QuoteChannel::Holding,
        &[quote("600030", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );
    let orders = broker.registered_orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].kind, OrderKind::Buy);
    let runtime = &executor.runtimes()[0];
    assert!(runtime.has_live_buy());
    assert_eq!(runtime.remaining, 0);

    // The flat position never gets a buy-sized protective order.
    executor.sweep_stoploss(in_window);
    assert_eq!(broker.registered_orders().len(), 2);
}

#[test]
fn test_quote_errors_are_dropped() {
    let (executor, broker) = setup(vec![candidate("600000")], vec![]);
    broker.subscribe(SecurityCode::new("600000"), QuoteChannel::Candidate);

    executor.on_quotes(
        QuoteChannel::Candidate,
        &[QuoteResult::err(
            SecurityCode::new("600000"),
            "feed timeout",
        )],
    );
    assert!(broker.registered_orders().is_empty());
    // The candidate is untouched and still actionable.
    executor.on_quotes(
        QuoteChannel::Candidate,
        &[quote("600000", dec!(10.00), dec!(9.80), dec!(9.90), (10, 0))],
    );
    assert_eq!(broker.registered_orders().len(), 1);
}

#[tokio::test]
async fn test_run_with_empty_universe_returns_immediately() {
    let (executor, _broker) = setup(vec![], vec![]);
    assert!(executor.run().await.is_ok());
}
