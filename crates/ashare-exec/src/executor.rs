//! The execution coordinator.
//!
//! Owns the run loop and the shared state: the active candidate/holding
//! indexes and the order runtime book behind one reader-writer lock, the
//! admission set and the capital scalar behind their own locks.
//!
//! Lock ordering is absolute: the registry (state) lock may briefly take
//! the admission or capital lock, never the reverse. The cap-closing
//! cascade cancel crosses the two domains, so it travels as a snapshot
//! through a worker queue and acquires only the registry lock, on a task
//! that is never a router callback stack.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveTime};
use parking_lot::{Mutex, RwLock};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use ashare_broker::{
    CapitalQuery, FillSink, OrderRouter, QuoteChannel, QuoteFeed, QuoteSink,
};
use ashare_core::{
    limit_up_price, OrderKind, OrderTicket, Price, QuoteResult, QuoteSnapshot, SecurityCode,
    PRICE_DECIMALS,
};

use crate::admission::{AdmissionController, FillAdmission, DEFAULT_BUY_CAP};
use crate::capital::CapitalTracker;
use crate::error::ExecError;
use crate::registry::{OrderRuntime, RuntimeBook};
use crate::stocks::{Candidate, Holding, OpenOutcome};
use crate::windows::{self, SessionWindows};

/// A buy order must be backed by at least this share of allotted capital.
const CAPITAL_RESERVE_RATIO: Decimal = dec!(0.9);

/// Price tolerance when comparing against the daily up limit.
const UP_LIMIT_EPSILON: Decimal = dec!(0.001);

/// Executor construction parameters.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// The six session windows.
    pub windows: SessionWindows,
    /// The trading day the candidate universe was built for.
    pub trading_day: NaiveDate,
    /// Concurrent-buy cap.
    pub buy_cap: usize,
}

impl ExecutorConfig {
    /// Default windows and cap for a given trading day.
    #[must_use]
    pub fn for_day(trading_day: NaiveDate) -> Self {
        Self {
            windows: SessionWindows::default(),
            trading_day,
            buy_cap: DEFAULT_BUY_CAP,
        }
    }
}

/// Cap-closing cascade request: cancel every live buy order whose
/// candidate is not in the bought snapshot.
#[derive(Debug)]
pub struct CascadeCancel {
    /// Snapshot of the full bought set at the instant the cap closed.
    pub bought: HashSet<SecurityCode>,
}

/// State guarded by the executor's single reader-writer lock.
struct ExecState {
    /// Active buy candidates. Membership is the authority for "still
    /// actionable"; entries leave when disqualified or decided.
    candidates: HashMap<SecurityCode, Candidate>,
    /// Active holdings. Entries leave only on a full exit.
    holdings: HashMap<SecurityCode, Holding>,
    /// Order runtime book.
    book: RuntimeBook,
}

/// Top-level orchestrator. See the crate docs for the concurrency model.
pub struct Executor {
    windows: SessionWindows,
    trading_day: NaiveDate,
    state: RwLock<ExecState>,
    admission: AdmissionController,
    capital: CapitalTracker,
    feed: Arc<dyn QuoteFeed>,
    router: Arc<dyn OrderRouter>,
    cascade_tx: Mutex<Option<mpsc::UnboundedSender<CascadeCancel>>>,
    cascade_rx: Mutex<Option<mpsc::UnboundedReceiver<CascadeCancel>>>,
}

impl Executor {
    pub fn new(
        config: ExecutorConfig,
        candidates: Vec<Candidate>,
        holdings: Vec<Holding>,
        feed: Arc<dyn QuoteFeed>,
        router: Arc<dyn OrderRouter>,
        capital: Arc<dyn CapitalQuery>,
    ) -> Self {
        let candidates: HashMap<_, _> = candidates
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();
        let holdings: HashMap<_, _> = holdings
            .into_iter()
            .map(|h| (h.code.clone(), h))
            .collect();

        debug!(
            candidates = ?candidates.keys().collect::<Vec<_>>(),
            holdings = ?holdings.keys().collect::<Vec<_>>(),
            "executor loaded universe"
        );

        let (cascade_tx, cascade_rx) = mpsc::unbounded_channel();

        Self {
            windows: config.windows,
            trading_day: config.trading_day,
            state: RwLock::new(ExecState {
                candidates,
                holdings,
                book: RuntimeBook::new(),
            }),
            admission: AdmissionController::new(config.buy_cap),
            capital: CapitalTracker::new(capital),
            feed,
            router,
            cascade_tx: Mutex::new(Some(cascade_tx)),
            cascade_rx: Mutex::new(Some(cascade_rx)),
        }
    }

    /// Run until the execute window closes.
    ///
    /// Waits for the run window (1-second polling; fails if already past),
    /// primes capital, subscribes both universes, then drives the
    /// protective sweep once per second.
    pub async fn run(self: Arc<Self>) -> Result<(), ExecError> {
        let (candidate_codes, holding_codes) = {
            let state = self.state.read();
            (
                state.candidates.keys().cloned().collect::<Vec<_>>(),
                state.holdings.keys().cloned().collect::<Vec<_>>(),
            )
        };

        if candidate_codes.is_empty() && holding_codes.is_empty() {
            info!("empty universe, nothing to execute");
            return Ok(());
        }

        if !windows::wait_for(&self.windows.run).await {
            error!(window = %self.windows.run, "run window already closed");
            return Err(ExecError::RunWindowMissed);
        }

        let cascade_worker = self.spawn_cascade_worker();

        self.capital.refresh();

        for code in &candidate_codes {
            self.feed.subscribe(code.clone(), QuoteChannel::Candidate);
        }
        info!(codes = ?candidate_codes, "subscribed candidate quotes");

        for code in &holding_codes {
            self.feed.subscribe(code.clone(), QuoteChannel::Holding);
        }
        info!(codes = ?holding_codes, "subscribed holding quotes");

        loop {
            let now = Local::now().time();
            if !self.windows.execute.contains(now) {
                break;
            }

            self.sweep_stoploss(now);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        info!("execute window closed, run loop finished");

        self.shutdown_cascade(cascade_worker).await;
        Ok(())
    }

    /// Close the cascade queue and wait for the worker to finish.
    ///
    /// Closing the sender ends the worker's receive loop only after every
    /// queued cancel has been applied, so a cap that closed just before
    /// shutdown still gets its pending buy orders withdrawn.
    pub async fn shutdown_cascade(&self, worker: Option<JoinHandle<()>>) {
        self.cascade_tx.lock().take();
        if let Some(worker) = worker {
            if worker.await.is_err() {
                error!("cascade worker panicked during shutdown");
            }
        }
    }

    /// Spawn the cascade-cancel worker, consuming the queue receiver.
    ///
    /// Returns `None` when the queue was already taken (tests drive it
    /// through `take_cascade_queue` / `apply_cascade` instead).
    pub fn spawn_cascade_worker(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut rx = self.cascade_rx.lock().take()?;
        let executor = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            while let Some(cancel) = rx.recv().await {
                let Some(executor) = executor.upgrade() else {
                    break;
                };
                executor.apply_cascade(cancel);
            }
        }))
    }

    /// Take the cascade queue receiver, for tests that want the cascade
    /// to be observable and deterministic.
    pub fn take_cascade_queue(&self) -> Option<mpsc::UnboundedReceiver<CascadeCancel>> {
        self.cascade_rx.lock().take()
    }

    /// Phase 2 of the buy-fill protocol: under the registry lock only,
    /// withdraw every live buy order whose candidate missed the cap.
    pub fn apply_cascade(&self, cancel: CascadeCancel) {
        let mut state = self.state.write();

        for runtime in state.book.values_mut() {
            if runtime.buy_order.is_none() || cancel.bought.contains(&runtime.code) {
                continue;
            }
            if let Some(order) = runtime.buy_order.take() {
                info!(order = %order, "buy cap reached, withdrawing pending buy order");
                self.router.unregister_order(&order);
            }
        }
    }

    /// Cloned snapshot of all order runtimes (read lock, introspection only).
    #[must_use]
    pub fn runtimes(&self) -> Vec<OrderRuntime> {
        self.state.read().book.snapshot()
    }

    /// Last refreshed usable capital.
    #[must_use]
    pub fn usable_capital(&self) -> Decimal {
        self.capital.current()
    }

    /// Number of candidates recorded as bought.
    #[must_use]
    pub fn bought_count(&self) -> usize {
        self.admission.bought_count()
    }

    // ------------------------------------------------------------------
    // Buy decision engine
    // ------------------------------------------------------------------

    /// Per-quote buy decision for a candidate. The whole sequence runs
    /// under the exclusive state lock, serialized against the protective
    /// sweep and every other quote callback.
    fn try_buy(&self, quote: &QuoteSnapshot) {
        let mut state = self.state.write();
        let st = &mut *state;

        if !self.windows.accept_quote.contains(quote.timestamp.time()) {
            return;
        }

        let Some(candidate) = st.candidates.get_mut(&quote.code) else {
            // Another thread already finalized this candidate.
            self.unsubscribe_candidate(&quote.code);
            return;
        };

        if st.book.has_live_buy(&quote.code) {
            return;
        }

        if self.admission.is_full() {
            // No more buys for the rest of the run.
            self.unsubscribe_candidate(&quote.code);
            return;
        }

        if candidate.buy_date != self.trading_day {
            warn!(
                code = %quote.code,
                name = %candidate.name,
                buy_date = %candidate.buy_date,
                "buy date is not today, dropping candidate"
            );
            st.candidates.remove(&quote.code);
            return;
        }

        match candidate.try_discover_open(quote, PRICE_DECIMALS) {
            OpenOutcome::Rejected { low, high } => {
                info!(
                    code = %quote.code,
                    name = %candidate.name,
                    open = %quote.today_open,
                    range = %format!("[{low}, {high}]"),
                    stoploss = %candidate.stoploss_price,
                    "open price out of range, dropping candidate"
                );
                st.candidates.remove(&quote.code);
                return;
            }
            OpenOutcome::Recorded | OpenOutcome::AlreadyRecorded => {}
        }

        // Only buy once the price has risen above today's open.
        if quote.last > quote.today_open {
            candidate.mark_buyable();
        }

        if candidate.is_buyable()
            && self.windows.publish_buy.contains(quote.timestamp.time())
        {
            self.request_buy_order(candidate, &mut st.book);

            // The decision is final whether or not an order came out.
            self.unsubscribe_candidate(&quote.code);
            st.candidates.remove(&quote.code);
        }
    }

    /// Request a buy order for a buyable candidate. Idempotent; a missed
    /// capital check is final because the caller unsubscribes either way.
    ///
    /// Runs under the state write lock held by `try_buy`.
    fn request_buy_order(&self, candidate: &Candidate, book: &mut RuntimeBook) {
        if book.has_live_buy(&candidate.code) {
            return;
        }

        let Some(open) = candidate.open() else {
            // Buyable implies discovery ran; nothing to size otherwise.
            return;
        };

        self.capital.refresh();
        let usable = self.capital.current();

        if usable < candidate.capital * CAPITAL_RESERVE_RATIO {
            info!(
                code = %candidate.code,
                name = %candidate.name,
                %usable,
                allotted = %candidate.capital,
                "insufficient capital, skipping buy"
            );
            return;
        }

        let budget = candidate.capital.min(usable);
        let volume = (budget / open.max_buy.inner())
            .floor()
            .to_u64()
            .unwrap_or(0);

        if volume == 0 {
            warn!(
                code = %candidate.code,
                %budget,
                max_buy = %open.max_buy,
                "sized volume is zero, skipping buy"
            );
            return;
        }

        let ticket = OrderTicket::buy(
            candidate.code.clone(),
            candidate.name.clone(),
            open.min_buy,
            open.max_buy,
            volume,
        );

        // A runtime left behind by exit bookkeeping on the same code keeps
        // its volumes; the buy only attaches its order. A fresh runtime
        // starts at the sized volume.
        let runtime = book.ensure(&candidate.code, &candidate.name, volume);
        runtime.buy_order = Some(ticket.clone());

        info!(order = %ticket, "registered buy order");
        self.router.register_order(ticket);
    }

    /// Phase 1 of the buy-fill protocol: admission decision under the
    /// admission lock only; the cap-closing snapshot is queued for the
    /// cascade worker, never acted on inline.
    fn on_buy_filled(&self, ticket: &OrderTicket, price: Price, volume: u64) {
        info!(order = %ticket, %price, volume, "buy order filled");

        if volume == 0 {
            return;
        }

        if let FillAdmission::CapReached(bought) = self.admission.record_fill(ticket.code.clone())
        {
            let queued = self
                .cascade_tx
                .lock()
                .as_ref()
                .is_some_and(|tx| tx.send(CascadeCancel { bought }).is_ok());
            if !queued {
                error!("cascade queue closed, pending buy orders not withdrawn");
            }
        }
    }

    // ------------------------------------------------------------------
    // Protective/exit decision engine
    // ------------------------------------------------------------------

    /// Ensure every active holding has a live protective order.
    ///
    /// Idempotent invariant-restoring pass: a holding with no live
    /// exit-side order gets a stoploss sized to its unfilled remainder
    /// (the full held volume on first publication). While an order is
    /// live, or once the position is flat, the sweep leaves the stock
    /// alone, so there is at most one protective order per stock.
    pub fn sweep_stoploss(&self, now: NaiveTime) {
        if !self.windows.publish_stoploss.contains(now) {
            return;
        }

        let mut state = self.state.write();
        let st = &mut *state;

        for (code, holding) in &st.holdings {
            // A fresh runtime starts at the full held volume; an existing
            // one carries whatever the stoploss fills left behind.
            let runtime = st.book.ensure(code, &holding.name, holding.volume);

            if runtime.has_exit_order() {
                continue;
            }
            if runtime.remaining == 0 {
                // Fully exited; nothing left to protect.
                continue;
            }

            let ticket = OrderTicket::stoploss(
                code.clone(),
                holding.name.clone(),
                holding.stoploss_price,
                runtime.remaining,
            );
            runtime.stoploss_order = Some(ticket.clone());

            info!(order = %ticket, "published stoploss order");
            self.router.register_order(ticket);
        }
    }

    fn on_stoploss_filled(&self, ticket: &OrderTicket, price: Price, volume: u64) {
        info!(order = %ticket, %price, volume, "stoploss order filled");

        if volume == 0 {
            return;
        }

        let mut state = self.state.write();
        let st = &mut *state;

        if !st.holdings.contains_key(&ticket.code) {
            error!(
                order = %ticket,
                "stoploss fill for a holding no longer active, ignoring"
            );
            return;
        }

        match st.book.apply_stoploss_fill(ticket, volume) {
            Ok(remaining) => {
                debug!(code = %ticket.code, remaining, "stoploss fill applied");
            }
            Err(e) => {
                // Invariant violation: stop processing this security.
                error!(error = %e, order = %ticket, "stoploss fill rejected");
            }
        }
    }

    /// Holding-channel quote handler: route to the buy engine when the
    /// code is also a live candidate, then evaluate the opportunistic
    /// limit-up sell.
    fn on_holding_quote(&self, quote: &QuoteSnapshot) {
        let (holding_active, candidate_active) = {
            let state = self.state.read();
            (
                state.holdings.contains_key(&quote.code),
                state.candidates.contains_key(&quote.code),
            )
        };

        if !holding_active {
            self.feed.unsubscribe(&quote.code, QuoteChannel::Holding);
            info!(code = %quote.code, "holding no longer active, unsubscribed");
            return;
        }

        if candidate_active {
            self.try_buy(quote);
        }

        self.try_limit_up_sell(quote);
    }

    /// Opportunistic sell: when the price sits at the daily up limit, the
    /// day did not open gap-locked at the limit, and the position is older
    /// than one day, sell the full volume at the limit and retire the
    /// holding.
    fn try_limit_up_sell(&self, quote: &QuoteSnapshot) {
        let mut state = self.state.write();
        let st = &mut *state;

        let Some(holding) = st.holdings.get(&quote.code) else {
            return;
        };

        let up_limit = limit_up_price(&quote.code, &quote.name, quote.prev_close, PRICE_DECIMALS);

        let at_limit = quote.last.abs_diff(up_limit) < UP_LIMIT_EPSILON;
        let opened_at_limit = quote.today_open.abs_diff(up_limit) < UP_LIMIT_EPSILON;

        if at_limit && !opened_at_limit && holding.hold_days > 1 {
            let name = holding.name.clone();
            let volume = holding.volume;

            let ticket = OrderTicket::sell(quote.code.clone(), name.clone(), up_limit, volume);

            let runtime = st.book.ensure(&quote.code, &name, volume);
            runtime.sell_order = Some(ticket.clone());

            info!(order = %ticket, %up_limit, "sell on up limit");
            self.router.register_order(ticket);

            // Terminal for the holding; the protective order stays live.
            st.holdings.remove(&quote.code);
            return;
        }

        if !self.windows.publish_sell.contains(quote.timestamp.time()) {
            return;
        }

        // General time-windowed sell evaluation: not implemented. The
        // limit-up exit above is the only sell trigger.
    }

    fn on_sell_filled(&self, ticket: &OrderTicket, price: Price, volume: u64) {
        info!(order = %ticket, %price, volume, "sell order filled");
    }

    fn unsubscribe_candidate(&self, code: &SecurityCode) {
        self.feed.unsubscribe(code, QuoteChannel::Candidate);
        info!(%code, "unsubscribed candidate quotes");
    }
}

impl QuoteSink for Executor {
    fn on_quotes(&self, channel: QuoteChannel, batch: &[QuoteResult]) {
        for result in batch {
            let Some(quote) = result.valid_quote() else {
                // Erroneous entries are dropped without retry.
                debug!(code = %result.code, error = ?result.error, "dropping quote error");
                continue;
            };

            match channel {
                QuoteChannel::Candidate => self.try_buy(quote),
                QuoteChannel::Holding => self.on_holding_quote(quote),
            }
        }
    }
}

impl FillSink for Executor {
    fn on_fill(&self, ticket: &OrderTicket, price: Price, volume: u64) {
        match ticket.kind {
            OrderKind::Buy => self.on_buy_filled(ticket, price, volume),
            OrderKind::Stoploss => self.on_stoploss_filled(ticket, price, volume),
            OrderKind::Sell => self.on_sell_filled(ticket, price, volume),
        }
    }
}
