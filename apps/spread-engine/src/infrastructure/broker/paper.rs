//! Paper Broker
//!
//! In-memory [`BrokerPort`] for dry runs and tests. Quotes can be scripted
//! frame by frame, fills follow a configurable policy, and individual
//! operations can be made to fail on demand.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{
    BrokerError, BrokerOrder, BrokerOrderLeg, BrokerPort, BrokerPosition, InstrumentFields,
    OrderWindow, SpreadOrderRequest,
};
use crate::domain::execution::Quote;
use crate::domain::option_position::{CanonicalLegKey, OptionSymbol};
use crate::domain::reconciliation::OrderStatus;
use crate::domain::shared::BrokerId;

/// When a working paper order fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    /// Orders rest until canceled.
    #[default]
    Never,
    /// Orders fill on the next poll after submission.
    Immediately,
    /// Fill once this many place/replace calls have been made.
    AfterSubmissions(u32),
    /// Credits fill at or below this price; debits at or above it.
    AtPrice(Decimal),
    /// Each order fills this many units on the first poll after it is
    /// submitted and rests with the rest outstanding. Orders no larger
    /// than this fill completely.
    Partial(u32),
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperOperation {
    /// `get_positions`.
    Positions,
    /// `list_orders`.
    ListOrders,
    /// `get_quote` / `get_quotes`.
    Quotes,
    /// `place_order`.
    Place,
    /// `replace_order`.
    Replace,
    /// `cancel_order`.
    Cancel,
    /// `get_account_cash`.
    Cash,
}

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaperCallCounts {
    /// Successful place calls.
    pub placed: u32,
    /// Successful replace calls.
    pub replaced: u32,
    /// Successful cancel calls.
    pub canceled: u32,
    /// Quote requests.
    pub quote_requests: u32,
}

#[derive(Debug, Default)]
struct PaperState {
    positions: HashMap<CanonicalLegKey, (OptionSymbol, Decimal)>,
    orders: Vec<BrokerOrder>,
    requests: HashMap<BrokerId, SpreadOrderRequest>,
    submitted: Vec<SpreadOrderRequest>,
    partially_filled: HashMap<BrokerId, u32>,
    quote_frames: VecDeque<HashMap<CanonicalLegKey, Quote>>,
    cash: Decimal,
    next_id: u64,
    fill_policy: FillPolicy,
    failures: HashMap<PaperOperation, VecDeque<BrokerError>>,
    calls: PaperCallCounts,
}

impl PaperState {
    fn take_failure(&mut self, op: PaperOperation) -> Result<(), BrokerError> {
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn current_quotes(&mut self) -> HashMap<CanonicalLegKey, Quote> {
        let frame = if self.quote_frames.len() > 1 {
            self.quote_frames.pop_front()
        } else {
            self.quote_frames.front().cloned()
        };
        frame.unwrap_or_default()
    }

    fn next_id(&mut self) -> BrokerId {
        self.next_id += 1;
        BrokerId::new(format!("paper-{}", self.next_id))
    }

    fn submissions(&self) -> u32 {
        self.calls.placed + self.calls.replaced
    }

    fn should_fill(&self, request: &SpreadOrderRequest) -> bool {
        match self.fill_policy {
            FillPolicy::Never | FillPolicy::Partial(_) => false,
            FillPolicy::Immediately => true,
            FillPolicy::AfterSubmissions(n) => self.submissions() >= n,
            FillPolicy::AtPrice(level) => {
                if request.structure.side().is_credit() {
                    request.price <= level
                } else {
                    request.price >= level
                }
            }
        }
    }

    /// Fill every working order the policy allows.
    fn settle(&mut self) {
        if let FillPolicy::Partial(units) = self.fill_policy {
            self.settle_partial(units);
            return;
        }

        let fillable: Vec<BrokerId> = self
            .orders
            .iter()
            .filter(|o| o.status.is_working())
            .filter(|o| self.requests.get(&o.id).is_some_and(|r| self.should_fill(r)))
            .map(|o| o.id.clone())
            .collect();

        for id in fillable {
            let Some(request) = self.requests.get(&id).cloned() else {
                continue;
            };
            self.book(&request, request.quantity());
            self.set_status(&id, OrderStatus::Filled);
            tracing::debug!(order_id = %id, price = %request.price, "Paper order filled");
        }
    }

    fn settle_partial(&mut self, units: u32) {
        let untouched: Vec<BrokerId> = self
            .orders
            .iter()
            .filter(|o| o.status.is_working() && !self.partially_filled.contains_key(&o.id))
            .map(|o| o.id.clone())
            .collect();

        for id in untouched {
            let Some(request) = self.requests.get(&id).cloned() else {
                continue;
            };
            let fill = units.min(request.quantity());
            self.book(&request, fill);
            if fill == request.quantity() {
                self.set_status(&id, OrderStatus::Filled);
                tracing::debug!(order_id = %id, price = %request.price, "Paper order filled");
            } else {
                self.partially_filled.insert(id.clone(), fill);
                tracing::debug!(
                    order_id = %id,
                    filled = fill,
                    outstanding = request.quantity() - fill,
                    "Paper order partially filled"
                );
            }
        }
    }

    /// Add `units` of the request's structure to positions.
    fn book(&mut self, request: &SpreadOrderRequest, units: u32) {
        for leg in request.structure.legs() {
            let signed = Decimal::from(leg.role.sign()) * Decimal::from(units);
            let entry = self
                .positions
                .entry(*leg.key())
                .or_insert_with(|| (leg.symbol.clone(), Decimal::ZERO));
            entry.1 += signed;
        }
    }

    fn set_status(&mut self, id: &BrokerId, status: OrderStatus) {
        if let Some(order) = self.orders.iter_mut().find(|o| &o.id == id) {
            order.status = status;
        }
    }

    fn working_order(&self, id: &BrokerId) -> Result<&BrokerOrder, BrokerError> {
        self.orders
            .iter()
            .find(|o| &o.id == id && o.status.is_working())
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: id.to_string(),
            })
    }

    fn open(&mut self, request: &SpreadOrderRequest) -> BrokerId {
        let id = self.next_id();
        self.orders.push(to_broker_order(id.clone(), request));
        self.requests.insert(id.clone(), request.clone());
        id
    }
}

fn to_broker_order(id: BrokerId, request: &SpreadOrderRequest) -> BrokerOrder {
    BrokerOrder {
        id,
        status: OrderStatus::Working,
        legs: request
            .structure
            .legs()
            .iter()
            .map(|leg| BrokerOrderLeg {
                symbol: leg.symbol.to_string(),
                instrument: InstrumentFields::default(),
            })
            .collect(),
        price: Some(request.price),
    }
}

/// In-memory broker.
#[derive(Debug, Default)]
pub struct PaperBroker {
    state: Mutex<PaperState>,
}

impl PaperBroker {
    /// Create an empty paper account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PaperState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the cash balance.
    #[must_use]
    pub fn with_cash(self, cash: Decimal) -> Self {
        self.state().cash = cash;
        self
    }

    /// Set the fill policy.
    #[must_use]
    pub fn with_fill_policy(self, policy: FillPolicy) -> Self {
        self.state().fill_policy = policy;
        self
    }

    /// Replace the fill policy on a shared broker.
    pub fn set_fill_policy(&self, policy: FillPolicy) {
        self.state().fill_policy = policy;
    }

    /// Append a quote frame. Each quote request consumes one frame; the
    /// last frame is reused once the script runs out.
    pub fn push_quotes(&self, frame: HashMap<CanonicalLegKey, Quote>) {
        self.state().quote_frames.push_back(frame);
    }

    /// Add a position (positive long, negative short).
    pub fn add_position(&self, symbol: &OptionSymbol, qty: Decimal) {
        let mut state = self.state();
        let entry = state
            .positions
            .entry(*symbol.key())
            .or_insert_with(|| (symbol.clone(), Decimal::ZERO));
        entry.1 += qty;
    }

    /// Seed a working order as if placed by another run.
    pub fn seed_working_order(&self, request: &SpreadOrderRequest) -> BrokerId {
        self.state().open(request)
    }

    /// Overwrite an order's status, as a broker would while it is in flight.
    pub fn set_order_status(&self, id: &BrokerId, status: OrderStatus) {
        self.state().set_status(id, status);
    }

    /// Make the next call to `op` fail with `error`.
    pub fn fail_next(&self, op: PaperOperation, error: BrokerError) {
        self.state()
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Call counters.
    #[must_use]
    pub fn calls(&self) -> PaperCallCounts {
        self.state().calls
    }

    /// Every request accepted by `place_order` or `replace_order`, in order.
    #[must_use]
    pub fn submitted(&self) -> Vec<SpreadOrderRequest> {
        self.state().submitted.clone()
    }

    /// Every order ever seen.
    #[must_use]
    pub fn orders(&self) -> Vec<BrokerOrder> {
        self.state().orders.clone()
    }

    /// Orders still working.
    #[must_use]
    pub fn working_orders(&self) -> Vec<BrokerOrder> {
        self.state()
            .orders
            .iter()
            .filter(|o| o.status.is_working())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    async fn get_positions(&self) -> Result<Vec<BrokerPosition>, BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::Positions)?;
        state.settle();
        Ok(state
            .positions
            .values()
            .filter(|(_, qty)| !qty.is_zero())
            .map(|(symbol, qty)| BrokerPosition {
                symbol: symbol.to_string(),
                asset_type: "OPTION".to_string(),
                long_quantity: (*qty).max(Decimal::ZERO),
                short_quantity: (-*qty).max(Decimal::ZERO),
                instrument: InstrumentFields::default(),
            })
            .collect())
    }

    async fn list_orders(&self, _window: OrderWindow) -> Result<Vec<BrokerOrder>, BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::ListOrders)?;
        state.settle();
        Ok(state.orders.clone())
    }

    async fn get_quote(&self, symbol: &OptionSymbol) -> Result<Quote, BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::Quotes)?;
        state.calls.quote_requests += 1;
        state
            .current_quotes()
            .get(symbol.key())
            .copied()
            .ok_or_else(|| BrokerError::InvalidResponse {
                message: format!("no quote for {symbol}"),
            })
    }

    async fn get_quotes(
        &self,
        symbols: &[OptionSymbol],
    ) -> Result<HashMap<CanonicalLegKey, Quote>, BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::Quotes)?;
        state.calls.quote_requests += 1;
        let frame = state.current_quotes();
        Ok(symbols
            .iter()
            .filter_map(|s| frame.get(s.key()).map(|q| (*s.key(), *q)))
            .collect())
    }

    async fn place_order(&self, order: &SpreadOrderRequest) -> Result<BrokerId, BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::Place)?;
        state.calls.placed += 1;
        state.submitted.push(order.clone());
        Ok(state.open(order))
    }

    async fn replace_order(
        &self,
        order_id: &BrokerId,
        order: &SpreadOrderRequest,
    ) -> Result<BrokerId, BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::Replace)?;
        state.working_order(order_id)?;
        state.set_status(order_id, OrderStatus::Replaced);
        state.calls.replaced += 1;
        state.submitted.push(order.clone());
        Ok(state.open(order))
    }

    async fn cancel_order(&self, order_id: &BrokerId) -> Result<(), BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::Cancel)?;
        state.working_order(order_id)?;
        state.set_status(order_id, OrderStatus::Canceled);
        state.calls.canceled += 1;
        Ok(())
    }

    async fn get_account_cash(&self) -> Result<Decimal, BrokerError> {
        let mut state = self.state();
        state.take_failure(PaperOperation::Cash)?;
        Ok(state.cash)
    }
}
