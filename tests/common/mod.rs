//! Shared doubles for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use metrics::{Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use serde_json::{json, Value};

use wager_relay::blockchain::{
    ChainConfig, ChainError, ChainResult, PayoutCall, RpcTransport, Signer, SuiClient, WagerOperations,
};
use wager_relay::game::ChainGateway;
use wager_relay::storage::{GameStore, PayoutRecord, StakeRecord, StoreError, StoreResult, StoreStats};

/// RFC 8032 test vector 1 secret key.
pub const TEST_SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
pub const PACKAGE_ID: &str = "0x5a1e";
pub const POOL_ID: &str = "0x9001";
pub const MODULE: &str = "wager_pool";
pub const UNSIGNED_TX: &[u8] = b"unsigned-transaction-bytes";

pub const ADDR_A: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
pub const ADDR_B: &str = "0x2222222222222222222222222222222222222222222222222222222222222222";
pub const ADDR_C: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";

/// Transport answering from per-method queues.
///
/// The last queued response for a method is repeated once the queue is
/// down to one entry. Every call is recorded in order.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<ChainResult<Value>>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: &str, result: Value) -> &Self {
        self.push(method, Ok(result))
    }

    pub fn fail(&self, method: &str, error: ChainError) -> &Self {
        self.push(method, Err(error))
    }

    fn push(&self, method: &str, result: ChainResult<Value>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(m, _)| m).collect()
    }

    pub fn params_of(&self, method: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> ChainResult<Value> {
        self.calls.lock().unwrap().push((method.to_string(), params));

        let mut responses = self.responses.lock().unwrap();
        let queue = match responses.get_mut(method) {
            Some(q) if !q.is_empty() => q,
            _ => return Err(ChainError::Transport(format!("unscripted method {}", method))),
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

pub fn chain_config() -> ChainConfig {
    ChainConfig {
        package_id: PACKAGE_ID.to_string(),
        pool_id: POOL_ID.to_string(),
        module_name: MODULE.to_string(),
        ..ChainConfig::default()
    }
}

pub fn signer() -> Arc<Signer> {
    Arc::new(Signer::from_seed(TEST_SEED).unwrap())
}

pub fn operations(transport: Arc<ScriptedTransport>) -> WagerOperations {
    let client = SuiClient::new(transport);
    WagerOperations::new(client, signer(), &chain_config())
}

pub fn coin_page(coins: &[(&str, u64)], next_cursor: Option<&str>) -> Value {
    let data: Vec<Value> = coins
        .iter()
        .map(|(id, balance)| {
            json!({
                "coinType": "0x2::sui::SUI",
                "coinObjectId": id,
                "version": "1",
                "digest": "coin-digest",
                "balance": balance.to_string(),
            })
        })
        .collect();
    json!({
        "data": data,
        "nextCursor": next_cursor,
        "hasNextPage": next_cursor.is_some(),
    })
}

pub fn tx_bytes() -> Value {
    json!({ "txBytes": STANDARD.encode(UNSIGNED_TX), "gas": [] })
}

pub fn event(name: &str, payload: Value) -> Value {
    json!({
        "type": format!("{}::{}::{}", PACKAGE_ID, MODULE, name),
        "parsedJson": payload,
    })
}

pub fn executed(digest: &str, status: &str, error: Option<&str>, events: Vec<Value>) -> Value {
    let mut status_obj = json!({ "status": status });
    if let Some(e) = error {
        status_obj["error"] = json!(e);
    }
    json!({
        "digest": digest,
        "effects": { "status": status_obj },
        "events": events,
    })
}

/// Store whose every call fails.
pub struct FailingStore;

#[async_trait]
impl GameStore for FailingStore {
    async fn insert_stake(&self, _record: StakeRecord) -> StoreResult<()> {
        Err(StoreError::Unavailable("write rejected".into()))
    }

    async fn insert_payout(&self, _record: PayoutRecord) -> StoreResult<()> {
        Err(StoreError::Unavailable("write rejected".into()))
    }

    async fn recent_stakes(&self, _address: &str, _limit: usize) -> StoreResult<Vec<StakeRecord>> {
        Err(StoreError::Unavailable("read rejected".into()))
    }

    async fn recent_payouts(&self, _address: &str, _limit: usize) -> StoreResult<Vec<PayoutRecord>> {
        Err(StoreError::Unavailable("read rejected".into()))
    }

    async fn update_stake_status(&self, _digest: &str, _status: &str) -> StoreResult<usize> {
        Err(StoreError::Unavailable("write rejected".into()))
    }

    async fn update_payout_status(&self, _digest: &str, _status: &str) -> StoreResult<usize> {
        Err(StoreError::Unavailable("write rejected".into()))
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        Err(StoreError::Unavailable("read rejected".into()))
    }
}

/// Gateway returning fixed results and counting submissions.
pub struct FakeGateway {
    stake_result: ChainResult<String>,
    payout_result: ChainResult<String>,
    healthy: bool,
    delay: Option<Duration>,
    submissions: AtomicUsize,
    last_payout: Mutex<Option<PayoutCall>>,
}

impl FakeGateway {
    pub fn succeeding(digest: &str) -> Self {
        Self {
            stake_result: Ok(digest.to_string()),
            payout_result: Ok(digest.to_string()),
            healthy: true,
            delay: None,
            submissions: AtomicUsize::new(0),
            last_payout: Mutex::new(None),
        }
    }

    pub fn failing(error: ChainError) -> Self {
        Self {
            stake_result: Err(error.clone()),
            payout_result: Err(error),
            healthy: false,
            delay: None,
            submissions: AtomicUsize::new(0),
            last_payout: Mutex::new(None),
        }
    }

    /// Hold every submission for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn last_payout(&self) -> Option<PayoutCall> {
        self.last_payout.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainGateway for FakeGateway {
    async fn stake(&self, _requester_coin_id: &str, _accepter_coin_id: &str, _amount: u64) -> ChainResult<String> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.stake_result.clone()
    }

    async fn pay_winner(&self, call: &PayoutCall) -> ChainResult<String> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        *self.last_payout.lock().unwrap() = Some(call.clone());
        self.pause().await;
        self.payout_result.clone()
    }

    async fn is_healthy(&self) -> bool {
        self.healthy
    }

    fn signer_address(&self) -> &str {
        "0xfake"
    }
}

/// Log lines written by a scoped fmt subscriber.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install as this thread's subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Recorder that sums counters by `name{label=value,...}`.
#[derive(Clone, Default)]
pub struct CounterCapture(Arc<Mutex<HashMap<String, u64>>>);

struct CapturedCounter {
    key: String,
    totals: Arc<Mutex<HashMap<String, u64>>>,
}

impl CounterFn for CapturedCounter {
    fn increment(&self, value: u64) {
        *self.totals.lock().unwrap().entry(self.key.clone()).or_default() += value;
    }

    fn absolute(&self, value: u64) {
        self.totals.lock().unwrap().insert(self.key.clone(), value);
    }
}

impl CounterCapture {
    pub fn get(&self, key: &str) -> u64 {
        self.0.lock().unwrap().get(key).copied().unwrap_or_default()
    }
}

impl Recorder for CounterCapture {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let labels: Vec<String> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        Counter::from_arc(Arc::new(CapturedCounter {
            key: format!("{}{{{}}}", key.name(), labels.join(",")),
            totals: self.0.clone(),
        }))
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
