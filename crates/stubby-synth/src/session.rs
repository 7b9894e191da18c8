//! Per-method synthesis state shared across requests.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHasher};

/// Enumeration state for one method.
///
/// The call counter selects which solution a request gets: the Nth call
/// returns the Nth solution in search order. It is atomic so concurrent
/// requests never share or skip an index.
#[derive(Debug)]
pub struct MethodSession {
    counter: AtomicU64,
    requests: AtomicU64,
    seed: u64,
}

impl MethodSession {
    pub fn new(seed: u64) -> Self {
        Self {
            counter: AtomicU64::new(1),
            requests: AtomicU64::new(0),
            seed,
        }
    }

    /// Claim the next solution index, starting at 1.
    pub fn next_call(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// After the solution space wrapped around: the call that wrapped took
    /// the first solution, so the next one continues from the second.
    pub fn restart(&self) {
        self.counter.store(2, Ordering::SeqCst);
    }

    /// Count a synthesis request and return the new total.
    pub fn record_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn reset(&self) {
        self.counter.store(1, Ordering::SeqCst);
        self.requests.store(0, Ordering::SeqCst);
    }
}

/// Hands out one [`MethodSession`] per method name.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<FxHashMap<String, Arc<MethodSession>>>,
    base_seed: u64,
}

impl SessionRegistry {
    /// `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            sessions: Mutex::new(FxHashMap::default()),
            base_seed: seed.unwrap_or_else(|| rand::rng().random()),
        }
    }

    pub fn session(&self, method: &str) -> Arc<MethodSession> {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get(method) {
            return Arc::clone(session);
        }
        let session = Arc::new(MethodSession::new(self.method_seed(method)));
        sessions.insert(method.to_string(), Arc::clone(&session));
        session
    }

    fn method_seed(&self, method: &str) -> u64 {
        let mut hasher = FxHasher::default();
        method.hash(&mut hasher);
        self.base_seed ^ hasher.finish()
    }

    /// Requests served so far, by method name.
    pub fn request_counts(&self) -> BTreeMap<String, u64> {
        self.sessions
            .lock()
            .iter()
            .map(|(name, session)| (name.clone(), session.request_count()))
            .collect()
    }

    /// Restart enumeration and request counts for every method.
    pub fn reset(&self) {
        for session in self.sessions.lock().values() {
            session.reset();
        }
    }
}
