//! # Read Cache
//!
//! Short-lived copies of the four list/summary reads the UI makes on every
//! screen refresh.
//!
//! ## Lifecycle of a Slot
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   empty ──fill(v, t0)──► fresh ──(now - t0 >= ttl)──► stale             │
//! │     ▲                      │                            │               │
//! │     └──── invalidate ──────┴────────── invalidate ──────┘               │
//! │                                                                         │
//! │   get(now) returns the value only while fresh.                          │
//! │   A miss is refilled by the caller while it still holds the store       │
//! │   lock, so a fill can never race a write's invalidation.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Time is passed in explicitly so expiry is testable without sleeping.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use libris_core::{Book, LoanRecord, Statistics, Student};

/// The cached views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    Students,
    Books,
    Transactions,
    Statistics,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 4] = [
        CacheCategory::Students,
        CacheCategory::Books,
        CacheCategory::Transactions,
        CacheCategory::Statistics,
    ];
}

/// One cached value and when it was computed.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    entry: Option<(T, Instant)>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot { entry: None }
    }
}

impl<T: Clone> Slot<T> {
    /// The value if it was computed less than `ttl` before `now`.
    pub fn get(&self, now: Instant, ttl: Duration) -> Option<T> {
        match &self.entry {
            Some((value, computed_at)) if now.saturating_duration_since(*computed_at) < ttl => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    pub fn fill(&mut self, value: T, now: Instant) {
        self.entry = Some((value, now));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// The four slots and their shared TTL.
#[derive(Debug, Clone)]
pub struct ReadCache {
    ttl: Duration,
    pub students: Slot<Vec<Student>>,
    pub books: Slot<Vec<Book>>,
    pub transactions: Slot<Vec<LoanRecord>>,
    pub statistics: Slot<Statistics>,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        ReadCache {
            ttl,
            students: Slot::default(),
            books: Slot::default(),
            transactions: Slot::default(),
            statistics: Slot::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Clears the listed slots.
    pub fn invalidate(&mut self, categories: &[CacheCategory]) {
        for category in categories {
            match category {
                CacheCategory::Students => self.students.clear(),
                CacheCategory::Books => self.books.clear(),
                CacheCategory::Transactions => self.transactions.clear(),
                CacheCategory::Statistics => self.statistics.clear(),
            }
        }
    }

    pub fn invalidate_all(&mut self) {
        self.invalidate(&CacheCategory::ALL);
    }
}

/// Thread-safe wrapper shared by all commands.
///
/// ## Usage
/// ```rust,ignore
/// let hit = cache.with_cache(|c| c.books.get(Instant::now(), c.ttl()));
/// ```
#[derive(Debug)]
pub struct CacheState {
    inner: Mutex<ReadCache>,
}

impl CacheState {
    pub fn new(ttl: Duration) -> Self {
        CacheState {
            inner: Mutex::new(ReadCache::new(ttl)),
        }
    }

    /// Executes a function with exclusive access to the cache.
    ///
    /// Every closure is a handful of field operations, so a poisoned lock
    /// still holds consistent data and is recovered.
    pub fn with_cache<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ReadCache) -> R,
    {
        let mut cache = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut cache)
    }

    pub fn students(&self) -> Option<Vec<Student>> {
        self.with_cache(|c| c.students.get(Instant::now(), c.ttl))
    }

    pub fn books(&self) -> Option<Vec<Book>> {
        self.with_cache(|c| c.books.get(Instant::now(), c.ttl))
    }

    pub fn transactions(&self) -> Option<Vec<LoanRecord>> {
        self.with_cache(|c| c.transactions.get(Instant::now(), c.ttl))
    }

    pub fn statistics(&self) -> Option<Statistics> {
        self.with_cache(|c| c.statistics.get(Instant::now(), c.ttl))
    }

    pub fn store_students(&self, students: Vec<Student>) {
        self.with_cache(|c| c.students.fill(students, Instant::now()));
    }

    pub fn store_books(&self, books: Vec<Book>) {
        self.with_cache(|c| c.books.fill(books, Instant::now()));
    }

    pub fn store_transactions(&self, records: Vec<LoanRecord>) {
        self.with_cache(|c| c.transactions.fill(records, Instant::now()));
    }

    pub fn store_statistics(&self, stats: Statistics) {
        self.with_cache(|c| c.statistics.fill(stats, Instant::now()));
    }

    pub fn invalidate(&self, categories: &[CacheCategory]) {
        self.with_cache(|c| c.invalidate(categories));
    }

    pub fn invalidate_all(&self) {
        self.with_cache(ReadCache::invalidate_all);
    }
}
