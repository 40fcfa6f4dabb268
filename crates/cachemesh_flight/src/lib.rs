// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Coalesces concurrent async loads for the same key into one execution.
//!
//! [`Flight`] deduplicates in-flight work: when several tasks request the
//! same key concurrently, the first caller (the leader) runs the supplied
//! closure while the rest (followers) wait and receive a clone of the
//! leader's result. Calls for different keys never block each other, and
//! once a result has been delivered the key's slot is freed, so a later call
//! starts a fresh execution.
//!
//! The usual cargo is a `Result` with a cloneable error, which hands the
//! leader's failure to every waiter of that episode without caching it:
//!
//! ```
//! use cachemesh_flight::Flight;
//!
//! # futures::executor::block_on(async {
//! let flight: Flight<String, Result<String, String>> = Flight::new();
//!
//! let value = flight
//!     .work("user:42".to_string(), || async { Ok("from the origin".to_string()) })
//!     .await;
//! assert_eq!(value.as_deref(), Ok("from the origin"));
//! # });
//! ```
//!
//! # Guarantees
//!
//! - For one episode of a key, the closure runs exactly once; every caller
//!   of that episode observes an identical result.
//! - The result is published before any follower wakes.
//! - No result is retained beyond the in-flight window.
//!
//! If the leader's future is dropped mid-flight, a waiting follower promotes
//! itself and runs its own closure; an episode only fails to produce a value
//! when every caller has walked away.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicUsize, Ordering},
    },
};

use event_listener::Event;
use parking_lot::Mutex;

type CallMap<K, T> = Arc<Mutex<HashMap<K, CallSlot<T>>>>;

/// Per-key coalescer for concurrent async work.
pub struct Flight<K, T> {
    calls: CallMap<K, T>,
}

impl<K, T> Default for Flight<K, T> {
    fn default() -> Self {
        Self { calls: Arc::default() }
    }
}

impl<K, T> std::fmt::Debug for Flight<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flight").finish_non_exhaustive()
    }
}

/// State shared between the leader and the followers of one episode.
struct Shared<T> {
    /// Written once by the leader, then read lock-free by followers.
    result: OnceLock<T>,
    /// Wakes followers when the result lands or the leader disappears.
    ready: Event,
    /// Number of live leaders; 0 with no result means followers must
    /// promote.
    leaders: AtomicUsize,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            result: OnceLock::new(),
            ready: Event::new(),
            leaders: AtomicUsize::new(0),
        }
    }
}

/// Map entry for an in-flight key. Holds the episode weakly so abandoned
/// episodes (every caller dropped) are detectable and replaceable.
struct CallSlot<T> {
    shared: Weak<Shared<T>>,
}

/// Decrements the leader count on drop so followers notice a leader whose
/// future was dropped before publishing.
struct LeaderGuard<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> LeaderGuard<T> {
    /// Claims episode leadership if nobody holds it.
    fn try_claim(shared: &Arc<Shared<T>>) -> Option<Self> {
        shared
            .leaders
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                shared: Some(Arc::clone(shared)),
            })
    }

    /// Consumes the guard without releasing leadership; called once the
    /// result is published and the count no longer matters.
    fn disarm(mut self) {
        self.shared.take();
    }
}

impl<T> Drop for LeaderGuard<T> {
    fn drop(&mut self) {
        if let Some(shared) = &self.shared {
            shared.leaders.fetch_sub(1, Ordering::AcqRel);
            // Leader abandoned without a result: wake one follower so it can
            // promote itself.
            if shared.result.get().is_none() {
                shared.ready.notify(1);
            }
        }
    }
}

/// The caller's role in an episode, fixed while the call map lock is held.
enum Role<T, F> {
    Leader { func: F, guard: LeaderGuard<T> },
    /// Followers keep their closure in case they must promote.
    Follower { func: F },
}

/// A caller attached to an episode; produced under the call map lock so the
/// readiness machinery exists before the entry is visible to anyone else.
struct Waiter<K, T, F> {
    role: Role<T, F>,
    shared: Arc<Shared<T>>,
    key: K,
    calls: CallMap<K, T>,
}

impl<K, T, F, Fut> Waiter<K, T, F>
where
    K: Hash + Eq,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
    T: Clone,
{
    async fn wait(self) -> T {
        let Self {
            role,
            shared,
            key,
            calls,
        } = self;
        match role {
            Role::Leader { func, guard } => Self::lead(shared, key, calls, func, guard).await,
            Role::Follower { func } => Self::follow(shared, key, calls, func).await,
        }
    }

    async fn lead(shared: Arc<Shared<T>>, key: K, calls: CallMap<K, T>, func: F, guard: LeaderGuard<T>) -> T {
        // A promoted leader may find the original already published.
        if let Some(result) = shared.result.get() {
            guard.disarm();
            return result.clone();
        }

        let value = func().await;

        if shared.result.set(value.clone()).is_ok() {
            // Publish, then free the key so the next call starts fresh.
            calls.lock().remove(&key);
        }
        shared.ready.notify(usize::MAX);
        guard.disarm();

        shared.result.get().cloned().unwrap_or(value)
    }

    async fn follow(shared: Arc<Shared<T>>, key: K, calls: CallMap<K, T>, func: F) -> T {
        loop {
            if let Some(result) = shared.result.get() {
                return result.clone();
            }

            // Listen before re-checking so a publish between the check and
            // the wait cannot be missed.
            let listener = shared.ready.listen();

            if let Some(result) = shared.result.get() {
                return result.clone();
            }

            if shared.leaders.load(Ordering::Acquire) == 0 {
                match LeaderGuard::try_claim(&shared) {
                    Some(guard) => return Self::lead(shared, key, calls, func, guard).await,
                    // Lost the promotion race; the winner is leading now.
                    None => continue,
                }
            }

            listener.await;
        }
    }
}

impl<K, T> Flight<K, T>
where
    K: Hash + Eq + Clone,
{
    /// Creates an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `func` for `key`, or joins the in-flight execution for the same
    /// key and returns a clone of its result.
    ///
    /// The first concurrent caller executes `func`; the rest suspend until
    /// the result is published. After delivery the key is vacant again and
    /// the next call executes afresh.
    pub fn work<F, Fut>(&self, key: K, func: F) -> impl Future<Output = T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        T: Clone,
    {
        let calls = Arc::clone(&self.calls);
        let mut map = self.calls.lock();

        let waiter = match map.get_mut(&key) {
            Some(slot) => match slot.shared.upgrade() {
                // Live episode: lead it if its leader vanished, else follow.
                Some(shared) => {
                    let role = match LeaderGuard::try_claim(&shared) {
                        Some(guard) => Role::Leader { func, guard },
                        None => Role::Follower { func },
                    };
                    Waiter {
                        role,
                        shared,
                        key,
                        calls,
                    }
                }
                // Every caller of the old episode dropped; start a new one.
                None => {
                    let shared = Arc::new(Shared::new());
                    slot.shared = Arc::downgrade(&shared);
                    let guard = LeaderGuard::try_claim(&shared).expect("fresh episode has no leader");
                    Waiter {
                        role: Role::Leader { func, guard },
                        shared,
                        key,
                        calls,
                    }
                }
            },
            None => {
                let shared = Arc::new(Shared::new());
                map.insert(
                    key.clone(),
                    CallSlot {
                        shared: Arc::downgrade(&shared),
                    },
                );
                let guard = LeaderGuard::try_claim(&shared).expect("fresh episode has no leader");
                Waiter {
                    role: Role::Leader { func, guard },
                    shared,
                    key,
                    calls,
                }
            }
        };
        drop(map);

        waiter.wait()
    }
}
