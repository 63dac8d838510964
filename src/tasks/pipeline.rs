//! Request scheduling: debounce, coalescing, cache-first reads and
//! sequence-id cancellation.
//!
//! The pipeline is plain state owned by the render loop. It decides whether
//! an intent needs a network call, hands the ones that do to the
//! [`TaskSpawner`], and filters results on the way back: a result is applied
//! only if its sequence id is still the latest issued for its target.
//! In-flight calls are never aborted; superseded results are dropped.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::intent::{Classified, FetchKind, FetchRequest, Intent, RequestTarget};
use super::spawner::{Fetched, TaskSpawner, WorkerMessage, Written};
use crate::api::error::RequestError;
use crate::cache::Caches;

/// What [`Pipeline`] did with an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A request went out with this sequence id.
    Spawned(u64),
    /// An identical request is already in flight.
    Coalesced,
    /// The value is loaded; nothing was sent.
    Cached,
    /// Parked until the debounce window closes.
    Debounced,
    /// A write or browser launch was started.
    Started,
}

/// A worker message that survived the staleness check.
#[derive(Debug)]
pub enum Applied {
    Fetched {
        target: RequestTarget,
        error: Option<RequestError>,
    },
    Written(Written),
    Opened {
        key: String,
        url: String,
        result: Result<(), RequestError>,
    },
}

/// Latest sequence id issued per target.
///
/// Ids come from one counter, so they increase per target and per kind.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    next: u64,
    latest: HashMap<RequestTarget, u64>,
}

impl SequenceTracker {
    /// Issue a new id for `target`, superseding any earlier one.
    pub fn issue(&mut self, target: &RequestTarget) -> u64 {
        self.next += 1;
        self.latest.insert(target.clone(), self.next);
        self.next
    }

    pub fn is_current(&self, target: &RequestTarget, seq: u64) -> bool {
        self.latest.get(target) == Some(&seq)
    }

    /// Make every outstanding id for `target` stale.
    pub fn forget(&mut self, target: &RequestTarget) {
        self.latest.remove(target);
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    fingerprint: String,
}

#[derive(Debug)]
struct Pending {
    request: FetchRequest,
    deadline: Instant,
}

pub struct Pipeline {
    spawner: TaskSpawner,
    debounce: Duration,
    sequences: SequenceTracker,
    in_flight: HashMap<RequestTarget, InFlight>,
    /// Fingerprint of the result currently cached per target.
    loaded: HashMap<RequestTarget, String>,
    /// One debounce slot per kind; a newer request replaces the older one.
    pending: HashMap<FetchKind, Pending>,
}

impl Pipeline {
    pub fn new(spawner: TaskSpawner, debounce: Duration) -> Self {
        Self {
            spawner,
            debounce,
            sequences: SequenceTracker::default(),
            in_flight: HashMap::new(),
            loaded: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Dispatch an intent now, reading from cache when possible.
    pub fn request(&mut self, intent: Intent, caches: &mut Caches) -> Dispatch {
        self.dispatch(intent, caches, false)
    }

    /// Dispatch an intent now, bypassing the cache and superseding any
    /// in-flight request for the same target.
    pub fn reload(&mut self, intent: Intent, caches: &mut Caches) -> Dispatch {
        self.dispatch(intent, caches, true)
    }

    /// Schedule a cursor-driven read after the debounce window.
    ///
    /// Cached targets resolve immediately. Writes and launches are never
    /// debounced and go straight through.
    pub fn request_debounced(&mut self, intent: Intent, caches: &mut Caches, now: Instant) -> Dispatch {
        match intent.classify() {
            Classified::Fetch(request) => {
                let kind = request.target.kind;
                if self.is_cached(&request, caches) {
                    self.pending.remove(&kind);
                    return Dispatch::Cached;
                }
                trace!(target = %request.target, "debouncing");
                self.pending.insert(
                    kind,
                    Pending {
                        request,
                        deadline: now + self.debounce,
                    },
                );
                Dispatch::Debounced
            }
            other => self.dispatch_classified(other, caches, false),
        }
    }

    /// Drop a parked request of `kind` before it fires.
    pub fn cancel_pending(&mut self, kind: FetchKind) {
        self.pending.remove(&kind);
    }

    /// Send every debounced request whose window has closed.
    pub fn flush_due(&mut self, now: Instant, caches: &mut Caches) -> Vec<Dispatch> {
        let mut due: Vec<FetchKind> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(kind, _)| *kind)
            .collect();
        due.sort();

        let mut dispatched = Vec::with_capacity(due.len());
        for kind in due {
            if let Some(pending) = self.pending.remove(&kind) {
                dispatched.push(self.fetch(pending.request, caches, false));
            }
        }
        dispatched
    }

    /// Earliest debounce deadline, used to bound the input poll.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn is_in_flight(&self, target: &RequestTarget) -> bool {
        self.in_flight.contains_key(target)
    }

    /// Apply a worker message to the caches, unless it is stale.
    pub fn apply(&mut self, message: WorkerMessage, caches: &mut Caches) -> Option<Applied> {
        match message {
            WorkerMessage::Fetched {
                seq,
                target,
                fetched,
            } => {
                if !self.sequences.is_current(&target, seq) {
                    debug!(seq, target = %target, "discarding stale result");
                    return None;
                }
                let fingerprint = self
                    .in_flight
                    .remove(&target)
                    .map(|f| f.fingerprint)
                    .unwrap_or_else(|| target.key.clone());

                let error = fetched.error().cloned();
                if error.is_none() {
                    self.loaded.insert(target.clone(), fingerprint);
                } else {
                    self.loaded.remove(&target);
                }
                store(caches, &target.key, fetched);
                Some(Applied::Fetched { target, error })
            }
            WorkerMessage::Written(written) => Some(Applied::Written(written)),
            WorkerMessage::Opened { key, url, result } => {
                Some(Applied::Opened { key, url, result })
            }
        }
    }

    /// Make any in-flight result for `target` stale.
    pub fn invalidate(&mut self, target: &RequestTarget) {
        self.sequences.forget(target);
        self.in_flight.remove(target);
        self.loaded.remove(target);
    }

    /// Make every in-flight result stale and drop parked requests.
    pub fn invalidate_all(&mut self) {
        debug!(in_flight = self.in_flight.len(), "invalidating all requests");
        self.sequences.clear();
        self.in_flight.clear();
        self.loaded.clear();
        self.pending.clear();
    }

    fn dispatch(&mut self, intent: Intent, caches: &mut Caches, force: bool) -> Dispatch {
        self.dispatch_classified(intent.classify(), caches, force)
    }

    fn dispatch_classified(&mut self, classified: Classified, caches: &mut Caches, force: bool) -> Dispatch {
        match classified {
            Classified::Fetch(request) => {
                self.pending.remove(&request.target.kind);
                self.fetch(request, caches, force)
            }
            Classified::Write(write) => {
                self.spawner.spawn_write(write);
                Dispatch::Started
            }
            Classified::Open(key) => {
                self.spawner.spawn_open(key);
                Dispatch::Started
            }
        }
    }

    fn fetch(&mut self, request: FetchRequest, caches: &mut Caches, force: bool) -> Dispatch {
        if !force && self.is_cached(&request, caches) {
            trace!(target = %request.target, "cache hit");
            return Dispatch::Cached;
        }
        if !force {
            if let Some(flight) = self.in_flight.get(&request.target) {
                if flight.fingerprint == request.fingerprint {
                    trace!(target = %request.target, seq = flight.seq, "coalesced");
                    return Dispatch::Coalesced;
                }
            }
        }

        let seq = self.sequences.issue(&request.target);
        self.in_flight.insert(
            request.target.clone(),
            InFlight {
                seq,
                fingerprint: request.fingerprint.clone(),
            },
        );
        mark_loading(caches, &request.target);
        self.spawner.spawn_fetch(seq, request);
        Dispatch::Spawned(seq)
    }

    fn is_cached(&self, request: &FetchRequest, caches: &Caches) -> bool {
        let target = &request.target;
        let loaded = match target.kind {
            FetchKind::Issues => caches.issues.is_loaded(&target.key),
            FetchKind::Detail => caches.details.is_loaded(&target.key),
            FetchKind::Comments => caches.comments.is_loaded(&target.key),
            FetchKind::Transitions => caches.transitions.is_loaded(&target.key),
            FetchKind::Boards => caches.boards.is_loaded(&target.key),
            FetchKind::CustomFields => caches.custom_fields.is_loaded(&target.key),
        };
        loaded && self.loaded.get(target) == Some(&request.fingerprint)
    }
}

fn mark_loading(caches: &mut Caches, target: &RequestTarget) {
    let key = &target.key;
    match target.kind {
        FetchKind::Issues => caches.issues.mark_loading(key),
        FetchKind::Detail => caches.details.mark_loading(key),
        FetchKind::Comments => caches.comments.mark_loading(key),
        FetchKind::Transitions => caches.transitions.mark_loading(key),
        FetchKind::Boards => caches.boards.mark_loading(key),
        FetchKind::CustomFields => caches.custom_fields.mark_loading(key),
    }
}

fn store(caches: &mut Caches, key: &str, fetched: Fetched) {
    match fetched {
        Fetched::Issues(r) => caches.issues.store(key, r),
        Fetched::Detail(r) => caches.details.store(key, r),
        Fetched::Comments(r) => caches.comments.store(key, r),
        Fetched::Transitions(r) => caches.transitions.store(key, r),
        Fetched::Boards(r) => caches.boards.store(key, r),
        Fetched::CustomFields(r) => caches.custom_fields.store(key, r),
    }
}
