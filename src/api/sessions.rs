//! Plan sessions with idle expiry and a size cap

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::streaming::StreamingContentProcessor;

#[derive(Debug)]
struct PlanSession {
    processor: StreamingContentProcessor,
    last_touched: Instant,
}

impl PlanSession {
    fn is_expired(&self, idle: Duration) -> bool {
        self.last_touched.elapsed() >= idle
    }
}

/// Live plan sessions keyed by id
///
/// A session idle for longer than `idle` is gone on next access. Creating a
/// session beyond `max_sessions` first sweeps expired ones, then evicts the
/// least recently touched. Entry locks keep a single writer per session.
#[derive(Debug)]
pub struct SessionStore {
    entries: DashMap<Uuid, PlanSession>,
    idle: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(idle: Duration, max_sessions: usize) -> Self {
        Self {
            entries: DashMap::new(),
            idle,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.session_idle(), config.max_sessions)
    }

    /// Store a processor under a fresh id
    pub fn create(&self, processor: StreamingContentProcessor) -> Uuid {
        if self.entries.len() >= self.max_sessions {
            self.clear_expired();
        }
        while self.entries.len() >= self.max_sessions {
            if !self.evict_oldest() {
                break;
            }
        }

        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            PlanSession {
                processor,
                last_touched: Instant::now(),
            },
        );
        id
    }

    /// Run `f` on a live session and mark it touched
    pub fn with_session<R>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut StreamingContentProcessor) -> R,
    ) -> Option<R> {
        if let Some(mut session) = self.entries.get_mut(id) {
            if !session.is_expired(self.idle) {
                session.last_touched = Instant::now();
                return Some(f(&mut session.processor));
            }
        }

        if self
            .entries
            .remove_if(id, |_, session| session.is_expired(self.idle))
            .is_some()
        {
            debug!("Plan session {} expired", id);
        }
        None
    }

    /// Remove a live session; false if unknown or expired
    pub fn remove(&self, id: &Uuid) -> bool {
        matches!(self.entries.remove(id), Some((_, session)) if !session.is_expired(self.idle))
    }

    /// Live (unexpired) sessions
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.is_expired(self.idle))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired session
    pub fn clear_expired(&self) {
        self.entries.retain(|_, session| !session.is_expired(self.idle));
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.last_touched)
            .map(|entry| *entry.key());

        match oldest {
            Some(id) => {
                debug!("Evicting plan session {} at capacity", id);
                self.entries.remove(&id).is_some()
            }
            None => false,
        }
    }
}
