//! Session storage behind a small trait so the relay never depends on how
//! sessions are kept. `MemoryStore` is the only backend: a plain map that is
//! lost on restart.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::session::Session;

pub trait SessionStore: Send {
    fn get(&self, id: &str) -> Option<&Session>;

    fn get_mut(&mut self, id: &str) -> Option<&mut Session>;

    /// Insert or replace the session stored under `session.id`.
    fn put(&mut self, session: Session);

    fn delete(&mut self, id: &str) -> Option<Session>;

    /// Remove every session for which `expired` holds and return their ids.
    fn sweep(&mut self, expired: &dyn Fn(&Session) -> bool) -> Vec<String>;

    fn len(&self) -> usize;

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: HashMap<String, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    fn put(&mut self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    fn delete(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    fn sweep(&mut self, expired: &dyn Fn(&Session) -> bool) -> Vec<String> {
        let ids: Vec<String> = self
            .sessions
            .values()
            .filter(|s| expired(s))
            .map(|s| s.id.clone())
            .collect();
        for id in &ids {
            self.sessions.remove(id);
        }
        ids
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Sweep predicate: sessions created more than `retention` before `now`.
pub fn older_than(now: DateTime<Utc>, retention: chrono::Duration) -> impl Fn(&Session) -> bool {
    move |session| session.is_expired(now, retention)
}
