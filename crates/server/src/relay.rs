//! Session/move relay.
//!
//! `Relay` owns the session store, the table of live connections and the
//! per-session rooms. Everything sits behind one mutex and each operation is
//! a single lock scope that never awaits: the store mutation and the events
//! it produces are enqueued together, so every participant of a session sees
//! events in the order the relay applied them.
//!
//! Outbound delivery goes through one unbounded channel per connection,
//! drained by that connection's socket writer. Sends to a closed channel are
//! dropped; there is no acknowledgment or retry.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RelayError;
use crate::protocol::{ClientEvent, ConnectionId, Presence, ServerEvent, SessionSnapshot};
use crate::session::{generate_session_id, Move, MoveInput, Role, Session};
use crate::store::{older_than, MemoryStore, SessionStore};

/// Sessions older than this are dropped by the sweeper.
pub const SESSION_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub type Outbox = mpsc::UnboundedReceiver<ServerEvent>;

/// Produces candidate session ids for `create_session`.
pub type IdSource = Box<dyn FnMut() -> String + Send>;

pub struct Relay {
    state: Mutex<RelayState>,
    retention: TimeDelta,
    next_connection: AtomicU64,
}

struct RelayState {
    store: Box<dyn SessionStore>,
    id_source: IdSource,
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<String, BTreeSet<ConnectionId>>,
}

struct Connection {
    outbox: mpsc::UnboundedSender<ServerEvent>,
    membership: Option<Membership>,
}

#[derive(Debug, Clone)]
struct Membership {
    session_id: String,
    role: Role,
}

impl Relay {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self::with_retention(store, SESSION_RETENTION)
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn with_retention(store: Box<dyn SessionStore>, retention: Duration) -> Self {
        Self {
            state: Mutex::new(RelayState {
                store,
                id_source: Box::new(generate_session_id),
                connections: HashMap::new(),
                rooms: HashMap::new(),
            }),
            retention: TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX),
            next_connection: AtomicU64::new(1),
        }
    }

    /// Replace the session id generator. Candidates that collide with a live
    /// session are discarded.
    pub fn with_id_source(mut self, source: impl FnMut() -> String + Send + 'static) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .id_source = Box::new(source);
        self
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        // No operation leaves the state half-updated, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- Session accessors ----

    /// Insert a fresh session and return its id. Ids are regenerated until
    /// one is free among live sessions.
    pub fn create_session(&self) -> String {
        let mut state = self.lock();
        let id = loop {
            let candidate = (state.id_source)();
            if !state.store.contains(&candidate) {
                break candidate;
            }
        };
        state.store.put(Session::new(id.clone(), Utc::now()));
        tracing::info!(session_id = %id, "New session created");
        id
    }

    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.lock().store.get(session_id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.lock().store.len()
    }

    // ---- Connections ----

    /// Register a new connection. The returned receiver yields every event
    /// addressed to it.
    pub fn connect(&self) -> (ConnectionId, Outbox) {
        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().connections.insert(
            id,
            Connection {
                outbox: tx,
                membership: None,
            },
        );
        tracing::debug!(connection = %id, "New client connected");
        (id, rx)
    }

    /// Deliver an event to a single connection.
    pub fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        self.lock().send(conn, event);
    }

    /// Dispatch a decoded client event. Failures go back to `conn` only as
    /// an `error` event.
    pub fn handle(&self, conn: ConnectionId, event: ClientEvent) {
        let result = match event {
            ClientEvent::JoinSession(req) => self.join_session(conn, &req.session_id, req.role),
            ClientEvent::Move(input) => self.submit_move(conn, input).map(|_| ()),
        };
        if let Err(e) = result {
            tracing::warn!(connection = %conn, "Rejected event: {e}");
            self.send_to(conn, ServerEvent::Error(e.to_string()));
        }
    }

    /// Attach `conn` to a session under `role`. The joiner gets the current
    /// snapshot, then the whole room (joiner included) gets `userJoined`.
    /// Joining a different session leaves the previous room first.
    pub fn join_session(
        &self,
        conn: ConnectionId,
        session_id: &str,
        role: Role,
    ) -> Result<(), RelayError> {
        let mut state = self.lock();

        let snapshot = state
            .store
            .get(session_id)
            .map(SessionSnapshot::from)
            .ok_or(RelayError::SessionNotFound)?;

        let connection = state
            .connections
            .get_mut(&conn)
            .ok_or(RelayError::UnknownConnection)?;
        let previous = connection.membership.replace(Membership {
            session_id: session_id.to_string(),
            role,
        });

        if let Some(prev) = previous {
            if prev.session_id != session_id {
                state.leave_room(conn, &prev);
            }
        }

        state
            .rooms
            .entry(session_id.to_string())
            .or_default()
            .insert(conn);

        state.send(conn, ServerEvent::SessionState(snapshot));
        state.broadcast(
            session_id,
            ServerEvent::UserJoined(Presence {
                role,
                connection_id: conn,
            }),
        );

        tracing::info!(connection = %conn, session_id, %role, "Client joined session");
        Ok(())
    }

    /// Append a move to the sender's session, adopt its `fen` as the current
    /// position and broadcast it to the room, sender included. The position
    /// is taken on trust; no legality check is made.
    pub fn submit_move(&self, conn: ConnectionId, input: MoveInput) -> Result<Move, RelayError> {
        let mut state = self.lock();

        let membership = state
            .connections
            .get(&conn)
            .and_then(|c| c.membership.clone())
            .ok_or(RelayError::InvalidSession)?;

        let session = state
            .store
            .get_mut(&membership.session_id)
            .ok_or(RelayError::InvalidSession)?;

        let mv = Move::stamp(input, membership.role, Utc::now());
        session.apply(mv.clone());
        let ply = session.moves.len();

        state.broadcast(&membership.session_id, ServerEvent::MoveMade(mv.clone()));

        tracing::info!(
            session_id = %membership.session_id,
            role = %membership.role,
            ply,
            san = %mv.san,
            "Move made"
        );
        Ok(mv)
    }

    /// Forget `conn`. If it was in a room the remaining members get
    /// `userLeft`; the session record itself is untouched.
    pub fn disconnect(&self, conn: ConnectionId) {
        let mut state = self.lock();
        let Some(connection) = state.connections.remove(&conn) else {
            return;
        };
        match connection.membership {
            Some(membership) => {
                state.leave_room(conn, &membership);
                tracing::info!(
                    connection = %conn,
                    session_id = %membership.session_id,
                    "Client disconnected from session"
                );
            }
            None => tracing::debug!(connection = %conn, "Client disconnected"),
        }
    }

    // ---- Eviction ----

    pub fn evict_expired(&self) -> Vec<String> {
        self.evict_expired_at(Utc::now())
    }

    /// Drop every session older than the retention window as of `now`,
    /// whether or not anyone is still connected to it.
    pub fn evict_expired_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let removed = self.lock().store.sweep(&older_than(now, self.retention));
        for id in &removed {
            tracing::info!(session_id = %id, "Cleaned up expired session");
        }
        removed
    }
}

impl RelayState {
    fn send(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(connection) = self.connections.get(&conn) {
            let _ = connection.outbox.send(event);
        }
    }

    fn broadcast(&self, session_id: &str, event: ServerEvent) {
        let Some(members) = self.rooms.get(session_id) else {
            return;
        };
        for &member in members {
            self.send(member, event.clone());
        }
    }

    fn leave_room(&mut self, conn: ConnectionId, membership: &Membership) {
        if let Some(members) = self.rooms.get_mut(&membership.session_id) {
            members.remove(&conn);
            if members.is_empty() {
                self.rooms.remove(&membership.session_id);
            }
        }
        self.broadcast(
            &membership.session_id,
            ServerEvent::UserLeft(Presence {
                role: membership.role,
                connection_id: conn,
            }),
        );
    }
}

/// Run `evict_expired` every `every`, starting one period from now.
pub fn spawn_sweeper(relay: Arc<Relay>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        loop {
            ticker.tick().await;
            let removed = relay.evict_expired();
            tracing::debug!(
                removed = removed.len(),
                remaining = relay.session_count(),
                "Session sweep finished"
            );
        }
    })
}
