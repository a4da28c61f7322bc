//! Conversation memory and per-session bookkeeping.

use crate::error::{PensumError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_MAX_HISTORY: usize = 2;
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// One user question and the answer given to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// The last `max_exchanges` exchanges of one conversation, oldest first.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    exchanges: VecDeque<Exchange>,
    max_exchanges: usize,
}

impl ConversationMemory {
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            exchanges: VecDeque::with_capacity(max_exchanges + 1),
            max_exchanges,
        }
    }

    /// Push one exchange, evicting the oldest ones beyond the cap.
    pub fn append(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.exchanges.push_back(Exchange {
            user: user.into(),
            assistant: assistant.into(),
        });
        while self.exchanges.len() > self.max_exchanges {
            self.exchanges.pop_front();
        }
    }

    /// Number of stored messages, counting user and assistant turns separately.
    pub fn message_count(&self) -> usize {
        self.exchanges.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    /// `User: …` / `Assistant: …` lines, oldest exchange first.
    pub fn render(&self) -> String {
        self.exchanges
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

/// Conversation memories keyed by session id.
///
/// At most `max_sessions` sessions are kept; registering one more evicts the
/// session created longest ago. Each call locks the map briefly, so concurrent
/// queries on the same session are not ordered relative to each other.
pub struct SessionManager {
    sessions: RwLock<SessionMap>,
    max_history: usize,
    max_sessions: usize,
}

#[derive(Default)]
struct SessionMap {
    memories: HashMap<String, ConversationMemory>,
    /// Session ids, oldest first.
    order: VecDeque<String>,
}

impl SessionMap {
    fn insert(&mut self, id: String, memory: ConversationMemory, max_sessions: usize) {
        while self.order.len() >= max_sessions.max(1) {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.memories.remove(&oldest);
                    debug!("Evicted session {}", oldest);
                }
                None => break,
            }
        }
        self.order.push_back(id.clone());
        self.memories.insert(id, memory);
    }
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(SessionMap::default()),
            max_history,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// Cap the number of live sessions.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    fn lock_error<T>(_: T) -> PensumError {
        PensumError::Session("session store lock poisoned".to_string())
    }

    /// Register a fresh, empty session and return its id.
    pub fn create_session(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.sessions.write().map_err(Self::lock_error)?.insert(
            id.clone(),
            ConversationMemory::new(self.max_history),
            self.max_sessions,
        );
        debug!("Created session {}", id);
        Ok(id)
    }

    /// Rendered history, or `None` for unknown or empty sessions.
    pub fn history(&self, session_id: &str) -> Result<Option<String>> {
        let sessions = self.sessions.read().map_err(Self::lock_error)?;
        Ok(sessions
            .memories
            .get(session_id)
            .filter(|memory| !memory.is_empty())
            .map(ConversationMemory::render))
    }

    /// Record an exchange, creating the session if the id is new.
    pub fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(Self::lock_error)?;
        match sessions.memories.get_mut(session_id) {
            Some(memory) => memory.append(user, assistant),
            None => {
                let mut memory = ConversationMemory::new(self.max_history);
                memory.append(user, assistant);
                sessions.insert(session_id.to_string(), memory, self.max_sessions);
            }
        }
        Ok(())
    }

    /// Forget the history of a session, keeping its id usable.
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        if let Some(memory) = self
            .sessions
            .write()
            .map_err(Self::lock_error)?
            .memories
            .get_mut(session_id)
        {
            memory.clear();
        }
        Ok(())
    }

    pub fn session_count(&self) -> Result<usize> {
        Ok(self.sessions.read().map_err(Self::lock_error)?.memories.len())
    }
}
