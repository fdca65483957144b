//! Token-budgeted session memory.
//!
//! Each session holds raw chat turns plus derived summary blocks under a
//! single token budget. The budget splits by `history_ratio`: raw turns
//! get their share, summaries the remainder. When history overflows,
//! the oldest turns are evicted in FIFO order — at least `flush_size`
//! estimated tokens per pass — and folded into a deterministic summary
//! block so long sessions keep a compressed trace of their past.
//!
//! Token counts are estimates (~4 chars/token); the budget is enforced
//! on the estimate, which is the same arithmetic the limits were tuned
//! against.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::models::{estimate_tokens, ChatTurn, MemoryConfig};

/// Per-turn excerpt length inside a summary block, in characters.
const SUMMARY_EXCERPT_CHARS: usize = 100;

/// Conversation memory for one session.
#[derive(Debug)]
pub struct ChatMemory {
    turns: VecDeque<ChatTurn>,
    summaries: VecDeque<String>,
    config: MemoryConfig,
}

impl ChatMemory {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            turns: VecDeque::new(),
            summaries: VecDeque::new(),
            config,
        }
    }

    /// Append a turn and re-enforce the budget.
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push_back(turn);
        self.enforce_budget();
    }

    /// Raw turns currently in the window, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }

    /// Summary blocks, oldest first.
    pub fn summaries(&self) -> impl Iterator<Item = &str> {
        self.summaries.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.summaries.is_empty()
    }

    /// Estimated tokens held across turns and summaries.
    pub fn estimated_tokens(&self) -> usize {
        self.history_tokens() + self.summary_tokens()
    }

    fn history_tokens(&self) -> usize {
        self.turns.iter().map(ChatTurn::estimated_tokens).sum()
    }

    fn summary_tokens(&self) -> usize {
        self.summaries.iter().map(|s| estimate_tokens(s)).sum()
    }

    fn history_budget(&self) -> usize {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let budget = (self.config.token_limit as f64 * self.config.history_ratio) as usize;
        budget
    }

    fn summary_budget(&self) -> usize {
        self.config.token_limit.saturating_sub(self.history_budget())
    }

    /// Evict oldest turns until history fits its share, folding each
    /// eviction pass into one summary block, then trim old summaries
    /// until those fit theirs.
    fn enforce_budget(&mut self) {
        let budget = self.history_budget();
        if self.history_tokens() > budget {
            let mut evicted = Vec::new();
            let mut freed = 0usize;
            // Free at least flush_size tokens so overflow does not evict
            // one turn at a time; always keep the newest turn.
            while self.turns.len() > 1
                && (freed < self.config.flush_size || self.history_tokens() > budget)
            {
                if let Some(turn) = self.turns.pop_front() {
                    freed += turn.estimated_tokens();
                    evicted.push(turn);
                } else {
                    break;
                }
            }
            if !evicted.is_empty() {
                debug!(
                    evicted = evicted.len(),
                    freed_tokens = freed,
                    "folded evicted turns into summary"
                );
                self.summaries.push_back(summarize(&evicted));
            }
        }

        let summary_budget = self.summary_budget();
        while self.summary_tokens() > summary_budget && self.summaries.len() > 1 {
            self.summaries.pop_front();
        }
        // A single oversized block is truncated rather than dropped.
        if self.summary_tokens() > summary_budget {
            if let Some(block) = self.summaries.front_mut() {
                let keep_chars = summary_budget.saturating_mul(4);
                if block.chars().count() > keep_chars {
                    *block = block.chars().take(keep_chars).collect();
                }
            }
        }
    }
}

/// Fold evicted turns into one deterministic summary block: a short
/// excerpt of each turn in order, no model call involved.
fn summarize(turns: &[ChatTurn]) -> String {
    let lines: Vec<String> = turns
        .iter()
        .map(|turn| {
            let excerpt: String = turn.text.chars().take(SUMMARY_EXCERPT_CHARS).collect();
            format!("{}: {}", turn.role.as_str(), excerpt)
        })
        .collect();
    format!("[tóm tắt trước đó] {}", lines.join(" | "))
}

/// All live sessions, keyed by id.
///
/// The map lock is held only to look up or insert a session handle;
/// per-session state sits behind its own mutex so concurrent turns on
/// different sessions never contend.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ChatMemory>>>>,
    config: MemoryConfig,
}

impl SessionStore {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a new session with a generated id.
    pub async fn create(&self) -> (String, Arc<Mutex<ChatMemory>>) {
        let id = Uuid::new_v4().to_string();
        let memory = Arc::new(Mutex::new(ChatMemory::new(self.config.clone())));
        self.sessions.write().await.insert(id.clone(), memory.clone());
        info!(session_id = %id, "session created");
        (id, memory)
    }

    /// Resolve an optional session id: known ids return their memory,
    /// unknown or absent ids create a fresh session.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> (String, Arc<Mutex<ChatMemory>>) {
        if let Some(id) = session_id {
            if let Some(memory) = self.sessions.read().await.get(id) {
                return (id.to_string(), memory.clone());
            }
        }
        self.create().await
    }

    /// Drop a session. Returns whether it existed.
    pub async fn end(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!(session_id, "session ended");
        }
        removed
    }

    /// Ids of all live sessions.
    pub async fn list_active(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Drop every session, returning how many were live.
    pub async fn clear_all(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
