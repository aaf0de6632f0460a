//! Conversation Session: the short-term memory fed back to the model on
//! every generation call.
//!
//! The session is owned by `AppState` and handed to the orchestrator per
//! request. Generation calls are serialized on their own lock, held from
//! reading the history until the reply is appended, so each call sees every
//! turn appended before it. The turns sit behind a second lock that is only
//! ever held briefly, so `len` and `reset` never wait on an upstream call.
//! A reset bumps the epoch; a call that began before it does not append.

use tokio::sync::{Mutex, MutexGuard};

use crate::llm::{ChatMessage, ChatRole};

pub type ConversationTurn = ChatMessage;
pub type ConversationRole = ChatRole;

/// Which turns a successful generation appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnRecording {
    /// Only the cleaned model reply (N calls -> N turns).
    #[default]
    ModelOnly,
    /// The instruction that was sent, then the reply (N calls -> 2N turns).
    UserAndModel,
}

impl TurnRecording {
    pub fn from_flag(record_user_turns: bool) -> Self {
        if record_user_turns {
            TurnRecording::UserAndModel
        } else {
            TurnRecording::ModelOnly
        }
    }

    pub fn turns_per_call(&self) -> usize {
        match self {
            TurnRecording::ModelOnly => 1,
            TurnRecording::UserAndModel => 2,
        }
    }
}

#[derive(Debug, Default)]
struct TurnLog {
    turns: Vec<ConversationTurn>,
    epoch: u64,
}

#[derive(Debug, Default)]
pub struct ConversationSession {
    in_flight: Mutex<()>,
    log: Mutex<TurnLog>,
    recording: TurnRecording,
}

impl ConversationSession {
    pub fn new(recording: TurnRecording) -> Self {
        Self {
            in_flight: Mutex::new(()),
            log: Mutex::new(TurnLog::default()),
            recording,
        }
    }

    pub fn recording(&self) -> TurnRecording {
        self.recording
    }

    /// Waits for any other generation call to finish, then snapshots the
    /// history. Dropping the returned turn without calling
    /// [`SessionTurn::commit`] leaves the history untouched.
    pub async fn begin(&self) -> SessionTurn<'_> {
        let serial = self.in_flight.lock().await;
        let (history, epoch) = {
            let log = self.log.lock().await;
            (log.turns.clone(), log.epoch)
        };
        SessionTurn {
            _serial: serial,
            session: self,
            history,
            epoch,
        }
    }

    /// Discards every turn. Returns how many were dropped.
    pub async fn reset(&self) -> usize {
        let mut log = self.log.lock().await;
        let cleared = log.turns.len();
        log.turns.clear();
        log.epoch += 1;
        cleared
    }

    pub async fn len(&self) -> usize {
        self.log.lock().await.turns.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.lock().await.turns.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<ConversationTurn> {
        self.log.lock().await.turns.clone()
    }
}

/// Exclusive generation slot on the session for the span of one call.
pub struct SessionTurn<'a> {
    _serial: MutexGuard<'a, ()>,
    session: &'a ConversationSession,
    history: Vec<ConversationTurn>,
    epoch: u64,
}

impl SessionTurn<'_> {
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Appends the call's turns. Returns `false`, appending nothing, when
    /// the session was reset while the call was in flight.
    pub async fn commit(self, instruction: &str, reply: &str) -> bool {
        let mut log = self.session.log.lock().await;
        if log.epoch != self.epoch {
            return false;
        }
        if self.session.recording == TurnRecording::UserAndModel {
            log.turns.push(ChatMessage::user(instruction));
        }
        log.turns.push(ChatMessage::model(reply));
        true
    }
}
