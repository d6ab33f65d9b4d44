//! Ephemeral per-conversation flow state.
//!
//! State lives in memory only and is lost on restart. Idle conversations
//! have no entry at all.

use database::RosterEntry;
use indexmap::IndexMap;
use tokio::sync::RwLock;

/// Default maximum number of conversations to track before LRU eviction.
const DEFAULT_MAX_CONVERSATIONS: usize = 10000;

/// Where a conversation is within a multi-step flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// `/register` was sent, waiting for the participant's name.
    AwaitingName,
    /// Name accepted, waiting for the wishlist (or "skip").
    AwaitingWishlist { name: String },
    /// `/myassignment` was sent, waiting for the giver's name.
    AwaitingNameForAssignment,
    /// `/cleardata` was sent, waiting for "yes".
    AwaitingClearConfirmation,
    /// `/creategroups` was sent with this roster snapshot.
    AwaitingNumGroups { roster: Vec<RosterEntry> },
    /// Group count accepted, waiting for restriction text.
    AwaitingRestrictions {
        roster: Vec<RosterEntry>,
        group_count: usize,
    },
}

impl ConversationState {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ConversationState::AwaitingName => "awaiting_name",
            ConversationState::AwaitingWishlist { .. } => "awaiting_wishlist",
            ConversationState::AwaitingNameForAssignment => "awaiting_name_for_assignment",
            ConversationState::AwaitingClearConfirmation => "awaiting_clear_confirmation",
            ConversationState::AwaitingNumGroups { .. } => "awaiting_num_groups",
            ConversationState::AwaitingRestrictions { .. } => "awaiting_restrictions",
        }
    }

    /// Whether only the admin may answer this state.
    pub fn is_admin_flow(&self) -> bool {
        matches!(
            self,
            ConversationState::AwaitingClearConfirmation
                | ConversationState::AwaitingNumGroups { .. }
                | ConversationState::AwaitingRestrictions { .. }
        )
    }
}

/// Conversation states keyed by conversation id, with LRU eviction.
///
/// Uses IndexMap insertion order: touched entries move to the end and the
/// front is evicted first.
#[derive(Debug)]
pub struct ConversationStore {
    states: RwLock<IndexMap<String, ConversationState>>,
    max_conversations: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CONVERSATIONS)
    }

    /// Create a store tracking at most `max_conversations` active flows.
    pub fn with_capacity(max_conversations: usize) -> Self {
        Self {
            states: RwLock::new(IndexMap::new()),
            max_conversations: max_conversations.max(1),
        }
    }

    /// Current state of a conversation, `None` when idle.
    pub async fn get(&self, conversation_id: &str) -> Option<ConversationState> {
        self.states.read().await.get(conversation_id).cloned()
    }

    /// Replace the state of a conversation.
    pub async fn set(&self, conversation_id: &str, state: ConversationState) {
        let mut states = self.states.write().await;
        states.shift_remove(conversation_id);
        states.insert(conversation_id.to_string(), state);

        while states.len() > self.max_conversations {
            states.shift_remove_index(0);
        }
    }

    /// Return the conversation to idle, yielding the state it was in.
    pub async fn clear(&self, conversation_id: &str) -> Option<ConversationState> {
        self.states.write().await.shift_remove(conversation_id)
    }

    /// Number of conversations with an active flow.
    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}
