use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ConversationStore, Role};

/// Which screen the host should show. Only the general chat exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    GeneralChat,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::GeneralChat => "general_chat",
        }
    }
}

/// Where the session is in the request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    Pending,
    Replying,
}

/// How rendered messages consume display identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayIdPolicy {
    /// One identity per rendered message.
    #[default]
    Sequential,
    /// Identity-compatible with the legacy web UI: every render pass takes
    /// one identity up front and assistant messages take two. A page showing
    /// only the opening greeting spends nothing beyond the pass itself.
    Legacy,
}

impl DisplayIdPolicy {
    fn render_pass_cost(&self) -> u64 {
        match self {
            DisplayIdPolicy::Sequential => 0,
            DisplayIdPolicy::Legacy => 1,
        }
    }

    fn message_cost(&self, role: Role) -> u64 {
        match (self, role) {
            (DisplayIdPolicy::Legacy, Role::Assistant) => 2,
            _ => 1,
        }
    }
}

/// Monotonic source of widget identities for rendered messages.
#[derive(Debug, Clone, Default)]
pub struct DisplayCounter {
    next: u64,
    policy: DisplayIdPolicy,
}

impl DisplayCounter {
    pub fn new(policy: DisplayIdPolicy) -> Self {
        Self { next: 0, policy }
    }

    pub fn policy(&self) -> DisplayIdPolicy {
        self.policy
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    fn begin_pass(&mut self) {
        self.next += self.policy.render_pass_cost();
    }

    fn charges_greeting_page(&self) -> bool {
        self.policy == DisplayIdPolicy::Sequential
    }

    fn assign(&mut self, role: Role) -> u64 {
        let key = self.next;
        self.next += self.policy.message_cost(role);
        key
    }
}

/// A message paired with the display identity it was rendered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub key: u64,
    pub role: Role,
    pub content: String,
}

/// Everything one chat session owns. Nothing here is shared between sessions
/// or persisted.
#[derive(Debug, Clone)]
pub struct SessionState {
    id: String,
    store: ConversationStore,
    display_counter: DisplayCounter,
    route: Route,
    phase: TurnPhase,
    last_response: Option<serde_json::Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::with_display_policy(DisplayIdPolicy::default())
    }

    pub fn with_display_policy(policy: DisplayIdPolicy) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            store: ConversationStore::new(),
            display_counter: DisplayCounter::new(policy),
            route: Route::default(),
            phase: TurnPhase::default(),
            last_response: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    pub fn display_counter(&self) -> &DisplayCounter {
        &self.display_counter
    }

    /// Raw payload of the most recent successful model call.
    pub fn last_response(&self) -> Option<&serde_json::Value> {
        self.last_response.as_ref()
    }

    pub fn record_response(&mut self, raw: serde_json::Value) {
        self.last_response = Some(raw);
    }

    /// Serializes the conversation and tags each message with a fresh display
    /// identity. Identities never repeat within a session.
    pub fn render(&mut self) -> Vec<RenderedMessage> {
        self.display_counter.begin_pass();
        let snapshot = self.store.serialize();
        let greeting_only = snapshot.len() <= 1;
        let counter = &mut self.display_counter;
        snapshot
            .iter()
            .map(|message| RenderedMessage {
                key: if greeting_only && !counter.charges_greeting_page() {
                    counter.peek()
                } else {
                    counter.assign(message.role())
                },
                role: message.role(),
                content: message.content().to_string(),
            })
            .collect()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
