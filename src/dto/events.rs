use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::GameStatus,
    state::state_machine::PresentationState,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across broadcast channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialized JSON body.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Wrap a plain text message.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

/// Everything the fan-out may ever publish, one variant per event name.
///
/// A closed union instead of free-form payloads: the player-visible variants
/// structurally have no field for the seed or the letter mapping, so "never
/// send the seed to players" is checked by the type system, not by review.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum GameBroadcast {
    /// The host advanced the shared presentation state.
    StateChanged(StateChangedEvent),
    /// A team locked in an answer; counters only, no identities or choices.
    AnswerCountUpdated(AnswerCountEvent),
    /// Host went silent; submissions suspended.
    GamePaused(GameLifecycleEvent),
    /// Host came back; submissions re-enabled.
    GameResumed(GameLifecycleEvent),
}

impl GameBroadcast {
    /// SSE event name for this payload.
    pub fn event_name(&self) -> &'static str {
        match self {
            GameBroadcast::StateChanged(_) => "state_changed",
            GameBroadcast::AnswerCountUpdated(_) => "answer_count_updated",
            GameBroadcast::GamePaused(_) => "game_paused",
            GameBroadcast::GameResumed(_) => "game_resumed",
        }
    }
}

/// Body of the `state_changed` event.
///
/// `question.answers` is always the pre-shuffled text in display order.
/// `correct_answer_index` is present on the `question_revealed` transition
/// and never anywhere else.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StateChangedEvent {
    /// Game-level context accompanying every transition.
    pub game: BroadcastGameInfo,
    /// The presentation state just entered.
    pub state: PresentationState,
    /// Question content, only on entering `question_active`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<BroadcastQuestion>,
    /// Question instance identifier, present whenever a question is on screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_question_id: Option<Uuid>,
    /// Zero-based index into the shuffled answers that is correct. Only on
    /// entering `question_revealed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer_index: Option<usize>,
}

/// Game context repeated on every `state_changed` event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BroadcastGameInfo {
    /// Game identifier.
    pub id: Uuid,
    /// Coarse lifecycle status.
    pub status: GameStatus,
    /// Zero-based question cursor.
    pub current_question_index: u32,
}

/// Question content as players and the TV are allowed to see it: shuffled
/// answer texts only, no keys, no correctness flag.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BroadcastQuestion {
    /// Catalog question identifier.
    pub id: Uuid,
    /// Category the question belongs to.
    pub category: String,
    /// Question text.
    pub text: String,
    /// The four answers in shuffled display order.
    pub answers: Vec<String>,
}

/// Body of the `answer_count_updated` event, TV channel only.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerCountEvent {
    /// Number of teams that have locked in an answer.
    pub teams_answered_count: u64,
    /// Total teams in the game.
    pub total_teams: u64,
}

/// Body of the `game_paused` / `game_resumed` events.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameLifecycleEvent {
    /// Game identifier.
    pub game_id: Uuid,
}
