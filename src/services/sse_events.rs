//! Broadcast payload construction and publication.
//!
//! Every payload that leaves this module is built from the closed union in
//! `dto::events`; nothing here ever has access to a shuffle seed or a
//! canonical answer key, so a coding mistake cannot leak one.

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::GameEntity,
    dto::events::{
        AnswerCountEvent, BroadcastGameInfo, BroadcastQuestion, GameBroadcast,
        GameLifecycleEvent, ServerEvent, StateChangedEvent,
    },
    state::SharedState,
};

/// Publish a presentation-state transition on the game's events channel.
///
/// `question` is provided only when the transition puts a question on screen;
/// `correct_answer_index` only on the reveal transition.
pub fn broadcast_state_changed(
    state: &SharedState,
    game: &GameEntity,
    question: Option<BroadcastQuestion>,
    game_question_id: Option<Uuid>,
    correct_answer_index: Option<usize>,
) {
    let payload = GameBroadcast::StateChanged(StateChangedEvent {
        game: game_info(game),
        state: game.presentation_state,
        question,
        game_question_id,
        correct_answer_index,
    });
    send_game_event(state, game.id, &payload);
}

/// Publish updated answer-progress counters, TV channel only.
pub fn broadcast_answer_count(
    state: &SharedState,
    game_id: Uuid,
    teams_answered_count: u64,
    total_teams: u64,
) {
    let payload = GameBroadcast::AnswerCountUpdated(AnswerCountEvent {
        teams_answered_count,
        total_teams,
    });
    send_tv_event(state, game_id, &payload);
}

/// Publish that a game was paused after its host went silent.
pub fn broadcast_game_paused(state: &SharedState, game_id: Uuid) {
    let payload = GameBroadcast::GamePaused(GameLifecycleEvent { game_id });
    send_game_event(state, game_id, &payload);
}

/// Publish that a paused game resumed after a fresh host heartbeat.
pub fn broadcast_game_resumed(state: &SharedState, game_id: Uuid) {
    let payload = GameBroadcast::GameResumed(GameLifecycleEvent { game_id });
    send_game_event(state, game_id, &payload);
}

fn game_info(game: &GameEntity) -> BroadcastGameInfo {
    BroadcastGameInfo {
        id: game.id,
        status: game.status,
        current_question_index: game.current_question_index,
    }
}

fn send_game_event(state: &SharedState, game_id: Uuid, payload: &GameBroadcast) {
    let name = payload.event_name();
    match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(event) => state.fanout().channels(game_id).events().broadcast(event),
        Err(err) => warn!(event = name, error = %err, "failed to serialize game SSE payload"),
    }
}

fn send_tv_event(state: &SharedState, game_id: Uuid, payload: &GameBroadcast) {
    let name = payload.event_name();
    match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(event) => state.fanout().channels(game_id).tv().broadcast(event),
        Err(err) => warn!(event = name, error = %err, "failed to serialize TV SSE payload"),
    }
}
