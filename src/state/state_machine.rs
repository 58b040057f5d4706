use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Fine-grained stage of a game's shared-screen flow.
///
/// States only ever advance forward, except for the
/// `QuestionActive ⇄ QuestionRevealed` oscillation that walks through the
/// questions of a round. The coarse lifecycle status (`setup`, `active`,
/// `paused`, `completed`) lives on the game record and is orthogonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PresentationState {
    /// Game created, host still configuring; nothing shown to players yet.
    Setup,
    /// Welcome screen shown once at the very start.
    GameIntro,
    /// Intro card for the upcoming round and its categories.
    RoundIntro,
    /// Current question on screen, submissions open.
    QuestionActive,
    /// Correct answer revealed, submissions closed.
    QuestionRevealed,
    /// Per-round standings shown after the round's last reveal.
    RoundScores,
    /// Final standings after the last round.
    GameComplete,
    /// Terminal thank-you screen.
    GameThanks,
}

impl PresentationState {
    /// All states in their forward order.
    pub const ALL: [PresentationState; 8] = [
        PresentationState::Setup,
        PresentationState::GameIntro,
        PresentationState::RoundIntro,
        PresentationState::QuestionActive,
        PresentationState::QuestionRevealed,
        PresentationState::RoundScores,
        PresentationState::GameComplete,
        PresentationState::GameThanks,
    ];

    /// Whether answer submissions may be accepted in this state.
    pub fn accepts_submissions(self) -> bool {
        matches!(self, PresentationState::QuestionActive)
    }

    /// Whether a question is on screen (active or revealed).
    pub fn shows_question(self) -> bool {
        matches!(
            self,
            PresentationState::QuestionActive | PresentationState::QuestionRevealed
        )
    }
}

/// Round/question layout fixed at game creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GamePlan {
    /// Number of rounds in the game.
    pub num_rounds: u32,
    /// Number of questions in every round.
    pub questions_per_round: u32,
}

impl GamePlan {
    /// Total question count across all rounds.
    pub fn total_questions(&self) -> u32 {
        self.num_rounds * self.questions_per_round
    }

    /// Zero-based round that `question_index` belongs to.
    pub fn round_of(&self, question_index: u32) -> u32 {
        question_index / self.questions_per_round
    }

    /// Whether `question_index` is the last question of its round.
    pub fn is_last_in_round(&self, question_index: u32) -> bool {
        (question_index + 1) % self.questions_per_round == 0
    }

    /// Whether `question_index` sits in the final round.
    pub fn is_last_round(&self, question_index: u32) -> bool {
        self.round_of(question_index) + 1 == self.num_rounds
    }
}

/// Persistable update that must be applied together with a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Flip game status to active and stamp `started_at` (entering `GameIntro`).
    ActivateGame,
    /// Stamp the current question instance's `revealed_at`, exactly once.
    StampRevealedAt,
    /// Move the question cursor forward by one.
    IncrementQuestionIndex,
    /// Flip game status to completed and stamp `completed_at`.
    CompleteGame,
}

/// Result of asking the machine to advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The machine moves to `next`; `effects` must be persisted atomically
    /// with the state change.
    Transition {
        /// State entered by this advance.
        next: PresentationState,
        /// Updates to apply alongside the state change.
        effects: Vec<SideEffect>,
    },
    /// The game is on the terminal screen; advancing is a no-op.
    Finished,
}

/// Error raised when the stored question cursor violates the game plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("question index {index} out of bounds for {total} questions")]
pub struct CursorOutOfBounds {
    /// The offending cursor value.
    pub index: u32,
    /// Total questions allowed by the plan.
    pub total: u32,
}

/// Compute the single transition defined from `state`, given the current
/// question cursor and the game plan.
///
/// Pure: applying the returned effects and state is the caller's job, as one
/// conditional write against the game record. Only the host may invoke this.
pub fn advance(
    state: PresentationState,
    question_index: u32,
    plan: &GamePlan,
) -> Result<AdvanceOutcome, CursorOutOfBounds> {
    if question_index >= plan.total_questions() {
        return Err(CursorOutOfBounds {
            index: question_index,
            total: plan.total_questions(),
        });
    }

    let outcome = match state {
        PresentationState::Setup => AdvanceOutcome::Transition {
            next: PresentationState::GameIntro,
            effects: vec![SideEffect::ActivateGame],
        },
        PresentationState::GameIntro => AdvanceOutcome::Transition {
            next: PresentationState::RoundIntro,
            effects: vec![],
        },
        PresentationState::RoundIntro => AdvanceOutcome::Transition {
            next: PresentationState::QuestionActive,
            effects: vec![],
        },
        PresentationState::QuestionActive => AdvanceOutcome::Transition {
            next: PresentationState::QuestionRevealed,
            effects: vec![SideEffect::StampRevealedAt],
        },
        PresentationState::QuestionRevealed => {
            if plan.is_last_in_round(question_index) {
                AdvanceOutcome::Transition {
                    next: PresentationState::RoundScores,
                    effects: vec![],
                }
            } else {
                AdvanceOutcome::Transition {
                    next: PresentationState::QuestionActive,
                    effects: vec![SideEffect::IncrementQuestionIndex],
                }
            }
        }
        PresentationState::RoundScores => {
            if plan.is_last_round(question_index) {
                AdvanceOutcome::Transition {
                    next: PresentationState::GameComplete,
                    effects: vec![SideEffect::CompleteGame],
                }
            } else {
                AdvanceOutcome::Transition {
                    next: PresentationState::RoundIntro,
                    effects: vec![SideEffect::IncrementQuestionIndex],
                }
            }
        }
        PresentationState::GameComplete => AdvanceOutcome::Transition {
            next: PresentationState::GameThanks,
            effects: vec![],
        },
        PresentationState::GameThanks => AdvanceOutcome::Finished,
    };

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_2X2: GamePlan = GamePlan {
        num_rounds: 2,
        questions_per_round: 2,
    };

    fn step(
        state: PresentationState,
        index: u32,
        plan: &GamePlan,
    ) -> (PresentationState, Vec<SideEffect>) {
        match advance(state, index, plan).unwrap() {
            AdvanceOutcome::Transition { next, effects } => (next, effects),
            AdvanceOutcome::Finished => panic!("unexpected terminal from {state:?}"),
        }
    }

    #[test]
    fn every_non_terminal_state_advances() {
        for state in PresentationState::ALL {
            let outcome = advance(state, 0, &PLAN_2X2).unwrap();
            match state {
                PresentationState::GameThanks => assert_eq!(outcome, AdvanceOutcome::Finished),
                _ => assert!(matches!(outcome, AdvanceOutcome::Transition { .. })),
            }
        }
    }

    #[test]
    fn full_walk_through_a_two_by_two_game() {
        let plan = PLAN_2X2;
        let mut state = PresentationState::Setup;
        let mut index = 0u32;
        let mut visited_round_scores = 0;

        loop {
            match advance(state, index, &plan).unwrap() {
                AdvanceOutcome::Finished => break,
                AdvanceOutcome::Transition { next, effects } => {
                    if next == PresentationState::RoundScores {
                        visited_round_scores += 1;
                    }
                    for effect in &effects {
                        if *effect == SideEffect::IncrementQuestionIndex {
                            index += 1;
                        }
                    }
                    assert!(index < plan.total_questions(), "cursor escaped bounds");
                    state = next;
                }
            }
        }

        assert_eq!(state, PresentationState::GameThanks);
        assert_eq!(visited_round_scores, plan.num_rounds);
        assert_eq!(index, plan.total_questions() - 1);
    }

    #[test]
    fn setup_advance_activates_game() {
        let (next, effects) = step(PresentationState::Setup, 0, &PLAN_2X2);
        assert_eq!(next, PresentationState::GameIntro);
        assert_eq!(effects, vec![SideEffect::ActivateGame]);
    }

    #[test]
    fn reveal_stamps_revealed_at() {
        let (next, effects) = step(PresentationState::QuestionActive, 0, &PLAN_2X2);
        assert_eq!(next, PresentationState::QuestionRevealed);
        assert_eq!(effects, vec![SideEffect::StampRevealedAt]);
    }

    #[test]
    fn revealed_mid_round_returns_to_active_with_incremented_cursor() {
        let (next, effects) = step(PresentationState::QuestionRevealed, 0, &PLAN_2X2);
        assert_eq!(next, PresentationState::QuestionActive);
        assert_eq!(effects, vec![SideEffect::IncrementQuestionIndex]);
    }

    #[test]
    fn round_boundary_scenario() {
        // Revealed on question index 1, the last of round 1 in a 2x2 game:
        // advance yields round scores with the cursor untouched, the next
        // advance enters round 2's intro and bumps the cursor to 2.
        let (next, effects) = step(PresentationState::QuestionRevealed, 1, &PLAN_2X2);
        assert_eq!(next, PresentationState::RoundScores);
        assert!(effects.is_empty());

        let (next, effects) = step(PresentationState::RoundScores, 1, &PLAN_2X2);
        assert_eq!(next, PresentationState::RoundIntro);
        assert_eq!(effects, vec![SideEffect::IncrementQuestionIndex]);
    }

    #[test]
    fn last_round_scores_completes_the_game() {
        let (next, effects) = step(PresentationState::RoundScores, 3, &PLAN_2X2);
        assert_eq!(next, PresentationState::GameComplete);
        assert_eq!(effects, vec![SideEffect::CompleteGame]);

        let (next, effects) = step(PresentationState::GameComplete, 3, &PLAN_2X2);
        assert_eq!(next, PresentationState::GameThanks);
        assert!(effects.is_empty());
    }

    #[test]
    fn terminal_state_is_a_noop() {
        assert_eq!(
            advance(PresentationState::GameThanks, 3, &PLAN_2X2).unwrap(),
            AdvanceOutcome::Finished
        );
    }

    #[test]
    fn out_of_bounds_cursor_is_rejected() {
        let err = advance(PresentationState::QuestionActive, 4, &PLAN_2X2).unwrap_err();
        assert_eq!(err, CursorOutOfBounds { index: 4, total: 4 });
    }

    #[test]
    fn plan_geometry() {
        let plan = GamePlan {
            num_rounds: 3,
            questions_per_round: 5,
        };
        assert_eq!(plan.total_questions(), 15);
        assert_eq!(plan.round_of(0), 0);
        assert_eq!(plan.round_of(14), 2);
        assert!(plan.is_last_in_round(4));
        assert!(!plan.is_last_in_round(5));
        assert!(plan.is_last_round(10));
        assert!(!plan.is_last_round(9));
    }
}
