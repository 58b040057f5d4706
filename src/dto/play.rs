use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{game::TeamSummary, validation::validate_team_name},
    shuffle::ANSWER_COUNT,
};

/// Request to create a new team in a game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeamRequest {
    /// Desired display name, unique within the game.
    pub name: String,
}

impl Validate for CreateTeamRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_team_name(&self.name) {
            errors.add("name", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Response after creating or joining a team.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamResponse {
    /// The team joined or created.
    pub team: TeamSummary,
}

/// One team's answer attempt.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    /// Question instance being answered.
    pub question_instance_id: Uuid,
    /// Index into the shuffled answer list the submitter was shown.
    #[validate(range(max = 3))]
    pub chosen_index: usize,
    /// Client-measured response time in milliseconds.
    pub elapsed_ms: u64,
}

/// Acknowledgement of an accepted submission.
///
/// Deliberately carries no correctness information: the submitting team
/// learns whether it was right at the reveal, with everyone else.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    /// Always true; rejections surface as conflict errors.
    pub accepted: bool,
}

/// Compile-time guard that the index validation matches the answer count.
const _: () = assert!(ANSWER_COUNT == 4);
