//! Validation helpers for DTOs.

use validator::ValidationError;

/// Length of every game join code.
pub const JOIN_CODE_LENGTH: usize = 6;
/// Longest accepted team display name.
pub const MAX_TEAM_NAME_LENGTH: usize = 32;

/// Validates that a join code is exactly 6 uppercase alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// validate_join_code("AB12CD") // Ok
/// validate_join_code("ab12cd") // Err - lowercase
/// validate_join_code("AB12C")  // Err - too short
/// ```
pub fn validate_join_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != JOIN_CODE_LENGTH {
        let mut err = ValidationError::new("join_code_length");
        err.message = Some(
            format!(
                "Join code must be exactly {JOIN_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("join_code_format");
        err.message =
            Some("Join code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a team display name: non-empty after trimming, bounded length.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("team_name_empty");
        err.message = Some("Team name must not be empty".into());
        return Err(err);
    }

    if trimmed.len() > MAX_TEAM_NAME_LENGTH {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(
            format!("Team name must be at most {MAX_TEAM_NAME_LENGTH} characters").into(),
        );
        return Err(err);
    }

    Ok(())
}
