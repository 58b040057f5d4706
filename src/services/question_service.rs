//! Question selection for game creation and recycling.
//!
//! Selection always excludes questions the host has already used in any of
//! their games, via the usage ledger. When the requested categories cannot
//! fill the order, the remainder is drawn from the whole catalog and the
//! caller receives a warning to surface to the host.

use std::{collections::HashSet, sync::Arc};

use rand::seq::SliceRandom;

use crate::{
    dao::{game_store::GameStore, models::QuestionEntity},
    error::ServiceError,
};

/// Outcome of a selection run.
#[derive(Debug)]
pub struct Selection {
    /// Chosen questions, at most `count`, in draw order.
    pub questions: Vec<QuestionEntity>,
    /// Pool size within the requested categories before drawing.
    pub available_in_selected: usize,
    /// Pool size across the whole catalog before drawing.
    pub available_in_all: usize,
    /// Human-readable warning when the requested categories ran short.
    pub warning: Option<String>,
}

impl Selection {
    /// Whether the draw produced fewer questions than requested.
    pub fn is_short(&self, count: usize) -> bool {
        self.questions.len() < count
    }
}

/// Draw `count` unused questions for `host_id`, preferring the requested
/// categories and supplementing from the full catalog when they run short.
///
/// An empty `categories` list means "any category". The draw itself is
/// random; reproducibility matters only for answer order, not for which
/// questions appear.
pub async fn select(
    store: &Arc<dyn GameStore>,
    host_id: &str,
    categories: &[String],
    count: usize,
) -> Result<Selection, ServiceError> {
    let mut preferred = if categories.is_empty() {
        store.unused_questions(host_id.to_string(), None).await?
    } else {
        store
            .unused_questions(host_id.to_string(), Some(categories.to_vec()))
            .await?
    };
    let available_in_selected = preferred.len();

    // The thread-local generator must not live across an await point.
    preferred.shuffle(&mut rand::rng());
    preferred.truncate(count);

    if preferred.len() == count || categories.is_empty() {
        let available_in_all = if categories.is_empty() {
            available_in_selected
        } else {
            store.unused_questions(host_id.to_string(), None).await?.len()
        };
        // An any-category draw has no categories to top up from, but a short
        // draw still has to say so.
        let warning = (preferred.len() < count).then(|| {
            format!(
                "Question pool exhausted; short by {}",
                count - preferred.len()
            )
        });
        return Ok(Selection {
            questions: preferred,
            available_in_selected,
            available_in_all,
            warning,
        });
    }

    // The requested categories ran short: top up from everything else the
    // host has not used yet.
    let everything = store.unused_questions(host_id.to_string(), None).await?;
    let available_in_all = everything.len();

    let chosen: HashSet<uuid::Uuid> = preferred.iter().map(|q| q.id).collect();
    let mut extras: Vec<QuestionEntity> = everything
        .iter()
        .filter(|q| !chosen.contains(&q.id))
        .cloned()
        .collect();
    extras.shuffle(&mut rand::rng());

    let missing = count - preferred.len();
    let supplemented = extras.len().min(missing);
    preferred.extend(extras.into_iter().take(missing));

    let warning = if supplemented > 0 {
        Some(format!(
            "Supplemented with {supplemented} question(s) from other categories"
        ))
    } else {
        None
    };

    let warning = if preferred.len() < count {
        let shortfall = count - preferred.len();
        Some(match warning {
            Some(prefix) => format!("{prefix}; still short by {shortfall}"),
            None => format!("Question pool exhausted; short by {shortfall}"),
        })
    } else {
        warning
    };

    Ok(Selection {
        questions: preferred,
        available_in_selected,
        available_in_all,
        warning,
    })
}

/// Pick one replacement question for a recycle, excluding the host's used
/// questions and everything already placed in the current game.
pub async fn pick_replacement(
    store: &Arc<dyn GameStore>,
    host_id: &str,
    categories: &[String],
    exclude: &[uuid::Uuid],
) -> Result<Option<QuestionEntity>, ServiceError> {
    let selection = select(store, host_id, categories, exclude.len() + 1).await?;
    Ok(selection
        .questions
        .into_iter()
        .find(|q| !exclude.contains(&q.id)))
}
