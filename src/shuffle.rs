//! Deterministic answer shuffling.
//!
//! Every question instance carries a fixed integer seed. All parties (host,
//! TV, server-side submission checks) re-derive the same display permutation
//! from that seed, so the order itself never has to travel over a channel a
//! player could inspect. The generator is an explicit xorshift64* rather than
//! `rand` because the permutation must be reproducible across processes,
//! versions, and implementations in other languages.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of answers on every question. Other counts are unrepresentable.
pub const ANSWER_COUNT: usize = 4;

/// Canonical label of an answer as authored, before any shuffling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AnswerKey {
    /// First authored answer.
    A,
    /// Second authored answer.
    B,
    /// Third authored answer.
    C,
    /// Fourth authored answer.
    D,
}

impl AnswerKey {
    /// All keys in canonical order.
    pub const ALL: [AnswerKey; ANSWER_COUNT] = [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D];
}

/// Seeded xorshift64* stream used to drive the Fisher–Yates pass.
struct XorShift64Star {
    state: u64,
}

impl XorShift64Star {
    /// A zero seed would make xorshift degenerate, so it maps to a fixed
    /// non-zero constant. Any other seed is used as-is.
    fn new(seed: i64) -> Self {
        let state = match seed as u64 {
            0 => 0x9E37_79B9_7F4A_7C15,
            nonzero => nonzero,
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform-enough index in `0..=bound` for bounds no larger than 3.
    fn next_below(&mut self, bound: usize) -> usize {
        (self.next_u64() % (bound as u64 + 1)) as usize
    }
}

/// Result of shuffling one question's answers.
///
/// Holds the display-ordered texts plus the server-only bookkeeping needed to
/// map a shuffled index back to its canonical key. The key/correctness side is
/// never serialized; only [`ShuffledAnswers::texts`] ever reaches a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledAnswers {
    texts: [String; ANSWER_COUNT],
    keys: [AnswerKey; ANSWER_COUNT],
    correct_index: usize,
}

impl ShuffledAnswers {
    /// Answer texts in display order.
    pub fn texts(&self) -> &[String; ANSWER_COUNT] {
        &self.texts
    }

    /// Consume the shuffle, returning the display-ordered texts.
    pub fn into_texts(self) -> [String; ANSWER_COUNT] {
        self.texts
    }

    /// Zero-based display index of the correct answer. Server-side only
    /// before the reveal.
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Map a display index back to the canonical key of the answer shown
    /// there, if the index is in range.
    pub fn key_at(&self, index: usize) -> Option<AnswerKey> {
        self.keys.get(index).copied()
    }
}

/// Deterministically permute four answers with the given seed.
///
/// The same `(answers, correct, seed)` triple always yields the same
/// permutation. Exactly one output position carries the correct flag,
/// tracked through the shuffle.
pub fn shuffle(
    answers: &[String; ANSWER_COUNT],
    correct: AnswerKey,
    seed: i64,
) -> ShuffledAnswers {
    let mut order: [usize; ANSWER_COUNT] = [0, 1, 2, 3];
    let mut rng = XorShift64Star::new(seed);

    // Fisher-Yates, high to low.
    for i in (1..ANSWER_COUNT).rev() {
        let j = rng.next_below(i);
        order.swap(i, j);
    }

    let texts = order.map(|source| answers[source].clone());
    let keys = order.map(|source| AnswerKey::ALL[source]);
    let correct_index = keys
        .iter()
        .position(|key| *key == correct)
        .unwrap_or_default();

    ShuffledAnswers {
        texts,
        keys,
        correct_index,
    }
}
