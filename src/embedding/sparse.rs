//! Bounded, deterministically ordered sparse vector representation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// A sparse vector: strictly ascending `(index, weight)` pairs with
/// `1 <= index <= max_dim`
///
/// Token id 0 must not collide with the reserved zero index, so every token
/// id is shifted by +1 on encode. Decoding recovers the stored form only;
/// original token ids are not reconstructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Encode a token-id to weight mapping
    ///
    /// Entries whose shifted index falls outside `[1, max_dim]` and entries
    /// with non-finite weights are dropped with a warning, not an error.
    pub fn encode(weights: &HashMap<u32, f32>, max_dim: u32) -> Self {
        let mut entries: Vec<(u32, f32)> = Vec::with_capacity(weights.len());

        for (&token_id, &weight) in weights {
            if !weight.is_finite() {
                warn!(token_id, weight, "Dropping sparse entry with non-finite weight");
                continue;
            }

            let index = match token_id.checked_add(1) {
                Some(index) if index <= max_dim => index,
                _ => {
                    warn!(token_id, max_dim, "Dropping sparse entry outside dimension bound");
                    continue;
                }
            };

            entries.push((index, weight));
        }

        // input is a map, so indices are unique; ordering makes the
        // representation deterministic
        entries.sort_unstable_by_key(|(index, _)| *index);

        Self { entries }
    }

    /// The stored index to weight form
    pub fn decode(&self) -> HashMap<u32, f32> {
        self.entries.iter().copied().collect()
    }

    /// Sorted `(index, weight)` pairs
    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cosine similarity against another sparse vector
    ///
    /// A zero-magnitude operand yields 0.0.
    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        let mut dot = 0.0f32;
        let mut a = self.entries.iter().peekable();
        let mut b = other.entries.iter().peekable();

        while let (Some((ia, wa)), Some((ib, wb))) = (a.peek(), b.peek()) {
            match ia.cmp(ib) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    dot += wa * wb;
                    a.next();
                    b.next();
                }
            }
        }

        let mag_a: f32 = self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        let mag_b: f32 = other.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();

        if mag_a == 0.0 || mag_b == 0.0 {
            return 0.0;
        }

        dot / (mag_a * mag_b)
    }
}
