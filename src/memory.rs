//! Familiarity decay model
//!
//! Each `(lemma, feature_key)` pair carries a stored strength in `[0, 10]`
//! and the time it was last reinforced. Reads apply exponential decay with a
//! configurable half-life; the decayed value is never written back.
//! Reinforcement adds to the *stored* strength, not the decayed one, so a
//! long-idle item returns at its old strength plus the increment.

use crate::error::Result;
use crate::storage::MemoryStore;
use crate::types::MemoryRecord;
use std::sync::Arc;
use tracing::debug;

/// Upper bound of stored strength
pub const MAX_STRENGTH: f64 = 10.0;

/// Half-lives below this are clamped to it
pub const MIN_HALF_LIFE_DAYS: f64 = 0.1;

/// Strength at which an item stops being highlighted
pub const HIGHLIGHT_SATURATION: f64 = 5.0;

const MS_PER_DAY: f64 = 86_400_000.0;

/// `strength * 0.5^(elapsed / half_life)`, with the half-life floored
///
/// Negative elapsed time (a clock behind the stored timestamp) counts as
/// no time at all, so decay never raises a strength.
pub fn decay(strength: f64, elapsed_ms: i64, half_life_days: f64) -> f64 {
    let half_life = if half_life_days.is_nan() {
        MIN_HALF_LIFE_DAYS
    } else {
        half_life_days.max(MIN_HALF_LIFE_DAYS)
    };
    let days = elapsed_ms.max(0) as f64 / MS_PER_DAY;
    strength * 0.5_f64.powf(days / half_life)
}

/// Highlight intensity for a current strength: 1 for unseen, 0 when well known
pub fn highlight_weight(strength: f64) -> f64 {
    (1.0 - strength / HIGHLIGHT_SATURATION).clamp(0.0, 1.0)
}

/// Decay-based familiarity over a [`MemoryStore`]
#[derive(Clone)]
pub struct MemoryModel {
    store: Arc<dyn MemoryStore>,
}

impl MemoryModel {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Decayed strength at `now_ms`; unseen pairs are 0
    pub async fn current_strength(
        &self,
        lemma: &str,
        feature_key: &str,
        now_ms: i64,
        half_life_days: f64,
    ) -> Result<f64> {
        let record = self
            .store
            .load_memory(lemma, feature_key)
            .await?
            .unwrap_or(MemoryRecord {
                strength: 0.0,
                last_seen_ms: now_ms,
            });
        Ok(decay(
            record.strength,
            now_ms.saturating_sub(record.last_seen_ms),
            half_life_days,
        )
        .clamp(0.0, MAX_STRENGTH))
    }

    /// Add `increment` to the stored strength, capped at [`MAX_STRENGTH`]
    pub async fn reinforce(
        &self,
        lemma: &str,
        feature_key: &str,
        now_ms: i64,
        increment: f64,
    ) -> Result<MemoryRecord> {
        let record = self
            .store
            .update_memory(
                lemma,
                feature_key,
                Box::new(move |current| {
                    let stored = current.map(|r| r.strength).unwrap_or(0.0);
                    MemoryRecord {
                        strength: (stored + increment).clamp(0.0, MAX_STRENGTH),
                        last_seen_ms: now_ms,
                    }
                }),
            )
            .await?;

        debug!(
            "Reinforced {} [{}] to {:.2}",
            lemma, feature_key, record.strength
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    const DAY_MS: i64 = 86_400_000;

    fn model() -> MemoryModel {
        MemoryModel::new(Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn test_decay_one_half_life() {
        assert!((decay(5.0, 7 * DAY_MS, 7.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_decay_no_elapsed_time() {
        assert_eq!(decay(5.0, 0, 7.0), 5.0);
    }

    #[test]
    fn test_decay_clamps_half_life() {
        let floored = decay(8.0, DAY_MS / 10, MIN_HALF_LIFE_DAYS);
        assert!((decay(8.0, DAY_MS / 10, 0.0) - floored).abs() < 1e-12);
        assert!((decay(8.0, DAY_MS / 10, -3.0) - floored).abs() < 1e-12);
        assert!((floored - 4.0).abs() < 1e-9);
        assert!(decay(8.0, DAY_MS, f64::NAN).is_finite());
    }

    #[test]
    fn test_highlight_weight() {
        assert_eq!(highlight_weight(0.0), 1.0);
        assert_eq!(highlight_weight(2.5), 0.5);
        assert_eq!(highlight_weight(5.0), 0.0);
        assert_eq!(highlight_weight(9.0), 0.0);
    }

    #[test]
    fn test_decay_ignores_negative_elapsed() {
        assert_eq!(decay(5.0, -7 * DAY_MS, 7.0), 5.0);
    }

    #[tokio::test]
    async fn test_clock_behind_stored_time_stays_capped() {
        let model = model();
        model.reinforce("китап", "N", 7 * DAY_MS, 10.0).await.unwrap();

        let strength = model.current_strength("китап", "N", 0, 7.0).await.unwrap();
        assert!(strength <= MAX_STRENGTH);
        assert_eq!(strength, 10.0);
    }

    #[tokio::test]
    async fn test_unseen_pair_has_zero_strength() {
        let model = model();
        let strength = model.current_strength("китап", "N", 1_000, 7.0).await.unwrap();
        assert_eq!(strength, 0.0);
    }

    #[tokio::test]
    async fn test_reinforce_then_decay() {
        let model = model();
        for _ in 0..5 {
            model.reinforce("китап", "N+PL", 0, 1.0).await.unwrap();
        }

        let now = model.current_strength("китап", "N+PL", 0, 7.0).await.unwrap();
        assert_eq!(now, 5.0);

        let later = model
            .current_strength("китап", "N+PL", 7 * DAY_MS, 7.0)
            .await
            .unwrap();
        assert!((later - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_reinforce_caps_strength() {
        let model = model();
        let record = model.reinforce("ул", "PN", 0, 25.0).await.unwrap();
        assert_eq!(record.strength, MAX_STRENGTH);
    }

    #[tokio::test]
    async fn test_reinforce_uses_stored_strength() {
        let model = model();
        model.reinforce("ул", "PN", 0, 4.0).await.unwrap();

        // A year later the decayed value is near zero, yet reinforcement
        // builds on the stored 4.0
        let record = model.reinforce("ул", "PN", 365 * DAY_MS, 1.0).await.unwrap();
        assert_eq!(record.strength, 5.0);
        assert_eq!(record.last_seen_ms, 365 * DAY_MS);
    }
}
