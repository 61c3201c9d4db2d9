//! Per-subject mastery: the caller's mean attempt score over the subject's quizzes.

use crate::db::Repository;
use crate::error::Result;
use crate::session::Session;

/// Mean of `scores` rounded half up and clamped to 0..=100. Empty input is 0.
/// Non-finite scores are ignored.
pub fn progress_from_scores(scores: &[f64]) -> u8 {
    let finite: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
    if finite.is_empty() {
        return 0;
    }
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    (mean + 0.5).floor().clamp(0.0, 100.0) as u8
}

/// Recomputed from scratch on every call.
pub async fn subject_progress(repo: &Repository, session: &Session, subject_id: i64) -> Result<u8> {
    if !session.is_authenticated() {
        return Ok(0);
    }

    let quiz_ids = repo.quiz_ids_for_subject(subject_id).await?;
    if quiz_ids.is_empty() {
        return Ok(0);
    }

    let scores = repo.attempt_scores(session, &quiz_ids).await?;
    Ok(progress_from_scores(&scores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_scores_is_zero() {
        assert_eq!(progress_from_scores(&[]), 0);
    }

    #[test]
    fn mean_of_whole_numbers() {
        assert_eq!(progress_from_scores(&[70.0, 80.0, 90.0]), 80);
    }

    #[test]
    fn half_rounds_up() {
        assert_eq!(progress_from_scores(&[70.0, 71.0]), 71);
        assert_eq!(progress_from_scores(&[0.0, 1.0]), 1);
        assert_eq!(progress_from_scores(&[70.0, 70.8]), 70);
    }

    #[test]
    fn clamps_out_of_range_scores() {
        assert_eq!(progress_from_scores(&[150.0, 130.0]), 100);
        assert_eq!(progress_from_scores(&[-20.0, -5.0]), 0);
    }

    #[test]
    fn ignores_non_finite_scores() {
        assert_eq!(progress_from_scores(&[f64::NAN, 60.0]), 60);
    }
}
