use crate::model::result::QuizResult;

/// Coarse grading band for a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformanceTier {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl PerformanceTier {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Self::Excellent,
            70..=89 => Self::Good,
            50..=69 => Self::Fair,
            _ => Self::NeedsWork,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsWork => "Needs work",
        }
    }
}

/// Aggregate figures over the quiz history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStats {
    pub total_quizzes: usize,
    /// Truncating mean of per-quiz percentages.
    pub average_percentage: u32,
    pub best_percentage: u32,
}

impl HistoryStats {
    #[must_use]
    pub fn from_results(results: &[QuizResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let sum: u64 = results.iter().map(|r| u64::from(r.percentage())).sum();
        let count = results.len() as u64;
        let best = results.iter().map(QuizResult::percentage).max().unwrap_or(0);

        Self {
            total_quizzes: results.len(),
            average_percentage: u32::try_from(sum / count).unwrap_or(u32::MAX),
            best_percentage: best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn tiers_follow_band_edges() {
        assert_eq!(PerformanceTier::from_percentage(100), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_percentage(90), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_percentage(89), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percentage(70), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_percentage(69), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_percentage(50), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_percentage(49), PerformanceTier::NeedsWork);
    }

    #[test]
    fn stats_over_empty_history_are_zero() {
        assert_eq!(HistoryStats::from_results(&[]), HistoryStats::default());
    }

    #[test]
    fn stats_average_truncates() {
        let now = fixed_now();
        let results = vec![
            QuizResult::new(now, 85, 100).unwrap(),
            QuizResult::new(now, 72, 100).unwrap(),
            QuizResult::new(now, 90, 100).unwrap(),
        ];
        let stats = HistoryStats::from_results(&results);
        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.average_percentage, 82);
        assert_eq!(stats.best_percentage, 90);
    }
}
