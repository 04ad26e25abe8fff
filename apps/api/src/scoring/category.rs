use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The four fixed rubric categories of the ATS evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HardSkills,
    JobTitleMatch,
    Education,
    Formatting,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::HardSkills,
        Category::JobTitleMatch,
        Category::Education,
        Category::Formatting,
    ];

    /// Name used in prompts and searched for in free-text replies.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::HardSkills => "Hard Skills & Keywords",
            Category::JobTitleMatch => "Job Title & Level Matching",
            Category::Education => "Education & Certifications",
            Category::Formatting => "Formatting & Parseability",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::HardSkills => "hard_skills",
            Category::JobTitleMatch => "job_title_match",
            Category::Education => "education",
            Category::Formatting => "formatting",
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Category::HardSkills => 0.4,
            Category::JobTitleMatch => 0.3,
            Category::Education => 0.2,
            Category::Formatting => 0.1,
        }
    }

    /// Matches either the snake key or the display name, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| {
            c.key().eq_ignore_ascii_case(label) || c.display_name().eq_ignore_ascii_case(label)
        })
    }
}

pub type Breakdown = BTreeMap<Category, f64>;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Clamps into [0, 100]; NaN becomes 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_SCORE;
    }
    value.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `0.4*hard_skills + 0.3*job_title_match + 0.2*education + 0.1*formatting`,
/// rounded to two decimals. Missing categories count as 0.
pub fn weighted_score(breakdown: &Breakdown) -> f64 {
    let total: f64 = Category::ALL
        .iter()
        .map(|c| c.weight() * clamp_score(breakdown.get(c).copied().unwrap_or(0.0)))
        .sum();
    round2(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(hard: f64, title: f64, edu: f64, fmt: f64) -> Breakdown {
        Breakdown::from([
            (Category::HardSkills, hard),
            (Category::JobTitleMatch, title),
            (Category::Education, edu),
            (Category::Formatting, fmt),
        ])
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum: f64 = Category::ALL.iter().map(|c| c.weight()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_score_reference_case() {
        assert_eq!(weighted_score(&breakdown(80.0, 70.0, 90.0, 60.0)), 77.0);
    }

    #[test]
    fn test_weighted_score_rounds_to_two_decimals() {
        // 0.4*33.33 + 0.3*66.67 + 0.2*12.5 + 0.1*99.99 = 45.832 -> 45.83
        assert_eq!(weighted_score(&breakdown(33.33, 66.67, 12.5, 99.99)), 45.83);
    }

    #[test]
    fn test_weighted_score_bounds() {
        assert_eq!(weighted_score(&breakdown(0.0, 0.0, 0.0, 0.0)), 0.0);
        assert_eq!(weighted_score(&breakdown(100.0, 100.0, 100.0, 100.0)), 100.0);
        assert_eq!(weighted_score(&Breakdown::new()), 0.0);
    }

    #[test]
    fn test_weighted_score_clamps_out_of_range_inputs() {
        assert_eq!(weighted_score(&breakdown(150.0, -20.0, 100.0, 100.0)), 70.0);
    }

    #[test]
    fn test_clamp_score_handles_nan() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(101.5), 100.0);
        assert_eq!(clamp_score(-3.0), 0.0);
    }

    #[test]
    fn test_from_label_accepts_key_or_display_name() {
        assert_eq!(Category::from_label("hard_skills"), Some(Category::HardSkills));
        assert_eq!(
            Category::from_label("job title & level matching"),
            Some(Category::JobTitleMatch)
        );
        assert_eq!(Category::from_label(" EDUCATION "), Some(Category::Education));
        assert_eq!(Category::from_label("experience"), None);
    }

    #[test]
    fn test_breakdown_serializes_with_snake_keys() {
        let json = serde_json::to_value(breakdown(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json["hard_skills"], 1.0);
        assert_eq!(json["job_title_match"], 2.0);
        assert_eq!(json["education"], 3.0);
        assert_eq!(json["formatting"], 4.0);
    }
}
