//! Learning paths: predefined topic sequences plus custom generated ones
//! stored on the profile.

use serde::{Deserialize, Serialize};

use crate::types::{Difficulty, LearningPath, UserProfile, MS_PER_DAY};

pub const BEGINNER_PATH_ID: &str = "path-beginner";
pub const INTERMEDIATE_PATH_ID: &str = "path-intermediate";

/// Days after which a generated path is considered stale
const REGENERATE_AFTER_DAYS: i64 = 7;

pub fn predefined_learning_paths() -> Vec<LearningPath> {
    vec![
        LearningPath {
            id: BEGINNER_PATH_ID.to_string(),
            name: "Python Fundamentals".to_string(),
            description: "Core syntax, loops and functions".to_string(),
            topics: vec!["Basics".into(), "Loops".into(), "Functions".into()],
            is_custom: false,
            estimated_hours: None,
            focus_areas: Vec::new(),
        },
        LearningPath {
            id: INTERMEDIATE_PATH_ID.to_string(),
            name: "Data Structures".to_string(),
            description: "Lists, dictionaries and the functions that work on them".to_string(),
            topics: vec!["Lists".into(), "Dictionaries".into(), "Functions".into()],
            is_custom: false,
            estimated_hours: None,
            focus_areas: Vec::new(),
        },
    ]
}

/// Predefined and custom paths visible to this learner
pub fn available_paths(profile: &UserProfile) -> Vec<LearningPath> {
    let mut paths = predefined_learning_paths();
    paths.extend(profile.custom_learning_paths.iter().cloned());
    paths
}

pub fn find_path(profile: &UserProfile, id: &str) -> Option<LearningPath> {
    available_paths(profile).into_iter().find(|p| p.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearnerLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl LearnerLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

pub fn learner_level(profile: &UserProfile) -> LearnerLevel {
    let accuracy = profile.performance_metrics.accuracy;
    match profile.current_difficulty {
        Difficulty::Medium if accuracy > 70.0 => LearnerLevel::Intermediate,
        Difficulty::Hard if accuracy > 75.0 => LearnerLevel::Advanced,
        _ => LearnerLevel::Beginner,
    }
}

/// Incomplete topics first, each group by ascending mastery
pub fn reorder_by_progress(profile: &UserProfile, path: &LearningPath) -> LearningPath {
    let mut topics: Vec<(String, bool, f64)> = path
        .topics
        .iter()
        .map(|t| {
            let completed = profile.topics_completed.contains(t);
            let mastery = profile.topic_stats.get(t).map_or(0.0, |s| s.mastery_level);
            (t.clone(), completed, mastery)
        })
        .collect();
    // stable: equal keys keep path order
    topics.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.total_cmp(&b.2)));

    LearningPath {
        topics: topics.into_iter().map(|(t, _, _)| t).collect(),
        ..path.clone()
    }
}

pub fn should_regenerate(profile: &UserProfile, now_ms: i64) -> bool {
    now_ms - profile.last_path_generation_at > REGENERATE_AFTER_DAYS * MS_PER_DAY
        || !profile.topics_completed.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TopicStats;

    #[test]
    fn test_predefined_paths() {
        let paths = predefined_learning_paths();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].id, BEGINNER_PATH_ID);
        assert!(paths.iter().all(|p| !p.is_custom));
    }

    #[test]
    fn test_find_includes_custom() {
        let mut profile = UserProfile::new(0);
        let mut custom = predefined_learning_paths().remove(0);
        custom.id = "custom-1".to_string();
        custom.is_custom = true;
        profile.custom_learning_paths.push(custom);

        assert!(find_path(&profile, "custom-1").is_some());
        assert!(find_path(&profile, INTERMEDIATE_PATH_ID).is_some());
        assert!(find_path(&profile, "missing").is_none());
    }

    #[test]
    fn test_learner_level() {
        let mut profile = UserProfile::new(0);
        assert_eq!(learner_level(&profile), LearnerLevel::Beginner);
        profile.current_difficulty = Difficulty::Medium;
        profile.performance_metrics.accuracy = 72.0;
        assert_eq!(learner_level(&profile), LearnerLevel::Intermediate);
        profile.current_difficulty = Difficulty::Hard;
        assert_eq!(learner_level(&profile), LearnerLevel::Beginner);
        profile.performance_metrics.accuracy = 80.0;
        assert_eq!(learner_level(&profile), LearnerLevel::Advanced);
    }

    #[test]
    fn test_reorder_puts_completed_last() {
        let mut profile = UserProfile::new(0);
        profile.topics_completed.push("Basics".to_string());
        profile.topic_stats.insert(
            "Loops".to_string(),
            TopicStats {
                mastery_level: 60.0,
                ..TopicStats::default()
            },
        );
        let path = predefined_learning_paths().remove(0);
        let reordered = reorder_by_progress(&profile, &path);
        assert_eq!(reordered.topics, vec!["Functions", "Loops", "Basics"]);
        assert_eq!(reordered.id, path.id);
    }

    #[test]
    fn test_should_regenerate() {
        let mut profile = UserProfile::new(0);
        assert!(!should_regenerate(&profile, 3 * MS_PER_DAY));
        assert!(should_regenerate(&profile, 8 * MS_PER_DAY));
        profile.topics_completed.push("Basics".to_string());
        assert!(should_regenerate(&profile, MS_PER_DAY));
    }
}
