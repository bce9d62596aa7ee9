use tutor_core::traits::PromptComposer;
use tutor_core::types::{AnalyticsSnapshot, TopicAggregate, Trend};

use super::{history_line, NO_DATA_YET};

#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationPrompt;

impl PromptComposer for RecommendationPrompt {
    type Context = AnalyticsSnapshot;

    fn compose(&self, snapshot: &AnalyticsSnapshot) -> String {
        let mut lines = vec![
            "You are an AI learning advisor in an Intelligent Tutoring System.".to_string(),
            "Based on the analytics below, suggest the student's next 2-3 learning steps."
                .to_string(),
            String::new(),
            format!("=== STUDENT DATA (ID: {}) ===", snapshot.student_id),
            "OVERVIEW:".to_string(),
            format!("- Total attempts: {}", snapshot.total_attempts),
            format!("- Correct answers: {}", snapshot.correct_count),
            format!("- Overall accuracy: {:.1}%", snapshot.accuracy()),
            String::new(),
            "STRONG TOPICS (most correct answers):".to_string(),
        ];
        lines.extend(topic_lines(&snapshot.strong_topics, "correct"));
        lines.push(String::new());
        lines.push("TOPICS TO IMPROVE (most incorrect answers):".to_string());
        lines.extend(topic_lines(&snapshot.weak_topics, "incorrect"));

        lines.push(String::new());
        match snapshot.recent_accuracy() {
            Some(recent) => {
                lines.push(format!(
                    "RECENT HISTORY ({} attempts, accuracy {:.1}%, trend: {}):",
                    snapshot.recent_history.len(),
                    recent,
                    trend_description(snapshot.trend())
                ));
                lines.extend(snapshot.recent_history.iter().map(history_line));
            }
            None => {
                lines.push("RECENT HISTORY:".to_string());
                lines.push(format!("  {}", NO_DATA_YET));
            }
        }

        lines.extend(
            [
                "",
                "=== REQUIREMENTS ===",
                "Use these criteria:",
                "1. Accuracy below 50%: prioritise reviewing the fundamentals of the weakest topic",
                "2. Accuracy 50-80%: reinforce the weak topics and introduce harder work on strong topics",
                "3. Accuracy above 80%: challenge the student with advanced exercises or new topics",
                "4. Consider the recent trend: encourage improvement, adjust course when declining",
                "",
                "Return a JSON array in this format:",
                "[",
                "    {",
                "        \"nextTopic\": \"A specific topic name\",",
                "        \"explanation\": \"WHY this topic is suggested, based on the data (2-3 sentences)\"",
                "    }",
                "]",
                "",
                "Notes:",
                "- Suggestions MUST be based on the data above",
                "- Explanations should cite concrete figures",
                "- At most 3 recommendations",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        lines.join("\n")
    }
}

fn topic_lines(topics: &[TopicAggregate], outcome: &str) -> Vec<String> {
    if topics.is_empty() {
        return vec![format!("  {}", NO_DATA_YET)];
    }
    topics
        .iter()
        .map(|t| format!("  - {}: {} {}", t.topic, t.count, outcome))
        .collect()
}

fn trend_description(trend: Trend) -> &'static str {
    match trend {
        Trend::Improving => "improving compared to overall accuracy",
        Trend::Declining => "declining compared to overall accuracy",
        Trend::Steady => "steady",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_reports_no_data() {
        let prompt = RecommendationPrompt.compose(&AnalyticsSnapshot::default());
        assert!(prompt.contains("- Total attempts: 0"));
        assert!(prompt.contains("- Overall accuracy: 0.0%"));
        assert_eq!(prompt.matches("(no data yet)").count(), 3);
        assert!(prompt.contains("At most 3 recommendations"));
    }

    #[test]
    fn lists_topics_with_counts() {
        let snapshot = AnalyticsSnapshot {
            student_id: 7,
            total_attempts: 10,
            correct_count: 3,
            weak_topics: vec![TopicAggregate::new("Algebra", 5)],
            ..Default::default()
        };
        let prompt = RecommendationPrompt.compose(&snapshot);
        assert!(prompt.contains("(ID: 7)"));
        assert!(prompt.contains("- Algebra: 5 incorrect"));
        assert!(prompt.contains("- Overall accuracy: 30.0%"));
    }
}
