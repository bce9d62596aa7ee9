use async_trait::async_trait;

use tutor_core::classifier::{classify, Verdict};
use tutor_core::error::GenerationResult;
use tutor_core::hint_level::HintLevel;
use tutor_core::traits::GenerationStrategy;
use tutor_core::types::{
    AnalyticsSnapshot, ChatContext, ExplanationContext, Generated, GeneratedFeedback, HintContext,
    LearningRecommendation, MaterialsContext, SubmissionContext,
};
use tutor_core::utils::non_blank;

pub const MAX_RECOMMENDATIONS: usize = 3;

/// Deterministic templates; never fails and performs no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedStrategy;

impl RuleBasedStrategy {
    pub const NAME: &'static str = "rule-based";

    pub fn feedback(&self, ctx: &SubmissionContext) -> GeneratedFeedback {
        let topic = ctx.topic.as_deref();
        match classify(ctx.student_answer.as_deref(), ctx.correct_answer.as_deref()) {
            Verdict::Correct => GeneratedFeedback {
                feedback_text: format!(
                    "🎉 Excellent work! Your answer is correct. You've demonstrated a solid \
                     understanding of {} at the {} level. Keep up the great work!",
                    non_blank(topic).unwrap_or("this topic"),
                    non_blank(ctx.difficulty.as_deref()).unwrap_or("standard")
                ),
                hint: mastery_hint(ctx.difficulty.as_deref()).to_string(),
            },
            Verdict::Partial => GeneratedFeedback {
                feedback_text: format!(
                    "👍 You're on the right track! Your answer shows partial understanding of {}. \
                     Review your response and think about what might be missing or needs clarification.",
                    non_blank(topic).unwrap_or("this concept")
                ),
                hint: format!(
                    "💡 Hint: Look at the question again. The key concept involves '{}'. \
                     Think about how each part of your answer relates to the question.",
                    non_blank(topic).unwrap_or("the main subject")
                ),
            },
            Verdict::Incorrect => GeneratedFeedback {
                feedback_text: format!(
                    "📚 Not quite right, but mistakes are part of learning! Let's review {} \
                     together. Take a moment to reconsider the question and try again.",
                    non_blank(topic).unwrap_or("this topic")
                ),
                hint: incorrect_hint(ctx),
            },
        }
    }

    pub fn hint(&self, ctx: &HintContext) -> String {
        let topic = non_blank(ctx.topic.as_deref());
        match ctx.level() {
            HintLevel::General => format!(
                "💡 First hint: Read the question carefully and think about {}. \
                 What have you already learned about it?",
                topic.map_or("the topic".to_string(), |t| format!("the topic '{}'", t))
            ),
            HintLevel::Directional => format!(
                "💡 Second hint: Break the question into smaller parts. For {}, think about \
                 which method or formula could apply.",
                topic.map_or("this topic".to_string(), |t| format!("'{}'", t))
            ),
            HintLevel::Detailed => format!(
                "💡 Detailed hint: Go step by step. Step 1: identify what the question gives you. \
                 Step 2: identify what you need to find. Step 3: apply what you know about {} to \
                 connect the two. If you are still stuck, review the course material!",
                topic.map_or("this topic".to_string(), |t| format!("'{}'", t))
            ),
        }
    }

    pub fn explanation(&self, ctx: &ExplanationContext) -> String {
        let question = non_blank(ctx.student_question.as_deref());
        let mut text = String::from("📖 Explanation:\n\n");

        if ctx.has_material_content() {
            text.push_str("Based on the study material, here is some guidance for your question:\n\n");
            if let Some(question) = question {
                text.push_str(&format!("❓ Question: {}\n\n", question));
            }
            text.push_str("💡 ");
            text.push_str(match ctx.previous.len() {
                0 => {
                    "Review the material carefully. Look for keywords related to your question \
                     in the document and try to connect the concepts with each other.\n\n"
                }
                1 => {
                    "Try looking at the question from a different angle. Compare the examples in \
                     the material with the specific situation you are wondering about. Drawing a \
                     diagram or writing out the steps often makes the concept clearer.\n\n"
                }
                _ => {
                    "Analyse each part of the question in detail. Identify the key concepts, then \
                     find their definitions and examples in the material. If it is still unclear, \
                     try explaining it in your own words to check your understanding.\n\n"
                }
            });
            text.push_str(
                "📚 Tip: Read the relevant section closely, look for worked examples and try \
                 applying them to your case. Don't hesitate to ask more questions!",
            );
        } else {
            text.push_str(&format!(
                "⚠️ No material content is available right now. For the question \"{}\", try:\n\n",
                question.unwrap_or("your question")
            ));
            text.push_str("1. Identify the key words in the question\n");
            text.push_str("2. Recall the background knowledge it relates to\n");
            text.push_str("3. Connect the concepts with each other\n");
            text.push_str("4. Look for additional references if needed\n\n");
            text.push_str("💪 Keep learning and keep asking questions!");
        }
        text
    }

    /// Threshold rules over lifetime accuracy; recent history is not consulted.
    pub fn recommendations(&self, snapshot: &AnalyticsSnapshot) -> Vec<LearningRecommendation> {
        let student_id = snapshot.student_id;
        let recommend = |next_topic: String, explanation: String| LearningRecommendation {
            student_id,
            next_topic,
            explanation,
        };

        if snapshot.total_attempts == 0 {
            return vec![recommend(
                "Start learning".to_string(),
                "👋 Welcome! Complete a few exercises so your strengths and weaknesses can be analysed."
                    .to_string(),
            )];
        }

        let accuracy = snapshot.accuracy();
        let mut recommendations = Vec::new();

        if accuracy < 50.0 {
            if let Some(weak) = snapshot.top_weak_topic() {
                recommendations.push(recommend(
                    format!("Review: {}", weak),
                    format!(
                        "📚 Your accuracy is {:.1}%. Review the fundamentals of \"{}\", the topic that needs the most work.",
                        accuracy, weak
                    ),
                ));
            }
        } else if accuracy < 80.0 {
            if let Some(weak) = snapshot.top_weak_topic() {
                recommendations.push(recommend(
                    format!("Reinforce: {}", weak),
                    format!(
                        "💪 Good job! Your accuracy is {:.1}%. Reinforce \"{}\" to push it higher.",
                        accuracy, weak
                    ),
                ));
            }
        } else if let Some(strong) = snapshot.top_strong_topic() {
            recommendations.push(recommend(
                format!("Advance: {}", strong),
                format!(
                    "🌟 Excellent! Your accuracy is {:.1}%. Challenge yourself with advanced exercises on \"{}\".",
                    accuracy, strong
                ),
            ));
        }

        recommendations.push(recommend(
            "Practice regularly".to_string(),
            "📆 Practice for 15-30 minutes every day to maintain and grow your skills!".to_string(),
        ));
        recommendations.truncate(MAX_RECOMMENDATIONS);
        recommendations
    }

    pub fn chat_reply(&self, ctx: &ChatContext) -> String {
        let message = non_blank(Some(ctx.message.as_str())).unwrap_or("your question");
        format!(
            "🤖 Thanks for asking about \"{}\". The AI tutor is not available right now, so here is \
             some general advice: re-read the related material, break the problem into smaller steps \
             and try a few practice exercises. Feel free to ask again later!",
            message
        )
    }

    pub fn materials(&self, ctx: &MaterialsContext) -> String {
        let topic = non_blank(ctx.current_topic.as_deref()).unwrap_or("your current topic");
        let mut text = format!(
            "📚 Suggested materials:\n1. Theory notes on {}\n2. Practice exercises on {}",
            topic, topic
        );
        if !ctx.weak_topics.is_empty() {
            text.push_str(&format!(
                "\n3. Reinforcement exercises for: {}",
                ctx.weak_topics.join(", ")
            ));
        }
        text
    }
}

fn mastery_hint(difficulty: Option<&str>) -> &'static str {
    match difficulty.map(|d| d.trim().to_lowercase()).as_deref() {
        Some("easy") => {
            "💡 Ready for a challenge? Try some medium difficulty questions to test your skills further!"
        }
        Some("medium") => {
            "💡 Great progress! Consider attempting hard questions to push your boundaries."
        }
        _ => "💡 Impressive! You've mastered this level. Explore advanced topics or help others learn!",
    }
}

fn incorrect_hint(ctx: &SubmissionContext) -> String {
    let long_question = ctx
        .question_text
        .as_deref()
        .map_or(false, |q| q.chars().count() > 20);
    if long_question {
        format!(
            "💡 Hint: Re-read the question carefully and pay attention to key terms. The answer \
             relates to {}. Consider what you know about this topic.",
            non_blank(ctx.topic.as_deref()).unwrap_or("the concept being tested")
        )
    } else {
        "💡 Hint: Break the problem down into smaller parts. What do you know for sure? Start \
         from there and build your answer step by step."
            .to_string()
    }
}

#[async_trait]
impl GenerationStrategy for RuleBasedStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate_feedback(
        &self,
        ctx: &SubmissionContext,
    ) -> GenerationResult<Generated<GeneratedFeedback>> {
        Ok(Generated::primary(self.feedback(ctx)))
    }

    async fn generate_hint(&self, ctx: &HintContext) -> GenerationResult<Generated<String>> {
        Ok(Generated::primary(self.hint(ctx)))
    }

    async fn generate_explanation(
        &self,
        ctx: &ExplanationContext,
    ) -> GenerationResult<Generated<String>> {
        Ok(Generated::primary(self.explanation(ctx)))
    }

    async fn suggest_next_steps(
        &self,
        snapshot: &AnalyticsSnapshot,
    ) -> GenerationResult<Generated<Vec<LearningRecommendation>>> {
        Ok(Generated::primary(self.recommendations(snapshot)))
    }

    async fn chat(&self, ctx: &ChatContext) -> GenerationResult<Generated<String>> {
        Ok(Generated::primary(self.chat_reply(ctx)))
    }

    async fn suggest_materials(
        &self,
        ctx: &MaterialsContext,
    ) -> GenerationResult<Generated<String>> {
        Ok(Generated::primary(self.materials(ctx)))
    }
}
