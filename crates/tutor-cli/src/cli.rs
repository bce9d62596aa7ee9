//! CLI entry point and command routing.

use anyhow::{anyhow, Result};
use clap::Parser;
use log::debug;

use tutor_core::config::{load_config, parse_key_value_pair};
use tutor_service::{
    ChatRequest, ExplanationRequest, FeedbackRequest, HintRequest, TutorService,
};

use crate::args::{Command, QuestionArgs, TutorArgs};
use crate::output::{self, render, OutputOptions};
use crate::service_factory::{build_service, credentials_from_environment};

/// Parses the command line, runs the command and prints its result.
pub async fn run() -> Result<()> {
    let args = TutorArgs::parse();
    init_logging(args.verbose);
    let rendered = execute(args).await?;
    println!("{}", rendered);
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    // A logger may already be installed when embedded in tests.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init();
}

/// Runs a parsed command and returns its rendered output.
pub async fn execute(args: TutorArgs) -> Result<String> {
    let overrides = args
        .overrides
        .iter()
        .map(|pair| {
            parse_key_value_pair(pair)
                .ok_or_else(|| anyhow!("Invalid override '{}', expected KEY=VALUE", pair))
        })
        .collect::<Result<Vec<_>>>()?;
    let credentials = credentials_from_environment();
    let config = load_config(args.config.as_deref(), &overrides, &credentials)?;
    debug!("Loaded configuration with model {}", config.llm.model);

    let service = build_service(&config, args.database.as_deref()).await?;
    let options = OutputOptions {
        json_format: args.json,
    };
    dispatch(&service, args.command, &options).await
}

async fn dispatch(service: &TutorService, command: Command, options: &OutputOptions) -> Result<String> {
    match command {
        Command::Feedback { question, answer } => {
            let response = service
                .generate_feedback(feedback_request(question, answer))
                .await?;
            render(&response, options, output::feedback_text)
        }
        Command::Hint { question } => {
            let response = service.generate_hint(hint_request(question)).await?;
            render(&response, options, output::hint_text)
        }
        Command::Explain {
            student,
            material,
            question,
        } => {
            let response = service
                .generate_explanation(ExplanationRequest {
                    student_id: student,
                    material_id: material,
                    student_question: question,
                })
                .await?;
            render(&response, options, output::explanation_text)
        }
        Command::Recommend { student } => {
            let response = service.get_recommendations(student).await?;
            render(&response, options, output::recommendations_text)
        }
        Command::Hints { student, question } => {
            let entries = service.get_hint_history(student, question).await?;
            render(entries.as_slice(), options, output::hint_history_text)
        }
        Command::History {
            student,
            latest,
            material,
        } => {
            if let Some(material) = material {
                let records = service.get_explanation_history(student, material).await?;
                render(records.as_slice(), options, output::explanation_history_text)
            } else if latest {
                let record = service.get_latest_feedback(student).await?;
                render(&record, options, output::feedback_record_text)
            } else {
                let records = service.get_feedback_history(student).await?;
                render(records.as_slice(), options, output::feedback_history_text)
            }
        }
        Command::Profile { student } => {
            let profile = service.get_student_profile(student).await?;
            render(&profile, options, output::profile_text)
        }
        Command::Chat {
            student,
            message,
            context,
            topic,
        } => {
            let response = service
                .chat(ChatRequest {
                    student_id: student,
                    message,
                    learning_context: context,
                    current_topic: topic,
                })
                .await?;
            render(&response, options, output::chat_text)
        }
    }
}

fn feedback_request(question: QuestionArgs, answer: Option<String>) -> FeedbackRequest {
    FeedbackRequest {
        student_id: question.student,
        question_id: question.question,
        question_text: question.question_text,
        student_answer: answer,
        correct_answer: question.correct_answer,
        topic: question.topic,
        difficulty: question.difficulty,
        subject: question.subject,
        course_id: question.course,
        assessment_id: question.assessment,
    }
}

fn hint_request(question: QuestionArgs) -> HintRequest {
    HintRequest {
        student_id: question.student,
        question_id: question.question,
        question_text: question.question_text,
        correct_answer: question.correct_answer,
        topic: question.topic,
        difficulty: question.difficulty,
        subject: question.subject,
        course_id: question.course,
        assessment_id: question.assessment,
    }
}
