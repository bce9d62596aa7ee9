use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tutor",
    version,
    about = "Personalised feedback, hints and study recommendations"
)]
pub struct TutorArgs {
    #[arg(short, long, value_name = "FILE", global = true, help = "YAML or JSON configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "override",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        global = true,
        help = "Override a configuration value, e.g. llm.model=gpt-4o-mini"
    )]
    pub overrides: Vec<String>,

    #[arg(long, value_name = "PATH", global = true, help = "SQLite database for records")]
    pub database: Option<String>,

    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Fields shared by feedback and hint requests.
#[derive(Args, Debug, Clone)]
pub struct QuestionArgs {
    #[arg(long)]
    pub student: i64,

    #[arg(long)]
    pub question: i64,

    #[arg(long, value_name = "TEXT")]
    pub question_text: Option<String>,

    #[arg(long, value_name = "TEXT")]
    pub correct_answer: Option<String>,

    #[arg(long)]
    pub topic: Option<String>,

    #[arg(long)]
    pub difficulty: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long, help = "Course to fetch materials and tests from")]
    pub course: Option<i64>,

    #[arg(long, help = "Assessment within the course")]
    pub assessment: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Grade an answer and generate feedback")]
    Feedback {
        #[command(flatten)]
        question: QuestionArgs,

        #[arg(long, value_name = "TEXT")]
        answer: Option<String>,
    },

    #[command(about = "Generate the next hint for a question")]
    Hint {
        #[command(flatten)]
        question: QuestionArgs,
    },

    #[command(about = "Explain a piece of course material")]
    Explain {
        #[arg(long)]
        student: i64,

        #[arg(long)]
        material: i64,

        #[arg(long, value_name = "TEXT")]
        question: Option<String>,
    },

    #[command(about = "Recommend what to study next")]
    Recommend {
        #[arg(long)]
        student: i64,
    },

    #[command(about = "List hints already given for a question")]
    Hints {
        #[arg(long)]
        student: i64,

        #[arg(long)]
        question: i64,
    },

    #[command(about = "Show a student's feedback history")]
    History {
        #[arg(long)]
        student: i64,

        #[arg(long, help = "Only the most recent feedback")]
        latest: bool,

        #[arg(long, help = "Explanation history for this material instead")]
        material: Option<i64>,
    },

    #[command(about = "Summarise a student's performance")]
    Profile {
        #[arg(long)]
        student: i64,
    },

    #[command(about = "Ask the tutor a free-form question")]
    Chat {
        #[arg(long)]
        student: i64,

        message: String,

        #[arg(long, value_name = "TEXT")]
        context: Option<String>,

        #[arg(long, help = "Current topic; enables material suggestions")]
        topic: Option<String>,
    },
}
