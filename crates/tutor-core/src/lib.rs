// crates/tutor-core/src/lib.rs
pub mod classifier;
pub mod config;
pub mod error;
pub mod hint_level;
pub mod redaction;
pub mod traits;
pub mod types;
pub mod utils;

pub use classifier::{classify, is_exact_match, normalize, Verdict};
pub use error::{ChatError, GenerationError, GenerationResult, TutorError, TutorResult};
pub use hint_level::{select_level, HintLevel};
