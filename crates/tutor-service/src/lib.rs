// crates/tutor-service/src/lib.rs
pub mod analytics;
pub mod api;
pub mod planner;
pub mod service;

pub use analytics::PerformanceAnalytics;
pub use api::*;
pub use planner::RecommendationPlanner;
pub use service::TutorService;
