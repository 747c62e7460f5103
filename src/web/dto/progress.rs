use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentProgressResponse {
    pub total_lessons: i64,
    pub read_lessons: i64,
    pub total_quizzes: i64,
    pub completed_quizzes: i64,
    /// Mean quiz score in percent, 0 when nothing was submitted yet.
    pub average_score: f64,
    /// Read lessons plus completed quizzes over everything assigned, in percent.
    pub progress_percent: f64,
    pub quiz_scores: Vec<QuizScore>,
    pub module_progress: Vec<ModuleProgress>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizScore {
    pub quiz_id: Uuid,
    pub correct: i64,
    pub total: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ModuleProgress {
    pub module_id: Uuid,
    pub title: String,
    pub total_lessons: i64,
    pub read_lessons: i64,
    pub percent: f64,
}

/// Platform-wide numbers for the teacher dashboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AnalyticsResponse {
    pub total_students: i64,
    pub total_modules: i64,
    pub total_quizzes: i64,
    pub total_submissions: i64,
    pub total_completions: i64,
    /// Completions over students times quizzes, in percent.
    pub completion_rate: f64,
    pub average_score: f64,
}
