use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Question, QuizWithStateRow, SubmittedAnswer};
use crate::web::AuthenticatedUser;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizListItem {
    pub id: Uuid,
    pub module_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub time_limit_sec: Option<i32>,
    pub completed: bool,
    pub retakes_left: i32,
    pub lesson_read: bool,
}

impl From<QuizWithStateRow> for QuizListItem {
    fn from(row: QuizWithStateRow) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            lesson_id: row.lesson_id,
            title: row.title,
            time_limit_sec: row.time_limit_sec,
            completed: row.completed,
            retakes_left: row.retakes_left,
            lesson_read: row.lesson_read,
        }
    }
}

/// One question as the caller sees it. Students never receive the answer key.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub question_type: String,
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_indexes: Option<Vec<i32>>,
    pub image_url: Option<String>,
    pub order_index: i32,
}

impl QuestionResponse {
    pub fn from_entity(question: Question, viewer: &AuthenticatedUser) -> Self {
        let show_key = viewer.is_teacher();

        Self {
            id: question.id(),
            question_type: question.question_type().to_string(),
            text: question.text().to_string(),
            options: question.options().to_vec(),
            correct_index: if show_key {
                question.correct_index()
            } else {
                None
            },
            correct_indexes: if show_key {
                question.correct_indexes().map(<[i32]>::to_vec)
            } else {
                None
            },
            image_url: question.image_url().map(String::from),
            order_index: question.order_index(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizWithQuestions {
    pub id: Uuid,
    pub module_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    pub title: String,
    pub time_limit_sec: Option<i32>,
    pub questions: Vec<QuestionResponse>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    pub total_questions: i64,
    pub correct_answers: i64,
    pub score_percent: f64,
}

/// Manual grade override for a stored answer.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GradeBody {
    pub is_correct: bool,
}
