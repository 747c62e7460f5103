use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub static TYPE_MULTIPLE_CHOICE: &str = "multiple_choice";
pub static TYPE_CHECKBOXES: &str = "checkboxes";
pub static TYPE_DROPDOWN: &str = "dropdown";
pub static TYPE_SHORT_ANSWER: &str = "short_answer";
pub static TYPE_PARAGRAPH: &str = "paragraph";

/// Answer slot sentinels kept compatible with the stored data: -1 means no
/// selection (or a text answer), -2 means "multi-select was used".
pub const SELECTED_NONE: i32 = -1;
pub const SELECTED_MULTI: i32 = -2;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    quiz_id: Uuid,
    question_type: String,
    text: String,
    options: Vec<String>,
    correct_index: Option<i32>,
    correct_indexes: Option<Vec<i32>>,
    image_url: Option<String>,
    order_index: i32,
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn question_type(&self) -> &str {
        &self.question_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_index(&self) -> Option<i32> {
        self.correct_index
    }

    pub fn correct_indexes(&self) -> Option<&[i32]> {
        self.correct_indexes.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionCreate {
    pub quiz_id: Uuid,
    pub question_type: String,
    pub text: String,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<i32>,
    pub correct_indexes: Option<Vec<i32>>,
    pub image_url: Option<String>,
    pub order_index: Option<i32>,
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, uuid::Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO questions
                (id, quiz_id, question_type, text, options, correct_index, correct_indexes, image_url, order_index)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.quiz_id)
        .bind(&data.question_type)
        .bind(&data.text)
        .bind(data.options.unwrap_or_default())
        .bind(data.correct_index)
        .bind(&data.correct_indexes)
        .bind(&data.image_url)
        .bind(data.order_index.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE questions
            SET question_type = $1, text = $2, options = $3, correct_index = $4,
                correct_indexes = $5, image_url = $6, order_index = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&data.question_type)
        .bind(&data.text)
        .bind(data.options.unwrap_or_default())
        .bind(data.correct_index)
        .bind(&data.correct_indexes)
        .bind(&data.image_url)
        .bind(data.order_index.unwrap_or(0))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM questions ORDER BY order_index LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Question {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let owner: Uuid = sqlx::query_scalar("SELECT created_by FROM quizzes WHERE id = $1")
            .bind(self.quiz_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(owner)
    }
}

// Utils

impl Question {
    pub async fn find_all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<Self> = sqlx::query_as(
            r#"
            SELECT *
            FROM questions q
            WHERE q.quiz_id = $1
            ORDER BY q.order_index
            "#,
        )
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

/// What the student sent for one question.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub selected_index: Option<i32>,
    pub selected_indexes: Option<Vec<i32>>,
    pub text_answer: Option<String>,
}

/// Outcome of grading one submitted answer.
#[derive(Debug, PartialEq)]
pub struct GradedSelection {
    pub selected_index: i32,
    pub text_answer: Option<String>,
    pub is_correct: bool,
}

impl Question {
    /// Only single-index types are auto-graded. Checkbox answers are stored
    /// with a multi sentinel and left for manual grading, text answers keep
    /// the text and are never auto-correct.
    pub fn grade(&self, submitted: &SubmittedAnswer) -> GradedSelection {
        match self.question_type.as_str() {
            t if t == TYPE_MULTIPLE_CHOICE || t == TYPE_DROPDOWN => {
                let selected = submitted.selected_index.unwrap_or(SELECTED_NONE);
                let is_correct = selected >= 0 && self.correct_index == Some(selected);
                GradedSelection {
                    selected_index: selected,
                    text_answer: None,
                    is_correct,
                }
            }
            t if t == TYPE_CHECKBOXES => {
                let any_selected = submitted
                    .selected_indexes
                    .as_ref()
                    .is_some_and(|v| !v.is_empty());
                GradedSelection {
                    selected_index: if any_selected {
                        SELECTED_MULTI
                    } else {
                        SELECTED_NONE
                    },
                    text_answer: None,
                    is_correct: false,
                }
            }
            _ => GradedSelection {
                selected_index: SELECTED_NONE,
                text_answer: Some(submitted.text_answer.clone().unwrap_or_default()),
                is_correct: false,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn question(question_type: &str, correct_index: Option<i32>) -> Question {
        Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::new_v4(),
            question_type: question_type.to_string(),
            text: String::from("Apa itu kontras?"),
            options: vec![String::from("a"), String::from("b"), String::from("c")],
            correct_index,
            correct_indexes: None,
            image_url: None,
            order_index: 0,
        }
    }

    fn submitted(
        selected_index: Option<i32>,
        selected_indexes: Option<Vec<i32>>,
        text_answer: Option<&str>,
    ) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: Uuid::new_v4(),
            selected_index,
            selected_indexes,
            text_answer: text_answer.map(String::from),
        }
    }

    #[test]
    fn grades_single_choice() {
        let q = question(TYPE_MULTIPLE_CHOICE, Some(1));
        assert!(q.grade(&submitted(Some(1), None, None)).is_correct);
        assert!(!q.grade(&submitted(Some(0), None, None)).is_correct);
        assert!(!q.grade(&submitted(None, None, None)).is_correct);
    }

    #[test]
    fn grades_dropdown() {
        let q = question(TYPE_DROPDOWN, Some(2));
        assert!(q.grade(&submitted(Some(2), None, None)).is_correct);
    }

    #[test]
    fn missing_correct_index_never_matches() {
        let q = question(TYPE_MULTIPLE_CHOICE, None);
        assert!(!q.grade(&submitted(Some(0), None, None)).is_correct);
    }

    #[test]
    fn checkboxes_are_not_auto_graded() {
        let q = question(TYPE_CHECKBOXES, None);
        let graded = q.grade(&submitted(None, Some(vec![0, 2]), None));
        assert_eq!(graded.selected_index, SELECTED_MULTI);
        assert!(!graded.is_correct);

        let empty = q.grade(&submitted(None, Some(vec![]), None));
        assert_eq!(empty.selected_index, SELECTED_NONE);
    }

    #[test]
    fn text_answers_keep_their_text() {
        let q = question(TYPE_PARAGRAPH, None);
        let graded = q.grade(&submitted(None, None, Some("jawaban panjang")));
        assert_eq!(graded.selected_index, SELECTED_NONE);
        assert_eq!(graded.text_answer.as_deref(), Some("jawaban panjang"));
        assert!(!graded.is_correct);
    }
}
