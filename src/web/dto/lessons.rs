use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::LessonWithStatusRow;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content: String,
    attachment_url: Option<String>,
    read: bool,
}

impl From<LessonWithStatusRow> for LessonResponse {
    fn from(row: LessonWithStatusRow) -> Self {
        Self {
            id: row.id,
            module_id: row.module_id,
            title: row.title,
            content: row.content,
            attachment_url: row.attachment_url,
            read: row.read,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LessonReadBody {
    /// Seconds the client reports the lesson stayed open.
    pub dwell_secs: i64,
}
