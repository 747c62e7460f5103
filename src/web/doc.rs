use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::user_signup_handler,
        crate::web::routes::account::user_signin_handler,
        crate::web::routes::account::user_list_handler,
        crate::web::routes::account::students_list_handler,
        crate::web::routes::account::user_update_handler,
        crate::web::routes::account::user_delete_handler,
        crate::web::routes::modules::modules_list_handler,
        crate::web::routes::modules::modules_get_handler,
        crate::web::routes::modules::modules_create_handler,
        crate::web::routes::modules::modules_update_handler,
        crate::web::routes::modules::modules_delete_handler,
        crate::web::routes::lessons::lessons_get_handler,
        crate::web::routes::lessons::lessons_create_handler,
        crate::web::routes::lessons::lessons_update_handler,
        crate::web::routes::lessons::lessons_delete_handler,
        crate::web::routes::lessons::lessons_mark_read_handler,
        crate::web::routes::quizzes::quizzes_list_handler,
        crate::web::routes::quizzes::quizzes_get_handler,
        crate::web::routes::quizzes::quizzes_create_handler,
        crate::web::routes::quizzes::quizzes_update_handler,
        crate::web::routes::quizzes::quizzes_delete_handler,
        crate::web::routes::quizzes::quizzes_submit_handler,
        crate::web::routes::quizzes::quizzes_completions_handler,
        crate::web::routes::quizzes::quizzes_answers_handler,
        crate::web::routes::quizzes::quizzes_add_question_handler,
        crate::web::routes::questions::questions_update_handler,
        crate::web::routes::questions::questions_delete_handler,
        crate::web::routes::answers::answers_grade_handler,
        crate::web::routes::retakes::retakes_grant_handler,
        crate::web::routes::retakes::retakes_revoke_handler,
        crate::web::routes::retakes::retakes_by_quiz_handler,
        crate::web::routes::progress::progress_get_handler,
        crate::web::routes::progress::progress_analytics_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
