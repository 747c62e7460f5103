mod common;
use axum::http::StatusCode;
use kelasku::model::entity::UserEntity;
use kelasku::web::middlewares::AUTH_TOKEN;
use serde_json::json;
use tower_cookies::cookie::SameSite;

use crate::common::{
    Action, Flow, seed_teacher, setup_server, setup_test_db, signin_action, signin_teacher_action,
    signup_action,
};

#[tokio::test]
async fn route_signup_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(ent.name(), "Budi");
                    assert_eq!(ent.status(), "pending");
                })
                .with_expect(StatusCode::OK),
        )
        // try to signup twice with the same email
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_expect(StatusCode::CONFLICT),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_signin_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("Sari", "sari@kelasku.id", "rahasia123").with_save_cookies(false))
        .step(
            signin_action("sari@kelasku.id", "rahasia123")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_str(body).expect("Invalid JSON format");
                    assert_eq!(ent.name(), "Sari");
                })
                .with_expect(StatusCode::OK)
                .with_clear_cookies(true),
        )
        // wrong credentials
        .step(
            signin_action("sari@kelasku.id", "WRONGPASSWORD")
                .with_save_cookies(false)
                .with_clear_cookies(true)
                .assert_body(|body| {
                    assert!(body.contains("Authentication error"));
                })
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        // non-existing account
        .step(
            signin_action("nonexisting@kelasku.id", "nvm")
                .with_expect(StatusCode::UNAUTHORIZED)
                .assert_body(|body| assert!(body.contains("Authentication error"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_list_test() {
    let pool = setup_test_db().await;
    seed_teacher(&pool, "Guru", "guru@kelasku.id", "guru12345").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("Budi", "budi@kelasku.id", "rahasia123").with_save_cookies(true))
        // students cannot page through accounts
        .step(
            Action::new("user_list", "GET", "/api/v1/account/page")
                .assert_body(|body| {
                    assert!(body.contains("error"));
                })
                .with_param("limit", "5")
                .with_param("offset", "0")
                .with_expect(StatusCode::FORBIDDEN)
                .with_save_cookies(true),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        .step(
            Action::new("user_list", "GET", "/api/v1/account/page")
                .with_param("limit", "5")
                .with_param("offset", "0")
                .assert_body(|body| {
                    assert!(body.contains("total"));
                    assert!(body.contains("items"));
                })
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("students_list", "GET", "/api/v1/account/students")
                .assert_body(|body| {
                    assert!(body.contains("budi@kelasku.id"));
                    // the teacher account is not a student
                    assert!(!body.contains("guru@kelasku.id"));
                })
                .with_expect(StatusCode::OK),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_student_approval_test() {
    let pool = setup_test_db().await;
    seed_teacher(&pool, "Guru", "guru@kelasku.id", "guru12345").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_save_cookies(true)
                .with_save_as("budi"),
        )
        // students cannot flip their own status
        .step(
            Action::new("self_approve", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let budi = ctx.get_json::<UserEntity>("budi");
                    format!("/api/v1/account/{}", budi.id())
                })
                .with_body(json!({
                    "name": "Budi",
                    "status": "approved",
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // renaming yourself is fine
        .step(
            Action::new("self_rename", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let budi = ctx.get_json::<UserEntity>("budi");
                    format!("/api/v1/account/{}", budi.id())
                })
                .with_body(json!({
                    "name": "Budi Santoso",
                }))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("Budi Santoso"));
                }),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        // the teacher approves the student
        .step(
            Action::new("approve", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let budi = ctx.get_json::<UserEntity>("budi");
                    format!("/api/v1/account/{}", budi.id())
                })
                .with_body(json!({
                    "name": "Budi Santoso",
                    "status": "approved",
                }))
                .with_expect(StatusCode::OK)
                .assert_body(|body| {
                    assert!(body.contains("approved"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_delete_test() {
    let pool = setup_test_db().await;
    seed_teacher(&pool, "Guru", "guru@kelasku.id", "guru12345").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("Budi", "budi@kelasku.id", "rahasia123")
                .with_save_cookies(false)
                .with_save_as("budi"),
        )
        .step(
            signup_action("Sari", "sari@kelasku.id", "rahasia123")
                .with_save_cookies(true)
                .with_save_as("sari"),
        )
        // students cannot delete each other
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let budi = ctx.get_json::<UserEntity>("budi");
                    format!("/api/v1/account/{}", budi.id())
                })
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| {
                    assert!(body.contains("error"));
                }),
        )
        // self deletion is allowed
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let sari = ctx.get_json::<UserEntity>("sari");
                    format!("/api/v1/account/{}", sari.id())
                })
                .with_expect(StatusCode::OK),
        )
        .step(signin_teacher_action().with_clear_cookies(true))
        // even teachers cannot delete a user that is already gone
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let sari = ctx.get_json::<UserEntity>("sari");
                    format!("/api/v1/account/{}", sari.id())
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        // teachers can delete any student
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    let budi = ctx.get_json::<UserEntity>("budi");
                    format!("/api/v1/account/{}", budi.id())
                })
                .with_expect(StatusCode::OK),
        )
        .run(&mut server, pool)
        .await;
}
