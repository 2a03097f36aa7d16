/// Router-level tests for the Dutyroster API
///
/// These drive the full middleware stack with `tower::ServiceExt::oneshot`
/// against an in-memory store.

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use dutyroster_shared::hierarchy::{Scope, WILDCARD};
use dutyroster_shared::models::user::Role;
use serde_json::{json, Value};

fn register_body(username: &str, role: &str, scope: [i32; 4]) -> Value {
    json!({
        "username": username,
        "password": "correct horse",
        "type": role,
        "unit": scope[0],
        "depot": scope[1],
        "platoon": scope[2],
        "section": scope[3],
        "man": 1,
        "first_name": "John",
        "last_name": "Doe",
        "rank": "CPL"
    })
}

fn update_body(task: &Value, completed: bool, verified: bool) -> Value {
    json!({
        "id": task["id"],
        "name": task["name"],
        "assigned_to": task["assigned_to"],
        "completed": completed,
        "verified": verified
    })
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let ctx = TestContext::new();

    let (status, session) = ctx
        .post("/api/v1/register", None, register_body("jdoe", "normal", [1, 2, 5, 9]))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", session);
    assert_eq!(session["type"], "normal");
    assert!(session["jwt"].is_string());

    let (status, login) = ctx
        .post(
            "/api/v1/login",
            None,
            json!({ "username": "jdoe", "password": "correct horse" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["id"], session["id"]);

    let token = login["jwt"].as_str().unwrap();
    let (status, profile) = ctx.get("/api/v1/users/self", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "jdoe");
    assert_eq!(profile["type"], "normal");
    assert_eq!(profile["platoon"], 5);
    assert_eq!(profile["rank"], "CPL");
    assert!(profile.get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_rejections_are_uniform() {
    let ctx = TestContext::new();
    ctx.post("/api/v1/register", None, register_body("jdoe", "normal", [1, 2, 5, 9]))
        .await;

    let (wrong_status, wrong) = ctx
        .post(
            "/api/v1/login",
            None,
            json!({ "username": "jdoe", "password": "wrong password" }),
        )
        .await;
    let (unknown_status, unknown) = ctx
        .post(
            "/api/v1/login",
            None,
            json!({ "username": "nobody", "password": "correct horse" }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let mut body = register_body("jdoe", "normal", [1, 2, 5, 9]);
    body["password"] = json!("short");
    body["username"] = json!("");
    let (status, error) = ctx.post("/api/v1/register", None, body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], "validation_error");
    let fields: Vec<&str> = error["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["password", "username"]);

    let (status, error) = ctx
        .post("/api/v1/register", None, register_body("jdoe", "normal", [1, 2, -1, 9]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "bad_request");
}

#[tokio::test]
async fn test_duplicate_username() {
    let ctx = TestContext::new();
    ctx.user("jdoe", Role::Normal, Scope::new(1, 2, 5, 9)).await;

    let (status, error) = ctx
        .post("/api/v1/register", None, register_body("jdoe", "normal", [1, 2, 5, 9]))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "conflict");
}

#[tokio::test]
async fn test_protected_routes_need_a_valid_token() {
    let ctx = TestContext::new();

    let (status, error) = ctx.send(Method::GET, "/api/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["error"], "unauthorized");

    let (status, _) = ctx.get("/api/v1/tasks", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_creates_within_scope() {
    let ctx = TestContext::new();
    let admin = ctx.user("admin", Role::Admin, Scope::new(1, 2, WILDCARD, WILDCARD)).await;
    let inside = ctx.user("inside", Role::Normal, Scope::new(1, 2, 5, 9)).await;
    let outside = ctx.user("outside", Role::Normal, Scope::new(1, 3, 5, 9)).await;

    let (status, task) = ctx
        .post(
            "/api/v1/tasks",
            Some(&admin.token),
            json!({ "name": "Clean rifle", "assigned_to": inside.user.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", task);
    assert_eq!(task["assigned_by"], json!(admin.user.id));
    assert_eq!(task["completed"], false);
    assert_eq!(task["verified_by"], Value::Null);

    let (status, error) = ctx
        .post(
            "/api/v1/tasks",
            Some(&admin.token),
            json!({ "name": "Guard duty", "assigned_to": outside.user.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["error"], "forbidden");

    let (status, error) = ctx
        .post(
            "/api/v1/tasks",
            Some(&admin.token),
            json!({ "name": "", "assigned_to": inside.user.id }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_normal_user_cannot_create() {
    let ctx = TestContext::new();
    let soldier = ctx.user("soldier", Role::Normal, Scope::new(1, 2, 5, 9)).await;

    let (status, _) = ctx
        .post(
            "/api/v1/tasks",
            Some(&soldier.token),
            json!({ "name": "Day off", "assigned_to": soldier.user.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_lifecycle_over_http() {
    let ctx = TestContext::new();
    let admin = ctx.user("admin", Role::Admin, Scope::new(1, 2, WILDCARD, WILDCARD)).await;
    let soldier = ctx.user("soldier", Role::Normal, Scope::new(1, 2, 5, 9)).await;

    let (_, task) = ctx
        .post(
            "/api/v1/tasks",
            Some(&admin.token),
            json!({ "name": "Clean rifle", "assigned_to": soldier.user.id }),
        )
        .await;

    // verifying incomplete work
    let (status, error) = ctx
        .put("/api/v1/tasks", &admin.token, update_body(&task, false, true))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], "invalid_transition");

    let (status, done) = ctx
        .put("/api/v1/tasks", &soldier.token, update_body(&task, true, false))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", done);
    assert_eq!(done["completed"], true);

    let mut renamed = update_body(&done, true, false);
    renamed["name"] = json!("Nap");
    let (status, _) = ctx.put("/api/v1/tasks", &soldier.token, renamed).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .put("/api/v1/tasks", &soldier.token, update_body(&done, true, true))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, verified) = ctx
        .put("/api/v1/tasks", &admin.token, update_body(&done, true, true))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["verified_by"], json!(admin.user.id));

    let (status, views) = ctx.get("/api/v1/tasks", &soldier.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(views.as_array().unwrap().len(), 1);
    assert_eq!(views[0]["assigned_by_name"], "LT admin Doe");
    assert_eq!(views[0]["verified_by_name"], "LT admin Doe");

    let (status, unverified) = ctx
        .put("/api/v1/tasks", &admin.token, update_body(&verified, true, false))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unverified["verified_by"], Value::Null);
}

#[tokio::test]
async fn test_delete_task() {
    let ctx = TestContext::new();
    let admin = ctx.user("admin", Role::Admin, Scope::new(1, WILDCARD, WILDCARD, WILDCARD)).await;
    let soldier = ctx.user("soldier", Role::Normal, Scope::new(1, 2, 5, 9)).await;

    let (_, task) = ctx
        .post(
            "/api/v1/tasks",
            Some(&admin.token),
            json!({ "name": "Clean rifle", "assigned_to": soldier.user.id }),
        )
        .await;

    let (status, _) = ctx
        .delete("/api/v1/tasks", &soldier.token, json!({ "id": task["id"] }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .delete("/api/v1/tasks", &admin.token, json!({ "id": task["id"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": true, "id": task["id"] }));

    let (status, error) = ctx
        .delete("/api/v1/tasks", &admin.token, json!({ "id": task["id"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "not_found");
}

#[tokio::test]
async fn test_admin_task_listing_is_scoped() {
    let ctx = TestContext::new();
    let hq = ctx.user("hq", Role::Admin, Scope::new(1, WILDCARD, WILDCARD, WILDCARD)).await;
    let depot = ctx.user("depot", Role::Admin, Scope::new(1, 2, WILDCARD, WILDCARD)).await;
    let near = ctx.user("near", Role::Normal, Scope::new(1, 2, 5, 9)).await;
    let far = ctx.user("far", Role::Normal, Scope::new(1, 3, 5, 9)).await;

    for (name, assignee) in [("Near task", &near), ("Far task", &far)] {
        let (status, _) = ctx
            .post(
                "/api/v1/tasks",
                Some(&hq.token),
                json!({ "name": name, "assigned_to": assignee.user.id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, all) = ctx.get("/api/v1/tasks", &hq.token).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, scoped) = ctx.get("/api/v1/tasks", &depot.token).await;
    let scoped = scoped.as_array().unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0]["name"], "Near task");
}

#[tokio::test]
async fn test_user_lookups() {
    let ctx = TestContext::new();
    let admin = ctx.user("admin", Role::Admin, Scope::new(1, 2, WILDCARD, WILDCARD)).await;
    let inside = ctx.user("inside", Role::Normal, Scope::new(1, 2, 5, 9)).await;
    let outside = ctx.user("outside", Role::Normal, Scope::new(1, 3, 5, 9)).await;

    let (status, users) = ctx.get("/api/v1/users", &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["username"], "inside");

    let (status, user) = ctx
        .get(&format!("/api/v1/users/{}", inside.user.id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], json!(inside.user.id));

    let (status, _) = ctx
        .get(&format!("/api/v1/users/{}", outside.user.id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.get("/api/v1/users", &inside.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let ctx = TestContext::new();
    let admin = ctx.user("admin", Role::Admin, Scope::new(1, 2, WILDCARD, WILDCARD)).await;
    let soldier = ctx.user("soldier", Role::Normal, Scope::new(1, 2, 5, 9)).await;

    let (_, task) = ctx
        .post(
            "/api/v1/tasks",
            Some(&admin.token),
            json!({ "name": "Clean rifle", "assigned_to": soldier.user.id }),
        )
        .await;

    let mut missing_field = update_body(&task, true, false);
    missing_field.as_object_mut().unwrap().remove("verified");
    let (status, error) = ctx.put("/api/v1/tasks", &admin.token, missing_field).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", error);
    assert_eq!(error["error"], "bad_request");
    assert!(error["message"].is_string());

    let (status, error) = ctx
        .send(Method::POST, "/api/v1/tasks", Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", error);
    assert_eq!(error["error"], "bad_request");

    let (status, error) = ctx
        .send_raw(
            Method::POST,
            "/api/v1/tasks",
            &admin.token,
            "application/json",
            "{ not json",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", error);
    assert_eq!(error["error"], "bad_request");

    let (status, error) = ctx
        .send_raw(Method::DELETE, "/api/v1/tasks", &admin.token, "text/plain", "id=1")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", error);
    assert_eq!(error["error"], "bad_request");

    let (status, error) = ctx
        .post("/api/v1/login", None, json!({ "username": "admin" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "bad_request");

    // nothing changed
    let (_, views) = ctx.get("/api/v1/tasks", &admin.token).await;
    assert_eq!(views[0]["completed"], false);
}

#[tokio::test]
async fn test_router_owns_its_signing_secret() {
    let app = {
        let ctx = TestContext::new();
        ctx.app.clone()
    };

    let token = dutyroster_shared::auth::jwt::issue_token(
        uuid::Uuid::new_v4(),
        Role::Admin,
        "some-other-secret-at-least-32-bytes",
        1,
    )
    .unwrap();
    let request = axum::http::Request::builder()
        .uri("/api/v1/tasks")
        .header("authorization", format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
