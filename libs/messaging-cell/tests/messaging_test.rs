use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use messaging_cell::{messaging_routes, MessagingService};
use security_cell::SecurityServices;
use shared_database::{now_timestamp, Database};
use shared_models::auth::Role;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    router: Router,
    db: Database,
    security: Arc<SecurityServices>,
    jwt_secret: String,
}

fn setup() -> TestApp {
    let config = TestConfig::default().to_arc();
    let db = Database::open_in_memory().unwrap();
    let security = Arc::new(SecurityServices::new(&config, db.clone()).unwrap());
    let service = Arc::new(MessagingService::new(db.clone(), security.clone()));

    TestApp {
        router: messaging_routes(service, config.clone()),
        db,
        security,
        jwt_secret: config.jwt_secret.clone(),
    }
}

impl TestApp {
    async fn register(&self, username: &str, role: Role) -> (TestUser, String) {
        let name = username.to_string();
        let id = self
            .db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (username, hashed_password, role, created_at) VALUES (?1, 'x', ?2, ?3)",
                    rusqlite::params![name, role.as_str(), now_timestamp()],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .unwrap();

        let user = TestUser::with_id(id, username, role);
        let token = JwtTestUtils::create_test_token(&user, &self.jwt_secret, Some(1));
        (user, token)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

fn send_message(token: &str, receiver_id: i64, content: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/messages/send?token={}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({"receiver_id": receiver_id, "content": content}).to_string()))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn messages_are_encrypted_and_conversation_marks_read() {
    let app = setup();
    let (patient, patient_token) = app.register("pat", Role::Patient).await;
    let (doctor, doctor_token) = app.register("dr_who", Role::Doctor).await;

    let (status, body) = app.send(send_message(&patient_token, doctor.id, "Hello doctor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    app.send(send_message(&doctor_token, patient.id, "Hello patient")).await;

    let stored: String = app
        .db
        .call(|conn| Ok(conn.query_row("SELECT content FROM messages ORDER BY id LIMIT 1", [], |row| row.get(0))?))
        .await
        .unwrap();
    assert_ne!(stored, "Hello doctor");

    let logs = app.security.audit.recent(2).await.unwrap();
    assert_eq!(logs[1].event_type, "MESSAGE_SENT");
    assert_eq!(logs[1].user_id.as_deref(), Some(patient.id.to_string().as_str()));
    assert_eq!(logs[1].details.as_deref(), Some(format!("To user {}", doctor.id).as_str()));

    let (status, body) = app
        .send(get(&format!("/messages/conversation/{}", patient.id), &doctor_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Hello doctor");
    assert_eq!(messages[0]["sender_name"], "pat");
    assert_eq!(messages[1]["content"], "Hello patient");

    let (_, body) = app.send(get("/messages/conversations", &doctor_token)).await;
    assert_eq!(body["conversations"][0]["unread"], 0);
}

#[tokio::test]
async fn inbox_summarises_each_partner() {
    let app = setup();
    let (patient, patient_token) = app.register("pat", Role::Patient).await;
    let (doctor, doctor_token) = app.register("dr_who", Role::Doctor).await;
    let (nurse, _) = app.register("nurse", Role::Patient).await;

    let long = "x".repeat(80);
    app.send(send_message(&doctor_token, patient.id, "first")).await;
    app.send(send_message(&doctor_token, patient.id, &long)).await;
    app.send(send_message(&patient_token, nurse.id, "to nurse")).await;

    let (status, body) = app.send(get("/messages/conversations", &patient_token)).await;
    assert_eq!(status, StatusCode::OK);
    let conversations = body["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 2);

    assert_eq!(conversations[0]["partner_id"], nurse.id);
    assert_eq!(conversations[0]["partner_name"], "You");
    assert_eq!(conversations[0]["unread"], 0);

    assert_eq!(conversations[1]["partner_id"], doctor.id);
    assert_eq!(conversations[1]["partner_name"], "dr_who");
    assert_eq!(conversations[1]["last_message"].as_str().unwrap().len(), 50);
    assert_eq!(conversations[1]["unread"], 2);
}

#[tokio::test]
async fn rejects_bad_input_and_missing_auth() {
    let app = setup();
    let (_, token) = app.register("pat", Role::Patient).await;

    let (status, body) = app.send(send_message(&token, 999, "anyone?")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Recipient not found");

    let (status, body) = app.send(send_message(&token, 1, "   ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message content cannot be empty");

    let (status, _) = app.send(get("/messages/conversation/abc", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/messages/conversations").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
