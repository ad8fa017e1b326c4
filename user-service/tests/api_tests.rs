mod common;

use auth::Identity;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common::TestApp;
use reqwest::header::HeaderValue;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

#[tokio::test]
async fn test_register_user_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users/register")
        .json(&json!({
            "name": "Lilly",
            "email": "lilly@example.com",
            "password": "pass_word!"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["name"], "Lilly");
    assert_eq!(body["data"]["email"], "lilly@example.com");
    assert!(body["data"]["id"].is_i64());
    assert!(body["data"]["created_at"].is_string());
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn test_register_user_reports_every_violation_in_order() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users/register")
        .json(&json!({
            "name": "",
            "email": "not-an-email",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["data"]["errors"],
        json!([
            "name is required",
            "email is not valid",
            "password is required"
        ])
    );
}

#[tokio::test]
async fn test_register_user_duplicate_email() {
    let app = TestApp::spawn().await;

    app.register("Lilly", "lilly@example.com", "pass_word!").await;

    let response = app
        .post("/api/users/register")
        .json(&json!({
            "name": "Another Lilly",
            "email": "lilly@example.com",
            "password": "pass_word!2"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn test_login_returns_user_and_token() {
    let app = TestApp::spawn().await;

    app.register("Lilly", "lilly@example.com", "pass_word!").await;

    let response = app
        .post("/api/users/login")
        .json(&json!({
            "email": "lilly@example.com",
            "password": "pass_word!"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["user"]["email"], "lilly@example.com");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let token = body["data"]["token"].as_str().unwrap();
    let claims = app.token_service.verify(token).expect("Token should verify");
    assert_eq!(claims.email, "lilly@example.com");
    assert_eq!(claims.name, "Lilly");
    assert_eq!(claims.uid, body["data"]["user"]["id"].as_i64().unwrap());
    assert_eq!(claims.exp - claims.iat, 4 * 60 * 60);

    // The claims are readable by the client, the hash is never in them.
    let payload = token.split('.').nth(1).unwrap();
    let decoded: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
    assert_eq!(decoded["email"], "lilly@example.com");
    assert!(decoded.get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;

    app.register("Lilly", "lilly@example.com", "pass_word!").await;

    let wrong_password = app
        .post("/api/users/login")
        .json(&json!({
            "email": "lilly@example.com",
            "password": "pass_word?"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    let unknown_email = app
        .post("/api/users/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": "pass_word!"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_email: Value = unknown_email.json().await.unwrap();
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["data"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users/login")
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["data"]["errors"],
        json!(["email is required", "password is required"])
    );
}

#[tokio::test]
async fn test_unreadable_bodies_use_the_error_envelope() {
    let app = TestApp::spawn().await;

    let malformed = app
        .post("/api/users/register")
        .header("content-type", "application/json")
        .body("{\"name\": \"Lilly\",")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body: Value = malformed.json().await.unwrap();
    assert_eq!(body["status_code"], 400);
    assert!(body["data"]["message"].is_string());

    let wrong_type = app
        .post("/api/users/login")
        .json(&json!({ "email": 42, "password": ["x"] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    let body: Value = wrong_type.json().await.unwrap();
    assert_eq!(body["status_code"], 400);
    assert!(body["data"]["message"].is_string());
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/users")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "No token provided");
}

#[tokio::test]
async fn test_token_accepted_from_custom_header_and_bearer() {
    let app = TestApp::spawn().await;

    let (_, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let via_header = app
        .get_authenticated("/api/users", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(via_header.status(), StatusCode::OK);

    let via_bearer = app
        .get("/api/users")
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(via_bearer.status(), StatusCode::OK);

    let body: Value = via_bearer.json().await.unwrap();
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn test_custom_header_wins_over_bearer() {
    let app = TestApp::spawn().await;

    let (_, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let response = app
        .get_authenticated("/api/users", "garbage")
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unreadable_custom_header_is_not_skipped_for_bearer() {
    let app = TestApp::spawn().await;

    let (_, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let response = app
        .get("/api/users")
        .header(
            common::TOKEN_HEADER,
            HeaderValue::from_bytes(b"\xff\xfe-not-text").unwrap(),
        )
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "Invalid token");
}

#[tokio::test]
async fn test_rejected_tokens_share_one_message() {
    let app = TestApp::spawn().await;

    let (id, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;
    let identity = Identity::new(id, "Lilly", "lilly@example.com");

    // Flip one character inside the signature.
    let mut tampered_signature = token.clone().into_bytes();
    let index = tampered_signature.len() - 10;
    tampered_signature[index] = if tampered_signature[index] == b'A' {
        b'B'
    } else {
        b'A'
    };
    let tampered_signature = String::from_utf8(tampered_signature).unwrap();

    // Swap the payload for one claiming another user.
    let parts: Vec<&str> = token.split('.').collect();
    let forged_payload = URL_SAFE_NO_PAD.encode(
        json!({
            "uid": id + 1,
            "name": "Mallory",
            "email": "mallory@example.com",
            "iss": "user-service",
            "aud": "user-service-clients",
            "iat": 0,
            "exp": i64::MAX / 2
        })
        .to_string(),
    );
    let tampered_payload = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    let rejected = vec![
        tampered_signature,
        tampered_payload,
        app.expired_token(&identity),
        app.foreign_token(&identity),
        "not.a.token".to_string(),
    ];

    for token in rejected {
        let response = app
            .get_authenticated("/api/users", &token)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["data"]["message"], "Invalid token");
    }
}

#[tokio::test]
async fn test_get_user() {
    let app = TestApp::spawn().await;

    let (id, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let response = app
        .get_authenticated(&format!("/api/users/{}", id), &token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["name"], "Lilly");

    let missing = app
        .get_authenticated("/api/users/999", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_integer_id_is_bad_request() {
    let app = TestApp::spawn().await;

    let (_, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let get = app
        .get_authenticated("/api/users/abc", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(get.status(), StatusCode::BAD_REQUEST);

    let update = app
        .put_authenticated("/api/users/abc", &token)
        .json(&json!({ "name": "Lilly B" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(update.status(), StatusCode::BAD_REQUEST);

    let delete = app
        .delete_authenticated("/api/users/abc", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(delete.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_validates_only_present_fields() {
    let app = TestApp::spawn().await;

    let (id, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let response = app
        .put_authenticated(&format!("/api/users/{}", id), &token)
        .json(&json!({ "email": "nope" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["errors"], json!(["email is not valid"]));

    let response = app
        .put_authenticated(&format!("/api/users/{}", id), &token)
        .json(&json!({ "name": "Lilly B" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "User updated");

    let user: Value = app
        .get_authenticated(&format!("/api/users/{}", id), &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user["data"]["name"], "Lilly B");
    assert_eq!(user["data"]["email"], "lilly@example.com");
}

#[tokio::test]
async fn test_update_password_then_login_with_new_one() {
    let app = TestApp::spawn().await;

    let (id, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let response = app
        .put_authenticated(&format!("/api/users/{}", id), &token)
        .json(&json!({ "password": "new_pass_word" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let old = app
        .post("/api/users/login")
        .json(&json!({
            "email": "lilly@example.com",
            "password": "pass_word!"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    app.login("lilly@example.com", "new_pass_word").await;
}

#[tokio::test]
async fn test_update_email_to_taken_one_conflicts() {
    let app = TestApp::spawn().await;

    app.register("Bob", "bob@example.com", "pass_word!").await;
    let (id, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let response = app
        .put_authenticated(&format!("/api/users/{}", id), &token)
        .json(&json!({ "email": "bob@example.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_and_delete_missing_user() {
    let app = TestApp::spawn().await;

    let (_, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let update = app
        .put_authenticated("/api/users/999", &token)
        .json(&json!({ "name": "Ghost" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let delete = app
        .delete_authenticated("/api/users/999", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user() {
    let app = TestApp::spawn().await;

    let (id, token) = app
        .register_and_login("Lilly", "lilly@example.com", "pass_word!")
        .await;

    let response = app
        .delete_authenticated(&format!("/api/users/{}", id), &token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["message"], "User deleted");

    // Tokens are stateless, so the old token still authenticates.
    let gone = app
        .get_authenticated(&format!("/api/users/{}", id), &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
