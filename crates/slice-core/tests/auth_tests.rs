use slice_core::TestApp;

// ═══ Signup ═══

#[tokio::test]
async fn test_signup_success_returns_public_user() {
    let app = TestApp::new().await;
    let body = serde_json::json!({
        "email": "mario@slice.test",
        "username": "mario",
        "password": "password123"
    });
    let res = app
        .client
        .post(&app.url("/api/auth/signup"), &body.to_string())
        .await;

    assert_eq!(res.status, 201, "{}", res.body);
    assert!(res.is_success());
    let user = res.data();
    assert_eq!(user["username"], "mario");
    assert_eq!(user["email"], "mario@slice.test");
    assert_eq!(user["role"], "customer");
    assert_eq!(user["email_verified"], true);
    assert!(!res.body.contains("password"), "hash leaked: {}", res.body);
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    app.create_user("dup@slice.test", "first", "password123").await;

    let body = serde_json::json!({
        "email": "dup@slice.test",
        "username": "second",
        "password": "password123"
    });
    let res = app
        .client
        .post(&app.url("/api/auth/signup"), &body.to_string())
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.error()["code"], "CONFLICT");
}

#[tokio::test]
async fn test_signup_duplicate_username_conflicts() {
    let app = TestApp::new().await;
    app.create_user("one@slice.test", "same", "password123").await;

    let body = serde_json::json!({
        "email": "two@slice.test",
        "username": "same",
        "password": "password123"
    });
    let res = app
        .client
        .post(&app.url("/api/auth/signup"), &body.to_string())
        .await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn test_signup_missing_fields_lists_field_errors() {
    let app = TestApp::new().await;
    let res = app
        .client
        .post(&app.url("/api/auth/signup"), r#"{"email":"not-an-email"}"#)
        .await;

    assert_eq!(res.status, 400);
    let fields = res.error()["fields"].as_array().cloned().unwrap_or_default();
    let names: Vec<&str> = fields.iter().filter_map(|f| f["field"].as_str()).collect();
    assert!(names.contains(&"email"));
    assert!(names.contains(&"password"));
    assert!(names.contains(&"username"));
}

#[tokio::test]
async fn test_signup_short_password_rejected() {
    let app = TestApp::new().await;
    let body = serde_json::json!({
        "email": "short@slice.test",
        "username": "short",
        "password": "12345"
    });
    let res = app
        .client
        .post(&app.url("/api/auth/signup"), &body.to_string())
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.message(), "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_signup_malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let res = app
        .client
        .post(&app.url("/api/auth/signup"), "{not json")
        .await;
    assert_eq!(res.status, 400);
    assert!(!res.is_success());
}

// ═══ Login ═══

#[tokio::test]
async fn test_login_returns_token_for_valid_credentials() {
    let app = TestApp::new().await;
    app.create_user("luigi@slice.test", "luigi", "password123").await;

    let body = serde_json::json!({"email": "luigi@slice.test", "password": "password123"});
    let res = app
        .client
        .post(&app.url("/api/auth/login"), &body.to_string())
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.message(), "Login successful");
    let data = res.data();
    assert!(data["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(data["user"]["username"], "luigi");
    assert!(!res.body.contains("password_hash"));
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = TestApp::new().await;
    app.create_user("Peach@Slice.test", "peach", "password123").await;
    let token = app.login("peach@slice.test", "password123").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_identical() {
    let app = TestApp::new().await;
    app.create_user("toad@slice.test", "toad", "password123").await;

    let wrong_password = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"toad@slice.test","password":"nope-nope"}"#,
        )
        .await;
    let unknown_email = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"ghost@slice.test","password":"nope-nope"}"#,
        )
        .await;

    assert_eq!(wrong_password.status, 401);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.message(), "Invalid email or password");
}

// ═══ Logout ═══

#[tokio::test]
async fn test_logout_requires_token() {
    let app = TestApp::new().await;
    let res = app.client.post(&app.url("/api/auth/logout"), "").await;
    assert_eq!(res.status, 401);
    assert_eq!(res.message(), "No token provided");
}

#[tokio::test]
async fn test_logout_with_token() {
    let app = TestApp::new().await;
    let (token, _) = app.signup_and_login("yoshi@slice.test", "yoshi").await;
    let res = app
        .client
        .post_with_auth(&app.url("/api/auth/logout"), &token, "")
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.message(), "Logout successful");
}

#[tokio::test]
async fn test_garbage_bearer_token_is_unauthorized() {
    let app = TestApp::new().await;
    let res = app
        .client
        .get_with_auth(&app.url("/api/order/history"), "not.a.jwt")
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.message(), "Invalid or expired token");
}
