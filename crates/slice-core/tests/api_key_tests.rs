use slice_core::TestApp;

// ═══ Gate behaviour ═══

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let app = TestApp::new().await;
    let res = app
        .client
        .without_api_key()
        .get(&app.url("/api/menu"))
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.message(), "Missing x-api-key header");
}

#[tokio::test]
async fn test_wrong_api_key_is_forbidden() {
    let app = TestApp::new().await;
    let res = app
        .client
        .with_api_key("not-the-key")
        .get(&app.url("/api/menu"))
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.message(), "Invalid API key");
}

#[tokio::test]
async fn test_signup_and_login_skip_the_gate() {
    let app = TestApp::new().await;
    let client = app.client.without_api_key();

    let res = client
        .post(
            &app.url("/api/auth/signup"),
            r#"{"email":"open@slice.test","username":"open","password":"password123"}"#,
        )
        .await;
    assert_eq!(res.status, 201);

    let res = client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"open@slice.test","password":"password123"}"#,
        )
        .await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn test_other_auth_routes_are_gated() {
    let app = TestApp::new().await;
    let res = app
        .client
        .without_api_key()
        .post(
            &app.url("/api/auth/forgot-password"),
            r#"{"email":"x@slice.test"}"#,
        )
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn test_health_and_docs_are_public() {
    let app = TestApp::new().await;
    let client = app.client.without_api_key();

    let res = client.get(&app.url("/api/health")).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["status"], "Server is running");

    let res = client.get(&app.url("/api-docs/openapi.json")).await;
    assert_eq!(res.status, 200);
    assert!(res.json().get("openapi").is_some());
}

#[tokio::test]
async fn test_gate_disabled_without_configured_key() {
    let mut config = TestApp::test_config();
    config.api_key = None;
    let app = TestApp::with_config(config).await;

    let res = app.client.get(&app.url("/api/menu")).await;
    assert_eq!(res.status, 200);
}

// ═══ Misc HTTP ═══

#[tokio::test]
async fn test_unknown_route_is_enveloped_404() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/api/nope")).await;
    assert_eq!(res.status, 404);
    assert!(!res.is_success());
    assert_eq!(res.message(), "Route not found");
    assert_eq!(res.error()["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = TestApp::new().await;
    let res = app.client.get(&app.url("/api/health")).await;
    assert!(res.headers.get("x-request-id").is_some());
}
