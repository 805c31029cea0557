use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use slice_core::models::user::{self, Entity as User};
use slice_core::TestApp;

async fn load_user(app: &TestApp, email: &str) -> user::Model {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(&app.db)
        .await
        .unwrap()
        .expect("user exists")
}

// ═══ Email verification ═══

#[tokio::test]
async fn test_verification_required_blocks_login_until_verified() {
    let app = TestApp::new_requiring_verification().await;
    let created = app
        .create_user("bowser@slice.test", "bowser", "password123")
        .await;
    assert_eq!(created["email_verified"], false);

    let login = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"bowser@slice.test","password":"password123"}"#,
        )
        .await;
    assert_eq!(login.status, 403);
    assert_eq!(
        login.message(),
        "Please verify your email before logging in"
    );

    let token = app
        .mailer
        .last_to("bowser@slice.test")
        .and_then(|m| m.token())
        .expect("verification email sent");
    let stored = load_user(&app, "bowser@slice.test").await;
    assert_ne!(stored.verification_token_hash.as_deref(), Some(token.as_str()));

    let verify = app
        .client
        .get(&app.url(&format!("/api/auth/verify-email/{token}")))
        .await;
    assert_eq!(verify.status, 200, "{}", verify.body);

    let token = app.login("bowser@slice.test", "password123").await;
    assert!(!token.is_empty());

    let stored = load_user(&app, "bowser@slice.test").await;
    assert!(stored.email_verified);
    assert!(stored.verification_token_hash.is_none());
    assert!(stored.verification_token_expires_at.is_none());
}

#[tokio::test]
async fn test_wrong_password_still_401_when_unverified() {
    let app = TestApp::new_requiring_verification().await;
    app.create_user("kamek@slice.test", "kamek", "password123").await;
    let res = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"kamek@slice.test","password":"wrong-one"}"#,
        )
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn test_verification_token_is_single_use() {
    let app = TestApp::new_requiring_verification().await;
    app.create_user("wario@slice.test", "wario", "password123").await;
    let token = app
        .mailer
        .last_to("wario@slice.test")
        .and_then(|m| m.token())
        .unwrap();
    let url = app.url(&format!("/api/auth/verify-email/{token}"));

    assert_eq!(app.client.get(&url).await.status, 200);
    let again = app.client.get(&url).await;
    assert_eq!(again.status, 400);
    assert_eq!(again.message(), "Invalid or expired verification token");
}

#[tokio::test]
async fn test_expired_verification_token_rejected() {
    let app = TestApp::new_requiring_verification().await;
    app.create_user("waluigi@slice.test", "waluigi", "password123").await;
    let token = app
        .mailer
        .last_to("waluigi@slice.test")
        .and_then(|m| m.token())
        .unwrap();

    let stored = load_user(&app, "waluigi@slice.test").await;
    let mut active: user::ActiveModel = stored.into();
    active.verification_token_expires_at = Set(Some(Utc::now().naive_utc() - Duration::seconds(1)));
    active.update(&app.db).await.unwrap();

    let res = app
        .client
        .get(&app.url(&format!("/api/auth/verify-email/{token}")))
        .await;
    assert_eq!(res.status, 400);
    assert!(!load_user(&app, "waluigi@slice.test").await.email_verified);
}

#[tokio::test]
async fn test_resend_verification_replaces_previous_token() {
    let app = TestApp::new_requiring_verification().await;
    app.create_user("daisy@slice.test", "daisy", "password123").await;
    let first = app
        .mailer
        .last_to("daisy@slice.test")
        .and_then(|m| m.token())
        .unwrap();

    let res = app
        .client
        .post(
            &app.url("/api/auth/resend-verification"),
            r#"{"email":"daisy@slice.test"}"#,
        )
        .await;
    assert_eq!(res.status, 200);
    let second = app
        .mailer
        .last_to("daisy@slice.test")
        .and_then(|m| m.token())
        .unwrap();
    assert_ne!(first, second);

    let old = app
        .client
        .get(&app.url(&format!("/api/auth/verify-email/{first}")))
        .await;
    assert_eq!(old.status, 400);
    let new = app
        .client
        .get(&app.url(&format!("/api/auth/verify-email/{second}")))
        .await;
    assert_eq!(new.status, 200);
}

#[tokio::test]
async fn test_resend_verification_error_cases() {
    let app = TestApp::new().await;
    app.create_user("verified@slice.test", "verified", "password123").await;

    let missing = app
        .client
        .post(&app.url("/api/auth/resend-verification"), r#"{}"#)
        .await;
    assert_eq!(missing.status, 400);
    assert_eq!(missing.message(), "Email is required");

    let unknown = app
        .client
        .post(
            &app.url("/api/auth/resend-verification"),
            r#"{"email":"nobody@slice.test"}"#,
        )
        .await;
    assert_eq!(unknown.status, 404);

    let already = app
        .client
        .post(
            &app.url("/api/auth/resend-verification"),
            r#"{"email":"verified@slice.test"}"#,
        )
        .await;
    assert_eq!(already.status, 400);
    assert_eq!(already.message(), "Email is already verified");
}

// ═══ Password reset ═══

#[tokio::test]
async fn test_forgot_password_same_answer_for_unknown_email() {
    let app = TestApp::new().await;
    app.create_user("known@slice.test", "known", "password123").await;

    let known = app
        .client
        .post(
            &app.url("/api/auth/forgot-password"),
            r#"{"email":"known@slice.test"}"#,
        )
        .await;
    let unknown = app
        .client
        .post(
            &app.url("/api/auth/forgot-password"),
            r#"{"email":"unknown@slice.test"}"#,
        )
        .await;

    assert_eq!(known.status, 200);
    assert_eq!(known.body, unknown.body);
    assert!(app.mailer.last_to("known@slice.test").is_some());
    assert!(app.mailer.last_to("unknown@slice.test").is_none());
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = TestApp::new().await;
    app.create_user("rosalina@slice.test", "rosalina", "password123").await;
    app.client
        .post(
            &app.url("/api/auth/forgot-password"),
            r#"{"email":"rosalina@slice.test"}"#,
        )
        .await;
    let mail = app.mailer.last_to("rosalina@slice.test").unwrap();
    assert!(mail
        .template
        .link()
        .unwrap()
        .starts_with("http://localhost:3000/reset-password/"));
    let token = mail.token().unwrap();

    let url = app.url(&format!("/api/auth/reset-password/{token}"));
    let res = app.client.post(&url, r#"{"password":"brand-new-pass"}"#).await;
    assert_eq!(res.status, 200, "{}", res.body);

    let old = app
        .client
        .post(
            &app.url("/api/auth/login"),
            r#"{"email":"rosalina@slice.test","password":"password123"}"#,
        )
        .await;
    assert_eq!(old.status, 401);
    app.login("rosalina@slice.test", "brand-new-pass").await;

    let reused = app.client.post(&url, r#"{"password":"another-pass"}"#).await;
    assert_eq!(reused.status, 400);
    assert_eq!(reused.message(), "Invalid or expired reset token");
}

#[tokio::test]
async fn test_reset_password_validation() {
    let app = TestApp::new().await;
    let url = app.url("/api/auth/reset-password/deadbeef");

    let missing = app.client.post(&url, r#"{}"#).await;
    assert_eq!(missing.status, 400);
    assert_eq!(missing.message(), "New password is required");

    let short = app.client.post(&url, r#"{"password":"abc"}"#).await;
    assert_eq!(short.status, 400);

    let bogus = app.client.post(&url, r#"{"password":"long-enough"}"#).await;
    assert_eq!(bogus.status, 400);
    assert_eq!(bogus.message(), "Invalid or expired reset token");
}

#[tokio::test]
async fn test_expired_reset_token_rejected() {
    let app = TestApp::new().await;
    app.create_user("koopa@slice.test", "koopa", "password123").await;
    app.client
        .post(
            &app.url("/api/auth/forgot-password"),
            r#"{"email":"koopa@slice.test"}"#,
        )
        .await;
    let token = app
        .mailer
        .last_to("koopa@slice.test")
        .and_then(|m| m.token())
        .unwrap();

    let stored = load_user(&app, "koopa@slice.test").await;
    let mut active: user::ActiveModel = stored.into();
    active.reset_token_expires_at = Set(Some(Utc::now().naive_utc() - Duration::seconds(1)));
    active.update(&app.db).await.unwrap();

    let res = app
        .client
        .post(
            &app.url(&format!("/api/auth/reset-password/{token}")),
            r#"{"password":"brand-new-pass"}"#,
        )
        .await;
    assert_eq!(res.status, 400);
    app.login("koopa@slice.test", "password123").await;
}

#[tokio::test]
async fn test_reset_email_states_configured_lifetime() {
    let mut config = TestApp::test_config();
    config.security.password_reset_expiry_secs = 1_800;
    let app = TestApp::with_config(config).await;
    app.create_user("daisy@slice.test", "daisy", "password123").await;

    app.client
        .post(
            &app.url("/api/auth/forgot-password"),
            r#"{"email":"daisy@slice.test"}"#,
        )
        .await;

    let mail = app.mailer.last_to("daisy@slice.test").unwrap();
    let text = mail.template.render().text;
    assert!(text.contains("This link will expire in 30 minutes."), "{text}");
}
