//! Integration tests per gli endpoints di autenticazione
//!
//! Test per:
//! - POST /api/auth/register
//! - POST /api/auth/login
//! - POST /api/auth/logout
//!
//! Questi test usano `#[sqlx::test]` che:
//! - Crea automaticamente un database di test isolato
//! - Applica le migrations da `migrations/`
//! - Applica i fixtures specificati da `fixtures/`
//! - Pulisce il database al termine

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use serde_json::{Value, json};
    use sqlx::MySqlPool;

    fn registration(username: &str, email: &str) -> Value {
        json!({
            "username": username,
            "email": email,
            "password": "TestLogin123",
            "full_name": "Test User"
        })
    }

    // ============================================================
    // Test per POST /api/auth/register - register_user
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_success(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool.clone()));

        let response = server
            .post("/api/auth/register")
            .json(&registration("newuser", "new@example.com"))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["username"], "newuser");
        assert!(body["data"].get("password").is_none(), "La password non deve uscire");

        // la registrazione crea anche la riga subscription a zero crediti
        let remaining: i32 = sqlx::query_scalar(
            "SELECT s.remaining_posts FROM subscriptions s JOIN users u ON u.user_id = s.user_id \
             WHERE u.username = 'newuser'",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(remaining, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_duplicate_username(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/register")
            .json(&registration("alice", "other@example.com"))
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_duplicate_email_is_case_insensitive(
        pool: MySqlPool,
    ) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/register")
            .json(&registration("alice2", "ALICE@example.com"))
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_register_weak_password(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "weak",
                "email": "weak@example.com",
                "password": "short"
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        Ok(())
    }

    // ============================================================
    // Test per POST /api/auth/login - login_user
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_success(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        // Prima registriamo un nuovo utente
        server
            .post("/api/auth/register")
            .json(&registration("logintest", "login@example.com"))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        // Poi facciamo login con le stesse credenziali (email con maiuscole)
        let response = server
            .post("/api/auth/login")
            .json(&json!({
                "email": "Login@Example.com",
                "password": "TestLogin123"
            }))
            .await;

        response.assert_status_ok();

        // Verifica che ci sia il cookie Set-Cookie
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .expect("Set-Cookie header should be present")
            .to_string();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));

        // Verifica che ci sia l'header Authorization
        assert!(response.headers().get("authorization").is_some());

        let body: Value = response.json();
        let token = body["data"]["token"].as_str().expect("token in body");
        assert!(!token.is_empty());
        assert_eq!(body["data"]["user"]["username"], "logintest");

        // il token restituito apre le rotte protette
        server
            .get("/api/user/me")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_wrong_password(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/api/auth/register")
            .json(&registration("logintest", "login@example.com"))
            .await;

        let response = server
            .post("/api/auth/login")
            .json(&json!({
                "email": "login@example.com",
                "password": "WrongPassword1"
            }))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_login_unknown_email(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/login")
            .json(&json!({
                "email": "nobody@example.com",
                "password": "TestLogin123"
            }))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    // ============================================================
    // Test per POST /api/auth/logout e middleware
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_logout_clears_cookie(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.post("/api/auth/logout").await;

        response.assert_status_ok();
        let cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(cookie.contains("Max-Age=0"));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_cookie_token_is_accepted(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/user/me")
            .add_header("cookie", format!("token={}", alice()))
            .await;

        response.assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_protected_route_without_token(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server.get("/api/user/me").await.assert_status_unauthorized();
        server
            .get("/api/user/me")
            .authorization_bearer("invalid_token_here")
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_token_of_deleted_user_is_rejected(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let token = create_test_jwt(999, "ghost");
        server
            .get("/api/user/me")
            .authorization_bearer(token)
            .await
            .assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test]
    async fn test_health_check(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/").await;
        response.assert_status_ok();
        response.assert_text("Server is running!");
        Ok(())
    }
}
