//! Integration tests per il formato degli errori
//!
//! Body, path e query non validi devono restituire lo stesso envelope
//! `{ success: false, message, error }` degli errori applicativi.

mod common;

#[cfg(test)]
mod error_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::Value;
    use sqlx::MySqlPool;

    fn assert_envelope(body: &Value, message: &str) {
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], message);
        assert!(body["error"].is_string(), "missing error details: {}", body);
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_malformed_json_uses_envelope(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/auth/login")
            .bytes("{not json".into())
            .content_type("application/json")
            .await;

        response.assert_status_bad_request();
        assert_envelope(&response.json(), "Invalid JSON body");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_missing_json_fields_use_envelope(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/api/post")
            .authorization_bearer(alice())
            .json(&serde_json::json!({ "title": "no type, no content" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_envelope(&response.json(), "Invalid JSON body");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_invalid_path_parameter_uses_envelope(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/user/not-a-number")
            .authorization_bearer(alice())
            .await;

        response.assert_status_bad_request();
        assert_envelope(&response.json(), "Invalid path parameter");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_invalid_query_uses_envelope(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/post?author_id=abc")
            .authorization_bearer(alice())
            .await;

        response.assert_status_bad_request();
        assert_envelope(&response.json(), "Invalid query string");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_unknown_route_uses_envelope(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server.get("/api/does-not-exist").await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found");
        Ok(())
    }
}
