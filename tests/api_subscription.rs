//! Integration tests per crediti, checkout e webhook Stripe
//!
//! Il gateway reale non viene mai chiamato: il checkout usa un gateway finto
//! e il webhook viene firmato con il segreto di test.

mod common;

#[cfg(test)]
mod subscription_tests {
    use super::common::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use chrono::Utc;
    use hmac::{Hmac, Mac};
    use serde_json::{Value, json};
    use sha2::Sha256;
    use sqlx::MySqlPool;
    use std::sync::Arc;
    use talentlink::config::CreditPlan;
    use talentlink::core::{AppError, AppState};
    use talentlink::dtos::CheckoutSessionDTO;
    use talentlink::integrations::PaymentGateway;

    const WEBHOOK_SECRET: &str = "whsec_test_secret";

    struct FakeGateway;

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_checkout_session(
            &self,
            user_id: i32,
            plan: &CreditPlan,
        ) -> Result<CheckoutSessionDTO, AppError> {
            Ok(CheckoutSessionDTO {
                session_id: format!("cs_test_{}_{}", user_id, plan.id),
                url: "https://checkout.stripe.test/session".to_string(),
            })
        }
    }

    fn payments_state(pool: MySqlPool) -> Arc<AppState> {
        let mut config = test_config();
        config.stripe_webhook_secret = Some(WEBHOOK_SECRET.to_string());
        Arc::new(AppState::new(pool, config).with_payment_gateway(Arc::new(FakeGateway)))
    }

    fn sign(payload: &str, secret: &str) -> String {
        let timestamp = Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        format!(
            "t={},v1={}",
            timestamp,
            hex::encode(mac.finalize().into_bytes())
        )
    }

    fn completed_event(session_id: &str) -> String {
        json!({
            "id": "evt_test_1",
            "type": "checkout.session.completed",
            "data": { "object": { "id": session_id, "object": "checkout.session" } }
        })
        .to_string()
    }

    async fn post_webhook(
        server: &axum_test::TestServer,
        payload: &str,
        signature: &str,
    ) -> axum_test::TestResponse {
        server
            .post("/api/stripe/webhook")
            .add_header("stripe-signature", signature.to_string())
            .add_header("content-type", "application/json")
            .bytes(payload.as_bytes().to_vec().into())
            .await
    }

    // ============================================================
    // Test per GET /api/subscription e /api/subscription/plans
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_get_subscription(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let body: Value = server
            .get("/api/subscription")
            .authorization_bearer(alice())
            .await
            .json();
        assert_eq!(body["data"]["remaining_posts"], 2);
        assert_eq!(body["data"]["total_purchased"], 2);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_missing_subscription_reads_as_zero(pool: MySqlPool) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM subscriptions WHERE user_id = 3")
            .execute(&pool)
            .await?;
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/api/subscription")
            .authorization_bearer(charlie())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["remaining_posts"], 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_list_plans(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let body: Value = server
            .get("/api/subscription/plans")
            .authorization_bearer(alice())
            .await
            .json();
        let plans = body["data"].as_array().unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[1]["id"], "pro");
        assert_eq!(plans[1]["credits"], 5);
        Ok(())
    }

    // ============================================================
    // Test per POST /api/stripe/checkout
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_checkout_records_pending_payment(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(payments_state(pool.clone()));

        let response = server
            .post("/api/stripe/checkout")
            .authorization_bearer(bob())
            .json(&json!({ "plan_id": "pro" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["session_id"], "cs_test_2_pro");

        let (status, credits): (String, i32) = sqlx::query_as(
            "SELECT status, credits FROM payments WHERE checkout_session_id = 'cs_test_2_pro'",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(status, "PENDING");
        assert_eq!(credits, 5);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_checkout_errors(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(payments_state(pool.clone()));
        server
            .post("/api/stripe/checkout")
            .authorization_bearer(bob())
            .json(&json!({ "plan_id": "platinum" }))
            .await
            .assert_status_bad_request();

        // senza gateway configurato
        let unconfigured = create_test_server(create_test_state(pool));
        unconfigured
            .post("/api/stripe/checkout")
            .authorization_bearer(bob())
            .json(&json!({ "plan_id": "pro" }))
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }

    // ============================================================
    // Test per POST /api/stripe/webhook
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_webhook_credits_once(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(payments_state(pool));

        server
            .post("/api/stripe/checkout")
            .authorization_bearer(bob())
            .json(&json!({ "plan_id": "pro" }))
            .await
            .assert_status(StatusCode::CREATED);

        let payload = completed_event("cs_test_2_pro");
        // il webhook non richiede JWT; il replay non accredita due volte
        for _ in 0..2 {
            post_webhook(&server, &payload, &sign(&payload, WEBHOOK_SECRET))
                .await
                .assert_status_ok();
        }

        let body: Value = server
            .get("/api/subscription")
            .authorization_bearer(bob())
            .await
            .json();
        assert_eq!(body["data"]["remaining_posts"], 5);
        assert_eq!(body["data"]["total_purchased"], 5);

        // ora bob può pubblicare un post RECRUITMENT
        server
            .post("/api/post")
            .authorization_bearer(bob())
            .json(&json!({
                "post_type": "RECRUITMENT",
                "title": "Designer wanted",
                "content": "Join the team"
            }))
            .await
            .assert_status(StatusCode::CREATED);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_webhook_rejects_bad_signature(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(payments_state(pool.clone()));
        let payload = completed_event("cs_whatever");

        post_webhook(&server, &payload, &sign(&payload, "whsec_wrong"))
            .await
            .assert_status_bad_request();

        server
            .post("/api/stripe/webhook")
            .add_header("content-type", "application/json")
            .bytes(payload.as_bytes().to_vec().into())
            .await
            .assert_status_bad_request();

        let completed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE status = 'COMPLETED'")
                .fetch_one(&pool)
                .await?;
        assert_eq!(completed, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_webhook_ignores_other_events(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(payments_state(pool));
        let payload = json!({
            "id": "evt_test_2",
            "type": "payment_intent.created",
            "data": { "object": { "id": "pi_123" } }
        })
        .to_string();

        post_webhook(&server, &payload, &sign(&payload, WEBHOOK_SECRET))
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_webhook_without_secret(pool: MySqlPool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));
        let payload = completed_event("cs_whatever");

        post_webhook(&server, &payload, &sign(&payload, WEBHOOK_SECRET))
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
        Ok(())
    }
}
