//! SubscriptionRepository / PaymentRepository - Crediti e pagamenti

use super::{Create, Read};
use crate::dtos::NewPayment;
use crate::entities::{Payment, PaymentStatus, Subscription};
use sqlx::{Error, MySqlPool};
use tracing::{info, instrument, warn};

const PAYMENT_COLUMNS: &str = "payment_id, user_id, checkout_session_id, plan_id, credits, \
                               amount_cents, status, created_at, completed_at";

// SUBSCRIPTION REPOSITORY
pub struct SubscriptionRepository {
    connection_pool: MySqlPool,
}

impl SubscriptionRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

impl Read<Subscription, i32> for SubscriptionRepository {
    async fn read(&self, user_id: &i32) -> Result<Option<Subscription>, Error> {
        sqlx::query_as::<_, Subscription>(
            "SELECT user_id, remaining_posts, total_purchased, updated_at FROM subscriptions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

/// Esito della conferma di un checkout
#[derive(Debug)]
pub enum PaymentCompletion {
    Credited(Payment),
    AlreadyCompleted,
    UnknownSession,
}

// PAYMENT REPOSITORY
pub struct PaymentRepository {
    connection_pool: MySqlPool,
}

impl PaymentRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Marca il pagamento come COMPLETED e accredita i crediti, tutto in una transazione.
    /// Il lock sulla riga del pagamento rende idempotenti i webhook ripetuti.
    #[instrument(skip(self))]
    pub async fn complete_and_credit(&self, session_id: &str) -> Result<PaymentCompletion, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM payments WHERE checkout_session_id = ? FOR UPDATE",
            PAYMENT_COLUMNS
        );
        let Some(payment) = sqlx::query_as::<_, Payment>(&sql)
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            warn!("Checkout session not found");
            return Ok(PaymentCompletion::UnknownSession);
        };

        if payment.status == PaymentStatus::Completed {
            tx.rollback().await?;
            info!("Checkout session already processed");
            return Ok(PaymentCompletion::AlreadyCompleted);
        }

        sqlx::query(
            "UPDATE payments SET status = 'COMPLETED', completed_at = CURRENT_TIMESTAMP(3) \
             WHERE payment_id = ?",
        )
        .bind(payment.payment_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, remaining_posts, total_purchased)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE
                remaining_posts = remaining_posts + VALUES(remaining_posts),
                total_purchased = total_purchased + VALUES(total_purchased),
                updated_at = CURRENT_TIMESTAMP(3)
            "#,
        )
        .bind(payment.user_id)
        .bind(payment.credits)
        .bind(payment.credits)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Credited {} posts to user {}",
            payment.credits, payment.user_id
        );

        let completed = self
            .read(&payment.payment_id)
            .await?
            .ok_or(Error::RowNotFound)?;
        Ok(PaymentCompletion::Credited(completed))
    }
}

impl Create<Payment, NewPayment> for PaymentRepository {
    #[instrument(skip(self, data), fields(user_id = %data.user_id, plan = %data.plan_id))]
    async fn create(&self, data: &NewPayment) -> Result<Payment, Error> {
        let result = sqlx::query(
            "INSERT INTO payments (user_id, checkout_session_id, plan_id, credits, amount_cents, status) \
             VALUES (?, ?, ?, ?, ?, 'PENDING')",
        )
        .bind(data.user_id)
        .bind(&data.checkout_session_id)
        .bind(&data.plan_id)
        .bind(data.credits)
        .bind(data.amount_cents)
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;
        self.read(&new_id).await?.ok_or(Error::RowNotFound)
    }
}

impl Read<Payment, i32> for PaymentRepository {
    async fn read(&self, id: &i32) -> Result<Option<Payment>, Error> {
        let sql = format!("SELECT {} FROM payments WHERE payment_id = ?", PAYMENT_COLUMNS);
        sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_completion_credits_once(pool: MySqlPool) -> sqlx::Result<()> {
        let payments = PaymentRepository::new(pool.clone());
        let subscriptions = SubscriptionRepository::new(pool);

        payments
            .create(&NewPayment {
                user_id: 2,
                checkout_session_id: "cs_test_1".to_string(),
                plan_id: "pro".to_string(),
                credits: 5,
                amount_cents: 1999,
            })
            .await?;

        let first = payments.complete_and_credit("cs_test_1").await?;
        assert!(matches!(first, PaymentCompletion::Credited(ref p) if p.status == PaymentStatus::Completed));

        let replay = payments.complete_and_credit("cs_test_1").await?;
        assert!(matches!(replay, PaymentCompletion::AlreadyCompleted));

        let subscription = subscriptions.read(&2).await?.unwrap();
        assert_eq!(subscription.remaining_posts, 5);
        assert_eq!(subscription.total_purchased, 5);

        assert!(matches!(
            payments.complete_and_credit("cs_unknown").await?,
            PaymentCompletion::UnknownSession
        ));
        Ok(())
    }
}
