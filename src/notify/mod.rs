//! Notification dispatcher.
//!
//! Order emails are best-effort: jobs are queued on an in-process outbox and
//! a background worker drives the actual sends, so a slow or broken email
//! provider can never block or fail an order. Each send gets a bounded retry
//! with exponential backoff, a hard 12 second ceiling, and a short
//! deduplication window so rapid repeats of the same order/status pair fire
//! only once.

mod template;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::EmailConfig;
use crate::domain::currency::{self, Currency};
use crate::domain::order::{Order, OrderStatus};

/// Retries after the initial attempt.
pub const MAX_RETRIES: u32 = 2;
/// First retry delay; doubles per attempt.
pub const BASE_BACKOFF: Duration = Duration::from_secs(1);
/// Ceiling on one send including all retries.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(12);
/// Window in which a repeated order/status email is suppressed.
pub const DEDUP_WINDOW: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_name: String,
    pub to_email: String,
    pub order_id: String,
    pub total: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected message: {0}")]
    Provider(reqwest::StatusCode),
}

/// Transactional-email transport.
pub trait Mailer: Send + Sync + 'static {
    fn send(
        &self,
        message: &EmailMessage,
    ) -> impl std::future::Future<Output = Result<(), MailError>> + Send;
}

/// HTTP mailer for an EmailJS-style send endpoint. Without credentials it
/// becomes a no-op that logs instead of sending.
#[derive(Clone)]
pub struct EmailJsMailer {
    http: reqwest::Client,
    config: Option<EmailConfig>,
}

impl EmailJsMailer {
    pub fn new(config: Option<EmailConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("email credentials missing; order emails are disabled");
        }
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

impl Mailer for EmailJsMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let Some(cfg) = &self.config else {
            tracing::debug!(order = %message.order_id, "email dispatch disabled; dropping message");
            return Ok(());
        };
        let payload = serde_json::json!({
            "service_id": cfg.service_id,
            "template_id": cfg.template_id,
            "user_id": cfg.public_key,
            "template_params": {
                "to_name": message.to_name,
                "to_email": message.to_email,
                "order_id": message.order_id,
                "total_amount": message.total,
                "order_items": message.html,
                "reply_to": "support@neonmarket.com",
            },
        });
        let response = self.http.post(&cfg.endpoint).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(MailError::Provider(response.status()));
        }
        Ok(())
    }
}

/// What happened to one notification request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    /// Dropped on purpose: duplicate within the window, or a transition that
    /// does not notify.
    Suppressed,
    Failed,
}

pub struct Notifier<M> {
    mailer: M,
    recent: Mutex<HashMap<(String, &'static str), Instant>>,
}

impl<M: Mailer> Notifier<M> {
    pub fn new(mailer: M) -> Self {
        Self {
            mailer,
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// Receipt for a freshly placed order.
    pub async fn send_confirmation(&self, order: &Order) -> Outcome {
        if self.recently_sent(order, "confirmation") {
            return Outcome::Suppressed;
        }
        let message = self.message_for(order, template::confirmation_html(order));
        self.dispatch(message).await
    }

    /// Status-change email, restricted to transitions worth telling the
    /// customer about.
    pub async fn send_status_update(&self, order: &Order, status: OrderStatus) -> Outcome {
        if !status.notifies_customer() {
            return Outcome::Suppressed;
        }
        if self.recently_sent(order, status.as_str()) {
            return Outcome::Suppressed;
        }
        let message = self.message_for(order, template::status_html(order, status));
        self.dispatch(message).await
    }

    fn message_for(&self, order: &Order, html: String) -> EmailMessage {
        let currency: Currency = order.currency.parse().unwrap_or_default();
        EmailMessage {
            to_name: order.customer.name.clone(),
            to_email: order.customer.email.clone(),
            order_id: order.display_id.clone(),
            total: currency::format_with_rate(order.total, currency, order.exchange_rate),
            html,
        }
    }

    /// True (and records the send) if this order/kind pair fired within the
    /// dedup window.
    fn recently_sent(&self, order: &Order, kind: &'static str) -> bool {
        let Ok(mut recent) = self.recent.lock() else {
            return false;
        };
        let now = Instant::now();
        recent.retain(|_, sent_at| now.duration_since(*sent_at) < DEDUP_WINDOW);
        match recent.insert((order.display_id.clone(), kind), now) {
            Some(_) => true,
            None => false,
        }
    }

    async fn dispatch(&self, message: EmailMessage) -> Outcome {
        let attempt = self.send_with_retry(&message);
        match tokio::time::timeout(SEND_TIMEOUT, attempt).await {
            Ok(Ok(())) => {
                tracing::info!(order = %message.order_id, "notification email sent");
                Outcome::Sent
            }
            Ok(Err(err)) => {
                tracing::error!(order = %message.order_id, error = %err, "notification email failed");
                Outcome::Failed
            }
            Err(_) => {
                tracing::error!(
                    order = %message.order_id,
                    "notification email timed out after {}s",
                    SEND_TIMEOUT.as_secs()
                );
                Outcome::Failed
            }
        }
    }

    async fn send_with_retry(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut delay = BASE_BACKOFF;
        let mut retries_left = MAX_RETRIES;
        loop {
            match self.mailer.send(message).await {
                Ok(()) => return Ok(()),
                Err(err) if retries_left > 0 => {
                    tracing::warn!(
                        order = %message.order_id,
                        error = %err,
                        retries_left,
                        "email send failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    retries_left -= 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Work queued for the notification worker.
#[derive(Clone, Debug)]
pub enum NotifyJob {
    Confirmation(Box<Order>),
    StatusUpdate(Box<Order>, OrderStatus),
}

/// Cheap cloneable handle for enqueueing notification jobs.
#[derive(Clone)]
pub struct NotifyHandle {
    sender: mpsc::UnboundedSender<NotifyJob>,
}

impl NotifyHandle {
    /// Fire-and-forget: a closed outbox is logged, never propagated.
    pub fn enqueue(&self, job: NotifyJob) {
        if self.sender.send(job).is_err() {
            tracing::warn!("notification outbox closed; dropping job");
        }
    }
}

/// Spawn the background worker that drains the outbox.
pub fn spawn_worker<M: Mailer>(notifier: Notifier<M>) -> (NotifyHandle, tokio::task::JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let worker = tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            match job {
                NotifyJob::Confirmation(order) => {
                    let outcome = notifier.send_confirmation(&order).await;
                    tracing::debug!(order = %order.display_id, ?outcome, "confirmation processed");
                }
                NotifyJob::StatusUpdate(order, status) => {
                    let outcome = notifier.send_status_update(&order, status).await;
                    tracing::debug!(
                        order = %order.display_id,
                        status = %status,
                        ?outcome,
                        "status update processed"
                    );
                }
            }
        }
    });
    (NotifyHandle { sender }, worker)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::order::{CustomerInfo, LineItem};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::types::Json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    pub(crate) fn order(display_id: &str) -> Order {
        Order {
            id: Uuid::new_v4(),
            display_id: display_id.into(),
            user_id: None,
            customer: Json(CustomerInfo {
                name: "Alex Chen".into(),
                email: "alex@example.com".into(),
                address: "1 Neon Way".into(),
                city: "Karachi".into(),
                zip: "74000".into(),
                phone: None,
            }),
            items: Json(vec![LineItem {
                product_id: Uuid::new_v4(),
                name: "Cyberpunk Headphones".into(),
                price: Decimal::new(19999, 2),
                quantity: 1,
                image: None,
            }]),
            total: Decimal::new(19999, 2),
            payment_method: "card".into(),
            transaction_id: None,
            status: "pending".into(),
            currency: "USD".into(),
            exchange_rate: Decimal::ONE,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Fails the first `failures` calls, succeeds afterwards.
    struct FlakyMailer {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyMailer {
        fn failing(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Mailer for FlakyMailer {
        async fn send(&self, _message: &EmailMessage) -> Result<(), MailError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(MailError::Provider(reqwest::StatusCode::BAD_GATEWAY))
            } else {
                Ok(())
            }
        }
    }

    struct StalledMailer;

    impl Mailer for StalledMailer {
        async fn send(&self, _message: &EmailMessage) -> Result<(), MailError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_recover_from_a_transient_failure() {
        let notifier = Notifier::new(FlakyMailer::failing(1));
        let outcome = notifier.send_confirmation(&order("10000001")).await;
        assert_eq!(outcome, Outcome::Sent);
        assert_eq!(notifier.mailer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_bounded_retries() {
        let notifier = Notifier::new(FlakyMailer::failing(10));
        let outcome = notifier.send_confirmation(&order("10000002")).await;
        assert_eq!(outcome, Outcome::Failed);
        // initial attempt + MAX_RETRIES
        assert_eq!(notifier.mailer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_provider_hits_the_hard_timeout() {
        let notifier = Notifier::new(StalledMailer);
        let outcome = notifier.send_confirmation(&order("10000003")).await;
        assert_eq!(outcome, Outcome::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_sends_are_suppressed_within_the_window() {
        let notifier = Notifier::new(FlakyMailer::failing(0));
        let o = order("10000004");
        assert_eq!(
            notifier.send_status_update(&o, OrderStatus::Shipped).await,
            Outcome::Sent
        );
        assert_eq!(
            notifier.send_status_update(&o, OrderStatus::Shipped).await,
            Outcome::Suppressed
        );

        tokio::time::advance(DEDUP_WINDOW + Duration::from_secs(1)).await;
        assert_eq!(
            notifier.send_status_update(&o, OrderStatus::Shipped).await,
            Outcome::Sent
        );
    }

    #[tokio::test(start_paused = true)]
    async fn different_statuses_do_not_collide_in_the_window() {
        let notifier = Notifier::new(FlakyMailer::failing(0));
        let o = order("10000005");
        assert_eq!(
            notifier.send_status_update(&o, OrderStatus::Shipped).await,
            Outcome::Sent
        );
        assert_eq!(
            notifier.send_status_update(&o, OrderStatus::Delivered).await,
            Outcome::Sent
        );
    }

    #[tokio::test]
    async fn quiet_transitions_never_send() {
        let notifier = Notifier::new(FlakyMailer::failing(0));
        let o = order("10000006");
        assert_eq!(
            notifier.send_status_update(&o, OrderStatus::Processing).await,
            Outcome::Suppressed
        );
        assert_eq!(notifier.mailer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn worker_drains_enqueued_jobs() {
        let (handle, worker) = spawn_worker(Notifier::new(FlakyMailer::failing(0)));
        handle.enqueue(NotifyJob::Confirmation(Box::new(order("10000007"))));
        drop(handle);
        worker.await.unwrap();
    }
}
