use crate::domain::model::SupplierProfile;
use crate::domain::ports::Notifier;
use crate::utils::error::Result;
use async_trait::async_trait;

pub const CANCELLATION_SUBJECT: &str = "Event cancelled";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub delivered: usize,
    pub failed: usize,
    /// Suppliers with no email address on file.
    pub skipped: usize,
}

pub fn cancellation_body(event_date: &str) -> String {
    format!(
        "The event on {} has been cancelled. Check your supplier area for details. \
         We are starting the refund process for the customer.",
        event_date
    )
}

/// Tells every supplier attached to a cancelled event. A failed delivery
/// is logged and counted; it does not stop the remaining notifications.
pub async fn notify_cancellation<N>(
    notifier: &N,
    suppliers: &[SupplierProfile],
    event_date: &str,
) -> NotificationSummary
where
    N: Notifier + ?Sized,
{
    let body = cancellation_body(event_date);
    let mut summary = NotificationSummary::default();

    for supplier in suppliers {
        let Some(email) = supplier.email.as_deref() else {
            tracing::debug!("Supplier {} has no email, not notified", supplier.id);
            summary.skipped += 1;
            continue;
        };

        match notifier.notify(email, CANCELLATION_SUBJECT, &body).await {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                tracing::warn!(
                    "❌ Cancellation notice for supplier {} failed: {}",
                    supplier.id,
                    e
                );
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        "📨 Cancellation of {}: {} delivered, {} failed, {} skipped",
        event_date,
        summary.delivered,
        summary.failed,
        summary.skipped
    );
    summary
}

/// Transport that only writes the message to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!(recipient, subject, "{}", body);
        Ok(())
    }
}
