//! Abandoned-cart notifications.
//!
//! Every cart mutation by a logged-in user restarts a single debounce timer.
//! When the cart stays untouched for the whole delay, one email summarizing
//! the cart as it was at the last mutation goes out. Delivery is
//! fire-and-forget: failures are logged and never reach the user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use dummymart_core::{Email, Price};

use super::mailer::{CartTemplateParams, EmailJsClient, MailError};
use crate::cart::CartStore;
use crate::config::NotifyConfig;
use crate::models::session::Session;
use crate::scheduler::{Debouncer, Scheduler};

/// Template `product_name` for the combined summary.
pub const SUMMARY_TITLE: &str = "Combined Cart Summary";

/// One cart line as captured for a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLine {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Price,
}

/// Immutable copy of the cart taken when a notification is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub lines: Vec<SnapshotLine>,
    /// Email of the logged-in user, if the API reported one.
    pub recipient: Option<Email>,
}

impl CartSnapshot {
    #[must_use]
    pub fn capture(cart: &CartStore, recipient: Option<Email>) -> Self {
        Self {
            lines: cart
                .lines()
                .map(|line| SnapshotLine {
                    title: line.product.title.clone(),
                    quantity: line.quantity,
                    unit_price: line.product.unit_price(),
                })
                .collect(),
            recipient,
        }
    }

    /// Sum of unit price times quantity, before VAT and discounts.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines
            .iter()
            .fold(Price::zero(), |sum, line| sum + line.unit_price * line.quantity)
    }

    /// `"<title> - Qty: <n>"` per line, newline separated.
    #[must_use]
    pub fn quantity_summary(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{} - Qty: {}", line.title, line.quantity))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn template_params(&self, to: &Email) -> CartTemplateParams {
        CartTemplateParams {
            product_name: SUMMARY_TITLE.to_string(),
            product_qty: self.quantity_summary(),
            product_price: self.total().to_string(),
            to_email: to.to_string(),
        }
    }
}

/// Delivers a cart summary.
#[async_trait]
pub trait CartNotifier: Send + Sync {
    /// Send one notification.
    ///
    /// # Errors
    ///
    /// Returns the delivery error; callers log it.
    async fn notify(&self, snapshot: CartSnapshot) -> Result<(), MailError>;
}

/// Sends the summary through EmailJS.
pub struct EmailJsNotifier {
    client: EmailJsClient,
    fallback: Option<Email>,
}

impl EmailJsNotifier {
    #[must_use]
    pub const fn new(client: EmailJsClient, fallback: Option<Email>) -> Self {
        Self { client, fallback }
    }
}

#[async_trait]
impl CartNotifier for EmailJsNotifier {
    async fn notify(&self, snapshot: CartSnapshot) -> Result<(), MailError> {
        let Some(to) = snapshot.recipient.as_ref().or(self.fallback.as_ref()) else {
            warn!("no recipient for cart notification, skipping");
            return Ok(());
        };

        self.client.send(&snapshot.template_params(to)).await?;
        info!(to = %to, lines = snapshot.lines.len(), "cart email sent");
        Ok(())
    }
}

/// Logs the summary instead of sending it. Used when EmailJS is not
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl CartNotifier for LogNotifier {
    async fn notify(&self, snapshot: CartSnapshot) -> Result<(), MailError> {
        info!(
            recipient = ?snapshot.recipient.as_ref().map(Email::as_str),
            total = %snapshot.total(),
            summary = %snapshot.quantity_summary(),
            "cart notification (email delivery not configured)"
        );
        Ok(())
    }
}

/// Build the notifier selected by configuration.
///
/// # Errors
///
/// Returns error if the EmailJS HTTP client fails to build.
pub fn notifier_from_config(config: &NotifyConfig) -> Result<Arc<dyn CartNotifier>, MailError> {
    match &config.emailjs {
        Some(emailjs) => Ok(Arc::new(EmailJsNotifier::new(
            EmailJsClient::new(emailjs)?,
            config.fallback_email.clone(),
        ))),
        None => Ok(Arc::new(LogNotifier)),
    }
}

/// Debounces cart mutations into at most one pending notification.
pub struct AbandonedCartNotifier {
    debouncer: Debouncer,
    notifier: Arc<dyn CartNotifier>,
}

impl AbandonedCartNotifier {
    #[must_use]
    pub fn new(scheduler: Scheduler, delay: Duration, notifier: Arc<dyn CartNotifier>) -> Self {
        Self {
            debouncer: Debouncer::new(scheduler, delay),
            notifier,
        }
    }

    /// React to a cart mutation.
    ///
    /// Cancels the pending notification, then schedules a new one with a
    /// snapshot of `cart` unless there is no session or the cart is empty.
    /// Returns whether a notification is now scheduled.
    pub fn cart_changed(&mut self, cart: &CartStore, session: Option<&Session>) -> bool {
        let Some(session) = session.filter(|_| !cart.is_empty()) else {
            self.debouncer.cancel();
            return false;
        };

        let snapshot = CartSnapshot::capture(cart, session.email.clone());
        let notifier = Arc::clone(&self.notifier);

        self.debouncer.restart(async move {
            if let Err(e) = notifier.notify(snapshot).await {
                warn!(error = %e, "cart notification failed");
            }
        });
        true
    }

    /// Drop the pending notification, if any.
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
