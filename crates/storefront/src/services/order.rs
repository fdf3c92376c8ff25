//! Order submission.
//!
//! Checkout turns the cart into a plain-text message and delivers it through
//! an [`OrderChannel`] (the Telegram bot in production). Submission is a single
//! best-effort attempt: no retry, no queueing, and the cart is never modified.
//!
//! # States
//!
//! ```text
//! Idle ──submit──▶ Sending ──ok──▶ Succeeded
//!                     │
//!                     └──err/drop──▶ Failed
//! ```
//!
//! While `Sending`, further submissions are rejected with
//! [`SubmissionError::AlreadySending`]. `Succeeded` and `Failed` both accept a
//! new submission.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use mustafo_core::{Cart, CartItem, format_amount};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors from submitting an order.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A previous submission has not finished yet.
    #[error("an order submission is already in progress")]
    AlreadySending,

    /// The cart total is not representable.
    #[error("order total overflows")]
    TotalOverflow,

    /// The channel failed to deliver the message.
    #[error("order delivery failed: {0}")]
    Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Where order messages are delivered.
pub trait OrderChannel: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver `text` to the shop owner.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Sending,
    Succeeded,
    Failed,
}

/// A formatted order, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage {
    text: String,
    total: Decimal,
}

impl OrderMessage {
    /// Format `cart` as an order message.
    ///
    /// ```text
    /// New Order:
    /// Mens Cotton Jacket - 2 x 55.99 USD
    /// Solid Gold Petite Micropave - 1 x 168 USD
    /// Total: 279.98 USD
    /// ```
    ///
    /// `None` if the total overflows.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Option<Self> {
        let lines = cart
            .items()
            .iter()
            .map(order_line)
            .collect::<Vec<_>>()
            .join("\n");
        let total = cart.subtotal()?;

        Some(Self {
            text: format!("New Order:\n{lines}\nTotal: {} USD", format_amount(total)),
            total,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Sum of `price * quantity`, excluding shipping.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }
}

/// `"<title> - <quantity> x <price> USD"`
#[must_use]
pub fn order_line(item: &CartItem) -> String {
    format!(
        "{} - {} x {} USD",
        item.title,
        item.quantity,
        format_amount(item.price.amount())
    )
}

/// Result of a delivered order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    /// Number of distinct products in the order.
    pub lines: usize,
    pub total: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// Sends orders through a channel, one at a time.
pub struct OrderSubmitter<C> {
    channel: C,
    state: Mutex<SubmissionState>,
}

impl<C> std::fmt::Debug for OrderSubmitter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSubmitter")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<C> OrderSubmitter<C> {
    /// Create a submitter in the `Idle` state.
    #[must_use]
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    /// Current submission state.
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        *lock(&self.state)
    }

    #[must_use]
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// Move to `Sending`, unless a submission is already in flight.
    fn begin(&self) -> Result<SendingGuard<'_>, SubmissionError> {
        let mut state = lock(&self.state);
        if *state == SubmissionState::Sending {
            return Err(SubmissionError::AlreadySending);
        }
        *state = SubmissionState::Sending;
        Ok(SendingGuard {
            state: &self.state,
            finished: false,
        })
    }
}

impl<C: OrderChannel> OrderSubmitter<C> {
    /// Format `cart` and deliver it.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::EmptyCart`] if `cart` has no items
    /// - [`SubmissionError::TotalOverflow`] if the total cannot be computed
    /// - [`SubmissionError::AlreadySending`] if another submission is in flight
    /// - [`SubmissionError::Delivery`] if the channel reports a failure
    #[instrument(skip_all, fields(lines = cart.len()))]
    pub async fn submit(&self, cart: &Cart) -> Result<OrderReceipt, SubmissionError> {
        if cart.is_empty() {
            return Err(SubmissionError::EmptyCart);
        }

        let message = OrderMessage::from_cart(cart).ok_or(SubmissionError::TotalOverflow)?;
        let guard = self.begin()?;

        match self.channel.send(message.text()).await {
            Ok(()) => {
                guard.finish(SubmissionState::Succeeded);
                info!(total = %message.total(), "Order submitted");
                Ok(OrderReceipt {
                    lines: cart.len(),
                    total: message.total(),
                    submitted_at: Utc::now(),
                })
            }
            Err(e) => {
                guard.finish(SubmissionState::Failed);
                warn!(error = %e, "Order submission failed");
                Err(SubmissionError::Delivery(Box::new(e)))
            }
        }
    }
}

/// Holds the `Sending` state. Dropping it without `finish` records `Failed`.
struct SendingGuard<'a> {
    state: &'a Mutex<SubmissionState>,
    finished: bool,
}

impl SendingGuard<'_> {
    fn finish(mut self, outcome: SubmissionState) {
        *lock(self.state) = outcome;
        self.finished = true;
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *lock(self.state) = SubmissionState::Failed;
        }
    }
}

fn lock(state: &Mutex<SubmissionState>) -> MutexGuard<'_, SubmissionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use mustafo_core::{Price, ProductId};
    use tokio::sync::Semaphore;

    use super::*;

    #[derive(Debug, Error)]
    #[error("channel unavailable")]
    struct Unavailable;

    /// Channel that records messages and waits for a permit before answering.
    struct GatedChannel {
        gate: Semaphore,
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl GatedChannel {
        fn new(permits: usize, fail: bool) -> Self {
            Self {
                gate: Semaphore::new(permits),
                sent: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl OrderChannel for GatedChannel {
        type Error = Unavailable;

        async fn send(&self, text: &str) -> Result<(), Self::Error> {
            let permit = self.gate.acquire().await.unwrap();
            permit.forget();
            self.sent.lock().unwrap().push(text.to_string());
            if self.fail { Err(Unavailable) } else { Ok(()) }
        }
    }

    fn item(id: i32, title: &str, cents: u32, quantity: u32) -> CartItem {
        CartItem::new(ProductId::new(id), title, Price::from_cents(cents))
            .with_quantity(NonZeroU32::new(quantity).unwrap())
    }

    fn sample_cart() -> Cart {
        Cart::try_from_items([
            item(1, "Mens Cotton Jacket", 5599, 2),
            item(2, "Solid Gold Petite Micropave", 16800, 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_order_line_format() {
        let line = order_line(&item(1, "Backpack", 999, 3));
        assert_eq!(line, "Backpack - 3 x 9.99 USD");
    }

    #[test]
    fn test_order_message_format() {
        let message = OrderMessage::from_cart(&sample_cart()).unwrap();
        assert_eq!(
            message.text(),
            "New Order:\n\
             Mens Cotton Jacket - 2 x 55.99 USD\n\
             Solid Gold Petite Micropave - 1 x 168 USD\n\
             Total: 279.98 USD"
        );
        assert_eq!(message.total(), Decimal::new(27998, 2));
    }

    #[test]
    fn test_order_message_at_subtotal_limit() {
        let gold = CartItem::new(ProductId::new(1), "Gold", Price::MAX)
            .with_quantity(NonZeroU32::new(1000).unwrap());
        let cart = Cart::try_from_items([gold]).unwrap();

        let message = OrderMessage::from_cart(&cart).unwrap();

        assert_eq!(message.total(), Cart::MAX_SUBTOTAL);
        assert_eq!(
            message.text(),
            "New Order:\nGold - 1000 x 1000000000 USD\nTotal: 1000000000000 USD"
        );
    }

    #[tokio::test]
    async fn test_submit_success() {
        let submitter = OrderSubmitter::new(GatedChannel::new(1, false));
        let cart = sample_cart();

        let receipt = submitter.submit(&cart).await.unwrap();

        assert_eq!(receipt.lines, 2);
        assert_eq!(receipt.total, Decimal::new(27998, 2));
        assert_eq!(submitter.state(), SubmissionState::Succeeded);
        assert_eq!(submitter.channel().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_failure_leaves_failed_state() {
        let submitter = OrderSubmitter::new(GatedChannel::new(1, true));

        let result = submitter.submit(&sample_cart()).await;

        assert!(matches!(result, Err(SubmissionError::Delivery(_))));
        assert_eq!(submitter.state(), SubmissionState::Failed);
    }

    #[tokio::test]
    async fn test_submit_empty_cart_is_rejected_without_sending() {
        let submitter = OrderSubmitter::new(GatedChannel::new(1, false));

        let result = submitter.submit(&Cart::new()).await;

        assert!(matches!(result, Err(SubmissionError::EmptyCart)));
        assert_eq!(submitter.state(), SubmissionState::Idle);
        assert!(submitter.channel().sent().is_empty());
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_first_pending() {
        let submitter = Arc::new(OrderSubmitter::new(GatedChannel::new(0, false)));
        let cart = sample_cart();

        let first = tokio::spawn({
            let submitter = Arc::clone(&submitter);
            let cart = cart.clone();
            async move { submitter.submit(&cart).await }
        });

        while submitter.state() != SubmissionState::Sending {
            tokio::task::yield_now().await;
        }

        let second = submitter.submit(&cart).await;
        assert!(matches!(second, Err(SubmissionError::AlreadySending)));

        submitter.channel().gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert_eq!(submitter.state(), SubmissionState::Succeeded);
        assert_eq!(submitter.channel().sent().len(), 1);

        submitter.channel().gate.add_permits(1);
        submitter.submit(&cart).await.unwrap();
        assert_eq!(submitter.channel().sent().len(), 2);
    }

    #[tokio::test]
    async fn test_dropped_submission_does_not_stay_sending() {
        let submitter = OrderSubmitter::new(GatedChannel::new(0, false));
        let cart = sample_cart();

        {
            let pending = submitter.submit(&cart);
            tokio::pin!(pending);
            let polled = tokio::time::timeout(std::time::Duration::from_millis(10), &mut pending).await;
            assert!(polled.is_err());
            assert_eq!(submitter.state(), SubmissionState::Sending);
        }

        assert_eq!(submitter.state(), SubmissionState::Failed);
    }

    #[tokio::test]
    async fn test_submit_does_not_touch_cart() {
        let submitter = OrderSubmitter::new(GatedChannel::new(1, true));
        let cart = sample_cart();
        let before = cart.clone();

        let _ = submitter.submit(&cart).await;

        assert_eq!(cart, before);
    }
}
