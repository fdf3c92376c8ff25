//! Cart route handlers.
//!
//! Each handler is a thin command over the shared [`CartStore`]: apply one
//! change, then return the refreshed cart view. A failed write does not fail
//! the request; the view carries a `warning` instead. A change that would push
//! the subtotal past the cart limit is refused with 400.

use axum::{Form, Json, extract::State};
use mustafo_core::{Cart, CartItem, Price, ProductId, Rating, format_usd};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{CartError, CartStore, OrderReceipt, SubmissionState};
use crate::state::AppState;
use crate::storage::FileStore;

/// Shown when a cart change could not be written to the persistence slot.
pub const SAVE_WARNING: &str = "Your cart could not be saved. Changes may be lost after a reload.";

/// Cart item display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub rating: Option<Rating>,
}

impl CartItemView {
    /// `None` if the line total overflows.
    #[must_use]
    pub fn new(item: &CartItem) -> Option<Self> {
        Some(Self {
            id: item.id,
            title: item.title.clone(),
            description: item.description.clone(),
            image: item.image.clone(),
            quantity: item.quantity.get(),
            price: item.price.to_string(),
            line_price: format_usd(item.line_total()?),
            rating: item.rating.clone(),
        })
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub item_count: u64,
    pub checkout: SubmissionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CartView {
    /// Build the view. An empty cart is charged no shipping.
    ///
    /// `None` if a total overflows.
    #[must_use]
    pub fn new(cart: &Cart, shipping_fee: Price, checkout: SubmissionState) -> Option<Self> {
        let summary = cart.summary(shipping_fee)?;

        Some(Self {
            items: cart.items().iter().map(CartItemView::new).collect::<Option<_>>()?,
            subtotal: format_usd(summary.subtotal),
            shipping: format_usd(summary.shipping),
            total: format_usd(summary.total),
            item_count: summary.item_count,
            checkout,
            warning: None,
        })
    }

    #[must_use]
    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

/// Cart count badge data.
#[derive(Debug, Clone, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Checkout result.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub message: String,
    pub receipt: OrderReceipt,
}

/// Form data naming one cart item.
#[derive(Debug, Deserialize)]
pub struct ItemForm {
    pub id: ProductId,
}

fn view(state: &AppState, cart: &Cart) -> Result<CartView> {
    CartView::new(cart, state.config().shipping_fee, state.orders().state())
        .ok_or_else(|| AppError::Internal("cart totals are not representable".to_string()))
}

/// Run one command against the cart and render the result.
fn apply(
    state: &AppState,
    command: impl FnOnce(&mut CartStore<FileStore>) -> std::result::Result<(), CartError>,
) -> Result<Json<CartView>> {
    let mut cart = state.cart();
    let warning = match command(&mut *cart) {
        Ok(()) => None,
        Err(CartError::Limit(e)) => return Err(AppError::BadRequest(e.to_string())),
        Err(CartError::Encode(_) | CartError::Persist(_)) => Some(SAVE_WARNING.to_string()),
    };
    Ok(Json(view(state, cart.cart())?.with_warning(warning)))
}

/// Display the cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<CartView>> {
    let cart = state.cart();
    Ok(Json(view(&state, cart.cart())?))
}

/// Get the cart count badge.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCount> {
    let count = state.cart().item_count();
    Json(CartCount { count })
}

/// Add an item, or one more of an item already in the cart.
#[instrument(skip(state, item), fields(id = %item.id))]
pub async fn add(
    State(state): State<AppState>,
    Json(item): Json<CartItem>,
) -> Result<Json<CartView>> {
    if item.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    apply(&state, |cart| cart.add(item))
}

/// Add one unit of an item.
#[instrument(skip(state))]
pub async fn increment(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> Result<Json<CartView>> {
    apply(&state, |cart| cart.increment(form.id))
}

/// Take away one unit of an item, removing it at the last unit.
#[instrument(skip(state))]
pub async fn decrement(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> Result<Json<CartView>> {
    apply(&state, |cart| cart.decrement(form.id))
}

/// Remove an item.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> Result<Json<CartView>> {
    apply(&state, |cart| cart.remove(form.id))
}

/// Send the current cart as an order.
///
/// The cart is left as it is whether or not delivery succeeds.
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Result<Json<CheckoutResponse>> {
    let cart = state.cart().cart().clone();

    let lines = cart.len().to_string();
    add_breadcrumb("checkout", "Order submitted", Some(&[("lines", lines.as_str())]));

    let receipt = state.orders().submit(&cart).await?;

    Ok(Json(CheckoutResponse {
        message: "Order sent successfully!".to_string(),
        receipt,
    }))
}
