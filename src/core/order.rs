//! Order business logic - Checkout, status lifecycle, tracking and listing.
//!
//! Orders are accepted from anonymous customers, validated before anything is
//! written, and stored together with their line items in a single database
//! transaction. After creation only the status changes, and only along the
//! edges allowed by [`OrderStatus::can_transition_to`].

use crate::{
    core::cart::{Catalog, PricingIssue},
    entities::{
        Order, OrderItem,
        order::{self, OrderStatus, PaymentMethod},
        order_item,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Declared totals further than this from the line sum are logged.
const TOTAL_EPSILON: f64 = 0.01;

/// One line as submitted at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    /// Menu item name
    #[serde(default)]
    pub name: String,
    /// Number of units
    #[serde(default)]
    pub quantity: i64,
    /// Unit price
    #[serde(default)]
    pub price: f64,
}

/// Checkout payload.
///
/// Every field defaults so that missing fields are reported as validation
/// errors rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    /// Name to bill
    #[serde(default)]
    pub customer_name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: String,
    /// Optional contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Delivery address
    #[serde(default)]
    pub address: String,
    /// Ordered lines
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    /// Total declared by the client
    #[serde(default)]
    pub total_amount: f64,
    /// `"cash"` or `"online"`
    #[serde(default)]
    pub payment_method: String,
}

/// Lookup key for public order tracking.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackQuery {
    /// Phone used at checkout
    pub phone: Option<String>,
    /// Order identifier
    pub order_id: Option<String>,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    /// The order row
    #[serde(flatten)]
    pub order: order::Model,
    /// Lines in submission order
    pub items: Vec<order_item::Model>,
}

/// What a customer sees when tracking an order. Omits the email address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    /// Order identifier
    pub id: String,
    /// Billed name
    pub customer_name: String,
    /// Contact phone
    pub phone: String,
    /// Delivery address
    pub address: String,
    /// Ordered lines
    pub items: Vec<order_item::Model>,
    /// Declared total
    pub total_amount: f64,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Current status
    pub status: OrderStatus,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// When the order last changed
    pub updated_at: DateTime<Utc>,
}

impl From<OrderDetails> for TrackedOrder {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails { order, items } = details;
        Self {
            id: order.id,
            customer_name: order.customer_name,
            phone: order.phone,
            address: order.address,
            items,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Checkout payload after validation and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    /// Trimmed name
    pub customer_name: String,
    /// Trimmed phone
    pub phone: String,
    /// Trimmed email, `None` when blank
    pub email: Option<String>,
    /// Trimmed address
    pub address: String,
    /// `(name, quantity, price)` per line
    pub items: Vec<(String, i32, f64)>,
    /// Declared total
    pub total_amount: f64,
    /// Parsed payment method
    pub payment_method: PaymentMethod,
}

/// Validates a checkout payload without touching the database.
///
/// # Errors
/// Returns [`Error::Validation`] if:
/// - Customer name, phone or address is empty
/// - There are no items, or an item has no name, a quantity below 1, or a
///   price that is not a positive number
/// - The total is not a positive number
/// - The payment method is not `cash` or `online`
pub fn validate_order(input: OrderInput) -> Result<ValidatedOrder> {
    let customer_name = input.customer_name.trim();
    let phone = input.phone.trim();
    let address = input.address.trim();
    if customer_name.is_empty() || phone.is_empty() || address.is_empty() {
        return Err(Error::validation(
            "Customer name, phone, and address are required",
        ));
    }

    if input.items.is_empty() {
        return Err(Error::validation("Order must contain at least one item"));
    }

    let mut items = Vec::with_capacity(input.items.len());
    for (index, item) in input.items.iter().enumerate() {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(Error::validation(format!("Item {index} has no name")));
        }
        let quantity = i32::try_from(item.quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Item {index} ('{name}') must have a quantity of at least 1"
                ))
            })?;
        if !item.price.is_finite() || item.price <= 0.0 {
            return Err(Error::validation(format!(
                "Item {index} ('{name}') must have a positive price"
            )));
        }
        items.push((name.to_string(), quantity, item.price));
    }

    if !input.total_amount.is_finite() || input.total_amount <= 0.0 {
        return Err(Error::validation("Total amount must be greater than 0"));
    }

    let payment_method = input
        .payment_method
        .trim()
        .parse::<PaymentMethod>()
        .map_err(|()| Error::validation("Payment method must be either \"cash\" or \"online\""))?;

    Ok(ValidatedOrder {
        customer_name: customer_name.to_string(),
        phone: phone.to_string(),
        email: input
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        address: address.to_string(),
        items,
        total_amount: input.total_amount,
        payment_method,
    })
}

/// Parses a status name from an admin request.
///
/// # Errors
/// Returns [`Error::Validation`] for anything outside the six known statuses.
pub fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.trim()
        .parse()
        .map_err(|()| Error::validation(format!("Unknown order status '{}'", raw.trim())))
}

fn check_against_menu(catalog: &Catalog, order: &ValidatedOrder) -> Result<()> {
    for (name, _, price) in &order.items {
        match catalog.check(name, *price) {
            Ok(_) => {}
            Err(PricingIssue::UnknownItem) => {
                warn!(item = %name, "Order line is not on the menu, accepting as submitted");
            }
            Err(PricingIssue::Unavailable) => {
                return Err(Error::validation(format!(
                    "'{name}' is currently unavailable"
                )));
            }
            Err(PricingIssue::PriceChanged) => {
                return Err(Error::validation(format!(
                    "Price of '{name}' has changed, please review your cart"
                )));
            }
        }
    }
    Ok(())
}

/// Validates and stores a new order with status `pending`.
///
/// Lines naming a menu item must match its current price and the item must be
/// available. Lines the menu does not know are accepted and logged. Nothing is
/// written unless validation passes, and the order and its lines are written
/// in one transaction.
///
/// # Errors
/// Returns [`Error::Validation`] for invalid input (see [`validate_order`])
/// or menu mismatches, and database errors otherwise.
#[instrument(skip(db, input))]
pub async fn create_order(db: &DatabaseConnection, input: OrderInput) -> Result<OrderDetails> {
    let validated = validate_order(input)?;

    let catalog = Catalog::load(db).await?;
    check_against_menu(&catalog, &validated)?;

    let line_sum: f64 = validated
        .items
        .iter()
        .map(|(_, qty, price)| f64::from(*qty) * price)
        .sum();
    if (line_sum - validated.total_amount).abs() > TOTAL_EPSILON {
        warn!(
            declared = validated.total_amount,
            computed = line_sum,
            "Declared order total differs from item sum"
        );
    }

    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now();

    let txn = db.begin().await?;

    let order = order::ActiveModel {
        id: Set(id.clone()),
        customer_name: Set(validated.customer_name),
        phone: Set(validated.phone),
        email: Set(validated.email),
        address: Set(validated.address),
        total_amount: Set(validated.total_amount),
        payment_method: Set(validated.payment_method),
        status: Set(OrderStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(validated.items.len());
    for (position, (name, quantity, price)) in validated.items.into_iter().enumerate() {
        let item = order_item::ActiveModel {
            order_id: Set(id.clone()),
            position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            name: Set(name),
            quantity: Set(quantity),
            price: Set(price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    info!(order_id = %order.id, total = order.total_amount, "Order placed");
    Ok(OrderDetails { order, items })
}

async fn items_for(db: &DatabaseConnection, order_id: &str) -> Result<Vec<order_item::Model>> {
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Position)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one order with its lines.
pub async fn get_order(db: &DatabaseConnection, order_id: &str) -> Result<Option<OrderDetails>> {
    let Some(order) = Order::find_by_id(order_id).one(db).await? else {
        return Ok(None);
    };
    let items = items_for(db, &order.id).await?;
    Ok(Some(OrderDetails { order, items }))
}

/// Retrieves all orders, newest first, each with its lines.
pub async fn list_orders(db: &DatabaseConnection) -> Result<Vec<OrderDetails>> {
    let orders = Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .all(db)
        .await?;

    let mut grouped: HashMap<String, Vec<order_item::Model>> = HashMap::new();
    let all_items = OrderItem::find()
        .order_by_asc(order_item::Column::Position)
        .all(db)
        .await?;
    for item in all_items {
        grouped.entry(item.order_id.clone()).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = grouped.remove(&order.id).unwrap_or_default();
            OrderDetails { order, items }
        })
        .collect())
}

/// Attempts at applying a status change before giving up on a contended order.
const STATUS_UPDATE_ATTEMPTS: usize = 3;

/// Moves an order to `new_status`.
///
/// Setting the current status again is a no-op that leaves the record
/// untouched. The write only lands if the status is still the one the
/// transition was checked against; a concurrent change makes the check run
/// again on the fresh status.
///
/// # Errors
/// Returns [`Error::NotFound`] if the order does not exist and
/// [`Error::InvalidTransition`] if the lifecycle forbids the move.
#[instrument(skip(db))]
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: &str,
    new_status: OrderStatus,
) -> Result<OrderDetails> {
    for _ in 0..STATUS_UPDATE_ATTEMPTS {
        let current = Order::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("Order", order_id))?;

        if current.status == new_status {
            debug!("Status unchanged, nothing to do");
            let items = items_for(db, order_id).await?;
            return Ok(OrderDetails {
                order: current,
                items,
            });
        }

        if !current.status.can_transition_to(new_status) {
            return Err(Error::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        }

        let previous = current.status;
        let result = Order::update_many()
            .col_expr(order::Column::Status, Expr::value(new_status.to_value()))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(previous))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            debug!(expected = %previous, "Status changed concurrently, re-checking");
            continue;
        }

        info!(from = %previous, to = %new_status, "Order status updated");
        return get_order(db, order_id)
            .await?
            .ok_or_else(|| Error::not_found("Order", order_id));
    }

    warn!("Order status kept changing underneath the update");
    Err(Error::validation(
        "Order was modified concurrently, please retry",
    ))
}

/// Public tracking: by identifier, or the most recent order for a phone.
///
/// # Errors
/// Returns [`Error::Validation`] if neither key is given and
/// [`Error::NotFound`] if nothing matches.
#[instrument(skip(db))]
pub async fn track_order(db: &DatabaseConnection, query: TrackQuery) -> Result<TrackedOrder> {
    let order_id = query.order_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let phone = query.phone.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let details = match (order_id, phone) {
        (Some(id), _) => get_order(db, id)
            .await?
            .ok_or_else(|| Error::not_found("Order", id))?,
        (None, Some(phone)) => {
            let order = Order::find()
                .filter(order::Column::Phone.eq(phone))
                .order_by_desc(order::Column::CreatedAt)
                .one(db)
                .await?
                .ok_or_else(|| Error::not_found("Order", phone))?;
            let items = items_for(db, &order.id).await?;
            OrderDetails { order, items }
        }
        (None, None) => {
            return Err(Error::validation(
                "Please provide phone number or order ID",
            ));
        }
    };

    Ok(details.into())
}

/// Removes an order and its lines. Administrative override only.
///
/// # Errors
/// Returns [`Error::NotFound`] if the order does not exist.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: &str) -> Result<()> {
    let txn = db.begin().await?;

    OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    let result = Order::delete_by_id(order_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(Error::not_found("Order", order_id));
    }

    txn.commit().await?;
    info!("Order deleted");
    Ok(())
}
