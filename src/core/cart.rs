//! Cart and checkout pricing.
//!
//! A [`Cart`] is a plain serializable value the storefront keeps between page
//! navigations: one line per menu item with a quantity. At checkout it turns
//! into order lines. The server never trusts cart prices as-is: [`Catalog`]
//! re-prices lines against the current menu both for quotes and for orders.

use crate::{
    core::{menu, order::OrderItemInput},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prices closer than this are considered equal.
const PRICE_EPSILON: f64 = 0.005;

/// One grouped cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Menu item name
    pub name: String,
    /// Unit price shown when the item was added
    pub price: f64,
    /// Number of units, at least 1
    pub quantity: u32,
}

impl CartLine {
    /// Quantity times unit price.
    #[must_use]
    pub fn amount(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

/// Selected menu items grouped by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in the order they were first added
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Adds one unit of `name`, grouping with an existing line of the same name.
    pub fn add(&mut self, name: &str, price: f64) {
        if let Some(line) = self.line_mut(name) {
            line.quantity += 1;
            return;
        }
        self.lines.push(CartLine {
            name: name.trim().to_string(),
            price,
            quantity: 1,
        });
    }

    /// Sets the quantity of an existing line; zero removes it.
    ///
    /// Returns false if no line has this name.
    pub fn set_quantity(&mut self, name: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(name);
        }
        match self.line_mut(name) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes the line for `name`. Returns false if it was not in the cart.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.lines.len();
        let key = normalize(name);
        self.lines.retain(|l| normalize(&l.name) != key);
        self.lines.len() != before
    }

    /// Sum of all line amounts.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::amount).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// True when the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Converts the cart into order lines for checkout.
    #[must_use]
    pub fn into_order_items(self) -> Vec<OrderItemInput> {
        self.lines
            .into_iter()
            .map(|l| OrderItemInput {
                name: l.name,
                quantity: i64::from(l.quantity),
                price: l.price,
            })
            .collect()
    }

    fn line_mut(&mut self, name: &str) -> Option<&mut CartLine> {
        let key = normalize(name);
        self.lines.iter_mut().find(|l| normalize(&l.name) == key)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Why a line could not be priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingIssue {
    /// No menu item has this name
    UnknownItem,
    /// The menu item exists but is hidden
    Unavailable,
    /// The submitted price differs from the menu price
    PriceChanged,
}

/// Snapshot of the menu used to price lines.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    available: HashMap<String, f64>,
    unavailable: HashMap<String, f64>,
}

impl Catalog {
    /// Loads the current menu.
    pub async fn load(db: &DatabaseConnection) -> Result<Self> {
        let mut catalog = Self::default();
        for item in menu::get_all_menu_items(db).await? {
            let target = if item.available {
                &mut catalog.available
            } else {
                &mut catalog.unavailable
            };
            target.entry(normalize(&item.name)).or_insert(item.price);
        }
        Ok(catalog)
    }

    /// An empty menu cannot price anything, so checkout trusts the client.
    #[must_use]
    pub fn is_enforced(&self) -> bool {
        !self.available.is_empty() || !self.unavailable.is_empty()
    }

    /// Current price of an orderable item.
    #[must_use]
    pub fn price_of(&self, name: &str) -> Option<f64> {
        self.available.get(&normalize(name)).copied()
    }

    /// Checks a submitted line against the menu.
    ///
    /// # Errors
    /// Returns the [`PricingIssue`] that prevents the line from being ordered.
    pub fn check(&self, name: &str, submitted_price: f64) -> std::result::Result<f64, PricingIssue> {
        if !self.is_enforced() {
            return Ok(submitted_price);
        }
        let key = normalize(name);
        match self.available.get(&key) {
            Some(&price) if (price - submitted_price).abs() < PRICE_EPSILON => Ok(price),
            Some(_) => Err(PricingIssue::PriceChanged),
            None if self.unavailable.contains_key(&key) => Err(PricingIssue::Unavailable),
            None => Err(PricingIssue::UnknownItem),
        }
    }
}

/// A cart line that cannot be ordered as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedLine {
    /// The line as submitted
    pub line: CartLine,
    /// Why it was rejected
    pub issue: PricingIssue,
    /// Current menu price, when the item is still orderable
    pub current_price: Option<f64>,
}

/// Result of re-pricing a cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    /// Lines that can be ordered, at current menu prices
    pub cart: Cart,
    /// Lines that need the customer's attention
    pub rejected: Vec<RejectedLine>,
    /// Total of the accepted lines
    pub total: f64,
}

/// Re-prices a cart against the current menu.
///
/// Lines whose price changed are kept at the new price and also reported, so
/// the storefront can tell the customer before checkout.
pub async fn quote_cart(db: &DatabaseConnection, cart: Cart) -> Result<CartQuote> {
    let catalog = Catalog::load(db).await?;
    Ok(quote_with_catalog(&catalog, cart))
}

fn quote_with_catalog(catalog: &Catalog, cart: Cart) -> CartQuote {
    let mut accepted = Cart::default();
    let mut rejected = Vec::new();

    for line in cart.lines {
        if line.quantity == 0 {
            continue;
        }
        match catalog.check(&line.name, line.price) {
            Ok(price) => accepted.lines.push(CartLine { price, ..line }),
            Err(PricingIssue::PriceChanged) => {
                let current = catalog.price_of(&line.name);
                if let Some(price) = current {
                    accepted.lines.push(CartLine {
                        price,
                        ..line.clone()
                    });
                }
                rejected.push(RejectedLine {
                    line,
                    issue: PricingIssue::PriceChanged,
                    current_price: current,
                });
            }
            Err(issue) => rejected.push(RejectedLine {
                line,
                issue,
                current_price: None,
            }),
        }
    }

    let total = accepted.total();
    CartQuote {
        cart: accepted,
        rejected,
        total,
    }
}
