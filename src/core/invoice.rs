//! Invoice rendering.
//!
//! An order is first turned into an [`InvoiceDocument`], a plain value with
//! every string and amount that will appear on the page. Painting that value
//! onto an A4 PDF is a separate step. Amounts are recomputed from quantity and
//! unit price at render time; the stored order total is not used.

use crate::{
    config::settings::BusinessInfo,
    core::order::OrderDetails,
    entities::order::OrderStatus,
    errors::{Error, Result},
};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};
use tracing::{debug, instrument};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const RIGHT_EDGE: f32 = PAGE_WIDTH - MARGIN;
const ROW_HEIGHT: f32 = 7.0;
const BOTTOM_LIMIT: f32 = 260.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

/// Tax is not charged.
const TAX_RATE: f64 = 0.0;

/// One row of the item table.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRow {
    /// 1-based line number
    pub serial: usize,
    /// Item name
    pub item: String,
    /// Units ordered
    pub quantity: i32,
    /// Unit price
    pub rate: f64,
    /// `quantity * rate`
    pub amount: f64,
}

/// Status stamp printed under the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    /// Order delivered
    Delivered,
    /// Order confirmed by staff
    Confirmed,
}

impl StatusBadge {
    /// Badge for a status, if it gets one.
    #[must_use]
    pub const fn for_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Delivered => Some(Self::Delivered),
            OrderStatus::Confirmed => Some(Self::Confirmed),
            _ => None,
        }
    }

    /// Printed text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Delivered => "DELIVERED",
            Self::Confirmed => "CONFIRMED",
        }
    }

    const fn rgb(self) -> (f32, f32, f32) {
        match self {
            Self::Delivered => (0.086, 0.639, 0.290),
            Self::Confirmed => (0.114, 0.306, 0.847),
        }
    }
}

/// Everything printed on an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDocument {
    /// Issuer block
    pub issuer: BusinessInfo,
    /// Last 8 characters of the order id, uppercased
    pub invoice_number: String,
    /// Order date, `dd/mm/yyyy`
    pub date: String,
    /// Bill-to name
    pub customer_name: String,
    /// Bill-to phone
    pub phone: String,
    /// Bill-to email, if given at checkout
    pub email: Option<String>,
    /// Bill-to address
    pub address: String,
    /// Full order id
    pub order_id: String,
    /// Payment method as stored
    pub payment_method: String,
    /// Status as stored
    pub status: String,
    /// Item table
    pub rows: Vec<InvoiceRow>,
    /// Sum of row amounts
    pub subtotal: f64,
    /// Always zero
    pub tax: f64,
    /// `subtotal + tax`
    pub grand_total: f64,
    /// Optional status stamp
    pub badge: Option<StatusBadge>,
}

impl InvoiceDocument {
    /// Lays out an invoice for `details`.
    #[must_use]
    pub fn from_order(details: &OrderDetails, issuer: &BusinessInfo) -> Self {
        let order = &details.order;

        let rows: Vec<InvoiceRow> = details
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| InvoiceRow {
                serial: i + 1,
                item: item.name.clone(),
                quantity: item.quantity,
                rate: item.price,
                amount: item.amount(),
            })
            .collect();
        let subtotal: f64 = rows.iter().map(|r| r.amount).sum();
        let tax = subtotal * TAX_RATE;

        Self {
            issuer: issuer.clone(),
            invoice_number: invoice_number(&order.id),
            date: order.created_at.format("%d/%m/%Y").to_string(),
            customer_name: order.customer_name.clone(),
            phone: order.phone.clone(),
            email: order.email.clone(),
            address: order.address.clone(),
            order_id: order.id.clone(),
            payment_method: order.payment_method.to_string(),
            status: order.status.to_string(),
            rows,
            subtotal,
            tax,
            grand_total: subtotal + tax,
            badge: StatusBadge::for_status(order.status),
        }
    }

    /// Paints the document onto A4 pages and returns the PDF bytes.
    ///
    /// # Errors
    /// Returns [`Error::Invoice`] if the PDF backend fails.
    pub fn render(&self) -> Result<Vec<u8>> {
        let title = format!("Invoice {}", self.invoice_number);
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Invoice");
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(pdf_error)?,
        };
        let mut painter = Painter {
            layer: doc.get_page(page).get_layer(layer),
            fonts,
        };

        let y = self.paint_header(&painter);
        let y = self.paint_parties(&painter, y);
        let y = self.paint_table(&doc, &mut painter, y);
        self.paint_totals_and_footer(&doc, &mut painter, y);

        doc.save_to_bytes().map_err(pdf_error)
    }

    fn paint_header(&self, p: &Painter) -> f32 {
        p.text(&self.issuer.name, 20.0, MARGIN, 22.0, true);
        let mut y = 29.0;
        for line in wrap(&self.issuer.address, 55) {
            p.text(&line, 9.0, MARGIN, y, false);
            y += 4.5;
        }
        p.text(
            &format!("Phone: {}   Email: {}", self.issuer.phone, self.issuer.email),
            9.0,
            MARGIN,
            y,
            false,
        );

        p.text_right("INVOICE", 22.0, RIGHT_EDGE, 22.0, true);
        p.text_right(
            &format!("Invoice No: {}", self.invoice_number),
            10.0,
            RIGHT_EDGE,
            29.0,
            false,
        );
        p.text_right(&format!("Date: {}", self.date), 10.0, RIGHT_EDGE, 34.0, false);

        let y = y.max(34.0) + 6.0;
        p.rule(y);
        y
    }

    fn paint_parties(&self, p: &Painter, top: f32) -> f32 {
        let mut left = top + 8.0;
        p.text("Bill To", 12.0, MARGIN, left, true);
        left += 7.0;
        let mut bill_to = vec![
            format!("Name: {}", self.customer_name),
            format!("Phone: {}", self.phone),
        ];
        if let Some(email) = &self.email {
            bill_to.push(format!("Email: {email}"));
        }
        bill_to.extend(wrap(&format!("Address: {}", self.address), 50));
        for line in &bill_to {
            p.text(line, 10.0, MARGIN, left, false);
            left += 5.0;
        }

        let mut right = top + 8.0;
        p.text_right("Order Info", 12.0, RIGHT_EDGE, right, true);
        right += 7.0;
        for line in [
            format!("Order ID: {}", self.order_id),
            format!("Payment: {}", self.payment_method),
            format!("Status: {}", self.status),
        ] {
            p.text_right(&line, 10.0, RIGHT_EDGE, right, false);
            right += 5.0;
        }

        left.max(right) + 6.0
    }

    fn paint_table(&self, doc: &PdfDocumentReference, p: &mut Painter, top: f32) -> f32 {
        let header = |p: &Painter, y: f32| {
            p.rule(y - 5.0);
            p.text("S.No", 11.0, MARGIN, y, true);
            p.text("Item", 11.0, 35.0, y, true);
            p.text_right("Qty", 11.0, 125.0, y, true);
            p.text_right("Rate", 11.0, 155.0, y, true);
            p.text_right("Amount", 11.0, RIGHT_EDGE, y, true);
            p.rule(y + 2.5);
        };

        let mut y = top + 5.0;
        header(&*p, y);
        y += ROW_HEIGHT + 1.0;

        for row in &self.rows {
            if y > BOTTOM_LIMIT {
                p.new_page(doc);
                y = MARGIN + 10.0;
                header(&*p, y);
                y += ROW_HEIGHT + 1.0;
            }
            p.text(&row.serial.to_string(), 10.0, MARGIN, y, false);
            p.text(&truncate(&row.item, 45), 10.0, 35.0, y, false);
            p.text_right(&row.quantity.to_string(), 10.0, 125.0, y, false);
            p.text_right(&format_currency(row.rate), 10.0, 155.0, y, false);
            p.text_right(&format_currency(row.amount), 10.0, RIGHT_EDGE, y, false);
            y += ROW_HEIGHT;
        }
        p.rule(y - 4.0);
        y
    }

    fn paint_totals_and_footer(&self, doc: &PdfDocumentReference, p: &mut Painter, top: f32) {
        let mut y = top + 4.0;
        if y > BOTTOM_LIMIT - 20.0 {
            p.new_page(doc);
            y = MARGIN + 10.0;
        }

        let label_x = 110.0;
        p.text("Subtotal", 11.0, label_x, y, false);
        p.text_right(&format_currency(self.subtotal), 11.0, RIGHT_EDGE, y, false);
        y += 7.0;
        p.text("Taxes", 11.0, label_x, y, false);
        p.text_right(&format_currency(self.tax), 11.0, RIGHT_EDGE, y, false);
        y += 8.0;
        p.text("Grand Total", 12.0, label_x, y, true);
        p.text_right(&format_currency(self.grand_total), 12.0, RIGHT_EDGE, y, true);

        y += 16.0;
        p.color(0.420, 0.447, 0.502);
        p.text("Thank you for your purchase!", 10.0, MARGIN, y, false);
        p.text("This is a computer generated invoice.", 10.0, MARGIN, y + 5.0, false);

        if let Some(badge) = self.badge {
            let (r, g, b) = badge.rgb();
            p.color(r, g, b);
            p.text(badge.label(), 18.0, MARGIN, y + 16.0, true);
        }
    }
}

/// Renders the invoice PDF for an order.
///
/// # Errors
/// Returns [`Error::Invoice`] if the PDF backend fails.
#[instrument(skip_all, fields(order_id = %details.order.id))]
pub fn render_invoice_pdf(details: &OrderDetails, issuer: &BusinessInfo) -> Result<Vec<u8>> {
    let bytes = InvoiceDocument::from_order(details, issuer).render()?;
    debug!(size = bytes.len(), "Invoice rendered");
    Ok(bytes)
}

/// Last 8 characters of the order id, uppercased.
#[must_use]
pub fn invoice_number(order_id: &str) -> String {
    let chars: Vec<char> = order_id.chars().collect();
    let start = chars.len().saturating_sub(8);
    chars[start..].iter().collect::<String>().to_uppercase()
}

/// Formats an amount with two decimals, e.g. `Rs. 1250.00`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    format!("Rs. {amount:.2}")
}

fn pdf_error(err: impl std::fmt::Debug) -> Error {
    Error::Invoice {
        message: format!("{err:?}"),
    }
}

/// Greedy word wrap at `width` characters.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Draws onto the current page using top-left based millimetre coordinates.
struct Painter {
    layer: PdfLayerReference,
    fonts: Fonts,
}

impl Painter {
    fn text(&self, text: &str, size: f32, x: f32, y_from_top: f32, bold: bool) {
        let font = if bold {
            &self.fonts.bold
        } else {
            &self.fonts.regular
        };
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - y_from_top), font);
    }

    #[allow(clippy::cast_precision_loss)]
    fn text_right(&self, text: &str, size: f32, right: f32, y_from_top: f32, bold: bool) {
        let width = text.chars().count() as f32 * size * GLYPH_WIDTH * PT_TO_MM;
        self.text(text, size, (right - width).max(MARGIN), y_from_top, bold);
    }

    fn rule(&self, y_from_top: f32) {
        let y = Mm(PAGE_HEIGHT - y_from_top);
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), y), false),
                (Point::new(Mm(RIGHT_EDGE), y), false),
            ],
            is_closed: false,
        });
    }

    fn color(&self, r: f32, g: f32, b: f32) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn new_page(&mut self, doc: &PdfDocumentReference) {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Invoice");
        self.layer = doc.get_page(page).get_layer(layer);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{
        order::{self, PaymentMethod},
        order_item,
    };
    use chrono::{TimeZone, Utc};

    fn details(status: OrderStatus, lines: &[(&str, i32, f64)]) -> OrderDetails {
        let created = Utc.with_ymd_and_hms(2025, 3, 7, 12, 30, 0).unwrap();
        let id = "0f3c9a1b2d4e5f60718293a4b5c6d7e8".to_string();
        OrderDetails {
            order: order::Model {
                id: id.clone(),
                customer_name: "Test".to_string(),
                phone: "9999999999".to_string(),
                email: None,
                address: "X".to_string(),
                total_amount: 250.0,
                payment_method: PaymentMethod::Cash,
                status,
                created_at: created,
                updated_at: created,
            },
            items: lines
                .iter()
                .enumerate()
                .map(|(i, (name, quantity, price))| order_item::Model {
                    id: i64::try_from(i).unwrap() + 1,
                    order_id: id.clone(),
                    position: i32::try_from(i).unwrap(),
                    name: (*name).to_string(),
                    quantity: *quantity,
                    price: *price,
                })
                .collect(),
        }
    }

    #[test]
    fn test_invoice_totals() {
        let doc = InvoiceDocument::from_order(
            &details(OrderStatus::Pending, &[("A", 2, 100.0), ("B", 1, 50.0)]),
            &BusinessInfo::default(),
        );

        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[0].amount, 200.0);
        assert_eq!(doc.rows[1].serial, 2);
        assert_eq!(doc.subtotal, 250.0);
        assert_eq!(doc.tax, 0.0);
        assert_eq!(doc.grand_total, 250.0);
        assert_eq!(format_currency(doc.grand_total), "Rs. 250.00");
    }

    #[test]
    fn test_invoice_header_fields() {
        let doc = InvoiceDocument::from_order(
            &details(OrderStatus::Delivered, &[("A", 1, 10.0)]),
            &BusinessInfo::default(),
        );

        assert_eq!(doc.invoice_number, "B5C6D7E8");
        assert_eq!(doc.date, "07/03/2025");
        assert_eq!(doc.payment_method, "cash");
        assert_eq!(doc.status, "delivered");
        assert_eq!(doc.badge, Some(StatusBadge::Delivered));
        assert_eq!(doc.issuer.name, "Wellwichly Pvt. Ltd.");
    }

    #[test]
    fn test_badges() {
        assert_eq!(
            StatusBadge::for_status(OrderStatus::Confirmed).map(StatusBadge::label),
            Some("CONFIRMED")
        );
        assert!(StatusBadge::for_status(OrderStatus::Pending).is_none());
        assert!(StatusBadge::for_status(OrderStatus::Cancelled).is_none());
    }

    #[test]
    fn test_invoice_number_short_id() {
        assert_eq!(invoice_number("abc"), "ABC");
    }

    #[test]
    fn test_wrap_and_truncate() {
        assert_eq!(
            wrap("212/184, Swaraj Bhawan, Uttar Pradesh 211003, India", 25),
            vec!["212/184, Swaraj Bhawan,", "Uttar Pradesh 211003,", "India"]
        );
        assert!(wrap("   ", 10).is_empty());
        assert_eq!(truncate("Short", 10), "Short");
        assert_eq!(truncate("A very long item name", 10), "A very ...");
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_invoice_pdf(
            &details(OrderStatus::Confirmed, &[("A", 2, 100.0), ("B", 1, 50.0)]),
            &BusinessInfo::default(),
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_many_items_spills_onto_more_pages() {
        let lines: Vec<(&str, i32, f64)> = (0..80).map(|_| ("Club Sandwich", 1, 250.0)).collect();
        let bytes = render_invoice_pdf(
            &details(OrderStatus::Pending, &lines),
            &BusinessInfo::default(),
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
