//! Plain-text invoice rendering.
//!
//! Produces a fixed-width bill that prints cleanly on any printer or
//! renders in a `<pre>` block:
//!
//! ```text
//! Sharma General Store
//! 12 MG Road, Pune
//! Phone: 98765 43210
//! GSTIN: 27ABCDE1234F1Z5
//! ==============================================================
//! INVOICE #42                                 Date: 2024-03-02
//! --------------------------------------------------------------
//! Bill To: Asha Patel
//! ...
//! Item                            Qty         Rate       Amount
//! Basmati Rice 5kg                  2       525.00      1050.00
//! --------------------------------------------------------------
//!                                   Grand Total:      ₹1102.50
//! ```

use std::fmt::Write;

use crate::money::Money;
use crate::types::{Customer, SaleDetail, ShopSettings};

const WIDTH: usize = 62;
const ITEM_COL: usize = 30;

/// Renders a sale as a printable text invoice.
///
/// `customer` fills the billed-to address and phone. When it is `None`
/// (walk-in, or the customer has since been deleted) only the name
/// snapshotted on the sale is printed.
pub fn render_invoice(
    settings: &ShopSettings,
    detail: &SaleDetail,
    customer: Option<&Customer>,
) -> String {
    let sale = &detail.sale;
    let symbol = settings.currency_symbol.as_str();
    let mut out = String::new();

    // Header
    let _ = writeln!(out, "{}", settings.shop_name);
    if !settings.address.is_empty() {
        let _ = writeln!(out, "{}", settings.address);
    }
    if !settings.phone.is_empty() {
        let _ = writeln!(out, "Phone: {}", settings.phone);
    }
    if !settings.gstin.is_empty() {
        let _ = writeln!(out, "GSTIN: {}", settings.gstin);
    }
    rule(&mut out, '=');

    let left = format!("INVOICE #{}", sale.invoice_number);
    let right = format!("Date: {}", sale.created_at.format("%Y-%m-%d"));
    let _ = writeln!(out, "{}{:>width$}", left, right, width = WIDTH - left.chars().count());
    rule(&mut out, '-');

    // Billed to
    let _ = writeln!(out, "Bill To: {}", sale.customer_name);
    if let Some(customer) = customer {
        if !customer.address.is_empty() {
            let _ = writeln!(out, "         {}", customer.address);
        }
        if !customer.phone.is_empty() {
            let _ = writeln!(out, "         {}", customer.phone);
        }
    }
    rule(&mut out, '-');

    // Items
    let _ = writeln!(
        out,
        "{:<w$}{:>6}{:>13}{:>13}",
        "Item",
        "Qty",
        "Rate",
        "Amount",
        w = ITEM_COL
    );
    for item in &detail.items {
        let _ = writeln!(
            out,
            "{:<w$}{:>6}{:>13}{:>13}",
            fit(&item.name, ITEM_COL - 1),
            item.quantity,
            item.sale_price().to_string(),
            item.line_total().to_string(),
            w = ITEM_COL
        );
    }
    rule(&mut out, '-');

    // Totals
    total_line(&mut out, "Subtotal", &sale.subtotal().format_with_symbol(symbol));
    total_line(
        &mut out,
        "Discount",
        &format!("-{}", sale.discount().format_with_symbol(symbol)),
    );
    total_line(
        &mut out,
        "Taxable Value",
        &sale.taxable_amount().format_with_symbol(symbol),
    );
    total_line(
        &mut out,
        &format!("GST ({})", sale.tax_rate()),
        &format!("+{}", sale.tax().format_with_symbol(symbol)),
    );
    total_line(&mut out, "Grand Total", &sale.grand_total().format_with_symbol(symbol));
    total_line(
        &mut out,
        &format!("Amount Paid ({})", sale.payment_mode.label()),
        &sale.amount_paid().format_with_symbol(symbol),
    );
    if sale.change_cents > 0 {
        total_line(
            &mut out,
            "Change Returned",
            &sale.change().format_with_symbol(symbol),
        );
    }
    total_line(&mut out, "Amount Due", &sale.due().format_with_symbol(symbol));

    if !detail.payments.is_empty() {
        rule(&mut out, '-');
        let _ = writeln!(out, "Payments received after sale:");
        for payment in &detail.payments {
            let _ = writeln!(
                out,
                "  {}  {:<6}{:>width$}",
                payment.created_at.format("%Y-%m-%d"),
                payment.payment_mode.label(),
                Money::from_cents(payment.amount_cents).format_with_symbol(symbol),
                width = WIDTH - 20
            );
        }
    }

    rule(&mut out, '=');
    centered(&mut out, "Thank you for your business!");
    centered(&mut out, "This is a computer-generated invoice.");

    out
}

fn rule(out: &mut String, c: char) {
    let _ = writeln!(out, "{}", c.to_string().repeat(WIDTH));
}

fn total_line(out: &mut String, label: &str, value: &str) {
    let label = format!("{}:", label);
    let _ = writeln!(out, "{:>44}{:>18}", label, value);
}

fn centered(out: &mut String, text: &str) {
    let pad = WIDTH.saturating_sub(text.chars().count()) / 2;
    let _ = writeln!(out, "{}{}", " ".repeat(pad), text);
}

/// Truncates to `max` characters, marking the cut with `~`.
fn fit(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('~');
    cut
}
