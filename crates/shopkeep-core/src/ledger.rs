//! # Ledger
//!
//! The pure half of the sale engine: building a cart, pricing it, and the
//! rules for paying off dues. `shopkeep-db` runs these inside a transaction
//! and writes the results.
//!
//! ## Sale Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal     = Σ sale_price × qty                                     │
//! │  taxable      = subtotal − discount          (0 ≤ discount ≤ subtotal) │
//! │  tax          = taxable × rate               (half-up, integer)        │
//! │  grand_total  = taxable + tax                                          │
//! │                                                                         │
//! │  tendered     = amount_paid or grand_total                             │
//! │  amount_paid  = min(tendered, grand_total)                             │
//! │  due          = grand_total − amount_paid                              │
//! │  change       = max(tendered − grand_total, 0)                         │
//! │                                                                         │
//! │  profit       = Σ (sale_price − cost_price) × qty                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Profit is the margin on the lines at their listed prices; a sale-level
//! discount lowers what the customer pays, not the recorded profit. All
//! arithmetic is checked and fails with [`CoreError::AmountOverflow`].
//!
//! ## Due Payments
//! ```text
//!   sale.due = 300, customer.due = 450
//!        │
//!        ▼  pay 200
//!   0 < 200 ≤ 300 ✓
//!        │
//!        ▼
//!   sale.due = 100, sale.amount_paid += 200, customer.due = 250
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::types::{Sale, StockItem};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart
// =============================================================================

/// A stock item frozen at the moment it was added, plus a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub stock_item_id: String,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    pub fn from_stock_item(item: &StockItem, quantity: i64) -> Self {
        CartLine {
            stock_item_id: item.id.clone(),
            sku: item.sku.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            cost_price_cents: item.cost_price_cents,
            sale_price_cents: item.sale_price_cents,
            quantity,
        }
    }

    /// `sale_price × quantity`.
    pub fn line_total(&self) -> CoreResult<Money> {
        Money::from_cents(self.sale_price_cents)
            .checked_mul(self.quantity)
            .ok_or_else(|| overflow("line total"))
    }

    pub fn line_cost(&self) -> CoreResult<Money> {
        Money::from_cents(self.cost_price_cents)
            .checked_mul(self.quantity)
            .ok_or_else(|| overflow("line cost"))
    }

    /// Margin on this line at its listed price.
    pub fn margin(&self) -> CoreResult<Money> {
        self.line_total()?
            .checked_sub(self.line_cost()?)
            .ok_or_else(|| overflow("margin"))
    }
}

fn overflow(what: &str) -> CoreError {
    CoreError::AmountOverflow {
        what: what.to_string(),
    }
}

/// Checked sum of fallible amounts.
fn checked_sum<I>(amounts: I, what: &str) -> CoreResult<Money>
where
    I: IntoIterator<Item = CoreResult<Money>>,
{
    amounts.into_iter().try_fold(Money::zero(), |acc, amount| {
        acc.checked_add(amount?).ok_or_else(|| overflow(what))
    })
}

/// Lines of a sale being built.
///
/// ## Invariants
/// - Lines are unique by `stock_item_id` (adding again sums the quantity)
/// - Every quantity is between 1 and [`MAX_LINE_QUANTITY`]
/// - No line asks for more than the stock on hand when it was added
/// - At most [`MAX_CART_LINES`] lines
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `quantity` units of a stock item.
    ///
    /// ## Errors
    /// - `Validation` when quantity is zero or negative
    /// - `QuantityTooLarge` when the line would exceed [`MAX_LINE_QUANTITY`]
    /// - `InsufficientStock` when the line would exceed `item.stock`
    /// - `CartTooLarge` when a new line would exceed [`MAX_CART_LINES`]
    pub fn add(&mut self, item: &StockItem, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let existing = self
            .lines
            .iter()
            .position(|line| line.stock_item_id == item.id);

        let requested = quantity + existing.map_or(0, |i| self.lines[i].quantity);

        if requested > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_LINE_QUANTITY,
            });
        }

        if requested > item.stock {
            return Err(CoreError::InsufficientStock {
                sku: item.sku.clone(),
                available: item.stock,
                requested,
            });
        }

        match existing {
            Some(i) => self.lines[i].quantity = requested,
            None => {
                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_LINES,
                    });
                }
                self.lines.push(CartLine::from_stock_item(item, quantity));
            }
        }

        Ok(())
    }

    /// Removes a line. Returns false if the item was not in the cart.
    pub fn remove(&mut self, stock_item_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.stock_item_id != stock_item_id);
        self.lines.len() != before
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn subtotal(&self) -> CoreResult<Money> {
        checked_sum(self.lines.iter().map(CartLine::line_total), "subtotal")
    }

    /// Prices the cart under the given terms.
    pub fn quote(&self, terms: &SaleTerms) -> CoreResult<SaleQuote> {
        quote(self, terms)
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Sale-level inputs chosen at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleTerms {
    pub discount_cents: i64,
    pub tax_rate_bps: u32,
    /// Cash tendered. `None` means paid in full.
    pub amount_paid_cents: Option<i64>,
}

/// Every total of a sale, computed before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleQuote {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable: Money,
    pub tax_rate: TaxRate,
    pub tax: Money,
    pub grand_total: Money,
    /// Amount credited to the sale, never more than the grand total.
    pub amount_paid: Money,
    pub due: Money,
    pub change: Money,
    pub profit: Money,
}

/// Prices a cart.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use shopkeep_core::ledger::{quote, Cart, SaleTerms};
/// use shopkeep_core::StockItem;
///
/// let item = StockItem {
///     id: "item-1".into(),
///     shop_id: "shop-1".into(),
///     sku: "TEA-250".into(),
///     name: "Tea 250g".into(),
///     category: None,
///     cost_price_cents: 8_000,
///     sale_price_cents: 10_000,
///     stock: 10,
///     reorder_level: 2,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let mut cart = Cart::new();
/// cart.add(&item, 2).unwrap();
///
/// let terms = SaleTerms { discount_cents: 0, tax_rate_bps: 500, amount_paid_cents: Some(15_000) };
/// let q = quote(&cart, &terms).unwrap();
///
/// assert_eq!(q.grand_total.cents(), 21_000);
/// assert_eq!(q.due.cents(), 6_000);
/// assert_eq!(q.profit.cents(), 4_000);
/// ```
pub fn quote(cart: &Cart, terms: &SaleTerms) -> CoreResult<SaleQuote> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if terms.discount_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount".to_string(),
        }
        .into());
    }

    if terms.tax_rate_bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 10_000,
        }
        .into());
    }

    let subtotal = cart.subtotal()?;
    let discount = Money::from_cents(terms.discount_cents);

    if discount > subtotal {
        return Err(CoreError::DiscountExceedsSubtotal {
            discount_cents: discount.cents(),
            subtotal_cents: subtotal.cents(),
        });
    }

    let taxable = subtotal - discount;
    let tax_rate = TaxRate::from_bps(terms.tax_rate_bps);
    let tax = taxable.calculate_tax(tax_rate);
    let grand_total = taxable
        .checked_add(tax)
        .ok_or_else(|| overflow("grand total"))?;

    let tendered = match terms.amount_paid_cents {
        Some(cents) if cents < 0 => {
            return Err(ValidationError::MustNotBeNegative {
                field: "amountPaid".to_string(),
            }
            .into())
        }
        Some(cents) => Money::from_cents(cents),
        None => grand_total,
    };

    let amount_paid = tendered.min(grand_total);
    let due = grand_total - amount_paid;
    let change = (tendered - grand_total).clamp_non_negative();

    let profit = checked_sum(cart.lines().iter().map(CartLine::margin), "profit")?;

    Ok(SaleQuote {
        subtotal,
        discount,
        taxable,
        tax_rate,
        tax,
        grand_total,
        amount_paid,
        due,
        change,
        profit,
    })
}

// =============================================================================
// Due Payments
// =============================================================================

/// Checks a payment against a sale's outstanding due: `0 < amount ≤ due`.
pub fn validate_due_payment(sale_due: Money, amount: Money) -> CoreResult<()> {
    if !amount.is_positive() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }

    if amount > sale_due {
        return Err(CoreError::InvalidPaymentAmount {
            reason: format!("amount {} exceeds outstanding due {}", amount, sale_due),
        });
    }

    Ok(())
}

/// Moves `amount` from the sale's due into its amount paid.
pub fn apply_due_payment(sale: &mut Sale, amount: Money) -> CoreResult<()> {
    validate_due_payment(sale.due(), amount)?;
    sale.due_cents -= amount.cents();
    sale.amount_paid_cents += amount.cents();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Customer, PaymentMode};
    use chrono::Utc;

    fn item(id: &str, cost: i64, price: i64, stock: i64) -> StockItem {
        StockItem {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Item {}", id),
            category: None,
            cost_price_cents: cost,
            sale_price_cents: price,
            stock,
            reorder_level: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn terms(discount: i64, bps: u32, paid: Option<i64>) -> SaleTerms {
        SaleTerms {
            discount_cents: discount,
            tax_rate_bps: bps,
            amount_paid_cents: paid,
        }
    }

    fn sale_with_due(grand: i64, paid: i64) -> Sale {
        Sale {
            id: "sale-1".to_string(),
            shop_id: "shop-1".to_string(),
            invoice_number: 1,
            customer_id: Some("c1".to_string()),
            customer_name: "Asha".to_string(),
            subtotal_cents: grand,
            discount_cents: 0,
            tax_rate_bps: 0,
            tax_cents: 0,
            grand_total_cents: grand,
            amount_paid_cents: paid,
            due_cents: grand - paid,
            change_cents: 0,
            profit_cents: 0,
            payment_mode: PaymentMode::Cash,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_merges_same_item() {
        let rice = item("rice", 4_000, 5_000, 10);
        let mut cart = Cart::new();
        cart.add(&rice, 2).unwrap();
        cart.add(&rice, 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.subtotal().unwrap().cents(), 25_000);
    }

    #[test]
    fn test_add_rejects_more_than_stock() {
        let rice = item("rice", 4_000, 5_000, 3);
        let mut cart = Cart::new();
        cart.add(&rice, 2).unwrap();

        let err = cart.add(&rice, 2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let rice = item("rice", 4_000, 5_000, 3);
        let mut cart = Cart::new();
        assert!(matches!(cart.add(&rice, 0), Err(CoreError::Validation(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            cart.add(&item(&i.to_string(), 1, 2, 5), 1).unwrap();
        }
        let err = cart.add(&item("one-too-many", 1, 2, 5), 1).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::new();
        cart.add(&item("a", 1, 2, 5), 1).unwrap();
        assert!(cart.remove("a"));
        assert!(!cart.remove("a"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quote_paid_in_full_by_default() {
        let mut cart = Cart::new();
        cart.add(&item("a", 6_000, 10_000, 5), 3).unwrap();

        let q = quote(&cart, &terms(0, 500, None)).unwrap();
        assert_eq!(q.subtotal.cents(), 30_000);
        assert_eq!(q.tax.cents(), 1_500);
        assert_eq!(q.grand_total.cents(), 31_500);
        assert_eq!(q.amount_paid, q.grand_total);
        assert!(q.due.is_zero());
        assert!(q.change.is_zero());
        assert_eq!(q.profit.cents(), 12_000);
    }

    #[test]
    fn test_quote_discount_is_taxed_after_and_leaves_profit_alone() {
        let mut cart = Cart::new();
        cart.add(&item("a", 6_000, 10_000, 5), 2).unwrap();

        let q = quote(&cart, &terms(2_000, 1_800, Some(0))).unwrap();
        assert_eq!(q.taxable.cents(), 18_000);
        assert_eq!(q.tax.cents(), 3_240);
        assert_eq!(q.grand_total.cents(), 21_240);
        assert!(q.amount_paid.is_zero());
        assert_eq!(q.due.cents(), 21_240);
        // (10_000 − 6_000) × 2, the discount is not taken off
        assert_eq!(q.profit.cents(), 8_000);
    }

    #[test]
    fn test_quote_overpayment_gives_change() {
        let mut cart = Cart::new();
        cart.add(&item("a", 50, 95, 5), 1).unwrap();

        let q = quote(&cart, &terms(0, 0, Some(100))).unwrap();
        assert_eq!(q.amount_paid.cents(), 95);
        assert_eq!(q.change.cents(), 5);
        assert!(q.due.is_zero());
    }

    #[test]
    fn test_quote_rejects_bad_terms() {
        let mut cart = Cart::new();
        assert!(matches!(
            quote(&cart, &terms(0, 500, None)),
            Err(CoreError::EmptyCart)
        ));

        cart.add(&item("a", 50, 100, 5), 1).unwrap();
        assert!(matches!(
            quote(&cart, &terms(101, 500, None)),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));
        assert!(quote(&cart, &terms(-1, 500, None)).is_err());
        assert!(quote(&cart, &terms(0, 500, Some(-1))).is_err());
        assert!(quote(&cart, &terms(0, 10_001, None)).is_err());

        // Full discount is allowed
        let q = quote(&cart, &terms(100, 500, None)).unwrap();
        assert!(q.grand_total.is_zero());
        assert_eq!(q.profit.cents(), 50);
    }

    #[test]
    fn test_quote_reports_overflow_instead_of_panicking() {
        let mut cart = Cart::new();
        cart.add(&item("gold", 0, 5_000_000_000_000_000_000, 10), 2)
            .unwrap();

        let err = quote(&cart, &terms(0, 0, None)).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
        assert!(cart.subtotal().is_err());

        // Each line fits, the subtotal does not
        let mut cart = Cart::new();
        cart.add(&item("a", 0, i64::MAX / 2 + 1, 1), 1).unwrap();
        cart.add(&item("b", 0, i64::MAX / 2 + 1, 1), 1).unwrap();
        assert!(matches!(
            quote(&cart, &terms(0, 0, None)),
            Err(CoreError::AmountOverflow { .. })
        ));

        // Tax pushes the grand total over
        let mut cart = Cart::new();
        cart.add(&item("c", 0, i64::MAX - 10, 1), 1).unwrap();
        assert!(matches!(
            quote(&cart, &terms(0, 1_000, None)),
            Err(CoreError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_due_payment_bounds() {
        let due = Money::from_cents(300);
        assert!(validate_due_payment(due, Money::from_cents(300)).is_ok());
        assert!(validate_due_payment(due, Money::zero()).is_err());
        assert!(validate_due_payment(due, Money::from_cents(-10)).is_err());
        assert!(validate_due_payment(due, Money::from_cents(301)).is_err());
    }

    #[test]
    fn test_apply_due_payment_keeps_balances_in_step() {
        let mut sale = sale_with_due(1_000, 400);
        let mut customer = Customer {
            id: "c1".to_string(),
            shop_id: "shop-1".to_string(),
            name: "Asha".to_string(),
            phone: String::new(),
            address: String::new(),
            due_cents: 600,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let payment = Money::from_cents(250);
        apply_due_payment(&mut sale, payment).unwrap();
        customer.apply_payment(payment);

        assert_eq!(sale.due_cents, 350);
        assert_eq!(sale.amount_paid_cents, 650);
        assert_eq!(customer.due_cents, sale.due_cents);

        assert!(apply_due_payment(&mut sale, Money::from_cents(351)).is_err());
        assert_eq!(sale.due_cents, 350);
    }
}
