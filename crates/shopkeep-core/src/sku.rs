//! SKU generation for new stock items.
//!
//! ```text
//!   category "Grocery"  ──► GRO
//!   name     "Basmati Rice" ──► BASM
//!   random              ──► 7QK2ZD
//!                           ─────────────
//!                           GROBASM7QK2ZD   (13 chars)
//!
//!   blank name or category ──► PROD-7QK2ZD
//! ```
//!
//! Only ASCII letters and digits survive from the name and category, so
//! every generated SKU passes [`crate::validation::validate_sku`].

use uuid::Uuid;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_LEN: usize = 6;
const MAX_SKU_LEN: usize = 13;

/// Generates a SKU from a product name and category.
///
/// ```rust
/// use shopkeep_core::sku::generate_sku;
///
/// let sku = generate_sku("Basmati Rice", "Grocery");
/// assert!(sku.starts_with("GROBASM"));
/// assert_eq!(sku.len(), 13);
///
/// assert!(generate_sku("", "Grocery").starts_with("PROD-"));
/// ```
pub fn generate_sku(name: &str, category: &str) -> String {
    generate_sku_with(name, category, &random_part())
}

/// Same as [`generate_sku`] with a caller-supplied random suffix.
pub fn generate_sku_with(name: &str, category: &str, random: &str) -> String {
    if name.trim().is_empty() || category.trim().is_empty() {
        return format!("PROD-{}", random);
    }

    let prefix = segment(category, 3);
    let name_part = segment(name, 4);

    let mut sku = format!("{}{}{}", prefix, name_part, random);
    sku.truncate(MAX_SKU_LEN);
    sku
}

fn segment(value: &str, len: usize) -> String {
    let mut out: String = value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(len)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while out.len() < len {
        out.push('X');
    }
    out
}

fn random_part() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(RANDOM_LEN);
    for _ in 0..RANDOM_LEN {
        out.push(ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}
