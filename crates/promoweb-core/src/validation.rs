//! # Validation Module
//!
//! Input validation for checkout, payments and the catalogue.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront (TypeScript)                                       │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                           │
//! │  ├── Type validation (serde deserialization)                            │
//! │  └── THIS MODULE: field rules                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (reserved between 0 and stock)                               │
//! │  ├── UNIQUE (sku, order_number, transaction_id, tracking_number)        │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use promoweb_core::validation::{validate_phone, validate_quantity};
//!
//! assert!(validate_phone("+237 670 00 00 00").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::Address;
use crate::{MAX_ITEM_QUANTITY, MAX_PARCEL_WEIGHT_GRAMS, MAX_PRICE_XAF, MAX_WEIGHT_GRAMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest single inbound stock delivery accepted by `restock`.
pub const MAX_RESTOCK_QUANTITY: i64 = 100_000;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Catalogue
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use promoweb_core::validation::validate_sku;
///
/// assert!(validate_sku("TV-SAM-55").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required("sku", sku)?;
    max_len("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1 to 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    max_len("name", name, 200)
}

fn within(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if !(0..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

/// Validates a unit price in XAF, `0..=MAX_PRICE_XAF`. Zero is allowed
/// (promotional items).
pub fn validate_price_xaf(xaf: i64) -> ValidationResult<()> {
    within("price", xaf, MAX_PRICE_XAF)
}

/// Validates a unit weight in grams, `0..=MAX_WEIGHT_GRAMS`. Zero is allowed
/// (vouchers, services).
pub fn validate_weight_grams(grams: i64) -> ValidationResult<()> {
    within("weight", grams, MAX_WEIGHT_GRAMS)
}

/// Validates the weight of a whole parcel, `0..=MAX_PARCEL_WEIGHT_GRAMS`.
pub fn validate_parcel_weight_grams(grams: i64) -> ValidationResult<()> {
    within("weightGrams", grams, MAX_PARCEL_WEIGHT_GRAMS)
}

/// Validates an inbound stock quantity.
pub fn validate_restock_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_RESTOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_RESTOCK_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Checkout
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the deposit percentage chosen at checkout (1 to 100).
pub fn validate_deposit_percentage(pct: i64) -> ValidationResult<()> {
    if !(1..=100).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "depositPercentage".to_string(),
            min: 1,
            max: 100,
        });
    }
    Ok(())
}

pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required("customerName", name)?;
    if name.trim().chars().count() < 2 {
        return Err(ValidationError::TooShort {
            field: "customerName".to_string(),
            min: 2,
        });
    }
    max_len("customerName", name, 100)
}

/// Light email check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("customerEmail", email)?;
    max_len("customerEmail", email, 254)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "customerEmail".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.contains(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}

/// Validates a Cameroonian phone number.
///
/// Accepts 9 national digits starting with 6 (mobile) or 2 (landline),
/// optionally prefixed by `+237` or `237`. Spaces, dots and dashes ignored.
///
/// ## Example
/// ```rust
/// use promoweb_core::validation::validate_phone;
///
/// assert!(validate_phone("670000000").is_ok());
/// assert!(validate_phone("+237 6 70 00 00 00").is_ok());
/// assert!(validate_phone("12345").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    required("phoneNumber", phone)?;

    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-'))
        .collect();
    let national = compact
        .strip_prefix("+237")
        .or_else(|| compact.strip_prefix("237").filter(|rest| rest.len() == 9))
        .unwrap_or(&compact);

    let valid = national.len() == 9
        && national.chars().all(|c| c.is_ascii_digit())
        && (national.starts_with('6') || national.starts_with('2'));

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "phoneNumber".to_string(),
            reason: "must be a Cameroonian number (+237 followed by 9 digits)".to_string(),
        });
    }
    Ok(())
}

/// Validates the last four digits of a card.
pub fn validate_card_last4(last4: &str) -> ValidationResult<()> {
    if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cardLast4".to_string(),
            reason: "must be exactly 4 digits".to_string(),
        });
    }
    Ok(())
}

/// Validates a structured address.
pub fn validate_address(address: &Address) -> ValidationResult<()> {
    required("streetAddress", &address.street_address)?;
    required("city", &address.city)?;
    max_len("city", &address.city, 100)?;
    if let Some(region) = &address.region {
        max_len("region", region, 100)?;
    }
    if address.country.len() != 2 || !address.country.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "country".to_string(),
            reason: "must be an ISO 3166-1 alpha-2 code".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Identifiers
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use promoweb_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("TV-SAM-55").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_deposit_percentage() {
        assert!(validate_deposit_percentage(1).is_ok());
        assert!(validate_deposit_percentage(30).is_ok());
        assert!(validate_deposit_percentage(100).is_ok());
        assert!(validate_deposit_percentage(0).is_err());
        assert!(validate_deposit_percentage(101).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("client@promoweb.cm").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@@b.cm").is_err());
        assert!(validate_email("a b@c.cm").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("670000000").is_ok());
        assert!(validate_phone("+237670000000").is_ok());
        assert!(validate_phone("237 699 12 34 56").is_ok());
        assert!(validate_phone("222-23-45-67").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("570000000").is_err());
        assert!(validate_phone("+2376700000001").is_err());
        assert!(validate_phone("67000000a").is_err());
    }

    #[test]
    fn test_validate_card_last4() {
        assert!(validate_card_last4("4242").is_ok());
        assert!(validate_card_last4("424").is_err());
        assert!(validate_card_last4("42a2").is_err());
    }

    #[test]
    fn test_validate_address() {
        let mut address = Address {
            street_address: "Rue de la Joie".to_string(),
            city: "Douala".to_string(),
            region: Some("Littoral".to_string()),
            postal_code: None,
            country: "CM".to_string(),
        };
        assert!(validate_address(&address).is_ok());

        address.country = "cmr".to_string();
        assert!(validate_address(&address).is_err());

        address.country = "CM".to_string();
        address.city = " ".to_string();
        assert!(validate_address(&address).is_err());
    }

    #[test]
    fn test_price_and_weight_bounds() {
        assert!(validate_price_xaf(0).is_ok());
        assert!(validate_price_xaf(MAX_PRICE_XAF).is_ok());
        assert!(validate_price_xaf(MAX_PRICE_XAF + 1).is_err());
        assert!(validate_price_xaf(i64::MAX / 2 + 1).is_err());
        assert!(validate_price_xaf(-1).is_err());

        assert!(validate_weight_grams(MAX_WEIGHT_GRAMS).is_ok());
        assert!(validate_weight_grams(MAX_WEIGHT_GRAMS + 1).is_err());

        assert!(validate_parcel_weight_grams(MAX_PARCEL_WEIGHT_GRAMS).is_ok());
        assert!(validate_parcel_weight_grams(i64::MAX).is_err());
        assert!(validate_parcel_weight_grams(-1).is_err());
    }

    #[test]
    fn test_validate_restock_quantity() {
        assert!(validate_restock_quantity(50).is_ok());
        assert!(validate_restock_quantity(0).is_err());
        assert!(validate_restock_quantity(MAX_RESTOCK_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
