//! # Validation Module
//!
//! Input validation for Tally requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (form validation)                                   │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: JSON deserialization (serde)                                 │
//! │  └── Every field Optional: a missing field is a rule failure,          │
//! │      not a parse failure, so ALL bad items can be reported             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  └── *Input ──validate──► typed line (LineItem, RefundLine, ...)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;

use crate::error::{CoreError, CoreResult, ItemError, ValidationError};
use crate::money::{self, Money};
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_LINE_ITEMS, MAX_PROOF_IMAGES};

/// Result type for single-field validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Request Inputs
// =============================================================================

/// A sale line as submitted by the client.
///
/// Field names follow the front end's wire format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItemInput {
    #[serde(default, alias = "productId")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, rename = "unitPrice", with = "money::decimal::option")]
    pub unit_price: Option<Money>,
    #[serde(default, rename = "totalPrice", with = "money::decimal::option")]
    pub total_price: Option<Money>,
    /// Product name shown on the receipt.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "productCategory")]
    pub product_category: Option<String>,
}

/// A refund line as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundLineInput {
    #[serde(default, rename = "transactionItemId")]
    pub transaction_item_id: Option<String>,
    #[serde(default, alias = "productId")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, rename = "totalPrice", with = "money::decimal::option")]
    pub total_price: Option<Money>,
    #[serde(default, rename = "productName", alias = "description")]
    pub product_name: Option<String>,
    #[serde(default, rename = "productCategory")]
    pub product_category: Option<String>,
}

/// A replacement line as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplaceLineInput {
    #[serde(default, rename = "transactionItemId")]
    pub transaction_item_id: Option<String>,
    #[serde(default, alias = "productId")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, rename = "productName", alias = "description")]
    pub product_name: Option<String>,
    #[serde(default, rename = "productCategory")]
    pub product_category: Option<String>,
}

/// An RMA item as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RmaItemInput {
    #[serde(default, alias = "product_id")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, alias = "images")]
    pub proof_of_images: Vec<String>,
}

// =============================================================================
// Validated Lines
// =============================================================================

/// A validated sale line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub description: String,
    pub product_category: Option<String>,
}

/// A validated refund line, not yet matched to a transaction item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundLine {
    pub transaction_item_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    pub total_price: Money,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

/// A validated replacement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceLine {
    pub transaction_item_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

/// A validated RMA item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmaLine {
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub reason: Option<String>,
    pub proof_of_images: Vec<String>,
}

// =============================================================================
// Line Validators
// =============================================================================

/// Validates every sale line, collecting ALL offending items.
///
/// ## Rules (per item)
/// - `product_id` present and non-blank
/// - `quantity` present, 1..=MAX_ITEM_QUANTITY
/// - `unitPrice` and `totalPrice` present and not negative
/// - `description` present and non-blank
///
/// ## Example
/// ```rust
/// use tally_core::validation::{validate_line_items, LineItemInput};
/// use tally_core::{CoreError, Money};
///
/// let good = LineItemInput {
///     product_id: Some("P1".into()),
///     quantity: Some(5),
///     unit_price: Some(Money::from_cents(1000)),
///     total_price: Some(Money::from_cents(5000)),
///     description: Some("Pen".into()),
///     product_category: None,
/// };
/// let bad = LineItemInput { quantity: None, ..good.clone() };
///
/// assert_eq!(validate_line_items(&[good.clone()]).unwrap().len(), 1);
/// match validate_line_items(&[good, bad]) {
///     Err(CoreError::InvalidItems(errors)) => assert_eq!(errors[0].index, 1),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn validate_line_items(inputs: &[LineItemInput]) -> CoreResult<Vec<LineItem>> {
    validate_list_size(inputs.len())?;

    collect_lines(inputs, |input, problems| {
        let product_id = required_text(&input.product_id, "product_id", problems);
        let quantity = check_quantity(input.quantity, problems);
        let unit_price = check_amount(input.unit_price, "unitPrice", problems);
        let total_price = check_amount(input.total_price, "totalPrice", problems);
        let description = required_text(&input.description, "description", problems);

        Some(LineItem {
            product_id: product_id?,
            quantity: quantity?,
            unit_price: unit_price?,
            total_price: total_price?,
            description: description?,
            product_category: optional_text(&input.product_category),
        })
    })
}

/// Validates refund lines.
///
/// ## Rules (per item)
/// - `product_id` present
/// - `quantity` present, 1..=MAX_ITEM_QUANTITY
/// - `totalPrice` present and not negative
pub fn validate_refund_lines(inputs: &[RefundLineInput]) -> CoreResult<Vec<RefundLine>> {
    validate_list_size(inputs.len())?;

    collect_lines(inputs, |input, problems| {
        let product_id = required_text(&input.product_id, "product_id", problems);
        let quantity = check_quantity(input.quantity, problems);
        let total_price = check_amount(input.total_price, "totalPrice", problems);

        Some(RefundLine {
            transaction_item_id: optional_text(&input.transaction_item_id),
            product_id: product_id?,
            quantity: quantity?,
            total_price: total_price?,
            product_name: optional_text(&input.product_name),
            product_category: optional_text(&input.product_category),
        })
    })
}

/// Validates replacement lines.
pub fn validate_replace_lines(inputs: &[ReplaceLineInput]) -> CoreResult<Vec<ReplaceLine>> {
    validate_list_size(inputs.len())?;

    collect_lines(inputs, |input, problems| {
        let product_id = required_text(&input.product_id, "product_id", problems);
        let quantity = check_quantity(input.quantity, problems);

        Some(ReplaceLine {
            transaction_item_id: optional_text(&input.transaction_item_id),
            product_id: product_id?,
            quantity: quantity?,
            product_name: optional_text(&input.product_name),
            product_category: optional_text(&input.product_category),
        })
    })
}

/// Validates RMA items, reporting every bad item by position.
///
/// ## Rules (per item)
/// - `product_id` present
/// - `quantity` present, 1..=MAX_ITEM_QUANTITY
/// - at most MAX_PROOF_IMAGES images, none blank
pub fn validate_rma_items(inputs: &[RmaItemInput]) -> CoreResult<Vec<RmaLine>> {
    validate_list_size(inputs.len())?;

    collect_lines(inputs, |input, problems| {
        let product_id = required_text(&input.product_id, "product_id", problems);
        let quantity = check_quantity(input.quantity, problems);
        if let Err(e) = validate_proof_images(&input.proof_of_images) {
            problems.push(e.to_string());
        }

        Some(RmaLine {
            product_id: product_id?,
            product_name: optional_text(&input.product_name),
            quantity: quantity?,
            reason: optional_text(&input.reason),
            proof_of_images: input.proof_of_images.clone(),
        })
    })
}

/// Validates a proof-of-image list.
pub fn validate_proof_images(images: &[String]) -> ValidationResult<()> {
    if images.len() > MAX_PROOF_IMAGES {
        return Err(ValidationError::TooMany {
            field: "images".to_string(),
            max: MAX_PROOF_IMAGES,
        });
    }
    if images.iter().any(|image| image.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "images[]".to_string(),
        });
    }
    Ok(())
}

fn validate_list_size(len: usize) -> CoreResult<()> {
    if len == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    if len > MAX_LINE_ITEMS {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_LINE_ITEMS,
        }
        .into());
    }
    Ok(())
}

/// Runs `check` over every input; succeeds only when no input had problems.
fn collect_lines<I, T>(
    inputs: &[I],
    check: impl Fn(&I, &mut Vec<String>) -> Option<T>,
) -> CoreResult<Vec<T>> {
    let mut lines = Vec::with_capacity(inputs.len());
    let mut errors = Vec::new();

    for (index, input) in inputs.iter().enumerate() {
        let mut problems = Vec::new();
        match check(input, &mut problems) {
            Some(line) if problems.is_empty() => lines.push(line),
            _ => errors.push(ItemError::new(index, problems)),
        }
    }

    if errors.is_empty() {
        Ok(lines)
    } else {
        Err(CoreError::InvalidItems(errors))
    }
}

fn required_text(value: &Option<String>, field: &str, problems: &mut Vec<String>) -> Option<String> {
    match optional_text(value) {
        Some(text) => Some(text),
        None => {
            problems.push(format!("{field} is required"));
            None
        }
    }
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn check_quantity(value: Option<i64>, problems: &mut Vec<String>) -> Option<i64> {
    let Some(qty) = value else {
        problems.push("quantity is required".to_string());
        return None;
    };
    match validate_quantity(qty) {
        Ok(()) => Some(qty),
        Err(e) => {
            problems.push(e.to_string());
            None
        }
    }
}

fn check_amount(value: Option<Money>, field: &str, problems: &mut Vec<String>) -> Option<Money> {
    match value {
        None => {
            problems.push(format!("{field} is required"));
            None
        }
        Some(amount) => match validate_amount(field, amount) {
            Ok(()) => Some(amount),
            Err(e) => {
                problems.push(e.to_string());
                None
            }
        },
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
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

/// Validates an official receipt number and returns it trimmed.
pub fn validate_or_number(or_number: Option<&str>) -> ValidationResult<String> {
    let value = or_number.map(str::trim).unwrap_or_default();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: "orNumber".to_string(),
        });
    }

    if value.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "orNumber".to_string(),
            max: 50,
        });
    }

    Ok(value.to_string())
}

/// Validates an operator-chosen product key.
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_product_id;
///
/// assert!(validate_product_id("P1").is_ok());
/// assert!(validate_product_id("").is_err());
/// assert!(validate_product_id("P 1").is_err());
/// ```
pub fn validate_product_id(product_id: &str) -> ValidationResult<()> {
    let product_id = product_id.trim();

    if product_id.is_empty() {
        return Err(ValidationError::Required {
            field: "productId".to_string(),
        });
    }

    if product_id.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "productId".to_string(),
            max: 50,
        });
    }

    if !product_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "productId".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, supplier, person).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates stock counts for a product record.
///
/// ## Rules
/// - min and max are never negative
/// - current is never negative unless the product allows backorders
/// - when max is set (> 0), min must not exceed it
pub fn validate_stock_levels(
    current: i64,
    min: i64,
    max: i64,
    allow_negative: bool,
) -> ValidationResult<()> {
    if current < 0 && !allow_negative {
        return Err(ValidationError::MustNotBeNegative {
            field: "currentStock".to_string(),
        });
    }
    if min < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "minStock".to_string(),
        });
    }
    if max < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "maxStock".to_string(),
        });
    }
    if max > 0 && min > max {
        return Err(ValidationError::OutOfRange {
            field: "minStock".to_string(),
            min: 0,
            max,
        });
    }
    Ok(())
}

/// Validates a price or total: not negative and at most `MAX_AMOUNT_CENTS`.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    validate_signed_amount(field, amount)
}

/// Validates an amount that may be negative, such as profit.
pub fn validate_signed_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.cents().unsigned_abs() > MAX_AMOUNT_CENTS.unsigned_abs() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -MAX_AMOUNT_CENTS / 100,
            max: MAX_AMOUNT_CENTS / 100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pen(quantity: i64) -> LineItemInput {
        LineItemInput {
            product_id: Some("P1".into()),
            quantity: Some(quantity),
            unit_price: Some(Money::from_cents(1000)),
            total_price: Some(Money::from_cents(1000 * quantity)),
            description: Some("Pen".into()),
            product_category: Some("Office".into()),
        }
    }

    #[test]
    fn test_valid_line_items() {
        let lines = validate_line_items(&[pen(5), pen(1)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].total_price.cents(), 5000);
        assert_eq!(lines[0].product_category.as_deref(), Some("Office"));
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = validate_line_items(&[]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_every_bad_item_is_reported() {
        let missing_price = LineItemInput {
            unit_price: None,
            ..pen(1)
        };
        let blank_description = LineItemInput {
            description: Some("   ".into()),
            quantity: Some(0),
            ..pen(1)
        };

        let err = validate_line_items(&[missing_price, pen(2), blank_description]).unwrap_err();
        let CoreError::InvalidItems(errors) = err else {
            panic!("expected InvalidItems");
        };

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].index, 0);
        assert_eq!(errors[0].problems, vec!["unitPrice is required"]);
        assert_eq!(errors[1].index, 2);
        assert_eq!(errors[1].problems.len(), 2);
    }

    #[test]
    fn test_line_item_input_wire_names() {
        let input: LineItemInput = serde_json::from_str(
            r#"{"product_id":"P1","quantity":5,"unitPrice":10,"totalPrice":"50","description":"Pen"}"#,
        )
        .unwrap();
        let lines = validate_line_items(&[input]).unwrap();
        assert_eq!(lines[0].unit_price.cents(), 1000);
        assert_eq!(lines[0].total_price.cents(), 5000);
    }

    #[test]
    fn test_refund_lines() {
        let input: RefundLineInput =
            serde_json::from_str(r#"{"product_id":"P1","quantity":2,"totalPrice":20}"#).unwrap();
        let lines = validate_refund_lines(&[input]).unwrap();
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].transaction_item_id, None);

        let err = validate_refund_lines(&[RefundLineInput::default()]).unwrap_err();
        let CoreError::InvalidItems(errors) = err else {
            panic!("expected InvalidItems");
        };
        assert_eq!(errors[0].problems.len(), 3);
    }

    #[test]
    fn test_replace_lines() {
        let input = ReplaceLineInput {
            product_id: Some("P1".into()),
            quantity: Some(1),
            ..Default::default()
        };
        assert_eq!(validate_replace_lines(&[input]).unwrap().len(), 1);
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_or_number() {
        assert_eq!(validate_or_number(Some(" OR1 ")).unwrap(), "OR1");
        assert!(validate_or_number(None).is_err());
        assert!(validate_or_number(Some("")).is_err());
        assert!(validate_or_number(Some(&"9".repeat(51))).is_err());
    }

    #[test]
    fn test_validate_stock_levels() {
        assert!(validate_stock_levels(10, 2, 50, false).is_ok());
        assert!(validate_stock_levels(-1, 0, 0, false).is_err());
        assert!(validate_stock_levels(-1, 0, 0, true).is_ok());
        assert!(validate_stock_levels(10, 60, 50, false).is_err());
        assert!(validate_stock_levels(10, 60, 0, false).is_ok());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Ballpen").is_ok());
        assert!(validate_name("name", " ").is_err());
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount("totalPrice", Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());
        assert!(matches!(
            validate_amount("totalPrice", Money::from_cents(MAX_AMOUNT_CENTS + 1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_amount("totalPrice", Money::from_cents(-1)),
            Err(ValidationError::MustNotBeNegative { .. })
        ));

        assert!(validate_signed_amount("profit", Money::from_cents(-MAX_AMOUNT_CENTS)).is_ok());
        assert!(validate_signed_amount("profit", Money::from_cents(i64::MIN)).is_err());
    }

    #[test]
    fn test_oversized_line_amounts_are_reported() {
        let huge = LineItemInput {
            total_price: Some(Money::parse_decimal("50000000000000000").unwrap()),
            ..pen(1)
        };

        let err = validate_line_items(&[huge.clone(), pen(1), huge]).unwrap_err();
        let CoreError::InvalidItems(errors) = err else {
            panic!("expected InvalidItems");
        };
        let indexes: Vec<usize> = errors.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![0, 2]);
    }

    fn rma_item(product_id: &str) -> RmaItemInput {
        RmaItemInput {
            product_id: Some(product_id.into()),
            quantity: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_rma_items_report_every_bad_item() {
        let err = validate_rma_items(&[
            rma_item("P1"),
            RmaItemInput::default(),
            RmaItemInput {
                quantity: Some(0),
                ..rma_item("P2")
            },
            RmaItemInput {
                proof_of_images: vec!["a.jpg".into(); MAX_PROOF_IMAGES + 1],
                ..rma_item("P3")
            },
        ])
        .unwrap_err();

        let CoreError::InvalidItems(errors) = err else {
            panic!("expected InvalidItems");
        };
        let indexes: Vec<usize> = errors.iter().map(|e| e.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert_eq!(errors[0].problems.len(), 2);
    }

    #[test]
    fn test_rma_item_wire_names() {
        let input: RmaItemInput = serde_json::from_str(
            r#"{"product_id": "P1", "productName": "Pen", "quantity": 2, "images": ["x.jpg"]}"#,
        )
        .unwrap();
        let lines = validate_rma_items(&[input]).unwrap();
        assert_eq!(lines[0].product_name.as_deref(), Some("Pen"));
        assert_eq!(lines[0].proof_of_images, vec!["x.jpg"]);

        assert!(validate_proof_images(&[" ".into()]).is_err());
    }
}
