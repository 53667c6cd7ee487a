//! # Ledger Planning
//!
//! Pure planning of the stock and item effects of each workflow.
//!
//! The workflows in `tally-api` never compute deltas inline: they load the
//! current rows, ask this module for a plan, then apply the plan inside one
//! database transaction.
//!
//! ```text
//!   create   : items ──────────────► sale_deltas     (-qty per product)
//!   update   : old items, new items ► update_deltas   (-(new - old))
//!   empty    : old items ──────────► restore_deltas  (+qty per product)
//!   refund   : items, refund lines ► plan_refund     (+qty, item reductions)
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, CoreResult, ItemError};
use crate::money::Money;
use crate::types::TransactionItem;
use crate::validation::{LineItem, RefundLine, ReplaceLine};

// =============================================================================
// Stock Deltas
// =============================================================================

/// A signed change to one product's `current_stock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,
    pub delta: i64,
}

/// Anything that takes a quantity of one product.
pub trait Quantified {
    fn product_id(&self) -> &str;
    fn quantity(&self) -> i64;
}

impl Quantified for LineItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

impl Quantified for TransactionItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// Sums quantities per product, in product id order.
fn totals_by_product<T: Quantified>(items: &[T]) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for item in items {
        *totals.entry(item.product_id().to_string()).or_insert(0) += item.quantity();
    }
    totals
}

fn into_deltas(totals: BTreeMap<String, i64>) -> Vec<StockDelta> {
    totals
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .map(|(product_id, delta)| StockDelta { product_id, delta })
        .collect()
}

/// Stock decrements for a new sale: one negative delta per product.
///
/// Deltas are returned sorted by product id so that concurrent workflows
/// touch product rows in the same order.
pub fn sale_deltas<T: Quantified>(items: &[T]) -> Vec<StockDelta> {
    into_deltas(
        totals_by_product(items)
            .into_iter()
            .map(|(product, qty)| (product, -qty))
            .collect(),
    )
}

/// Stock increments that undo a sale.
pub fn restore_deltas<T: Quantified>(items: &[T]) -> Vec<StockDelta> {
    into_deltas(totals_by_product(items))
}

/// Stock changes for replacing `previous` items with `next`.
///
/// Per product the purchased difference is `new - old` (a product that
/// disappears counts as `-old`); stock moves by the negation of that.
///
/// ## Example
/// ```text
/// previous: P1 x5, P2 x1          next: P1 x7, P3 x2
/// P1: -(7-5) = -2   P2: -(0-1) = +1   P3: -(2-0) = -2
/// ```
pub fn update_deltas<A: Quantified, B: Quantified>(previous: &[A], next: &[B]) -> Vec<StockDelta> {
    let mut diff = totals_by_product(previous);
    for qty in diff.values_mut() {
        *qty = -*qty;
    }
    for (product, qty) in totals_by_product(next) {
        *diff.entry(product).or_insert(0) += qty;
    }
    into_deltas(diff.into_iter().map(|(product, d)| (product, -d)).collect())
}

/// Sum of the line totals.
pub fn lines_total(lines: &[LineItem]) -> Money {
    lines.iter().map(|l| l.total_price).sum()
}

// =============================================================================
// Refund Planning
// =============================================================================

/// A refund line resolved to the transaction item it is taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRefundLine {
    pub transaction_item_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub amount: Money,
    pub product_name: String,
    pub product_category: Option<String>,
}

/// What happens to one transaction item after a refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAdjustment {
    /// Keep the item with a smaller quantity and total.
    Reduce {
        item_id: String,
        quantity: i64,
        total_price: Money,
    },
    /// Nothing left of the item.
    Remove { item_id: String },
}

/// Every effect of one refund, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundPlan {
    pub lines: Vec<MatchedRefundLine>,
    pub stock: Vec<StockDelta>,
    pub adjustments: Vec<ItemAdjustment>,
    pub grand_total: Money,
}

/// Remaining quantity and total of one item while lines are matched.
struct Remaining {
    quantity: i64,
    total: Money,
}

/// Plans a refund of `lines` against the current `items` of a transaction.
///
/// Each line is matched by `transaction_item_id` when given, otherwise to
/// the first item of the same product that still has quantity left. Lines
/// are applied in order, so two lines may draw from the same item.
///
/// ## Errors
/// `InvalidItems` listing every line that matches no item, targets an item
/// of another product, or refunds more than remains.
///
/// ## Example
/// ```text
/// item TI-00001: P1 x5, total 50
/// refund P1 x2, total 20  ──►  Reduce { TI-00001, quantity 3, total 30 }
///                             stock P1 +2, grand total 20
/// ```
pub fn plan_refund(
    items: &[TransactionItem],
    lines: &[RefundLine],
    grand_total: Option<Money>,
) -> CoreResult<RefundPlan> {
    let mut remaining: HashMap<&str, Remaining> = items
        .iter()
        .map(|item| {
            (
                item.item_id.as_str(),
                Remaining {
                    quantity: item.quantity,
                    total: item.total_price(),
                },
            )
        })
        .collect();

    let mut matched = Vec::with_capacity(lines.len());
    let mut touched: Vec<&str> = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let target = match &line.transaction_item_id {
            Some(key) => items.iter().find(|item| item.item_id == *key),
            None => items.iter().find(|item| {
                item.product_id == line.product_id
                    && remaining
                        .get(item.item_id.as_str())
                        .is_some_and(|r| r.quantity > 0)
            }),
        };

        let Some(item) = target else {
            errors.push(ItemError::new(
                index,
                vec![format!("no sold item of product {} to refund", line.product_id)],
            ));
            continue;
        };

        if item.product_id != line.product_id {
            errors.push(ItemError::new(
                index,
                vec![format!(
                    "item {} is product {}, not {}",
                    item.item_id, item.product_id, line.product_id
                )],
            ));
            continue;
        }

        let Some(left) = remaining.get_mut(item.item_id.as_str()) else {
            continue;
        };

        if line.quantity > left.quantity {
            errors.push(ItemError::new(
                index,
                vec![format!(
                    "quantity {} exceeds remaining {} of item {}",
                    line.quantity, left.quantity, item.item_id
                )],
            ));
            continue;
        }

        left.quantity -= line.quantity;
        left.total -= line.total_price;
        if !touched.contains(&item.item_id.as_str()) {
            touched.push(item.item_id.as_str());
        }

        matched.push(MatchedRefundLine {
            transaction_item_id: item.item_id.clone(),
            product_id: item.product_id.clone(),
            quantity: line.quantity,
            amount: line.total_price,
            product_name: line
                .product_name
                .clone()
                .unwrap_or_else(|| item.product_name.clone()),
            product_category: line
                .product_category
                .clone()
                .or_else(|| item.product_category.clone()),
        });
    }

    if !errors.is_empty() {
        return Err(CoreError::InvalidItems(errors));
    }

    let adjustments = touched
        .into_iter()
        .filter_map(|item_id| {
            let left = remaining.get(item_id)?;
            Some(if left.quantity <= 0 {
                ItemAdjustment::Remove {
                    item_id: item_id.to_string(),
                }
            } else {
                ItemAdjustment::Reduce {
                    item_id: item_id.to_string(),
                    quantity: left.quantity,
                    total_price: left.total,
                }
            })
        })
        .collect();

    let mut restock: BTreeMap<String, i64> = BTreeMap::new();
    for line in &matched {
        *restock.entry(line.product_id.clone()).or_insert(0) += line.quantity;
    }

    let grand_total = grand_total.unwrap_or_else(|| matched.iter().map(|l| l.amount).sum());

    Ok(RefundPlan {
        lines: matched,
        stock: into_deltas(restock),
        adjustments,
        grand_total,
    })
}

// =============================================================================
// Replacement Resolution
// =============================================================================

/// A replacement line with its item reference and names filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReplaceLine {
    pub transaction_item_id: Option<String>,
    pub product_id: String,
    pub quantity: i64,
    pub product_name: Option<String>,
    pub product_category: Option<String>,
}

/// Fills replacement lines from the transaction's items.
///
/// A line without an item key is linked to the first item of its product,
/// if any. Names missing from the request are taken from that item. Lines
/// naming an item key that is not on the transaction are rejected.
pub fn resolve_replace_lines(
    items: &[TransactionItem],
    lines: &[ReplaceLine],
) -> CoreResult<Vec<ResolvedReplaceLine>> {
    let mut resolved = Vec::with_capacity(lines.len());
    let mut errors = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let item = match &line.transaction_item_id {
            Some(key) => match items.iter().find(|item| item.item_id == *key) {
                Some(item) => Some(item),
                None => {
                    errors.push(ItemError::new(
                        index,
                        vec![format!("item {key} is not part of this transaction")],
                    ));
                    continue;
                }
            },
            None => items.iter().find(|item| item.product_id == line.product_id),
        };

        resolved.push(ResolvedReplaceLine {
            transaction_item_id: item.map(|i| i.item_id.clone()),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            product_name: line
                .product_name
                .clone()
                .or_else(|| item.map(|i| i.product_name.clone())),
            product_category: line
                .product_category
                .clone()
                .or_else(|| item.and_then(|i| i.product_category.clone())),
        });
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(CoreError::InvalidItems(errors))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
