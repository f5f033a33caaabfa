//! Order placement rules.
//!
//! Everything here is pure: the server loads (and locks) the products a cart
//! references, hands them to [`plan_order`], and persists the resulting
//! [`OrderPlan`] unchanged. Totals are only ever computed in this module.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

/// Prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "SM";

/// A fresh order number: `SM` followed by eight upper-case hex digits.
#[must_use]
pub fn new_order_number() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    let short: String = hex.chars().take(8).collect();
    format!("{ORDER_NUMBER_PREFIX}{}", short.to_ascii_uppercase())
}

/// One requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// The fields of a product that placement depends on, read under lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock_quantity: i32,
    pub is_active: bool,
}

/// An order line with its unit price frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Money,
}

impl PlannedItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// A fully priced order, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPlan {
    pub items: Vec<PlannedItem>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

/// Why a cart cannot become an order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("Order must contain at least one item")]
    EmptyCart,

    #[error("Quantity for product {product_id} must be at least 1")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: i32,
        requested: i32,
    },
}

/// Validate quantities and merge repeated products.
///
/// The result keeps the order in which products first appear.
///
/// # Errors
///
/// [`PlacementError::EmptyCart`] for an empty cart and
/// [`PlacementError::InvalidQuantity`] when a quantity is not positive or
/// the merged quantity overflows.
pub fn merge_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, PlacementError> {
    if lines.is_empty() {
        return Err(PlacementError::EmptyCart);
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    let mut index: HashMap<ProductId, usize> = HashMap::with_capacity(lines.len());

    for line in lines {
        if line.quantity <= 0 {
            return Err(PlacementError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        if let Some(existing) = index.get(&line.product_id).and_then(|&i| merged.get_mut(i)) {
            existing.quantity = existing.quantity.checked_add(line.quantity).ok_or(
                PlacementError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: i32::MAX,
                },
            )?;
        } else {
            index.insert(line.product_id, merged.len());
            merged.push(*line);
        }
    }

    Ok(merged)
}

/// Price a cart against the products it references.
///
/// `products` must hold the current state of every product in `lines`;
/// missing and inactive products are both reported as not found. Each
/// item's unit price is the product price at this moment.
///
/// # Errors
///
/// Any [`PlacementError`]; the first failing line wins.
pub fn plan_order(
    lines: &[CartLine],
    products: &[ProductSnapshot],
    delivery_fee: Money,
) -> Result<OrderPlan, PlacementError> {
    let lines = merge_lines(lines)?;
    let by_id: HashMap<ProductId, &ProductSnapshot> =
        products.iter().map(|product| (product.id, product)).collect();

    let mut items = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = by_id
            .get(&line.product_id)
            .filter(|product| product.is_active)
            .ok_or(PlacementError::ProductNotFound(line.product_id))?;

        if product.stock_quantity < line.quantity {
            return Err(PlacementError::InsufficientStock {
                product_id: product.id,
                name: product.name.clone(),
                available: product.stock_quantity,
                requested: line.quantity,
            });
        }

        items.push(PlannedItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    let subtotal: Money = items.iter().map(PlannedItem::line_total).sum();
    Ok(OrderPlan {
        items,
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::from(amount))
    }

    fn product(id: i32, price: i64, stock: i32) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: kes(price),
            stock_quantity: stock,
            is_active: true,
        }
    }

    fn line(id: i32, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_order_number_format() {
        let number = new_order_number();
        assert_eq!(number.len(), 10);
        assert!(number.starts_with("SM"));
        assert!(
            number[2..]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
        assert_ne!(number, new_order_number());
    }

    #[test]
    fn test_total_is_items_plus_delivery() {
        let products = [product(1, 400, 30), product(2, 55, 200)];
        let plan = plan_order(&[line(1, 2), line(2, 3)], &products, kes(300)).unwrap();

        assert_eq!(plan.subtotal, kes(965));
        assert_eq!(plan.delivery_fee, kes(300));
        assert_eq!(plan.total, kes(1265));
        let recomputed: Money = plan.items.iter().map(PlannedItem::line_total).sum();
        assert_eq!(plan.total, recomputed + plan.delivery_fee);
    }

    #[test]
    fn test_prices_frozen_from_snapshot() {
        let plan = plan_order(&[line(1, 1)], &[product(1, 61_500, 5)], Money::ZERO).unwrap();
        assert_eq!(plan.items[0].unit_price, kes(61_500));
        assert_eq!(plan.items[0].product_name, "Product 1");
    }

    #[test]
    fn test_duplicate_lines_merge_before_stock_check() {
        let products = [product(1, 150, 5)];
        let err = plan_order(&[line(1, 3), line(1, 3)], &products, Money::ZERO).unwrap_err();
        assert_eq!(
            err,
            PlacementError::InsufficientStock {
                product_id: ProductId::new(1),
                name: "Product 1".to_owned(),
                available: 5,
                requested: 6,
            }
        );

        let plan = plan_order(&[line(1, 2), line(1, 3)], &products, Money::ZERO).unwrap();
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].quantity, 5);
    }

    #[test]
    fn test_exact_stock_accepted() {
        let plan = plan_order(&[line(1, 5)], &[product(1, 10, 5)], Money::ZERO).unwrap();
        assert_eq!(plan.items[0].quantity, 5);
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = plan_order(&[line(1, 6)], &[product(1, 10, 5)], Money::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for Product 1. Available: 5");
    }

    #[test]
    fn test_missing_and_inactive_products_not_found() {
        let err = plan_order(&[line(9, 1)], &[product(1, 10, 5)], Money::ZERO).unwrap_err();
        assert_eq!(err, PlacementError::ProductNotFound(ProductId::new(9)));

        let mut hidden = product(1, 10, 5);
        hidden.is_active = false;
        let err = plan_order(&[line(1, 1)], &[hidden], Money::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "Product 1 not found");
    }

    #[test]
    fn test_empty_and_non_positive_quantities() {
        assert_eq!(merge_lines(&[]), Err(PlacementError::EmptyCart));
        assert!(matches!(
            merge_lines(&[line(1, 0)]),
            Err(PlacementError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            merge_lines(&[line(1, -2)]),
            Err(PlacementError::InvalidQuantity { quantity: -2, .. })
        ));
    }

    #[test]
    fn test_merge_keeps_first_appearance_order() {
        let merged = merge_lines(&[line(3, 1), line(1, 1), line(3, 2)]).unwrap();
        assert_eq!(merged, vec![line(3, 3), line(1, 1)]);
    }

    #[test]
    fn test_merge_overflow_rejected() {
        assert!(matches!(
            merge_lines(&[line(1, i32::MAX), line(1, 1)]),
            Err(PlacementError::InvalidQuantity { .. })
        ));
    }
}
