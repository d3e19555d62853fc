//! # Transaction Cart
//!
//! Collects product lines before a sale or purchase is recorded.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Cart Method             State Change          │
//! │  ───────────────          ───────────             ────────────          │
//! │                                                                         │
//! │  --item 4:2 ─────────────► add_item() ──────────► push or merge line   │
//! │  change quantity ────────► update_quantity() ───► items[i].qty = n     │
//! │  drop a line ────────────► remove_item() ───────► items.remove(i)      │
//! │  start over ─────────────► clear() ─────────────► items.clear()        │
//! │                                                                         │
//! │  confirm ────────────────► to_sale() / to_purchase() → ledger input    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Ceiling
//! For a sale, a line may never take more than the product's stock minus
//! what the cart already holds for that product. Exactly the remaining
//! amount is accepted; one more is rejected. Purchases have no ceiling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LedgerLine, NewPurchase, NewSale, Product, TransactionKind};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
///
/// Name, unit price and stock are frozen when the product is first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub name: String,
    /// Sale price for a sale cart, cost price for a purchase cart.
    pub unit_price: i64,
    pub quantity: i64,
    /// Stock at the time the product was added.
    pub stock: i64,
}

impl CartItem {
    fn from_product(kind: TransactionKind, product: &Product, quantity: i64) -> Self {
        let unit_price = match kind {
            TransactionKind::Sale => product.sale_price,
            TransactionKind::Purchase => product.cost_price,
        };

        CartItem {
            product_id: product.id,
            name: product.name.clone(),
            unit_price,
            quantity,
            stock: product.stock,
        }
    }

    pub fn line_total(&self) -> Money {
        Money::from_pesos(self.unit_price).multiply_quantity(self.quantity)
    }
}

/// A sale or purchase cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product merges)
/// - Quantity per item is 1..=999
/// - At most 100 distinct items
/// - Sale items never exceed their frozen stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    kind: TransactionKind,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new(kind: TransactionKind) -> Self {
        Cart {
            kind,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Quantity of a product already in the cart.
    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.items
            .iter()
            .find(|i| i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    /// Adds a product to the cart or increases its quantity if already present.
    ///
    /// ## Returns
    /// * `Ok(())` - Line added or merged
    /// * `Err(CoreError::InsufficientStock)` - Sale line above `stock - in_cart`
    /// * `Err(CoreError::QuantityTooLarge)` - Merged quantity above 999
    /// * `Err(CoreError::CartTooLarge)` - 101st distinct product
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        let in_cart = self.quantity_of(product.id);
        let merged = in_cart + quantity;
        if merged > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: merged,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if self.kind == TransactionKind::Sale && quantity > product.stock - in_cart {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                stock: product.stock,
                in_cart,
                requested: quantity,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            item.quantity = merged;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items
            .push(CartItem::from_product(self.kind, product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        let kind = self.kind;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CoreError::NotInCart(product_id))?;

        if kind == TransactionKind::Sale && quantity > item.stock {
            return Err(CoreError::InsufficientStock {
                product: item.name.clone(),
                stock: item.stock,
                in_cart: 0,
                requested: quantity,
            });
        }

        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product id.
    pub fn remove_item(&mut self, product_id: i64) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn ledger_lines(&self) -> Vec<LedgerLine> {
        self.items
            .iter()
            .map(|i| LedgerLine {
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect()
    }

    /// Builds the sale input. `total` defaults to the subtotal.
    pub fn to_sale(
        &self,
        client_id: i64,
        seller: &str,
        total: Option<i64>,
        date: Option<NaiveDate>,
    ) -> NewSale {
        NewSale {
            client_id,
            seller: seller.trim().to_string(),
            total: total.unwrap_or_else(|| self.subtotal().pesos()),
            date,
            lines: self.ledger_lines(),
        }
    }

    /// Builds the purchase input. The total is always the subtotal.
    pub fn to_purchase(&self, supplier_id: i64, date: Option<NaiveDate>) -> NewPurchase {
        NewPurchase {
            supplier_id,
            total: self.subtotal().pesos(),
            date,
            lines: self.ledger_lines(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: i64, stock: i64) -> Product {
        Product {
            id,
            name: format!("Producto {}", id),
            category: "Armazón".to_string(),
            brand: "Lacoste".to_string(),
            stock,
            cost_price: 20_000,
            sale_price: 45_000,
        }
    }

    #[test]
    fn test_sale_stock_ceiling_boundary() {
        let mut cart = Cart::new(TransactionKind::Sale);
        let product = test_product(1, 6);

        cart.add_item(&product, 3).unwrap();
        // Exactly the remaining 3 is fine
        cart.add_item(&product, 3).unwrap();
        assert_eq!(cart.quantity_of(1), 6);

        let err = cart.add_item(&product, 1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                stock: 6,
                in_cart: 6,
                requested: 1,
                ..
            }
        ));
        assert_eq!(cart.quantity_of(1), 6);
    }

    #[test]
    fn test_sale_rejects_above_stock_on_first_add() {
        let mut cart = Cart::new(TransactionKind::Sale);
        assert!(cart.add_item(&test_product(1, 2), 3).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_purchase_has_no_ceiling_and_uses_cost() {
        let mut cart = Cart::new(TransactionKind::Purchase);
        let product = test_product(1, 0);

        cart.add_item(&product, 50).unwrap();
        assert_eq!(cart.subtotal().pesos(), 1_000_000);

        let purchase = cart.to_purchase(7, None);
        assert_eq!(purchase.total, 1_000_000);
        assert_eq!(purchase.lines[0].unit_price, 20_000);
        assert!(purchase.validate().is_ok());
    }

    #[test]
    fn test_same_product_merges() {
        let mut cart = Cart::new(TransactionKind::Sale);
        let product = test_product(1, 10);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.subtotal().pesos(), 225_000);
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new(TransactionKind::Purchase);
        let product = test_product(1, 0);

        assert!(matches!(
            cart.add_item(&product, 0),
            Err(CoreError::Validation(_))
        ));
        cart.add_item(&product, 999).unwrap();
        assert!(matches!(
            cart.add_item(&product, 1),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));
    }

    #[test]
    fn test_cart_too_large() {
        let mut cart = Cart::new(TransactionKind::Purchase);
        for id in 1..=100 {
            cart.add_item(&test_product(id, 0), 1).unwrap();
        }
        assert!(matches!(
            cart.add_item(&test_product(101, 0), 1),
            Err(CoreError::CartTooLarge { max: 100 })
        ));
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = Cart::new(TransactionKind::Sale);
        cart.add_item(&test_product(1, 4), 1).unwrap();

        cart.update_quantity(1, 4).unwrap();
        assert_eq!(cart.quantity_of(1), 4);
        assert!(cart.update_quantity(1, 5).is_err());

        cart.update_quantity(1, 0).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(cart.remove_item(1), Err(CoreError::NotInCart(1))));
    }

    #[test]
    fn test_to_sale_total_override() {
        let mut cart = Cart::new(TransactionKind::Sale);
        cart.add_item(&test_product(1, 10), 2).unwrap();

        let sale = cart.to_sale(3, " Marta ", None, None);
        assert_eq!(sale.total, 90_000);
        assert_eq!(sale.seller, "Marta");

        let discounted = cart.to_sale(3, "Marta", Some(85_000), None);
        assert_eq!(discounted.total, 85_000);
        assert_eq!(discounted.subtotal().pesos(), 90_000);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new(TransactionKind::Sale);
        cart.add_item(&test_product(1, 10), 2).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::zero());
    }
}
