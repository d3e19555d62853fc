//! # Ledger Commands
//!
//! Sales and purchases are staged in a [`Cart`] first, so the per-product
//! stock ceiling and line limits are checked before anything is written.
//!
//! ```text
//! --item 4:2 --item 7:1
//!        │
//!        ▼
//! ┌──────────────┐   add_item    ┌────────┐   to_sale /     ┌──────────────────┐
//! │ products.get │ ────────────► │  Cart  │ ──────────────► │ LedgerRepository │
//! └──────────────┘               └────────┘   to_purchase   └──────────────────┘
//! ```

use optica_core::{Cart, DeleteOutcome, Money, TransactionKind};
use serde::Serialize;
use tracing::info;

use super::fetch;
use crate::cli::{ItemArg, PurchaseArgs, SaleArgs, TransactionRef};
use crate::error::{AppError, AppResult};
use crate::output::{emit, pesos};
use crate::Context;

#[derive(Debug, Serialize)]
struct Recorded {
    kind: TransactionKind,
    id: i64,
    total: i64,
    items: usize,
}

/// Records a sale and prints a short receipt.
pub async fn sale(ctx: &Context, args: SaleArgs) -> AppResult<()> {
    let cart = fill_cart(ctx, TransactionKind::Sale, &args.items).await?;
    let sale = cart.to_sale(args.client, &args.seller, args.total, args.date);

    let id = ctx.db.ledger().create_sale(&sale).await?;
    info!(id, client = args.client, total = sale.total, "Sale recorded");

    let receipt = Recorded {
        kind: TransactionKind::Sale,
        id,
        total: sale.total,
        items: cart.item_count(),
    };
    emit(ctx, &receipt, |r| {
        println!("{}", ctx.config.shop.name);
        println!("Sale #{} recorded: {} line(s)", r.id, r.items);
        if r.total != cart.subtotal().pesos() {
            println!("  Subtotal: {}", cart.subtotal());
        }
        println!("  Total:    {}", pesos(r.total));
    })
}

/// Records a purchase at each product's cost price.
pub async fn purchase(ctx: &Context, args: PurchaseArgs) -> AppResult<()> {
    let cart = fill_cart(ctx, TransactionKind::Purchase, &args.items).await?;
    let purchase = cart.to_purchase(args.supplier, args.date);

    let id = ctx.db.ledger().create_purchase(&purchase).await?;
    info!(id, supplier = args.supplier, total = purchase.total, "Purchase recorded");

    let receipt = Recorded {
        kind: TransactionKind::Purchase,
        id,
        total: purchase.total,
        items: cart.item_count(),
    };
    emit(ctx, &receipt, |r| {
        println!("Purchase #{} recorded: {} line(s), {}", r.id, r.items, pesos(r.total));
    })
}

async fn fill_cart(ctx: &Context, kind: TransactionKind, items: &[ItemArg]) -> AppResult<Cart> {
    let products = ctx.db.products();
    let mut cart = Cart::new(kind);

    for item in items {
        let product = fetch(&products, item.product_id).await?;
        cart.add_item(&product, item.quantity)?;
    }

    Ok(cart)
}

/// Prints a transaction with its lines.
pub async fn show(ctx: &Context, target: TransactionRef) -> AppResult<()> {
    let ledger = ctx.db.ledger();
    let not_found = || AppError::not_found(entity(target.kind), target.id);

    match target.kind {
        TransactionKind::Sale => {
            let detail = ledger.get_sale(target.id).await?.ok_or_else(not_found)?;
            emit(ctx, &detail, |d| {
                let o = &d.order;
                println!("Sale #{} ({})", o.id, o.status.as_str());
                println!("  Date:   {}", o.date);
                println!("  Client: {}", o.client_id);
                println!("  Seller: {}", o.seller);
                print_lines(d.lines.iter().map(|l| (l.product_id, l.quantity, l.unit_price)));
                println!("  Total:  {}", pesos(o.total));
            })
        }
        TransactionKind::Purchase => {
            let detail = ledger.get_purchase(target.id).await?.ok_or_else(not_found)?;
            emit(ctx, &detail, |d| {
                let p = &d.purchase;
                println!("Purchase #{}", p.id);
                println!("  Date:     {}", p.date);
                println!("  Supplier: {}", p.supplier_id);
                print_lines(d.lines.iter().map(|l| (l.product_id, l.quantity, l.unit_cost)));
                println!("  Total:    {}", pesos(p.total));
            })
        }
    }
}

fn print_lines(lines: impl Iterator<Item = (i64, i64, i64)>) {
    println!("  {:>8}  {:>5}  {:>12}  {:>12}", "PRODUCT", "QTY", "UNIT", "LINE");
    for (product_id, quantity, unit) in lines {
        println!(
            "  {:>8}  {:>5}  {:>12}  {:>12}",
            product_id,
            quantity,
            pesos(unit),
            Money::from_pesos(unit).multiply_quantity(quantity).to_string()
        );
    }
}

/// Deletes a transaction and reverses its stock movement.
pub async fn void(ctx: &Context, target: TransactionRef) -> AppResult<()> {
    let outcome = ctx
        .db
        .ledger()
        .delete_transaction(target.kind, target.id)
        .await?;

    match outcome {
        DeleteOutcome::Deleted => emit(ctx, &DeleteOutcome::Deleted, |_| {
            println!("{} {} deleted, stock restored", entity(target.kind), target.id)
        }),
        DeleteOutcome::Refused { reason } => {
            Err(AppError::refused(entity(target.kind), target.id, &reason))
        }
        DeleteOutcome::NotFound => Err(AppError::not_found(entity(target.kind), target.id)),
    }
}

fn entity(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Sale => "Sale",
        TransactionKind::Purchase => "Purchase",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use crate::error::ErrorCode;
    use optica_core::{ClientDraft, ProductDraft, SupplierDraft};
    use optica_db::EntityRepository;

    async fn shop(stock: i64) -> Context {
        let ctx = context().await;
        ctx.db
            .clients()
            .create(&ClientDraft {
                name: "Ana".to_string(),
                last_name: "Rojas".to_string(),
                rut: "12345678-5".to_string(),
                phone: "1".to_string(),
                email: "a@b.cl".to_string(),
                address: "x".to_string(),
            })
            .await
            .unwrap();
        ctx.db
            .suppliers()
            .create(&SupplierDraft {
                name: "Opticolor".to_string(),
                contact: "Luis".to_string(),
                phone: "2".to_string(),
                address: "y".to_string(),
            })
            .await
            .unwrap();
        ctx.db
            .products()
            .create(&ProductDraft {
                name: "Armazón Aviator".to_string(),
                category: "Armazón".to_string(),
                brand: "Ray-Ban".to_string(),
                stock,
                cost_price: 20_000,
                sale_price: 45_000,
            })
            .await
            .unwrap();
        ctx
    }

    fn sale_args(items: &[(i64, i64)]) -> SaleArgs {
        SaleArgs {
            client: 1,
            seller: "Marta".to_string(),
            items: items
                .iter()
                .map(|&(product_id, quantity)| ItemArg {
                    product_id,
                    quantity,
                })
                .collect(),
            total: None,
            date: None,
        }
    }

    async fn stock(ctx: &Context) -> i64 {
        ctx.db.products().get(1).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_sale_then_void_restores_stock() {
        let ctx = shop(10).await;

        sale(&ctx, sale_args(&[(1, 2), (1, 1)])).await.unwrap();
        assert_eq!(stock(&ctx).await, 7);

        let detail = ctx.db.ledger().get_sale(1).await.unwrap().unwrap();
        assert_eq!(detail.order.total, 135_000);
        assert_eq!(detail.lines.len(), 1);

        let target = TransactionRef {
            kind: TransactionKind::Sale,
            id: 1,
        };
        void(&ctx, target).await.unwrap();
        assert_eq!(stock(&ctx).await, 10);
    }

    #[tokio::test]
    async fn test_sale_above_stock_writes_nothing() {
        let ctx = shop(3).await;

        let err = sale(&ctx, sale_args(&[(1, 2), (1, 2)])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(stock(&ctx).await, 3);
        assert!(ctx.db.ledger().get_sale(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let ctx = shop(3).await;

        let err = sale(&ctx, sale_args(&[(42, 1)])).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_purchase_uses_cost_and_adds_stock() {
        let ctx = shop(0).await;
        let args = PurchaseArgs {
            supplier: 1,
            items: vec![ItemArg {
                product_id: 1,
                quantity: 4,
            }],
            date: None,
        };

        purchase(&ctx, args).await.unwrap();
        assert_eq!(stock(&ctx).await, 4);

        let detail = ctx.db.ledger().get_purchase(1).await.unwrap().unwrap();
        assert_eq!(detail.purchase.total, 80_000);
        assert_eq!(detail.lines[0].unit_cost, 20_000);
    }

    #[tokio::test]
    async fn test_show_and_void_missing() {
        let ctx = shop(1).await;

        let err = show(
            &ctx,
            TransactionRef {
                kind: TransactionKind::Purchase,
                id: 5,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = void(
            &ctx,
            TransactionRef {
                kind: TransactionKind::Sale,
                id: 5,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
