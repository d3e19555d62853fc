//! # Product Commands
//!
//! Inventory listing and edits. Stock set here is an absolute correction;
//! sales and purchases move it through the ledger.

use optica_core::{Product, ProductDraft};
use optica_db::EntityRepository;
use tracing::warn;

use super::{create, delete, fetch, patch, update};
use crate::cli::{ProductCommand, ProductFields, ProductPatch};
use crate::error::AppResult;
use crate::output::{emit, fit, pesos};
use crate::Context;

pub async fn run(ctx: &Context, command: ProductCommand) -> AppResult<()> {
    let repo = ctx.db.products();

    match command {
        ProductCommand::List => {
            let products = repo.list().await?;
            emit(ctx, &products, |p| print_table(p))
        }
        ProductCommand::Search { query } => {
            let products = repo.search(&query).await?;
            emit(ctx, &products, |p| print_table(p))
        }
        ProductCommand::Show { id } => {
            let product = fetch(&repo, id).await?;
            emit(ctx, &product, print_card)
        }
        ProductCommand::LowStock { threshold } => {
            let products = repo.low_stock(threshold).await?;
            emit(ctx, &products, |p| print_table(p))
        }
        ProductCommand::Add(fields) => create(ctx, &repo, &fields.into()).await,
        ProductCommand::Update { id, fields } => {
            let current = fetch(&repo, id).await?;
            update(ctx, &repo, id, &apply(current, fields)).await
        }
        ProductCommand::Delete { id } => delete(ctx, &repo, id).await,
    }
}

impl From<ProductFields> for ProductDraft {
    fn from(f: ProductFields) -> Self {
        ProductDraft {
            name: f.name,
            category: f.category,
            brand: f.brand,
            stock: f.stock,
            cost_price: f.cost,
            sale_price: f.price,
        }
    }
}

/// Reversing a purchase whose units were already sold can leave stock below
/// zero. An edit that does not set stock brings it back to zero.
fn apply(current: Product, p: ProductPatch) -> ProductDraft {
    let stock = match p.stock {
        Some(stock) => stock,
        None if current.stock < 0 => {
            warn!(id = current.id, stock = current.stock, "Negative stock reset to 0");
            0
        }
        None => current.stock,
    };

    ProductDraft {
        name: patch(current.name, p.name),
        category: patch(current.category, p.category),
        brand: patch(current.brand, p.brand),
        stock,
        cost_price: patch(current.cost_price, p.cost),
        sale_price: patch(current.sale_price, p.price),
    }
}

fn print_table(products: &[Product]) {
    println!(
        "{:>5}  {:<32}  {:<18}  {:<12}  {:>6}  {:>12}",
        "ID", "NAME", "CATEGORY", "BRAND", "STOCK", "PRICE"
    );
    for p in products {
        println!(
            "{:>5}  {:<32}  {:<18}  {:<12}  {:>6}  {:>12}",
            p.id,
            fit(&p.name, 32),
            fit(&p.category, 18),
            fit(&p.brand, 12),
            p.stock,
            pesos(p.sale_price)
        );
    }
    println!("{} product(s)", products.len());
}

fn print_card(p: &Product) {
    println!("Product #{}", p.id);
    println!("  Name:     {}", p.name);
    println!("  Category: {}", p.category);
    println!("  Brand:    {}", p.brand);
    println!("  Stock:    {}", p.stock);
    println!("  Cost:     {}", p.cost());
    println!("  Price:    {}", p.price());
}
