//! # Supplier Commands

use optica_core::{Supplier, SupplierDraft};
use optica_db::EntityRepository;

use super::{create, delete, fetch, patch, update};
use crate::cli::{SupplierCommand, SupplierFields, SupplierPatch};
use crate::error::AppResult;
use crate::output::{emit, fit};
use crate::Context;

pub async fn run(ctx: &Context, command: SupplierCommand) -> AppResult<()> {
    let repo = ctx.db.suppliers();

    match command {
        SupplierCommand::List => {
            let suppliers = repo.list().await?;
            emit(ctx, &suppliers, |s| print_table(s))
        }
        SupplierCommand::Search { query } => {
            let suppliers = repo.search(&query).await?;
            emit(ctx, &suppliers, |s| print_table(s))
        }
        SupplierCommand::Show { id } => {
            let supplier = fetch(&repo, id).await?;
            emit(ctx, &supplier, |s| {
                println!("Supplier #{}", s.id);
                println!("  Name:    {}", s.name);
                println!("  Contact: {}", s.contact);
                println!("  Phone:   {}", s.phone);
                println!("  Address: {}", s.address);
            })
        }
        SupplierCommand::Add(fields) => create(ctx, &repo, &fields.into()).await,
        SupplierCommand::Update { id, fields } => {
            let current = fetch(&repo, id).await?;
            update(ctx, &repo, id, &apply(current, fields)).await
        }
        SupplierCommand::Delete { id } => delete(ctx, &repo, id).await,
    }
}

impl From<SupplierFields> for SupplierDraft {
    fn from(f: SupplierFields) -> Self {
        SupplierDraft {
            name: f.name,
            contact: f.contact,
            phone: f.phone,
            address: f.address,
        }
    }
}

fn apply(current: Supplier, p: SupplierPatch) -> SupplierDraft {
    SupplierDraft {
        name: patch(current.name, p.name),
        contact: patch(current.contact, p.contact),
        phone: patch(current.phone, p.phone),
        address: patch(current.address, p.address),
    }
}

fn print_table(suppliers: &[Supplier]) {
    println!("{:>5}  {:<32}  {:<20}  {}", "ID", "NAME", "CONTACT", "PHONE");
    for s in suppliers {
        println!(
            "{:>5}  {:<32}  {:<20}  {}",
            s.id,
            fit(&s.name, 32),
            fit(&s.contact, 20),
            s.phone
        );
    }
    println!("{} supplier(s)", suppliers.len());
}
