//! # Client Commands

use optica_core::{Client, ClientDraft};
use optica_db::EntityRepository;

use super::{create, delete, fetch, patch, update};
use crate::cli::{ClientCommand, ClientFields, ClientPatch};
use crate::error::AppResult;
use crate::output::{emit, fit};
use crate::Context;

pub async fn run(ctx: &Context, command: ClientCommand) -> AppResult<()> {
    let repo = ctx.db.clients();

    match command {
        ClientCommand::List => {
            let clients = repo.list().await?;
            emit(ctx, &clients, |c| print_table(c))
        }
        ClientCommand::Search { query } => {
            let clients = repo.search(&query).await?;
            emit(ctx, &clients, |c| print_table(c))
        }
        ClientCommand::Show { id } => {
            let client = fetch(&repo, id).await?;
            emit(ctx, &client, print_card)
        }
        ClientCommand::Add(fields) => create(ctx, &repo, &fields.into()).await,
        ClientCommand::Update { id, fields } => {
            let current = fetch(&repo, id).await?;
            update(ctx, &repo, id, &apply(current, fields)).await
        }
        ClientCommand::Delete { id } => delete(ctx, &repo, id).await,
    }
}

impl From<ClientFields> for ClientDraft {
    fn from(f: ClientFields) -> Self {
        ClientDraft {
            name: f.name,
            last_name: f.last_name,
            rut: f.rut,
            phone: f.phone,
            email: f.email,
            address: f.address,
        }
    }
}

fn apply(current: Client, p: ClientPatch) -> ClientDraft {
    ClientDraft {
        name: patch(current.name, p.name),
        last_name: patch(current.last_name, p.last_name),
        rut: patch(current.rut, p.rut),
        phone: patch(current.phone, p.phone),
        email: patch(current.email, p.email),
        address: patch(current.address, p.address),
    }
}

fn print_table(clients: &[Client]) {
    println!("{:>5}  {:<28}  {:<12}  {:<16}  {}", "ID", "NAME", "RUT", "PHONE", "EMAIL");
    for c in clients {
        println!(
            "{:>5}  {:<28}  {:<12}  {:<16}  {}",
            c.id,
            fit(&c.full_name(), 28),
            c.rut,
            fit(&c.phone, 16),
            c.email
        );
    }
    println!("{} client(s)", clients.len());
}

fn print_card(c: &Client) {
    println!("Client #{}", c.id);
    println!("  Name:    {}", c.full_name());
    println!("  RUT:     {}", c.rut);
    println!("  Phone:   {}", c.phone);
    println!("  Email:   {}", c.email);
    println!("  Address: {}", c.address);
}
