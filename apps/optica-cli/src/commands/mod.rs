//! # Commands
//!
//! One module per area. Entity commands share the helpers below, written once
//! against [`EntityRepository`].
//!
//! ```text
//! Command::Client(..)   ──► client::run    ─┐
//! Command::Product(..)  ──► product::run   ─┤  list / show / create / update /
//! Command::Supplier(..) ──► supplier::run  ─┤  delete via the generic helpers
//! Command::Recipe(..)   ──► recipe::run    ─┘
//! Command::Sale / Purchase / Show / Void ──► ledger
//! Command::History / Report / Sellers    ──► report
//! ```

pub mod client;
pub mod ledger;
pub mod product;
pub mod recipe;
pub mod report;
pub mod supplier;

use optica_core::DeleteOutcome;
use optica_db::EntityRepository;
use serde::Serialize;
use tracing::info;

use crate::cli::Command;
use crate::error::{AppError, AppResult};
use crate::output::emit;
use crate::Context;

/// Routes a parsed command to its handler.
pub async fn dispatch(ctx: &Context, command: Command) -> AppResult<()> {
    match command {
        Command::Client(cmd) => client::run(ctx, cmd).await,
        Command::Product(cmd) => product::run(ctx, cmd).await,
        Command::Supplier(cmd) => supplier::run(ctx, cmd).await,
        Command::Recipe(cmd) => recipe::run(ctx, cmd).await,
        Command::Sale(args) => ledger::sale(ctx, args).await,
        Command::Purchase(args) => ledger::purchase(ctx, args).await,
        Command::Show(target) => ledger::show(ctx, target).await,
        Command::Void(target) => ledger::void(ctx, target).await,
        Command::History(args) => report::history(ctx, args).await,
        Command::Report(args) => report::monthly(ctx, args).await,
        Command::Sellers => report::sellers(ctx).await,
    }
}

// =============================================================================
// Generic Entity Helpers
// =============================================================================

/// Fetches a record or fails with NOT_FOUND.
pub(crate) async fn fetch<R: EntityRepository>(repo: &R, id: i64) -> AppResult<R::Record> {
    repo.get(id)
        .await?
        .ok_or_else(|| AppError::not_found(R::ENTITY, id))
}

/// Creates a record and reports its id.
pub(crate) async fn create<R: EntityRepository>(
    ctx: &Context,
    repo: &R,
    draft: &R::Draft,
) -> AppResult<()> {
    let id = repo.create(draft).await?;
    info!(entity = R::ENTITY, id, "Created");

    emit(ctx, &Created { id }, |c| println!("{} {} created", R::ENTITY, c.id))
}

/// Replaces a record.
pub(crate) async fn update<R: EntityRepository>(
    ctx: &Context,
    repo: &R,
    id: i64,
    draft: &R::Draft,
) -> AppResult<()> {
    repo.update(id, draft).await?;
    info!(entity = R::ENTITY, id, "Updated");

    emit(ctx, &Created { id }, |c| println!("{} {} updated", R::ENTITY, c.id))
}

/// Deletes a record, turning a refusal or a missing id into an error.
pub(crate) async fn delete<R: EntityRepository>(ctx: &Context, repo: &R, id: i64) -> AppResult<()> {
    match repo.delete(id).await? {
        DeleteOutcome::Deleted => emit(ctx, &DeleteOutcome::Deleted, |_| {
            println!("{} {} deleted", R::ENTITY, id)
        }),
        DeleteOutcome::Refused { reason } => Err(AppError::refused(R::ENTITY, id, &reason)),
        DeleteOutcome::NotFound => Err(AppError::not_found(R::ENTITY, id)),
    }
}

#[derive(Debug, Serialize)]
struct Created {
    id: i64,
}

/// Keeps `current` unless a replacement was given.
pub(crate) fn patch<T>(current: T, replacement: Option<T>) -> T {
    replacement.unwrap_or(current)
}

#[cfg(test)]
pub(crate) mod testing {
    use optica_db::{Database, DbConfig};

    use crate::config::AppConfig;
    use crate::Context;

    pub(crate) async fn context() -> Context {
        Context {
            db: Database::new(DbConfig::in_memory()).await.unwrap(),
            config: AppConfig::default(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use crate::error::ErrorCode;
    use optica_core::SupplierDraft;

    fn draft() -> SupplierDraft {
        SupplierDraft {
            name: "Opticolor".to_string(),
            contact: "Luis Pérez".to_string(),
            phone: "+56 2 2222 3333".to_string(),
            address: "San Diego 456".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generic_helpers() {
        let ctx = context().await;
        let repo = ctx.db.suppliers();

        create(&ctx, &repo, &draft()).await.unwrap();
        let supplier = fetch(&repo, 1).await.unwrap();
        assert_eq!(supplier.name, "Opticolor");

        delete(&ctx, &repo, 1).await.unwrap();
        let err = fetch(&repo, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = delete(&ctx, &repo, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_patch() {
        assert_eq!(patch("a".to_string(), None), "a");
        assert_eq!(patch(3, Some(4)), 4);
    }
}
