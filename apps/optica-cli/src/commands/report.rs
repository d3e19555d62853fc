//! # Report Commands
//!
//! Date-range history, the monthly sales report and the seller list.

use chrono::{Datelike, Local, NaiveDate};
use optica_core::{MonthlyReport, TransactionKind, TransactionSummary};

use crate::cli::{HistoryArgs, ReportArgs};
use crate::error::AppResult;
use crate::output::{emit, fit, pesos};
use crate::Context;

/// Transactions of one kind between two dates, newest first.
pub async fn history(ctx: &Context, args: HistoryArgs) -> AppResult<()> {
    let today = Local::now().date_naive();
    let (from, to) = history_window(args.from, args.to, today);

    let rows = ctx
        .db
        .reports()
        .transactions_by_date(args.kind, from, to)
        .await?;

    emit(ctx, &rows, |r| print_history(args.kind, r))
}

/// Missing bounds default to the current month so far.
fn history_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let first_of_month = today.with_day(1).unwrap_or(today);
    (from.unwrap_or(first_of_month), to.unwrap_or(today))
}

fn print_history(kind: TransactionKind, rows: &[TransactionSummary]) {
    let counterpart = match kind {
        TransactionKind::Sale => "CLIENT",
        TransactionKind::Purchase => "SUPPLIER",
    };
    println!(
        "{:>5}  {:<10}  {:<30}  {:<14}  {:>12}",
        "ID", "DATE", counterpart, "SELLER", "TOTAL"
    );
    for r in rows {
        println!(
            "{:>5}  {:<10}  {:<30}  {:<14}  {:>12}",
            r.id,
            r.date,
            fit(&r.counterpart, 30),
            fit(r.seller.as_deref().unwrap_or("-"), 14),
            pesos(r.total)
        );
    }
    let total: i64 = rows.iter().map(|r| r.total).sum();
    println!("{} {}(s), {}", rows.len(), kind, pesos(total));
}

/// Sales of one month, optionally for a single seller.
pub async fn monthly(ctx: &Context, args: ReportArgs) -> AppResult<()> {
    let today = Local::now().date_naive();
    let year = args.year.unwrap_or_else(|| today.year());
    let month = args.month.unwrap_or_else(|| today.month());

    let report = ctx
        .db
        .reports()
        .sales_by_month(year, month, args.seller.as_deref())
        .await?;

    emit(ctx, &report, |r| print_monthly(&ctx.config.shop.name, r))
}

fn print_monthly(shop: &str, report: &MonthlyReport) {
    println!("{}", shop);
    match &report.seller {
        Some(seller) => println!("Sales {:04}-{:02}, seller {}", report.year, report.month, seller),
        None => println!("Sales {:04}-{:02}", report.year, report.month),
    }
    println!();
    println!(
        "{:>5}  {:<10}  {:<30}  {:<14}  {:>12}",
        "ID", "DATE", "CLIENT", "SELLER", "TOTAL"
    );
    for r in &report.rows {
        println!(
            "{:>5}  {:<10}  {:<30}  {:<14}  {:>12}",
            r.id,
            r.date,
            fit(&r.client, 30),
            fit(&r.seller, 14),
            pesos(r.total)
        );
    }
    println!("{:>76}", format!("Total: {}", pesos(report.total)));
}

/// Distinct sellers that have recorded a sale.
pub async fn sellers(ctx: &Context) -> AppResult<()> {
    let names = ctx.db.reports().sellers().await?;
    emit(ctx, &names, |n| {
        for name in n {
            println!("{}", name);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::context;
    use crate::error::ErrorCode;
    use optica_core::{ClientDraft, LedgerLine, NewSale, ProductDraft};
    use optica_db::EntityRepository;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn with_sales() -> Context {
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
            .products()
            .create(&ProductDraft {
                name: "Lente".to_string(),
                category: "Cristal".to_string(),
                brand: "Zeiss".to_string(),
                stock: 20,
                cost_price: 10_000,
                sale_price: 30_000,
            })
            .await
            .unwrap();

        let ledger = ctx.db.ledger();
        for (seller, day) in [("Marta", 3), ("Jorge", 10), ("Marta", 28)] {
            ledger
                .create_sale(&NewSale {
                    client_id: 1,
                    seller: seller.to_string(),
                    total: 30_000,
                    date: Some(date(2024, 2, day)),
                    lines: vec![LedgerLine {
                        product_id: 1,
                        quantity: 1,
                        unit_price: 30_000,
                    }],
                })
                .await
                .unwrap();
        }
        ctx
    }

    #[test]
    fn test_history_window_defaults() {
        let today = date(2024, 5, 17);
        assert_eq!(history_window(None, None, today), (date(2024, 5, 1), today));

        let from = date(2024, 1, 1);
        assert_eq!(history_window(Some(from), None, today), (from, today));
    }

    #[tokio::test]
    async fn test_history_and_report_commands() {
        let ctx = with_sales().await;

        history(
            &ctx,
            HistoryArgs {
                kind: TransactionKind::Sale,
                from: Some(date(2024, 2, 1)),
                to: Some(date(2024, 2, 29)),
            },
        )
        .await
        .unwrap();

        monthly(
            &ctx,
            ReportArgs {
                year: Some(2024),
                month: Some(2),
                seller: Some("Marta".to_string()),
            },
        )
        .await
        .unwrap();

        sellers(&ctx).await.unwrap();

        let report = ctx
            .db
            .reports()
            .sales_by_month(2024, 2, Some("Marta"))
            .await
            .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total, 60_000);
    }

    #[tokio::test]
    async fn test_bad_month_is_validation_error() {
        let ctx = context().await;

        let err = monthly(
            &ctx,
            ReportArgs {
                year: Some(2024),
                month: Some(13),
                seller: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
