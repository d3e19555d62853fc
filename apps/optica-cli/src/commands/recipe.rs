//! # Prescription Commands
//!
//! Builds a [`RecipePayload`] from per-eye flags (or a raw `--payload` JSON)
//! and hands a [`PrescriptionDraft`] to the repository, which keeps only the
//! distances the diagnosis covers.

use chrono::Local;
use optica_core::{
    DistanceCorrection, EyeCorrection, Prescription, PrescriptionDraft, RecipePayload,
    ValidationError,
};
use optica_db::EntityRepository;
use serde::Serialize;

use super::{create, delete, update};
use crate::cli::{EyeArg, RecipeArgs, RecipeCommand};
use crate::error::{AppError, AppResult};
use crate::output::{emit, fit};
use crate::Context;

pub async fn run(ctx: &Context, command: RecipeCommand) -> AppResult<()> {
    let repo = ctx.db.prescriptions();

    match command {
        RecipeCommand::List { client } => {
            let records = match client {
                Some(client_id) => repo.list_for_client(client_id).await?,
                None => repo.list().await?,
            };
            emit(ctx, &records, |r| print_table(r))
        }
        RecipeCommand::Show { id } => {
            let (prescription, payload) = repo
                .get_with_payload(id)
                .await?
                .ok_or_else(|| AppError::not_found("Prescription", id))?;
            let detail = RecipeDetail {
                prescription,
                payload,
            };
            emit(ctx, &detail, print_detail)
        }
        RecipeCommand::Add(args) => create(ctx, &repo, &draft_from(args)?).await,
        RecipeCommand::Update { id, recipe } => update(ctx, &repo, id, &draft_from(recipe)?).await,
        RecipeCommand::Delete { id } => delete(ctx, &repo, id).await,
    }
}

#[derive(Debug, Serialize)]
struct RecipeDetail {
    prescription: Prescription,
    payload: RecipePayload,
}

// =============================================================================
// Draft Construction
// =============================================================================

fn draft_from(args: RecipeArgs) -> AppResult<PrescriptionDraft> {
    let recipe = match args.payload.as_deref() {
        Some(text) => {
            RecipePayload::decode(text).map_err(|e| AppError::validation(e.to_string()))?
        }
        None => RecipePayload {
            far: distance("far_dp", args.far_dp, args.far_od, args.far_oi)?,
            near: distance("near_dp", args.near_dp, args.near_od, args.near_oi)?,
        },
    };

    Ok(PrescriptionDraft {
        client_id: args.client,
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
        diagnosis: args.diagnosis,
        recipe,
        observations: args.observations,
    })
}

/// A distance exists once any of its flags is given; it then needs a `dp`.
fn distance(
    dp_field: &str,
    dp: Option<i64>,
    right: Option<EyeArg>,
    left: Option<EyeArg>,
) -> AppResult<Option<DistanceCorrection>> {
    if dp.is_none() && right.is_none() && left.is_none() {
        return Ok(None);
    }

    let pupillary_distance = dp.ok_or_else(|| ValidationError::required(dp_field))?;

    Ok(Some(DistanceCorrection {
        pupillary_distance,
        right_eye: right.map(eye).unwrap_or_default(),
        left_eye: left.map(eye).unwrap_or_default(),
    }))
}

fn eye(arg: EyeArg) -> EyeCorrection {
    EyeCorrection {
        sphere: arg.sphere,
        cylinder: arg.cylinder,
        axis: arg.axis,
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn print_table(records: &[Prescription]) {
    println!("{:>5}  {:>7}  {:<10}  {:<6}  {}", "ID", "CLIENT", "DATE", "DIAG", "OBSERVATIONS");
    for r in records {
        println!(
            "{:>5}  {:>7}  {:<10}  {:<6}  {}",
            r.id,
            r.client_id,
            r.date,
            r.diagnosis.as_str(),
            fit(&r.observations, 40)
        );
    }
    println!("{} prescription(s)", records.len());
}

fn print_detail(d: &RecipeDetail) {
    let p = &d.prescription;
    println!("Prescription #{} (client {})", p.id, p.client_id);
    println!("  Date:      {}", p.date);
    println!("  Diagnosis: {}", p.diagnosis);

    for (label, correction) in [("Lejos", &d.payload.far), ("Cerca", &d.payload.near)] {
        if let Some(c) = correction {
            println!("  {} (DP {} mm)", label, c.pupillary_distance);
            println!("           ESF      CIL      EJE");
            print_eye("OD", &c.right_eye);
            print_eye("OI", &c.left_eye);
        }
    }

    if !p.observations.is_empty() {
        println!("  Observations: {}", p.observations);
    }
}

fn print_eye(label: &str, e: &EyeCorrection) {
    println!("    {}     {:<8} {:<8} {}", label, e.sphere, e.cylinder, e.axis);
}
