//! # Prescription Payload
//!
//! The structured lens prescription stored on a [`Prescription`](crate::Prescription)
//! as JSON text.
//!
//! ## Stored Shape
//! ```text
//! {
//!   "lejos": { "dp": 62,                                    ← far vision
//!              "od": { "esf": "-1.25", "cil": "-0.50", "eje": "180" },
//!              "oi": { "esf": "-1.00", "cil": "",      "eje": ""    } },
//!   "cerca": { ... same shape ... }                         ← near vision
//! }
//! ```
//!
//! ## Decoding Rules
//! - Empty text decodes to an empty payload
//! - Missing keys decode to defaults (blank strings, `dp` at 40)
//! - Numeric `esf`/`cil`/`eje` values decode to their string form
//! - `dp` outside 40-80 is clamped into range
//! - Anything that is not a JSON object of this shape is [`CoreError::CorruptedRecipe`]

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Diagnosis;
use crate::validation::{validate_pupillary_distance, ValidationResult};
use crate::PUPILLARY_DISTANCE_RANGE;

// =============================================================================
// Payload Types
// =============================================================================

/// Far and near corrections. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePayload {
    #[serde(rename = "lejos", default, skip_serializing_if = "Option::is_none")]
    pub far: Option<DistanceCorrection>,

    #[serde(rename = "cerca", default, skip_serializing_if = "Option::is_none")]
    pub near: Option<DistanceCorrection>,
}

/// Correction for one viewing distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceCorrection {
    /// Pupillary distance in millimetres.
    #[serde(
        rename = "dp",
        default = "default_pupillary_distance",
        deserialize_with = "pupillary_distance"
    )]
    pub pupillary_distance: i64,

    /// Right eye (oculus dexter).
    #[serde(rename = "od", default)]
    pub right_eye: EyeCorrection,

    /// Left eye (oculus sinister).
    #[serde(rename = "oi", default)]
    pub left_eye: EyeCorrection,
}

impl Default for DistanceCorrection {
    fn default() -> Self {
        DistanceCorrection {
            pupillary_distance: default_pupillary_distance(),
            right_eye: EyeCorrection::default(),
            left_eye: EyeCorrection::default(),
        }
    }
}

/// Sphere, cylinder and axis for one eye, kept as the optometrist typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeCorrection {
    #[serde(rename = "esf", default, deserialize_with = "string_or_number")]
    pub sphere: String,

    #[serde(rename = "cil", default, deserialize_with = "string_or_number")]
    pub cylinder: String,

    #[serde(rename = "eje", default, deserialize_with = "string_or_number")]
    pub axis: String,
}

// =============================================================================
// Codec
// =============================================================================

impl RecipePayload {
    /// Decodes stored prescription text.
    ///
    /// ## Returns
    /// * `Ok(payload)` - Decoded, possibly empty
    /// * `Err(CoreError::CorruptedRecipe)` - The text is not a valid payload;
    ///   the caller must leave the stored record untouched
    pub fn decode(text: &str) -> CoreResult<Self> {
        if text.trim().is_empty() {
            return Ok(RecipePayload::default());
        }

        serde_json::from_str(text).map_err(|e| CoreError::CorruptedRecipe {
            reason: e.to_string(),
        })
    }

    /// Encodes the payload as JSON text for storage.
    pub fn encode(&self) -> String {
        // Only strings and integers: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Drops the distances the diagnosis does not cover.
    ///
    /// ```text
    /// Lejos → keep far only
    /// Cerca → keep near only
    /// Ambos → keep both
    /// ```
    pub fn retain_for(mut self, diagnosis: Diagnosis) -> Self {
        if !diagnosis.covers_far() {
            self.far = None;
        }
        if !diagnosis.covers_near() {
            self.near = None;
        }
        self
    }

    /// Checks every present distance has a valid pupillary distance.
    pub fn validate(&self) -> ValidationResult<()> {
        for correction in [&self.far, &self.near].into_iter().flatten() {
            validate_pupillary_distance(correction.pupillary_distance)?;
        }
        Ok(())
    }

    /// True when neither distance is recorded.
    pub fn is_empty(&self) -> bool {
        self.far.is_none() && self.near.is_none()
    }
}

// =============================================================================
// Serde Helpers
// =============================================================================

fn default_pupillary_distance() -> i64 {
    *PUPILLARY_DISTANCE_RANGE.start()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
    Null(()),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Int(n) => n.to_string(),
        Loose::Float(f) => f.to_string(),
        Loose::Text(s) => s,
        Loose::Null(()) => String::new(),
    })
}

fn pupillary_distance<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Loose::deserialize(deserializer)? {
        Loose::Int(n) => n,
        Loose::Float(f) => f.round() as i64,
        Loose::Text(s) if s.trim().is_empty() => default_pupillary_distance(),
        Loose::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("dp is not a number: {s:?}")))?,
        Loose::Null(()) => default_pupillary_distance(),
    };

    Ok(raw.clamp(
        *PUPILLARY_DISTANCE_RANGE.start(),
        *PUPILLARY_DISTANCE_RANGE.end(),
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================
