//! # Application Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Optica                                 │
//! │                                                                         │
//! │  optica sale --client 3 --item 4:9                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<(), AppError>                                            │  │
//! │  │         │                                                        │  │
//! │  │  Cart Error? ──── CoreError::InsufficientStock ────┐            │  │
//! │  │         │                                          │            │  │
//! │  │  Database Error? ─ DbError::ForeignKeyViolation ───┤            │  │
//! │  │         │                                          ▼            │  │
//! │  │  Refused delete? ─ DeleteOutcome::Refused ──── AppError ───────►│  │
//! │  │         │                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: error[INSUFFICIENT_STOCK]: Insufficient stock for ...         │
//! │  exit status: ErrorCode::exit_status()                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use optica_core::{CoreError, ValidationError};
use optica_db::DbError;
use serde::Serialize;

use crate::config::ConfigError;

/// Error reported by a command.
///
/// ## Serialization
/// With `--json`, this is what lands on stderr:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Client not found: 12"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes, one per failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record does not exist
    NotFound,

    /// Input rejected before any write
    ValidationError,

    /// Delete blocked by dependent records
    Refused,

    /// Cart stock ceiling hit
    InsufficientStock,

    /// Other cart rule (size, quantity)
    CartError,

    /// Stored value cannot be decoded
    CorruptedData,

    /// Database unavailable or a statement failed
    DatabaseError,

    /// Config file or environment is invalid
    ConfigError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Process exit status for this code.
    pub fn exit_status(self) -> u8 {
        match self {
            ErrorCode::ValidationError | ErrorCode::ConfigError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::Refused => 4,
            ErrorCode::InsufficientStock | ErrorCode::CartError => 5,
            ErrorCode::CorruptedData | ErrorCode::DatabaseError | ErrorCode::Internal => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Refused => "REFUSED",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::CorruptedData => "CORRUPTED_DATA",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    /// A delete blocked by a referential guard.
    pub fn refused(entity: &str, id: i64, reason: &str) -> Self {
        AppError::new(
            ErrorCode::Refused,
            format!("Cannot delete {} {}: {}", entity, id, reason),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to application errors.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => AppError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::Validation(e) => e.into(),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                AppError::validation("Invalid reference: a referenced record does not exist")
            }
            DbError::CorruptedData(reason) => AppError::new(ErrorCode::CorruptedData, reason),
            DbError::NotConnected => {
                AppError::new(ErrorCode::DatabaseError, "Database is not connected")
            }
            DbError::ConnectionFailed(e) => AppError::new(
                ErrorCode::DatabaseError,
                format!("Database connection failed: {}", e),
            ),
            DbError::MigrationFailed(e) => AppError::new(
                ErrorCode::DatabaseError,
                format!("Database migration failed: {}", e),
            ),
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                AppError::new(ErrorCode::DatabaseError, format!("Database operation failed: {}", e))
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                AppError::new(
                    ErrorCode::DatabaseError,
                    format!("Database transaction failed: {}", e),
                )
            }
            DbError::PoolExhausted => {
                AppError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to application errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock { .. } => {
                AppError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::NotInCart(_) => AppError::new(ErrorCode::CartError, err.to_string()),
            CoreError::CorruptedRecipe { .. } => {
                AppError::new(ErrorCode::CorruptedData, err.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}
