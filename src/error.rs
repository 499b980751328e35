//! Error types for the Guardián Financiero application core

use crate::models::Screen;
use thiserror::Error;

/// Result type alias for application operations
pub type Result<T> = std::result::Result<T, GuardianError>;

#[derive(Error, Debug)]
pub enum GuardianError {

    // =============================
    // Authentication
    // =============================

    #[error("Biometric authentication is not available on this device")]
    BiometricUnavailable,

    #[error("Could not verify your identity. Try again or use your PIN")]
    BiometricFailed,

    #[error("Incorrect PIN. Try again")]
    PinMismatch,

    #[error("PINs do not match")]
    PinConfirmationMismatch,

    #[error("PIN must have at least {min} digits")]
    PinTooShort { min: usize },

    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("Login method not available: {0}")]
    MethodUnavailable(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Already authenticated")]
    AlreadyAuthenticated,

    // =============================
    // Navigation & Actions
    // =============================

    #[error("Action already in progress: {0}")]
    ActionPending(String),

    #[error("Cannot navigate from {from} to {to}")]
    InvalidTransition { from: Screen, to: Screen },

    #[error("Action '{action}' is not available on screen {screen}")]
    WrongScreen { action: String, screen: Screen },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Deferred action '{label}' failed: {reason}")]
    TaskFailed { label: String, reason: String },

    // =============================
    // Infrastructure
    // =============================

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GuardianError {
    /// Errors the login screen shows to the user and lets them retry.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            GuardianError::BiometricUnavailable
                | GuardianError::BiometricFailed
                | GuardianError::PinMismatch
                | GuardianError::PinConfirmationMismatch
                | GuardianError::PinTooShort { .. }
                | GuardianError::InvalidPin(_)
        )
    }
}
