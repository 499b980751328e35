//! Authentication stub
//!
//! PIN compared against client-local storage, and a simulated biometric check.
//! There is no lockout and no real cryptography.

pub mod biometric;
pub mod storage;

pub use biometric::{BiometricVerifier, FixedBiometric, SimulatedBiometric};
pub use storage::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};

use crate::error::GuardianError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{BIOMETRIC_DISABLED, BIOMETRIC_ENABLED, BIOMETRIC_KEY, PIN_KEY};
use tracing::debug;

pub const PIN_MIN_LEN: usize = 4;
pub const PIN_MAX_LEN: usize = 6;

/// Keeps digits only and truncates to the maximum PIN length
pub fn sanitize_pin_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(PIN_MAX_LEN)
        .collect()
}

/// Checks a new PIN and its confirmation
pub fn validate_new_pin(pin: &str, confirmation: &str) -> Result<()> {
    if pin.len() < PIN_MIN_LEN {
        return Err(GuardianError::PinTooShort { min: PIN_MIN_LEN });
    }
    if pin.len() > PIN_MAX_LEN || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(GuardianError::InvalidPin(format!(
            "expected {} to {} digits",
            PIN_MIN_LEN, PIN_MAX_LEN
        )));
    }
    if pin != confirmation {
        return Err(GuardianError::PinConfirmationMismatch);
    }
    Ok(())
}

//
// ================= Stored credentials =================
//

/// Login settings read from storage at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CredentialFlags {
    pub has_pin: bool,
    pub biometric_enabled: bool,
}

/// Typed access to the two storage keys
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn KeyValueStore>,
}

impl Credentials {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn flags(&self) -> Result<CredentialFlags> {
        let has_pin = self.store.get(PIN_KEY).await?.is_some();
        let biometric_enabled =
            self.store.get(BIOMETRIC_KEY).await?.as_deref() == Some(BIOMETRIC_ENABLED);
        Ok(CredentialFlags {
            has_pin,
            biometric_enabled,
        })
    }

    pub async fn stored_pin(&self) -> Result<Option<String>> {
        self.store.get(PIN_KEY).await
    }

    /// Compares `candidate` with the stored PIN
    pub async fn verify_pin(&self, candidate: &str) -> Result<()> {
        match self.stored_pin().await? {
            Some(stored) if stored == candidate => Ok(()),
            _ => Err(GuardianError::PinMismatch),
        }
    }

    pub async fn save_pin(&self, pin: &str) -> Result<()> {
        debug!("Storing PIN");
        self.store.set(PIN_KEY, pin).await
    }

    pub async fn set_biometric(&self, enabled: bool) -> Result<()> {
        let value = if enabled { BIOMETRIC_ENABLED } else { BIOMETRIC_DISABLED };
        self.store.set(BIOMETRIC_KEY, value).await
    }
}

//
// ================= Login flow =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoginStep {
    Choose,
    Biometric,
    Pin,
    SetupPin,
    SetupBiometric,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Biometric,
    Pin,
    Setup,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Biometric => "biometric",
            LoginMethod::Pin => "pin",
            LoginMethod::Setup => "setup",
        }
    }
}

/// Outcomes of deferred login actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    PinRejected,
    PinStored,
    BiometricRejected(String),
    Failed(String),
}

/// State of the login screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFlow {
    step: LoginStep,
    #[serde(skip)]
    pin: String,
    #[serde(skip)]
    confirm_pin: String,
    reveal_pin: bool,
    error: Option<String>,
    flags: CredentialFlags,
}

impl LoginFlow {
    /// Without a stored PIN the flow starts in setup.
    pub fn new(flags: CredentialFlags) -> Self {
        let step = if flags.has_pin {
            LoginStep::Choose
        } else {
            LoginStep::SetupPin
        };
        Self {
            step,
            pin: String::new(),
            confirm_pin: String::new(),
            reveal_pin: false,
            error: None,
            flags,
        }
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn flags(&self) -> CredentialFlags {
        self.flags
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn confirm_pin(&self) -> &str {
        &self.confirm_pin
    }

    pub fn reveal_pin(&self) -> bool {
        self.reveal_pin
    }

    /// Methods offered on the choose step
    pub fn available_methods(&self) -> Vec<LoginMethod> {
        let mut methods = Vec::with_capacity(2);
        if self.flags.biometric_enabled {
            methods.push(LoginMethod::Biometric);
        }
        if self.flags.has_pin {
            methods.push(LoginMethod::Pin);
        } else {
            methods.push(LoginMethod::Setup);
        }
        methods
    }

    pub fn select(&mut self, method: LoginMethod) -> Result<()> {
        if !self.available_methods().contains(&method) {
            // The biometric screen offers PIN as a fallback even when it is not listed first.
            let fallback = method == LoginMethod::Pin && self.flags.has_pin;
            if !fallback {
                return Err(GuardianError::MethodUnavailable(method.as_str().to_string()));
            }
        }

        self.step = match method {
            LoginMethod::Biometric => LoginStep::Biometric,
            LoginMethod::Pin => LoginStep::Pin,
            LoginMethod::Setup => LoginStep::SetupPin,
        };
        self.pin.clear();
        self.confirm_pin.clear();
        self.error = None;
        Ok(())
    }

    pub fn back_to_choose(&mut self) {
        if self.flags.has_pin {
            self.step = LoginStep::Choose;
        }
        self.pin.clear();
        self.confirm_pin.clear();
        self.error = None;
    }

    pub fn set_pin_input(&mut self, raw: &str) {
        self.pin = sanitize_pin_input(raw);
    }

    pub fn set_confirm_input(&mut self, raw: &str) {
        self.confirm_pin = sanitize_pin_input(raw);
    }

    pub fn toggle_reveal(&mut self) {
        self.reveal_pin = !self.reveal_pin;
    }

    pub fn can_submit_pin(&self) -> bool {
        self.pin.len() >= PIN_MIN_LEN
    }

    pub fn can_submit_setup(&self) -> bool {
        self.pin.len() >= PIN_MIN_LEN && self.confirm_pin.len() >= PIN_MIN_LEN
    }

    pub fn apply(&mut self, event: LoginEvent) {
        match event {
            LoginEvent::PinRejected => {
                self.error = Some(GuardianError::PinMismatch.to_string());
                self.pin.clear();
            }
            LoginEvent::PinStored => {
                self.flags.has_pin = true;
                self.error = None;
                self.step = LoginStep::SetupBiometric;
            }
            LoginEvent::BiometricRejected(message) | LoginEvent::Failed(message) => {
                self.error = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn returning_user() -> LoginFlow {
        LoginFlow::new(CredentialFlags {
            has_pin: true,
            biometric_enabled: false,
        })
    }

    #[test]
    fn sanitize_keeps_six_digits() {
        assert_eq!(sanitize_pin_input("12a3-4 5678"), "123456");
        assert_eq!(sanitize_pin_input("abc"), "");
    }

    #[test]
    fn new_pin_must_have_four_digits() {
        assert!(matches!(
            validate_new_pin("123", "123"),
            Err(GuardianError::PinTooShort { min: 4 })
        ));
    }

    #[test]
    fn new_pin_must_match_confirmation() {
        assert!(matches!(
            validate_new_pin("1234", "1235"),
            Err(GuardianError::PinConfirmationMismatch)
        ));
        assert!(validate_new_pin("123456", "123456").is_ok());
    }

    #[test]
    fn new_pin_rejects_non_digits_and_long_values() {
        assert!(matches!(
            validate_new_pin("12ab", "12ab"),
            Err(GuardianError::InvalidPin(_))
        ));
        assert!(matches!(
            validate_new_pin("1234567", "1234567"),
            Err(GuardianError::InvalidPin(_))
        ));
    }

    #[test]
    fn first_run_starts_in_setup() {
        let flow = LoginFlow::new(CredentialFlags::default());
        assert_eq!(flow.step(), LoginStep::SetupPin);
        assert_eq!(flow.available_methods(), vec![LoginMethod::Setup]);
    }

    #[test]
    fn methods_follow_stored_flags() {
        let flow = LoginFlow::new(CredentialFlags {
            has_pin: true,
            biometric_enabled: true,
        });
        assert_eq!(flow.step(), LoginStep::Choose);
        assert_eq!(
            flow.available_methods(),
            vec![LoginMethod::Biometric, LoginMethod::Pin]
        );
    }

    #[test]
    fn biometric_cannot_be_selected_when_disabled() {
        let mut flow = returning_user();
        assert!(matches!(
            flow.select(LoginMethod::Biometric),
            Err(GuardianError::MethodUnavailable(_))
        ));
        assert_eq!(flow.step(), LoginStep::Choose);
    }

    #[test]
    fn rejected_pin_clears_input_and_keeps_step() {
        let mut flow = returning_user();
        flow.select(LoginMethod::Pin).unwrap();
        flow.set_pin_input("1111");
        assert!(flow.can_submit_pin());

        flow.apply(LoginEvent::PinRejected);
        assert_eq!(flow.step(), LoginStep::Pin);
        assert_eq!(flow.pin(), "");
        assert!(flow.error().is_some());
    }

    #[test]
    fn stored_pin_moves_to_biometric_setup() {
        let mut flow = LoginFlow::new(CredentialFlags::default());
        flow.set_pin_input("1234");
        flow.set_confirm_input("1234");
        assert!(flow.can_submit_setup());

        flow.apply(LoginEvent::PinStored);
        assert_eq!(flow.step(), LoginStep::SetupBiometric);
        assert!(flow.flags().has_pin);
    }

    #[tokio::test]
    async fn credentials_verify_against_store() {
        let store = Arc::new(InMemoryKeyValueStore::with_entries([(PIN_KEY, "9999")]));
        let credentials = Credentials::new(store);

        assert!(credentials.verify_pin("9999").await.is_ok());
        assert!(matches!(
            credentials.verify_pin("1111").await,
            Err(GuardianError::PinMismatch)
        ));

        let flags = credentials.flags().await.unwrap();
        assert!(flags.has_pin);
        assert!(!flags.biometric_enabled);
    }
}
