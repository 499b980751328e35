//! Configuration loaded from environment variables
//!
//! Binaries call `dotenv::dotenv()` before [`AppConfig::from_env`].

use crate::error::GuardianError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Upper bound for `GUARDIAN_DELAY_SCALE`
pub const MAX_DELAY_SCALE: f64 = 100.0;

/// Fixed durations of every simulated action.
#[derive(Debug, Clone, PartialEq)]
pub struct Delays {
    // Screens
    pub screen_default: Duration,
    pub screen_expenses: Duration,
    pub screen_trust: Duration,
    pub expenses_data: Duration,
    pub contacts_data: Duration,

    // Dashboard after sign-in
    pub balance: Duration,
    pub transactions: Duration,
    pub dashboard_data: Duration,

    // Authentication
    pub pin_check: Duration,
    pub biometric_check: Duration,
    pub pin_setup: Duration,
    pub biometric_skip: Duration,
    pub biometric_enable: Duration,
    pub logout: Duration,

    // Screen actions
    pub fraud_decision: Duration,
    pub toggle_contact: Duration,
    pub call_support: Duration,
    pub pause_decision: Duration,
    pub trusted_call_followup: Duration,
    pub add_document: Duration,
    pub create_goal: Duration,
    pub contribute: Duration,
    pub contact_service: Duration,

    // Voice assistant
    pub voice_listen: Duration,
    pub voice_process: Duration,
    pub voice_speak: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        let ms = Duration::from_millis;
        Self {
            screen_default: ms(1000),
            screen_expenses: ms(2000),
            screen_trust: ms(1500),
            expenses_data: ms(1000),
            contacts_data: ms(800),

            balance: ms(1500),
            transactions: ms(2000),
            dashboard_data: ms(2500),

            pin_check: ms(1500),
            biometric_check: ms(3000),
            pin_setup: ms(1000),
            biometric_skip: ms(800),
            biometric_enable: ms(2500),
            logout: ms(1000),

            fraud_decision: ms(2000),
            toggle_contact: ms(800),
            call_support: ms(2000),
            pause_decision: ms(2000),
            trusted_call_followup: ms(3000),
            add_document: ms(2000),
            create_goal: ms(2000),
            contribute: ms(2000),
            contact_service: ms(2000),

            voice_listen: ms(3000),
            voice_process: ms(1500),
            voice_speak: ms(3000),
        }
    }
}

impl Delays {
    /// Multiplies every delay by `factor` (0 makes every action resolve on the next tick).
    ///
    /// Products too large for a `Duration` saturate at `Duration::MAX`.
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        let scale = |d: Duration| {
            Duration::try_from_secs_f64(d.as_secs_f64() * factor).unwrap_or(Duration::MAX)
        };
        Self {
            screen_default: scale(self.screen_default),
            screen_expenses: scale(self.screen_expenses),
            screen_trust: scale(self.screen_trust),
            expenses_data: scale(self.expenses_data),
            contacts_data: scale(self.contacts_data),
            balance: scale(self.balance),
            transactions: scale(self.transactions),
            dashboard_data: scale(self.dashboard_data),
            pin_check: scale(self.pin_check),
            biometric_check: scale(self.biometric_check),
            pin_setup: scale(self.pin_setup),
            biometric_skip: scale(self.biometric_skip),
            biometric_enable: scale(self.biometric_enable),
            logout: scale(self.logout),
            fraud_decision: scale(self.fraud_decision),
            toggle_contact: scale(self.toggle_contact),
            call_support: scale(self.call_support),
            pause_decision: scale(self.pause_decision),
            trusted_call_followup: scale(self.trusted_call_followup),
            add_document: scale(self.add_document),
            create_goal: scale(self.create_goal),
            contribute: scale(self.contribute),
            contact_service: scale(self.contact_service),
            voice_listen: scale(self.voice_listen),
            voice_process: scale(self.voice_process),
            voice_speak: scale(self.voice_speak),
        }
    }
}

/// Simulated biometric sensor settings
#[derive(Debug, Clone, PartialEq)]
pub struct BiometricConfig {
    pub available: bool,
    /// Probability in `[0, 1]` that a verification attempt fails.
    pub failure_rate: f64,
}

impl Default for BiometricConfig {
    fn default() -> Self {
        Self {
            available: true,
            failure_rate: 0.1,
        }
    }
}

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API server port
    pub port: u16,
    /// JSON file backing the key-value store; in-memory when unset
    pub storage_path: Option<PathBuf>,
    pub delay_scale: f64,
    pub delays: Delays,
    pub biometric: BiometricConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            storage_path: None,
            delay_scale: 1.0,
            delays: Delays::default(),
            biometric: BiometricConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT").or_else(|_| env::var("API_PORT")) {
            Ok(raw) => parse_var("PORT", &raw)?,
            Err(_) => defaults.port,
        };

        let delay_scale = match env::var("GUARDIAN_DELAY_SCALE") {
            Ok(raw) => parse_var("GUARDIAN_DELAY_SCALE", &raw)?,
            Err(_) => defaults.delay_scale,
        };

        let available = match env::var("GUARDIAN_BIOMETRIC_AVAILABLE") {
            Ok(raw) => parse_var("GUARDIAN_BIOMETRIC_AVAILABLE", &raw)?,
            Err(_) => defaults.biometric.available,
        };

        let failure_rate = match env::var("GUARDIAN_BIOMETRIC_FAILURE_RATE") {
            Ok(raw) => parse_var("GUARDIAN_BIOMETRIC_FAILURE_RATE", &raw)?,
            Err(_) => defaults.biometric.failure_rate,
        };

        let storage_path = env::var("GUARDIAN_STORAGE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let mut config = Self {
            port,
            storage_path,
            delay_scale,
            delays: Delays::default(),
            biometric: BiometricConfig {
                available,
                failure_rate,
            },
        };

        config.validate()?;
        config.delays = config.delays.scaled(delay_scale);
        Ok(config)
    }

    /// Validate ranges; warns about settings that only make sense for demos
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.biometric.failure_rate) {
            return Err(GuardianError::ConfigError(format!(
                "GUARDIAN_BIOMETRIC_FAILURE_RATE must be within [0, 1], got {}",
                self.biometric.failure_rate
            )));
        }

        if !(0.0..=MAX_DELAY_SCALE).contains(&self.delay_scale) {
            return Err(GuardianError::ConfigError(format!(
                "GUARDIAN_DELAY_SCALE must be within [0, {}], got {}",
                MAX_DELAY_SCALE, self.delay_scale
            )));
        }

        if self.storage_path.is_none() {
            warn!("GUARDIAN_STORAGE_PATH not set - PIN and biometric settings are kept in memory");
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        GuardianError::ConfigError(format!("{} has an invalid value: '{}'", name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_match_the_prototype_timings() {
        let delays = Delays::default();
        assert_eq!(delays.screen_expenses, Duration::from_millis(2000));
        assert_eq!(delays.screen_trust, Duration::from_millis(1500));
        assert_eq!(delays.screen_default, Duration::from_millis(1000));
        assert_eq!(delays.toggle_contact, Duration::from_millis(800));
        assert_eq!(delays.biometric_check, Duration::from_millis(3000));
    }

    #[test]
    fn scaling_shrinks_every_delay() {
        let delays = Delays::default().scaled(0.5);
        assert_eq!(delays.screen_expenses, Duration::from_millis(1000));
        assert_eq!(delays.pin_check, Duration::from_millis(750));

        let instant = Delays::default().scaled(0.0);
        assert_eq!(instant.voice_listen, Duration::ZERO);
    }

    #[test]
    fn validate_rejects_out_of_range_failure_rate() {
        let mut config = AppConfig::default();
        config.biometric.failure_rate = 1.5;
        assert!(config.validate().is_err());

        config.biometric.failure_rate = 0.1;
        config.delay_scale = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unbounded_delay_scale() {
        let mut config = AppConfig::default();
        for scale in [f64::INFINITY, f64::NAN, 1e30, MAX_DELAY_SCALE + 1.0] {
            config.delay_scale = scale;
            assert!(
                matches!(config.validate(), Err(GuardianError::ConfigError(_))),
                "{}",
                scale
            );
        }

        config.delay_scale = MAX_DELAY_SCALE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_env_reports_infinite_scale_as_config_error() {
        env::set_var("GUARDIAN_DELAY_SCALE", "inf");
        let result = AppConfig::from_env();
        env::remove_var("GUARDIAN_DELAY_SCALE");

        assert!(matches!(result, Err(GuardianError::ConfigError(_))));
    }

    #[test]
    fn scaling_by_huge_factors_saturates() {
        let delays = Delays::default().scaled(f64::INFINITY);
        assert_eq!(delays.screen_default, Duration::MAX);

        let delays = Delays::default().scaled(1e30);
        assert_eq!(delays.voice_speak, Duration::MAX);

        let delays = Delays::default().scaled(f64::NAN);
        assert_eq!(delays.logout, Duration::ZERO);
    }
}
