//! Simulated biometric sensor

use crate::config::BiometricConfig;
use rand::Rng;

/// Trait for biometric verification
pub trait BiometricVerifier: Send + Sync {
    /// Whether the device exposes a biometric sensor at all
    fn is_available(&self) -> bool;

    /// One verification attempt
    fn verify(&self) -> bool;
}

/// Succeeds at random; no real verification happens.
pub struct SimulatedBiometric {
    available: bool,
    failure_rate: f64,
}

impl SimulatedBiometric {
    pub fn new(available: bool, failure_rate: f64) -> Self {
        Self {
            available,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &BiometricConfig) -> Self {
        Self::new(config.available, config.failure_rate)
    }
}

impl BiometricVerifier for SimulatedBiometric {
    fn is_available(&self) -> bool {
        self.available
    }

    fn verify(&self) -> bool {
        rand::thread_rng().gen::<f64>() >= self.failure_rate
    }
}

/// Always gives the same answer
pub struct FixedBiometric {
    pub available: bool,
    pub outcome: bool,
}

impl BiometricVerifier for FixedBiometric {
    fn is_available(&self) -> bool {
        self.available
    }

    fn verify(&self) -> bool {
        self.outcome
    }
}
