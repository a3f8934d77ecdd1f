//! Per-session security-parameter configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A security parameter does not meet the requirements of the protocol stack.
///
/// These are fatal configuration errors, raised at construction and never
/// retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// The computational security parameter κ must be a power of two times 8
    /// bits (the extension matrices are transposed in κ×κ blocks).
    #[error("computational security parameter {kappa} must be 8 * 2^x bits")]
    InvalidComputationalParameter {
        /// The rejected κ.
        kappa: usize,
    },
    /// The statistical security parameter λ must be a positive multiple of 8.
    #[error("statistical security parameter {lambda} must be a positive multiple of 8 bits")]
    InvalidStatisticalParameter {
        /// The rejected λ.
        lambda: usize,
    },
}

/// The security parameters of one OT-extension session, shared read-only by
/// the sender and receiver roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    kappa: usize,
    lambda: usize,
}

impl Params {
    /// Validates and stores a computational parameter κ and a statistical
    /// parameter λ, both in bits.
    pub fn new(kappa: usize, lambda: usize) -> Result<Self, SetupError> {
        if kappa % 8 != 0 || kappa == 0 || !(kappa / 8).is_power_of_two() {
            return Err(SetupError::InvalidComputationalParameter { kappa });
        }
        if lambda % 8 != 0 || lambda == 0 {
            return Err(SetupError::InvalidStatisticalParameter { lambda });
        }
        Ok(Self { kappa, lambda })
    }

    /// The computational security parameter κ in bits.
    pub fn kappa(&self) -> usize {
        self.kappa
    }

    /// The statistical security parameter λ in bits, as configured.
    pub fn lambda(&self) -> usize {
        self.lambda
    }

    /// The inflated statistical parameter λ' used by the consistency check.
    ///
    /// The batched check loses a factor of roughly 2^(λ/2) over the ideal
    /// bound, so λ is inflated to 1.5·λ, rounded up to the next multiple
    /// of 8. The exact rounding (add 4 when λ is not divisible by 16) is kept
    /// for wire compatibility with existing deployments.
    pub fn lambda_adjusted(&self) -> usize {
        self.lambda + self.lambda / 2 + if self.lambda % 16 != 0 { 4 } else { 0 }
    }

    /// The number of extra instances added to each random-OT extension for
    /// the consistency check.
    pub(crate) fn check_overhead(&self) -> usize {
        self.kappa + self.lambda_adjusted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_standard_parameters() {
        let params = Params::new(128, 40).unwrap();
        assert_eq!(128, params.kappa());
        assert_eq!(40, params.lambda());
    }

    #[test]
    fn test_rejects_invalid_kappa() {
        for kappa in [0, 12, 24, 96] {
            assert_eq!(
                Err(SetupError::InvalidComputationalParameter { kappa }),
                Params::new(kappa, 40)
            );
        }
    }

    #[test]
    fn test_rejects_invalid_lambda() {
        for lambda in [0, 12, 42] {
            assert_eq!(
                Err(SetupError::InvalidStatisticalParameter { lambda }),
                Params::new(128, lambda)
            );
        }
    }

    #[test]
    fn test_lambda_adjustment_rounding() {
        // 1.5x, rounded up to a multiple of 8 with the +4 rule.
        assert_eq!(64, Params::new(128, 40).unwrap().lambda_adjusted());
        assert_eq!(96, Params::new(128, 64).unwrap().lambda_adjusted());
        assert_eq!(40, Params::new(128, 24).unwrap().lambda_adjusted());
        assert_eq!(120, Params::new(128, 80).unwrap().lambda_adjusted());
        for lambda in (8..256).step_by(8) {
            let adjusted = Params::new(128, lambda).unwrap().lambda_adjusted();
            assert_eq!(0, adjusted % 8);
            assert!(adjusted * 2 >= lambda * 3);
        }
    }
}
