use std::time::{Duration, Instant};

use num_bigint::BigInt;
use num_traits::{Pow, Zero};
use tracing::{info, warn};

use crate::config::PiConfig;
use crate::errors::PiError;
use crate::pi::division::{long_divide, round_half_up, GUARD_DIGITS};
use crate::pi::partition::{parallel_series_sum, worker_count};
use crate::pi::series::C_ROOT;
use crate::pi::sqrt::scaled_sqrt;
use crate::utils::memory;

/// First twenty decimals of π, checked against every result.
pub const KNOWN_PREFIX: &str = "14159265358979323846";
/// Extra digits carried by the square root beyond the requested precision.
pub const SQRT_EXTRA_DIGITS: usize = 20;
/// Free memory (GiB) under which the post-series check warns.
const POST_SERIES_MEMORY_GB: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Mismatch { expected: String, actual: String },
}

#[derive(Debug, Clone)]
pub struct PiComputation {
    pub precision: usize,
    pub integer_part: BigInt,
    /// Exactly `precision` decimals after the point.
    pub digits: String,
    pub elapsed: Duration,
    pub terms: u64,
    pub workers: usize,
    pub verification: Verification,
}

impl PiComputation {
    pub fn computation_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn is_verified(&self) -> bool {
        self.verification == Verification::Verified
    }

    pub fn decimal_string(&self) -> String {
        format!("{}.{}", self.integer_part, self.digits)
    }
}

/// Series terms needed for `precision` digits (~14 digits per term).
pub fn estimate_terms(precision: usize, max_terms: u64) -> u64 {
    let base = (precision as u64 / 14).max(10);
    (base + 10).min(max_terms.max(1))
}

/// Series terms and the worker count they are split across, after clamping.
pub fn series_plan(config: &PiConfig, precision: usize) -> (u64, usize) {
    let terms = estimate_terms(precision, config.max_terms);
    (terms, worker_count(terms, config.workers))
}

/// Compares the leading decimals with the known value of π. Results shorter
/// than twenty digits are compared over their own length.
pub fn verify(digits: &str) -> Verification {
    let n = digits.len().min(KNOWN_PREFIX.len());
    if !digits.is_empty() && digits.as_bytes()[..n] == KNOWN_PREFIX.as_bytes()[..n] {
        Verification::Verified
    } else {
        Verification::Mismatch {
            expected: KNOWN_PREFIX[..n].to_string(),
            actual: digits.chars().take(n).collect(),
        }
    }
}

/// π to `precision` decimals:
/// `640320 * sqrt(640320) * S_den / (12 * S_num)` where `S_num / S_den` is the
/// merged series sum.
pub fn compute_pi(config: &PiConfig, precision: usize) -> Result<PiComputation, PiError> {
    let start = Instant::now();

    if precision == 0 {
        return Err(PiError::DegenerateInput("precision must be positive".into()));
    }
    let sqrt_precision = precision + SQRT_EXTRA_DIGITS;
    let widest = sqrt_precision.max(precision + 1 + GUARD_DIGITS);
    if widest > config.max_digit_str_len {
        return Err(PiError::ResourceExhaustion {
            operation: format!(
                "{} digits exceed the rendering limit of {}",
                widest, config.max_digit_str_len
            ),
            elapsed: start.elapsed(),
        });
    }
    let sqrt_exponent = u32::try_from(sqrt_precision).map_err(|_| PiError::ResourceExhaustion {
        operation: format!("scaling the square root to {} digits", sqrt_precision),
        elapsed: start.elapsed(),
    })?;

    let (terms, workers) = series_plan(config, precision);
    info!(precision, terms, workers, "starting Chudnovsky series");

    let (sum, workers) = parallel_series_sum(terms, workers)?;
    memory::warn_if_low(POST_SERIES_MEMORY_GB);
    if sum.numer().is_zero() {
        return Err(PiError::DegenerateInput("series sum is zero".into()));
    }

    info!(sqrt_precision, "computing scaled sqrt(640320)");
    let sqrt_val = scaled_sqrt(&BigInt::from(C_ROOT), sqrt_exponent)?;

    let (s_num, s_den) = sum.into_parts();
    let numerator = BigInt::from(C_ROOT) * sqrt_val * s_den;
    let denominator = BigInt::from(12u32) * s_num * Pow::pow(BigInt::from(10u32), sqrt_exponent);

    info!("running final long division");
    let expansion = long_divide(&numerator, &denominator, precision + 1)?;
    let rounded = round_half_up(&expansion.digits, precision)?;
    let integer_part = if rounded.carry_out {
        expansion.integer_part + 1u32
    } else {
        expansion.integer_part
    };

    let verification = verify(&rounded.digits);
    if let Verification::Mismatch { expected, actual } = &verification {
        warn!(%expected, %actual, "leading digits do not match the known value of pi");
    }

    let elapsed = start.elapsed();
    info!(precision, elapsed_s = elapsed.as_secs_f64(), "pi computed");

    Ok(PiComputation {
        precision,
        integer_part,
        digits: rounded.digits,
        elapsed,
        terms,
        workers,
        verification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    // digit 51 is 5, so the last kept digit rounds up
    const PI_50_ROUNDED: &str = "14159265358979323846264338327950288419716939937511";

    #[test]
    fn test_estimate_terms() {
        assert_eq!(estimate_terms(20, 100_000), 20);
        assert_eq!(estimate_terms(1_400, 100_000), 110);
        assert_eq!(estimate_terms(100_000, 100_000), 7_152);
        assert_eq!(estimate_terms(10_000_000, 100_000), 100_000);
    }

    #[test]
    fn test_series_plan_clamps_workers() {
        let cfg = PiConfig { workers: Some(64), ..PiConfig::default() };
        assert_eq!(series_plan(&cfg, 20), (20, 20));
        assert_eq!(series_plan(&cfg, 1_400), (110, 64));
        let one = PiConfig { workers: Some(1), ..PiConfig::default() };
        assert_eq!(series_plan(&one, 20), (20, 1));
    }

    #[test]
    fn test_stage_progress_logged_at_info() {
        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            compute_pi(&PiConfig { workers: Some(2), ..PiConfig::default() }, 20).unwrap();
        });

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        for stage in [
            "starting Chudnovsky series",
            "merging 2 partial sums",
            "computing scaled sqrt(640320)",
            "running final long division",
            "pi computed",
        ] {
            assert!(log.contains(stage), "missing {:?} in {}", stage, log);
        }
    }

    #[test]
    fn test_pi_20() {
        let pi = compute_pi(&PiConfig::default(), 20).unwrap();
        assert_eq!(pi.digits, KNOWN_PREFIX);
        assert_eq!(pi.integer_part, BigInt::from(3));
        assert!(pi.is_verified());
        assert_eq!(pi.decimal_string(), format!("3.{}", KNOWN_PREFIX));
    }

    #[test]
    fn test_pi_50() {
        let pi = compute_pi(&PiConfig::default(), 50).unwrap();
        assert_eq!(pi.digits, PI_50_ROUNDED);
    }

    #[test]
    fn test_rounding_applied() {
        // 3.14159|26535 rounds down, 3.1415926|535 rounds up
        let cfg = PiConfig::default();
        assert_eq!(compute_pi(&cfg, 5).unwrap().digits, "14159");
        assert_eq!(compute_pi(&cfg, 7).unwrap().digits, "1415927");
    }

    #[test]
    fn test_single_worker_matches_many() {
        let one = PiConfig { workers: Some(1), ..PiConfig::default() };
        let many = PiConfig { workers: Some(4), ..PiConfig::default() };
        let a = compute_pi(&one, 120).unwrap();
        let b = compute_pi(&many, 120).unwrap();
        assert_eq!(a.workers, 1);
        assert_eq!(b.workers, 4);
        assert_eq!(a.digits, b.digits);
    }

    #[test]
    fn test_zero_precision_rejected() {
        let err = compute_pi(&PiConfig::default(), 0).unwrap_err();
        assert!(matches!(err, PiError::DegenerateInput(_)));
    }

    #[test]
    fn test_rendering_limit_is_resource_exhaustion() {
        let cfg = PiConfig { max_digit_str_len: 50, ..PiConfig::default() };
        let err = compute_pi(&cfg, 40).unwrap_err();
        assert!(matches!(err, PiError::ResourceExhaustion { .. }));
    }

    #[test]
    fn test_verify_mismatch_is_tagged() {
        match verify("14159265358979323840") {
            Verification::Mismatch { expected, actual } => {
                assert_eq!(expected, KNOWN_PREFIX);
                assert_eq!(actual, "14159265358979323840");
            }
            Verification::Verified => panic!("mismatch not detected"),
        }
        assert_eq!(verify("1415"), Verification::Verified);
        assert!(matches!(verify(""), Verification::Mismatch { .. }));
    }
}
