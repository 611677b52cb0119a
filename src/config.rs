use std::env;
use std::path::PathBuf;

/// Runtime knobs, read from the environment (after `dotenv`) and then
/// overridden by command-line flags.
#[derive(Clone, Debug, PartialEq)]
pub struct PiConfig {
    /// Worker count override; `None` uses the available parallelism.
    pub workers: Option<usize>,
    pub min_digits: usize,
    pub max_digits: usize,
    /// Requests above this ask for confirmation first.
    pub soft_limit: usize,
    pub default_digits: usize,
    pub max_terms: u64,
    /// Largest decimal rendering any stage may produce.
    pub max_digit_str_len: usize,
    pub output_dir: Option<PathBuf>,
    /// Lower bound for the pre-run memory threshold, in GiB.
    pub memory_warn_gb: f64,
}

impl Default for PiConfig {
    fn default() -> Self {
        Self {
            workers: None,
            min_digits: 20,
            max_digits: 100_000,
            soft_limit: 10_000,
            default_digits: 1_000,
            max_terms: 100_000,
            max_digit_str_len: 10_000_000,
            output_dir: None,
            memory_warn_gb: 1.0,
        }
    }
}

impl PiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source; unset or
    /// unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let parse_var = |name: &str, default: usize| {
            lookup(name)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(default)
        };

        let workers = lookup("PI_WORKERS")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0);

        let memory_warn_gb = lookup("PI_MEMORY_WARN_GB")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(defaults.memory_warn_gb);

        Self {
            workers,
            min_digits: parse_var("PI_MIN_DIGITS", defaults.min_digits),
            max_digits: parse_var("PI_MAX_DIGITS", defaults.max_digits),
            soft_limit: parse_var("PI_SOFT_LIMIT", defaults.soft_limit),
            default_digits: parse_var("PI_DEFAULT_DIGITS", defaults.default_digits),
            max_terms: parse_var("PI_MAX_TERMS", defaults.max_terms as usize) as u64,
            max_digit_str_len: parse_var("PI_MAX_DIGIT_STR_LEN", defaults.max_digit_str_len),
            output_dir: lookup("PI_OUTPUT_DIR").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
            memory_warn_gb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = PiConfig::from_lookup(|_| None);
        assert_eq!(cfg, PiConfig::default());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let cfg = PiConfig::from_lookup(lookup_from(&[
            ("PI_WORKERS", "3"),
            ("PI_MAX_DIGITS", "5000"),
            ("PI_OUTPUT_DIR", "/tmp/pi"),
            ("PI_MEMORY_WARN_GB", "0.25"),
        ]));
        assert_eq!(cfg.workers, Some(3));
        assert_eq!(cfg.max_digits, 5000);
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/tmp/pi")));
        assert_eq!(cfg.memory_warn_gb, 0.25);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = PiConfig::from_lookup(lookup_from(&[
            ("PI_WORKERS", "0"),
            ("PI_MIN_DIGITS", "twenty"),
            ("PI_MEMORY_WARN_GB", "-1"),
        ]));
        assert_eq!(cfg.workers, None);
        assert_eq!(cfg.min_digits, 20);
        assert_eq!(cfg.memory_warn_gb, 1.0);
    }
}
