use std::fmt::{self, Display, Formatter};
use std::io;
use std::time::Duration;

use crate::pi::series::TermRange;

#[derive(Debug)]
pub enum PiError {
    /// A big-integer stage would outgrow the configured limits.
    ResourceExhaustion { operation: String, elapsed: Duration },
    /// A partition worker terminated without a usable partial sum.
    WorkerFailure { range: TermRange, reason: String },
    /// A partition evaluation returned an error of its own.
    RangeFailed { range: TermRange, source: Box<PiError> },
    DegenerateInput(String),
    Cancelled,
    Internal(String),
    Io(io::Error),
}

impl Display for PiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PiError::ResourceExhaustion { operation, elapsed } => write!(
                f,
                "ResourceExhaustion: {} (after {:.2}s)",
                operation,
                elapsed.as_secs_f64()
            ),
            PiError::WorkerFailure { range, reason } => {
                write!(f, "WorkerFailure: range {} failed: {}", range, reason)
            }
            PiError::RangeFailed { range, source } => write!(f, "range {} failed: {}", range, source),
            PiError::DegenerateInput(msg) => write!(f, "DegenerateInput: {}", msg),
            PiError::Cancelled => write!(f, "Cancelled"),
            PiError::Internal(msg) => write!(f, "Internal: {}", msg),
            PiError::Io(e) => write!(f, "IO: {}", e),
        }
    }
}

impl PiError {
    /// True for `ResourceExhaustion`, including one raised inside a partition.
    pub fn is_resource_exhaustion(&self) -> bool {
        match self {
            PiError::ResourceExhaustion { .. } => true,
            PiError::RangeFailed { source, .. } => source.is_resource_exhaustion(),
            _ => false,
        }
    }
}

impl std::error::Error for PiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PiError::Io(e) => Some(e),
            PiError::RangeFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for PiError {
    fn from(value: io::Error) -> Self { PiError::Io(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_failure_names_range() {
        let range = TermRange::new(4, 9).unwrap();
        let err = PiError::WorkerFailure { range, reason: "panicked".into() };
        assert_eq!(err.to_string(), "WorkerFailure: range [4, 9] failed: panicked");
    }

    #[test]
    fn test_range_failure_keeps_its_cause() {
        let range = TermRange::new(0, 3).unwrap();
        let err = PiError::RangeFailed {
            range,
            source: Box::new(PiError::ResourceExhaustion {
                operation: "factorial growth".into(),
                elapsed: Duration::from_millis(1_500),
            }),
        };
        assert_eq!(
            err.to_string(),
            "range [0, 3] failed: ResourceExhaustion: factorial growth (after 1.50s)"
        );
        assert!(err.is_resource_exhaustion());
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "ResourceExhaustion: factorial growth (after 1.50s)");
        assert!(!PiError::Cancelled.is_resource_exhaustion());
    }

    #[test]
    fn test_io_error_converts() {
        let err: PiError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, PiError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
