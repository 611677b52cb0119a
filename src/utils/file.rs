use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::PiError;
use crate::pi::chudnovsky::PiComputation;
use crate::utils::{hash::hash_digits, time::local_timestamp};

pub const VERIFICATION_FAILED_FILE: &str = "pi_verification_failed.txt";

/// Directory holding the running executable, or `.` if it cannot be resolved.
pub fn default_output_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `pi_<N>_digits.txt`, or the failure artifact name when verification failed.
pub fn result_file_name(result: &PiComputation) -> String {
    if result.is_verified() {
        format!("pi_{}_digits.txt", result.precision)
    } else {
        VERIFICATION_FAILED_FILE.to_string()
    }
}

pub fn save_pi_to_file(result: &PiComputation, dir: &Path, file_name: Option<&str>) -> Result<PathBuf, PiError> {
    fs::create_dir_all(dir)?;
    let name = file_name.map(str::to_string).unwrap_or_else(|| result_file_name(result));
    let path = dir.join(name);

    let mut out = BufWriter::new(File::create(&path)?);
    writeln!(out, "Pi to {} decimal places", result.precision)?;
    writeln!(out, "Computation time: {:.2} seconds", result.computation_seconds())?;
    writeln!(out, "Computed at: {}", local_timestamp())?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "{}", result.decimal_string())?;
    out.flush()?;

    info!(path = %path.display(), "result saved");
    Ok(path)
}

/// Writes `pi_<N>_digits.json` next to the text result.
pub fn save_summary_json(result: &PiComputation, dir: &Path) -> Result<PathBuf, PiError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("pi_{}_digits.json", result.precision));

    let json = serde_json::json!({
        "digits": result.precision,
        "terms": result.terms,
        "workers": result.workers,
        "elapsed_ms": result.elapsed.as_millis() as u64,
        "verified": result.is_verified(),
        "prefix": result.digits.chars().take(20).collect::<String>(),
        "sha256": hash_digits(&result.digits),
    });
    fs::write(&path, serde_json::to_string_pretty(&json).map_err(|e| PiError::Internal(e.to_string()))?)?;

    info!(path = %path.display(), "summary saved");
    Ok(path)
}
