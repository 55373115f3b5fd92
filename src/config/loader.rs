//! Config file loading.

use std::fs;
use std::path::Path;

use super::schema::UnlearnSpec;
use super::validate::validate_config;
use crate::error::{Error, Result};

/// Load, parse and validate a YAML run file.
///
/// # Example
///
/// ```no_run
/// use olvidar::config::load_config;
///
/// let spec = load_config("unlearn.yaml")?;
/// println!("final ratio: {}", spec.pruning.ratio());
/// # Ok::<(), olvidar::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<UnlearnSpec> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let spec = parse_config(&yaml)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(spec)
}

/// Parse and validate YAML text.
pub fn parse_config(yaml: &str) -> Result<UnlearnSpec> {
    let spec: UnlearnSpec = serde_yaml::from_str(yaml)
        .map_err(|e| Error::Config(format!("failed to parse YAML config: {e}")))?;
    validate_config(&spec).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
    Ok(spec)
}
