//! Drift command handler.
//!
//! Implements the `drift` subcommand comparing a golden content repository
//! against a client repository.

use crate::config::DriftConfig;
use crate::diff::Drift;
use crate::pipeline::{compute_drift, exit_codes, load_index, output_report};
use crate::utils::CancellationToken;
use anyhow::Result;

/// Run the drift command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
pub fn run_drift(config: &DriftConfig, cancel: &CancellationToken) -> Result<i32> {
    let index = load_index(config)?;
    let drift = compute_drift(config, index, cancel)?;
    output_report(config, &drift)?;
    Ok(determine_exit_code(config, &drift))
}

/// Exit code from the drift result and the `fail_on_drift` flag.
fn determine_exit_code(config: &DriftConfig, drift: &Drift) -> i32 {
    if config.behavior.fail_on_drift && drift.has_drift() {
        exit_codes::DRIFT_DETECTED
    } else {
        exit_codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriftConfigBuilder;
    use crate::diff::LibraryContents;
    use crate::model::Library;

    fn config(fail_on_drift: bool) -> DriftConfig {
        DriftConfigBuilder::new()
            .baseline_path("golden".into())
            .target_path("client".into())
            .all_libraries(true)
            .fail_on_drift(fail_on_drift)
            .build()
            .unwrap()
    }

    #[test]
    fn test_exit_code_without_drift() {
        assert_eq!(determine_exit_code(&config(true), &Drift::new()), exit_codes::SUCCESS);
    }

    #[test]
    fn test_exit_code_with_drift() {
        let mut drift = Drift::new();
        drift
            .added_libraries
            .push(LibraryContents::new(Library::stub(uuid::Uuid::from_u128(1))));
        assert_eq!(determine_exit_code(&config(false), &drift), exit_codes::SUCCESS);
        assert_eq!(determine_exit_code(&config(true), &drift), exit_codes::DRIFT_DETECTED);
    }
}
