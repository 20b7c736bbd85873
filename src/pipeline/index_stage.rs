//! Index loading stage.

use super::PipelineError;
use crate::config::DriftConfig;
use crate::index::ContentIndex;
use std::sync::Arc;

/// Load the content index the run resolves identities against.
pub fn load_index(config: &DriftConfig) -> Result<Arc<ContentIndex>, PipelineError> {
    let path = config.index_path();
    if !config.behavior.quiet {
        tracing::info!(path = %path.display(), "loading content index");
    }

    let index = ContentIndex::load(&path).map_err(|e| PipelineError::IndexLoadFailed {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    Ok(Arc::new(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriftConfigBuilder, IndexConfig};

    fn config(baseline: &std::path::Path) -> DriftConfig {
        DriftConfigBuilder::new()
            .baseline_path(baseline.to_path_buf())
            .target_path(baseline.to_path_buf())
            .all_libraries(true)
            .quiet(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_index_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_index(&config(dir.path())).unwrap_err();
        assert!(matches!(err, PipelineError::IndexLoadFailed { ref path, .. } if path.ends_with("index.yaml")));
    }

    #[test]
    fn test_explicit_index_path() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("custom.yaml");
        std::fs::write(&index, "entities:\n  1: 00000000-0000-0000-0000-000000000001\n").unwrap();
        let mut config = config(dir.path());
        config.index = IndexConfig { path: Some(index) };
        assert!(load_index(&config).is_ok());
    }
}
