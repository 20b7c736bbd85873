//! YAML entity reader.

use super::EntityReader;
use crate::error::{DriftError, ReadErrorKind, Result};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Decodes entity documents with `serde_yaml_ng`.
pub struct YamlEntityReader<T> {
    _entity: PhantomData<fn() -> T>,
}

impl<T> YamlEntityReader<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<T> Default for YamlEntityReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> EntityReader<T> for YamlEntityReader<T> {
    fn parse_str(&self, content: &str) -> Result<T> {
        if content.trim().is_empty() {
            return Err(DriftError::read(
                "decoding entity",
                ReadErrorKind::InvalidYaml("empty document".to_string()),
            ));
        }
        serde_yaml_ng::from_str(content).map_err(|e| {
            DriftError::read("decoding entity", ReadErrorKind::InvalidYaml(e.to_string()))
        })
    }
}
