use crate::coerce::CoercionMode;

/// Per-type record configuration
///
/// Attached to a model type through its [`ModelMeta`](crate::ModelMeta) and
/// shared by every record of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    /// Whether freshly constructed records start with change tracking on
    pub track_changes: bool,

    /// How raw row values are normalized into declared kinds
    pub coercion: CoercionMode,
}

impl ModelConfig {
    pub fn new() -> Self {
        Self {
            track_changes: true,
            coercion: CoercionMode::Lenient,
        }
    }

    /// Set the initial change tracking flag of fresh records
    pub fn track_changes(mut self, enabled: bool) -> Self {
        self.track_changes = enabled;
        self
    }

    /// Set the coercion mode
    pub fn coercion(mut self, mode: CoercionMode) -> Self {
        self.coercion = mode;
        self
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ModelConfig::new()
            .track_changes(false)
            .coercion(CoercionMode::Strict);

        assert!(!config.track_changes);
        assert_eq!(config.coercion, CoercionMode::Strict);
    }

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert!(config.track_changes);
        assert_eq!(config.coercion, CoercionMode::Lenient);
    }
}
