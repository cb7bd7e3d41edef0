#![forbid(unsafe_code)]

//! Unique element IDs for accessibility attributes (`aria-controls`,
//! `aria-labelledby`, ...).

use uuid::Uuid;

/// How IDs are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdGenerator {
    /// `"{prefix}-{uuid v4}"`.
    #[default]
    Random,
    /// `"test-{prefix}-123"`, for snapshot tests.
    Stable,
}

impl IdGenerator {
    /// Generate an ID with the given prefix.
    #[must_use]
    pub fn generate(self, prefix: &str) -> String {
        match self {
            Self::Random => format!("{prefix}-{}", Uuid::new_v4()),
            Self::Stable => format!("test-{prefix}-123"),
        }
    }
}

/// Random unique ID with the given prefix.
#[must_use]
pub fn unique_id(prefix: &str) -> String {
    IdGenerator::Random.generate(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_ids_are_fixed() {
        assert_eq!(IdGenerator::Stable.generate("menu"), "test-menu-123");
        assert_eq!(IdGenerator::Stable.generate(""), "test--123");
    }

    #[test]
    fn random_ids_are_prefixed_uuids() {
        let a = unique_id("tab");
        let b = unique_id("tab");
        assert_ne!(a, b);
        let suffix = a.strip_prefix("tab-").unwrap();
        let parsed = Uuid::parse_str(suffix).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }
}
