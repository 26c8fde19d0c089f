//! Content fingerprints.

use std::hash::{DefaultHasher, Hash, Hasher};

/// A 64-bit content hash.
///
/// Fingerprints are only compared within a single process, so the
/// standard library hasher is sufficient. Nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint a piece of text.
    #[must_use]
    pub fn of_text(text: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Fingerprint any hashable value.
    #[must_use]
    pub fn of<T: Hash + ?Sized>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Combine two fingerprints in order.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self::of(&(self.0, other.0))
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_fingerprint() {
        assert_eq!(
            Fingerprint::of_text("type Query { a: Int }"),
            Fingerprint::of_text("type Query { a: Int }")
        );
        assert_ne!(
            Fingerprint::of_text("type Query { a: Int }"),
            Fingerprint::of_text("type Query { b: Int }")
        );
    }

    #[test]
    fn test_combine_is_ordered() {
        let a = Fingerprint::of_text("a");
        let b = Fingerprint::of_text("b");
        assert_ne!(a.combine(b), b.combine(a));
    }

    #[test]
    fn test_display_is_hex() {
        let text = Fingerprint::of_text("x").to_string();
        assert_eq!(text.len(), 16);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
