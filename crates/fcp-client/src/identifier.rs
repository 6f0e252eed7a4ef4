//! Identifier generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generates the client-chosen identifiers correlating requests to replies.
///
/// The node echoes the identifier unchanged on every message belonging to a
/// request; uniqueness within one connection is all that matters, so a
/// random alphanumeric suffix is plenty.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentifierGenerator;

impl RandomIdentifierGenerator {
    /// Generate an identifier carrying a human-readable operation prefix.
    #[must_use]
    pub fn generate(prefix: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        format!("{prefix}-{suffix}")
    }
}
