// ============================================================
// Layer 3: Core Traits
// ============================================================
// The application layer loads examples through this trait, so a
// JSON file, an in-memory fixture or any future store can feed
// the same pipeline.

use crate::domain::example::RawExample;
use crate::error::Result;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce the ordered sequence of labelled examples.
///
/// Implementations:
///   - JsonExampleLoader → reads a JSON array file
///   - Vec<RawExample>   → in-memory fixtures
pub trait ExampleSource {
    /// Load every example in source order. Fails on the first
    /// structural problem; never skips records silently.
    fn load_all(&self) -> Result<Vec<RawExample>>;
}

impl ExampleSource for Vec<RawExample> {
    fn load_all(&self) -> Result<Vec<RawExample>> {
        Ok(self.clone())
    }
}
