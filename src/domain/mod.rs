// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the pipeline
// works on. No burn types, no file I/O.

/// A labelled résumé/job-posting pair and its label order
pub mod example;

/// Core abstractions other layers implement
pub mod traits;
