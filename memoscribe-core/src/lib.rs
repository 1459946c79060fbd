//! # Memoscribe Core
//!
//! Pure Rust reader for MP4-family voice memo containers. Walks the atom
//! tree, decodes the embedded metadata and transcript, and renders one
//! Markdown note per recording.

// ============================================================================
// Container Parsing
// ============================================================================
pub mod atom;
pub mod walker;

// ============================================================================
// Payload Decoding
// ============================================================================
pub mod metadata;

// ============================================================================
// Note Assembly
// ============================================================================
pub mod slug;
pub mod timestamp;
pub mod note;

// ============================================================================
// Orchestration
// ============================================================================
pub mod pipeline;

// ============================================================================
// Version
// ============================================================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
