//! Error Types
//!
//! The main error type [`RenderError`] covers the failure modes of the frame
//! orchestrator: pass initialization, device object creation and invalid task
//! state. All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, RenderError>`.
//!
//! Per-frame conditions (missing materials, unready lookup tables, empty draw
//! lists) are deliberately *not* errors: they degrade to skipped work and a
//! `log::warn!`, never a failed frame.

use thiserror::Error;

/// The main error type for the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A rendering pass failed to initialize.
    ///
    /// This is fatal for the whole pipeline: a partially initialized pass
    /// table is not a supported state.
    #[error("Failed to initialize render pass '{pass}': {reason}")]
    PassInitFailed {
        /// Name of the failing pass.
        pass: &'static str,
        /// Backend-provided failure description.
        reason: String,
    },

    /// The GPU backend rejected a shader program creation request.
    #[error("Failed to create GPU program '{0}'")]
    ProgramCreateFailed(String),

    /// The GPU backend rejected a texture creation request.
    #[error("Failed to create GPU texture '{label}': {reason}")]
    TextureCreateFailed {
        /// Debug label of the requested texture.
        label: &'static str,
        /// Backend-provided failure description.
        reason: String,
    },

    /// Generic device failure reported by the backend.
    #[error("GPU device error: {0}")]
    Device(String),

    /// The render task describes a zero-sized or otherwise unusable output.
    #[error("Invalid render task: {0}")]
    InvalidTask(String),
}

/// Alias for `Result<T, RenderError>`.
pub type Result<T> = std::result::Result<T, RenderError>;
