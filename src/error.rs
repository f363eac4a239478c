//! Unified error type.
//!
//! Everything that can fail while building the route tree is a configuration
//! problem: the fix is editing the source tree or the module registrations
//! and restarting the process. There is no retry logic anywhere in this
//! crate and no partial success — either the whole tree builds or
//! initialization fails with one of these.

use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by arbor's fallible operations.
///
/// Request-level failures (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// build-time configuration problems and infrastructure failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Two model definitions landed on the same relative path. Model
    /// identity feeds persisted-schema identity, so ambiguity is rejected
    /// outright instead of merged.
    #[error("duplicate model at `{path}`: `{existing}` vs `{duplicate}`")]
    DuplicateModel {
        path: String,
        existing: String,
        duplicate: String,
    },

    /// A template file stem had more than one `.` separator.
    /// Valid stems are `name` or `name.role`.
    #[error("invalid template file name `{file}`")]
    InvalidTemplateName { file: PathBuf },

    /// A controller-declared sub-path starts with a segment that is also a
    /// child directory of the same node, so the two routes would shadow
    /// each other.
    #[error("controller path `{route}` at `{path}` collides with directory segment `{segment}`")]
    PathCollision {
        path: String,
        route: String,
        segment: String,
    },

    /// The scanner found a definition file but the owning module never
    /// registered a definition under the matching key.
    #[error("module `{module}` has no registered {kind} definition for `{key}`")]
    MissingDefinition {
        module: String,
        kind: &'static str,
        key: String,
    },

    /// An explicit controller action ended up with neither a handler
    /// function nor a resolvable template reference. The bound table must
    /// never contain a dangling entry, so this is caught at bind time.
    #[error("action `{action}` at `{path}` has no handler and no matching template")]
    UnresolvedAction { path: String, action: String },

    /// A top-level configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A directory that should have been readable was not. A *missing*
    /// directory is not an error — it simply contributes zero entries.
    #[error("cannot read `{path}`: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A model's sync hook reported failure during initialization.
    #[error("model `{model}` failed to sync: {reason}")]
    ModelSync { model: String, reason: String },

    /// The configured [`Renderer`](crate::Renderer) rejected a template.
    #[error("cannot render template `{name}`: {reason}")]
    Render { name: String, reason: String },

    /// Socket-level failure while binding or accepting.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
