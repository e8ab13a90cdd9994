// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Error types raised while generating bindings.
//!
//! Every variant is a generation-time failure: nothing produced by this crate
//! can fail at runtime, because a failed generation never emits any source.

use std::path::PathBuf;

/// Convenience result type using [`GenerateError`] as the error variant.
pub type Result<T> = core::result::Result<T, GenerateError>;

/// Errors that abort binding generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The builder was asked to generate without any function descriptors.
    #[error("no function descriptors were provided")]
    MissingSpec,

    /// The descriptor file could not be read.
    #[error("reading spec {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor JSON is malformed.
    #[error("decoding spec: {0}")]
    Spec(#[from] serde_json::Error),

    /// A descriptor's signature text is not a well-formed function type.
    #[error("parse signature for {name}: {source}")]
    SignatureParse {
        name: String,
        #[source]
        source: SignatureError,
    },

    /// A descriptor name (or the library struct name) is not a usable identifier.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Two descriptors, or a descriptor and a generated helper, share a name.
    #[error("duplicate binding name {0:?}")]
    DuplicateName(String),

    /// A template could not render a binding.
    #[error("render {name}: {reason}")]
    Render { name: String, reason: String },
}

/// Reasons a signature text is rejected.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The text does not parse as a function pointer type.
    #[error("{0}")]
    Syntax(#[from] syn::Error),

    /// Only the C calling convention can be bound.
    #[error("unsupported calling convention \"{0}\"")]
    UnsupportedAbi(String),

    #[error("variadic functions cannot be bound")]
    Variadic,

    #[error("higher-ranked lifetimes are not allowed in a native signature")]
    HigherRanked,

    #[error("diverging functions cannot be bound")]
    Diverging,

    /// Two parameters end up with the same name.
    #[error("duplicate parameter name `{0}`")]
    DuplicateParameter(String),

    /// A parameter name is a keyword or otherwise unusable as an identifier.
    #[error("invalid parameter name `{0}`")]
    InvalidParameterName(String),
}
