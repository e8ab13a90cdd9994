// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! # webp-bindgen: binding generator for dynamically loaded libwebp
//!
//! Turns a declarative list of function descriptors into Rust source exposing
//! one typed, forwarding method per descriptor on a library struct whose
//! function pointers are resolved from a dynamically loaded library.
//!
//! ## Pipeline
//!
//! ```text
//! spec.json ──► Spec ──► compile() ──► BindingUnit ──► Template ──► source
//!                         (syn)          (IR, serde)     (quote)
//! ```
//!
//! Signatures are written in Rust's function pointer grammar
//! (`fn(data: *const u8, data_size: usize) -> c_int`) and parsed with `syn`.
//! The resulting [`BindingUnit`] is independent of the output syntax; any
//! [`Template`] can render it.
//!
//! ## Usage from a build script
//!
//! ```no_run
//! # fn main() -> Result<(), webp_bindgen::GenerateError> {
//! let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR").unwrap());
//! webp_bindgen::builder()
//!     .spec_file("spec.json")
//!     .library_struct("LibWebp")
//!     .generate()?
//!     .write_to_file(out_dir.join("bindings.rs"))
//!     .expect("Could not write bindings");
//! # Ok(())
//! # }
//! ```

mod error;
mod ir;
mod spec;
mod template;

pub mod signature;

use std::{fmt, path::PathBuf};

pub use error::{GenerateError, Result, SignatureError};
pub use ir::{BindingUnit, GeneratedBinding, compile};
pub use signature::{Param, ParsedSignature, ResultShape};
pub use spec::{FunctionSpec, Spec};
pub use template::{IrJsonTemplate, RustTemplate, Template};

/// Starts configuring a generation run.
pub fn builder() -> Builder {
    Builder::default()
}

#[derive(Debug, Clone)]
enum SpecSource {
    File(PathBuf),
    Json(String),
    Functions(Vec<FunctionSpec>),
}

/// Configures and runs one generation.
#[derive(Debug, Clone)]
pub struct Builder {
    spec: Option<SpecSource>,
    library_struct: String,
    runtime_path: String,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            spec: None,
            library_struct: "Library".to_string(),
            runtime_path: "crate".to_string(),
        }
    }
}

impl Builder {
    /// Reads descriptors from a JSON spec file.
    pub fn spec_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec = Some(SpecSource::File(path.into()));
        self
    }

    /// Reads descriptors from JSON text.
    pub fn spec_json(mut self, json: impl Into<String>) -> Self {
        self.spec = Some(SpecSource::Json(json.into()));
        self
    }

    /// Uses descriptors built in code.
    pub fn functions(mut self, functions: Vec<FunctionSpec>) -> Self {
        self.spec = Some(SpecSource::Functions(functions));
        self
    }

    /// Name of the generated struct holding the function pointers.
    pub fn library_struct(mut self, name: impl Into<String>) -> Self {
        self.library_struct = name.into();
        self
    }

    /// Path under which the generated code finds `NativeLibrary`,
    /// `SymbolError` and `BindingInfo`. Only used by [`RustTemplate`].
    pub fn runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Parses and compiles the descriptors without rendering them.
    pub fn compile(&self) -> Result<BindingUnit> {
        let functions = match &self.spec {
            None => return Err(GenerateError::MissingSpec),
            Some(SpecSource::File(path)) => Spec::from_file(path)?.functions,
            Some(SpecSource::Json(json)) => Spec::from_json(json)?.functions,
            Some(SpecSource::Functions(functions)) => functions.clone(),
        };
        compile(&self.library_struct, &functions)
    }

    /// Generates Rust source with [`RustTemplate`].
    pub fn generate(self) -> Result<Bindings> {
        let template = RustTemplate::new().runtime_path(self.runtime_path.clone());
        self.generate_with(&template)
    }

    /// Generates source with any template.
    pub fn generate_with(self, template: &dyn Template) -> Result<Bindings> {
        let unit = self.compile()?;
        let source = template.render(&unit)?;
        tracing::debug!(
            library = %unit.library_struct,
            bindings = unit.bindings.len(),
            "generated bindings"
        );
        Ok(Bindings { unit, source })
    }
}

/// The output of one generation run.
#[derive(Debug, Clone)]
pub struct Bindings {
    unit: BindingUnit,
    source: String,
}

impl Bindings {
    /// The intermediate representation the source was rendered from.
    pub fn unit(&self) -> &BindingUnit {
        &self.unit
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Writes the rendered source to `path`, replacing any existing file.
    pub fn write_to_file(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.source)
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
