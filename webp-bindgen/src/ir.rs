// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! The intermediate representation handed to templates.
//!
//! A [`BindingUnit`] carries everything a template needs and nothing it has
//! to recompute: resolved symbols, synthetic parameter names, forwarding
//! expressions and the result shape. Templates never look at the raw
//! signature text.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    FunctionSpec, GenerateError, Result,
    signature::{Param, ParsedSignature, ResultShape},
};

/// Everything generated for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBinding {
    /// Callable name exposed by the generated code.
    pub name: String,
    /// Native symbol resolved at load time.
    pub symbol: String,
    pub optional: bool,
    pub params: Vec<Param>,
    /// Expressions forwarded to the native function, one per parameter.
    pub args: Vec<String>,
    pub result: ResultShape,
    pub has_return: bool,
}

impl GeneratedBinding {
    /// Canonical signature text this binding was generated from.
    pub fn signature_text(&self) -> String {
        ParsedSignature {
            params: self.params.clone(),
            result: self.result.clone(),
        }
        .to_signature_text()
    }

    /// Name of the generated capability query for optional bindings.
    pub fn capability_name(&self) -> String {
        format!("has_{}", self.name)
    }
}

/// The ordered bindings of one spec, plus the name of the struct holding them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingUnit {
    pub library_struct: String,
    pub bindings: Vec<GeneratedBinding>,
}

/// Names the Rust template emits on the library struct besides the bindings.
const RESERVED_NAMES: &[&str] = &["load", "is_bound", "BINDINGS"];

/// Compiles descriptors into bindings, preserving order.
///
/// Fails on the first descriptor that does not compile; no partial output
/// is ever returned.
pub fn compile(library_struct: &str, functions: &[FunctionSpec]) -> Result<BindingUnit> {
    check_ident(library_struct)?;

    let mut seen = HashSet::new();
    let mut bindings = Vec::with_capacity(functions.len());
    for function in functions {
        let binding = compile_one(function)?;
        if RESERVED_NAMES.contains(&binding.name.as_str()) || !seen.insert(binding.name.clone())
        {
            return Err(GenerateError::DuplicateName(binding.name));
        }
        tracing::debug!(
            name = %binding.name,
            symbol = %binding.symbol,
            optional = binding.optional,
            "compiled binding"
        );
        bindings.push(binding);
    }

    // Capability queries share the method namespace with the bindings.
    for binding in bindings.iter().filter(|b| b.optional) {
        let capability = binding.capability_name();
        if seen.contains(&capability) {
            return Err(GenerateError::DuplicateName(capability));
        }
    }

    Ok(BindingUnit {
        library_struct: library_struct.to_string(),
        bindings,
    })
}

fn compile_one(function: &FunctionSpec) -> Result<GeneratedBinding> {
    check_ident(&function.name)?;

    let symbol = function.native_symbol().to_string();
    if symbol.contains('\0') {
        return Err(GenerateError::InvalidName {
            name: symbol,
            reason: "symbol contains a NUL byte".to_string(),
        });
    }

    let signature = ParsedSignature::parse(&function.signature).map_err(|source| {
        GenerateError::SignatureParse {
            name: function.name.clone(),
            source,
        }
    })?;
    let args = signature.forwarding_args();
    let has_return = !signature.result.is_none();

    Ok(GeneratedBinding {
        name: function.name.clone(),
        symbol,
        optional: function.optional,
        params: signature.params,
        args,
        result: signature.result,
        has_return,
    })
}

fn check_ident(name: &str) -> Result<()> {
    syn::parse_str::<syn::Ident>(name)
        .map(|_| ())
        .map_err(|err| GenerateError::InvalidName {
            name: name.to_string(),
            reason: err.to_string(),
        })
}
