// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Parsing of signature texts.
//!
//! Signatures are written in Rust's own function pointer grammar and parsed
//! with `syn`, so anything rustc accepts as `fn(..) -> ..` is accepted here,
//! minus the constructs a C export cannot have (variadics, foreign ABIs,
//! higher-ranked lifetimes, `!`).

use std::collections::HashSet;
use std::fmt;

use quote::ToTokens;
use serde::{Deserialize, Serialize};
use syn::{ReturnType, Type, TypeBareFn};

use crate::error::SignatureError;

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Canonical type text, e.g. `*const u8`.
    pub ty: String,
}

/// How a function hands back its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "types", rename_all = "snake_case")]
pub enum ResultShape {
    /// `fn(..)` or `fn(..) -> ()`.
    None,
    /// `fn(..) -> T`.
    Bare(String),
    /// `fn(..) -> (A, B)`, including the explicit one-tuple `(A,)`.
    Multiple(Vec<String>),
}

impl ResultShape {
    pub fn is_none(&self) -> bool {
        matches!(self, ResultShape::None)
    }
}

/// A parsed signature: parameters in declaration order plus the result shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSignature {
    pub params: Vec<Param>,
    pub result: ResultShape,
}

impl ParsedSignature {
    /// Parses a signature text.
    ///
    /// Unnamed parameters (and parameters named `_`) receive `arg0`, `arg1`,
    /// ... in order of appearance. A synthetic name never collides with an
    /// explicit one: taken names are skipped.
    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        let bare: TypeBareFn = syn::parse_str(text)?;

        if bare.lifetimes.is_some() {
            return Err(SignatureError::HigherRanked);
        }
        if bare.variadic.is_some() {
            return Err(SignatureError::Variadic);
        }
        if let Some(abi) = &bare.abi {
            if let Some(name) = &abi.name {
                let name = name.value();
                if name != "C" {
                    return Err(SignatureError::UnsupportedAbi(name));
                }
            }
        }

        let declared: Vec<Option<String>> = bare
            .inputs
            .iter()
            .map(|arg| {
                arg.name
                    .as_ref()
                    .map(|(ident, _)| ident.to_string())
                    .filter(|name| name != "_")
            })
            .collect();

        let mut taken = HashSet::new();
        for name in declared.iter().flatten() {
            if syn::parse_str::<syn::Ident>(name).is_err() {
                return Err(SignatureError::InvalidParameterName(name.clone()));
            }
            if !taken.insert(name.clone()) {
                return Err(SignatureError::DuplicateParameter(name.clone()));
            }
        }

        let mut next_synthetic = 0usize;
        let params = bare
            .inputs
            .iter()
            .zip(declared)
            .map(|(arg, name)| {
                let name = name.unwrap_or_else(|| loop {
                    let candidate = format!("arg{next_synthetic}");
                    next_synthetic += 1;
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                });
                Param {
                    name,
                    ty: canonical_type(&arg.ty),
                }
            })
            .collect();

        let result = match &bare.output {
            ReturnType::Default => ResultShape::None,
            ReturnType::Type(_, ty) => result_shape(ty)?,
        };

        Ok(Self { params, result })
    }

    /// Renders the signature back into canonical text.
    ///
    /// Synthetic parameter names are written out, so re-parsing the text
    /// yields an identical `ParsedSignature`.
    pub fn to_signature_text(&self) -> String {
        self.to_string()
    }

    /// Argument expressions forwarding every parameter, in order.
    pub fn forwarding_args(&self) -> Vec<String> {
        self.params.iter().map(|param| param.name.clone()).collect()
    }
}

impl fmt::Display for ParsedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
        }
        f.write_str(")")?;
        match &self.result {
            ResultShape::None => Ok(()),
            ResultShape::Bare(ty) => write!(f, " -> {ty}"),
            ResultShape::Multiple(types) if types.len() == 1 => write!(f, " -> ({},)", types[0]),
            ResultShape::Multiple(types) => write!(f, " -> ({})", types.join(", ")),
        }
    }
}

fn result_shape(ty: &Type) -> Result<ResultShape, SignatureError> {
    match ty {
        Type::Never(_) => Err(SignatureError::Diverging),
        Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(ResultShape::None),
        Type::Tuple(tuple) => Ok(ResultShape::Multiple(
            tuple.elems.iter().map(canonical_type).collect(),
        )),
        Type::Paren(paren) => result_shape(&paren.elem),
        other => Ok(ResultShape::Bare(canonical_type(other))),
    }
}

/// Prints a type the way it is usually written: `*const u8`, `std::ffi::c_int`.
///
/// Token printing inserts spaces after `*` and around `::`; both are
/// insignificant to the parser, so the canonical form re-parses to the same
/// tokens.
pub(crate) fn canonical_type(ty: &Type) -> String {
    ty.to_token_stream()
        .to_string()
        .replace(" :: ", "::")
        .replace("* ", "*")
}
