// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Rendering of a [`BindingUnit`] into source text.
//!
//! The renderer is the only part of the generator that knows about the
//! target syntax. [`RustTemplate`] is what `webp-sys` builds with;
//! [`IrJsonTemplate`] dumps the intermediate representation for inspection.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::{
    BindingUnit, GenerateError, GeneratedBinding, Result, signature::ResultShape,
};

/// Turns a binding unit into one source unit.
pub trait Template {
    fn render(&self, unit: &BindingUnit) -> Result<String>;
}

const HEADER: &str = "// Generated by webp-bindgen. Do not edit.\n\n";

/// Emits a Rust library struct holding one public, typed function pointer
/// per binding, a `load` constructor resolving them, and one forwarding
/// method per binding.
///
/// The fields are public so a pointer can be handed back to the library,
/// e.g. `WebPMemoryWrite` as a picture's writer callback.
///
/// The emitted code refers to `NativeLibrary`, `SymbolError` and
/// `BindingInfo` under [`RustTemplate::runtime_path`], `crate` by default.
#[derive(Debug, Clone)]
pub struct RustTemplate {
    runtime_path: String,
}

impl Default for RustTemplate {
    fn default() -> Self {
        Self {
            runtime_path: "crate".to_string(),
        }
    }
}

impl RustTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path of the module providing the runtime seam types.
    pub fn runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }
}

impl Template for RustTemplate {
    fn render(&self, unit: &BindingUnit) -> Result<String> {
        let runtime: syn::Path =
            syn::parse_str(&self.runtime_path).map_err(|err| GenerateError::Render {
                name: self.runtime_path.clone(),
                reason: err.to_string(),
            })?;
        let lib = format_ident!("{}", unit.library_struct);
        let lib_name = unit.library_struct.as_str();

        let mut output_structs = Vec::new();
        let mut fields = Vec::new();
        let mut loads = Vec::new();
        let mut idents = Vec::new();
        let mut infos = Vec::new();
        let mut bound_arms = Vec::new();
        let mut methods = Vec::new();

        for binding in &unit.bindings {
            let tokens = BindingTokens::new(binding)?;
            let ident = &tokens.ident;
            let fn_ty = &tokens.fn_ty;
            let name = binding.name.as_str();
            let symbol = binding.symbol.as_str();
            let optional = binding.optional;

            if let Some(output) = tokens.output_struct.clone() {
                output_structs.push(output);
            }

            let transmute = quote! {
                |__address| unsafe {
                    ::core::mem::transmute::<*const ::core::ffi::c_void, #fn_ty>(__address)
                }
            };
            if optional {
                fields.push(quote! { pub #ident: ::core::option::Option<#fn_ty> });
                loads.push(quote! {
                    let #ident = unsafe { __library.resolve(#symbol) }.ok().map(#transmute);
                });
                bound_arms.push(quote! { #name => Some(self.#ident.is_some()), });
            } else {
                fields.push(quote! { pub #ident: #fn_ty });
                loads.push(quote! {
                    let #ident = unsafe { __library.resolve(#symbol) }.map(#transmute)?;
                });
                bound_arms.push(quote! { #name => Some(true), });
            }
            idents.push(ident.clone());
            infos.push(quote! {
                #runtime::BindingInfo { name: #name, symbol: #symbol, optional: #optional }
            });
            methods.push(tokens.method(binding));
        }

        let struct_doc = format!(
            " Dynamically loaded entry points, {} bindings.",
            unit.bindings.len()
        );
        let tokens = quote! {
            #(#output_structs)*

            #[doc = #struct_doc]
            pub struct #lib {
                __library: ::std::boxed::Box<dyn #runtime::NativeLibrary>,
                #(#fields,)*
            }

            #[allow(clippy::too_many_arguments)]
            impl #lib {
                /// Every binding in declaration order.
                pub const BINDINGS: &'static [#runtime::BindingInfo] = &[#(#infos),*];

                /// Resolves every symbol from `__library`.
                ///
                /// Fails on the first mandatory symbol that cannot be resolved.
                /// Optional symbols that cannot be resolved are left unbound.
                ///
                /// # Safety
                ///
                /// Every resolved symbol must have the signature it was declared with.
                pub unsafe fn load(
                    __library: ::std::boxed::Box<dyn #runtime::NativeLibrary>,
                ) -> ::core::result::Result<Self, #runtime::SymbolError> {
                    #(#loads)*
                    Ok(Self { __library, #(#idents),* })
                }

                /// Whether the binding called `name` is bound, or `None` if no
                /// such binding exists.
                pub fn is_bound(&self, name: &str) -> ::core::option::Option<bool> {
                    match name {
                        #(#bound_arms)*
                        _ => None,
                    }
                }

                #(#methods)*
            }

            impl ::core::fmt::Debug for #lib {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    f.debug_struct(#lib_name)
                        .field("bindings", &Self::BINDINGS.len())
                        .finish_non_exhaustive()
                }
            }
        };

        Ok(format!("{HEADER}{tokens}\n"))
    }
}

/// Token fragments shared between the field, loader and method of a binding.
struct BindingTokens {
    ident: proc_macro2::Ident,
    params: Vec<TokenStream>,
    args: Vec<syn::Expr>,
    fn_ty: TokenStream,
    /// Return type of the Rust-side method, without `Option` wrapping.
    wrapper_ret: Option<TokenStream>,
    /// Tuple indices to destructure a multi-value output struct.
    output_fields: Option<Vec<syn::Index>>,
    output_struct: Option<TokenStream>,
}

impl BindingTokens {
    fn new(binding: &GeneratedBinding) -> Result<Self> {
        let ident = format_ident!("{}", binding.name);
        let params = binding
            .params
            .iter()
            .map(|param| {
                let name = format_ident!("{}", param.name);
                let ty = parse_type(binding, &param.ty)?;
                Ok(quote! { #name: #ty })
            })
            .collect::<Result<Vec<_>>>()?;
        let args = binding
            .args
            .iter()
            .map(|arg| {
                syn::parse_str::<syn::Expr>(arg).map_err(|err| GenerateError::Render {
                    name: binding.name.clone(),
                    reason: format!("argument `{arg}`: {err}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (native_ret, wrapper_ret, output_fields, output_struct) = match &binding.result {
            ResultShape::None => (quote! {}, None, None, None),
            ResultShape::Bare(ty) => {
                let ty = parse_type(binding, ty)?;
                (quote! { -> #ty }, Some(quote! { #ty }), None, None)
            }
            ResultShape::Multiple(types) => {
                let types = types
                    .iter()
                    .map(|ty| parse_type(binding, ty))
                    .collect::<Result<Vec<_>>>()?;
                let output = format_ident!("{}Output", upper_camel_case(&binding.name));
                let doc = format!(" Results of `{}`, returned by value.", binding.symbol);
                let output_struct = quote! {
                    #[doc = #doc]
                    #[repr(C)]
                    pub struct #output(#(pub #types),*);
                };
                let indices = (0..types.len()).map(syn::Index::from).collect();
                (
                    quote! { -> #output },
                    Some(quote! { (#(#types,)*) }),
                    Some(indices),
                    Some(output_struct),
                )
            }
        };

        let fn_ty = quote! { unsafe extern "C" fn(#(#params),*) #native_ret };

        Ok(Self {
            ident,
            params,
            args,
            fn_ty,
            wrapper_ret,
            output_fields,
            output_struct,
        })
    }

    /// Converts a raw call expression into the wrapper's return value.
    fn finish(&self, call: TokenStream) -> TokenStream {
        match &self.output_fields {
            Some(indices) => quote! {{
                let __out = unsafe { #call };
                (#(__out.#indices,)*)
            }},
            None => quote! { unsafe { #call } },
        }
    }

    fn method(&self, binding: &GeneratedBinding) -> TokenStream {
        let ident = &self.ident;
        let params = &self.params;
        let args = &self.args;

        if binding.optional {
            let capability = format_ident!("{}", binding.capability_name());
            let doc = format!(
                " Calls `{}`, or returns `None` if the loaded library does not export it.",
                binding.symbol
            );
            let capability_doc = format!(" Whether `{}` was found at load time.", binding.symbol);
            let value = self.finish(quote! { __f(#(#args),*) });
            let ret = match &self.wrapper_ret {
                Some(ret) => quote! { ::core::option::Option<#ret> },
                None => quote! { ::core::option::Option<()> },
            };
            quote! {
                #[doc = #doc]
                ///
                /// # Safety
                ///
                /// Arguments must satisfy the native function's contract.
                #[inline]
                pub unsafe fn #ident(&self, #(#params),*) -> #ret {
                    self.#ident.map(|__f| #value)
                }

                #[doc = #capability_doc]
                #[inline]
                pub fn #capability(&self) -> bool {
                    self.#ident.is_some()
                }
            }
        } else {
            let doc = format!(" Calls `{}`.", binding.symbol);
            let value = self.finish(quote! { (self.#ident)(#(#args),*) });
            let ret = self.wrapper_ret.as_ref().map(|ret| quote! { -> #ret });
            quote! {
                #[doc = #doc]
                ///
                /// # Safety
                ///
                /// Arguments must satisfy the native function's contract.
                #[inline]
                pub unsafe fn #ident(&self, #(#params),*) #ret {
                    #value
                }
            }
        }
    }
}

fn parse_type(binding: &GeneratedBinding, ty: &str) -> Result<syn::Type> {
    syn::parse_str(ty).map_err(|err| GenerateError::Render {
        name: binding.name.clone(),
        reason: format!("type `{ty}`: {err}"),
    })
}

/// `decode_yuv_into` → `DecodeYuvInto`
fn upper_camel_case(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Emits the [`BindingUnit`] itself as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrJsonTemplate;

impl Template for IrJsonTemplate {
    fn render(&self, unit: &BindingUnit) -> Result<String> {
        serde_json::to_string_pretty(unit).map_err(|err| GenerateError::Render {
            name: unit.library_struct.clone(),
            reason: err.to_string(),
        })
    }
}
