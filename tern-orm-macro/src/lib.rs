//! # Tern ORM Macros
//!
//! Procedural macros for Tern ORM. `#[derive(Entity)]` reads a struct's fields at
//! compile time and generates the column list, value list and positional loader
//! the runtime uses in place of field reflection.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod derive_entity;
mod types;

/// Derives `tern_orm::Entity`.
///
/// Struct attribute:
/// * `#[orm(table = "name")]` - table name, defaults to the snake_case struct name.
///
/// Field attributes:
/// * `#[orm(model)]` - marks the identity block (implied for a field typed `Model`).
/// * `#[orm(default = "literal")]` - SQL default used when the column is added.
/// * `#[orm(skip)]` - never persist this field.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_entity::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
