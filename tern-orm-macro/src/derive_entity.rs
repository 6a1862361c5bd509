use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Fields, LitStr};

use crate::types::{is_named, is_oversized, is_scalar};

/// Expands the `#[derive(Entity)]` macro.
///
/// This function parses the struct fields and `#[orm(...)]` attributes to generate:
/// 1. `Column` metadata for each persisted field, in declaration order.
/// 2. The `impl Entity` block with `table`, `model`, `columns`, `values` and `load`.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new(ast.span(), "Entity must have named fields")),
        },
        _ => return Err(syn::Error::new(ast.span(), "Entity must be a struct")),
    };

    // Parse struct-level #[orm(table = "...")]
    let mut table = struct_name.to_string().to_snake_case();
    for attr in &ast.attrs {
        if attr.path().is_ident("orm") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let value: LitStr = meta.value()?.parse()?;
                    table = value.value();
                    Ok(())
                } else {
                    Err(meta.error("unknown orm attribute on struct, expected `table`"))
                }
            })?;
        }
    }

    let mut model_field = None;
    let mut persisted = Vec::new();

    for f in fields {
        let Some(field_name) = &f.ident else { continue };

        let mut is_model = is_named(&f.ty, "Model");
        let mut skip = false;
        let mut default = None;

        // Parse attributes #[orm(...)]
        for attr in &f.attrs {
            if attr.path().is_ident("orm") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("model") {
                        is_model = true;
                    } else if meta.path.is_ident("skip") {
                        skip = true;
                    } else if meta.path.is_ident("default") {
                        let value: LitStr = meta.value()?.parse()?;
                        default = Some(value.value());
                    } else {
                        return Err(meta.error("unknown orm attribute, expected `model`, `skip` or `default`"));
                    }
                    Ok(())
                })?;
            }
        }

        if is_model {
            if model_field.replace(field_name).is_some() {
                return Err(syn::Error::new(f.span(), "Entity has more than one identity field"));
            }
            continue;
        }

        if skip {
            continue;
        }
        if is_oversized(&f.ty) {
            return Err(syn::Error::new(
                f.ty.span(),
                "128-bit integers do not fit a storage column; use a 64-bit type or mark the field `#[orm(skip)]`",
            ));
        }
        if !is_scalar(&f.ty) {
            continue;
        }

        let column = field_name.to_string();
        let column = column.strip_prefix("r#").unwrap_or(&column).to_string();
        persisted.push((field_name, &f.ty, column, default));
    }

    let Some(model_field) = model_field else {
        return Err(syn::Error::new(
            struct_name.span(),
            "Entity needs an identity field of type `Model` (or marked `#[orm(model)]`)",
        ));
    };

    let column_defs = persisted.iter().map(|(_, ty, column, default)| {
        let default_tokens = match default {
            Some(literal) => quote! { Some(#literal) },
            None => quote! { None },
        };
        quote! {
            tern_orm::Column {
                name: #column,
                kind: <#ty as tern_orm::Scalar>::KIND,
                default: #default_tokens,
            }
        }
    });

    let value_exprs = persisted.iter().map(|(field_name, _, _, _)| {
        quote! { tern_orm::Scalar::to_value(&self.#field_name) }
    });

    let load_stmts = persisted.iter().enumerate().map(|(i, (field_name, ty, _, _))| {
        quote! { self.#field_name = row.get::<#ty>(offset + #i)?; }
    });

    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics tern_orm::Entity for #struct_name #ty_generics #where_clause {
            fn table() -> &'static str {
                #table
            }

            fn model(&self) -> &tern_orm::Model {
                &self.#model_field
            }

            fn model_mut(&mut self) -> &mut tern_orm::Model {
                &mut self.#model_field
            }

            fn columns() -> Vec<tern_orm::Column> {
                vec![#(#column_defs),*]
            }

            fn values(&self) -> Vec<tern_orm::Value> {
                vec![#(#value_exprs),*]
            }

            #[allow(unused_variables)]
            fn load(&mut self, row: &tern_orm::Row<'_>, offset: usize) -> tern_orm::Result<()> {
                #(#load_stmts)*
                Ok(())
            }
        }
    })
}
