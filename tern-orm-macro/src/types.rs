use syn::{GenericArgument, PathArguments, Type};

/// Types stored as a single column. Everything else (references, smart
/// pointers, `Option`, functions, nested structs) is skipped.
const SCALARS: &[&str] = &[
    "String", "char", "bool", "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64",
];

/// Integer widths SQLite cannot store. A field of one of these types is an
/// error unless it is marked `#[orm(skip)]`.
const OVERSIZED: &[&str] = &["i128", "u128"];

/// Returns `true` if a field of type `ty` is persisted.
pub fn is_scalar(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    if type_path.qself.is_some() {
        return false;
    }
    let Some(segment) = type_path.path.segments.last() else {
        return false;
    };

    let name = segment.ident.to_string();
    match &segment.arguments {
        PathArguments::None => SCALARS.contains(&name.as_str()),
        // Vec<u8> is a byte string.
        PathArguments::AngleBracketed(args) if name == "Vec" && args.args.len() == 1 => {
            matches!(args.args.first(), Some(GenericArgument::Type(inner)) if is_named(inner, "u8"))
        }
        _ => false,
    }
}

/// Returns `true` if `ty` is an integer too wide for a storage column.
pub fn is_oversized(ty: &Type) -> bool {
    OVERSIZED.iter().any(|name| is_named(ty, name))
}

/// Returns `true` if `ty` is a plain path whose last segment is `name`.
pub fn is_named(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == name && matches!(s.arguments, PathArguments::None)),
        _ => false,
    }
}
