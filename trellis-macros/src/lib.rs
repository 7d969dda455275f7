use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

/// Derives the `trellis::Flags` trait for a struct, turning `#[flag(...)]`
/// field attributes into flag registrations.
///
/// # Usage
///
/// ```ignore
/// #[derive(Flags)]
/// struct Download {
///     #[flag(name = "dry-run", usage = "do not mark files as archived")]
///     dry_run: bool,
///
///     #[flag(name = "from", usage = "start of the range (YYYY/MM/DD)")]
///     from: CustomDate,          // any FlagValue implementation
///
///     #[flag(flatten)]
///     base: Base,                // Base's flags merge into this namespace
///
///     #[flag(nest = "conn")]
///     conn: ConnFlags,           // ConnFlags register as conn.<name>
///
///     #[flag(name = "-")]
///     scratch: u64,              // explicitly excluded
///
///     cache: Vec<u8>,            // untagged fields are skipped
/// }
/// ```
///
/// Field types dispatch on their written name: `bool`, `i32`, `i64`, `u32`,
/// `u64`, `f64`, `String` and `Duration` use the typed registrations; every
/// other type goes through `FlagSet::var` and must implement
/// `trellis::FlagValue`. `#[flag(name = "...", custom)]` forces the
/// `FlagValue` path for a type whose written name collides with a primitive.
#[proc_macro_derive(Flags, attributes(flag))]
pub fn derive_flags(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

enum FlagAttr {
    Leaf {
        name: String,
        usage: String,
        custom: bool,
    },
    Flatten,
    Nest(String),
}

impl FlagAttr {
    fn from_attr(attr: &syn::Attribute) -> syn::Result<Self> {
        let mut name: Option<String> = None;
        let mut usage = String::new();
        let mut nest: Option<String> = None;
        let mut flatten = false;
        let mut custom = false;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("usage") {
                usage = meta.value()?.parse::<LitStr>()?.value();
            } else if meta.path.is_ident("nest") {
                nest = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("flatten") {
                flatten = true;
            } else if meta.path.is_ident("custom") {
                custom = true;
            } else {
                return Err(meta.error("unknown flag attribute"));
            }
            Ok(())
        })?;
        match (flatten, nest, name) {
            (true, None, None) if !custom && usage.is_empty() => Ok(FlagAttr::Flatten),
            (false, Some(prefix), None) if !custom && usage.is_empty() => {
                Ok(FlagAttr::Nest(prefix))
            }
            (false, None, Some(name)) => Ok(FlagAttr::Leaf {
                name,
                usage,
                custom,
            }),
            _ => Err(syn::Error::new_spanned(
                attr,
                "flag takes name (with optional usage and custom), flatten, or nest",
            )),
        }
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "Flags requires named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Flags can only be derived for structs",
            ))
        }
    };

    let mut stmts = Vec::new();
    for field in fields {
        let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("flag")) else {
            continue;
        };
        let field_ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "Flags requires named fields")
        })?;
        match FlagAttr::from_attr(attr)? {
            FlagAttr::Flatten => stmts.push(quote! {
                trellis::Flags::bind(&mut self.#field_ident, set, prefix)?;
            }),
            FlagAttr::Nest(nested) => stmts.push(quote! {
                trellis::Flags::bind(
                    &mut self.#field_ident,
                    set,
                    &trellis::FlagSet::qualify(prefix, #nested),
                )?;
            }),
            FlagAttr::Leaf {
                name,
                usage,
                custom,
            } => {
                // "-" (or an empty name) is the exclusion sentinel
                if name.is_empty() || name == "-" {
                    continue;
                }
                let method = if custom {
                    quote!(var)
                } else {
                    registration_method(&field.ty)
                };
                stmts.push(quote! {
                    set.#method(
                        &mut self.#field_ident,
                        &trellis::FlagSet::qualify(prefix, #name),
                        #usage,
                    )?;
                });
            }
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics trellis::Flags for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn bind<'a>(
                &'a mut self,
                set: &mut trellis::FlagSet<'a>,
                prefix: &str,
            ) -> ::core::result::Result<(), trellis::BindError> {
                #(#stmts)*
                Ok(())
            }
        }
    })
}

/// Pick the `FlagSet` registration method for a field's written type.
fn registration_method(ty: &Type) -> proc_macro2::TokenStream {
    let last = match ty {
        Type::Path(path) => path.path.segments.last().map(|seg| seg.ident.to_string()),
        _ => None,
    };
    match last.as_deref() {
        Some("bool") => quote!(bool_var),
        Some("i32") => quote!(int_var),
        Some("i64") => quote!(int64_var),
        Some("u32") => quote!(uint_var),
        Some("u64") => quote!(uint64_var),
        Some("f64") => quote!(float64_var),
        Some("String") => quote!(string_var),
        Some("Duration") => quote!(duration_var),
        _ => quote!(var),
    }
}
