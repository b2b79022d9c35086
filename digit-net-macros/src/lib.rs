//! Derive macros used by [digit-net](../digit_net/index.html).
//!
//! The crate only has one job right now, which is to cut the boilerplate out of the error enums
//! and of the initializer enum of the network.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

#[proc_macro_derive(FromForAllUnnamedVariants)]
/// Derives `From<T>` for every variant of the enum that wraps exactly one unnamed field of type
/// `T`.
///
/// Variants with named fields, unit variants and tuple variants with more than one field are
/// skipped, so an error enum can freely mix wrapped errors with its own descriptive variants.
///
/// Two variants wrapping the same type will produce conflicting implementations and fail to
/// compile, that is on purpose since the conversion would be ambiguous.
pub fn from_for_all_unnamed_variants(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let enum_name = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    let variants = match input.data {
        Data::Enum(ref enm) => &enm.variants,
        _ => panic!("The 'FromForAllUnnamedVariants' derive macro can only be used with enums!"),
    };

    let wrapping_variants = variants.iter().filter_map(|variant| match &variant.fields {
        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
            fields.unnamed.first().map(|field| (&variant.ident, &field.ty))
        }
        _ => None,
    });

    let implementations = wrapping_variants.map(|(variant_name, wrapped_type)| {
        quote! {
            impl #impl_generics From<#wrapped_type> for #enum_name #type_generics #where_clause {
                fn from(value: #wrapped_type) -> Self {
                    #enum_name::#variant_name(value)
                }
            }
        }
    });

    quote! {
        #(#implementations)*
    }
    .into()
}
