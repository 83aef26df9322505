use std::collections::BTreeMap;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

pub fn fancy_enum(input: proc_macro::TokenStream) -> proc_macro::TokenStream
{
    let derive = parse_macro_input!(input as DeriveInput);
    let type_name = &derive.ident;

    let variants = if let Data::Enum(ref data_enum) = derive.data
    {
        &data_enum.variants
    }
    else
    {
        panic!("#[derive(FancyEnum)] can only be used with enums");
    };

    let mut variants_idents = Vec::new();
    let mut unit_variants = Vec::new();
    // sorted so the generated code is stable between builds
    let mut props = BTreeMap::new();

    for variant in variants
    {
        let variant_ident = &variant.ident;

        variants_idents.push(match variant.fields
        {
            Fields::Named(_) => quote!(Self::#variant_ident{..} => stringify!(#variant_ident)),
            Fields::Unnamed(_) => quote!(Self::#variant_ident(..) => stringify!(#variant_ident)),
            Fields::Unit =>
            {
                unit_variants.push(quote!(Self::#variant_ident));
                quote!(Self::#variant_ident => stringify!(#variant_ident))
            },
        });

        for attr in &variant.attrs
        {
            if !attr.path().is_ident("enum_prop") { continue; }

            attr.parse_nested_meta(|meta|
            {
                let prop_key = meta.path.get_ident().ok_or(meta.error("Missing property key"))?;
                let prop_val: LitStr = meta.value()?.parse()?;

                let prop = props.entry(prop_key.to_string()).or_insert((prop_key.clone(), Vec::<proc_macro2::TokenStream>::new()));
                prop.1.push(match variant.fields
                {
                    Fields::Named(_) => quote!(Self::#variant_ident{..} => Some(#prop_val)),
                    Fields::Unnamed(_) => quote!(Self::#variant_ident(..) => Some(#prop_val)),
                    Fields::Unit => quote!(Self::#variant_ident => Some(#prop_val)),
                });

                Ok(())
            }).expect("Failed to parse enum_prop");
        }
    }

    let methods = props.values().map(|(prop_key, prop_values)|
    {
        quote!
        {
            pub const fn #prop_key(&self) -> Option<&'static str>
            {
                match self
                {
                    #(#prop_values,)*
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }
    });

    let variants_count = variants_idents.len();

    // ALL only makes sense if every variant can be named without data
    let all_variants = match unit_variants.len() == variants_count
    {
        true => quote!(pub const ALL: [Self; #variants_count] = [#(#unit_variants),*];),
        false => quote!(),
    };

    let expanded = quote!
    {
        impl #type_name
        {
            #all_variants

            pub const fn variant_name(&self) -> &'static str
            {
                match self
                {
                    #(#variants_idents),*
                }
            }

            pub const fn variant_count() -> usize
            {
                #variants_count
            }

            #(#methods)*
        }
    };

    expanded.into()
}
