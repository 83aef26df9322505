use proc_macro::TokenStream;
use derives::fancy_enum;
use attribs::resource;

mod derives;
mod attribs;

// FancyEnum adds .variant_name(), ::ALL (unit enums only) and for each #[enum_prop(k=v)] a method k() returning v
#[proc_macro_derive(FancyEnum, attributes(enum_prop))]
pub fn derive_fancy_enum(input: TokenStream) -> TokenStream
{
    fancy_enum::fancy_enum(input)
}

// Implements resource_kiln::Resource for a struct with a `name: String` field
#[proc_macro_attribute]
pub fn resource(attrib_input: TokenStream, input: TokenStream) -> TokenStream { resource::resource_attrib(attrib_input, input) }
