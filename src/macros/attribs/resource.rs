use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use syn::parse::{Parse, ParseStream};
use syn::{parse_macro_input, Expr, ExprLit, Fields, ItemStruct, Lit, Meta, Token, Type};

struct ResourceAttribArgs(Vec<Meta>);
impl Parse for ResourceAttribArgs
{
    fn parse(input: ParseStream) -> syn::Result<Self>
    {
        let mut args = Vec::new();
        while !input.is_empty()
        {
            args.push(input.parse()?);
            if input.peek(Token![,])
            {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(ResourceAttribArgs(args))
    }
}

fn is_string_type(ty: &Type) -> bool
{
    let Type::Path(ty_path) = ty else { return false; };
    ty_path.path.segments.last().is_some_and(|seg| seg.ident == "String")
}

// Implement the Resource trait automatically.
// Attributes:
//  tag=<"literal" | CONST_EXPR> (required)
//  name_field=<ident> (optional, defaults to `name`)
pub fn resource_attrib(attrib_input: TokenStream, input: TokenStream) -> TokenStream
{
    let attrib_args = parse_macro_input!(attrib_input as ResourceAttribArgs);

    let mut maybe_tag = None;
    let mut maybe_name_field = None;

    for attrib in attrib_args.0.iter()
    {
        let Meta::NameValue(name_value) = attrib
            else { panic!("#[resource] Expected a name=value attribute, got {:?}", attrib.to_token_stream()) };

        if name_value.path.is_ident("tag")
        {
            if maybe_tag.is_some() { panic!("#[resource] tag specified multiple times"); }
            maybe_tag = Some(name_value.value.clone());
        }
        else if name_value.path.is_ident("name_field")
        {
            if maybe_name_field.is_some() { panic!("#[resource] name_field specified multiple times"); }
            let Expr::Path(path) = &name_value.value
                else { panic!("#[resource] name_field must be a field identifier"); };
            maybe_name_field = Some(path.path.get_ident().expect("#[resource] name_field must be a field identifier").clone());
        }
        else
        {
            panic!("#[resource] Invalid attribute: {:?}", name_value.path.to_token_stream());
        }
    }

    let Some(tag) = maybe_tag else { panic!("#[resource] missing required attribute tag=\"...\""); };

    let tag_expr = match &tag
    {
        Expr::Lit(ExprLit { lit: Lit::Str(lit), .. }) => quote!(::resource_kiln::ResourceTypeTag::new(#lit)),
        other => quote!(#other),
    };

    let strukt = parse_macro_input!(input as ItemStruct);
    let struct_name = strukt.ident.clone();
    let (impl_generics, ty_generics, where_clause) = strukt.generics.split_for_impl();

    let name_field = maybe_name_field.unwrap_or_else(|| syn::parse_str("name").unwrap());

    let Fields::Named(members) = &strukt.fields
        else { panic!("#[resource] can only be used on structs with named fields"); };
    match members.named.iter().find(|f| f.ident.as_ref() == Some(&name_field))
    {
        None => panic!("#[resource] {} has no field named `{}`", struct_name, name_field),
        Some(field) if !is_string_type(&field.ty) => panic!("#[resource] `{}` must be a String", name_field),
        Some(_) => { },
    }

    (quote!
    {
        #strukt
        impl #impl_generics ::resource_kiln::Resource for #struct_name #ty_generics #where_clause
        {
            fn resource_type() -> ::resource_kiln::ResourceTypeTag { #tag_expr }
            fn name(&self) -> &str { &self.#name_field }
        }
    }).into()
}
