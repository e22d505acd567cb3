use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, DeriveInput, LitStr, Token};

struct IndexSpec {
    fields: Vec<String>,
    unique: bool,
    order: i32,
    name: Option<String>,
}

fn parse_index(attr: &syn::Attribute) -> syn::Result<IndexSpec> {
    let mut spec = IndexSpec { fields: vec![], unique: false, order: 1, name: None };
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("fields") {
            let content;
            syn::bracketed!(content in meta.input);
            let list = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
            spec.fields = list.iter().map(LitStr::value).collect();
        } else if meta.path.is_ident("unique") {
            spec.unique = true;
        } else if meta.path.is_ident("order") {
            let lit: LitStr = meta.value()?.parse()?;
            if lit.value().eq_ignore_ascii_case("desc") {
                spec.order = -1;
            }
        } else if meta.path.is_ident("name") {
            let lit: LitStr = meta.value()?.parse()?;
            spec.name = Some(lit.value());
        } else {
            return Err(meta.error("unsupported #[mongo_index(...)] attribute"));
        }
        Ok(())
    })?;
    if spec.fields.is_empty() {
        return Err(syn::Error::new_spanned(attr, "#[mongo_index] requires fields[...]"));
    }
    Ok(spec)
}

pub fn expand_index_model_provider(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let mut index_exprs = vec![];
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("mongo_index")) {
        let spec = match parse_index(attr) {
            Ok(spec) => spec,
            Err(e) => return e.to_compile_error().into(),
        };

        // 默认索引名：字段_方向，与 mongo shell 的命名规则一致
        let index_name = spec.name.unwrap_or_else(|| {
            spec.fields.iter().map(|f| format!("{}_{}", f, spec.order)).collect::<Vec<_>>().join("_")
        });
        let order = spec.order;
        let fields = &spec.fields;
        let unique = if spec.unique { quote! { .unique(true) } } else { quote! {} };

        index_exprs.push(quote! {
            {
                let mut keys = mongodb::bson::Document::new();
                #( keys.insert(#fields, #order); )*
                let options = mongodb::options::IndexOptions::builder()
                    .name(#index_name.to_string())
                    #unique
                    .build();
                mongodb::IndexModel::builder().keys(keys).options(options).build()
            }
        });
    }

    let gen = quote! {
        impl ::common::index_trait::MongoIndexModelProvider for #name {
            fn index_models() -> Vec<mongodb::IndexModel> {
                vec![
                    #(#index_exprs),*
                ]
            }
        }
    };

    gen.into()
}
