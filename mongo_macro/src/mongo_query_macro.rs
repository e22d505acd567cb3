use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

enum QueryOp {
    Eq,
    Gt,
    Lt,
    Like,
}

pub fn derive_query_filter(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = input.ident;
    let mut field_handlers = vec![];

    let data = match input.data {
        syn::Data::Struct(data) => data,
        _ => {
            return syn::Error::new(struct_name.span(), "QueryFilter only supports structs").to_compile_error().into();
        }
    };

    for field in data.fields {
        let field_ident = match &field.ident {
            Some(ident) => ident,
            None => continue,
        };

        let mut rename = field_ident.to_string();
        let mut query_ops = Vec::new();

        // 解析所有 #[query(...)] 属性
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("query")) {
            let res = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("eq") {
                    query_ops.push(QueryOp::Eq);
                } else if meta.path.is_ident("gt") {
                    query_ops.push(QueryOp::Gt);
                } else if meta.path.is_ident("lt") {
                    query_ops.push(QueryOp::Lt);
                } else if meta.path.is_ident("like") {
                    query_ops.push(QueryOp::Like);
                } else if meta.path.is_ident("field") {
                    let val: syn::LitStr = meta.value()?.parse()?;
                    rename = val.value();
                } else {
                    return Err(meta.error("Unsupported #[query(...)] attribute"));
                }
                Ok(())
            });

            if let Err(e) = res {
                return e.to_compile_error().into();
            }
        }

        for op in query_ops {
            // gt/lt 作用在同一字段上时需要合并进同一个子文档
            let handler = match op {
                QueryOp::Eq => quote! {
                    if let Some(val) = &self.#field_ident {
                        if let Ok(value) = mongodb::bson::to_bson(val) {
                            doc.insert(#rename, value);
                        }
                    }
                },
                QueryOp::Gt => quote! {
                    if let Some(val) = &self.#field_ident {
                        if let Ok(value) = mongodb::bson::to_bson(val) {
                            let mut range = doc.get_document(#rename).cloned().unwrap_or_default();
                            range.insert("$gt", value);
                            doc.insert(#rename, range);
                        }
                    }
                },
                QueryOp::Lt => quote! {
                    if let Some(val) = &self.#field_ident {
                        if let Ok(value) = mongodb::bson::to_bson(val) {
                            let mut range = doc.get_document(#rename).cloned().unwrap_or_default();
                            range.insert("$lt", value);
                            doc.insert(#rename, range);
                        }
                    }
                },
                QueryOp::Like => quote! {
                    if let Some(val) = &self.#field_ident {
                        doc.insert(#rename, ::common::util::query_util::contains_ci(val.as_ref()));
                    }
                },
            };
            field_handlers.push(handler);
        }
    }

    let expanded = quote! {
        impl #struct_name {
            pub fn to_query_doc(&self) -> mongodb::bson::Document {
                let mut doc = mongodb::bson::Document::new();
                #(#field_handlers)*
                doc
            }
        }
    };

    expanded.into()
}
