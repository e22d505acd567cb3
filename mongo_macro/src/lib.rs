extern crate proc_macro;

mod mongo_index_macro;
mod mongo_query_macro;

use proc_macro::TokenStream;

/// 根据 `#[mongo_index(...)]` 声明生成 `MongoIndexModelProvider` 实现
///
/// ```ignore
/// #[mongo_index(fields["email"], unique)]
/// #[mongo_index(fields["createdAt"], order = "desc")]
/// ```
#[proc_macro_derive(MongoIndexModelProvider, attributes(mongo_index))]
pub fn mongo_index_model_provider(input: TokenStream) -> TokenStream {
    mongo_index_macro::expand_index_model_provider(input)
}

/// 根据字段上的 `#[query(...)]` 生成 `to_query_doc()`
#[proc_macro_derive(QueryFilter, attributes(query))]
pub fn derive_query_filter(input: TokenStream) -> TokenStream {
    mongo_query_macro::derive_query_filter(input)
}
