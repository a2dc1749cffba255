extern crate proc_macro;

use proc_macro::TokenStream;
use syn::parse_macro_input;

use crate::workflow_suite::WorkflowSuite;

mod constructor;
mod hooks;
mod test_case;
mod workflow_suite;

/// Turns an `impl` block into a runnable workflow suite.
///
/// See `edu_hub_runner` for the supported method attributes.
#[proc_macro_attribute]
pub fn workflow_suite(attr: TokenStream, item: TokenStream) -> TokenStream {
    let suite_name = parse_macro_input!(attr as syn::Lit);
    let input = parse_macro_input!(item as syn::ItemImpl);
    workflow_suite_impl(suite_name, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn workflow_suite_impl(
    suite_name: syn::Lit,
    input: syn::ItemImpl,
) -> syn::Result<proc_macro2::TokenStream> {
    let suite = WorkflowSuite::from_impl(suite_name, input)?;
    Ok(suite.render())
}
