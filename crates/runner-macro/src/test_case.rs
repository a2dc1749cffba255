use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Expr, ExprLit, Token, punctuated::Punctuated, spanned::Spanned as _};

/// A `#[test_case("name", ...)]` method.
///
/// Accepted flags after the name: `ignore`, `only` and any number of
/// `depends_on = "other test"`.
#[derive(Debug)]
pub(crate) struct TestCase {
    pub(crate) name: String,
    pub(crate) name_span: proc_macro2::Span,
    pub(crate) method: syn::ImplItemFn,
    pub(crate) ignore: bool,
    pub(crate) only: bool,
    pub(crate) depends_on: Vec<String>,
}

fn string_literal(expr: &Expr, what: &str) -> syn::Result<String> {
    let Expr::Lit(ExprLit {
        lit: syn::Lit::Str(lit_str),
        ..
    }) = expr
    else {
        return Err(syn::Error::new(
            expr.span(),
            format!("`test_case` attribute must contain a string literal as the {what}"),
        ));
    };
    Ok(lit_str.value())
}

impl TestCase {
    pub const ID: &'static str = "test_case";

    pub fn new(method: syn::ImplItemFn, attr: &syn::Attribute) -> syn::Result<Self> {
        let arguments: Punctuated<Expr, Token![,]> = attr
            .parse_args_with(Punctuated::parse_terminated)
            .map_err(|_| {
                syn::Error::new(attr.span(), "`test_case` attribute must contain test name")
            })?;
        let mut arguments = arguments.into_iter();
        let Some(first) = arguments.next() else {
            return Err(syn::Error::new(
                attr.span(),
                "`test_case` attribute must contain test name",
            ));
        };

        let name = string_literal(&first, "test name")?;
        if name.trim().is_empty() {
            return Err(syn::Error::new(
                first.span(),
                "Test case name cannot be empty",
            ));
        }

        if method.sig.asyncness.is_none() || method.sig.receiver().is_none() {
            return Err(syn::Error::new(
                method.sig.span(),
                "Test case must be an `async fn(&self) -> anyhow::Result<()>`",
            ));
        }

        let mut ignore = false;
        let mut only = false;
        let mut depends_on = Vec::new();
        for arg in arguments {
            match &arg {
                Expr::Path(path) if path.path.is_ident("ignore") => ignore = true,
                Expr::Path(path) if path.path.is_ident("only") => only = true,
                Expr::Assign(assign) => {
                    let is_depends_on = matches!(
                        assign.left.as_ref(),
                        Expr::Path(path) if path.path.is_ident("depends_on")
                    );
                    if !is_depends_on {
                        return Err(syn::Error::new(
                            assign.left.span(),
                            "Unknown key in `test_case` attribute, expected `depends_on`",
                        ));
                    }
                    let dependency = string_literal(&assign.right, "dependency name")?;
                    if dependency == name {
                        return Err(syn::Error::new(
                            assign.right.span(),
                            "A test case cannot depend on itself",
                        ));
                    }
                    depends_on.push(dependency);
                }
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "Unknown argument in `test_case` attribute",
                    ));
                }
            }
        }

        Ok(Self {
            name,
            name_span: first.span(),
            method,
            ignore,
            only,
            depends_on,
        })
    }

    /// Returns the wrapper type implementing `Test` and the expression that
    /// boxes it from inside `TestSuite::tests`.
    pub fn render(
        &self,
        struct_ty_name: &syn::Ident,
        crate_name: &syn::Ident,
    ) -> (TokenStream2, TokenStream2) {
        let test_fn_name = &self.method.sig.ident;
        let name = &self.name;
        let ignore = self.ignore;
        let only = self.only;
        let depends_on = &self.depends_on;

        let test_ty_name = quote::format_ident!("{}_Test_{}", struct_ty_name, test_fn_name);
        let test_case = quote! {
            #[allow(non_camel_case_types)]
            struct #test_ty_name(#struct_ty_name);

            #[#crate_name::__private_reexports::async_trait]
            impl #crate_name::Test for #test_ty_name {
                fn name(&self) -> String {
                    #name.to_string()
                }

                async fn run(&self) -> anyhow::Result<()> {
                    self.0.#test_fn_name().await
                }

                fn ignore(&self) -> bool {
                    #ignore
                }

                fn only(&self) -> bool {
                    #only
                }

                fn depends_on(&self) -> Vec<String> {
                    vec![#(#depends_on.to_string()),*]
                }
            }
        };
        let test_case_object = quote! {
            Box::new(#test_ty_name(self.clone()))
        };
        (test_case, test_case_object)
    }
}
