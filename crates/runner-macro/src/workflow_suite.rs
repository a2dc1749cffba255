use std::collections::HashSet;

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ImplItem, ItemImpl, spanned::Spanned as _};

use crate::{constructor::Constructor, hooks::Hooks, test_case::TestCase};

/// Which of our attributes, if any, `attr` is.
fn special_attr_kind(attr: &syn::Attribute) -> Option<String> {
    let ident = attr.meta.path().get_ident()?.to_string();
    let special = ident == Constructor::ID || ident == TestCase::ID || Hooks::is_hook(&ident);
    special.then_some(ident)
}

#[derive(Debug)]
pub(crate) struct WorkflowSuite {
    input: syn::ItemImpl,
    crate_name: syn::Ident,
    suite_name: syn::Lit,
    struct_ty_name: syn::Ident,
    constructors: Vec<Constructor>,
    hooks: Hooks,
    test_cases: Vec<TestCase>,
    /// Impl items left for the user's own `impl` block. Constructors are
    /// re-emitted by their factories under a private name.
    remaining_items: Vec<ImplItem>,
}

impl WorkflowSuite {
    fn struct_ty_name(input: &syn::ItemImpl) -> syn::Result<syn::Ident> {
        let syn::Type::Path(struct_ty) = input.self_ty.as_ref() else {
            return Err(syn::Error::new(
                input.self_ty.span(),
                "The workflow suite must be implemented for a struct type",
            ));
        };
        struct_ty
            .path
            .get_ident()
            .cloned()
            .ok_or_else(|| syn::Error::new(struct_ty.span(), "Expected a struct name"))
    }

    pub fn from_impl(suite_name: syn::Lit, input: syn::ItemImpl) -> syn::Result<Self> {
        if !matches!(suite_name, syn::Lit::Str(_)) {
            return Err(syn::Error::new(
                suite_name.span(),
                "Suite name must be a string literal",
            ));
        }
        let struct_ty_name = Self::struct_ty_name(&input)?;

        let mut constructors = vec![];
        let mut hooks = Hooks::default();
        let mut test_cases: Vec<TestCase> = vec![];
        let mut remaining_items = vec![];

        for item in &input.items {
            let ImplItem::Fn(method) = item else {
                remaining_items.push(item.clone());
                continue;
            };
            let mut method = method.clone();
            let mut special = vec![];
            method.attrs.retain(|attr| match special_attr_kind(attr) {
                Some(kind) => {
                    special.push((kind, attr.clone()));
                    false
                }
                None => true,
            });
            if special.len() > 1 {
                return Err(syn::Error::new(
                    method.sig.span(),
                    "A method cannot have multiple suite-related attributes",
                ));
            }

            match special.pop() {
                Some((kind, attr)) if kind == Constructor::ID => {
                    constructors.push(Constructor::new(method, &attr)?);
                }
                Some((kind, attr)) if kind == TestCase::ID => {
                    let test_case = TestCase::new(method.clone(), &attr)?;
                    if test_cases.iter().any(|t| t.name == test_case.name) {
                        return Err(syn::Error::new(
                            test_case.name_span,
                            format!("Duplicate test case name: {}", test_case.name),
                        ));
                    }
                    test_cases.push(test_case);
                    remaining_items.push(ImplItem::Fn(method));
                }
                Some((kind, _)) => {
                    hooks.add_hook(&kind, &method)?;
                    remaining_items.push(ImplItem::Fn(method));
                }
                None => remaining_items.push(ImplItem::Fn(method)),
            }
        }

        if constructors.is_empty() {
            return Err(syn::Error::new(
                input.self_ty.span(),
                "A workflow suite must have a constructor method annotated with #[constructor]",
            ));
        }

        let names: HashSet<&str> = test_cases.iter().map(|t| t.name.as_str()).collect();
        for test_case in &test_cases {
            if let Some(missing) = test_case
                .depends_on
                .iter()
                .find(|dep| !names.contains(dep.as_str()))
            {
                return Err(syn::Error::new(
                    test_case.name_span,
                    format!("Unknown dependency `{missing}` of test case `{}`", test_case.name),
                ));
            }
        }

        let crate_name = quote::format_ident!("edu_hub_runner");

        Ok(Self {
            input,
            crate_name,
            suite_name,
            struct_ty_name,
            constructors,
            hooks,
            test_cases,
            remaining_items,
        })
    }

    fn render_test_suite(&self, test_case_objects: Vec<TokenStream2>) -> TokenStream2 {
        let crate_name = &self.crate_name;
        let struct_ty_name = &self.struct_ty_name;
        let suite_name = &self.suite_name;

        let hooks = self.hooks.render(struct_ty_name);

        quote! {
            #[#crate_name::__private_reexports::async_trait]
            impl #crate_name::TestSuite for #struct_ty_name {
                fn name(&self) -> String {
                    #suite_name.to_string()
                }

                fn tests(&self) -> Vec<Box<dyn #crate_name::Test>> {
                    vec![
                        #(#test_case_objects),*
                    ]
                }

                #hooks
            }
        }
    }

    pub fn render(self) -> TokenStream2 {
        let factories = self.constructors.iter().map(|constructor| {
            constructor.render(&self.suite_name, &self.crate_name, &self.struct_ty_name)
        });
        let factories: Vec<_> = factories.collect();

        let (test_case_code, test_case_objects): (Vec<_>, Vec<_>) = self
            .test_cases
            .iter()
            .map(|test_case| test_case.render(&self.struct_ty_name, &self.crate_name))
            .unzip();
        let test_suite = self.render_test_suite(test_case_objects);

        let cleaned_impl = ItemImpl {
            items: self.remaining_items,
            ..self.input
        };

        quote! {
            #cleaned_impl

            #(#factories)*

            #test_suite

            #(#test_case_code)*
        }
    }
}
