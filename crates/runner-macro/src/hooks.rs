use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned as _;

/// Suite lifecycle points a method can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl Hook {
    const ALL: [Hook; 4] = [
        Hook::BeforeAll,
        Hook::BeforeEach,
        Hook::AfterEach,
        Hook::AfterAll,
    ];

    /// Attribute name, which is also the `TestSuite` method it overrides.
    fn ident(self) -> &'static str {
        match self {
            Hook::BeforeAll => "before_all",
            Hook::BeforeEach => "before_each",
            Hook::AfterEach => "after_each",
            Hook::AfterAll => "after_all",
        }
    }

    pub fn from_attr(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.ident() == name)
    }
}

/// Hook methods declared on a suite, at most one per lifecycle point.
#[derive(Debug, Default)]
pub(crate) struct Hooks {
    declared: Vec<(Hook, syn::Ident)>,
}

impl Hooks {
    pub fn is_hook(name: &str) -> bool {
        Hook::from_attr(name).is_some()
    }

    pub fn add_hook(&mut self, name: &str, method: &syn::ImplItemFn) -> syn::Result<()> {
        let Some(hook) = Hook::from_attr(name) else {
            return Err(syn::Error::new(
                method.sig.ident.span(),
                format!("Invalid hook kind: {name}"),
            ));
        };
        if method.sig.asyncness.is_none() || method.sig.receiver().is_none() {
            return Err(syn::Error::new(
                method.sig.span(),
                format!("`{name}` hook must be an `async fn(&self)`"),
            ));
        }
        if self.declared.iter().any(|(declared, _)| *declared == hook) {
            return Err(syn::Error::new(
                method.sig.ident.span(),
                format!("Duplicate hook: {name}"),
            ));
        }
        self.declared.push((hook, method.sig.ident.clone()));
        Ok(())
    }

    /// `TestSuite` method overrides forwarding to the declared methods.
    pub fn render(&self, struct_ty_name: &syn::Ident) -> TokenStream2 {
        let overrides = self.declared.iter().map(|(hook, fn_name)| {
            let trait_fn = quote::format_ident!("{}", hook.ident());
            quote! {
                async fn #trait_fn(&self) -> anyhow::Result<()> {
                    #struct_ty_name::#fn_name(self).await
                }
            }
        });
        quote! { #(#overrides)* }
    }
}
