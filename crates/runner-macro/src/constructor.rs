use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{FnArg, ImplItemFn, Type, TypePath, spanned::Spanned as _};

/// A `#[constructor]` or `#[constructor("variant")]` method.
///
/// Each constructor becomes a factory: the user's method is renamed to
/// `__<name>` and a `<name>()` function returning the boxed factory takes its
/// place.
#[derive(Debug)]
pub(crate) struct Constructor {
    pub(crate) variant: Option<String>,
    pub(crate) config_ty: TypePath,
    pub(crate) method: ImplItemFn,
}

impl Constructor {
    pub const ID: &'static str = "constructor";

    pub fn new(method: ImplItemFn, attr: &syn::Attribute) -> syn::Result<Self> {
        let variant = match &attr.meta {
            syn::Meta::Path(_) => None,
            syn::Meta::List(_) => {
                let lit: syn::LitStr = attr.parse_args().map_err(|_| {
                    syn::Error::new(
                        attr.span(),
                        "Expected a string literal as the constructor variant name",
                    )
                })?;
                Some(lit.value())
            }
            syn::Meta::NameValue(nv) => {
                return Err(syn::Error::new(
                    nv.span(),
                    "Use `#[constructor(\"variant\")]` to name a constructor",
                ));
            }
        };

        if method.sig.asyncness.is_none() {
            return Err(syn::Error::new(
                method.sig.span(),
                "Constructor method must be async",
            ));
        }
        let config_ty = Self::config_type(&method)?;

        Ok(Self {
            variant,
            config_ty,
            method,
        })
    }

    /// Extracts `Config` from a `fn(config: &Config)` signature.
    fn config_type(method: &ImplItemFn) -> syn::Result<TypePath> {
        let wrong_signature = || {
            syn::Error::new(
                method.sig.span(),
                "Constructor method must take a single `&Config` argument",
            )
        };
        if method.sig.inputs.len() != 1 {
            return Err(wrong_signature());
        }
        let Some(FnArg::Typed(arg)) = method.sig.inputs.first() else {
            return Err(wrong_signature());
        };
        let Type::Reference(reference) = arg.ty.as_ref() else {
            return Err(wrong_signature());
        };
        let Type::Path(path) = reference.elem.as_ref() else {
            return Err(syn::Error::new(
                reference.elem.span(),
                "Constructor config argument must be a reference to a named type",
            ));
        };
        Ok(path.clone())
    }

    pub fn render(
        &self,
        suite_name: &syn::Lit,
        crate_name: &syn::Ident,
        struct_ty_name: &syn::Ident,
    ) -> TokenStream2 {
        let config_ty = &self.config_ty;
        let constructor_fn_name = &self.method.sig.ident;
        let inner_fn_name = quote::format_ident!("__{}", constructor_fn_name);
        let mut method = self.method.clone();
        method.sig.ident = inner_fn_name.clone();

        let factory_name =
            quote::format_ident!("{}Factory_{}", struct_ty_name, constructor_fn_name);

        let suite_name_code = match &self.variant {
            Some(variant) => quote! { format!("{} ({})", #suite_name, #variant) },
            None => quote! { #suite_name.to_string() },
        };

        quote! {
            #[allow(non_camel_case_types)]
            struct #factory_name;

            impl #struct_ty_name {
                pub fn #constructor_fn_name() -> Box<dyn #crate_name::TestSuiteFactory<#config_ty>> {
                    Box::new(#factory_name)
                }

                #method
            }

            #[#crate_name::__private_reexports::async_trait]
            impl #crate_name::TestSuiteFactory<#config_ty> for #factory_name {
                fn name(&self) -> String {
                    #suite_name_code
                }

                async fn create_suite(&self, config: &#config_ty) -> anyhow::Result<Box<dyn #crate_name::TestSuite>> {
                    let suite = #struct_ty_name::#inner_fn_name(config).await?;
                    Ok(Box::new(suite))
                }
            }

            impl std::fmt::Debug for #factory_name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", <Self as #crate_name::TestSuiteFactory<#config_ty>>::name(self))
                }
            }
        }
    }
}
