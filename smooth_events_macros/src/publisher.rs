//! Expansion of `#[event_publisher]`.
//!
//! Generates `<Trait>Interceptor`, a wrapper implementing the trait. Producer
//! methods publish their argument; every other method delegates to the
//! wrapped instance.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_quote, FnArg, Ident, ItemTrait, Pat, PatIdent, ReturnType, Signature, TraitItem,
    TraitItemFn, Type, TypeParamBound,
};

use crate::attrs::{self, BODY, CONSUMER, PRODUCER};

pub fn expand(mut item: ItemTrait) -> syn::Result<TokenStream> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[event_publisher] does not support generic traits",
        ));
    }
    require_thread_safe(&mut item)?;

    let trait_ident = item.ident.clone();
    let proxy = format_ident!("{}Interceptor", trait_ident);
    let vis = item.vis.clone();

    let mut proxy_methods = Vec::new();
    let mut methods = Vec::new();
    for trait_item in item.items.iter_mut() {
        let method = match trait_item {
            TraitItem::Fn(method) => method,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "#[event_publisher] traits may only contain methods",
                ))
            }
        };
        let produces = attrs::take_topic(&mut method.attrs, PRODUCER)?;
        check_method(method)?;

        match produces {
            Some(topic) => {
                let (sig, arg, ty) = producer_signature(&method.sig)?;
                let name = method.sig.ident.to_string();
                let param = param_name(&method.sig);
                let value_ty = strip_reference(&ty);
                methods.push(quote! {
                    ::smooth_events::MethodMetadata::new(#name)
                        .produces(#topic)
                        .param(::smooth_events::ParamMetadata::value::<#value_ty>(#param))
                });
                let payload = match ty {
                    Type::Reference(_) => quote! { #arg },
                    _ => quote! { &#arg },
                };
                proxy_methods.push(quote! {
                    #sig {
                        self.client.emit_or_log(#topic, #payload);
                    }
                });
            }
            None => {
                let (sig, args) = delegate_signature(&method.sig);
                let ident = &method.sig.ident;
                proxy_methods.push(quote! {
                    #sig {
                        self.inner.#ident(#(#args),*)
                    }
                });
            }
        }
    }

    let doc = format!(
        "Intercepting wrapper for [`{}`]: producer methods publish their argument instead of running.",
        trait_ident
    );

    Ok(quote! {
        #item

        #[doc = #doc]
        #vis struct #proxy {
            inner: ::std::sync::Arc<dyn #trait_ident>,
            client: ::smooth_events::EventClient,
        }

        impl #proxy {
            #vis fn new(
                inner: ::std::sync::Arc<dyn #trait_ident>,
                client: ::smooth_events::EventClient,
            ) -> Self {
                Self { inner, client }
            }
        }

        impl #trait_ident for #proxy {
            #(#proxy_methods)*
        }

        impl ::smooth_events::Component for dyn #trait_ident {
            fn metadata() -> ::smooth_events::ComponentMetadata {
                ::smooth_events::ComponentMetadata::publisher::<Self>()
                    #(.method(#methods))*
                    .interceptor(
                        |inner: ::std::sync::Arc<dyn #trait_ident>,
                         client: ::smooth_events::EventClient|
                         -> ::std::sync::Arc<dyn #trait_ident> {
                            ::std::sync::Arc::new(#proxy::new(inner, client))
                        },
                    )
            }
        }
    })
}

/// Add `Send + Sync` supertraits when missing; reject any other supertrait,
/// which the generated wrapper could not implement.
fn require_thread_safe(item: &mut ItemTrait) -> syn::Result<()> {
    let mut send = false;
    let mut sync = false;
    for bound in &item.supertraits {
        match bound {
            TypeParamBound::Trait(bound) => {
                let last = bound.path.segments.last().map(|s| s.ident.to_string());
                match last.as_deref() {
                    Some("Send") => send = true,
                    Some("Sync") => sync = true,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            bound,
                            "#[event_publisher] traits may only extend Send and Sync",
                        ))
                    }
                }
            }
            TypeParamBound::Lifetime(_) => {}
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "unsupported supertrait bound",
                ))
            }
        }
    }
    if !send {
        item.supertraits.push(parse_quote!(::std::marker::Send));
    }
    if !sync {
        item.supertraits.push(parse_quote!(::std::marker::Sync));
    }
    if item.colon_token.is_none() {
        item.colon_token = Some(Default::default());
    }
    Ok(())
}

fn check_method(method: &TraitItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    if attrs::has(&method.attrs, CONSUMER) {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "publisher methods cannot consume; use #[event_controller] for consumers",
        ));
    }
    for input in &sig.inputs {
        if let FnArg::Typed(param) = input {
            if attrs::has(&param.attrs, BODY) {
                return Err(syn::Error::new_spanned(
                    param,
                    "#[event_body] is only allowed on controller consumer methods",
                ));
            }
        }
    }
    if sig.asyncness.is_some() || !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "publisher methods cannot be async or generic",
        ));
    }
    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => Ok(()),
        _ => Err(syn::Error::new_spanned(
            &sig.ident,
            "publisher methods must take `&self`",
        )),
    }
}

/// Signature for an intercepted method: exactly one argument, no return.
fn producer_signature(sig: &Signature) -> syn::Result<(Signature, Ident, Type)> {
    if !matches!(sig.output, ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            &sig.output,
            "producer methods must not return a value",
        ));
    }
    let (sig, mut args) = delegate_signature(sig);
    let mut typed: Vec<Type> = sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(param) => Some((*param.ty).clone()),
            FnArg::Receiver(_) => None,
        })
        .collect();
    if typed.len() != 1 || args.len() != 1 {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "producer methods take exactly one argument, the payload",
        ));
    }
    Ok((sig, args.remove(0), typed.remove(0)))
}

/// Copy of `sig` with plain `__argN` parameter names, plus those names.
fn delegate_signature(sig: &Signature) -> (Signature, Vec<Ident>) {
    let mut sig = sig.clone();
    let mut args = Vec::new();
    for (index, input) in sig.inputs.iter_mut().enumerate() {
        if let FnArg::Typed(param) = input {
            let ident = format_ident!("__arg{}", index);
            param.attrs.clear();
            *param.pat = Pat::Ident(PatIdent {
                attrs: Vec::new(),
                by_ref: None,
                mutability: None,
                ident: ident.clone(),
                subpat: None,
            });
            args.push(ident);
        }
    }
    (sig, args)
}

fn param_name(sig: &Signature) -> String {
    sig.inputs
        .iter()
        .find_map(|input| match input {
            FnArg::Typed(param) => match &*param.pat {
                Pat::Ident(ident) => Some(ident.ident.to_string()),
                _ => None,
            },
            FnArg::Receiver(_) => None,
        })
        .unwrap_or_else(|| "_".to_string())
}

fn strip_reference(ty: &Type) -> &Type {
    match ty {
        Type::Reference(reference) => &reference.elem,
        other => other,
    }
}
