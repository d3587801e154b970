//! Expansion of `#[event_controller]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{
    FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, Pat, PathArguments, ReturnType, Type,
    TypePath,
};

use crate::attrs::{self, BODY, CONSUMER, PRODUCER};

struct BodyParam {
    name: String,
    ty: Type,
}

pub fn expand(mut item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[event_controller] must be placed on an inherent impl block",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[event_controller] does not support generic impl blocks",
        ));
    }

    let mut methods = Vec::new();
    for impl_item in item.items.iter_mut() {
        if let ImplItem::Fn(method) = impl_item {
            if let Some(metadata) = method_metadata(method)? {
                methods.push(metadata);
            }
        }
    }

    let self_ty = &item.self_ty;
    Ok(quote! {
        #item

        impl ::smooth_events::Component for #self_ty {
            fn metadata() -> ::smooth_events::ComponentMetadata {
                ::smooth_events::ComponentMetadata::controller::<Self>()
                    #(.method(#methods))*
            }
        }
    })
}

/// Strip the markers from `method` and build its `MethodMetadata`
/// expression. `None` for unmarked methods.
fn method_metadata(method: &mut ImplItemFn) -> syn::Result<Option<TokenStream>> {
    let consumes = attrs::take_topic(&mut method.attrs, CONSUMER)?;
    let produces = attrs::take_topic(&mut method.attrs, PRODUCER)?;

    let mut bodies = Vec::new();
    let mut others = Vec::new();
    for input in method.sig.inputs.iter_mut() {
        let FnArg::Typed(param) = input else {
            continue;
        };
        if attrs::take_flag(&mut param.attrs, BODY)? {
            bodies.push(BodyParam {
                name: param_name(&param.pat),
                ty: (*param.ty).clone(),
            });
        } else {
            others.push(param.span());
        }
    }

    let Some(consumes) = consumes else {
        if let Some(body) = bodies.first() {
            return Err(syn::Error::new(
                body.ty.span(),
                "#[event_body] is only allowed on #[event_consumer] methods",
            ));
        }
        return Ok(produces.map(|topic| {
            let name = method.sig.ident.to_string();
            quote! { ::smooth_events::MethodMetadata::new(#name).produces(#topic) }
        }));
    };

    check_consumer_signature(method)?;
    if let Some(span) = others.first() {
        return Err(syn::Error::new(
            *span,
            "consumer parameters must be marked #[event_body]",
        ));
    }
    for body in &bodies {
        if let Type::Reference(reference) = &body.ty {
            return Err(syn::Error::new_spanned(
                reference,
                "#[event_body] parameters must be owned types",
            ));
        }
    }

    let name = method.sig.ident.to_string();
    let produces = produces.map(|topic| quote! { .produces(#topic) });
    let params = bodies.iter().map(|body| {
        let param = &body.name;
        let ty = &body.ty;
        quote! { .param(::smooth_events::ParamMetadata::body::<#ty>(#param)) }
    });
    // With more than one body there is no single payload to pass; the
    // scanner rejects the method as ambiguous.
    let invoker = if bodies.len() <= 1 {
        Some(invoker(method, bodies.first()))
    } else {
        None
    };

    Ok(Some(quote! {
        ::smooth_events::MethodMetadata::new(#name)
            .consumes(#consumes)
            #produces
            #(#params)*
            #invoker
    }))
}

fn check_consumer_signature(method: &ImplItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "consumer methods cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "consumer methods cannot be generic",
        ));
    }
    match sig.receiver() {
        Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => Ok(()),
        Some(receiver) => Err(syn::Error::new_spanned(
            receiver,
            "consumer methods must take `&self`",
        )),
        None => Err(syn::Error::new_spanned(
            &sig.ident,
            "consumer methods must take `&self`",
        )),
    }
}

fn invoker(method: &ImplItemFn, body: Option<&BodyParam>) -> TokenStream {
    let ident = &method.sig.ident;
    let (payload, call) = match body {
        Some(body) => {
            let ty = &body.ty;
            (
                quote! { payload },
                quote! { this.#ident(::smooth_events::Payload::require::<#ty>(payload)?) },
            )
        }
        None => (quote! { _payload }, quote! { this.#ident() }),
    };

    let output = match &method.sig.output {
        ReturnType::Default => quote! {
            #call;
            ::std::result::Result::Ok(::std::option::Option::None)
        },
        ReturnType::Type(_, ty) => publish_output(ty, call),
    };

    quote! {
        .invoker(
            |this: &Self,
             #payload: ::std::option::Option<::smooth_events::Payload>|
             -> ::std::result::Result<
                ::std::option::Option<::smooth_events::Value>,
                ::smooth_events::HandlerError,
            > {
                #output
            },
        )
    }
}

/// Turn `value` of type `ty` into the invoker's result. Absence is read
/// off the type: `()`, `None` and `Ok(())` publish nothing, every other
/// value is published even when it encodes as `null`.
fn publish_output(ty: &Type, value: TokenStream) -> TokenStream {
    match ty {
        Type::Tuple(tuple) if tuple.elems.is_empty() => quote! {
            let () = #value;
            ::std::result::Result::Ok(::std::option::Option::None)
        },
        Type::Paren(inner) => publish_output(&inner.elem, value),
        Type::Group(inner) => publish_output(&inner.elem, value),
        Type::Path(path) => match wrapper(path) {
            Some(("Option", _)) => quote! {
                match #value {
                    ::std::option::Option::Some(inner) => ::smooth_events::handler_output(&inner),
                    ::std::option::Option::None => {
                        ::std::result::Result::Ok(::std::option::Option::None)
                    }
                }
            },
            Some(("Result", ok)) => {
                let ok = match ok {
                    Some(ok) => publish_output(ok, quote! { inner }),
                    None => quote! { ::smooth_events::handler_output(&inner) },
                };
                quote! {
                    match #value {
                        ::std::result::Result::Ok(inner) => { #ok }
                        ::std::result::Result::Err(err) => {
                            ::std::result::Result::Err(::smooth_events::HandlerError::failed(err))
                        }
                    }
                }
            }
            _ => quote! { ::smooth_events::handler_output(&#value) },
        },
        _ => quote! { ::smooth_events::handler_output(&#value) },
    }
}

/// `Option` or `Result` by last path segment, with its first type argument.
fn wrapper(path: &TypePath) -> Option<(&'static str, Option<&Type>)> {
    let segment = path.path.segments.last()?;
    let name = if segment.ident == "Option" {
        "Option"
    } else if segment.ident == "Result" {
        "Result"
    } else {
        return None;
    };
    let first = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    };
    Some((name, first))
}

fn param_name(pat: &Pat) -> String {
    match pat {
        Pat::Ident(ident) => ident.ident.to_string(),
        _ => "_".to_string(),
    }
}
