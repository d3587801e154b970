//! Helpers for the marker attributes stripped by the outer macros.

use syn::parse::ParseStream;
use syn::{Attribute, Ident, LitStr, Token};

pub const CONSUMER: &str = "event_consumer";
pub const PRODUCER: &str = "event_producer";
pub const BODY: &str = "event_body";

/// Remove every `#[name(...)]` from `attrs` and return its topic.
///
/// Accepts `#[name("topic")]` and `#[name(topic = "topic")]`. A repeated
/// marker is an error.
pub fn take_topic(attrs: &mut Vec<Attribute>, name: &str) -> syn::Result<Option<LitStr>> {
    let mut topic: Option<LitStr> = None;
    let mut result = Ok(());

    attrs.retain(|attr| {
        if !attr.path().is_ident(name) {
            return true;
        }
        if result.is_err() {
            return false;
        }
        match attr.parse_args_with(parse_topic) {
            Ok(_) if topic.is_some() => {
                result = Err(syn::Error::new_spanned(
                    attr,
                    format!("duplicate #[{}] attribute", name),
                ));
            }
            Ok(lit) => topic = Some(lit),
            Err(err) => result = Err(err),
        }
        false
    });

    result.map(|()| topic)
}

/// Remove every bare `#[name]` from `attrs`; report whether one was present.
pub fn take_flag(attrs: &mut Vec<Attribute>, name: &str) -> syn::Result<bool> {
    let mut found = false;
    let mut result = Ok(());

    attrs.retain(|attr| {
        if !attr.path().is_ident(name) {
            return true;
        }
        if let Err(err) = attr.meta.require_path_only() {
            if result.is_ok() {
                result = Err(err);
            }
        }
        found = true;
        false
    });

    result.map(|()| found)
}

/// Whether `attrs` still carries a marker named `name`.
pub fn has(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn parse_topic(input: ParseStream) -> syn::Result<LitStr> {
    if input.peek(LitStr) {
        return input.parse();
    }
    let key: Ident = input.parse()?;
    if key != "topic" {
        return Err(syn::Error::new(key.span(), "expected a topic string or `topic = \"...\"`"));
    }
    input.parse::<Token![=]>()?;
    input.parse()
}
