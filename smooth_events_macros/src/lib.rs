mod attrs;
mod controller;
mod publisher;

use proc_macro::TokenStream;
use syn::{parse::Nothing, parse_macro_input, ItemImpl, ItemTrait};

// ============================================================================
// #[event_controller] attribute macro
// ============================================================================

/// Marks the type of an inherent `impl` block as an event controller.
///
/// Methods inside the block are discovered through marker attributes:
///
/// - `#[event_consumer("topic")]`: call the method for every message on
///   `topic`. The method takes `&self` and at most one `#[event_body]`
///   parameter, decoded from the message.
/// - `#[event_producer("topic")]`: on a consumer, publish the return value to
///   `topic`. Returning `()`, `None` or `Ok(())` publishes nothing; any other
///   value is published, even one that encodes as `null`.
///
/// Consumers returning `Result` report `Err` as a handler failure; the error
/// only needs to implement `Display`.
///
/// ```ignore
/// struct Orders;
///
/// #[event_controller]
/// impl Orders {
///     #[event_consumer("orders/create")]
///     #[event_producer("orders/created")]
///     fn create(&self, #[event_body] order: Order) -> Order {
///         Order { msg: format!("{} Next", order.msg) }
///     }
/// }
/// ```
///
/// Expands to the block itself plus a `smooth_events::Component` impl. A
/// consumer with two `#[event_body]` parameters still compiles; scanning
/// rejects it.
#[proc_macro_attribute]
pub fn event_controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as Nothing);
    let item = parse_macro_input!(item as ItemImpl);
    controller::expand(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ============================================================================
// #[event_publisher] attribute macro
// ============================================================================

/// Marks a trait as an event publisher.
///
/// Methods marked `#[event_producer("topic")]` become typed emission points:
/// on the instance handed out by the running application, calling one
/// publishes its single argument to `topic` and the implementation's body
/// never runs. Other methods behave as implemented.
///
/// ```ignore
/// #[event_publisher]
/// trait Notifications {
///     #[event_producer("orders/notified")]
///     fn notify(&self, order: &Order);
///
///     fn channel(&self) -> String;
/// }
/// ```
///
/// Generates `NotificationsInterceptor` and a `smooth_events::Component`
/// impl for `dyn Notifications`. `Send + Sync` supertraits are added when
/// missing.
#[proc_macro_attribute]
pub fn event_publisher(attr: TokenStream, item: TokenStream) -> TokenStream {
    parse_macro_input!(attr as Nothing);
    let item = parse_macro_input!(item as ItemTrait);
    publisher::expand(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
