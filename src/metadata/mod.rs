//! Metadata model: type identity, the declarative metadata surface, and
//! the routing descriptors built from it.

mod component;
mod descriptor;
mod type_key;

pub use component::{
    handler_output, Component, ComponentMetadata, Interceptor, Invoker, MethodMetadata,
    ParamMetadata,
};
pub use descriptor::{
    ConsumerDescriptor, ControllerBinding, MethodRef, ProducerDescriptor, PublisherBinding,
    RoutingTable,
};
pub use type_key::{Payload, PayloadType, TypeKey};
