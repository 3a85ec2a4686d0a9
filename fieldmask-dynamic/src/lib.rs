#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod message;
mod pool;

pub use message::{DynamicMessage, UnknownFieldError};
pub use pool::{
    DescriptorPool, DescriptorPoolBuilder, FieldDescriptor, FieldType, MessageBuilder,
    MessageDescriptor, PoolError,
};
