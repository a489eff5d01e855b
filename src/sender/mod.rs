pub mod client;
pub mod wire;

pub use client::{DeliveryClient, DeliveryError, LICENSE_KEY_HEADER};
pub use wire::{MessageFormatter, WireEvent, WireIdentity};
