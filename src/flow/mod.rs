//! The hard-coded checkout flow definition.

mod script;

pub use script::{CheckoutScript, Credentials, OrderForm, Selectors};
