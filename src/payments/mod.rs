pub mod checkout;

pub use checkout::{payment_options, CheckoutConfig, CheckoutQuote, PaymentOption};
