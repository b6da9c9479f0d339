//! Recognition of trading signals in free-form chat text.

pub mod error;
pub mod grammar;

pub use error::SignalError;
pub use grammar::{parse, render};
