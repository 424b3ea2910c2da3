//! Core traits and types for the eForth system.
//!
//! The VM reaches the outside world through exactly one seam: the `Console`
//! character transport. Everything else is observable but owned.

mod console;
mod observable;

pub use console::Console;
pub use observable::{Observable, Value};
