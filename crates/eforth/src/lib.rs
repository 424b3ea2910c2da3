//! The eForth machine: kernel + VM wired to a terminal.
//!
//! `Eforth::new()` assembles the kernel dictionary into a fresh memory image
//! and hands it to the VM; `run()` enters the boot vector. Console
//! implementations cover an interactive terminal and scripted sessions.

mod console;
mod forth;

pub use console::{ScriptConsole, StdioConsole};
pub use forth::{Eforth, EforthConfig};
