//! Terminal front end for the console harness

mod args;
mod console;

pub use args::Cli;
pub use console::Console;
