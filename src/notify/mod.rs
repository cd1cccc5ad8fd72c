//! Result presentation for the command-line tool.

pub mod console;

pub use console::{outfile_line, ConsoleOutput};
