pub mod args;
pub mod render;

pub use args::{parse_args, parse_args_from, print_completion, Config, ParseOutcome};
