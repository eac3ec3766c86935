pub mod app;
pub mod cli;
pub mod commands;
pub mod utils;

pub use app::CliApp;
pub use cli::{Cli, Commands, DetectCommand, TemplateCommand};
