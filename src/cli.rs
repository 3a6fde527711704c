#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use clap::{Parser, Subcommand};
use eyre::{Context, Result};

use crate::config::{self, Configuration, load_configuration, lookup_config_path};

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"A research assistant that answers questions about your documents with Gemini

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/research-chat/config.toml
    * $HOME/.config/research-chat/config.toml
    * $HOME/.research-chat.toml
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Show the version
    #[arg(short, long)]
    version: bool,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Action {
    /// List conversations, most recent first
    List,

    /// Start a new conversation and make it active
    New {
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Make a conversation the active one
    Select { id: String },

    /// Delete a conversation
    Delete { id: String },

    /// Rename a conversation
    Rename { id: String, title: String },

    /// Print a conversation, the active one by default
    Show { id: Option<String> },

    /// Ask a question, streaming the answer as it arrives
    Send {
        /// Attach a file to this turn. May be repeated.
        #[arg(short, long = "file", value_name = "PATH")]
        files: Vec<String>,

        /// Send to this conversation instead of the active one
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,

        prompt: String,
    },
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        if config_path.is_empty() {
            // No config path is specified just use the default config
            return Ok(Configuration::default());
        }
        Ok(load_configuration(config_path.as_str()).wrap_err("loading configuration")?)
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }
}
