//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use spamz_core::Payload;

#[derive(Parser, Debug)]
#[command(name = "spamz", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to spamz.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Override endpoint.base_url
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a message, remotely if any route answers
    Predict(MessageArgs),
    /// Classify a message with the local heuristic only
    Classify(MessageArgs),
    /// Try every backend route with a test sample
    Check,
    /// Send OPTIONS to the primary route
    Probe,
}

#[derive(Args, Debug, Default)]
pub struct MessageArgs {
    /// Subject line
    #[arg(long, default_value = "")]
    pub subject: String,
    /// Sender address
    #[arg(long, default_value = "")]
    pub sender: String,
    /// Message body
    #[arg(long, default_value = "")]
    pub text: String,
    /// Use the built-in spam sample instead of the fields above
    #[arg(long, conflicts_with_all = ["subject", "sender", "text"])]
    pub demo: bool,
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl MessageArgs {
    pub fn payload(&self) -> Payload {
        if self.demo {
            Payload::demo()
        } else {
            Payload::new(&self.subject, &self.sender, &self.text)
        }
    }
}
