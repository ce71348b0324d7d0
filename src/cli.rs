use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clubwarden")]
#[command(author, version, about = "Telegram bot for a Brawl Stars club community", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling
    Run,

    /// Apply database migrations and exit
    Migrate,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
