use clap::{Parser, Subcommand};

/// Payments self-service admin
#[derive(Parser)]
#[command(name = "selfservice", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind; overrides PORT
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },
}
