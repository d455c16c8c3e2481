use anyhow::Result;
use clap::Parser;

use citation_linkage::cli::{Cli, Commands};
use citation_linkage::commands::{run_link, run_signatures};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Link(args) => {
            run_link(args)?;
        }
        Commands::Signatures(args) => {
            run_signatures(args)?;
        }
    }

    Ok(())
}
