//! The `curator check` command for validating a provider connection.

use clap::Args;
use curator_core::Config;

use super::provider::{connect, ProviderArgs};

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Execute the check command.
pub async fn execute(args: CheckArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let connection = connect(&args.provider, &mut config).await?;

    println!("Connected to {}", connection.provider.name());
    let models = connection.status.models();
    if !models.is_empty() {
        println!("Available models:");
        for model in models {
            println!("  {model}");
        }
    }
    Ok(())
}
