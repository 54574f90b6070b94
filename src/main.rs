use clap::Parser;

/// Entry point for Creo Carbon.
///
/// Parses the command line, connects to the Graphite carbon-cache and forwards the
/// cgroup accounting of every container found below the configured cgroup root.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=info creo-carbon -H carbon.example.org -p prod -i 10
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = creo_carbon::config::Cli::parse().into_config()?;
    creo_carbon::run(config).await?;
    Ok(())
}
