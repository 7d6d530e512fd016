use crate::prelude::*;
use clap::Parser;

mod cache;
mod config;
mod directory;
mod error;
mod info;
mod links;
mod notion;
mod order;
mod prelude;
mod server;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Link directory backed by a Notion database"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "NAVLINKS_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// List links in display order
    Links(crate::links::LinksOptions),

    /// Show the title, icon and cover of the links database
    Info(crate::info::InfoOptions),

    /// Show the configured category ranks
    Order(crate::order::OrderOptions),

    /// Serve the directory over HTTP
    Serve(crate::server::ServeOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Links(options) => crate::links::run(options, app.global).await,
        SubCommands::Info(options) => crate::info::run(options, app.global).await,
        SubCommands::Order(options) => crate::order::run(options, app.global).await,
        SubCommands::Serve(options) => crate::server::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
