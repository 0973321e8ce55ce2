use std::process::ExitCode;

use clap::Parser;
use colabme::{loc, RecordStore};

mod commit;
mod console;
mod ignore;
mod list;
mod remove;
mod setup;
mod utils;

#[derive(Parser)]
#[command(name = "colabme")]
#[command(author, version, about, long_about=None)]
struct Cli {
    /// Report every operation, not only warnings and errors
    #[clap(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Record the service account and the Drive folder to upload to
    Setup(setup::Args),
    /// Upload new and modified files
    Commit(commit::Args),
    /// Delete files from the Drive and stop tracking them
    Remove(remove::Args),
    /// Never upload the given files
    Ignore(ignore::IgnoreArgs),
    /// Allow upload of previously ignored files
    Unignore(ignore::UnignoreArgs),
    /// List the tracked and ignored files
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            log::error!("Could not start the runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli.command)) {
        Ok(()) => {
            log::info!("The operation completed.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let tracker_file = loc::cwd::tracker_file()?;
    let mut store = RecordStore::load(&tracker_file).await?;

    let res = match command {
        Commands::List => return list::main(&store).await,
        Commands::Setup(args) => setup::main(args, &mut store).await,
        Commands::Commit(args) => commit::main(args, &mut store).await,
        Commands::Remove(args) => remove::main(args, &mut store).await,
        Commands::Ignore(args) => ignore::ignore(args, &mut store),
        Commands::Unignore(args) => ignore::unignore(args, &mut store),
    };

    // saved even if the command failed half-way
    let saved = store.save(&tracker_file).await;
    res?;
    saved?;
    Ok(())
}
