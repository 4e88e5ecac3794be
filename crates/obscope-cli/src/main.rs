mod args;
mod run;

use args::{Cli, Commands};
use clap::Parser;

fn main() {
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    eprintln!("error: failed to start tokio runtime: {err:#}");
                    std::process::exit(1);
                }
            };
            runtime.block_on(run::run(&cli.data_dir, &cli.log_level))
        }
        Commands::Status => run::status(&cli.data_dir),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
