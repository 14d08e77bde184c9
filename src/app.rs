use crate::cli::Cli;
use crate::commands::{self, CommandContext};
use crate::logging::init_logging;
use clap::Parser;

pub fn run() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let runtime = match tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
  {
    Ok(rt) => rt,
    Err(err) => {
      eprintln!("Error: failed to start runtime: {err}");
      std::process::exit(1);
    }
  };

  let ctx = CommandContext {
    config_dir: cli.config_dir,
    base_url: cli.base_url,
  };

  match runtime.block_on(commands::dispatch(cli.command, &ctx)) {
    Ok(output) => {
      if !output.is_empty() {
        println!("{output}");
      }
    }
    Err(err) => {
      tracing::debug!(code = ?err.status_code(), "exiting with failure");
      eprintln!("Error: {}", commands::error_message(&err));
      std::process::exit(1);
    }
  }
}
