use clap::Parser;
use court_booker::cli::{Args, is_config_update};
use court_booker::commands::{
    handle_booking_command, handle_config_update_command, handle_list_config_command,
    validate_args,
};
use court_booker::config::Config;
use court_booker::error::AppError;
use court_booker::logging::setup_logging;
use court_booker::shutdown::{Shutdown, listen_for_ctrl_c};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();

    validate_args(&args)?;

    // Config commands only touch the file and print their own output
    if args.list_config {
        return handle_list_config_command().await;
    }

    if is_config_update(&args) {
        return handle_config_update_command(&args).await;
    }

    // The guard must be kept alive for the duration of the program
    let (log_file_path, _guard) = setup_logging(&args).await?;
    tracing::info!("Logs are being written to: {log_file_path}");

    // Load config first to fail early if there's an issue
    let config = Config::load().await?;

    let (trigger, shutdown) = Shutdown::channel();
    listen_for_ctrl_c(trigger);

    handle_booking_command(&args, &config, shutdown).await
}
