mod config;
mod console;
mod error;
mod logging;
mod ports;
mod results;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use color_eyre::{Report, Result, eyre::Context, eyre::eyre};

use crate::{
    config::Config,
    error::DiffError,
    logging::setup_logging,
    services::spotify::{
        client::{SpotifyApiCredentials, SpotifyHttpAdapter, obtain_access_token},
        diff::LibraryDiffService,
        library::Pacing,
    },
};

/// How many saved tracks `saved` and menu option 4 show by default
const DEFAULT_SAVED_COUNT: usize = 20;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "YMAS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "YMAS_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Spotify application client id
    #[arg(long, env = "SPOTIPY_CLIENT_ID", global = true)]
    client_id: Option<String>,

    /// Spotify application client secret (optional with PKCE)
    #[arg(long, env = "SPOTIPY_CLIENT_SECRET", hide_env_values = true, global = true)]
    client_secret: Option<String>,

    /// Redirect URI registered for the Spotify application
    #[arg(
        long,
        env = "SPOTIPY_REDIRECT_URI",
        default_value = "http://127.0.0.1:8888/callback",
        global = true
    )]
    redirect_uri: String,

    /// Without a command an interactive menu is shown
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    #[command(flatten)]
    Library(LibraryCommands),
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug, Clone)]
enum LibraryCommands {
    /// Find all tracks in your playlists that aren't saved
    Unsaved,
    /// Find all saved tracks that aren't in any of your playlists
    Orphaned,
    /// Pick a random album from your saved albums
    RandomAlbum,
    /// Show your most recently saved tracks
    Saved {
        /// How many saved tracks to display
        #[arg(
            default_value_t = DEFAULT_SAVED_COUNT,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        count: usize,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Spotify credentials may live in a .env file next to the binary's working dir
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("you-missed-a-spot starting");
    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    let command = match &args.command {
        Some(Commands::Config(config_commands)) => {
            match config_commands {
                ConfigCommands::CreateDefault => {
                    let path = Config::create_default()?;
                    println!("{}", path.display());
                }
                ConfigCommands::Path => match Config::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No default config path found"),
                },
            }
            return Ok(());
        }
        Some(Commands::Library(command)) => Some(command),
        None => None,
    };

    log::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load you-missed-a-spot config")?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout().lock();

    let Err(report) = run(&args, command, &config, &mut input, &mut output).await else {
        return Ok(());
    };
    let code = report_failure(report, &mut input, &mut output)?;
    std::process::exit(code);
}

/// Show the fixed message for a categorized failure and wait for ENTER.
/// Returns the exit code; anything uncategorized is passed back up.
fn report_failure<R: BufRead, W: Write>(
    report: Report,
    input: &mut R,
    output: &mut W,
) -> Result<i32> {
    let Some(error) = report.downcast_ref::<DiffError>() else {
        return Err(report);
    };

    log::error!("{}: {:?}", error, error.report());
    writeln!(output, "{}", error)?;
    console::press_enter_to_exit(input, output)?;
    writeln!(output)?;
    Ok(1)
}

async fn run<R: BufRead, W: Write>(
    args: &Args,
    command: Option<&LibraryCommands>,
    config: &Config,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let client_id = args
        .client_id
        .clone()
        .ok_or_else(|| DiffError::Authentication(eyre!("SPOTIPY_CLIENT_ID is not set")))?;
    let credentials = SpotifyApiCredentials::new(
        client_id,
        args.client_secret.clone(),
        args.redirect_uri.clone(),
    );

    let http = reqwest::Client::new();
    let access_token = obtain_access_token(
        &http,
        &credentials,
        &config.token_cache_path(),
        input,
        output,
    )
    .await
    .map_err(DiffError::Authentication)?;

    let service = LibraryDiffService::new(
        SpotifyHttpAdapter::new(http, access_token),
        Pacing::from_config(config),
        config.results_path(),
    );
    let user = service.current_user().await?;

    let started = Instant::now();
    match command {
        None => {
            return console::run_menu(
                &service,
                &user,
                DEFAULT_SAVED_COUNT,
                &mut rand::rng(),
                input,
                output,
            )
            .await;
        }
        Some(LibraryCommands::Unsaved) => {
            writeln!(output, "Checking playlists for unsaved songs...")?;
            service.find_unsaved_in_playlists(&user, output).await?;
        }
        Some(LibraryCommands::Orphaned) => {
            writeln!(output, "Checking for saved songs not in any playlists...")?;
            service.find_saved_not_in_playlists(&user, output).await?;
        }
        Some(LibraryCommands::RandomAlbum) => {
            writeln!(output, "Checking saved albums...")?;
            service.random_saved_album(&mut rand::rng(), output).await?;
        }
        Some(LibraryCommands::Saved { count }) => {
            service.list_saved_tracks(*count, output).await?;
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "Finished in {}",
        humantime::format_duration(Duration::from_secs(elapsed.as_secs()))
    );
    writeln!(output, "{}", execution_time(elapsed))?;
    Ok(())
}

fn execution_time(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!(
        "This took {} minutes and {} seconds.",
        seconds / 60,
        seconds % 60
    )
}
