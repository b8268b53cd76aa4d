use std::path::PathBuf;

use color_eyre::Result;
use color_eyre::eyre::Context;
use fern::colors::{Color, ColoredLevelConfig};

/// Route `log` records to stderr and, optionally, to a log file.
///
/// stdout is left alone since it carries the report itself.
pub fn setup_logging(
    console_level: log::LevelFilter,
    log_file: Option<PathBuf>,
    file_level: log::LevelFilter,
) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let console = fern::Dispatch::new()
        .level(console_level)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = fern::Dispatch::new()
        // Keep dependency chatter (reqwest, hyper) out unless asked for
        .level(log::LevelFilter::Warn)
        .level_for(
            env!("CARGO_CRATE_NAME"),
            std::cmp::max(console_level, file_level_if(log_file.is_some(), file_level)),
        )
        .chain(console);

    if let Some(path) = log_file {
        let file = fern::log_file(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(file_level)
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} [{} {}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
    }

    dispatch.apply().wrap_err("Failed to install logger")?;
    Ok(())
}

fn file_level_if(enabled: bool, level: log::LevelFilter) -> log::LevelFilter {
    if enabled { level } else { log::LevelFilter::Off }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_level_ignored_without_file() {
        assert_eq!(
            file_level_if(false, log::LevelFilter::Debug),
            log::LevelFilter::Off
        );
        assert_eq!(
            file_level_if(true, log::LevelFilter::Debug),
            log::LevelFilter::Debug
        );
    }
}
