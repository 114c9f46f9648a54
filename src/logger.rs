//! Methods specific to the program logger
//!

use camino::Utf8Path;

use crate::globals::PROGRAM_NAME;
use crate::os_utils::create_dir_all;

/// If debug is true set the default logger to the more verbose debug level
///
fn setup_logger(log_dir: Option<&Utf8Path>, debug: bool) -> Result<(), fern::InitError> {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                PROGRAM_NAME,
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    let logger = if let Some(log_dir) = log_dir {
        let log_filename = log_dir.join(PROGRAM_NAME.to_string() + ".log");
        logger.chain(fern::log_file(log_filename)?)
    } else {
        logger
    };

    logger.apply()?;
    Ok(())
}

/// Create the local scratch directory if requested, then setup logger to write there in
/// addition to stderr
///
/// #Arguments
/// * `debug` - If true use debug log level, and info level otherwise
///
pub fn setup_local_tmp_dir_and_logger(local_tmp_dir: Option<&Utf8Path>, debug: bool) {
    // All error messaging in this method needs to account for no logger being setup yet.
    //
    // We try to match the pre-logging error pattern used in the command-line settings verification methods
    //
    if let Some(local_tmp_dir) = local_tmp_dir {
        if let Err(msg) = create_dir_all(local_tmp_dir, "local temporary") {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }

    if let Err(err) = setup_logger(local_tmp_dir, debug) {
        eprintln!("Failed to setup logger: {err}");
        std::process::exit(exitcode::IOERR);
    }
}
