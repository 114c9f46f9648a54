use camino::Utf8Path;
use simple_error::{SimpleResult, bail};

/// Check a required input directory
///
/// Assumes no logger has been configured yet
///
pub fn check_required_dir(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.as_str().is_empty() {
        bail!("Must specify {label} directory");
    }
    if !dirname.exists() {
        bail!("Can't find specified {label} directory: '{dirname}'");
    }
    if !dirname.is_dir() {
        bail!("Specified {label} path does not appear to be a directory: '{dirname}'");
    }
    Ok(())
}

/// Check that the directory an output file will be written into already exists
///
/// Assumes no logger has been configured yet
///
pub fn check_output_file_parent_dir(filename: &Utf8Path, label: &str) -> SimpleResult<()> {
    if filename.as_str().is_empty() {
        bail!("Must specify {label} file");
    }
    if filename.is_dir() {
        bail!("Specified {label} file path is a directory: '{filename}'");
    }
    match filename.parent() {
        Some(parent) if !parent.as_str().is_empty() && !parent.is_dir() => {
            bail!("Parent directory of {label} file does not exist: '{filename}'");
        }
        _ => Ok(()),
    }
}
