//! Utilities pertaining to filesystem and other os-level settings
//!

use camino::Utf8Path;
use simple_error::{SimpleResult, map_err_with};

/// Create a novel directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
/// * `label` - used to describe the error directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) -> SimpleResult<()> {
    if !dir.is_dir() {
        map_err_with!(
            std::fs::create_dir_all(dir),
            "Can't create new {label} directory at '{dir}'"
        )?;
    }
    Ok(())
}

/// Attempt to increase open file limit to the system's hard limit on *nix-like systems
///
/// This is an optional increase so continue through all failure cases without error.
///
pub fn attempt_max_open_file_limit() {
    use rlimit::Resource;

    let (soft, hard) = match Resource::NOFILE.get() {
        Ok(x) => x,
        Err(_) => return,
    };

    if soft < hard {
        rlimit::setrlimit(Resource::NOFILE, hard, hard).unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use camino::Utf8PathBuf;

    #[test]
    fn test_create_dir_all() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let nested = base.join("a").join("b");
        create_dir_all(&nested, "test").unwrap();
        assert!(nested.is_dir());

        // Repeating the call on an existing directory is a no-op
        create_dir_all(&nested, "test").unwrap();

        // A regular file in the way is an error
        let file_path = base.join("file");
        std::fs::write(&file_path, "x").unwrap();
        assert!(create_dir_all(&file_path, "test").is_err());
    }
}
