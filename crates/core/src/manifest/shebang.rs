//! Shebang sniffing for script entrypoints.

use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Why a shebang line could not be read.
#[derive(Error, Debug)]
pub enum ShebangError {
    /// The file could not be opened or read.
    #[error("failed to read shebang from {path}")]
    Read {
        /// Script path
        path: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The first line does not start with `#!`.
    #[error("invalid shebang prefix: {line}")]
    InvalidPrefix {
        /// The first line of the file
        line: String,
    },

    /// `#!` with nothing after it.
    #[error("shebang names no interpreter: {line}")]
    MissingInterpreter {
        /// The first line of the file
        line: String,
    },
}

/// Return the interpreter named on the first line of `path`.
///
/// `#!/usr/bin/env python3` yields `/usr/bin/env`; arguments are ignored.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no usable shebang line.
pub fn parse_shebang(path: &Path) -> Result<String, ShebangError> {
    let read_err = |source| ShebangError::Read {
        path: path.display().to_string(),
        source,
    };

    let file = std::fs::File::open(path).map_err(read_err)?;
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first).map_err(read_err)?;
    let line = first.trim();

    let Some(rest) = line.strip_prefix("#!") else {
        return Err(ShebangError::InvalidPrefix { line: line.into() });
    };

    rest.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| ShebangError::MissingInterpreter { line: line.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn script(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run");
        std::fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_interpreter_with_args() {
        let (_temp, path) = script("#!/usr/bin/env python3\nprint('hi')\n");
        assert_eq!(parse_shebang(&path).unwrap(), "/usr/bin/env");
    }

    #[test]
    fn test_space_after_prefix() {
        let (_temp, path) = script("#! /bin/bash\n");
        assert_eq!(parse_shebang(&path).unwrap(), "/bin/bash");
    }

    #[test]
    fn test_no_shebang() {
        let (_temp, path) = script("echo hi\n");
        assert!(matches!(
            parse_shebang(&path),
            Err(ShebangError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn test_empty_shebang() {
        let (_temp, path) = script("#!   \n");
        assert!(matches!(
            parse_shebang(&path),
            Err(ShebangError::MissingInterpreter { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            parse_shebang(Path::new("/nonexistent/orla/script")),
            Err(ShebangError::Read { .. })
        ));
    }
}
