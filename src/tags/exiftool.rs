use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{TagReader, TagSet};

/// Line exiftool prints (with `-f`) for a tag the file does not carry.
const PLACEHOLDER: &str = "-";

/// Reads tags by running `exiftool -s3 -f` once per file.
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find `exiftool` in `PATH`.
    pub fn locate() -> Option<Self> {
        match which::which("exiftool") {
            Ok(program) => {
                tracing::debug!(program = %program.display(), "found exiftool");
                Some(Self::new(program))
            }
            Err(_) => None,
        }
    }

    fn command(&self, path: &Path, names: &[&'static str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-s3").arg("-f");
        for name in names {
            cmd.arg(format!("-{}", name));
        }
        cmd.arg(file_argument(path));
        cmd
    }
}

impl TagReader for ExifTool {
    fn extract_tags(&self, path: &Path, names: &[&'static str]) -> TagSet {
        let output = match self.command(path, names).output() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not run exiftool");
                return TagSet::absent(names);
            }
        };

        if !output.status.success() {
            tracing::debug!(
                path = %path.display(),
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "exiftool reported an error"
            );
            return TagSet::absent(names);
        }

        parse_output(names, &String::from_utf8_lossy(&output.stdout))
    }
}

/// Map exiftool `-s3 -f` output onto the requested tag names.
///
/// Expects one line per tag in request order. Anything else (an error
/// message, a short or long listing) means the output cannot be trusted and
/// every tag is reported absent.
pub fn parse_output(names: &[&'static str], stdout: &str) -> TagSet {
    if stdout.starts_with("File not found") {
        return TagSet::absent(names);
    }

    let lines: Vec<&str> = stdout
        .strip_suffix('\n')
        .unwrap_or(stdout)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if stdout.is_empty() || lines.len() != names.len() {
        return TagSet::absent(names);
    }

    TagSet::from_pairs(names.iter().zip(lines).map(|(name, line)| {
        let value = (line != PLACEHOLDER).then(|| line.to_string());
        (*name, value)
    }))
}

/// exiftool treats arguments starting with `-` as options.
fn file_argument(path: &Path) -> OsString {
    if path.is_relative() && path.as_os_str().to_string_lossy().starts_with('-') {
        Path::new(".").join(path).into_os_string()
    } else {
        path.as_os_str().to_os_string()
    }
}
