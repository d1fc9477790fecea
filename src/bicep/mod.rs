//! Bicep compiler invocation
//!
//! Templates authored in Bicep are compiled to ARM JSON by shelling out to
//! the `bicep` CLI (or `az bicep` when opted in). The tool is discovered
//! and version-probed once, then handed down explicitly to callers rather
//! than held in process-global state.

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use crate::errors::BicepError;

const ENV_BICEP_PATH: &str = "ARMEVAL_BICEP_PATH";
const ENV_USE_AZURE_CLI: &str = "ARMEVAL_BICEP_USE_AZURE_CLI";
const ENV_BICEP_ARGS: &str = "ARMEVAL_BICEP_ARGS";

/// One second between exit polls, five polls before giving up.
const WAIT_INTERVAL: Duration = Duration::from_millis(1000);
const WAIT_RETRIES: u32 = 5;

/// A discovered Bicep binary, pinned to the version it reported at
/// discovery time.
#[derive(Debug, Clone)]
pub struct BicepTool {
    bin_path: PathBuf,
    use_az_cli: bool,
    version: String,
}

impl BicepTool {
    /// Locate a usable binary and probe its version.
    ///
    /// Resolution order: the `ARMEVAL_BICEP_PATH` override, then `bicep` on
    /// `PATH`, then `az` on `PATH` when `ARMEVAL_BICEP_USE_AZURE_CLI` is
    /// set to a truthy value.
    pub fn discover() -> Result<BicepTool, BicepError> {
        let (bin_path, use_az_cli) = Self::find_binary().ok_or(BicepError::NotFound)?;
        let version = Self::probe_version(&bin_path, use_az_cli)?;
        Ok(BicepTool {
            bin_path,
            use_az_cli,
            version,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }

    fn find_binary() -> Option<(PathBuf, bool)> {
        if let Some(path) = env::var_os(ENV_BICEP_PATH) {
            let path = PathBuf::from(path);
            if path.is_file() {
                return Some((path, false));
            }
        }
        if let Some(path) = Self::search_path(&["bicep", "bicep.exe"]) {
            return Some((path, false));
        }
        if env_truthy(ENV_USE_AZURE_CLI) {
            if let Some(path) = Self::search_path(&["az", "az.exe"]) {
                return Some((path, true));
            }
        }
        None
    }

    fn search_path(names: &[&str]) -> Option<PathBuf> {
        let path = env::var_os("PATH")?;
        for dir in env::split_paths(&path) {
            for name in names {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn probe_version(bin_path: &Path, use_az_cli: bool) -> Result<String, BicepError> {
        let mut command = Command::new(bin_path);
        if use_az_cli {
            command.args(["bicep", "version"]);
        } else {
            command.arg("--version");
        }
        let output = command.output()?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(parse_version(&text))
    }

    /// Compile a Bicep source file, returning the ARM JSON written to
    /// stdout.
    pub fn build(&self, source_path: &Path) -> Result<String, BicepError> {
        let mut command = Command::new(&self.bin_path);
        if self.use_az_cli {
            command.args(["bicep", "build", "--stdout", "--file"]);
        } else {
            command.args(["build", "--stdout"]);
        }
        command.arg(source_path);
        if let Ok(extra) = env::var(ENV_BICEP_ARGS) {
            command.args(extra.split_whitespace());
        }
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = command.spawn()?;
        // Drain both pipes off-thread so a chatty compiler cannot deadlock
        // against a full pipe buffer while we wait on exit.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait_with_retries(&mut child, source_path)?;
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(self.compile_error(source_path, stderr.trim().to_string()));
        }
        Ok(stdout)
    }

    fn wait_with_retries(
        &self,
        child: &mut Child,
        source_path: &Path,
    ) -> Result<ExitStatus, BicepError> {
        for _ in 0..WAIT_RETRIES {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            thread::sleep(WAIT_INTERVAL);
        }
        let _ = child.kill();
        let _ = child.wait();
        Err(self.compile_error(
            source_path,
            "the compiler did not exit within the wait budget".to_string(),
        ))
    }

    fn compile_error(&self, source_path: &Path, message: String) -> BicepError {
        BicepError::Compile {
            version: self.version.clone(),
            path: source_path.display().to_string(),
            message,
        }
    }
}

/// Second-to-last whitespace token of the version banner, e.g.
/// "Bicep CLI version 0.25.53 (abcdef)" reports "0.25.53".
fn parse_version(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() >= 2 {
        tokens[tokens.len() - 2].to_string()
    } else {
        tokens.first().map(|s| s.to_string()).unwrap_or_default()
    }
}

fn drain(pipe: Option<impl Read + Send + 'static>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buffer);
        }
        buffer
    })
}

fn env_truthy(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => {
            let value = value.trim();
            value.eq_ignore_ascii_case("true") || value == "1"
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_version_banner() {
        assert_eq!(
            parse_version("Bicep CLI version 0.25.53 (53b0d66bf4)"),
            "0.25.53"
        );
        assert_eq!(parse_version("0.25.53 (53b0d66bf4)"), "0.25.53");
        assert_eq!(parse_version("0.25.53"), "0.25.53");
        assert_eq!(parse_version(""), "");
    }

    #[test]
    fn test_env_truthy() {
        // Unset vars are falsy without touching the process environment.
        assert!(!env_truthy("ARMEVAL_TEST_UNSET_VARIABLE"));
    }
}
