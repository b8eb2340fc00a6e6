use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Once;

/// Exit outcome of a child process. `code` is `None` when it died from a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Exit {
    pub success: bool,
    pub code: Option<i32>,
}

impl From<ExitStatus> for Exit {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub exit: Exit,
    pub stdout: String,
    pub stderr: String,
}

/// Everything the launcher needs from the operating system. Errors mean the
/// program could not be started at all; a started program that fails is an
/// `Ok` with an unsuccessful [`Exit`].
pub trait Host {
    fn capture(&mut self, program: &str, args: &[&str]) -> Result<Captured>;

    /// Output goes straight to the operator's terminal.
    fn stream(&mut self, program: &str, args: &[&str]) -> Result<Exit>;

    /// Like `stream`, but blocks until the child ends and lets an interrupt
    /// stop the child without killing the launcher.
    fn foreground(&mut self, program: &str, args: &[&str]) -> Result<Exit>;
}

pub struct SystemHost {
    cwd: PathBuf,
    debug: bool,
}

impl SystemHost {
    pub fn new(cwd: &Path, debug: bool) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            debug,
        }
    }

    fn command(&self, program: &str, args: &[&str]) -> Command {
        if self.debug {
            eprintln!(
                "[debug] exec: {} {} (in {})",
                program,
                args.join(" "),
                self.cwd.display()
            );
        }
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.cwd);
        cmd
    }
}

impl Host for SystemHost {
    fn capture(&mut self, program: &str, args: &[&str]) -> Result<Captured> {
        let output = self
            .command(program, args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to run {} {:?}", program, args))?;

        Ok(Captured {
            exit: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }

    fn stream(&mut self, program: &str, args: &[&str]) -> Result<Exit> {
        let status = self
            .command(program, args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("failed to run {} {:?}", program, args))?;

        Ok(status.into())
    }

    fn foreground(&mut self, program: &str, args: &[&str]) -> Result<Exit> {
        survive_interrupts(self.debug);

        let mut child = self
            .command(program, args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start {} {:?}", program, args))?;

        let status = child
            .wait()
            .with_context(|| format!("failed to wait for {}", program))?;
        Ok(status.into())
    }
}

/// Catches Ctrl+C in the launcher for the rest of the process. A caught
/// signal is reset to its default action on exec, so children still stop.
fn survive_interrupts(debug: bool) {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if let Err(e) = ctrlc::set_handler(|| {}) {
            if debug {
                eprintln!("[debug] could not install Ctrl+C handler: {}", e);
            }
        }
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTool {
    pub command: String,
    /// First line the tool printed for `--version`.
    pub version: String,
}

/// Returns the first candidate that starts and exits 0 for `--version`.
pub fn probe_tool<H: Host>(
    host: &mut H,
    candidates: &[String],
    debug: bool,
) -> Option<ResolvedTool> {
    for candidate in candidates {
        match host.capture(candidate, &["--version"]) {
            Ok(out) if out.exit.success => {
                let version = first_line(&out.stdout)
                    .or_else(|| first_line(&out.stderr))
                    .unwrap_or_default();
                if debug {
                    eprintln!("[debug] probe: {} resolved ({})", candidate, version);
                }
                return Some(ResolvedTool {
                    command: candidate.clone(),
                    version,
                });
            }
            Ok(out) => {
                if debug {
                    eprintln!(
                        "[debug] probe: {} --version exited with {:?}",
                        candidate, out.exit.code
                    );
                }
            }
            Err(e) => {
                if debug {
                    eprintln!("[debug] probe: {}: {:#}", candidate, e);
                }
            }
        }
    }
    None
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Pulls the first dotted number out of a version banner such as
/// `Python 3.11.4` or `pip 24.0 from /usr/lib/...`. Missing components are 0
/// and pre-release suffixes (`3.13.0rc1`) are dropped.
pub fn parse_version(text: &str) -> Result<semver::Version> {
    let token = text
        .split_whitespace()
        .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))
        .with_context(|| format!("no version number in {:?}", text))?;

    let numeric: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let parts = numeric
        .split('.')
        .filter(|p| !p.is_empty())
        .take(3)
        .map(|p| p.parse::<u64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("malformed version number {:?}", token))?;

    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    Ok(semver::Version::new(part(0), part(1), part(2)))
}
