#![cfg(test)]

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::probe::{Captured, Exit, Host};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Capture,
    Stream,
    Foreground,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub line: String,
}

#[derive(Debug, Clone)]
struct Reply {
    code: i32,
    stdout: String,
    stderr: String,
}

/// Scripted [`Host`]: replies are keyed by the full command line
/// (`"pip3 show streamlit"`). Anything unscripted behaves like a program
/// that is not on PATH.
#[derive(Default)]
pub struct FakeHost {
    replies: HashMap<String, Reply>,
    pub calls: Vec<Call>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, line: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.replies.insert(
            line.to_string(),
            Reply {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn with_tool(self, program: &str, version: &str) -> Self {
        self.respond(&format!("{} --version", program), 0, version, "")
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.iter().map(|c| c.line.clone()).collect()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<String> {
        self.calls
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.line.clone())
            .collect()
    }

    fn reply(&mut self, kind: CallKind, program: &str, args: &[&str]) -> Result<Reply> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.push(Call {
            kind,
            line: line.clone(),
        });
        match self.replies.get(&line) {
            Some(reply) => Ok(reply.clone()),
            None => bail!("failed to run {}: No such file or directory", program),
        }
    }
}

fn exit_of(code: i32) -> Exit {
    Exit {
        success: code == 0,
        code: Some(code),
    }
}

impl Host for FakeHost {
    fn capture(&mut self, program: &str, args: &[&str]) -> Result<Captured> {
        let reply = self.reply(CallKind::Capture, program, args)?;
        Ok(Captured {
            exit: exit_of(reply.code),
            stdout: reply.stdout,
            stderr: reply.stderr,
        })
    }

    fn stream(&mut self, program: &str, args: &[&str]) -> Result<Exit> {
        let reply = self.reply(CallKind::Stream, program, args)?;
        Ok(exit_of(reply.code))
    }

    fn foreground(&mut self, program: &str, args: &[&str]) -> Result<Exit> {
        let reply = self.reply(CallKind::Foreground, program, args)?;
        Ok(exit_of(reply.code))
    }
}

pub const LAUNCH_LINE: &str =
    "python3 -m streamlit run app.py --server.port 8501 --server.address localhost";
