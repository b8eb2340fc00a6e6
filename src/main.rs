mod cli;
mod commands;
mod config;
mod error;
mod i18n;
mod launcher;
mod probe;
mod testutil;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use error::LaunchError;
use i18n::{Lang, Messages};
use launcher::Progress;
use probe::SystemHost;
use std::path::PathBuf;

fn main() {
    let cli = Cli::parse();
    let debug = cli.debug;
    let mut messages = Messages::new(Lang::resolve(cli.lang, None));

    if let Err(e) = run(cli, &mut messages) {
        match e.downcast_ref::<LaunchError>() {
            Some(err) => eprintln!("{}", messages.error(err)),
            None => eprintln!("error: {:#}", e),
        }
        if debug {
            eprintln!("[debug] {:?}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, messages: &mut Messages) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    if cli.show_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    let config = config::load_config_or_default(&config_path, cli.debug)?;
    *messages = Messages::new(Lang::resolve(cli.lang, config.lang));

    let project_dir = resolve_project_dir(cli.project_dir)?;
    let mut host = SystemHost::new(&project_dir, cli.debug);

    if cli.check {
        let result = commands::cmd_check(&mut host, &config, &project_dir, cli.debug)?;
        return output(&result, cli.json, commands::format_check_human);
    }

    let on_progress: &dyn Fn(Progress) = &|p| {
        if p.is_warning() {
            eprintln!("{}", messages.progress(&p));
        } else {
            println!("{}", messages.progress(&p));
        }
    };
    let result = commands::cmd_launch(
        &mut host,
        &config,
        &project_dir,
        cli.debug,
        Some(on_progress),
    )?;

    // However the dashboard ended (normally Ctrl+C), the launcher itself succeeded.
    println!("{}", messages.dashboard_stopped(result.dashboard_exit.code));
    Ok(())
}

fn resolve_project_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    if !dir.is_dir() {
        bail!("project directory {} does not exist", dir.display());
    }
    Ok(dir)
}

fn output<T: serde::Serialize>(result: &T, json: bool, human_fn: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let text = human_fn(result);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
