//! The launch sequence as a chain of gates:
//!
//! ```text
//! Start -> InterpreterFound -> PackageManagerFound -> DependencyChecked
//!       -> (DependencyInstalled | skip) -> AppRunning -> Terminated
//! ```
//!
//! Any failing gate ends in `Terminated(Failure)`; the dashboard exiting for
//! any reason ends in `Terminated(Interrupt)`. Nothing here prints: phases
//! are reported through the `on_progress` callback and rendered by the caller.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::config::{dashboard_url, LauncherConfig, DASHBOARD_HOST, DASHBOARD_PORT};
use crate::error::LaunchError;
use crate::probe::{parse_version, probe_tool, Exit, Host, ResolvedTool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    InterpreterFound,
    PackageManagerFound,
    DependencyChecked,
    DependencyInstalled,
    AppRunning,
    Terminated(Termination),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Failure,
    Interrupt,
}

pub enum Progress<'a> {
    ProbingInterpreter,
    InterpreterFound(&'a ResolvedTool),
    InterpreterOutdated {
        found: &'a semver::Version,
        min: &'a semver::Version,
    },
    ProbingPackageManager,
    PackageManagerFound(&'a ResolvedTool),
    CheckingDependency { library: &'a str },
    DependencyPresent { library: &'a str },
    DependencyMissing { library: &'a str },
    Installing { manifest: &'a Path },
    Installed,
    EntryFileMissing { path: &'a Path },
    Launching { entry_file: &'a Path, url: &'a str },
}

impl Progress<'_> {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Progress::InterpreterOutdated { .. } | Progress::EntryFileMissing { .. }
        )
    }
}

#[derive(Debug, Serialize)]
pub struct LaunchResult {
    pub interpreter: ResolvedTool,
    pub package_manager: ResolvedTool,
    pub installed: bool,
    pub dashboard_exit: Exit,
}

pub struct Launcher<'a, H: Host> {
    host: &'a mut H,
    config: &'a LauncherConfig,
    project_dir: &'a Path,
    debug: bool,
    stage: Stage,
}

impl<'a, H: Host> Launcher<'a, H> {
    pub fn new(
        host: &'a mut H,
        config: &'a LauncherConfig,
        project_dir: &'a Path,
        debug: bool,
    ) -> Self {
        Self {
            host,
            config,
            project_dir,
            debug,
            stage: Stage::Start,
        }
    }

    #[cfg(test)]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        if self.debug {
            eprintln!("[debug] stage: {:?} -> {:?}", self.stage, stage);
        }
        self.stage = stage;
    }

    /// Runs every gate and then the dashboard. Returns once the dashboard exits.
    pub fn run(&mut self, on_progress: Option<&dyn Fn(Progress)>) -> Result<LaunchResult> {
        let result = self.run_gates(on_progress);
        let end = match result {
            Ok(_) => Termination::Interrupt,
            Err(_) => Termination::Failure,
        };
        self.advance(Stage::Terminated(end));
        result
    }

    fn run_gates(&mut self, on_progress: Option<&dyn Fn(Progress)>) -> Result<LaunchResult> {
        let interpreter = self.discover_interpreter(on_progress)?;
        let package_manager = self.discover_package_manager(on_progress)?;

        let installed = if self.check_dependency(&package_manager, on_progress)? {
            false
        } else {
            self.install_dependencies(&package_manager, on_progress)?;
            true
        };

        let dashboard_exit = self.launch_app(&interpreter, on_progress)?;

        Ok(LaunchResult {
            interpreter,
            package_manager,
            installed,
            dashboard_exit,
        })
    }

    pub fn discover_interpreter(
        &mut self,
        on_progress: Option<&dyn Fn(Progress)>,
    ) -> Result<ResolvedTool> {
        emit(on_progress, Progress::ProbingInterpreter);

        let candidates = &self.config.interpreters;
        let tool = probe_tool(&mut *self.host, candidates, self.debug).ok_or_else(|| {
            LaunchError::InterpreterNotFound {
                tried: candidates.clone(),
            }
        })?;

        self.advance(Stage::InterpreterFound);
        emit(on_progress, Progress::InterpreterFound(&tool));

        match parse_version(&tool.version) {
            Ok(found) if found < self.config.min_interpreter_version => {
                emit(
                    on_progress,
                    Progress::InterpreterOutdated {
                        found: &found,
                        min: &self.config.min_interpreter_version,
                    },
                );
            }
            Ok(_) => {}
            Err(e) => {
                if self.debug {
                    eprintln!("[debug] interpreter version not parsed: {:#}", e);
                }
            }
        }

        Ok(tool)
    }

    pub fn discover_package_manager(
        &mut self,
        on_progress: Option<&dyn Fn(Progress)>,
    ) -> Result<ResolvedTool> {
        emit(on_progress, Progress::ProbingPackageManager);

        let candidates = &self.config.package_managers;
        let tool = probe_tool(&mut *self.host, candidates, self.debug).ok_or_else(|| {
            LaunchError::PackageManagerNotFound {
                tried: candidates.clone(),
            }
        })?;

        self.advance(Stage::PackageManagerFound);
        emit(on_progress, Progress::PackageManagerFound(&tool));
        Ok(tool)
    }

    /// True when the required library is already installed.
    pub fn check_dependency(
        &mut self,
        package_manager: &ResolvedTool,
        on_progress: Option<&dyn Fn(Progress)>,
    ) -> Result<bool> {
        let config = self.config;
        let library = config.required_library.as_str();
        emit(on_progress, Progress::CheckingDependency { library });

        let out = self
            .host
            .capture(&package_manager.command, &["show", library])
            .with_context(|| {
                format!("failed to query {} for {}", package_manager.command, library)
            })?;

        self.advance(Stage::DependencyChecked);
        if out.exit.success {
            emit(on_progress, Progress::DependencyPresent { library });
        } else {
            emit(on_progress, Progress::DependencyMissing { library });
        }
        Ok(out.exit.success)
    }

    pub fn install_dependencies(
        &mut self,
        package_manager: &ResolvedTool,
        on_progress: Option<&dyn Fn(Progress)>,
    ) -> Result<()> {
        let config = self.config;
        let manifest = config.manifest.as_path();
        if self.debug && !self.project_dir.join(manifest).exists() {
            eprintln!(
                "[debug] manifest {} not found in {}",
                manifest.display(),
                self.project_dir.display()
            );
        }

        emit(on_progress, Progress::Installing { manifest });

        let manifest_arg = manifest.to_string_lossy().into_owned();
        let failed = |code| LaunchError::InstallationFailed {
            manifest: manifest.to_path_buf(),
            code,
        };
        match self
            .host
            .stream(&package_manager.command, &["install", "-r", manifest_arg.as_str()])
        {
            Ok(exit) if exit.success => {}
            Ok(exit) => return Err(failed(exit.code).into()),
            Err(e) => {
                if self.debug {
                    eprintln!("[debug] install: {:#}", e);
                }
                return Err(failed(None).into());
            }
        }

        self.advance(Stage::DependencyInstalled);
        emit(on_progress, Progress::Installed);
        Ok(())
    }

    /// Arguments handed to the interpreter: `-m streamlit run app.py` pinned to localhost:8501.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            self.config.dashboard_module.clone(),
            "run".to_string(),
            self.config.entry_file.to_string_lossy().into_owned(),
            "--server.port".to_string(),
            DASHBOARD_PORT.to_string(),
            "--server.address".to_string(),
            DASHBOARD_HOST.to_string(),
        ]
    }

    pub fn launch_app(
        &mut self,
        interpreter: &ResolvedTool,
        on_progress: Option<&dyn Fn(Progress)>,
    ) -> Result<Exit> {
        let config = self.config;
        let entry_file = config.entry_file.as_path();
        if !self.project_dir.join(entry_file).exists() {
            emit(on_progress, Progress::EntryFileMissing { path: entry_file });
        }

        let url = dashboard_url();
        emit(on_progress, Progress::Launching { entry_file, url: &url });

        let args = self.launch_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        self.advance(Stage::AppRunning);
        let exit = self
            .host
            .foreground(&interpreter.command, &args)
            .context("failed to launch the dashboard")?;

        if self.debug {
            eprintln!("[debug] dashboard exited: {:?}", exit);
        }
        Ok(exit)
    }
}

fn emit(on_progress: Option<&dyn Fn(Progress)>, event: Progress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Lang, Messages};
    use crate::testutil::{CallKind, FakeHost, LAUNCH_LINE};
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn unix_config() -> LauncherConfig {
        LauncherConfig {
            interpreters: vec!["python3".into(), "python".into()],
            package_managers: vec!["pip3".into(), "pip".into()],
            ..LauncherConfig::default()
        }
    }

    fn project() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("app.py"), "import streamlit as st\n").unwrap();
        std::fs::write(tmp.path().join("requirements.txt"), "streamlit\n").unwrap();
        tmp
    }

    fn healthy_host() -> FakeHost {
        FakeHost::new()
            .with_tool("python3", "Python 3.11.4")
            .with_tool("pip3", "pip 24.0 from /usr/lib/python3/dist-packages/pip (python 3.11)")
            .respond(LAUNCH_LINE, 0, "", "")
    }

    /// Collects rendered progress lines, in order.
    fn recorder() -> (RefCell<Vec<String>>, Messages) {
        (RefCell::new(Vec::new()), Messages::new(Lang::En))
    }

    #[test]
    fn missing_interpreter_stops_before_package_manager() {
        let tmp = project();
        let config = unix_config();
        let mut host = FakeHost::new().with_tool("pip3", "pip 24.0");
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let err = launcher.run(None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LaunchError>(),
            Some(&LaunchError::InterpreterNotFound {
                tried: vec!["python3".into(), "python".into()]
            })
        );
        assert_eq!(launcher.stage(), Stage::Terminated(Termination::Failure));
        assert_eq!(host.command_lines(), vec!["python3 --version", "python --version"]);
    }

    #[test]
    fn missing_package_manager_stops_before_dependency_check() {
        let tmp = project();
        let config = unix_config();
        let mut host = FakeHost::new().with_tool("python3", "Python 3.11.4");
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let err = launcher.run(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::PackageManagerNotFound { .. })
        ));
        assert!(!host.command_lines().iter().any(|l| l.contains(" show ")));
        assert!(host.calls_of(CallKind::Foreground).is_empty());
    }

    #[test]
    fn present_dependency_skips_install_and_launches() {
        let tmp = project();
        let config = unix_config();
        let mut host = healthy_host().respond("pip3 show streamlit", 0, "Name: streamlit", "");
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let result = launcher.run(None).unwrap();
        assert!(!result.installed);
        assert_eq!(launcher.stage(), Stage::Terminated(Termination::Interrupt));
        assert!(host.calls_of(CallKind::Stream).is_empty());
        assert_eq!(host.calls_of(CallKind::Foreground), vec![LAUNCH_LINE]);
    }

    #[test]
    fn absent_dependency_installs_then_launches() {
        let tmp = project();
        let config = unix_config();
        let mut host = healthy_host()
            .respond("pip3 show streamlit", 1, "", "WARNING: Package(s) not found: streamlit")
            .respond("pip3 install -r requirements.txt", 0, "", "");
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let result = launcher.run(None).unwrap();
        assert!(result.installed);
        assert_eq!(
            host.calls_of(CallKind::Stream),
            vec!["pip3 install -r requirements.txt"]
        );
        assert_eq!(host.calls_of(CallKind::Foreground), vec![LAUNCH_LINE]);
    }

    #[test]
    fn failed_install_never_launches() {
        let tmp = project();
        let config = unix_config();
        let mut host = healthy_host()
            .respond("pip3 show streamlit", 1, "", "")
            .respond("pip3 install -r requirements.txt", 1, "", "");
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let err = launcher.run(None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LaunchError>(),
            Some(&LaunchError::InstallationFailed {
                manifest: PathBuf::from("requirements.txt"),
                code: Some(1),
            })
        );
        assert_eq!(launcher.stage(), Stage::Terminated(Termination::Failure));
        assert!(host.calls_of(CallKind::Foreground).is_empty());
    }

    #[test]
    fn unstartable_installer_counts_as_failed_install() {
        let tmp = project();
        let config = unix_config();
        let mut host = healthy_host().respond("pip3 show streamlit", 1, "", "");
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let err = launcher.run(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LaunchError>(),
            Some(LaunchError::InstallationFailed { code: None, .. })
        ));
    }

    #[test]
    fn launch_targets_fixed_port_and_entry_file() {
        let tmp = project();
        let config = unix_config();
        let mut host = healthy_host();
        let launcher = Launcher::new(&mut host, &config, tmp.path(), false);
        let args = launcher.launch_args();
        assert_eq!(
            args,
            vec![
                "-m",
                "streamlit",
                "run",
                "app.py",
                "--server.port",
                "8501",
                "--server.address",
                "localhost"
            ]
        );
    }

    #[test]
    fn launch_uses_resolved_fallback_interpreter() {
        let tmp = project();
        let config = unix_config();
        let mut host = FakeHost::new()
            .with_tool("python", "Python 3.10.12")
            .with_tool("pip", "pip 22.0.2")
            .respond("pip show streamlit", 0, "", "")
            .respond(
                "python -m streamlit run app.py --server.port 8501 --server.address localhost",
                0,
                "",
                "",
            );
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let result = launcher.run(None).unwrap();
        assert_eq!(result.interpreter.command, "python");
        assert_eq!(result.package_manager.command, "pip");
    }

    #[test]
    fn dashboard_nonzero_exit_still_terminates_normally() {
        let tmp = project();
        let config = unix_config();
        let mut host = FakeHost::new()
            .with_tool("python3", "Python 3.11.4")
            .with_tool("pip3", "pip 24.0")
            .respond("pip3 show streamlit", 0, "", "")
            .respond(LAUNCH_LINE, 130, "", "");
        let mut launcher = Launcher::new(&mut host, &config, tmp.path(), false);

        let result = launcher.run(None).unwrap();
        assert_eq!(result.dashboard_exit.code, Some(130));
        assert_eq!(launcher.stage(), Stage::Terminated(Termination::Interrupt));
    }

    #[test]
    fn progress_reports_each_phase_in_order() {
        let tmp = project();
        let config = unix_config();
        let mut host = healthy_host()
            .respond("pip3 show streamlit", 1, "", "")
            .respond("pip3 install -r requirements.txt", 0, "", "");
        let (lines, messages) = recorder();
        let cb: &dyn Fn(Progress) = &|p| lines.borrow_mut().push(messages.progress(&p));

        Launcher::new(&mut host, &config, tmp.path(), false)
            .run(Some(cb))
            .unwrap();

        let lines = lines.into_inner();
        assert_eq!(lines[0], "Checking Python environment...");
        assert_eq!(lines[1], "Found Python (python3): Python 3.11.4");
        assert_eq!(lines[2], "Checking pip...");
        assert!(lines[3].starts_with("Found pip (pip3)"));
        assert_eq!(lines[4], "Checking whether streamlit is installed...");
        assert_eq!(lines[5], "streamlit is not installed");
        assert_eq!(lines[6], "Installing dependencies from requirements.txt...");
        assert_eq!(lines[7], "Dependencies installed");
        assert!(lines[8].contains("http://localhost:8501"));
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn old_interpreter_warns_but_continues() {
        let tmp = project();
        let config = unix_config();
        let mut host = FakeHost::new()
            .with_tool("python3", "Python 3.6.9")
            .with_tool("pip3", "pip 9.0.1")
            .respond("pip3 show streamlit", 0, "", "")
            .respond(LAUNCH_LINE, 0, "", "");
        let warnings = RefCell::new(Vec::new());
        let cb: &dyn Fn(Progress) = &|p| {
            if p.is_warning() {
                warnings
                    .borrow_mut()
                    .push(Messages::new(Lang::En).progress(&p));
            }
        };

        Launcher::new(&mut host, &config, tmp.path(), false)
            .run(Some(cb))
            .unwrap();

        assert_eq!(
            warnings.into_inner(),
            vec!["warning: Python 3.6.9 is older than the recommended 3.8.0"]
        );
    }

    #[test]
    fn missing_entry_file_warns_but_still_launches() {
        let tmp = tempfile::tempdir().unwrap();
        let config = unix_config();
        let mut host = healthy_host().respond("pip3 show streamlit", 0, "", "");
        let warned = RefCell::new(false);
        let cb: &dyn Fn(Progress) = &|p| {
            if matches!(p, Progress::EntryFileMissing { .. }) {
                *warned.borrow_mut() = true;
            }
        };

        Launcher::new(&mut host, &config, tmp.path(), false)
            .run(Some(cb))
            .unwrap();

        assert!(warned.into_inner());
        assert_eq!(host.calls_of(CallKind::Foreground), vec![LAUNCH_LINE]);
    }

    #[test]
    fn custom_entry_and_manifest_flow_through() {
        let tmp = project();
        let config = LauncherConfig {
            manifest: PathBuf::from("deps.txt"),
            entry_file: PathBuf::from("dashboard.py"),
            ..unix_config()
        };
        let mut host = FakeHost::new()
            .with_tool("python3", "Python 3.12.0")
            .with_tool("pip3", "pip 24.0")
            .respond("pip3 show streamlit", 1, "", "")
            .respond("pip3 install -r deps.txt", 0, "", "")
            .respond(
                "python3 -m streamlit run dashboard.py --server.port 8501 --server.address localhost",
                0,
                "",
                "",
            );

        Launcher::new(&mut host, &config, tmp.path(), false)
            .run(None)
            .unwrap();
        assert_eq!(host.calls_of(CallKind::Stream), vec!["pip3 install -r deps.txt"]);
    }
}
