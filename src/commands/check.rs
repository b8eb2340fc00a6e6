use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{dashboard_url, LauncherConfig};
use crate::launcher::Launcher;
use crate::probe::{Host, ResolvedTool};

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub project_dir: PathBuf,
    pub interpreter: ResolvedTool,
    pub package_manager: ResolvedTool,
    pub library: String,
    pub library_installed: bool,
    pub manifest: FileCheck,
    pub entry_file: FileCheck,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct FileCheck {
    pub path: PathBuf,
    pub exists: bool,
}

impl FileCheck {
    fn new(project_dir: &Path, path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            exists: project_dir.join(path).exists(),
        }
    }
}

/// Runs the discovery gates and the dependency query only. Nothing is
/// installed and nothing is launched.
pub fn cmd_check<H: Host>(
    host: &mut H,
    config: &LauncherConfig,
    project_dir: &Path,
    debug: bool,
) -> Result<CheckResult> {
    let mut launcher = Launcher::new(host, config, project_dir, debug);
    let interpreter = launcher.discover_interpreter(None)?;
    let package_manager = launcher.discover_package_manager(None)?;
    let library_installed = launcher.check_dependency(&package_manager, None)?;

    Ok(CheckResult {
        project_dir: project_dir.to_path_buf(),
        interpreter,
        package_manager,
        library: config.required_library.clone(),
        library_installed,
        manifest: FileCheck::new(project_dir, &config.manifest),
        entry_file: FileCheck::new(project_dir, &config.entry_file),
        url: dashboard_url(),
    })
}

pub fn format_check_human(result: &CheckResult) -> String {
    let tool = |t: &ResolvedTool| format!("{} ({})", t.command, t.version);
    let file = |f: &FileCheck| {
        if f.exists {
            f.path.display().to_string()
        } else {
            format!("{} (missing)", f.path.display())
        }
    };
    let library_label = format!("{}:", result.library);
    let library_state = if result.library_installed {
        "installed"
    } else {
        "not installed"
    };

    let rows = [
        ("interpreter:", tool(&result.interpreter)),
        ("pip:", tool(&result.package_manager)),
        (library_label.as_str(), library_state.to_string()),
        ("manifest:", file(&result.manifest)),
        ("entry file:", file(&result.entry_file)),
        ("dashboard:", result.url.clone()),
    ];

    rows.iter()
        .map(|(label, value)| format!("{:<13}{}", label, value))
        .collect::<Vec<_>>()
        .join("\n")
}
