use anyhow::Result;
use std::path::Path;

use crate::config::LauncherConfig;
use crate::launcher::{LaunchResult, Launcher, Progress};
use crate::probe::Host;

/// Full run: every gate, then the dashboard in the foreground. Returns after
/// the dashboard exits.
pub fn cmd_launch<H: Host>(
    host: &mut H,
    config: &LauncherConfig,
    project_dir: &Path,
    debug: bool,
    on_progress: Option<&dyn Fn(Progress)>,
) -> Result<LaunchResult> {
    let mut launcher = Launcher::new(host, config, project_dir, debug);
    launcher.run(on_progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CallKind, FakeHost, LAUNCH_LINE};

    #[test]
    fn cmd_launch_runs_dashboard_once() {
        let tmp = tempfile::tempdir().unwrap();
        let config = LauncherConfig {
            interpreters: vec!["python3".into()],
            package_managers: vec!["pip3".into()],
            ..LauncherConfig::default()
        };
        let mut host = FakeHost::new()
            .with_tool("python3", "Python 3.12.3")
            .with_tool("pip3", "pip 24.0")
            .respond("pip3 show streamlit", 0, "", "")
            .respond(LAUNCH_LINE, 0, "", "");

        let result = cmd_launch(&mut host, &config, tmp.path(), false, None).unwrap();

        assert!(result.dashboard_exit.success);
        assert_eq!(host.calls_of(CallKind::Foreground), vec![LAUNCH_LINE]);
    }
}
