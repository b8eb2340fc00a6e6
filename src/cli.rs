use clap::Parser;
use std::path::PathBuf;

use crate::i18n::Lang;

/// With no arguments: find Python and pip, install the dashboard's
/// dependencies if streamlit is missing, then serve the dashboard on
/// http://localhost:8501 until Ctrl+C.
#[derive(Parser)]
#[command(
    name = "dashboard-launcher",
    version,
    about = "Bootstrap and start the Git statistics dashboard"
)]
pub struct Cli {
    /// Directory holding the entry file and dependency manifest [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
    /// Config file to use instead of the per-user default
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Console language [default: from the locale]
    #[arg(long, value_enum)]
    pub lang: Option<Lang>,
    /// Check the environment without installing or launching anything
    #[arg(long)]
    pub check: bool,
    /// Print the check report as JSON
    #[arg(long, requires = "check")]
    pub json: bool,
    /// Print diagnostics to stderr
    #[arg(long, env = "DASHBOARD_LAUNCHER_DEBUG")]
    pub debug: bool,
    /// Print the config file path and exit
    #[arg(long)]
    pub show_config_path: bool,
}
