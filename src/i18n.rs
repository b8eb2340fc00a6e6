//! Operator-language console messages.
//!
//! Every line the launcher prints for the operator goes through [`Messages`].
//! Error types keep English `Display` text (shown by `--debug`); only the
//! rendering here is localized.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::LaunchError;
use crate::launcher::Progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Zh,
}

const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

impl Lang {
    /// Precedence: explicit flag, then config, then the locale environment.
    pub fn resolve(flag: Option<Lang>, config: Option<Lang>) -> Lang {
        flag.or(config).unwrap_or_else(Lang::from_env)
    }

    pub fn from_env() -> Lang {
        Lang::from_lookup(|var| std::env::var(var).ok())
    }

    /// POSIX locale lookup: the first non-empty of LC_ALL, LC_MESSAGES, LANG decides.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Lang {
        let locale = LOCALE_VARS
            .iter()
            .filter_map(|&var| lookup(var))
            .find(|v| !v.is_empty());
        match locale {
            Some(value) => Lang::from_locale(&value),
            None => Lang::En,
        }
    }

    pub fn from_locale(locale: &str) -> Lang {
        if locale.to_ascii_lowercase().starts_with("zh") {
            Lang::Zh
        } else {
            Lang::En
        }
    }
}

pub struct Messages {
    lang: Lang,
}

impl Messages {
    pub fn new(lang: Lang) -> Self {
        Self { lang }
    }

    pub fn progress(&self, event: &Progress) -> String {
        match (self.lang, event) {
            (Lang::En, Progress::ProbingInterpreter) => "Checking Python environment...".into(),
            (Lang::Zh, Progress::ProbingInterpreter) => "正在检查 Python 环境...".into(),

            (Lang::En, Progress::InterpreterFound(tool)) => {
                format!("Found Python ({}): {}", tool.command, tool.version)
            }
            (Lang::Zh, Progress::InterpreterFound(tool)) => {
                format!("找到 Python ({}): {}", tool.command, tool.version)
            }

            (Lang::En, Progress::InterpreterOutdated { found, min }) => format!(
                "warning: Python {} is older than the recommended {}",
                found, min
            ),
            (Lang::Zh, Progress::InterpreterOutdated { found, min }) => {
                format!("警告: Python {} 低于推荐版本 {}", found, min)
            }

            (Lang::En, Progress::ProbingPackageManager) => "Checking pip...".into(),
            (Lang::Zh, Progress::ProbingPackageManager) => "正在检查 pip...".into(),

            (Lang::En, Progress::PackageManagerFound(tool)) => {
                format!("Found pip ({}): {}", tool.command, tool.version)
            }
            (Lang::Zh, Progress::PackageManagerFound(tool)) => {
                format!("找到 pip ({}): {}", tool.command, tool.version)
            }

            (Lang::En, Progress::CheckingDependency { library }) => {
                format!("Checking whether {} is installed...", library)
            }
            (Lang::Zh, Progress::CheckingDependency { library }) => {
                format!("正在检查 {} 是否已安装...", library)
            }

            (Lang::En, Progress::DependencyPresent { library }) => {
                format!("{} is already installed", library)
            }
            (Lang::Zh, Progress::DependencyPresent { library }) => {
                format!("{} 已安装", library)
            }

            (Lang::En, Progress::DependencyMissing { library }) => {
                format!("{} is not installed", library)
            }
            (Lang::Zh, Progress::DependencyMissing { library }) => {
                format!("未检测到 {}", library)
            }

            (Lang::En, Progress::Installing { manifest }) => {
                format!("Installing dependencies from {}...", manifest.display())
            }
            (Lang::Zh, Progress::Installing { manifest }) => {
                format!("正在安装依赖包 ({})...", manifest.display())
            }

            (Lang::En, Progress::Installed) => "Dependencies installed".into(),
            (Lang::Zh, Progress::Installed) => "依赖包安装完成".into(),

            (Lang::En, Progress::EntryFileMissing { path }) => {
                format!("warning: entry file {} does not exist", path.display())
            }
            (Lang::Zh, Progress::EntryFileMissing { path }) => {
                format!("警告: 入口文件 {} 不存在", path.display())
            }

            (Lang::En, Progress::Launching { entry_file, url }) => format!(
                "Starting the Git statistics dashboard ({})...\nOpen {} in your browser\nPress Ctrl+C to stop",
                entry_file.display(),
                url
            ),
            (Lang::Zh, Progress::Launching { entry_file, url }) => format!(
                "正在启动 Git 统计分析仪表板 ({})...\n应用将在浏览器中打开: {}\n按 Ctrl+C 停止应用",
                entry_file.display(),
                url
            ),
        }
    }

    pub fn error(&self, err: &LaunchError) -> String {
        match (self.lang, err) {
            (Lang::En, LaunchError::InterpreterNotFound { tried }) => format!(
                "error: Python not found (tried: {}). Please install Python 3.8 or newer.",
                tried.join(", ")
            ),
            (Lang::Zh, LaunchError::InterpreterNotFound { tried }) => format!(
                "错误: 未找到 Python (已尝试: {})，请先安装 Python 3.8 或更高版本",
                tried.join(", ")
            ),
            (Lang::En, LaunchError::PackageManagerNotFound { tried }) => format!(
                "error: pip not found (tried: {}). Please install pip.",
                tried.join(", ")
            ),
            (Lang::Zh, LaunchError::PackageManagerNotFound { tried }) => format!(
                "错误: 未找到 pip (已尝试: {})，请先安装 pip",
                tried.join(", ")
            ),
            (Lang::En, LaunchError::InstallationFailed { manifest, .. }) => format!(
                "error: failed to install dependencies from {}. Check the output above.",
                manifest.display()
            ),
            (Lang::Zh, LaunchError::InstallationFailed { manifest, .. }) => format!(
                "错误: 依赖包安装失败 ({})，请检查上方输出",
                manifest.display()
            ),
        }
    }

    pub fn dashboard_stopped(&self, code: Option<i32>) -> String {
        match (self.lang, code) {
            (Lang::En, Some(0)) | (Lang::En, None) => "Dashboard stopped".into(),
            (Lang::Zh, Some(0)) | (Lang::Zh, None) => "仪表板已停止".into(),
            (Lang::En, Some(c)) => format!("Dashboard stopped (exit code {})", c),
            (Lang::Zh, Some(c)) => format!("仪表板已停止 (退出码 {})", c),
        }
    }
}
