//! Client side of the Excel COM bridge: spawns the bridge process and
//! exchanges one JSON line per request with it.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

use excel_com_protocol::{
    Command as BridgeCommand, PageSetup, Request, Response, ResponseData, ResponseResult,
};

use crate::workbook::Workbook;

const BRIDGE_EXE: &str = "excel-com-bridge.exe";

/// Errors from the Excel COM bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Could not start the Excel bridge: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Excel bridge exited unexpectedly")]
    Exited,

    #[error("Lost connection to the Excel bridge: {0}")]
    Pipe(#[source] std::io::Error),

    #[error("Invalid bridge message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Bridge answered request {got}, expected {expected}")]
    OutOfSequence { expected: u64, got: u64 },

    #[error("Excel error: {0}")]
    Excel(String),

    #[error("Bridge returned no {0}")]
    MissingData(&'static str),

    #[error("WINE not found. Install WINE and ensure 'wine' is in PATH.")]
    WineNotFound,

    #[error("Bridge executable not found at: {0}")]
    BridgeExeNotFound(String),
}

/// How the bridge executable is started.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeLauncher {
    /// Run the executable directly (Windows).
    Native,
    /// Run the executable under WINE; paths are translated to `Z:\...`.
    Wine {
        wine_path: PathBuf,
        wine_prefix: Option<PathBuf>,
    },
    /// Run the bridge path with another program, passing host paths as-is.
    Interpreter(PathBuf),
}

impl Default for BridgeLauncher {
    fn default() -> Self {
        if cfg!(windows) {
            BridgeLauncher::Native
        } else {
            BridgeLauncher::Wine {
                wine_path: PathBuf::from("wine"),
                wine_prefix: None,
            }
        }
    }
}

impl BridgeLauncher {
    fn command(&self, exe: &Path) -> Command {
        let mut command = match self {
            BridgeLauncher::Native => return Command::new(exe),
            BridgeLauncher::Wine {
                wine_path,
                wine_prefix,
            } => {
                let mut command = Command::new(wine_path);
                if let Some(prefix) = wine_prefix {
                    command.env("WINEPREFIX", prefix);
                }
                command
            }
            BridgeLauncher::Interpreter(program) => Command::new(program),
        };
        command.arg(exe);
        command
    }

    /// A host path as the bridge process sees it.
    pub fn bridge_path(&self, path: &Path) -> String {
        match self {
            BridgeLauncher::Wine { .. } => linux_to_wine_path(path),
            _ => absolute(path).display().to_string(),
        }
    }
}

/// Configuration for the Excel COM bridge.
#[derive(Debug, Clone, Default)]
pub struct ExcelBridgeConfig {
    /// Path to `excel-com-bridge.exe`. If None, common locations are searched.
    pub bridge_exe_path: Option<PathBuf>,
    pub launcher: BridgeLauncher,
}

struct Channel {
    child: Child,
    /// Taken on shutdown so the bridge sees end of input.
    to_bridge: Option<ChildStdin>,
    from_bridge: BufReader<ChildStdout>,
    last_id: u64,
}

impl Channel {
    fn round_trip(&mut self, command: BridgeCommand) -> Result<Option<ResponseData>, BridgeError> {
        self.last_id += 1;
        let request = Request {
            id: self.last_id,
            command,
        };

        let mut line = serde_json::to_string(&request)?;
        line.push('\n');
        let to_bridge = self.to_bridge.as_mut().ok_or(BridgeError::Exited)?;
        to_bridge
            .write_all(line.as_bytes())
            .and_then(|()| to_bridge.flush())
            .map_err(BridgeError::Pipe)?;

        line.clear();
        if self.from_bridge.read_line(&mut line).map_err(BridgeError::Pipe)? == 0 {
            return Err(BridgeError::Exited);
        }
        let response: Response = serde_json::from_str(&line)?;
        if response.id != request.id {
            return Err(BridgeError::OutOfSequence {
                expected: request.id,
                got: response.id,
            });
        }

        match response.result {
            ResponseResult::Ok { data } => Ok(data),
            ResponseResult::Error { message } => Err(BridgeError::Excel(message)),
        }
    }
}

/// A running bridge process with an initialized Excel instance.
///
/// Dropping it without [`shutdown`](Self::shutdown) kills the process.
pub struct ExcelBridge {
    channel: Mutex<Channel>,
    launcher: BridgeLauncher,
}

impl ExcelBridge {
    /// Start the bridge process and initialize Excel.
    pub fn start(config: ExcelBridgeConfig) -> Result<Self, BridgeError> {
        let exe = config.bridge_exe_path.unwrap_or_else(find_bridge_exe);
        if !exe.exists() {
            return Err(BridgeError::BridgeExeNotFound(exe.display().to_string()));
        }

        let mut command = config.launcher.command(&exe);
        // Bridge diagnostics share our stderr
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        tracing::debug!("Starting Excel bridge: {:?}", command);

        let mut child = command.spawn().map_err(|e| match config.launcher {
            BridgeLauncher::Wine { .. } if e.kind() == std::io::ErrorKind::NotFound => {
                BridgeError::WineNotFound
            }
            _ => BridgeError::Spawn(e),
        })?;

        let (Some(to_bridge), Some(from_bridge)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(BridgeError::Exited);
        };

        let bridge = Self {
            channel: Mutex::new(Channel {
                child,
                to_bridge: Some(to_bridge),
                from_bridge: BufReader::new(from_bridge),
                last_id: 0,
            }),
            launcher: config.launcher,
        };
        bridge.send(BridgeCommand::Init)?;
        tracing::info!("Excel bridge initialized");
        Ok(bridge)
    }

    fn send(&self, command: BridgeCommand) -> Result<Option<ResponseData>, BridgeError> {
        self.channel
            .lock()
            .map_err(|_| BridgeError::Exited)?
            .round_trip(command)
    }

    /// Open an existing workbook read-only.
    pub fn open_workbook(&self, path: &Path) -> Result<Workbook<'_>, BridgeError> {
        let path = self.launcher.bridge_path(path);
        match self.send(BridgeCommand::OpenWorkbook { path })? {
            Some(ResponseData::WorkbookHandle { workbook }) => Ok(Workbook::new(self, workbook)),
            _ => Err(BridgeError::MissingData("workbook handle")),
        }
    }

    /// Quit Excel and wait for the bridge process to exit.
    pub fn shutdown(self) -> Result<(), BridgeError> {
        let result = self.send(BridgeCommand::Shutdown);
        if let Ok(mut channel) = self.channel.lock() {
            drop(channel.to_bridge.take());
            let _ = channel.child.wait();
        }
        result.map(drop)
    }

    pub(crate) fn list_sheets(&self, workbook: u64) -> Result<Vec<String>, BridgeError> {
        match self.send(BridgeCommand::ListSheets { workbook })? {
            Some(ResponseData::SheetNames { sheets }) => Ok(sheets),
            _ => Err(BridgeError::MissingData("sheet names")),
        }
    }

    pub(crate) fn export_sheet_pdf(
        &self,
        workbook: u64,
        sheet: &str,
        path: &Path,
        page_setup: &PageSetup,
    ) -> Result<(), BridgeError> {
        self.send(BridgeCommand::ExportSheetPdf {
            workbook,
            sheet: sheet.to_string(),
            path: self.launcher.bridge_path(path),
            page_setup: page_setup.clone(),
        })
        .map(drop)
    }

    pub(crate) fn close_workbook(&self, workbook: u64) -> Result<(), BridgeError> {
        self.send(BridgeCommand::CloseWorkbook { workbook }).map(drop)
    }
}

impl Drop for ExcelBridge {
    fn drop(&mut self) {
        let channel = match self.channel.get_mut() {
            Ok(channel) => channel,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Ok(None) = channel.child.try_wait() {
            tracing::warn!("Excel bridge still running, killing it");
            let _ = channel.child.kill();
            let _ = channel.child.wait();
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Convert a Linux filesystem path to a WINE (Windows) path.
///
/// WINE maps `/` to `Z:\`, so `/home/user/file.xlsx` becomes `Z:\home\user\file.xlsx`.
pub fn linux_to_wine_path(linux_path: &Path) -> String {
    format!("Z:{}", absolute(linux_path).display()).replace('/', "\\")
}

/// Next to the running executable, then the cross-compiled target directories.
fn find_bridge_exe() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(BRIDGE_EXE)));
    let built = ["release", "debug"]
        .map(|profile| Path::new("target/x86_64-pc-windows-gnu").join(profile).join(BRIDGE_EXE));

    beside_exe
        .into_iter()
        .chain(built)
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(BRIDGE_EXE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_to_wine_path() {
        assert_eq!(
            linux_to_wine_path(Path::new("/home/user/設計書.xlsx")),
            "Z:\\home\\user\\設計書.xlsx"
        );
    }

    #[test]
    fn test_relative_wine_path_is_absolutized() {
        let path = linux_to_wine_path(Path::new("out/a.pdf"));
        assert!(path.starts_with("Z:\\"));
        assert!(path.ends_with("\\out\\a.pdf"));
    }

    #[test]
    fn test_interpreter_keeps_host_paths() {
        let launcher = BridgeLauncher::Interpreter(PathBuf::from("/bin/sh"));
        assert_eq!(launcher.bridge_path(Path::new("/tmp/a.xlsx")), "/tmp/a.xlsx");
    }

    #[test]
    fn test_wine_command_line() {
        let launcher = BridgeLauncher::Wine {
            wine_path: PathBuf::from("/usr/bin/wine64"),
            wine_prefix: Some(PathBuf::from("/opt/excel")),
        };
        let command = launcher.command(Path::new("/opt/bridge/excel-com-bridge.exe"));
        assert_eq!(command.get_program(), "/usr/bin/wine64");
        assert_eq!(
            command.get_args().collect::<Vec<_>>(),
            vec!["/opt/bridge/excel-com-bridge.exe"]
        );
        assert!(command
            .get_envs()
            .any(|(k, v)| k == "WINEPREFIX" && v == Some("/opt/excel".as_ref())));
    }

    #[test]
    fn test_missing_bridge_exe() {
        let config = ExcelBridgeConfig {
            bridge_exe_path: Some(PathBuf::from("/nonexistent/excel-com-bridge.exe")),
            launcher: BridgeLauncher::Native,
        };
        assert!(matches!(
            ExcelBridge::start(config),
            Err(BridgeError::BridgeExeNotFound(_))
        ));
    }
}
