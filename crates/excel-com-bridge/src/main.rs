//! Windows helper process that exports Excel worksheets to PDF.
//!
//! Reads one [`Request`](excel_com_protocol::Request) per line on stdin and
//! answers with one [`Response`](excel_com_protocol::Response) per line on
//! stdout. Everything else goes to stderr. Runs natively on Windows or, when
//! cross-compiled from Linux, under WINE.

#[cfg(windows)]
mod dispatch;
#[cfg(windows)]
mod excel;

#[cfg(not(windows))]
fn main() {
    eprintln!("excel-com-bridge only runs on Windows (build with --target x86_64-pc-windows-gnu");
    eprintln!("and start it natively or through WINE)");
    std::process::exit(1);
}

#[cfg(windows)]
fn main() {
    use std::io::{self, BufRead};

    use excel_com_protocol::{Command, Request, Response};

    log("ready");

    let mut session = session::Session::default();
    let mut out = io::stdout().lock();

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log(&format!("cannot read stdin: {e}"));
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(line.trim()) {
            Ok(request) => request,
            Err(e) => {
                // No id to answer to
                send(&mut out, &Response::error(0, format!("Malformed request: {e}")));
                continue;
            }
        };

        // The client stops talking after Shutdown whatever its outcome
        let done = matches!(request.command, Command::Shutdown);
        let result = session.handle(&request.command);
        send(&mut out, &Response { id: request.id, result: result.into() });
        if done {
            break;
        }
    }

    // Dropping the session quits Excel if the client went away without Shutdown
    drop(session);
    log("exiting");
}

#[cfg(windows)]
fn log(message: &str) {
    eprintln!("[excel-com-bridge] {message}");
}

#[cfg(windows)]
fn send(out: &mut impl std::io::Write, response: &excel_com_protocol::Response) {
    match serde_json::to_string(response) {
        Ok(json) => {
            let _ = writeln!(out, "{json}");
            let _ = out.flush();
        }
        Err(e) => log(&format!("cannot serialize response: {e}")),
    }
}

#[cfg(windows)]
mod session {
    use excel_com_protocol::{Command, ResponseData};
    use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};

    use crate::excel::ExcelApp;
    use crate::log;

    pub type CommandResult = Result<Option<ResponseData>, String>;

    /// COM initialized on this thread as a single-threaded apartment (Excel
    /// requires STA). Uninitialized on drop.
    struct Apartment;

    impl Apartment {
        fn enter() -> Result<Self, String> {
            unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
                .ok()
                .map_err(|e| format!("CoInitializeEx failed: {e}"))?;
            Ok(Apartment)
        }
    }

    impl Drop for Apartment {
        fn drop(&mut self) {
            unsafe { CoUninitialize() };
        }
    }

    /// Excel plus the apartment it lives in. Field order matters: Excel must
    /// be released before COM is uninitialized.
    struct Running {
        excel: ExcelApp,
        _apartment: Apartment,
    }

    #[derive(Default)]
    pub struct Session {
        running: Option<Running>,
    }

    impl Session {
        pub fn handle(&mut self, command: &Command) -> CommandResult {
            match command {
                Command::Init => self.init().map(|()| None),
                Command::Shutdown => self.shutdown().map(|()| None),
                Command::OpenWorkbook { path } => {
                    let workbook = self.excel()?.open_workbook(path)?;
                    Ok(Some(ResponseData::WorkbookHandle { workbook }))
                }
                Command::ListSheets { workbook } => {
                    let sheets = self.excel()?.sheet_names(*workbook)?;
                    Ok(Some(ResponseData::SheetNames { sheets }))
                }
                Command::ExportSheetPdf {
                    workbook,
                    sheet,
                    path,
                    page_setup,
                } => {
                    self.excel()?
                        .export_sheet_pdf(*workbook, sheet, path, page_setup)?;
                    Ok(None)
                }
                Command::CloseWorkbook { workbook } => {
                    self.excel()?.close_workbook(*workbook)?;
                    Ok(None)
                }
            }
        }

        fn init(&mut self) -> Result<(), String> {
            if self.running.is_some() {
                return Ok(());
            }
            let apartment = Apartment::enter()?;
            let excel = ExcelApp::new()
                .map_err(|e| format!("Cannot start Excel.Application (is Excel installed?): {e}"))?;
            log("Excel started");
            self.running = Some(Running {
                excel,
                _apartment: apartment,
            });
            Ok(())
        }

        fn shutdown(&mut self) -> Result<(), String> {
            match self.running.take() {
                Some(running) => {
                    let result = running.excel.shutdown();
                    log("Excel stopped");
                    result.map_err(|e| format!("Shutdown failed: {e}"))
                }
                None => Ok(()),
            }
        }

        fn excel(&mut self) -> Result<&mut ExcelApp, String> {
            self.running
                .as_mut()
                .map(|r| &mut r.excel)
                .ok_or_else(|| "Excel is not running; send Init first".to_string())
        }
    }

    impl Drop for Session {
        fn drop(&mut self) {
            if self.running.is_some() {
                log("client disconnected, stopping Excel");
                let _ = self.shutdown();
            }
        }
    }
}
