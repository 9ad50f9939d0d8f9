use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mirrors every formatted log line to stderr and, when configured, a file.
#[derive(Clone, Default)]
struct LogSink {
    file: Arc<Mutex<Option<File>>>,
    file_failed: Arc<AtomicBool>,
}

struct LogSinkWriter {
    file: Arc<Mutex<Option<File>>>,
    file_failed: Arc<AtomicBool>,
}

impl LogSinkWriter {
    /// Only the first file failure is reported; stderr keeps receiving every line.
    fn report_file_error(&self, err: io::Error) {
        if !self.file_failed.swap(true, Ordering::Relaxed) {
            eprintln!("healzy: writing to log file failed: {err}");
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogSink {
    type Writer = LogSinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogSinkWriter {
            file: self.file.clone(),
            file_failed: self.file_failed.clone(),
        }
    }
}

impl Write for LogSinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = io::stderr().write(buf)?;
        let result = match self.file.lock() {
            Ok(mut guard) => guard.as_mut().map(|file| file.write_all(buf)),
            Err(_) => None,
        };
        if let Some(Err(err)) = result {
            self.report_file_error(err);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        let result = match self.file.lock() {
            Ok(mut guard) => guard.as_mut().map(|file| file.flush()),
            Err(_) => None,
        };
        if let Some(Err(err)) = result {
            self.report_file_error(err);
        }
        Ok(())
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber. `log` records are bridged into `tracing`.
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init(log_file: Option<&Path>) {
    let _ = tracing_log::LogTracer::init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let sink = LogSink::default();
    let mut file_error = None;
    if let Some(path) = log_file {
        match open_log_file(path) {
            Ok(file) => {
                if let Ok(mut guard) = sink.file.lock() {
                    *guard = Some(file);
                }
            }
            Err(err) => file_error = Some((path.to_path_buf(), err)),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(sink)
        .try_init();

    if let Some((path, err)) = file_error {
        log::warn!("could not open log file {}: {}", path.display(), err);
    }
}
