//! Output capture (§4.5 step 4, §6 Process surface): tracing-subscriber is
//! the only stdout/stderr interception the rest of the workspace does
//! (§6), so the supervisor scopes a dedicated subscriber over the agent's
//! run rather than redirecting raw file descriptors. `WARN`/`ERROR` events
//! are bucketed into `stderr`; everything else into `stdout`.

use std::sync::Arc;
use std::sync::Mutex;

use helm_protocol::sandbox::CapturedOutput;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<String>>);

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut guard) = self.0.lock() {
            guard.push_str(&String::from_utf8_lossy(buf));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct LevelRoutedWriter {
    stdout: SharedBuffer,
    stderr: SharedBuffer,
}

impl<'a> MakeWriter<'a> for LevelRoutedWriter {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.stdout.clone()
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        if *meta.level() <= Level::WARN {
            self.stderr.clone()
        } else {
            self.stdout.clone()
        }
    }
}

/// A tracing subscriber scoped to one sandboxed run, collecting its log
/// output into a [`CapturedOutput`] once the scope ends.
pub struct OutputCapture {
    stdout: SharedBuffer,
    stderr: SharedBuffer,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self {
            stdout: SharedBuffer::default(),
            stderr: SharedBuffer::default(),
        }
    }

    /// Run `future` with this capture installed as the default subscriber
    /// for the duration of the call.
    pub async fn scope<F, T>(&self, future: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let writer = LevelRoutedWriter {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        };
        let subscriber = tracing_subscriber::fmt().with_writer(writer).with_ansi(false).finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        future.await
    }

    pub fn finish(self) -> CapturedOutput {
        CapturedOutput {
            stdout: self.stdout.0.lock().map(|g| g.clone()).unwrap_or_default(),
            stderr: self.stderr.0.lock().map(|g| g.clone()).unwrap_or_default(),
        }
    }
}

impl Default for OutputCapture {
    fn default() -> Self {
        Self::new()
    }
}
