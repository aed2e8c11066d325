// Progress observation, decoupled from any rendering.

use std::io::{self, Read};
use std::sync::Arc;

/// Observer of byte-level transfer progress.
///
/// Implementations are called from the transfer path and must return
/// quickly; anything slow (drawing to a terminal) has to be rate limited or
/// handed off.
pub trait ProgressSink: Send + Sync {
    /// Called once before the first byte moves. `total` is `None` when the
    /// size is not known in advance.
    fn on_start(&self, _total: Option<u64>) {}

    /// Total bytes moved so far.
    fn on_progress(&self, transferred: u64);

    fn on_complete(&self);

    fn on_failure(&self, reason: &str);
}

pub type SharedSink = Arc<dyn ProgressSink>;

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _transferred: u64) {}
    fn on_complete(&self) {}
    fn on_failure(&self, _reason: &str) {}
}

pub fn null_sink() -> SharedSink {
    Arc::new(NullSink)
}

/// `Read` adapter that reports the running byte count of everything read
/// through it.
pub struct ProgressReader<R> {
    inner: R,
    sink: SharedSink,
    transferred: u64,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, sink: SharedSink) -> Self {
        ProgressReader {
            inner,
            sink,
            transferred: 0,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.transferred += n as u64;
            self.sink.on_progress(self.transferred);
        }
        Ok(n)
    }
}
