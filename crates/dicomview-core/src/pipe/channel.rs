//! Bounded, blocking byte pipe between one producer and one consumer.
//!
//! The writer blocks while the pipe holds `capacity` bytes; the reader blocks
//! while it is empty. Bytes come out in exactly the order they went in.
//! The read end implements [`std::io::Read`], so any decoder that consumes a
//! reader can sit on the consumer side.

use serde::Serialize;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Create a pipe buffering at most `capacity` bytes.
///
/// A capacity of zero is bumped to one byte so the pipe can make progress.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            buf: VecDeque::with_capacity(capacity.max(1)),
            writer: WriterEnd::Open,
            reader_open: true,
            reader_saw_end: false,
            aborted: None,
            bytes_written: 0,
            bytes_read: 0,
            peak_buffered: 0,
            producer_closes: 0,
        }),
        readable: Condvar::new(),
        writable: Condvar::new(),
        capacity: capacity.max(1),
    });

    (
        PipeWriter {
            shared: Arc::clone(&shared),
            finished: false,
        },
        PipeReader { shared },
    )
}

/// How a producer-side close ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    /// The consumer drained the pipe or released its end within the grace period
    Acknowledged,
    /// The grace period ran out first; the pipe is closed regardless
    TimedOut,
}

/// Counters describing what went through a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PipeStats {
    /// Configured capacity in bytes
    pub capacity: usize,
    /// Total bytes accepted from the producer
    pub bytes_written: u64,
    /// Total bytes handed to the consumer
    pub bytes_read: u64,
    /// Highest number of bytes buffered at any instant
    pub peak_buffered: usize,
    /// Number of producer-side closes (1 after a finished run)
    pub producer_closes: u32,
}

#[derive(Debug, Clone)]
enum WriterEnd {
    Open,
    Closed,
    Failed(String),
}

struct State {
    buf: VecDeque<u8>,
    writer: WriterEnd,
    reader_open: bool,
    reader_saw_end: bool,
    aborted: Option<String>,
    bytes_written: u64,
    bytes_read: u64,
    peak_buffered: usize,
    producer_closes: u32,
}

impl State {
    fn consumer_done(&self) -> bool {
        !self.reader_open || (self.reader_saw_end && self.buf.is_empty())
    }
}

struct Shared {
    state: Mutex<State>,
    /// Signalled when data arrives, the writer closes, or the pipe is aborted.
    readable: Condvar,
    /// Signalled when space frees up, the reader finishes, or the pipe is aborted.
    writable: Condvar,
    capacity: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_writer(&self, end: WriterEnd, timeout: Option<Duration>) -> CloseOutcome {
        let mut state = self.lock();
        state.writer = end;
        state.producer_closes += 1;
        self.readable.notify_all();

        let Some(timeout) = timeout else {
            return if state.consumer_done() {
                CloseOutcome::Acknowledged
            } else {
                CloseOutcome::TimedOut
            };
        };

        let deadline = Instant::now() + timeout;
        while !state.consumer_done() && state.aborted.is_none() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (guard, _) = self
                .writable
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }

        if state.consumer_done() {
            CloseOutcome::Acknowledged
        } else {
            CloseOutcome::TimedOut
        }
    }

    fn abort(&self, reason: &str) {
        let mut state = self.lock();
        if state.aborted.is_none() {
            state.aborted = Some(reason.to_string());
        }
        self.readable.notify_all();
        self.writable.notify_all();
    }

    fn stats(&self) -> PipeStats {
        let state = self.lock();
        PipeStats {
            capacity: self.capacity,
            bytes_written: state.bytes_written,
            bytes_read: state.bytes_read,
            peak_buffered: state.peak_buffered,
            producer_closes: state.producer_closes,
        }
    }
}

/// Write end of a [`pipe`].
///
/// Dropping an unclosed writer closes it without waiting for the consumer.
pub struct PipeWriter {
    shared: Arc<Shared>,
    finished: bool,
}

impl PipeWriter {
    /// Buffer all of `data`, blocking while the pipe is full.
    ///
    /// Large writes are delivered in pieces as the consumer frees space, so the
    /// buffered amount never exceeds the capacity. Fails with
    /// [`io::ErrorKind::BrokenPipe`] once the reader is gone or the pipe was aborted.
    pub fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        let shared = &*self.shared;
        let mut state = shared.lock();

        while !data.is_empty() {
            if let Some(reason) = &state.aborted {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, reason.clone()));
            }
            if !state.reader_open {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "pipe reader was released",
                ));
            }

            let free = shared.capacity - state.buf.len();
            if free == 0 {
                state = shared
                    .writable
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            }

            let n = free.min(data.len());
            state.buf.extend(&data[..n]);
            state.bytes_written += n as u64;
            state.peak_buffered = state.peak_buffered.max(state.buf.len());
            data = &data[n..];
            shared.readable.notify_one();
        }

        Ok(())
    }

    /// Signal end of stream, then wait up to `timeout` for the consumer to drain.
    ///
    /// The writer is finalized whether or not the consumer acknowledges.
    pub fn close(mut self, timeout: Duration) -> CloseOutcome {
        self.finished = true;
        self.shared.finish_writer(WriterEnd::Closed, Some(timeout))
    }

    /// Like [`close`](Self::close), but the consumer sees `message` as an error
    /// after draining instead of a clean end of stream.
    pub fn close_with_error(mut self, message: impl Into<String>, timeout: Duration) -> CloseOutcome {
        self.finished = true;
        self.shared
            .finish_writer(WriterEnd::Failed(message.into()), Some(timeout))
    }

    /// A handle to the shared pipe for aborting it or reading its counters.
    pub fn handle(&self) -> PipeHandle {
        PipeHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            self.shared.finish_writer(WriterEnd::Closed, None);
        }
    }
}

/// Read end of a [`pipe`].
pub struct PipeReader {
    shared: Arc<Shared>,
}

impl PipeReader {
    /// A handle to the shared pipe for aborting it or reading its counters.
    pub fn handle(&self) -> PipeHandle {
        PipeHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let shared = &*self.shared;
        let mut state = shared.lock();

        loop {
            if let Some(reason) = &state.aborted {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, reason.clone()));
            }

            if !state.buf.is_empty() {
                let n = out.len().min(state.buf.len());
                for (dst, src) in out.iter_mut().zip(state.buf.drain(..n)) {
                    *dst = src;
                }
                state.bytes_read += n as u64;
                shared.writable.notify_one();
                return Ok(n);
            }

            match state.writer.clone() {
                WriterEnd::Open => {
                    state = shared
                        .readable
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                WriterEnd::Closed => {
                    state.reader_saw_end = true;
                    shared.writable.notify_all();
                    return Ok(0);
                }
                WriterEnd::Failed(message) => {
                    state.reader_saw_end = true;
                    shared.writable.notify_all();
                    return Err(io::Error::other(message));
                }
            }
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.reader_open = false;
        self.shared.writable.notify_all();
    }
}

/// Shared view of a pipe, usable from outside the producer and consumer.
#[derive(Clone)]
pub struct PipeHandle {
    shared: Arc<Shared>,
}

impl PipeHandle {
    /// Tear the pipe down. Blocked reads and writes fail with `BrokenPipe`,
    /// and a producer waiting in `close` stops waiting.
    pub fn abort(&self, reason: &str) {
        self.shared.abort(reason);
    }

    /// Whether [`abort`](Self::abort) has been called.
    pub fn is_aborted(&self) -> bool {
        self.shared.lock().aborted.is_some()
    }

    /// Snapshot of the pipe's counters.
    pub fn stats(&self) -> PipeStats {
        self.shared.stats()
    }
}

impl std::fmt::Debug for PipeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeHandle")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_bytes_arrive_in_order() {
        let (mut writer, mut reader) = pipe(8);

        let producer = thread::spawn(move || {
            let data: Vec<u8> = (0..100u8).collect();
            writer.write_all(&data).unwrap();
            writer.close(Duration::from_secs(5))
        });

        let mut received = Vec::new();
        reader.read_to_end(&mut received).unwrap();
        drop(reader);

        assert_eq!(received, (0..100u8).collect::<Vec<_>>());
        assert_eq!(producer.join().unwrap(), CloseOutcome::Acknowledged);
    }

    #[test]
    fn test_buffered_bytes_never_exceed_capacity() {
        let (mut writer, mut reader) = pipe(16);
        let handle = writer.handle();

        let producer = thread::spawn(move || {
            writer.write_all(&[7u8; 1000]).unwrap();
            writer.close(Duration::from_secs(5));
        });

        let mut total = 0;
        let mut chunk = [0u8; 3];
        loop {
            let n = reader.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            total += n;
        }
        producer.join().unwrap();

        let stats = handle.stats();
        assert_eq!(total, 1000);
        assert!(stats.peak_buffered <= 16);
        assert_eq!(stats.bytes_written, 1000);
        assert_eq!(stats.bytes_read, 1000);
    }

    #[test]
    fn test_empty_pipe_reports_end_after_close() {
        let (writer, mut reader) = pipe(4);
        let outcome = writer.close(Duration::ZERO);
        assert_eq!(outcome, CloseOutcome::TimedOut);

        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_close_with_error_surfaces_after_drain() {
        let (mut writer, mut reader) = pipe(16);
        writer.write_all(b"abc").unwrap();
        writer.close_with_error("source failed", Duration::ZERO);

        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        let err = reader.read(&mut buf).unwrap_err();
        assert!(err.to_string().contains("source failed"));
    }

    #[test]
    fn test_write_fails_once_reader_is_released() {
        let (mut writer, reader) = pipe(4);
        drop(reader);
        let err = writer.write_all(b"hello").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_blocked_writer_wakes_when_reader_drops() {
        let (mut writer, reader) = pipe(4);

        let producer = thread::spawn(move || writer.write_all(&[1u8; 64]));
        thread::sleep(Duration::from_millis(50));
        drop(reader);

        let err = producer.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_close_times_out_without_consumer() {
        let (mut writer, _reader) = pipe(64);
        writer.write_all(b"unread").unwrap();

        let started = Instant::now();
        let outcome = writer.close(Duration::from_millis(50));
        assert_eq!(outcome, CloseOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_close_acknowledged_when_reader_releases() {
        let (mut writer, reader) = pipe(64);
        writer.write_all(b"partial").unwrap();

        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(reader);
        });

        let outcome = writer.close(Duration::from_secs(5));
        consumer.join().unwrap();
        assert_eq!(outcome, CloseOutcome::Acknowledged);
    }

    #[test]
    fn test_abort_unblocks_reader() {
        let (writer, mut reader) = pipe(4);
        let handle = writer.handle();

        let consumer = thread::spawn(move || {
            let mut buf = [0u8; 4];
            reader.read(&mut buf)
        });
        thread::sleep(Duration::from_millis(20));
        handle.abort("cancelled");

        let err = consumer.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(handle.is_aborted());
        drop(writer);
    }

    #[test]
    fn test_dropping_writer_counts_as_one_close() {
        let (writer, reader) = pipe(4);
        let handle = reader.handle();
        drop(writer);
        assert_eq!(handle.stats().producer_closes, 1);
    }

    #[test]
    fn test_explicit_close_is_not_repeated_on_drop() {
        let (writer, reader) = pipe(4);
        let handle = reader.handle();
        drop(reader);
        writer.close(Duration::from_millis(10));
        assert_eq!(handle.stats().producer_closes, 1);
    }
}
