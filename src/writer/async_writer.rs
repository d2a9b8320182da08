//! Asynchronous forwarding for variant writers.
//!
//! This module provides [`AsyncVariantWriter`], which moves serialization,
//! compression and I/O to a dedicated background thread so the producer can
//! keep preparing records without blocking on disk writes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     bounded channel      ┌─────────────────┐
//! │  Producer   │ ──Header / Record────▶   │ Background      │
//! │  (caller)   │      (move)              │ Writer Thread   │
//! │             │ ◀────error slot──────    │ (backend + I/O) │
//! └─────────────┘   Arc<Mutex<Option>>     └─────────────────┘
//! ```
//!
//! Messages are applied to the wrapped writer in submission order, so the
//! bytes produced are identical to calling the wrapped writer directly.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};

use super::{VariantWriter, WriterError, WriterStats};
use crate::variant::{VariantRecord, VcfHeader};

/// Name of the background thread, visible in `top` and debuggers
pub const WRITER_THREAD_NAME: &str = "varsink-writer";

enum Message {
    Header(VcfHeader),
    Record(VariantRecord),
    Flush,
}

type ErrorSlot = Arc<Mutex<Option<String>>>;

fn read_slot(slot: &ErrorSlot) -> Option<String> {
    match slot.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Store `message` unless an earlier error is already recorded
fn record_first(slot: &ErrorSlot, message: String) {
    let mut guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if guard.is_none() {
        *guard = Some(message);
    }
}

/// Wrapper that forwards every call to a background thread.
///
/// # Backpressure
///
/// Uses a bounded channel so a fast producer cannot exhaust memory. When the
/// queue is full, [`add`](VariantWriter::add) blocks until the worker catches up.
///
/// # Error Handling
///
/// The first error raised by the wrapped writer is stored and reported by the
/// next submission, by [`check_error`](VariantWriter::check_error) and by
/// [`close`](VariantWriter::close). Once the worker has failed it closes the
/// wrapped writer and stops accepting messages.
///
/// # Drop Safety
///
/// If the writer is dropped without `close()`, the destructor disconnects the
/// queue, waits for the worker to drain it and logs a warning.
pub struct AsyncVariantWriter {
    /// Channel sender (None after close)
    sender: Option<Sender<Message>>,
    /// Background thread handle (None after close)
    handle: Option<JoinHandle<Result<WriterStats, String>>>,
    /// First error encountered by the worker
    first_error: ErrorSlot,
}

impl AsyncVariantWriter {
    /// Spawn the worker around `inner` with a queue of `queue_size` messages
    ///
    /// # Errors
    ///
    /// Returns an error if the background thread fails to spawn.
    pub fn new(
        mut inner: Box<dyn VariantWriter>,
        queue_size: usize,
    ) -> Result<Self, WriterError> {
        let (sender, receiver) = bounded::<Message>(queue_size.max(1));
        let first_error: ErrorSlot = Arc::new(Mutex::new(None));
        let worker_error = Arc::clone(&first_error);

        let handle = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || {
                for message in receiver {
                    let result = match message {
                        Message::Header(header) => inner.write_header(&header),
                        Message::Record(record) => inner.add_owned(record),
                        Message::Flush => inner.flush(),
                    };
                    if let Err(e) = result {
                        let err_str = e.to_string();
                        record_first(&worker_error, err_str.clone());
                        // Release the output; the first error is the one reported
                        if let Err(close_err) = inner.close() {
                            log::debug!("Closing after background error failed: {}", close_err);
                        }
                        return Err(err_str);
                    }
                }

                // Channel disconnected - close the wrapped writer
                inner.close().map_err(|e| {
                    let err_str = e.to_string();
                    record_first(&worker_error, err_str.clone());
                    err_str
                })
            })
            .map_err(|e| {
                WriterError::BackgroundWriterError(format!("Failed to spawn writer thread: {}", e))
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            first_error,
        })
    }

    fn submit(&self, message: Message) -> Result<(), WriterError> {
        // Fail-fast: check if background thread already errored
        self.check_error()?;

        let sender = self.sender.as_ref().ok_or(WriterError::Closed)?;

        // Blocks while the queue is full
        sender.send(message).map_err(|_| {
            // Channel disconnected - background thread must have exited
            match read_slot(&self.first_error) {
                Some(msg) => WriterError::BackgroundWriterError(msg),
                None => WriterError::BackgroundWriterError(
                    "Background writer thread exited unexpectedly".to_string(),
                ),
            }
        })
    }
}

impl VariantWriter for AsyncVariantWriter {
    fn write_header(&mut self, header: &VcfHeader) -> Result<(), WriterError> {
        self.submit(Message::Header(header.clone()))
    }

    fn add(&mut self, record: &VariantRecord) -> Result<(), WriterError> {
        self.submit(Message::Record(record.clone()))
    }

    fn add_owned(&mut self, record: VariantRecord) -> Result<(), WriterError> {
        self.submit(Message::Record(record))
    }

    fn flush(&mut self) -> Result<(), WriterError> {
        self.submit(Message::Flush)
    }

    fn check_error(&self) -> Result<(), WriterError> {
        match read_slot(&self.first_error) {
            Some(err) => Err(WriterError::BackgroundWriterError(err)),
            None => Ok(()),
        }
    }

    /// Disconnect the queue, wait for the worker to drain it and close the
    /// wrapped writer, then return its statistics or the first error.
    fn close(&mut self) -> Result<WriterStats, WriterError> {
        // Drop sender to signal background thread to stop
        self.sender.take();

        let handle = self.handle.take().ok_or(WriterError::Closed)?;

        match handle.join() {
            Ok(Ok(stats)) => Ok(stats),
            Ok(Err(err_str)) => Err(WriterError::BackgroundWriterError(err_str)),
            Err(_panic) => Err(WriterError::ThreadPanicked),
        }
    }
}

impl Drop for AsyncVariantWriter {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            log::warn!("AsyncVariantWriter dropped without close(); waiting for queued records");
            // Best-effort join - errors cannot be returned from Drop
            let _ = handle.join();
        }
    }
}
