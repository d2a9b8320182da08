use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use super::{closed_error, Sink};
use crate::writer::WriterError;

/// Sidecar path for `path`: the full file name with `.md5` appended
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(".md5");
    PathBuf::from(name)
}

/// Hashes every byte passed through to the wrapped sink.
///
/// The hex digest is written to the sidecar when the sink is closed. The
/// sidecar is created by [`ChecksumSink::create`] before any data is written,
/// so an unwritable location is reported at assembly time.
pub struct ChecksumSink {
    inner: Box<dyn Sink>,
    hasher: Option<Md5>,
    sidecar: Option<File>,
    sidecar_path: PathBuf,
}

impl ChecksumSink {
    /// Create the sidecar for `path` and wrap `inner`.
    ///
    /// On failure the wrapped sink is handed back so the caller can close it.
    pub fn create(
        inner: Box<dyn Sink>,
        path: &Path,
    ) -> Result<Self, (WriterError, Box<dyn Sink>)> {
        let sidecar_path = checksum_path(path);
        match File::create(&sidecar_path) {
            Ok(sidecar) => Ok(Self {
                inner,
                hasher: Some(Md5::new()),
                sidecar: Some(sidecar),
                sidecar_path,
            }),
            Err(e) => Err((WriterError::io(sidecar_path, e), inner)),
        }
    }

    /// Location of the sidecar
    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }
}

impl std::fmt::Debug for ChecksumSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumSink")
            .field("sidecar_path", &self.sidecar_path)
            .field("closed", &self.hasher.is_none())
            .finish()
    }
}

impl Write for ChecksumSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let hasher = self.hasher.as_mut().ok_or_else(closed_error)?;
        let n = self.inner.write(buf)?;
        hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Sink for ChecksumSink {
    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(hasher) = self.hasher.take() else {
            return Ok(());
        };
        self.inner.close()?;

        let digest = format!("{:x}", hasher.finalize());
        if let Some(mut sidecar) = self.sidecar.take() {
            sidecar.write_all(digest.as_bytes())?;
            sidecar.flush()?;
        }
        log::info!("Wrote checksum {} to {}", digest, self.sidecar_path.display());
        Ok(())
    }
}
