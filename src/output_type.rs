//! Output representation and its inference from a path.
//!
//! A writer produces one of three on-disk representations (text VCF, binary
//! BCF, BGZF-compressed VCF) or one of two stream representations. When the
//! caller gives a path, the representation is inferred from the file name:
//!
//! | Suffix | Type |
//! |--------|------|
//! | `.vcf` | [`OutputType::TextFile`] |
//! | `.gz`, `.gzip`, `.bgz`, `.bgzf` | [`OutputType::CompressedTextFile`] |
//! | `.bcf` | [`OutputType::BinaryFile`] |
//!
//! Paths without a recognized suffix are canonicalized so that a symbolic
//! link named `current` pointing at `calls.vcf.gz` still resolves. A path that
//! exists but is neither a regular file nor a directory (named pipe, device)
//! is written as a text stream.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::writer::WriterError;

/// Recognized text-file extension
pub const TEXT_EXTENSION: &str = ".vcf";

/// Recognized binary-file extension
pub const BINARY_EXTENSION: &str = ".bcf";

/// Recognized block-compressed extensions (matched case-insensitively)
pub const BLOCK_COMPRESSED_EXTENSIONS: [&str; 4] = [".gz", ".gzip", ".bgz", ".bgzf"];

/// Maximum number of canonicalization hops before resolution gives up
pub const MAX_RESOLUTION_DEPTH: usize = 8;

/// Representation a writer produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputType {
    /// Not set, or could not be inferred
    #[default]
    Unspecified,
    /// Plain-text VCF file
    TextFile,
    /// Binary BCF file
    BinaryFile,
    /// BGZF-compressed VCF file
    CompressedTextFile,
    /// Text VCF written to a stream
    TextStream,
    /// Binary BCF written to a stream
    BinaryStream,
}

impl OutputType {
    /// File representations, the only valid targets of an explicit type override
    pub const FILE_TYPES: [OutputType; 3] = [
        OutputType::TextFile,
        OutputType::BinaryFile,
        OutputType::CompressedTextFile,
    ];

    /// Stream representations
    pub const STREAM_TYPES: [OutputType; 2] = [OutputType::TextStream, OutputType::BinaryStream];

    /// Returns `true` for the file representations
    pub fn is_file_type(self) -> bool {
        Self::FILE_TYPES.contains(&self)
    }

    /// Returns `true` for the stream representations
    pub fn is_stream_type(self) -> bool {
        Self::STREAM_TYPES.contains(&self)
    }

    /// Returns `true` when records are serialized with the binary backend
    pub fn is_binary(self) -> bool {
        matches!(self, OutputType::BinaryFile | OutputType::BinaryStream)
    }

    /// Type actually assembled for this declared type.
    ///
    /// With `force_binary`, every file type becomes [`OutputType::BinaryFile`]
    /// and every stream type becomes [`OutputType::BinaryStream`]. The declared
    /// type itself is never modified.
    pub fn retype(self, force_binary: bool) -> OutputType {
        if !force_binary {
            return self;
        }
        if self.is_file_type() {
            OutputType::BinaryFile
        } else if self.is_stream_type() {
            OutputType::BinaryStream
        } else {
            self
        }
    }

    /// Infer the output type of `path`.
    ///
    /// Never fails: resolution problems (symbolic link loops, permission
    /// errors while canonicalizing) are logged and yield
    /// [`OutputType::Unspecified`]. Use [`OutputType::try_resolve`] to observe
    /// them.
    pub fn resolve<P: AsRef<Path>>(path: P) -> OutputType {
        let path = path.as_ref();
        match Self::try_resolve(path) {
            Ok(output_type) => output_type,
            Err(e) => {
                log::warn!("Could not resolve output type of {}: {}", path.display(), e);
                OutputType::Unspecified
            }
        }
    }

    /// Infer the output type of `path`, reporting resolution failures.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Configuration`] if canonicalization fails for a
    /// reason other than the target not existing (for example a symbolic link
    /// cycle), or if more than [`MAX_RESOLUTION_DEPTH`] hops are needed.
    pub fn try_resolve<P: AsRef<Path>>(path: P) -> Result<OutputType, WriterError> {
        resolve_at_depth(path.as_ref(), 0)
    }

    /// Infer the output type from the file name alone, without touching the filesystem
    pub fn from_extension<P: AsRef<Path>>(path: P) -> OutputType {
        let Some(name) = path.as_ref().file_name().map(|n| n.to_string_lossy()) else {
            return OutputType::Unspecified;
        };

        if name.ends_with(TEXT_EXTENSION) {
            OutputType::TextFile
        } else if has_block_compressed_extension(&name) {
            OutputType::CompressedTextFile
        } else if name.ends_with(BINARY_EXTENSION) {
            OutputType::BinaryFile
        } else {
            OutputType::Unspecified
        }
    }

    /// Human-readable list of the recognized extensions, for error messages
    pub fn recognized_extensions() -> String {
        let mut all = vec![TEXT_EXTENSION.to_string()];
        all.extend(
            BLOCK_COMPRESSED_EXTENSIONS
                .iter()
                .map(|ext| format!("{}{}", TEXT_EXTENSION, ext)),
        );
        all.push(BINARY_EXTENSION.to_string());
        all.join(", ")
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputType::Unspecified => "unspecified",
            OutputType::TextFile => "vcf",
            OutputType::BinaryFile => "bcf",
            OutputType::CompressedTextFile => "vcf.gz",
            OutputType::TextStream => "vcf-stream",
            OutputType::BinaryStream => "bcf-stream",
        };
        f.write_str(name)
    }
}

fn has_block_compressed_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    BLOCK_COMPRESSED_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
}

fn resolve_at_depth(path: &Path, depth: usize) -> Result<OutputType, WriterError> {
    if depth > MAX_RESOLUTION_DEPTH {
        return Err(WriterError::Configuration(format!(
            "Resolving {} needed more than {} canonicalization steps",
            path.display(),
            MAX_RESOLUTION_DEPTH
        )));
    }

    let by_name = OutputType::from_extension(path);
    if by_name != OutputType::Unspecified {
        return Ok(by_name);
    }

    // Special files (devices, named pipes) and symlinks to recognized names
    match std::fs::canonicalize(path) {
        Ok(canonical) if canonical != path => {
            log::debug!(
                "Following {} to {} to infer output type",
                path.display(),
                canonical.display()
            );
            return resolve_at_depth(&canonical, depth + 1);
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(WriterError::Configuration(format!(
                "Cannot canonicalize {}: {}",
                path.display(),
                e
            )));
        }
    }

    match std::fs::metadata(path) {
        Ok(meta) if !meta.is_file() && !meta.is_dir() => Ok(OutputType::TextStream),
        _ => Ok(OutputType::Unspecified),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn test_extension_inference() {
        assert_eq!(OutputType::resolve("calls.vcf"), OutputType::TextFile);
        assert_eq!(OutputType::resolve("calls.bcf"), OutputType::BinaryFile);
        assert_eq!(
            OutputType::resolve("calls.vcf.gz"),
            OutputType::CompressedTextFile
        );
        assert_eq!(
            OutputType::resolve("calls.vcf.BGZ"),
            OutputType::CompressedTextFile
        );
        assert_eq!(
            OutputType::resolve("dir/calls.vcf.bgzf"),
            OutputType::CompressedTextFile
        );
    }

    #[test]
    fn test_missing_path_without_extension_is_unspecified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_output");
        assert_eq!(OutputType::resolve(&path), OutputType::Unspecified);
    }

    #[test]
    fn test_regular_file_without_extension_is_unspecified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("calls.txt");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(OutputType::resolve(&path), OutputType::Unspecified);
    }

    #[test]
    fn test_directory_is_unspecified() {
        let dir = tempdir().unwrap();
        assert_eq!(OutputType::resolve(dir.path()), OutputType::Unspecified);
    }

    #[cfg(unix)]
    #[test]
    fn test_device_is_text_stream() {
        assert_eq!(OutputType::resolve("/dev/null"), OutputType::TextStream);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_recognized_name() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("calls.vcf.gz");
        std::fs::write(&target, b"").unwrap();
        let link = dir.path().join("latest");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(OutputType::resolve(&link), OutputType::CompressedTextFile);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_unspecified() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("latest");
        std::os::unix::fs::symlink(dir.path().join("missing"), &link).unwrap();

        assert_eq!(OutputType::resolve(&link), OutputType::Unspecified);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_is_configuration_error() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::os::unix::fs::symlink(&b, &a).unwrap();
        std::os::unix::fs::symlink(&a, &b).unwrap();

        let err = OutputType::try_resolve(&a).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(OutputType::resolve(&a), OutputType::Unspecified);
    }

    #[test]
    fn test_retype() {
        assert_eq!(OutputType::TextFile.retype(true), OutputType::BinaryFile);
        assert_eq!(
            OutputType::CompressedTextFile.retype(true),
            OutputType::BinaryFile
        );
        assert_eq!(OutputType::TextStream.retype(true), OutputType::BinaryStream);
        assert_eq!(OutputType::Unspecified.retype(true), OutputType::Unspecified);
        assert_eq!(OutputType::TextFile.retype(false), OutputType::TextFile);
    }

    #[test]
    fn test_recognized_extensions_message() {
        let msg = OutputType::recognized_extensions();
        assert!(msg.contains(".vcf.gz"));
        assert!(msg.contains(".bcf"));
    }

    proptest! {
        #[test]
        fn prop_text_suffix_resolves_to_text(stem in "[a-zA-Z0-9_]{1,16}") {
            prop_assert_eq!(OutputType::resolve(format!("{}.vcf", stem)), OutputType::TextFile);
        }

        #[test]
        fn prop_binary_suffix_resolves_to_binary(stem in "[a-zA-Z0-9_]{1,16}") {
            prop_assert_eq!(OutputType::resolve(format!("{}.bcf", stem)), OutputType::BinaryFile);
        }

        #[test]
        fn prop_compressed_suffix_resolves_to_compressed(
            stem in "[a-zA-Z0-9_]{1,16}",
            ext in prop::sample::select(BLOCK_COMPRESSED_EXTENSIONS.to_vec()),
        ) {
            prop_assert_eq!(
                OutputType::resolve(format!("{}.vcf{}", stem, ext)),
                OutputType::CompressedTextFile
            );
        }
    }
}
