//! Boolean writer options and the process-wide default set.
//!
//! Every [`VariantWriterBuilder`](crate::writer::VariantWriterBuilder) starts
//! from a copy of the default set. Changing the defaults afterwards affects
//! only builders constructed later.
//!
//! # Concurrency
//!
//! The default set sits behind a lock so that reads and writes are memory
//! safe, but no ordering is promised between a thread mutating the defaults
//! and another thread constructing builders. Callers that mutate the defaults
//! while other threads build writers must serialize those steps themselves.

use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// A single boolean writer option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriterOption {
    /// Build a positional index while records are written
    IndexOnTheFly,
    /// Write the binary representation whatever the declared type
    ForceBinary,
    /// Omit FORMAT and per-sample columns
    DoNotWriteSecondaryFields,
    /// Accept INFO/FORMAT/FILTER keys that the header does not declare
    AllowMissingHeaderFields,
    /// Write every FORMAT field, including trailing missing values
    WriteFullFormatField,
    /// Forward writes to a background thread through a bounded queue
    UseAsyncIo,
}

impl WriterOption {
    /// Every option, in declaration order
    pub const ALL: [WriterOption; 6] = [
        WriterOption::IndexOnTheFly,
        WriterOption::ForceBinary,
        WriterOption::DoNotWriteSecondaryFields,
        WriterOption::AllowMissingHeaderFields,
        WriterOption::WriteFullFormatField,
        WriterOption::UseAsyncIo,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Stable kebab-case name, as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            WriterOption::IndexOnTheFly => "index-on-the-fly",
            WriterOption::ForceBinary => "force-binary",
            WriterOption::DoNotWriteSecondaryFields => "do-not-write-secondary-fields",
            WriterOption::AllowMissingHeaderFields => "allow-missing-header-fields",
            WriterOption::WriteFullFormatField => "write-full-format-field",
            WriterOption::UseAsyncIo => "use-async-io",
        }
    }
}

impl fmt::Display for WriterOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WriterOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        WriterOption::ALL
            .into_iter()
            .find(|option| option.name() == normalized)
            .ok_or_else(|| format!("unknown writer option: {}", s))
    }
}

/// Set of [`WriterOption`]s.
///
/// Combinations are not validated here; an incompatible set is only rejected
/// when a writer is built from it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OptionSet {
    bits: u8,
}

impl OptionSet {
    /// Empty set
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Set holding a single option
    pub const fn of(option: WriterOption) -> Self {
        Self { bits: option.bit() }
    }

    /// Returns `true` if `option` is present
    pub fn contains(&self, option: WriterOption) -> bool {
        self.bits & option.bit() != 0
    }

    /// Add `option`
    pub fn insert(&mut self, option: WriterOption) {
        self.bits |= option.bit();
    }

    /// Remove `option`
    pub fn remove(&mut self, option: WriterOption) {
        self.bits &= !option.bit();
    }

    /// Add `option` when `enabled`, remove it otherwise
    pub fn set(&mut self, option: WriterOption, enabled: bool) {
        if enabled {
            self.insert(option);
        } else {
            self.remove(option);
        }
    }

    /// Flip `option`, returning whether it is now present
    pub fn toggle(&mut self, option: WriterOption) -> bool {
        self.bits ^= option.bit();
        self.contains(option)
    }

    /// Remove every option
    pub fn clear(&mut self) {
        self.bits = 0;
    }

    /// Returns `true` if no option is present
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of options present
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Copy of this set with `option` added
    pub fn with(mut self, option: WriterOption) -> Self {
        self.insert(option);
        self
    }

    /// Copy of this set with `option` removed
    pub fn without(mut self, option: WriterOption) -> Self {
        self.remove(option);
        self
    }

    /// Options present, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = WriterOption> + '_ {
        WriterOption::ALL
            .into_iter()
            .filter(move |option| self.contains(*option))
    }
}

impl fmt::Debug for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<WriterOption> for OptionSet {
    fn from_iter<I: IntoIterator<Item = WriterOption>>(iter: I) -> Self {
        let mut set = OptionSet::empty();
        for option in iter {
            set.insert(option);
        }
        set
    }
}

impl<const N: usize> From<[WriterOption; N]> for OptionSet {
    fn from(options: [WriterOption; N]) -> Self {
        options.into_iter().collect()
    }
}

/// Process-wide default options; initially `{IndexOnTheFly}`
static DEFAULT_OPTIONS: RwLock<OptionSet> = RwLock::new(OptionSet::of(WriterOption::IndexOnTheFly));

/// Snapshot of the process-wide default options
pub fn default_options() -> OptionSet {
    match DEFAULT_OPTIONS.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn update_defaults(f: impl FnOnce(&mut OptionSet)) {
    match DEFAULT_OPTIONS.write() {
        Ok(mut guard) => f(&mut *guard),
        Err(poisoned) => f(&mut *poisoned.into_inner()),
    }
}

/// Add `option` to the defaults copied by builders constructed after this call
pub fn set_default_option(option: WriterOption) {
    update_defaults(|set| set.insert(option));
}

/// Remove `option` from the defaults copied by builders constructed after this call
pub fn unset_default_option(option: WriterOption) {
    update_defaults(|set| set.remove(option));
}
