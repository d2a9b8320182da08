//! Process-wide default options.
//!
//! Kept in its own test binary: mutating the defaults would race with any
//! other test that constructs builders with `VariantWriterBuilder::new()`.

use varsink::prelude::*;

#[test]
fn test_defaults_are_copied_at_construction() {
    assert_eq!(default_options(), OptionSet::of(WriterOption::IndexOnTheFly));

    let before = VariantWriterBuilder::new();
    assert!(before.is_option_set(WriterOption::IndexOnTheFly));
    assert!(!before.is_option_set(WriterOption::ForceBinary));

    set_default_option(WriterOption::ForceBinary);
    unset_default_option(WriterOption::IndexOnTheFly);

    let after = VariantWriterBuilder::new();
    assert!(after.is_option_set(WriterOption::ForceBinary));
    assert!(!after.is_option_set(WriterOption::IndexOnTheFly));

    // Builders constructed earlier keep their own copy
    assert!(before.is_option_set(WriterOption::IndexOnTheFly));
    assert!(!before.is_option_set(WriterOption::ForceBinary));

    // Mutating a builder leaves the defaults alone
    let mut builder = VariantWriterBuilder::new();
    builder.clear_options();
    assert!(default_options().contains(WriterOption::ForceBinary));

    unset_default_option(WriterOption::ForceBinary);
    set_default_option(WriterOption::IndexOnTheFly);
    assert_eq!(default_options(), OptionSet::of(WriterOption::IndexOnTheFly));
}
