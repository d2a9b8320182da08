use std::collections::HashMap;

use super::header::{HeaderLine, VcfHeader};

/// A named reference sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Contig name as it appears in records
    pub name: String,
    /// Length in bases, if known
    pub length: Option<u64>,
}

impl SequenceRecord {
    /// Create a sequence record
    pub fn new(name: impl Into<String>, length: Option<u64>) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Ordered catalog of reference sequences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceDictionary {
    sequences: Vec<SequenceRecord>,
    by_name: HashMap<String, usize>,
}

impl SequenceDictionary {
    /// Empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sequence; a name that is already present keeps its first position
    pub fn push(&mut self, record: SequenceRecord) {
        if self.by_name.contains_key(&record.name) {
            return;
        }
        self.by_name.insert(record.name.clone(), self.sequences.len());
        self.sequences.push(record);
    }

    /// Build a dictionary from the `##contig` lines of a header
    pub fn from_header(header: &VcfHeader) -> Self {
        header
            .lines()
            .iter()
            .filter_map(|line| match line {
                HeaderLine::Contig { id, length } => Some(SequenceRecord::new(id.clone(), *length)),
                _ => None,
            })
            .collect()
    }

    /// Position of `name` in the dictionary
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Sequence at `index`
    pub fn get(&self, index: usize) -> Option<&SequenceRecord> {
        self.sequences.get(index)
    }

    /// Sequences in dictionary order
    pub fn sequences(&self) -> &[SequenceRecord] {
        &self.sequences
    }

    /// Number of sequences
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Returns `true` if the dictionary holds no sequences
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl FromIterator<SequenceRecord> for SequenceDictionary {
    fn from_iter<I: IntoIterator<Item = SequenceRecord>>(iter: I) -> Self {
        let mut dict = SequenceDictionary::new();
        for record in iter {
            dict.push(record);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_order() {
        let dict: SequenceDictionary = ["chr1", "chr2", "chrX"]
            .into_iter()
            .map(|name| SequenceRecord::new(name, Some(1_000_000)))
            .collect();

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.index_of("chr2"), Some(1));
        assert_eq!(dict.index_of("chrM"), None);
        assert_eq!(dict.get(2).unwrap().name, "chrX");
    }

    #[test]
    fn test_duplicate_names_keep_first_position() {
        let mut dict = SequenceDictionary::new();
        dict.push(SequenceRecord::new("chr1", Some(10)));
        dict.push(SequenceRecord::new("chr2", None));
        dict.push(SequenceRecord::new("chr1", Some(20)));

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(0).unwrap().length, Some(10));
    }

    #[test]
    fn test_from_header_contigs() {
        let mut header = VcfHeader::new();
        header.add_line(HeaderLine::Contig {
            id: "chr1".to_string(),
            length: Some(248_956_422),
        });
        header.add_line(HeaderLine::Other {
            key: "source".to_string(),
            value: "test".to_string(),
        });
        header.add_line(HeaderLine::Contig {
            id: "chr2".to_string(),
            length: None,
        });

        let dict = SequenceDictionary::from_header(&header);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.index_of("chr2"), Some(1));
    }
}
