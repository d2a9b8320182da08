/// A single variant site
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    /// Contig name
    pub contig: String,
    /// 1-based position of the first reference base
    pub pos: u64,
    /// Identifier (`rs123`), `None` for missing
    pub id: Option<String>,
    /// Reference allele
    pub reference: String,
    /// Alternate alleles; empty for a reference-only site
    pub alternates: Vec<String>,
    /// Phred-scaled quality, `None` for missing
    pub quality: Option<f32>,
    /// Applied filters; empty for missing, `["PASS"]` for passing
    pub filters: Vec<String>,
    /// INFO entries in output order; flags carry no value
    pub info: Vec<(String, Option<String>)>,
    /// FORMAT keys, shared by every sample
    pub format: Vec<String>,
    /// Per-sample values aligned to `format`
    pub genotypes: Vec<Vec<Option<String>>>,
}

impl VariantRecord {
    /// Last reference base covered by this record (1-based, inclusive)
    pub fn end(&self) -> u64 {
        self.pos.saturating_add(self.span() - 1)
    }

    fn span(&self) -> u64 {
        self.reference.len().max(1) as u64
    }

    /// Check the fields every representation requires
    pub fn validate(&self) -> Result<(), String> {
        if self.contig.is_empty() {
            return Err("contig cannot be empty".to_string());
        }
        if self.pos == 0 {
            return Err(format!(
                "{}: position must be >= 1 (1-based coordinates)",
                self.contig
            ));
        }
        if self.reference.is_empty() {
            return Err(format!(
                "{}:{}: reference allele cannot be empty",
                self.contig, self.pos
            ));
        }
        if self.pos.checked_add(self.span() - 1).is_none() {
            return Err(format!(
                "{}:{}: reference allele of length {} runs past the largest addressable position",
                self.contig,
                self.pos,
                self.reference.len()
            ));
        }
        if let Some(sample) = self
            .genotypes
            .iter()
            .position(|values| values.len() > self.format.len())
        {
            return Err(format!(
                "{}:{}: sample {} has more values than FORMAT keys",
                self.contig, self.pos, sample
            ));
        }
        Ok(())
    }
}

/// Fluent constructor for [`VariantRecord`]
#[derive(Debug, Clone)]
pub struct VariantRecordBuilder {
    record: VariantRecord,
}

impl VariantRecordBuilder {
    /// Start a record at `contig:pos` with the given reference allele
    pub fn new(contig: impl Into<String>, pos: u64, reference: impl Into<String>) -> Self {
        Self {
            record: VariantRecord {
                contig: contig.into(),
                pos,
                id: None,
                reference: reference.into(),
                alternates: Vec::new(),
                quality: None,
                filters: Vec::new(),
                info: Vec::new(),
                format: Vec::new(),
                genotypes: Vec::new(),
            },
        }
    }

    /// Set the identifier
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.record.id = Some(id.into());
        self
    }

    /// Append an alternate allele
    pub fn alt(mut self, allele: impl Into<String>) -> Self {
        self.record.alternates.push(allele.into());
        self
    }

    /// Set the quality
    pub fn quality(mut self, quality: f32) -> Self {
        self.record.quality = Some(quality);
        self
    }

    /// Append a filter
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.record.filters.push(filter.into());
        self
    }

    /// Append a `key=value` INFO entry
    pub fn info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.info.push((key.into(), Some(value.into())));
        self
    }

    /// Append a flag INFO entry
    pub fn flag(mut self, key: impl Into<String>) -> Self {
        self.record.info.push((key.into(), None));
        self
    }

    /// Set the FORMAT keys
    pub fn format<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.format = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Append one sample's values; `None` marks a missing value
    pub fn genotype<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.record
            .genotypes
            .push(values.into_iter().map(|v| v.map(Into::into)).collect());
        self
    }

    /// Finish the record
    pub fn build(self) -> VariantRecord {
        self.record
    }
}
