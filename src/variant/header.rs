use std::fmt::Write as _;

/// Default `##fileformat` version
pub const DEFAULT_FILE_FORMAT: &str = "VCFv4.2";

/// Fixed columns of the `#CHROM` line
const FIXED_COLUMNS: [&str; 8] = ["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// A single `##` meta line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// `##INFO=<...>`
    Info {
        /// Key used in the INFO column
        id: String,
        /// Number of values (`1`, `A`, `.`, ...)
        number: String,
        /// Value type (`Integer`, `Float`, `Flag`, `String`, ...)
        ty: String,
        /// Free-text description
        description: String,
    },
    /// `##FORMAT=<...>`
    Format {
        /// Key used in the FORMAT column
        id: String,
        /// Number of values
        number: String,
        /// Value type
        ty: String,
        /// Free-text description
        description: String,
    },
    /// `##FILTER=<...>`
    Filter {
        /// Filter name
        id: String,
        /// Free-text description
        description: String,
    },
    /// `##contig=<...>`
    Contig {
        /// Contig name
        id: String,
        /// Length in bases, if known
        length: Option<u64>,
    },
    /// Any other `##key=value` line
    Other {
        /// Key
        key: String,
        /// Raw value
        value: String,
    },
}

impl HeaderLine {
    /// Convenience constructor for an INFO line
    pub fn info(id: &str, number: &str, ty: &str, description: &str) -> Self {
        Self::Info {
            id: id.to_string(),
            number: number.to_string(),
            ty: ty.to_string(),
            description: description.to_string(),
        }
    }

    /// Convenience constructor for a FORMAT line
    pub fn format(id: &str, number: &str, ty: &str, description: &str) -> Self {
        Self::Format {
            id: id.to_string(),
            number: number.to_string(),
            ty: ty.to_string(),
            description: description.to_string(),
        }
    }

    /// Convenience constructor for a FILTER line
    pub fn filter(id: &str, description: &str) -> Self {
        Self::Filter {
            id: id.to_string(),
            description: description.to_string(),
        }
    }

    /// Convenience constructor for a contig line
    pub fn contig(id: &str, length: Option<u64>) -> Self {
        Self::Contig {
            id: id.to_string(),
            length,
        }
    }

    /// Render without the leading `##` or trailing newline
    fn render(&self) -> String {
        match self {
            HeaderLine::Info {
                id,
                number,
                ty,
                description,
            } => format!(
                "INFO=<ID={},Number={},Type={},Description=\"{}\">",
                id, number, ty, description
            ),
            HeaderLine::Format {
                id,
                number,
                ty,
                description,
            } => format!(
                "FORMAT=<ID={},Number={},Type={},Description=\"{}\">",
                id, number, ty, description
            ),
            HeaderLine::Filter { id, description } => {
                format!("FILTER=<ID={},Description=\"{}\">", id, description)
            }
            HeaderLine::Contig { id, length: Some(len) } => {
                format!("contig=<ID={},length={}>", id, len)
            }
            HeaderLine::Contig { id, length: None } => format!("contig=<ID={}>", id),
            HeaderLine::Other { key, value } => format!("{}={}", key, value),
        }
    }
}

/// VCF header: format version, meta lines and sample names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfHeader {
    file_format: String,
    lines: Vec<HeaderLine>,
    samples: Vec<String>,
}

impl Default for VcfHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl VcfHeader {
    /// Empty header with the default file format
    pub fn new() -> Self {
        Self {
            file_format: DEFAULT_FILE_FORMAT.to_string(),
            lines: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Replace the `##fileformat` version
    pub fn with_file_format(mut self, file_format: impl Into<String>) -> Self {
        self.file_format = file_format.into();
        self
    }

    /// Replace the sample names
    pub fn with_samples<I, S>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.samples = samples.into_iter().map(Into::into).collect();
        self
    }

    /// Append a meta line
    pub fn add_line(&mut self, line: HeaderLine) -> &mut Self {
        self.lines.push(line);
        self
    }

    /// `##fileformat` version
    pub fn file_format(&self) -> &str {
        &self.file_format
    }

    /// Meta lines in insertion order
    pub fn lines(&self) -> &[HeaderLine] {
        &self.lines
    }

    /// Sample names
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Returns `true` if an INFO line declares `id`
    pub fn has_info(&self, id: &str) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line, HeaderLine::Info { id: i, .. } if i == id))
    }

    /// Returns `true` if a FORMAT line declares `id`
    pub fn has_format(&self, id: &str) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line, HeaderLine::Format { id: i, .. } if i == id))
    }

    /// Returns `true` if a FILTER line declares `id`; `PASS` is always declared
    pub fn has_filter(&self, id: &str) -> bool {
        id == "PASS"
            || self
                .lines
                .iter()
                .any(|line| matches!(line, HeaderLine::Filter { id: i, .. } if i == id))
    }

    /// Contig names in declaration order
    pub fn contigs(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HeaderLine::Contig { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Render the header as text, ending with the `#CHROM` line and a newline.
    ///
    /// With `include_samples` false the FORMAT and sample columns are left out.
    pub fn to_text(&self, include_samples: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "##fileformat={}", self.file_format);
        for line in &self.lines {
            let _ = writeln!(out, "##{}", line.render());
        }

        out.push_str(&FIXED_COLUMNS.join("\t"));
        if include_samples && !self.samples.is_empty() {
            out.push_str("\tFORMAT");
            for sample in &self.samples {
                out.push('\t');
                out.push_str(sample);
            }
        }
        out.push('\n');
        out
    }
}
