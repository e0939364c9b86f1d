//! CSV output for segment summaries
//!
//! One row per reported segment, for spreadsheet analysis and downstream
//! reporting tools. Missing values (unfitted segments, no onset test) are
//! empty fields.

use crate::summary::SegmentSummary;

const COLUMNS: [&str; 17] = [
    "index",
    "start",
    "end",
    "n",
    "start_time",
    "end_time",
    "duration",
    "mean",
    "median",
    "min",
    "max",
    "std",
    "range",
    "slope",
    "slope_t",
    "residual_std",
    "onset_pvalue",
];

/// CSV summary formatter
#[derive(Debug)]
pub struct CsvOutput {
    rows: Vec<(String, SegmentSummary)>,
    include_file: bool,
}

impl CsvOutput {
    /// Create a new formatter; `include_file` prepends a `file` column
    pub fn new(include_file: bool) -> Self {
        Self {
            rows: Vec::new(),
            include_file,
        }
    }

    /// Add the summary rows of one file
    pub fn add_rows(&mut self, file: &str, rows: &[SegmentSummary]) {
        self.rows
            .extend(rows.iter().map(|row| (file.to_string(), row.clone())));
    }

    fn header(&self) -> String {
        let mut headers = Vec::with_capacity(COLUMNS.len() + 1);
        if self.include_file {
            headers.push("file");
        }
        headers.extend(COLUMNS);
        headers.join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn optional(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    fn format_row(&self, file: &str, row: &SegmentSummary) -> String {
        let mut fields = Vec::with_capacity(COLUMNS.len() + 1);
        if self.include_file {
            fields.push(Self::escape_field(file));
        }
        fields.extend([
            row.index.to_string(),
            row.start.to_string(),
            row.end.to_string(),
            row.n.to_string(),
            row.start_time.to_string(),
            row.end_time.to_string(),
            row.duration.to_string(),
            row.mean.to_string(),
            row.median.to_string(),
            row.min.to_string(),
            row.max.to_string(),
            row.std.to_string(),
            row.range.to_string(),
            Self::optional(row.slope),
            Self::optional(row.slope_t),
            Self::optional(row.residual_std),
            Self::optional(row.onset_pvalue),
        ]);
        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for (file, row) in &self.rows {
            output.push_str(&self.format_row(file, row));
            output.push('\n');
        }

        output
    }
}
