//! Output formatting for seller records (table, JSON, CSV).

use crate::config::OutputFormat;
use crate::ozon::SellerRecord;

/// Column headers, in record field order.
const COLUMNS: [&str; 6] = [
    "product_name",
    "identity",
    "registration_id",
    "ozon_tenure_marker",
    "product_url",
    "seller_profile_url",
];

/// Formats seller records for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a result set.
    pub fn format_records(&self, records: &[SellerRecord]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                OutputFormat::Table => "No sellers found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_records(records),
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Csv => self.csv_records(records),
        }
    }

    // JSON formatting

    fn json_records(&self, records: &[SellerRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_records(&self, records: &[SellerRecord]) -> String {
        let identity_width = 40;
        let reg_width = 15;
        let product_width = 40;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<identity_width$} {:<reg_width$} {:<product_width$} {}",
            "Seller", "Reg. ID", "Product", "Seller URL"
        ));
        lines.push(format!(
            "{:-<identity_width$} {:-<reg_width$} {:-<product_width$} {:-<10}",
            "", "", "", ""
        ));

        for record in records {
            lines.push(format!(
                "{:<identity_width$} {:<reg_width$} {:<product_width$} {}",
                Self::truncate(&record.identity, identity_width),
                record.registration_id,
                Self::truncate(&record.product_name, product_width),
                record.seller_profile_url
            ));
        }

        lines.push(String::new());
        lines.push(format!("{} sellers", records.len()));

        lines.join("\n")
    }

    fn truncate(s: &str, width: usize) -> String {
        if s.chars().count() <= width {
            s.to_string()
        } else {
            let cut: String = s.chars().take(width.saturating_sub(3)).collect();
            format!("{}...", cut)
        }
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        COLUMNS.join(",")
    }

    fn csv_records(&self, records: &[SellerRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for record in records {
            let fields = [
                &record.product_name,
                &record.identity,
                &record.registration_id,
                &record.ozon_tenure_marker,
                &record.product_url,
                &record.seller_profile_url,
            ];
            lines.push(fields.iter().map(|f| Self::csv_escape(f)).collect::<Vec<_>>().join(","));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
