//! Detail table and its CSV export.

use std::path::Path;

use serde::Serialize;

use crate::date_util::{format_datetime, format_optional_datetime};
use crate::error::Result;
use crate::model::ServiceOrderRecord;

/// File name offered for the download.
pub const DEFAULT_EXPORT_FILE: &str = "dados_os_diagnostico.csv";

const UTF8_BOM: &str = "\u{FEFF}";

/// Header row, in column order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "Matrícula",
    "Localidade",
    "Data de Geração",
    "Data de Conclusão",
    "Tipo de Serviço",
    "Status",
    "Descrição do Serviço",
    "Motivo do Encerramento",
];

/// A record rendered with display labels, as shown in the detail table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub property_id: String,
    pub locality_id: String,
    pub generated_at: String,
    pub closed_at: String,
    pub service_type: String,
    pub status: String,
    pub service_description: String,
    pub closure_reason: String,
}

impl DetailRow {
    pub fn from_record(record: &ServiceOrderRecord) -> Self {
        Self {
            property_id: record.property_id.to_string(),
            locality_id: record.locality_id.to_string(),
            generated_at: format_datetime(&record.generated_at),
            closed_at: format_optional_datetime(record.closed_at.as_ref()),
            service_type: record.service_type.label().to_string(),
            status: record.status.label().to_string(),
            service_description: record.service_description.clone(),
            closure_reason: record.closure_reason.clone().unwrap_or_default(),
        }
    }

    /// Field values in [`EXPORT_HEADERS`] order.
    pub fn fields(&self) -> [&str; 8] {
        [
            self.property_id.as_str(),
            self.locality_id.as_str(),
            self.generated_at.as_str(),
            self.closed_at.as_str(),
            self.service_type.as_str(),
            self.status.as_str(),
            self.service_description.as_str(),
            self.closure_reason.as_str(),
        ]
    }
}

pub fn detail_rows(records: &[&ServiceOrderRecord]) -> Vec<DetailRow> {
    records.iter().map(|r| DetailRow::from_record(r)).collect()
}

/// Serialize the filtered records as comma-separated text, UTF-8 with a
/// byte-order mark so spreadsheet tools pick the right encoding.
pub fn to_csv(records: &[&ServiceOrderRecord]) -> Vec<u8> {
    let mut out = String::from(UTF8_BOM);
    out.push_str(&csv_line(&EXPORT_HEADERS));
    for row in detail_rows(records) {
        out.push_str(&csv_line(&row.fields()));
    }
    out.into_bytes()
}

pub fn write_csv(path: impl AsRef<Path>, records: &[&ServiceOrderRecord]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_csv(records))?;
    log::info!("Exported {} rows to {}", records.len(), path.display());
    Ok(())
}

fn csv_line(fields: &[&str]) -> String {
    let escaped: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
    format!("{}\n", escaped.join(","))
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
