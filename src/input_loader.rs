use crate::error::{Result, ScrapeError};
use calamine::{open_workbook, Reader, Xlsx};
use log::info;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// One row of the input company list. Identity is the company name; the
/// fallback name (when present) is tried once if the primary name yields
/// nothing.
#[derive(Debug, Deserialize, Clone)]
pub struct CompanyRecord {
    #[serde(
        rename = "Company",
        alias = "company",
        alias = "Company Name",
        alias = "company name"
    )]
    pub company: String,
    #[serde(
        rename = "Company Name for Emails",
        alias = "Fallback",
        alias = "fallback",
        default
    )]
    pub fallback: Option<String>,
}

impl CompanyRecord {
    pub fn fallback_name(&self) -> Option<&str> {
        self.fallback
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

const COMPANY_HEADERS: [&str; 4] = ["Company", "company", "Company Name", "company name"];

/// Loads the company list. CSV by default, Excel when the extension says so.
/// A missing file, unreadable content, or a missing company column is fatal;
/// blank company names are kept so row indices line up with the file (the
/// driver skips them).
pub fn load_records<P: AsRef<Path>>(filename: P) -> Result<Vec<CompanyRecord>> {
    let path = filename.as_ref();
    if !path.exists() {
        return Err(ScrapeError::Input(format!(
            "input file not found: {}",
            path.display()
        )));
    }

    let is_excel = path
        .extension()
        .map_or(false, |ext| ext == "xlsx" || ext == "xls");
    if is_excel {
        return load_excel(path);
    }
    load_csv(path)
}

fn load_csv(path: &Path) -> Result<Vec<CompanyRecord>> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    if !headers.iter().any(|h| COMPANY_HEADERS.contains(&h)) {
        return Err(ScrapeError::Input(format!(
            "input file {} must contain a 'Company' column",
            path.display()
        )));
    }

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: CompanyRecord = result?;
        records.push(record);
    }
    info!("Loaded {} records from CSV {:?}", records.len(), path);
    Ok(records)
}

fn load_excel(path: &Path) -> Result<Vec<CompanyRecord>> {
    let mut excel: Xlsx<_> = open_workbook(path)
        .map_err(|e| ScrapeError::Input(format!("could not open Excel file: {}", e)))?;

    let worksheets = excel.worksheets();
    let (_name, range) = worksheets
        .get(0)
        .ok_or_else(|| ScrapeError::Input("Excel file has no worksheets".to_string()))?;

    let mut company_idx = None;
    let mut fallback_idx = None;
    let mut records = Vec::new();

    for (row_idx, row) in range.rows().enumerate() {
        if row_idx == 0 {
            for (col_idx, cell) in row.iter().enumerate() {
                let header = cell.to_string().to_lowercase();
                if header.contains("company") && header.contains("email") {
                    fallback_idx = Some(col_idx);
                } else if header.contains("fallback") {
                    fallback_idx = Some(col_idx);
                } else if header.contains("company") {
                    company_idx = Some(col_idx);
                }
            }
            if company_idx.is_none() {
                return Err(ScrapeError::Input(
                    "Excel header missing 'Company' column".to_string(),
                ));
            }
            continue;
        }

        let company = company_idx
            .and_then(|i| row.get(i))
            .map(|c| c.to_string())
            .unwrap_or_default();
        let fallback = fallback_idx
            .and_then(|i| row.get(i))
            .map(|c| c.to_string())
            .filter(|s| !s.is_empty());

        records.push(CompanyRecord { company, fallback });
    }

    info!("Loaded {} records from Excel {:?}", records.len(), path);
    Ok(records)
}
