//! Delimited-text table extraction
//!
//! A CSV or TSV file holds exactly one table. The first record is its
//! single header row; every other record is a body row. Records must all
//! have the same number of fields.

use csv::ReaderBuilder;

use super::Extractor;
use crate::core::table::{RowSpec, Table, TableBuilder};
use crate::utils::error::{TableError, TableResult};

/// Extracts the single table of a delimited text file
#[derive(Debug, Clone, Copy)]
pub struct DelimitedExtractor {
    delimiter: u8,
}

impl Default for DelimitedExtractor {
    fn default() -> Self {
        Self::csv()
    }
}

impl DelimitedExtractor {
    pub fn csv() -> Self {
        DelimitedExtractor { delimiter: b',' }
    }

    pub fn tsv() -> Self {
        DelimitedExtractor { delimiter: b'\t' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        DelimitedExtractor { delimiter }
    }
}

impl Extractor for DelimitedExtractor {
    fn extract(&self, raw: &str) -> TableResult<Vec<Table>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(raw.as_bytes());

        let mut builder = TableBuilder::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|err| TableError::parse(err.to_string()))?;
            let row = if index == 0 {
                RowSpec::header(record.iter())
            } else {
                RowSpec::body(record.iter())
            };
            builder.push_row(row);
        }

        if builder.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![builder.build()?])
    }
}
