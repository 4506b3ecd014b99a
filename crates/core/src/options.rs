use crate::error::{MergeError, Result};
use serde::{Deserialize, Serialize};

/// Default number of rows per preview page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Serials at or below this are left alone. 60 is the phantom 1900-02-29,
/// so anything above it maps onto a real calendar day.
pub const DEFAULT_MIN_DATE_SERIAL: f64 = 60.0;

/// 9999-12-31, the last day the 1900 date system can represent.
pub const DEFAULT_MAX_DATE_SERIAL: f64 = 2_958_465.0;

/// Options controlling normalization, paging and export naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Rows per preview page
    pub page_size: usize,
    /// Whether numeric values in the date-serial range are decoded
    pub decode_dates: bool,
    /// Exclusive lower bound for date-serial candidates
    pub min_date_serial: f64,
    /// Inclusive upper bound for date-serial candidates
    pub max_date_serial: f64,
    /// `chrono` format string for decoded dates
    pub date_format: String,
    /// Name of the single sheet in an exported workbook
    pub export_sheet_name: String,
    /// File name for the exported workbook
    pub export_file_name: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            decode_dates: true,
            min_date_serial: DEFAULT_MIN_DATE_SERIAL,
            max_date_serial: DEFAULT_MAX_DATE_SERIAL,
            date_format: "%d/%m/%Y %H:%M:%S".to_string(),
            export_sheet_name: "Combined Data".to_string(),
            export_file_name: "combined_data.xlsx".to_string(),
        }
    }
}

impl MergeOptions {
    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enable or disable date-serial decoding
    #[must_use]
    pub fn with_date_decoding(mut self, decode_dates: bool) -> Self {
        self.decode_dates = decode_dates;
        self
    }

    /// Check that the options describe a usable configuration.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(MergeError::InvalidPageSize(self.page_size));
        }
        if !(self.min_date_serial < self.max_date_serial) {
            return Err(MergeError::InvalidOption(format!(
                "min_date_serial ({}) must be below max_date_serial ({})",
                self.min_date_serial, self.max_date_serial
            )));
        }
        if self.export_sheet_name.trim().is_empty() {
            return Err(MergeError::InvalidOption(
                "export_sheet_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply a single `KEY=VALUE` style override.
    ///
    /// The options are left unchanged if the result would not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        let invalid = |expected: &str| {
            MergeError::InvalidOption(format!("{key}: expected {expected}, got '{value}'"))
        };

        match key {
            "page_size" => next.page_size = value.parse().map_err(|_| invalid("an integer"))?,
            "decode_dates" => {
                next.decode_dates = value.parse().map_err(|_| invalid("true or false"))?;
            }
            "min_date_serial" => {
                next.min_date_serial = value.parse().map_err(|_| invalid("a number"))?;
            }
            "max_date_serial" => {
                next.max_date_serial = value.parse().map_err(|_| invalid("a number"))?;
            }
            "date_format" => next.date_format = value.to_string(),
            "export_sheet_name" => next.export_sheet_name = value.to_string(),
            "export_file_name" => next.export_file_name = value.to_string(),
            _ => return Err(MergeError::InvalidOption(format!("unknown option: {key}"))),
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}
