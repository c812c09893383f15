//! Serial number arithmetic for bulk trip-sheet generation
//!
//! Permit serials are an alphabetic prefix followed by a zero-padded counter
//! (`TN05423869`). Bulk generation issues consecutive serials from a starting
//! slip, keeping the prefix and padding width.

use std::fmt;

use crate::{Error, Result};

/// Upper bound on trip sheets created by one bulk request
pub const MAX_BULK_COUNT: u32 = 500;

/// A serial split into its fixed prefix and numeric counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialNumber {
    pub prefix: String,
    pub number: u64,
    /// Digit count of the counter as written, used for zero padding
    pub width: usize,
}

impl SerialNumber {
    /// Parse a serial whose trailing ASCII digits form the counter
    pub fn parse(serial: &str) -> Result<Self> {
        let serial = serial.trim();
        let digits_start = serial
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)
            .ok_or_else(|| {
                Error::InvalidInput(format!("Serial number has no numeric suffix: {:?}", serial))
            })?;

        let (prefix, digits) = serial.split_at(digits_start);
        let number = digits.parse::<u64>().map_err(|_| {
            Error::InvalidInput(format!("Serial number counter out of range: {}", digits))
        })?;

        Ok(Self {
            prefix: prefix.to_string(),
            number,
            width: digits.len(),
        })
    }

    /// Serial `n` positions after this one
    pub fn offset(&self, n: u64) -> Result<Self> {
        let number = self.number.checked_add(n).ok_or_else(|| {
            Error::InvalidInput(format!("Serial number overflow after {}", self))
        })?;

        Ok(Self {
            prefix: self.prefix.clone(),
            number,
            width: self.width,
        })
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:0width$}", self.prefix, self.number, width = self.width)
    }
}

/// Generate `count` consecutive serials starting with `start` itself
pub fn generate_serials(start: &str, count: u32) -> Result<Vec<String>> {
    if count == 0 || count > MAX_BULK_COUNT {
        return Err(Error::InvalidInput(format!(
            "Count must be between 1 and {}, got {}",
            MAX_BULK_COUNT, count
        )));
    }

    let base = SerialNumber::parse(start)?;
    (0..u64::from(count))
        .map(|i| base.offset(i).map(|s| s.to_string()))
        .collect()
}
