//! QR payload parsing for dispatch slips
//!
//! A dispatch slip QR code carries a single comma-separated line. Two layouts
//! are in circulation:
//!
//! ```text
//! Legacy:   TN05423869,DISP000004268324,ERDN0051,31-10-2025 09:09,450kms,9hrs ,Gravel(25MT),TN36 AY0948,ERODE
//! Extended: TN05423869,TNJ2500000017,DISP000004268324,ERDN0051,31-10-2025 09:09,450kms,9hrs,Gravel(25MT),TN36 AY0948,ERODE
//! ```
//!
//! The extended layout inserts the lessee id after the permit number. The two
//! are told apart by whether the second field is a dispatch number (`DISP...`).

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Placeholder stored for positions missing from the payload
pub const NOT_AVAILABLE: &str = "N/A";

/// Minimum number of comma-separated fields accepted as a dispatch slip
pub const MIN_FIELDS: usize = 5;

/// Display format of dispatch dates on slips (`31-10-2025 09:09`)
pub const DISPATCH_DATE_FORMAT: &str = "%d-%m-%Y %H:%M";

static MINERAL_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)\s*\((\d+)\s*MT\)").expect("static regex is valid")
});

/// Payload layout detected from the second field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SlipFormat {
    /// Nine fields, dispatch number in position 1
    Legacy,
    /// Ten fields, lessee id in position 1 and dispatch number in position 2
    Extended,
}

impl SlipFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlipFormat::Legacy => "legacy",
            SlipFormat::Extended => "extended",
        }
    }

    /// Detect the layout from already-trimmed payload fields
    pub fn detect(parts: &[&str]) -> Self {
        let is_legacy = parts
            .get(1)
            .map(|p| p.to_uppercase().starts_with("DISP"))
            .unwrap_or(false);

        if is_legacy {
            SlipFormat::Legacy
        } else {
            SlipFormat::Extended
        }
    }
}

impl std::str::FromStr for SlipFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "legacy" => Ok(SlipFormat::Legacy),
            "extended" => Ok(SlipFormat::Extended),
            other => Err(Error::InvalidInput(format!("Unknown slip format: {}", other))),
        }
    }
}

/// Structured fields of a scanned dispatch slip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSlip {
    /// Permit (serial) number printed on the trip sheet
    pub permit_no: String,
    /// Lessee id; empty for legacy payloads
    pub lessee_id: String,
    pub dispatch_slip_no: String,
    pub mine_code: String,
    /// Dispatch date as printed (`DD-MM-YYYY HH:MM`)
    pub dispatch_date: String,
    pub distance: String,
    pub duration: String,
    /// Mineral and quantity, e.g. `Gravel(25MT)`
    pub mineral_qty: String,
    pub vehicle_no: String,
    pub district: String,
    /// Original payload, untrimmed
    pub raw: String,
    pub format: SlipFormat,
}

/// Mineral name and quantity split out of a `Gravel (25 MT)` style field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineralQty {
    pub name: String,
    pub qty: String,
}

/// Parse a QR payload, back-filling a missing dispatch date with the current
/// local time.
pub fn parse_qr_data(payload: &str) -> Result<DispatchSlip> {
    parse_qr_data_at(payload, crate::time::local_now())
}

/// Parse a QR payload using `now` for the dispatch date back-fill
pub fn parse_qr_data_at(payload: &str, now: NaiveDateTime) -> Result<DispatchSlip> {
    if payload.trim().is_empty() {
        return Err(Error::InvalidInput("QR payload is empty".to_string()));
    }

    let parts: Vec<&str> = payload.split(',').map(str::trim).collect();
    if parts.len() < MIN_FIELDS {
        return Err(Error::InvalidInput(format!(
            "QR payload has {} fields, expected at least {}",
            parts.len(),
            MIN_FIELDS
        )));
    }

    let format = SlipFormat::detect(&parts);
    let field = |i: usize| -> String {
        match parts.get(i) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => NOT_AVAILABLE.to_string(),
        }
    };

    // Positions of (lessee, dispatch, mine, date) for each layout; the
    // remaining fields follow the date in the same order.
    let (lessee_id, dispatch_idx, mine_idx, date_idx) = match format {
        SlipFormat::Legacy => (String::new(), 1, 2, 3),
        SlipFormat::Extended => (field(1), 2, 3, 4),
    };

    let dispatch_date = match parts.get(date_idx) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => {
            let filled = format_dispatch_date(&now);
            debug!(dispatch_date = %filled, "Dispatch date missing from payload, using current time");
            filled
        }
    };

    Ok(DispatchSlip {
        permit_no: field(0),
        lessee_id,
        dispatch_slip_no: field(dispatch_idx),
        mine_code: field(mine_idx),
        dispatch_date,
        distance: field(date_idx + 1),
        duration: field(date_idx + 2),
        mineral_qty: field(date_idx + 3),
        vehicle_no: field(date_idx + 4),
        district: field(date_idx + 5),
        raw: payload.to_string(),
        format,
    })
}

/// Split `Gravel (25 MT)` / `Gravel(25MT)` into name and quantity.
///
/// Falls back to the whole input as the name with an empty quantity.
pub fn split_mineral_qty(text: &str) -> MineralQty {
    match MINERAL_QTY.captures(text) {
        Some(caps) => MineralQty {
            name: caps[1].trim().to_string(),
            qty: caps[2].trim().to_string(),
        },
        None => MineralQty {
            name: text.to_string(),
            qty: String::new(),
        },
    }
}

/// Parse a slip date (`31-10-2025 09:09`, optionally with seconds).
///
/// Returns `None` when fewer than five numeric parts are present or the
/// values do not form a valid calendar date and time.
pub fn parse_dispatch_date(text: &str) -> Option<NaiveDateTime> {
    let parts: Vec<u32> = text
        .split(|c| c == '-' || c == ' ' || c == ':')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    if parts.len() < 5 {
        return None;
    }

    let (day, month, year, hour, minute) = (parts[0], parts[1], parts[2], parts[3], parts[4]);
    let second = parts.get(5).copied().unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}

/// Format a timestamp the way slips print dispatch dates
pub fn format_dispatch_date(dt: &NaiveDateTime) -> String {
    dt.format(DISPATCH_DATE_FORMAT).to_string()
}
