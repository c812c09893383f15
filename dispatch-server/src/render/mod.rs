//! Trip sheet rendering
//!
//! A [`TripSheet`] joins a scan record with the lessee profile and resolves
//! the `<Tag>` placeholders used by both the built-in HTML sheet and uploaded
//! Word templates.

use dispatch_common::db::ScanRecord;
use dispatch_common::slip::{split_mineral_qty, NOT_AVAILABLE};
use serde::Serialize;
use std::collections::BTreeMap;

pub mod docx;
pub mod html;

/// Where a placeholder's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// Record field first, then the profile key, then empty
    Field(&'static str, Option<&'static str>),
    /// Profile key only
    Profile(&'static str),
    MineralName,
    Quantity,
    QrPayload,
}

/// A template placeholder as shown to users
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Placeholder {
    pub category: &'static str,
    pub label: &'static str,
    /// Tag as typed into a document, e.g. `<Serial No>`
    pub tag: &'static str,
    #[serde(skip)]
    source: Source,
}

impl Placeholder {
    /// Tag text between the angle brackets
    pub fn name(&self) -> &'static str {
        self.tag.trim_start_matches('<').trim_end_matches('>')
    }
}

const fn ph(category: &'static str, label: &'static str, tag: &'static str, source: Source) -> Placeholder {
    Placeholder { category, label, tag, source }
}

pub const PLACEHOLDERS: &[Placeholder] = &[
    ph("Core Details", "Serial No", "<Serial No>", Source::Field("permitNo", None)),
    ph("Core Details", "Dispatch No", "<Dispatch No>", Source::Field("dispatchSlipNo", None)),
    ph("Core Details", "Mine Code", "<Mine Code>", Source::Field("mineCode", Some("mineCode"))),
    ph("Core Details", "Date", "<Dispatch DT>", Source::Field("dispatchDate", None)),
    ph("Core Details", "Vehicle No", "<Vehicle No>", Source::Field("vehicleNo", None)),
    ph("Core Details", "Vehicle Type", "<Vehicle Type>", Source::Field("vehicleType", Some("vehicleType"))),
    ph("Core Details", "Material", "<Material>", Source::MineralName),
    ph("Core Details", "Bulk Permit No", "<Bulk Permit No>", Source::Profile("bulkPermitNo")),
    ph("Core Details", "Order Ref", "<Order Ref>", Source::Field("orderRef", None)),
    ph("Lease/Mine Info", "Lessee Id", "<Lessee Id>", Source::Field("lesseeId", None)),
    ph("Lease/Mine Info", "Lessee Name", "<Lease Name>", Source::Profile("lesseeName")),
    ph("Lease/Mine Info", "Lessee Addr", "<Lease Address>", Source::Profile("lesseeAddress")),
    ph("Lease/Mine Info", "Auth Person", "<LAP>", Source::Profile("authPerson")),
    ph("Lease/Mine Info", "District", "<District>", Source::Field("district", None)),
    ph("Lease/Mine Info", "Taluk", "<Taluk>", Source::Profile("taluk")),
    ph("Lease/Mine Info", "Village", "<Village>", Source::Profile("village")),
    ph("Lease/Mine Info", "Survey No", "<Survey No>", Source::Profile("sfNo")),
    ph("Lease/Mine Info", "Limit", "<Limit>", Source::Quantity),
    ph("Lease/Mine Info", "Lease Period", "<Lease Period>", Source::Profile("leasePeriod")),
    ph("Lease/Mine Info", "Classification", "<Land Classification>", Source::Profile("mineralClassification")),
    ph("Lease/Mine Info", "HSN Code", "<HSN code>", Source::Profile("hsnCode")),
    ph("Lease/Mine Info", "Within TN", "<WIT>", Source::Profile("withinTN")),
    ph("Driver & Trip", "Driver Name", "<Driver Name>", Source::Field("driverName", Some("driverName"))),
    ph("Driver & Trip", "License", "<Driver License>", Source::Field("driverLicense", Some("driverLicense"))),
    ph("Driver & Trip", "Phone", "<Driver Phone>", Source::Field("driverPhone", Some("driverPhone"))),
    ph("Driver & Trip", "Destination", "<Des Add>", Source::Field("destination", Some("destinationAddress"))),
    ph("Driver & Trip", "Distance", "<Distance>", Source::Field("distance", None)),
    ph("Driver & Trip", "Duration", "<Req Time>", Source::Field("duration", None)),
    ph("Driver & Trip", "Travel Date", "<Travelling Date>", Source::Field("dispatchDate", None)),
    ph("Driver & Trip", "Delivered To", "<Delivered To>", Source::Field("deliveredTo", Some("deliveredTo"))),
    ph("Driver & Trip", "Transport Via", "<Transport Via>", Source::Profile("routeVia")),
    ph("Special", "QR Image", "<%qr>", Source::QrPayload),
];

/// Look up a placeholder by the text between its angle brackets
pub fn find_placeholder(name: &str) -> Option<&'static Placeholder> {
    PLACEHOLDERS.iter().find(|p| p.name() == name)
}

/// Non-empty and not the parser's missing-field marker
fn present(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.is_empty() || value == NOT_AVAILABLE {
        None
    } else {
        Some(value)
    }
}

/// A record plus the profile values needed to print it
pub struct TripSheet<'a> {
    pub record: &'a ScanRecord,
    pub profile: &'a BTreeMap<String, String>,
}

impl<'a> TripSheet<'a> {
    pub fn new(record: &'a ScanRecord, profile: &'a BTreeMap<String, String>) -> Self {
        Self { record, profile }
    }

    fn record_field(&self, key: &str) -> &'a str {
        let r = self.record;
        match key {
            "permitNo" => &r.permit_no,
            "lesseeId" => &r.lessee_id,
            "dispatchSlipNo" => &r.dispatch_slip_no,
            "mineCode" => &r.mine_code,
            "dispatchDate" => &r.dispatch_date,
            "distance" => &r.distance,
            "duration" => &r.duration,
            "mineralQty" => &r.mineral_qty,
            "vehicleNo" => &r.vehicle_no,
            "district" => &r.district,
            "vehicleType" => &r.vehicle_type,
            "driverName" => &r.driver_name,
            "driverLicense" => &r.driver_license,
            "driverPhone" => &r.driver_phone,
            "destination" => &r.destination,
            "deliveredTo" => &r.delivered_to,
            "orderRef" => &r.order_ref,
            _ => "",
        }
    }

    fn profile_value(&self, key: &str) -> String {
        self.profile
            .get(key)
            .and_then(|v| present(v))
            .unwrap_or_default()
            .to_string()
    }

    /// Resolved text for a placeholder
    pub fn value(&self, placeholder: &Placeholder) -> String {
        match placeholder.source {
            Source::Field(field, fallback) => match present(self.record_field(field)) {
                Some(value) => value.to_string(),
                None => fallback.map(|key| self.profile_value(key)).unwrap_or_default(),
            },
            Source::Profile(key) => self.profile_value(key),
            Source::MineralName => present(&self.record.mineral_qty)
                .map(|m| split_mineral_qty(m).name)
                .unwrap_or_default(),
            Source::Quantity => present(&self.record.mineral_qty)
                .map(|m| split_mineral_qty(m).qty)
                .unwrap_or_default(),
            Source::QrPayload => self.record.raw.clone(),
        }
    }

    /// Resolved text for a tag name (without brackets); `None` if unknown
    pub fn value_of(&self, name: &str) -> Option<String> {
        find_placeholder(name).map(|p| self.value(p))
    }

    /// Suggested download name without extension
    pub fn file_stem(&self) -> String {
        let serial: String = present(&self.record.permit_no)
            .unwrap_or("Slip")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        format!("Dispatch_{}", if serial.is_empty() { "Slip" } else { &serial })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use dispatch_common::db::TripSheetStatus;
    use dispatch_common::profile::merged_profile;
    use dispatch_common::SlipFormat;

    pub(crate) fn sample_record() -> ScanRecord {
        let at = Utc.with_ymd_and_hms(2025, 10, 31, 4, 0, 0).unwrap();
        ScanRecord {
            id: "00000000-0000-0000-0000-000000000001".to_string(),
            permit_no: "TN05423869".to_string(),
            lessee_id: String::new(),
            dispatch_slip_no: "DISP000004268324".to_string(),
            mine_code: "ERDN0051".to_string(),
            dispatch_date: "31-10-2025 09:09".to_string(),
            parsed_date: NaiveDate::from_ymd_opt(2025, 10, 31).unwrap().and_hms_opt(9, 9, 0).unwrap(),
            distance: "450kms".to_string(),
            duration: "9hrs".to_string(),
            mineral_qty: "Gravel(25MT)".to_string(),
            vehicle_no: "TN36 AY0948".to_string(),
            district: "ERODE".to_string(),
            raw: "TN05423869,DISP000004268324,ERDN0051,31-10-2025 09:09,450kms,9hrs,Gravel(25MT),TN36 AY0948,ERODE".to_string(),
            format: SlipFormat::Legacy,
            vehicle_type: String::new(),
            driver_name: "RAVI".to_string(),
            driver_license: String::new(),
            driver_phone: String::new(),
            destination: String::new(),
            delivered_to: String::new(),
            order_ref: String::new(),
            trip_sheet_status: TripSheetStatus::Generated,
            is_deleted: false,
            deleted_at: None,
            scanned_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_record_value_preferred() {
        let record = sample_record();
        let profile = merged_profile(&BTreeMap::new());
        let sheet = TripSheet::new(&record, &profile);

        assert_eq!(sheet.value_of("Serial No").unwrap(), "TN05423869");
        assert_eq!(sheet.value_of("Driver Name").unwrap(), "RAVI");
    }

    #[test]
    fn test_profile_fallback_for_empty_fields() {
        let record = sample_record();
        let profile = merged_profile(&BTreeMap::new());
        let sheet = TripSheet::new(&record, &profile);

        assert_eq!(sheet.value_of("Vehicle Type").unwrap(), "TIPPER");
        assert_eq!(sheet.value_of("Des Add").unwrap(), "Kattumavadi");
        assert_eq!(sheet.value_of("Driver License").unwrap(), "TN4222035355426");
        assert_eq!(sheet.value_of("HSN code").unwrap(), "0002271");
    }

    #[test]
    fn test_not_available_treated_as_missing() {
        let mut record = sample_record();
        record.mine_code = NOT_AVAILABLE.to_string();
        record.order_ref = NOT_AVAILABLE.to_string();
        let profile = merged_profile(&BTreeMap::new());
        let sheet = TripSheet::new(&record, &profile);

        assert_eq!(sheet.value_of("Mine Code").unwrap(), "");
        assert_eq!(sheet.value_of("Order Ref").unwrap(), "");
    }

    #[test]
    fn test_mineral_split_placeholders() {
        let record = sample_record();
        let profile = merged_profile(&BTreeMap::new());
        let sheet = TripSheet::new(&record, &profile);

        assert_eq!(sheet.value_of("Material").unwrap(), "Gravel");
        assert_eq!(sheet.value_of("Limit").unwrap(), "25");
        assert_eq!(sheet.value_of("%qr").unwrap(), record.raw);
    }

    #[test]
    fn test_unknown_tag() {
        let record = sample_record();
        let profile = merged_profile(&BTreeMap::new());
        assert!(TripSheet::new(&record, &profile).value_of("Nope").is_none());
    }

    #[test]
    fn test_file_stem_sanitized() {
        let mut record = sample_record();
        let profile = BTreeMap::new();
        assert_eq!(TripSheet::new(&record, &profile).file_stem(), "Dispatch_TN05423869");

        record.permit_no = "../x y".to_string();
        assert_eq!(TripSheet::new(&record, &profile).file_stem(), "Dispatch_xy");

        record.permit_no = NOT_AVAILABLE.to_string();
        assert_eq!(TripSheet::new(&record, &profile).file_stem(), "Dispatch_Slip");
    }

    #[test]
    fn test_placeholder_names_unique() {
        let mut names: Vec<&str> = PLACEHOLDERS.iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PLACEHOLDERS.len());
    }
}
