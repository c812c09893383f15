//! Word-compatible HTML trip sheet
//!
//! Word opens an HTML body saved with a `.doc` extension, which gives a
//! printable sheet without needing an uploaded template.

use std::fmt::Write;

use super::TripSheet;

/// MIME type Word associates with `.doc` downloads
pub const CONTENT_TYPE: &str = "application/msword";

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Table layout: each row is a list of (label, tag name) cells
const ROWS: &[&[(&str, &str)]] = &[
    &[("Lessee Id", "Lessee Id"), ("Mine Code", "Mine Code")],
    &[("Serial No", "Serial No"), ("Dispatch Slip No", "Dispatch No")],
    &[("Lease Name", "Lease Name"), ("District", "District")],
    &[("Lease Address", "Lease Address"), ("Taluk", "Taluk")],
    &[("Village", "Village"), ("SF.No / Extent", "Survey No")],
    &[("Mineral Name", "Material"), ("Quantity (MT)", "Limit")],
    &[("Bulk Permit No", "Bulk Permit No"), ("Classification", "Land Classification")],
    &[("Order Ref", "Order Ref"), ("Lease Period", "Lease Period")],
    &[("Within Tamil Nadu", "WIT"), ("Delivered To", "Delivered To")],
    &[("Vehicle No", "Vehicle No"), ("Destination Address", "Des Add")],
    &[("Vehicle Type", "Vehicle Type"), ("Route Via", "Transport Via")],
    &[("Total Distance", "Distance"), ("Required Time", "Req Time")],
    &[("Travelling Date", "Travelling Date"), ("Authorized Person", "LAP")],
    &[("Driver Name", "Driver Name"), ("Driver License", "Driver License")],
    &[("Driver Phone", "Driver Phone"), ("", "")],
];

/// Render the sheet as a standalone HTML document
pub fn render(sheet: &TripSheet<'_>) -> String {
    let value = |tag: &str| escape(&sheet.value_of(tag).unwrap_or_default());

    let mut html = String::new();
    html.push_str(
        "<html xmlns:o='urn:schemas-microsoft-com:office:office' \
         xmlns:w='urn:schemas-microsoft-com:office:word' \
         xmlns='http://www.w3.org/TR/REC-html40'>\n",
    );
    html.push_str("<head><meta charset='utf-8'><title>Dispatch Slip</title></head>\n<body>\n");

    // Writing into a String cannot fail
    let _ = writeln!(
        html,
        "<p style=\"text-align:right\">{}</p>\n<p>HSN Code : {} &nbsp; Date &amp; Time of Dispatch : {}</p>",
        value("Serial No"),
        value("HSN code"),
        value("Dispatch DT"),
    );

    html.push_str("<table border=\"1\" style=\"border-collapse: collapse; width: 100%;\">\n");
    for row in ROWS {
        html.push_str("<tr>");
        for &(label, tag) in row.iter() {
            if label.is_empty() {
                html.push_str("<td></td><td></td>");
            } else {
                let _ = write!(html, "<td><strong>{}</strong></td><td>{}</td>", escape(label), value(tag));
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");

    let _ = writeln!(html, "<p><strong>Raw Data:</strong> {}</p>", value("%qr"));
    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_record;
    use dispatch_common::profile::merged_profile;
    use std::collections::BTreeMap;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_render_contains_fields() {
        let record = sample_record();
        let profile = merged_profile(&BTreeMap::new());
        let html = render(&TripSheet::new(&record, &profile));

        assert!(html.contains("<td>TN05423869</td>"));
        assert!(html.contains("<td>Gravel</td>"));
        assert!(html.contains("<td>25</td>"));
        assert!(html.contains("Veeramarasanpettai"));
        assert!(html.contains("Raw Data:"));
    }

    #[test]
    fn test_render_escapes_user_values() {
        let mut record = sample_record();
        record.driver_name = "<script>alert(1)</script>".to_string();
        let profile = merged_profile(&BTreeMap::new());
        let html = render(&TripSheet::new(&record, &profile));

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
