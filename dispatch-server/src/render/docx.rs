//! Word (.docx) template filling
//!
//! A `.docx` file is a zip package. Placeholders typed into Word as
//! `<Serial No>` are stored XML-escaped (`&lt;Serial No&gt;`) inside the body,
//! header and footer parts, and Word may split one placeholder across several
//! runs. Filling rewrites those parts and copies every other entry unchanged.

use std::io::{Cursor, Read, Write};

use dispatch_common::{Error, Result};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::TripSheet;

pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Main document part every Word package must contain
const DOCUMENT_PART: &str = "word/document.xml";

/// Longest escaped span inspected for a split placeholder
const MAX_TAG_SPAN: usize = 4096;

const OPEN: &str = "&lt;";
const CLOSE: &str = "&gt;";

fn zip_error(context: &str, err: zip::result::ZipError) -> Error {
    Error::InvalidInput(format!("{}: {}", context, err))
}

/// Parts whose text is searched for placeholders
fn is_text_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// Check that `bytes` is a Word package
pub fn validate_template(bytes: &[u8]) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| zip_error("Template is not a .docx file", e))?;

    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| zip_error("Template has no word/document.xml", e))?;

    Ok(())
}

/// Escape text for XML character data
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove markup from a span, leaving only character data
fn strip_markup(span: &str) -> String {
    let mut text = String::with_capacity(span.len());
    let mut in_tag = false;
    for c in span.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

/// Replace every known placeholder in one XML part.
///
/// For a placeholder split across runs, the markup between the first and last
/// fragment is dropped. That markup is a balanced close/reopen sequence, so
/// the surrounding run stays well formed.
pub fn fill_xml(xml: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let replaced = after_open
            .find(CLOSE)
            .filter(|end| *end <= MAX_TAG_SPAN)
            .and_then(|end| {
                let name = strip_markup(&after_open[..end]);
                lookup(name.trim()).map(|value| (end, value))
            });

        match replaced {
            Some((end, value)) => {
                out.push_str(&escape_xml(&value));
                rest = &after_open[end + CLOSE.len()..];
            }
            None => {
                out.push_str(OPEN);
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Fill a template package for one trip sheet
pub fn render(template: &[u8], sheet: &TripSheet<'_>) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(template))
        .map_err(|e| zip_error("Template is not a .docx file", e))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| zip_error("Corrupt template entry", e))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| Error::Internal(format!("Failed to write document: {}", e)))?;
            continue;
        }

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;

        if is_text_part(&name) {
            let xml = String::from_utf8(contents)
                .map_err(|_| Error::InvalidInput(format!("Template part {} is not UTF-8", name)))?;
            contents = fill_xml(&xml, |tag| sheet.value_of(tag)).into_bytes();
        }

        writer
            .start_file(name, options)
            .map_err(|e| Error::Internal(format!("Failed to write document: {}", e)))?;
        writer.write_all(&contents)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| Error::Internal(format!("Failed to finish document: {}", e)))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::render::tests::sample_record;
    use dispatch_common::profile::merged_profile;
    use std::collections::BTreeMap;

    /// Minimal Word package with the given body XML
    pub(crate) fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
        writer.start_file(DOCUMENT_PART, options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        text
    }

    fn lookup(tag: &str) -> Option<String> {
        match tag {
            "Serial No" => Some("TN05423869".to_string()),
            "Driver Name" => Some("A & B".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_fill_simple_tag() {
        let xml = "<w:t>Serial: &lt;Serial No&gt;</w:t>";
        assert_eq!(fill_xml(xml, lookup), "<w:t>Serial: TN05423869</w:t>");
    }

    #[test]
    fn test_fill_split_across_runs() {
        let xml = "<w:r><w:t>&lt;Serial</w:t></w:r><w:r><w:t> No&gt;</w:t></w:r>";
        assert_eq!(fill_xml(xml, lookup), "<w:r><w:t>TN05423869</w:t></w:r>");
    }

    #[test]
    fn test_fill_escapes_values() {
        let xml = "<w:t>&lt;Driver Name&gt;</w:t>";
        assert_eq!(fill_xml(xml, lookup), "<w:t>A &amp; B</w:t>");
    }

    #[test]
    fn test_unknown_tags_left_alone() {
        let xml = "<w:t>a &lt; b &gt; c &lt;Other&gt;</w:t>";
        assert_eq!(fill_xml(xml, lookup), xml);
    }

    #[test]
    fn test_unclosed_tag_left_alone() {
        let xml = "<w:t>&lt;Serial No</w:t>";
        assert_eq!(fill_xml(xml, lookup), xml);
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template(&build_docx("<w:document/>")).is_ok());
        assert!(validate_template(b"not a zip").is_err());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("readme.txt", FileOptions::default()).unwrap();
        writer.write_all(b"hello").unwrap();
        let not_word = writer.finish().unwrap().into_inner();
        assert!(validate_template(&not_word).is_err());
    }

    #[test]
    fn test_render_fills_document_part() {
        let template = build_docx("<w:document><w:t>&lt;Serial No&gt; / &lt;Material&gt;</w:t></w:document>");
        let record = sample_record();
        let profile = merged_profile(&BTreeMap::new());

        let output = render(&template, &TripSheet::new(&record, &profile)).unwrap();

        assert_eq!(
            read_part(&output, DOCUMENT_PART),
            "<w:document><w:t>TN05423869 / Gravel</w:t></w:document>"
        );
        assert_eq!(read_part(&output, "[Content_Types].xml"), "<?xml version=\"1.0\"?><Types/>");
    }
}
