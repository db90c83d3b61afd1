//! Minimal single-sheet XLSX (OOXML) writer and reader.
//!
//! Only what the report needs: one worksheet of inline strings, a bold
//! grey header row and fixed column widths. The reader understands the
//! same layout and is used to check written workbooks.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Read, Seek, Write};
use std::path::Path;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const SHEET_PATH: &str = "xl/worksheets/sheet1.xml";
const WORKBOOK_PATH: &str = "xl/workbook.xml";

/// Style index of the header cells in `styles.xml`.
const HEADER_STYLE: &str = "1";
/// Maximum decompressed bytes to read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Font 1 is bold, fill 2 is solid E0E0E0; cellXfs[1] combines them.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor rgb="FFE0E0E0"/><bgColor indexed="64"/></patternFill></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

#[derive(Debug)]
pub enum XlsxError {
    Io(std::io::Error),
    Zip(String),
    Xml(String),
}

impl std::fmt::Display for XlsxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XlsxError::Io(e) => write!(f, "I/O error: {}", e),
            XlsxError::Zip(e) => write!(f, "invalid workbook archive: {}", e),
            XlsxError::Xml(e) => write!(f, "invalid workbook XML: {}", e),
        }
    }
}

impl std::error::Error for XlsxError {}

impl From<std::io::Error> for XlsxError {
    fn from(e: std::io::Error) -> Self {
        XlsxError::Io(e)
    }
}

impl From<zip::result::ZipError> for XlsxError {
    fn from(e: zip::result::ZipError) -> Self {
        XlsxError::Zip(e.to_string())
    }
}

/// A sheet column: header text and display width in characters.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub header: &'a str,
    pub width: f64,
}

/// Write a workbook with one sheet: a styled header row followed by `rows`.
pub fn write_workbook(
    path: &Path,
    sheet_name: &str,
    columns: &[Column<'_>],
    rows: &[Vec<String>],
) -> Result<(), XlsxError> {
    let workbook = workbook_xml(sheet_name)?;
    let sheet = sheet_xml(columns, rows)?;

    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        (WORKBOOK_PATH, &workbook),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/styles.xml", STYLES.as_bytes()),
        (SHEET_PATH, &sheet),
    ];
    for (name, bytes) in parts {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(())
}

fn emit(writer: &mut quick_xml::Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XlsxError> {
    writer
        .write_event(event)
        .map_err(|e| XlsxError::Xml(e.to_string()))
}

fn new_document() -> Result<quick_xml::Writer<Vec<u8>>, XlsxError> {
    let mut writer = quick_xml::Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;
    Ok(writer)
}

fn workbook_xml(sheet_name: &str) -> Result<Vec<u8>, XlsxError> {
    let mut w = new_document()?;
    emit(
        &mut w,
        Event::Start(BytesStart::new("workbook").with_attributes([("xmlns", NS_MAIN), ("xmlns:r", NS_REL)])),
    )?;
    emit(&mut w, Event::Start(BytesStart::new("sheets")))?;
    emit(
        &mut w,
        Event::Empty(BytesStart::new("sheet").with_attributes([
            ("name", sheet_name),
            ("sheetId", "1"),
            ("r:id", "rId1"),
        ])),
    )?;
    emit(&mut w, Event::End(BytesEnd::new("sheets")))?;
    emit(&mut w, Event::End(BytesEnd::new("workbook")))?;
    Ok(w.into_inner())
}

fn sheet_xml(columns: &[Column<'_>], rows: &[Vec<String>]) -> Result<Vec<u8>, XlsxError> {
    let mut w = new_document()?;
    emit(
        &mut w,
        Event::Start(BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN)])),
    )?;

    if !columns.is_empty() {
        emit(&mut w, Event::Start(BytesStart::new("cols")))?;
        for (i, column) in columns.iter().enumerate() {
            let index = (i + 1).to_string();
            let width = column.width.to_string();
            emit(
                &mut w,
                Event::Empty(BytesStart::new("col").with_attributes([
                    ("min", index.as_str()),
                    ("max", index.as_str()),
                    ("width", width.as_str()),
                    ("customWidth", "1"),
                ])),
            )?;
        }
        emit(&mut w, Event::End(BytesEnd::new("cols")))?;
    }

    emit(&mut w, Event::Start(BytesStart::new("sheetData")))?;
    let header = columns.iter().map(|c| c.header);
    write_row(&mut w, 1, header, Some(HEADER_STYLE))?;
    for (i, row) in rows.iter().enumerate() {
        write_row(&mut w, i + 2, row.iter().map(String::as_str), None)?;
    }
    emit(&mut w, Event::End(BytesEnd::new("sheetData")))?;
    emit(&mut w, Event::End(BytesEnd::new("worksheet")))?;
    Ok(w.into_inner())
}

fn write_row<'v>(
    w: &mut quick_xml::Writer<Vec<u8>>,
    row_number: usize,
    values: impl Iterator<Item = &'v str>,
    style: Option<&str>,
) -> Result<(), XlsxError> {
    let r = row_number.to_string();
    emit(w, Event::Start(BytesStart::new("row").with_attributes([("r", r.as_str())])))?;
    for (col, value) in values.enumerate() {
        let cell_ref = format!("{}{}", column_name(col), row_number);
        let mut cell = BytesStart::new("c").with_attributes([("r", cell_ref.as_str()), ("t", "inlineStr")]);
        if let Some(style) = style {
            cell.push_attribute(("s", style));
        }
        emit(w, Event::Start(cell))?;
        emit(w, Event::Start(BytesStart::new("is")))?;
        emit(
            w,
            Event::Start(BytesStart::new("t").with_attributes([("xml:space", "preserve")])),
        )?;
        emit(w, Event::Text(BytesText::new(value)))?;
        emit(w, Event::End(BytesEnd::new("t")))?;
        emit(w, Event::End(BytesEnd::new("is")))?;
        emit(w, Event::End(BytesEnd::new("c")))?;
    }
    emit(w, Event::End(BytesEnd::new("row")))
}

/// Spreadsheet column letters for a zero-based index: 0 → A, 25 → Z, 26 → AA.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn read_zip_entry_bounded<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, XlsxError> {
    let entry = archive.by_name(name)?;
    let mut out = Vec::new();
    entry.take(max_bytes).read_to_end(&mut out)?;
    if out.len() as u64 >= max_bytes {
        return Err(XlsxError::Zip(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn open_archive(path: &Path) -> Result<zip::ZipArchive<std::fs::File>, XlsxError> {
    let file = std::fs::File::open(path)?;
    Ok(zip::ZipArchive::new(file)?)
}

/// Sheet names listed in the workbook, in order.
pub fn read_sheet_names(path: &Path) -> Result<Vec<String>, XlsxError> {
    let mut archive = open_archive(path)?;
    let xml = read_zip_entry_bounded(&mut archive, WORKBOOK_PATH, MAX_XML_ENTRY_BYTES)?;

    let mut names = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| XlsxError::Xml(e.to_string()))?;
                        names.push(value.into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

/// Cell text of the first worksheet, row by row. Only inline string cells
/// are understood, which is all [`write_workbook`] produces.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, XlsxError> {
    let mut archive = open_archive(path)?;
    let xml = read_zip_entry_bounded(&mut archive, SHEET_PATH, MAX_XML_ENTRY_BYTES)?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => rows.push(Vec::new()),
                b"c" => {
                    if let Some(row) = rows.last_mut() {
                        row.push(String::new());
                    }
                }
                b"t" => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"c" {
                    if let Some(row) = rows.last_mut() {
                        row.push(String::new());
                    }
                }
            }
            Ok(Event::Text(te)) if in_t => {
                let text = te.unescape().map_err(|e| XlsxError::Xml(e.to_string()))?;
                if let Some(cell) = rows.last_mut().and_then(|row| row.last_mut()) {
                    cell.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_t = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_entry(path: &Path, name: &str) -> String {
        let mut archive = open_archive(path).unwrap();
        let bytes = read_zip_entry_bounded(&mut archive, name, MAX_XML_ENTRY_BYTES).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn columns() -> Vec<Column<'static>> {
        vec![
            Column { header: "Name", width: 20.0 },
            Column { header: "Note", width: 50.0 },
        ]
    }

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(7), "H");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn written_cells_read_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.xlsx");
        let rows = vec![
            vec!["Alice".to_string(), "Likes <rope> & \"knots\"".to_string()],
            vec!["".to_string(), "  padded  ".to_string()],
        ];

        write_workbook(&path, "People", &columns(), &rows).unwrap();

        let read = read_rows(&path).unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[0], vec!["Name", "Note"]);
        assert_eq!(read[1], rows[0]);
        assert_eq!(read[2], rows[1]);
        assert_eq!(read_sheet_names(&path).unwrap(), vec!["People"]);
    }

    #[test]
    fn header_is_styled_and_widths_are_set() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.xlsx");
        write_workbook(&path, "S", &columns(), &[vec!["a".into(), "b".into()]]).unwrap();

        let sheet = read_entry(&path, SHEET_PATH);
        assert!(sheet.contains(r#"<col min="1" max="1" width="20" customWidth="1"/>"#));
        assert!(sheet.contains(r#"<col min="2" max="2" width="50" customWidth="1"/>"#));
        assert!(sheet.contains(r#"<c r="A1" t="inlineStr" s="1">"#));
        assert!(sheet.contains(r#"<c r="B2" t="inlineStr">"#));

        let styles = read_entry(&path, "xl/styles.xml");
        assert!(styles.contains("<b/>"));
        assert!(styles.contains("FFE0E0E0"));
    }

    #[test]
    fn sheet_name_is_escaped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.xlsx");
        write_workbook(&path, "Q&A", &columns(), &[]).unwrap();
        assert_eq!(read_sheet_names(&path).unwrap(), vec!["Q&A"]);
        assert_eq!(read_rows(&path).unwrap().len(), 1);
    }

    #[test]
    fn non_zip_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(read_rows(&path), Err(XlsxError::Zip(_))));
    }
}
