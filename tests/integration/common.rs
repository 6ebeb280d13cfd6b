//! Fixture builders shared by the integration tests.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES: &[u8] =
    br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;
pub const STYLES: &[u8] = b"<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"/>";

pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn write_container(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

pub fn document_xml(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|t| {
            if t.is_empty() {
                "<w:p/>".to_string()
            } else {
                format!("<w:p><w:r><w:t xml:space=\"preserve\">{t}</w:t></w:r></w:p>")
            }
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}<w:sectPr><w:pgSz w:w=\"12240\"/></w:sectPr></w:body></w:document>"
    )
}

pub fn write_docx(dir: &Path, name: &str, paragraphs: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let xml = document_xml(paragraphs);
    write_container(
        &path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("word/document.xml", xml.as_bytes()),
            ("word/styles.xml", STYLES),
        ],
    );
    path
}

/// Rows of literal `<v>` values.
pub fn sheet_xml(rows: &[&[&str]]) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let cells: String = cells
                .iter()
                .map(|v| format!("<c t=\"s\"><v>{v}</v></c>"))
                .collect();
            format!("<row r=\"{}\">{cells}</row>", i + 1)
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{body}</sheetData></worksheet>"
    )
}

pub fn write_xlsx(dir: &Path, name: &str, rows: &[&[&str]], shared_strings: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let sheet = sheet_xml(rows);
    let sst: String = shared_strings
        .iter()
        .map(|s| format!("<si><t>{s}</t></si>"))
        .collect();
    let sst = format!("<sst>{sst}</sst>");
    write_container(
        &path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
            ("xl/sharedStrings.xml", sst.as_bytes()),
        ],
    );
    path
}

pub fn read_entry(container: &Path, entry: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(container).unwrap()).unwrap();
    let mut file = archive.by_name(entry).unwrap();
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).unwrap();
    buf
}

pub fn entry_names(container: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(container).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Every file under `root` with its bytes.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
        .collect()
}
