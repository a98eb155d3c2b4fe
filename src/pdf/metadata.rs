//! Page counting for existing PDFs

use std::path::Path;

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Read the `/Count` of the root page tree
///
/// This is more reliable than get_pages() for files with nested page trees.
fn count_pages_from_catalog(doc: &Document, path: &Path) -> Result<usize> {
    let malformed = || Error::MissingPageCount(path.to_path_buf());

    let catalog = doc.catalog().map_err(|_| malformed())?;
    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| malformed())?;
    let pages = doc.get_dictionary(pages_id).map_err(|_| malformed())?;

    match pages.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        _ => Err(malformed()),
    }
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = Document::load(path).map_err(|source| Error::UnreadablePdf {
        path: path.to_path_buf(),
        source,
    })?;
    count_pages_from_catalog(&doc, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::merge::tests::marked_document;
    use tempfile::TempDir;

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::UnreadablePdf { .. }));
    }

    #[test]
    fn test_count_pages() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("three.pdf");
        marked_document(&["1", "2", "3"]).save(&path).unwrap();

        assert_eq!(count_pages(&path).unwrap(), 3);
    }
}
