//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, IoOperation, Result};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in broken files
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Load a source PDF
///
/// Parse failures (corrupt or not a PDF at all) are reported as
/// [`Error::UnreadablePdf`], files lopdf could not decrypt with the empty
/// password as [`Error::EncryptedPdf`]. A well-formed document without pages
/// is accepted and contributes nothing to the merge.
pub fn open_source(path: &Path) -> Result<Document> {
    let doc = Document::load(path).map_err(|source| Error::UnreadablePdf {
        path: path.to_path_buf(),
        source,
    })?;
    check_decrypted(doc, path)
}

/// lopdf drops the `/Encrypt` entry once it decrypts a document
fn check_decrypted(doc: Document, path: &Path) -> Result<Document> {
    if doc.is_encrypted() {
        return Err(Error::EncryptedPdf(path.to_path_buf()));
    }
    Ok(doc)
}

/// Pages collected so far for one merged output document
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use pdf_group_merge::pdf::{open_source, MergeAccumulator};
/// use std::path::Path;
///
/// let mut merged = MergeAccumulator::new();
/// for name in ["01234_a.pdf", "01234_b.pdf"] {
///     merged.append(open_source(Path::new(name))?);
/// }
/// merged.write(Path::new("output/01234.pdf"))?;
/// # Ok::<(), pdf_group_merge::Error>(())
/// ```
#[derive(Debug)]
pub struct MergeAccumulator {
    max_id: u32,
    page_ids: Vec<ObjectId>,
    objects: BTreeMap<ObjectId, Object>,
}

impl Default for MergeAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeAccumulator {
    pub fn new() -> Self {
        Self {
            max_id: 1,
            page_ids: Vec::new(),
            objects: BTreeMap::new(),
        }
    }

    /// Number of pages appended so far
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_ids.is_empty()
    }

    /// Append every page of `doc` after the pages already collected
    pub fn append(&mut self, mut doc: Document) {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(self.max_id);
        self.max_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

        // Pages get a new parent on write, so copy what they inherit now
        for &page_id in &pages {
            inherit_page_attributes(&mut doc, page_id);
        }

        debug!("Appending {} pages", pages.len());
        self.page_ids.extend(pages);

        // The source catalog and page tree nodes are replaced on write
        self.objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_page_tree_root(object)),
        );
    }

    /// Write the merged document to `path`, replacing any existing file
    ///
    /// Returns the number of pages written. A partially written file is
    /// removed on failure.
    pub fn write(self, path: &Path) -> Result<usize> {
        let page_count = self.page_ids.len();
        let mut merged_doc = self.into_document();

        let mut buffer = Vec::new();
        merged_doc.compress();
        merged_doc
            .save_to(&mut buffer)
            .map_err(|e| Error::io(IoOperation::Write, path, std::io::Error::other(e.to_string())))?;

        if let Err(e) = fs::write(path, &buffer) {
            let _ = fs::remove_file(path);
            return Err(Error::io(IoOperation::Write, path, e));
        }

        Ok(page_count)
    }

    fn into_document(self) -> Document {
        let mut merged_doc = Document::with_version("1.5");

        // Add all collected objects FIRST
        merged_doc.objects.extend(self.objects);

        // new_object_id() must hand out ids above every collected object
        merged_doc.max_id = self.max_id - 1;

        let pages_id = merged_doc.new_object_id();

        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages_object.set("Kids", Object::Array(kids));

        let catalog_id = merged_doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));

        merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
        merged_doc.trailer.set("Root", Object::Reference(catalog_id));

        for &page_id in &self.page_ids {
            if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        merged_doc
    }
}

fn is_page_tree_root(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => matches!(
            dict.get(b"Type"),
            Ok(Object::Name(name)) if name.as_slice() == b"Catalog" || name.as_slice() == b"Pages"
        ),
        _ => false,
    }
}

/// Copy inherited attributes from the page tree onto the page itself
fn inherit_page_attributes(doc: &mut Document, page_id: ObjectId) {
    let inherited: Vec<(&[u8], Object)> = match doc.get_dictionary(page_id) {
        Ok(page) => INHERITABLE_ATTRIBUTES
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|&key| find_inherited(doc, page, key).map(|value| (key, value)))
            .collect(),
        Err(_) => return,
    };

    if let Ok(page) = doc.get_dictionary_mut(page_id) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}

fn find_inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}
