//! Photo selection and preview handle lifecycle.
//!
//! An [`UploadSet`] owns the selected files together with one
//! [`PreviewHandle`] per file. Handles are allocated from a
//! [`PreviewRegistry`] and given back to it on every path that drops an
//! entry: replacing the selection, removing one entry, tearing the set down,
//! or dropping it.
//!
//! ```ignore
//! use aura_edit_core::upload::{SourceFile, UploadSet};
//!
//! let mut uploads = UploadSet::new();
//! uploads.replace_selection(vec![SourceFile::from_path("me.jpg")?]);
//! let url = uploads.selection()[0].preview().url();
//! ```

use crate::error::{AppError, Result};
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Maximum number of photos in one selection.
pub const MAX_FILES: usize = 10;

/// MIME types the file picker accepts.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/heic"];

/// A selected file: name, declared MIME type and its bytes.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, Debug)]
pub struct SourceFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Wraps in-memory bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnsupportedMediaType`] if `mime_type` is not in
    /// [`ACCEPTED_MIME_TYPES`].
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self> {
        let mime_type = mime_type.into();
        if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(AppError::UnsupportedMediaType(mime_type));
        }
        Ok(Self {
            name: name.into(),
            mime_type,
            bytes: bytes.into(),
        })
    }

    /// Reads a file from disk, deriving its MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime_type = mime_type_for_path(path)
            .ok_or_else(|| AppError::UnsupportedMediaType(path.display().to_string()))?;
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, mime_type, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Maps a file extension to one of the accepted MIME types.
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Opaque reference to a selected file's bytes, used to render its thumbnail.
///
/// Not `Clone`: each handle has exactly one owner and is consumed when revoked.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: u64,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Locally resolvable URL for this handle.
    pub fn url(&self) -> String {
        format!("blob:aura-edit/{}", self.id)
    }
}

/// Allocates and releases preview handles.
pub trait PreviewRegistry {
    /// Allocates a fresh handle for `file`.
    fn create(&mut self, file: &SourceFile) -> PreviewHandle;

    /// Releases `handle`. Called exactly once per handle.
    fn revoke(&mut self, handle: PreviewHandle);
}

/// In-memory registry mapping live handles to the bytes they refer to.
#[derive(Debug, Default)]
pub struct PreviewStore {
    next_id: u64,
    live: HashMap<u64, Arc<[u8]>>,
    released: u64,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes behind a live handle.
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<&[u8]> {
        self.live.get(&handle.id).map(|bytes| &bytes[..])
    }

    /// Number of handles allocated and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of handles ever allocated.
    pub fn allocated(&self) -> u64 {
        self.next_id
    }

    /// Number of handles released.
    pub fn released(&self) -> u64 {
        self.released
    }
}

impl PreviewRegistry for PreviewStore {
    fn create(&mut self, file: &SourceFile) -> PreviewHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, Arc::clone(&file.bytes));
        PreviewHandle { id }
    }

    fn revoke(&mut self, handle: PreviewHandle) {
        if self.live.remove(&handle.id).is_some() {
            self.released += 1;
        } else {
            warn!("preview handle {} revoked but not live", handle.id);
        }
    }
}

/// One entry of the selection: the file and its live preview handle.
#[derive(Debug)]
pub struct UploadedImage {
    file: SourceFile,
    preview: PreviewHandle,
}

impl UploadedImage {
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

/// The current photo selection and the preview handles it owns.
///
/// The selection only changes wholesale ([`replace_selection`]) or by removing
/// one entry ([`remove_at`]). Every entry holds exactly one live handle.
///
/// [`replace_selection`]: UploadSet::replace_selection
/// [`remove_at`]: UploadSet::remove_at
pub struct UploadSet<R: PreviewRegistry = PreviewStore> {
    registry: R,
    entries: Vec<UploadedImage>,
}

impl UploadSet<PreviewStore> {
    pub fn new() -> Self {
        Self::with_registry(PreviewStore::new())
    }
}

impl Default for UploadSet<PreviewStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PreviewRegistry> UploadSet<R> {
    pub fn with_registry(registry: R) -> Self {
        Self {
            registry,
            entries: Vec::new(),
        }
    }

    /// Replaces the whole selection with the first [`MAX_FILES`] of `files`.
    ///
    /// Files beyond the cap are dropped without error. Handles of the old
    /// selection are released before new ones are allocated.
    pub fn replace_selection(&mut self, files: Vec<SourceFile>) -> &[UploadedImage] {
        if files.len() > MAX_FILES {
            warn!(
                "{} files selected, keeping the first {}",
                files.len(),
                MAX_FILES
            );
        }

        self.release_all();
        self.entries = files
            .into_iter()
            .take(MAX_FILES)
            .map(|file| {
                let preview = self.registry.create(&file);
                UploadedImage { file, preview }
            })
            .collect();
        &self.entries
    }

    /// Removes the entry at `index`, releasing its handle. Order of the rest is kept.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> &[UploadedImage] {
        assert!(
            index < self.entries.len(),
            "remove_at index {index} out of range for selection of {}",
            self.entries.len()
        );
        let removed = self.entries.remove(index);
        self.release(removed);
        &self.entries
    }

    /// Releases every held handle and empties the selection.
    ///
    /// Dropping the set does the same; calling both releases nothing twice.
    pub fn teardown(&mut self) {
        self.release_all();
    }

    pub fn selection(&self) -> &[UploadedImage] {
        &self.entries
    }

    /// The selected files in order, without their handles.
    pub fn files(&self) -> Vec<SourceFile> {
        self.entries.iter().map(|e| e.file.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    fn release(&mut self, entry: UploadedImage) {
        self.registry.revoke(entry.preview);
    }

    fn release_all(&mut self) {
        for entry in std::mem::take(&mut self.entries) {
            self.release(entry);
        }
    }
}

impl<R: PreviewRegistry> Drop for UploadSet<R> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn photo(name: &str) -> SourceFile {
        SourceFile::new(name, "image/png", name.as_bytes().to_vec()).unwrap()
    }

    fn photos(n: usize) -> Vec<SourceFile> {
        (0..n).map(|i| photo(&format!("photo-{i}.png"))).collect()
    }

    /// Registry shared with the test so it can be inspected after the set is dropped.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<PreviewStore>>);

    impl PreviewRegistry for SharedStore {
        fn create(&mut self, file: &SourceFile) -> PreviewHandle {
            self.0.borrow_mut().create(file)
        }

        fn revoke(&mut self, handle: PreviewHandle) {
            self.0.borrow_mut().revoke(handle)
        }
    }

    #[test]
    fn rejects_unsupported_mime_type() {
        let err = SourceFile::new("doc.pdf", "application/pdf", vec![1u8]).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_type_for_path(Path::new("a/b.JPG")), Some("image/jpeg"));
        assert_eq!(mime_type_for_path(Path::new("x.heic")), Some("image/heic"));
        assert_eq!(mime_type_for_path(Path::new("x.gif")), None);
        assert_eq!(mime_type_for_path(Path::new("noext")), None);
    }

    #[test]
    fn caps_selection_at_max_files() {
        let mut uploads = UploadSet::new();
        let selection = uploads.replace_selection(photos(15));
        assert_eq!(selection.len(), MAX_FILES);
        let names: Vec<_> = selection.iter().map(|e| e.file().name().to_string()).collect();
        let expected: Vec<_> = (0..MAX_FILES).map(|i| format!("photo-{i}.png")).collect();
        assert_eq!(names, expected);
        assert_eq!(uploads.registry().live_count(), MAX_FILES);
    }

    #[test]
    fn replace_releases_previous_handles() {
        let mut uploads = UploadSet::new();
        uploads.replace_selection(photos(3));
        uploads.replace_selection(photos(2));
        let store = uploads.registry();
        assert_eq!(store.live_count(), 2);
        assert_eq!(store.allocated(), 5);
        assert_eq!(store.released(), 3);
    }

    #[test]
    fn remove_at_keeps_order() {
        let mut uploads = UploadSet::new();
        uploads.replace_selection(photos(4));
        let selection = uploads.remove_at(1);
        let names: Vec<_> = selection.iter().map(|e| e.file().name()).collect();
        assert_eq!(names, ["photo-0.png", "photo-2.png", "photo-3.png"]);
        assert_eq!(uploads.registry().live_count(), 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn remove_at_out_of_range_panics() {
        let mut uploads = UploadSet::new();
        uploads.replace_selection(photos(2));
        uploads.remove_at(2);
    }

    #[test]
    fn handles_resolve_to_file_bytes() {
        let mut uploads = UploadSet::new();
        uploads.replace_selection(photos(2));
        let entry = &uploads.selection()[1];
        assert_eq!(
            uploads.registry().resolve(entry.preview()),
            Some("photo-1.png".as_bytes())
        );
        assert!(entry.preview().url().starts_with("blob:"));
    }

    #[test]
    fn live_handles_track_selection_length() {
        fn check(uploads: &UploadSet) {
            assert_eq!(uploads.registry().live_count(), uploads.len());
        }

        let mut uploads = UploadSet::new();
        uploads.replace_selection(photos(4));
        check(&uploads);
        uploads.remove_at(0);
        check(&uploads);
        uploads.replace_selection(photos(12));
        check(&uploads);
        uploads.remove_at(9);
        check(&uploads);
        uploads.replace_selection(Vec::new());
        check(&uploads);
        uploads.replace_selection(photos(1));
        check(&uploads);
    }

    #[test]
    fn teardown_and_drop_release_everything_once() {
        let shared = SharedStore::default();
        {
            let mut uploads = UploadSet::with_registry(shared.clone());
            uploads.replace_selection(photos(3));
            uploads.remove_at(0);
            uploads.replace_selection(photos(5));
            uploads.teardown();
            assert!(uploads.is_empty());
            uploads.replace_selection(photos(2));
        }
        let store = shared.0.borrow();
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.allocated(), 10);
        assert_eq!(store.released(), 10);
    }
}
