/*
 * Copyright (C) 2025 The Phosh Developers
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 *
 * Author: Arun Mani J <arun.mani@tether.to>
 */

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use ashpd::url::Url;
use gtk::gio;
use gtk::gio::prelude::*;
use gtk::glib;

use crate::{Config, FileSelectorError};

/*
 * `PathResolver` maps content references to absolute filesystem paths. References that encode a
 * path, or that a document provider can map onto storage, resolve in place. Anything else is
 * materialized: its bytes are copied into the session's cache folder.
 */

const LOG_DOMAIN: &str = "xdpp-fs-resolver";

const EXTERNAL_STORAGE_DOCUMENTS: &str = "com.android.externalstorage.documents";
const DOWNLOADS_DOCUMENTS: &str = "com.android.providers.downloads.documents";
const MEDIA_DOCUMENTS: &str = "com.android.providers.media.documents";

const DOWNLOADS_CONTENT_PREFIXES: [&str; 2] = [
    "content://downloads/public_downloads",
    "content://downloads/my_downloads",
];

/// Access to the content behind a reference, as offered by the platform's content resolver.
pub trait ContentProvider {
    /// The name the provider reports for the content.
    fn display_name(&self, reference: &Url) -> Option<String>;
    fn open(&self, reference: &Url) -> io::Result<Box<dyn Read>>;
    /// A stable on-device path the provider knows for the content, if any.
    fn local_path(&self, reference: &Url) -> Option<PathBuf>;
}

/// Content provider backed by GIO, which understands every URI scheme GVfs can mount.
#[derive(Clone, Copy, Debug, Default)]
pub struct GioContentProvider;

impl ContentProvider for GioContentProvider {
    fn display_name(&self, reference: &Url) -> Option<String> {
        let file = gio::File::for_uri(reference.as_str());
        match file.query_info(
            "standard::display-name",
            gio::FileQueryInfoFlags::NONE,
            gio::Cancellable::NONE,
        ) {
            Ok(info) => Some(info.display_name().to_string()),
            Err(error) => {
                glib::g_debug!(LOG_DOMAIN, "No display name for {reference}: {error}");
                None
            }
        }
    }

    fn open(&self, reference: &Url) -> io::Result<Box<dyn Read>> {
        let file = gio::File::for_uri(reference.as_str());
        let stream = file
            .read(gio::Cancellable::NONE)
            .map_err(|error| io::Error::other(error.to_string()))?;
        Ok(Box::new(stream.into_read()))
    }

    fn local_path(&self, reference: &Url) -> Option<PathBuf> {
        gio::File::for_uri(reference.as_str()).path()
    }
}

/// A reference together with the path it resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub local_path: PathBuf,
    pub source_reference: Url,
}

pub struct PathResolver<C> {
    config: Config,
    provider: C,
}

impl<C: ContentProvider> PathResolver<C> {
    pub fn new(config: Config, provider: C) -> Self {
        Self { config, provider }
    }

    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.config.cache_dir()
    }

    /// Resolves `reference` to a readable path, copying its content into the cache when no
    /// direct path exists.
    pub fn resolve(&self, reference: &Url) -> Option<ResolvedSelection> {
        let local_path = match self.direct_path(reference) {
            Some(path) => path,
            None => match self.materialize(reference) {
                Ok(path) => path,
                Err(error) => {
                    glib::g_warning!(
                        LOG_DOMAIN,
                        "There was an error adding {reference} to the cache: {error}"
                    );
                    return None;
                }
            },
        };

        Some(ResolvedSelection {
            local_path,
            source_reference: reference.clone(),
        })
    }

    /// Resolves `reference` without materializing it. Used for directories and for save
    /// targets, which have no content to copy.
    pub fn resolve_location(&self, reference: &Url) -> Option<ResolvedSelection> {
        let Some(local_path) = self.direct_path(reference) else {
            glib::g_warning!(LOG_DOMAIN, "No local path for {reference}");
            return None;
        };

        Some(ResolvedSelection {
            local_path,
            source_reference: reference.clone(),
        })
    }

    /// Resolves every reference in order. References that fail are logged and left out.
    pub fn resolve_many(&self, references: &[Url]) -> Vec<ResolvedSelection> {
        references
            .iter()
            .filter_map(|reference| {
                let resolved = self.resolve(reference);
                if resolved.is_none() {
                    glib::g_warning!(LOG_DOMAIN, "Skipping unresolved reference {reference}");
                }
                resolved
            })
            .collect()
    }

    /// Deletes every entry of the cache folder. A missing folder is not an error.
    pub fn clear_cache(&self) {
        let cache_dir = self.cache_dir();
        let entries = match fs::read_dir(&cache_dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return,
            Err(error) => {
                glib::g_warning!(
                    LOG_DOMAIN,
                    "Unable to list cache {}: {error}",
                    cache_dir.display()
                );
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(error) = result {
                glib::g_warning!(LOG_DOMAIN, "Unable to remove {}: {error}", path.display());
            }
        }

        glib::g_debug!(LOG_DOMAIN, "Cleared cache {}", cache_dir.display());
    }

    fn direct_path(&self, reference: &Url) -> Option<PathBuf> {
        if reference.scheme() == "file" {
            return reference.to_file_path().ok();
        }

        if reference.scheme() == "content" {
            if let Some(path) = self.document_provider_path(reference) {
                return Some(path);
            }
        }

        self.provider.local_path(reference)
    }

    fn document_provider_path(&self, reference: &Url) -> Option<PathBuf> {
        let authority = reference.host_str()?;
        let document_id = document_id(reference)?;

        match authority {
            EXTERNAL_STORAGE_DOCUMENTS => self.external_storage_path(&document_id),
            DOWNLOADS_DOCUMENTS => self.downloads_path(reference, &document_id),
            MEDIA_DOCUMENTS => self.media_path(&document_id),
            _ => None,
        }
    }

    fn external_storage_path(&self, document_id: &str) -> Option<PathBuf> {
        let (volume, relative) = document_id.split_once(':')?;
        let relative = relative.trim_start_matches('/');

        if volume.eq_ignore_ascii_case("primary") {
            let path = self.config.external_storage.join(relative);
            if path.exists() {
                return Some(path);
            }
        }

        self.config
            .secondary_storage
            .iter()
            .map(|root| root.join(relative))
            .find(|path| path.exists())
    }

    fn downloads_path(&self, reference: &Url, document_id: &str) -> Option<PathBuf> {
        if let Some(raw) = document_id.strip_prefix("raw:") {
            return Some(PathBuf::from(raw));
        }

        if let Ok(row) = document_id.parse::<u64>() {
            let path = DOWNLOADS_CONTENT_PREFIXES
                .iter()
                .filter_map(|prefix| Url::parse(&format!("{prefix}/{row}")).ok())
                .find_map(|url| self.provider.local_path(&url));
            if path.is_some() {
                return path;
            }
        }

        let name = self.provider.display_name(reference)?;
        let path = self
            .config
            .external_storage
            .join("Download")
            .join(file_name(&name)?);
        path.exists().then_some(path)
    }

    fn media_path(&self, document_id: &str) -> Option<PathBuf> {
        let (media_type, row) = document_id.split_once(':')?;
        let collection = match media_type {
            "image" => "images",
            "video" => "video",
            "audio" => "audio",
            _ => return None,
        };
        let url = Url::parse(&format!("content://media/external/{collection}/media/{row}")).ok()?;
        self.provider.local_path(&url)
    }

    /// Copies the content of `reference` into the cache under its display name.
    fn materialize(&self, reference: &Url) -> Result<PathBuf, FileSelectorError> {
        let unresolved = || FileSelectorError::UnresolvedReference(reference.to_string());
        let name = self.provider.display_name(reference).ok_or_else(unresolved)?;
        let name = file_name(&name).ok_or_else(unresolved)?;

        let mut input = self.provider.open(reference)?;
        let cache_dir = self.cache_dir();
        fs::create_dir_all(&cache_dir)?;

        let output = cache_dir.join(name);
        let mut file = fs::File::create(&output)?;
        match io::copy(&mut input, &mut file) {
            Ok(bytes) => {
                glib::g_debug!(
                    LOG_DOMAIN,
                    "Copied {bytes} bytes of {reference} to {}",
                    output.display()
                );
                Ok(output)
            }
            Err(error) => {
                drop(file);
                if let Err(error) = fs::remove_file(&output) {
                    glib::g_warning!(
                        LOG_DOMAIN,
                        "Unable to remove partial copy {}: {error}",
                        output.display()
                    );
                }
                Err(error.into())
            }
        }
    }
}

/// The percent-decoded document id carried by the last path segment of a provider URI.
fn document_id(reference: &Url) -> Option<String> {
    let segment = reference.path_segments()?.last()?;
    let decoded = glib::Uri::unescape_string(segment, None::<&str>)?;
    (!decoded.is_empty()).then(|| decoded.to_string())
}

/// Reduces a provider reported name to a single path component.
fn file_name(name: &str) -> Option<&str> {
    let name = name.rsplit('/').next()?.trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Clone, Debug, Default)]
    pub(crate) struct Entry {
        pub name: Option<String>,
        pub bytes: Option<Vec<u8>>,
        pub local_path: Option<PathBuf>,
    }

    /// In-memory provider answering from a table of entries.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct FakeProvider {
        pub entries: HashMap<String, Entry>,
    }

    impl FakeProvider {
        pub fn with_content(mut self, uri: &str, name: &str, bytes: &[u8]) -> Self {
            self.entries.insert(
                String::from(uri),
                Entry {
                    name: Some(String::from(name)),
                    bytes: Some(bytes.to_vec()),
                    local_path: None,
                },
            );
            self
        }

        pub fn with_entry(mut self, uri: &str, entry: Entry) -> Self {
            self.entries.insert(String::from(uri), entry);
            self
        }
    }

    impl ContentProvider for FakeProvider {
        fn display_name(&self, reference: &Url) -> Option<String> {
            self.entries.get(reference.as_str())?.name.clone()
        }

        fn open(&self, reference: &Url) -> io::Result<Box<dyn Read>> {
            match self
                .entries
                .get(reference.as_str())
                .and_then(|entry| entry.bytes.clone())
            {
                Some(bytes) => Ok(Box::new(io::Cursor::new(bytes))),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "no content")),
            }
        }

        fn local_path(&self, reference: &Url) -> Option<PathBuf> {
            self.entries.get(reference.as_str())?.local_path.clone()
        }
    }

    /// A reader failing after the first chunk.
    struct BrokenReader {
        sent: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("connection reset"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"part");
            Ok(4)
        }
    }

    struct BrokenProvider;

    impl ContentProvider for BrokenProvider {
        fn display_name(&self, _reference: &Url) -> Option<String> {
            Some(String::from("broken.bin"))
        }

        fn open(&self, _reference: &Url) -> io::Result<Box<dyn Read>> {
            Ok(Box::new(BrokenReader { sent: false }))
        }

        fn local_path(&self, _reference: &Url) -> Option<PathBuf> {
            None
        }
    }

    fn url(uri: &str) -> Url {
        Url::parse(uri).unwrap()
    }

    fn resolver(dir: &TempDir, provider: FakeProvider) -> PathResolver<FakeProvider> {
        let mut config = Config::with_data_dir(dir.path().join("data"));
        config.external_storage = dir.path().join("storage");
        PathResolver::new(config, provider)
    }

    #[test]
    fn test_file_reference_is_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, FakeProvider::default());

        let resolved = resolver.resolve(&url("file:///home/user/notes.txt")).unwrap();
        assert_eq!(resolved.local_path, PathBuf::from("/home/user/notes.txt"));
        assert_eq!(resolved.source_reference.as_str(), "file:///home/user/notes.txt");
        assert!(!resolver.cache_dir().exists());
    }

    #[test]
    fn test_materialize_copies_content_into_cache() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default().with_content(
            "content://some.provider/doc/7",
            "photo.png",
            b"png bytes",
        );
        let resolver = resolver(&dir, provider);

        let resolved = resolver.resolve(&url("content://some.provider/doc/7")).unwrap();
        assert_eq!(resolved.local_path, resolver.cache_dir().join("photo.png"));
        assert_eq!(fs::read(&resolved.local_path).unwrap(), b"png bytes");
    }

    #[test]
    fn test_materialize_overwrites_same_name() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default()
            .with_content("content://a/1", "same.txt", b"first")
            .with_content("content://b/2", "same.txt", b"second");
        let resolver = resolver(&dir, provider);

        resolver.resolve(&url("content://a/1")).unwrap();
        let resolved = resolver.resolve(&url("content://b/2")).unwrap();
        assert_eq!(fs::read(resolved.local_path).unwrap(), b"second");
    }

    #[test]
    fn test_failed_open_keeps_earlier_cached_file() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default()
            .with_content("content://a/1", "same.txt", b"first")
            .with_entry(
                "content://b/2",
                Entry {
                    name: Some(String::from("same.txt")),
                    ..Entry::default()
                },
            );
        let resolver = resolver(&dir, provider);

        let first = resolver.resolve(&url("content://a/1")).unwrap();
        assert!(resolver.resolve(&url("content://b/2")).is_none());
        assert_eq!(fs::read(first.local_path).unwrap(), b"first");
    }

    #[test]
    fn test_materialize_errors() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default()
            .with_entry("content://p/nameless", Entry::default())
            .with_entry(
                "content://p/empty",
                Entry {
                    name: Some(String::from("empty.txt")),
                    ..Entry::default()
                },
            );
        let resolver = resolver(&dir, provider);

        match resolver.materialize(&url("content://p/nameless")) {
            Err(FileSelectorError::UnresolvedReference(reference)) => {
                assert_eq!(reference, "content://p/nameless");
            }
            other => panic!("Unexpected result {other:?}"),
        }
        assert!(matches!(
            resolver.materialize(&url("content://p/empty")),
            Err(FileSelectorError::Io(_))
        ));
    }

    #[test]
    fn test_missing_display_name_is_unresolved() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default().with_entry(
            "content://some.provider/doc/8",
            Entry {
                name: None,
                bytes: Some(b"data".to_vec()),
                local_path: None,
            },
        );
        let resolver = resolver(&dir, provider);

        assert!(resolver.resolve(&url("content://some.provider/doc/8")).is_none());
    }

    #[test]
    fn test_display_name_cannot_escape_cache() {
        let dir = TempDir::new().unwrap();
        let provider =
            FakeProvider::default().with_content("content://p/1", "../../evil.sh", b"x");
        let resolver = resolver(&dir, provider);

        let resolved = resolver.resolve(&url("content://p/1")).unwrap();
        assert_eq!(resolved.local_path, resolver.cache_dir().join("evil.sh"));
        assert!(resolver.resolve(&url("content://p/unknown")).is_none());
    }

    #[test]
    fn test_failed_copy_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(dir.path());
        let resolver = PathResolver::new(config, BrokenProvider);

        assert!(resolver.resolve(&url("content://p/broken")).is_none());
        assert!(!resolver.cache_dir().join("broken.bin").exists());
    }

    #[test]
    fn test_resolve_many_skips_failures_in_order() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default()
            .with_content("content://p/1", "one.txt", b"1")
            .with_content("content://p/3", "three.txt", b"3");
        let resolver = resolver(&dir, provider);

        let references = [
            url("content://p/1"),
            url("content://p/2"),
            url("file:///tmp/direct.txt"),
            url("content://p/3"),
        ];
        let paths: Vec<PathBuf> = resolver
            .resolve_many(&references)
            .into_iter()
            .map(|resolved| resolved.local_path)
            .collect();

        let cache_dir = resolver.cache_dir();
        assert_eq!(
            paths,
            vec![
                cache_dir.join("one.txt"),
                PathBuf::from("/tmp/direct.txt"),
                cache_dir.join("three.txt"),
            ]
        );
    }

    #[test]
    fn test_clear_cache() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default().with_content("content://p/1", "one.txt", b"1");
        let resolver = resolver(&dir, provider);

        resolver.clear_cache();

        let resolved = resolver.resolve(&url("content://p/1")).unwrap();
        fs::create_dir_all(resolver.cache_dir().join("nested")).unwrap();
        resolver.clear_cache();

        assert!(!resolved.local_path.exists());
        assert_eq!(fs::read_dir(resolver.cache_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_external_storage_document() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, FakeProvider::default());
        let document = dir.path().join("storage/Download/report.pdf");
        fs::create_dir_all(document.parent().unwrap()).unwrap();
        fs::write(&document, b"pdf").unwrap();

        let reference = url(
            "content://com.android.externalstorage.documents/document/primary%3ADownload%2Freport.pdf",
        );
        let resolved = resolver.resolve(&reference).unwrap();
        assert_eq!(resolved.local_path, document);
        assert!(!resolver.cache_dir().exists());
    }

    #[test]
    fn test_external_storage_secondary_root() {
        let dir = TempDir::new().unwrap();
        let sd_card = dir.path().join("sdcard");
        let document = sd_card.join("Music/song.ogg");
        fs::create_dir_all(document.parent().unwrap()).unwrap();
        fs::write(&document, b"ogg").unwrap();

        let mut config = Config::with_data_dir(dir.path().join("data"));
        config.external_storage = dir.path().join("storage");
        config.secondary_storage = vec![sd_card];
        let resolver = PathResolver::new(config, FakeProvider::default());

        let reference = url(
            "content://com.android.externalstorage.documents/document/1234-5678%3AMusic%2Fsong.ogg",
        );
        assert_eq!(
            resolver.resolve_location(&reference).unwrap().local_path,
            document
        );
    }

    #[test]
    fn test_downloads_raw_document() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, FakeProvider::default());

        let reference = url(
            "content://com.android.providers.downloads.documents/document/raw%3A%2Fdata%2Ffile.zip",
        );
        assert_eq!(
            resolver.resolve_location(&reference).unwrap().local_path,
            PathBuf::from("/data/file.zip")
        );
    }

    #[test]
    fn test_downloads_numeric_row() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default().with_entry(
            "content://downloads/my_downloads/42",
            Entry {
                local_path: Some(PathBuf::from("/storage/Download/archive.tar")),
                ..Entry::default()
            },
        );
        let resolver = resolver(&dir, provider);

        let reference = url("content://com.android.providers.downloads.documents/document/42");
        assert_eq!(
            resolver.resolve(&reference).unwrap().local_path,
            PathBuf::from("/storage/Download/archive.tar")
        );
    }

    #[test]
    fn test_media_document() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default().with_entry(
            "content://media/external/images/media/17",
            Entry {
                local_path: Some(PathBuf::from("/storage/DCIM/IMG_17.jpg")),
                ..Entry::default()
            },
        );
        let resolver = resolver(&dir, provider);

        let reference = url("content://com.android.providers.media.documents/document/image%3A17");
        assert_eq!(
            resolver.resolve(&reference).unwrap().local_path,
            PathBuf::from("/storage/DCIM/IMG_17.jpg")
        );
    }

    #[test]
    fn test_provider_local_path_skips_copy() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default().with_entry(
            "sftp://host/srv/data.csv",
            Entry {
                name: Some(String::from("data.csv")),
                bytes: Some(b"a,b".to_vec()),
                local_path: Some(PathBuf::from(
                    "/run/user/1000/gvfs/sftp:host=host/srv/data.csv",
                )),
            },
        );
        let resolver = resolver(&dir, provider);

        let resolved = resolver.resolve(&url("sftp://host/srv/data.csv")).unwrap();
        assert_eq!(
            resolved.local_path,
            PathBuf::from("/run/user/1000/gvfs/sftp:host=host/srv/data.csv")
        );
        assert!(!resolver.cache_dir().exists());
    }

    #[test]
    fn test_resolve_location_never_copies() {
        let dir = TempDir::new().unwrap();
        let provider = FakeProvider::default().with_content("content://p/1", "one.txt", b"1");
        let resolver = resolver(&dir, provider);

        assert!(resolver.resolve_location(&url("content://p/1")).is_none());
        assert!(!resolver.cache_dir().exists());
    }

    #[test]
    fn test_gio_provider_reads_local_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        fs::write(&source, b"hello").unwrap();
        let reference = Url::from_file_path(&source).unwrap();

        let provider = GioContentProvider;
        assert_eq!(provider.display_name(&reference).as_deref(), Some("source.txt"));
        assert_eq!(provider.local_path(&reference), Some(source));

        let mut content = String::new();
        provider
            .open(&reference)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");
    }
}
