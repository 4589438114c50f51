// src/process/extract.rs
use std::io::{Cursor, Read};

use tracing::{error, info, instrument};
use zip::{result::ZipError, ZipArchive};

use crate::error::{Error, Result};
use crate::fetch::ArchiveBlob;

/// Decompressed bytes of one archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMember(Vec<u8>);

impl ExtractedMember {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for ExtractedMember {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Pull `member` out of an in-memory ZIP.
///
/// Entries are walked in archive order and the first one whose name is
/// byte-for-byte equal to `member` wins. No case folding, no path cleanup.
#[instrument(level = "info", skip(archive), fields(archive_bytes = archive.len()))]
pub fn extract_member(archive: &ArchiveBlob, member: &str) -> Result<ExtractedMember> {
    match find_member(archive.as_bytes(), member) {
        Ok(data) => {
            info!(member, bytes = data.0.len(), "File successfully unzipped");
            Ok(data)
        }
        Err(e) => {
            error!(member, error = %e, "Error extracting file");
            Err(e)
        }
    }
}

/// Declared sizes come from a remote file; never reserve more than this up front.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

fn prealloc_hint(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |n| n.min(MAX_PREALLOC))
}

fn find_member(bytes: &[u8], member: &str) -> Result<ExtractedMember> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    // names come from the central directory; only the match is opened
    let found = (0..archive.len()).find(|&i| archive.name_for_index(i) == Some(member));
    if let Some(i) = found {
        let mut entry = archive.by_index(i)?;
        let mut buf = Vec::with_capacity(prealloc_hint(entry.size()));
        entry
            .read_to_end(&mut buf)
            .map_err(|e| Error::ArchiveFormat(ZipError::Io(e)))?;
        return Ok(ExtractedMember(buf));
    }

    Err(Error::MemberNotFound(member.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};
    use zip::unstable::write::FileOptionsExt;

    fn zip_of(entries: &[(&str, &str)], method: CompressionMethod) -> ArchiveBlob {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(method);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        ArchiveBlob::from(zip.finish().unwrap().into_inner())
    }

    #[test]
    fn test_extract_stored_member() {
        let archive = zip_of(
            &[("filename.txt", "navigare necesse est")],
            CompressionMethod::Stored,
        );

        let member = extract_member(&archive, "filename.txt").unwrap();

        assert_eq!(member.as_bytes(), b"navigare necesse est");
    }

    #[test]
    fn test_extract_deflated_member_among_others() {
        let csv = "Date,USD\n2023-11-20,3.1415\n";
        let archive = zip_of(
            &[("readme.txt", "ignore me"), ("eurofxref-hist.csv", csv)],
            CompressionMethod::Deflated,
        );

        let member = extract_member(&archive, "eurofxref-hist.csv").unwrap();

        assert_eq!(member.into_inner(), csv.as_bytes().to_vec());
    }

    #[test]
    fn test_extract_is_exact_match() {
        let archive = zip_of(&[("data.csv", "a,b\n")], CompressionMethod::Stored);

        for wanted in ["Data.csv", "data.csv ", "data", "./data.csv", "*.csv"] {
            match extract_member(&archive, wanted) {
                Err(Error::MemberNotFound(name)) => assert_eq!(name, wanted),
                other => panic!("{wanted:?}: expected MemberNotFound, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_extract_finds_nested_path_verbatim() {
        let archive = zip_of(
            &[("data.csv", "top"), ("nested/data.csv", "nested")],
            CompressionMethod::Stored,
        );

        let member = extract_member(&archive, "nested/data.csv").unwrap();

        assert_eq!(member.as_bytes(), b"nested");
    }

    #[test]
    fn test_extract_empty_archive() {
        let archive = zip_of(&[], CompressionMethod::Stored);

        let err = extract_member(&archive, "filename.txt").unwrap_err();

        assert!(matches!(err, Error::MemberNotFound(_)));
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let archive = ArchiveBlob::from(b"<html>not found</html>".to_vec());

        let err = extract_member(&archive, "filename.txt").unwrap_err();

        assert!(matches!(err, Error::ArchiveFormat(_)));
    }

    #[test]
    fn test_unreadable_sibling_is_not_opened() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let locked = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .with_deprecated_encryption(b"hunter2");
        zip.start_file("secret.txt", locked).unwrap();
        zip.write_all(b"classified").unwrap();
        zip.start_file("data.csv", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"Date,USD\n2023-11-20,3.1415\n").unwrap();
        let archive = ArchiveBlob::from(zip.finish().unwrap().into_inner());

        let member = extract_member(&archive, "data.csv").unwrap();
        assert_eq!(member.as_bytes(), b"Date,USD\n2023-11-20,3.1415\n");

        let err = extract_member(&archive, "secret.txt").unwrap_err();
        assert!(matches!(err, Error::ArchiveFormat(_)));
    }

    #[test]
    fn test_prealloc_hint_is_capped() {
        assert_eq!(prealloc_hint(20), 20);
        assert_eq!(prealloc_hint(u64::MAX), MAX_PREALLOC);
        assert_eq!(prealloc_hint(MAX_PREALLOC as u64 + 1), MAX_PREALLOC);
    }

    #[test]
    fn test_bogus_declared_size_does_not_panic() {
        let archive = zip_of(&[("data.csv", "a,b\n")], CompressionMethod::Stored);
        let mut bytes = archive.as_bytes().to_vec();
        // uncompressed size lives 24 bytes into the central directory header
        let cd = bytes.windows(4).position(|w| w == b"PK\x01\x02").unwrap();
        bytes[cd + 24..cd + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        let archive = ArchiveBlob::from(bytes);

        let result = extract_member(&archive, "data.csv");

        assert!(matches!(result, Ok(_) | Err(Error::ArchiveFormat(_))));
    }
}
