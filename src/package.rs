// src/package.rs

//! Package extraction collaborator
//!
//! Thin by design: the pipeline treats a package as an opaque source of
//! metadata plus a file tree. RPM headers come from the `rpm` crate; the
//! compressed cpio payload is unpacked with a small newc reader, filtered by
//! glob patterns so only UI-facing assets land in the work area.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use glob::Pattern;
use rpm::Package;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File patterns worth extracting: desktop entries, AppData, icons, fonts,
/// input method descriptors and codec libraries.
pub const INTERESTING_PATHS: &[&str] = &[
    "./usr/share/applications/*.desktop",
    "./usr/share/applications/kde4/*.desktop",
    "./usr/share/appdata/*.xml",
    "./usr/share/icons/hicolor/*/apps/*",
    "./usr/share/pixmaps/*.*",
    "./usr/share/icons/*.*",
    "./usr/share/fonts/*/*",
    "./usr/share/ibus/component/*.xml",
    "./usr/share/ibus-table/tables/*.db",
    "./usr/lib64/gstreamer-1.0/libgst*.so",
    "./usr/lib/gstreamer-1.0/libgst*.so",
];

/// Header metadata of one binary package
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub licence: Option<String>,
    pub homepage_url: Option<String>,
    /// Name of the originating source package, if recorded
    pub source_name: Option<String>,
}

impl PackageInfo {
    /// Read header metadata without touching the payload
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::BadPackage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut reader = BufReader::new(file);
        let pkg = Package::parse(&mut reader).map_err(|e| Error::BadPackage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_package(path, &pkg)?)
    }

    fn from_package(path: &Path, pkg: &Package) -> Result<Self> {
        let name = pkg
            .metadata
            .get_name()
            .map_err(|e| Error::BadPackage {
                path: path.to_path_buf(),
                reason: format!("no package name: {e}"),
            })?
            .to_string();
        let version = pkg
            .metadata
            .get_version()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let licence = pkg.metadata.get_license().ok().map(|s| s.to_string());
        let homepage_url = pkg.metadata.get_url().ok().map(|s| s.to_string());
        let source_name = pkg
            .metadata
            .get_source_rpm()
            .ok()
            .map(|s| source_package_name(s));
        Ok(Self {
            name,
            version,
            licence,
            homepage_url,
            source_name,
        })
    }

    /// Does the package payload list any path matching `patterns`?
    pub fn contains_interesting_files(path: &Path, patterns: &[&str]) -> Result<bool> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let pkg = Package::parse(&mut reader).map_err(|e| Error::BadPackage {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let compiled = compile_patterns(patterns);
        if let Ok(entries) = pkg.metadata.get_file_entries() {
            for entry in entries {
                let name = format!(".{}", entry.path.to_string_lossy());
                if matches_any(&compiled, &name) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Strip `-version-release.src.rpm` from a source rpm filename
fn source_package_name(source_rpm: &str) -> String {
    let stem = source_rpm
        .trim_end_matches(".rpm")
        .trim_end_matches(".src");
    match stem.rmatch_indices('-').nth(1) {
        Some((idx, _)) => stem[..idx].to_string(),
        None => stem.to_string(),
    }
}

/// Unpack payload files matching `patterns` into `dest`
///
/// Returns the tree-relative paths written. Directory entries and anything
/// outside the patterns are skipped; entry names are normalized so nothing
/// can escape the destination.
pub fn extract(path: &Path, dest: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let pkg = Package::parse(&mut reader).map_err(|e| Error::BadPackage {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let payload = &pkg.content;
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    let decoder = payload_decoder(payload)?;
    let compiled = compile_patterns(patterns);

    let mut cpio = CpioReader::new(decoder);
    let mut written: Vec<PathBuf> = Vec::new();
    while let Some((entry, content)) = cpio.next_entry().map_err(|e| Error::Cpio(e.to_string()))? {
        // regular files only
        if entry.mode & 0o170000 != 0o100000 {
            continue;
        }
        let name = normalize_entry_name(&entry.name);
        if !matches_any(&compiled, &name) {
            continue;
        }
        let relative = PathBuf::from(name.trim_start_matches("./"));
        let out_path = dest.join(&relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, content)?;
        written.push(relative);
    }
    debug!(package = %path.display(), files = written.len(), "extracted payload");
    Ok(written)
}

fn compile_patterns(patterns: &[&str]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect()
}

fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|p| p.matches(name))
}

/// cpio entry names come as `./usr/...`, `usr/...` or `/usr/...`
fn normalize_entry_name(name: &str) -> String {
    let trimmed = name.trim_start_matches("./").trim_start_matches('/');
    format!("./{}", trimmed)
}

/// Pick a decompressor from the payload's magic bytes
///
/// RPM payloads in the wild are gzip, xz or zstd compressed cpio.
fn payload_decoder<'a>(payload: &'a [u8]) -> Result<Box<dyn Read + 'a>> {
    if payload.len() >= 2 && payload[0] == 0x1f && payload[1] == 0x8b {
        Ok(Box::new(GzDecoder::new(payload)))
    } else if payload.len() >= 6 && payload[..6] == [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00] {
        Ok(Box::new(xz2::read::XzDecoder::new(payload)))
    } else if payload.len() >= 4 && payload[..4] == [0x28, 0xb5, 0x2f, 0xfd] {
        let decoder = zstd::Decoder::new(payload).map_err(|e| Error::Decompression(e.to_string()))?;
        Ok(Box::new(decoder))
    } else {
        // uncompressed cpio
        Ok(Box::new(payload as &[u8]))
    }
}

/// cpio New ASCII (newc) header size
const HEADER_SIZE: usize = 110;
const MAGIC_NEWC: &[u8] = b"070701";
const MAGIC_CRC: &[u8] = b"070702";

struct CpioEntry {
    name: String,
    mode: u32,
}

/// A reader for cpio New ASCII archives
struct CpioReader<R: Read> {
    reader: R,
}

impl<R: Read> CpioReader<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the next entry; `Ok(None)` at the `TRAILER!!!` sentinel
    fn next_entry(&mut self) -> io::Result<Option<(CpioEntry, Vec<u8>)>> {
        let mut header = [0u8; HEADER_SIZE];
        if let Err(e) = self.reader.read_exact(&mut header) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Ok(None);
            }
            return Err(e);
        }

        let magic = &header[0..6];
        if magic != MAGIC_NEWC && magic != MAGIC_CRC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid cpio magic: {:?}", String::from_utf8_lossy(magic)),
            ));
        }

        let parse_hex = |start: usize| -> io::Result<u32> {
            let s = std::str::from_utf8(&header[start..start + 8])
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            u32::from_str_radix(s, 16).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        };

        let mode = parse_hex(14)?;
        let filesize = parse_hex(54)? as usize;
        let namesize = parse_hex(94)? as usize;

        let mut name_buf = vec![0u8; namesize];
        self.reader.read_exact(&mut name_buf)?;
        if name_buf.last() == Some(&0) {
            name_buf.pop();
        }
        let name = String::from_utf8_lossy(&name_buf).to_string();
        if name == "TRAILER!!!" {
            return Ok(None);
        }

        // header+name padded to 4 bytes, content padded to 4 bytes
        self.skip_padding((HEADER_SIZE + namesize) % 4)?;
        let mut content = vec![0u8; filesize];
        self.reader.read_exact(&mut content)?;
        self.skip_padding(filesize % 4)?;

        Ok(Some((CpioEntry { name, mode }, content)))
    }

    fn skip_padding(&mut self, remainder: usize) -> io::Result<()> {
        let pad = (4 - remainder) % 4;
        if pad > 0 {
            let mut skip = [0u8; 3];
            self.reader.read_exact(&mut skip[..pad])?;
        }
        Ok(())
    }
}

/// Best-effort recursive removal of a work area
pub fn remove_work_area(dir: &Path) {
    if dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            tracing::warn!(path = %dir.display(), "failed to remove work area: {e}");
        }
    }
}
