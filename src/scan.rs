//! Directory scanner: one directory in, classified entries out.
//!
//! Classification is purely name-based:
//!
//! - `*.controller.<ext>` → controller definition file
//! - `*.model.<ext>`      → model definition file
//! - `*.<template ext>`   → template (extension configured per app)
//! - sub-directory        → nested route segment
//!
//! Anything else is ignored. Entries that are neither file nor directory
//! (sockets, device nodes, broken links) are logged and skipped. A missing
//! directory contributes zero entries; an unreadable one aborts the build.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FileKind {
    Controller,
    Model,
    Template,
}

#[derive(Debug)]
pub(crate) struct ScannedFile {
    pub(crate) kind: FileKind,
    pub(crate) path: PathBuf,
    /// File name with the final extension dropped: `widgets.controller`,
    /// `widget.model`, or the raw template stem (`detail.admin`).
    pub(crate) stem: String,
}

#[derive(Debug, Default)]
pub(crate) struct Scanned {
    pub(crate) files: Vec<ScannedFile>,
    pub(crate) subdirs: Vec<String>,
}

/// Enumerates one directory. Results are sorted by name so a build is
/// deterministic regardless of filesystem enumeration order.
pub(crate) fn scan(dir: &Path, template_ext: &str) -> Result<Scanned, Error> {
    let mut scanned = Scanned::default();

    let entries = std::fs::read_dir(dir).map_err(|source| Error::Scan {
        path: dir.to_owned(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::Scan { path: dir.to_owned(), source })?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        // Follows symlinks: an aliased directory is classified like the
        // directory it points at.
        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), "skipping unstatable entry: {e}");
                continue;
            }
        };

        if metadata.is_dir() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                scanned.subdirs.push(name.to_owned());
            }
            continue;
        }

        if !metadata.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }

        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            continue;
        };

        let kind = if stem == "controller" || stem.ends_with(".controller") {
            FileKind::Controller
        } else if stem == "model" || stem.ends_with(".model") {
            FileKind::Model
        } else if ext == template_ext {
            FileKind::Template
        } else {
            continue;
        };

        scanned.files.push(ScannedFile { kind, stem: stem.to_owned(), path });
    }

    Ok(scanned)
}
