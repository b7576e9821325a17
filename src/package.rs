//! Final framing of an operation's outputs: one file, or one zip archive.

use crate::error::{PixelDriftError, Result};
use crate::output::{OutputArtifact, MIME_ZIP};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Return the single artifact as-is, or bundle two or more into
/// `archive_name`.
///
/// The archive is deterministic: members appear in input order, every
/// member carries the same fixed timestamp, and names are made unique by
/// suffixing repeats with `_2`, `_3`, … before the extension.
///
/// # Errors
/// [`PixelDriftError::Validation`] for an empty input,
/// [`PixelDriftError::Archive`] if the zip writer fails.
pub fn package(artifacts: Vec<OutputArtifact>, archive_name: &str) -> Result<OutputArtifact> {
    let mut artifacts = artifacts;
    match artifacts.len() {
        0 => Err(PixelDriftError::validation("nothing to package")),
        1 => Ok(artifacts.remove(0)),
        _ => zip_artifacts(&artifacts, archive_name),
    }
}

fn zip_artifacts(artifacts: &[OutputArtifact], archive_name: &str) -> Result<OutputArtifact> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let names = unique_names(artifacts.iter().map(OutputArtifact::filename));
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, art) in names.iter().zip(artifacts) {
        zip.start_file(name.as_str(), options)
            .map_err(archive_err)?;
        zip.write_all(art.bytes()).map_err(archive_err)?;
    }
    let bytes = zip.finish().map_err(archive_err)?.into_inner();

    debug!(
        "Packaged {} artifacts into '{}' ({} bytes)",
        artifacts.len(),
        archive_name,
        bytes.len()
    );
    Ok(OutputArtifact::new(archive_name, MIME_ZIP, bytes))
}

fn archive_err(e: impl std::fmt::Display) -> PixelDriftError {
    PixelDriftError::Archive(e.to_string())
}

/// First occurrence keeps its name; the n-th occurrence becomes
/// `stem_n.ext`, skipping any name already taken.
pub fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let names: Vec<&str> = names.into_iter().collect();
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if taken.insert(name.to_string()) {
            out.push(name.to_string());
            continue;
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };
        let mut n = 2;
        loop {
            let candidate = match ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            if taken.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
            n += 1;
        }
    }
    out
}
