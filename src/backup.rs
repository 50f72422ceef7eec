use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::model::AcademicYear;
use crate::tree::AcademicTree;

const MANIFEST_ENTRY: &str = "manifest.json";
const TREE_ENTRY: &str = "tree.json";
pub const BUNDLE_FORMAT_V1: &str = "validetu-tree-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub year_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportedTree {
    pub bundle_format: String,
    pub tree: AcademicTree,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn export_tree_bundle(tree: &AcademicTree, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let payload =
        serde_json::to_vec_pretty(&tree.years()).context("failed to serialize tree")?;
    let checksum = sha256_hex(&payload);
    let counts = tree.counts();

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "sha256": checksum,
        "counts": {
            "years": counts.years,
            "semesters": counts.semesters,
            "ues": counts.ues,
            "subjects": counts.subjects,
        },
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(TREE_ENTRY, opts)
        .context("failed to start tree entry")?;
    zip.write_all(&payload).context("failed to write tree entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        year_count: counts.years,
        sha256: checksum,
    })
}

/// Read and verify a bundle, rebuilding its years as a tree owned by `user_id`. Nothing
/// is applied here; the caller decides what to do with the tree.
pub fn import_tree_bundle(in_path: &Path, user_id: &str) -> anyhow::Result<ImportedTree> {
    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "not a tree bundle: {}",
            in_path.to_string_lossy()
        ));
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut payload = Vec::new();
    archive
        .by_name(TREE_ENTRY)
        .context("bundle missing tree.json")?
        .read_to_end(&mut payload)
        .context("failed to read tree.json")?;

    let expected = manifest
        .get("sha256")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let actual = sha256_hex(&payload);
    if !expected.eq_ignore_ascii_case(&actual) {
        return Err(anyhow!(
            "tree.json checksum mismatch (manifest {}, actual {})",
            expected,
            actual
        ));
    }

    let years: Vec<AcademicYear> =
        serde_json::from_slice(&payload).context("tree.json is not a valid tree")?;
    let tree = AcademicTree::from_years(user_id, years).context("tree.json is inconsistent")?;

    Ok(ImportedTree {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        tree,
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
