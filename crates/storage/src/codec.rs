//! Persistence codec
//!
//! Blob format: `PDA1:` followed by standard base64 of raw-deflated JSON
//! `{"annotations": {"<page>": [stroke, ...]}}`. Strokes are simplified and
//! rounded before encoding; undo history is never persisted.
//!
//! Decoding is tolerant. A blob without a known prefix is read as plain JSON
//! (the pre-compression format), strokes that fail validation are dropped
//! individually, and anything else unreadable decodes as absent.

use crate::error::CodecError;
use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use pdf_drawer_core::{has_strokes, simplify, PageAnnotations, Stroke, DEFAULT_SIMPLIFY_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

/// Current blob format version
pub const FORMAT_VERSION: u32 = 1;

const PREFIX_TAG: &str = "PDA";

/// Encoding parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CodecConfig {
    /// Simplification tolerance in page units
    pub tolerance: f32,

    /// Fractional digits kept on every coordinate
    pub decimals: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            decimals: 1,
        }
    }
}

impl CodecConfig {
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }
}

#[derive(Serialize)]
struct BlobOut<'a> {
    annotations: &'a BTreeMap<u32, Vec<Stroke>>,
}

/// Lenient mirror of the blob, so one bad page or stroke cannot sink the rest
#[derive(Deserialize)]
struct BlobIn {
    #[serde(default)]
    annotations: BTreeMap<String, serde_json::Value>,
}

/// Simplified, rounded copy of a stroke as it is written to storage
pub fn compact_stroke(stroke: &Stroke, config: &CodecConfig) -> Result<Stroke, CodecError> {
    let points = simplify(stroke.points(), config.tolerance)
        .into_iter()
        .map(|p| p.rounded(config.decimals))
        .collect();
    Ok(stroke.with_points(points)?)
}

/// Serialize annotations to the JSON text inside a blob
pub fn to_json(annotations: &PageAnnotations, config: &CodecConfig) -> Result<String, CodecError> {
    let mut compact = BTreeMap::new();
    for (&page, strokes) in annotations {
        let strokes = strokes
            .iter()
            .map(|stroke| compact_stroke(stroke, config))
            .collect::<Result<Vec<_>, _>>()?;
        compact.insert(page, strokes);
    }
    Ok(serde_json::to_string(&BlobOut {
        annotations: &compact,
    })?)
}

/// Encode annotations into a storage blob
pub fn encode(annotations: &PageAnnotations, config: &CodecConfig) -> Result<String, CodecError> {
    let json = to_json(annotations, config)?;

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(json.as_bytes())?;
    let compressed = encoder.finish()?;

    Ok(format!(
        "{PREFIX_TAG}{FORMAT_VERSION}:{}",
        STANDARD.encode(compressed)
    ))
}

/// Split a `PDA<n>:` prefix off a blob
fn split_prefix(blob: &str) -> Option<(u32, &str)> {
    let rest = blob.strip_prefix(PREFIX_TAG)?;
    let (version, payload) = rest.split_once(':')?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((version.parse().ok()?, payload))
}

/// Recover the JSON text of a blob, undoing compression when present
pub fn decompress(blob: &str) -> Result<String, CodecError> {
    match split_prefix(blob) {
        Some((FORMAT_VERSION, payload)) => {
            let compressed = STANDARD.decode(payload.trim())?;
            let mut json = String::new();
            DeflateDecoder::new(compressed.as_slice()).read_to_string(&mut json)?;
            Ok(json)
        }
        Some((version, _)) => Err(CodecError::UnsupportedVersion(version)),
        None => Ok(blob.to_string()),
    }
}

/// Parse blob JSON, dropping pages and strokes that do not validate
pub fn from_json(json: &str) -> Result<PageAnnotations, CodecError> {
    let raw: BlobIn = serde_json::from_str(json)?;
    let mut annotations = PageAnnotations::new();

    for (key, value) in raw.annotations {
        let page = match key.trim().parse::<u32>() {
            Ok(page) if page > 0 => page,
            _ => {
                tracing::warn!(page = %key, "dropping annotations for invalid page number");
                continue;
            }
        };
        let serde_json::Value::Array(values) = value else {
            tracing::warn!(page, "dropping page with invalid stroke list");
            continue;
        };

        let mut strokes = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let stroke = serde_json::from_value::<Stroke>(value)
                .map_err(CodecError::from)
                .and_then(|s| s.validate().map(|()| s).map_err(CodecError::from));
            match stroke {
                Ok(stroke) => strokes.push(Arc::new(stroke)),
                Err(error) => {
                    tracing::warn!(page, index, %error, "dropping invalid stroke");
                }
            }
        }
        annotations.insert(page, strokes);
    }
    Ok(annotations)
}

/// Decode a blob, reporting why it could not be read
pub fn try_decode(blob: &str) -> Result<PageAnnotations, CodecError> {
    match decompress(blob) {
        Ok(json) => from_json(&json),
        Err(CodecError::UnsupportedVersion(version)) => {
            Err(CodecError::UnsupportedVersion(version))
        }
        // Not a readable compressed payload; try the legacy plain form
        Err(_) => from_json(blob),
    }
}

/// Decode a blob; corrupt or incompatible blobs decode as absent
pub fn decode(blob: &str) -> Option<PageAnnotations> {
    match try_decode(blob) {
        Ok(annotations) => Some(annotations),
        Err(error) => {
            tracing::warn!(%error, len = blob.len(), "saved annotations are unreadable");
            None
        }
    }
}

/// Whether a blob holds at least one non-empty page
pub fn has_saved_data(blob: &str) -> bool {
    decode(blob).is_some_and(|annotations| has_strokes(&annotations))
}
