use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize into {path}: {source}")]
    Serialize {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Flush {
        path: String,
        source: std::io::Error,
    },
}

/// Truncates `path` and writes `value` as JSON indented by `indent` spaces.
///
/// A failure after creation leaves whatever was already written in place.
pub fn write_snapshot<T: Serialize>(
    value: &T,
    path: impl AsRef<Path>,
    indent: usize,
) -> Result<(), WriteError> {
    let path_ref = path.as_ref();
    let path_display = path_ref.display().to_string();
    let file = File::create(path_ref).map_err(|source| WriteError::Create {
        path: path_display.clone(),
        source,
    })?;

    let pad = vec![b' '; indent];
    let mut out = BufWriter::new(file);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&pad));
    value
        .serialize(&mut ser)
        .map_err(|source| WriteError::Serialize {
            path: path_display.clone(),
            source,
        })?;

    out.write_all(b"\n")
        .and_then(|()| out.flush())
        .map_err(|source| WriteError::Flush {
            path: path_display,
            source,
        })
}
