use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::context::RunContext;
use crate::records::Entity;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("could not encode {entity} as JSON: {source}")]
    Json {
        entity: Entity,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode {entity} as CSV: {source}")]
    Csv {
        entity: Entity,
        #[source]
        source: csv::Error,
    },
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub enum SinkOutcome {
    Written { records: usize, files: Vec<PathBuf> },
    /// Nothing accumulated, nothing written.
    Empty,
    Failed(SinkError),
}

#[derive(Debug)]
pub struct SinkReport {
    pub entity: Entity,
    pub outcome: SinkOutcome,
}

/// Write every non-empty accumulator as `<stem>.json` and `<stem>.csv`.
/// Each entity succeeds or fails on its own.
pub fn persist_all(dir: &Path, ctx: &RunContext) -> Vec<SinkReport> {
    vec![
        persist(dir, Entity::Product, ctx.products()),
        persist(dir, Entity::Review, ctx.reviews()),
        persist(dir, Entity::Testimonial, ctx.testimonials()),
    ]
}

pub fn persist<T: Serialize>(dir: &Path, entity: Entity, records: &[T]) -> SinkReport {
    let outcome = if records.is_empty() {
        SinkOutcome::Empty
    } else {
        match write_entity(dir, entity, records) {
            Ok(files) => {
                info!("Saved {} {} to {}", records.len(), entity, dir.display());
                SinkOutcome::Written {
                    records: records.len(),
                    files,
                }
            }
            Err(e) => {
                error!("Not saving {}: {}", entity, e);
                SinkOutcome::Failed(e)
            }
        }
    };
    SinkReport { entity, outcome }
}

fn write_entity<T: Serialize>(dir: &Path, entity: Entity, records: &[T]) -> Result<Vec<PathBuf>, SinkError> {
    // Encode both formats before touching the filesystem.
    let json = encode_json(entity, records)?;
    let csv = encode_csv(entity, records)?;

    fs::create_dir_all(dir).map_err(|source| SinkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let targets = [
        (dir.join(format!("{}.json", entity.stem())), json),
        (dir.join(format!("{}.csv", entity.stem())), csv),
    ];

    let mut staged = Vec::with_capacity(targets.len());
    for (path, bytes) in &targets {
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Err(source) = fs::write(&tmp, bytes) {
            discard(&staged);
            return Err(SinkError::Io { path: tmp, source });
        }
        staged.push(tmp);
    }

    // Either every target is replaced or none of this entity's files remain.
    let mut files = Vec::with_capacity(targets.len());
    for (i, ((path, _), tmp)) in targets.iter().zip(&staged).enumerate() {
        if let Err(source) = fs::rename(tmp, path) {
            discard(&files);
            discard(&staged[i..]);
            return Err(SinkError::Io {
                path: path.clone(),
                source,
            });
        }
        files.push(path.clone());
    }
    Ok(files)
}

fn discard(paths: &[PathBuf]) {
    for p in paths {
        let _ = fs::remove_file(p);
    }
}

fn encode_json<T: Serialize>(entity: Entity, records: &[T]) -> Result<Vec<u8>, SinkError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records
        .serialize(&mut ser)
        .map_err(|source| SinkError::Json { entity, source })?;
    Ok(buf)
}

fn encode_csv<T: Serialize>(entity: Entity, records: &[T]) -> Result<Vec<u8>, SinkError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for r in records {
        wtr.serialize(r)
            .map_err(|source| SinkError::Csv { entity, source })?;
    }
    wtr.into_inner().map_err(|e| SinkError::Csv {
        entity,
        source: e.into_error().into(),
    })
}

// ── Tests ──
