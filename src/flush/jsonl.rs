use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::db::DocumentStore;
use crate::db::collections;
use crate::error::GuildError;

/// One line of a collection dump.
#[derive(Serialize)]
struct DumpLine<'a> {
    id: &'a str,
    body: &'a Value,
}

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> Result<(), GuildError> {
    let mut writer = BufWriter::new(File::create(path).map_err(io_error(path))?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n").map_err(io_error(path))?;
    }
    writer.flush().map_err(io_error(path))
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> GuildError + '_ {
    move |e| GuildError::Store(format!("cannot write {}: {e}", path.display()))
}

/// Snapshot every collection into `<collection>.jsonl` files under `output_dir`,
/// one `{"id", "body"}` object per line. Creates the directory if needed.
pub async fn dump_collections<S: DocumentStore>(
    store: &S,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, GuildError> {
    fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;
    let mut written = Vec::with_capacity(collections::ALL.len());
    for &collection in collections::ALL {
        let docs = store.list(collection).await?;
        let path = output_dir.join(format!("{collection}.jsonl"));
        write_jsonl(
            &path,
            docs.iter().map(|d| DumpLine {
                id: &d.id,
                body: &d.body,
            }),
        )?;
        tracing::debug!(collection, documents = docs.len(), "collection dumped");
        written.push(path);
    }
    Ok(written)
}
