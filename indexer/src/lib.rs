//! Loading documents from JSON and JSONL files.

use async_trait::async_trait;
use search_core::{Document, DocumentSource, FetchError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file or directory of `.json` / `.jsonl` documents.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn load(&self) -> Result<Vec<Document>, FetchError> {
        let mut docs = Vec::new();
        for file in collect_files(&self.path)? {
            if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                read_jsonl(&file, &mut docs)?;
            } else {
                read_json(&file, &mut docs)?;
            }
        }
        tracing::info!(documents = docs.len(), path = %self.path.display(), "loaded corpus from disk");
        Ok(docs)
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn fetch(&self) -> Result<Vec<Document>, FetchError> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
    }
}

fn collect_files(path: &Path) -> Result<Vec<PathBuf>, FetchError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(FetchError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")))
        .collect();
    files.sort();
    Ok(files)
}

fn read_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<(), FetchError> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = serde_json::from_str(&line)
            .map_err(|e| FetchError::Malformed(format!("{}:{}: {e}", file.display(), lineno + 1)))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<Document>) -> Result<(), FetchError> {
    let reader = BufReader::new(File::open(file)?);
    let malformed = |e: serde_json::Error| FetchError::Malformed(format!("{}: {e}", file.display()));
    let json: serde_json::Value = serde_json::from_reader(reader).map_err(malformed)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v).map_err(malformed)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json).map_err(malformed)?),
        _ => return Err(FetchError::Malformed(format!("{}: expected an object or array", file.display()))),
    }
    Ok(())
}
