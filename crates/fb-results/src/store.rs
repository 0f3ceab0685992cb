//! Run storage API.
//!
//! Each run lives in its own directory under the store root:
//! `manifest.json`, `records.jsonl` (one [`BlockRecord`] per line) and
//! `log.txt` with the run's text messages.

use crate::types::{BlockRecord, RunManifest};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if root_dir.exists() && !root_dir.is_dir() {
            return Err(ResultsError::InvalidPath {
                message: format!("{} is not a directory", root_dir.display()),
            });
        }
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[BlockRecord],
        log: &[String],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join("manifest.json"), manifest_json)?;

        let mut records_content = String::new();
        for record in records {
            records_content.push_str(&serde_json::to_string(record)?);
            records_content.push('\n');
        }
        fs::write(run_dir.join("records.jsonl"), records_content)?;

        let mut log_content = log.join("\n");
        if !log_content.is_empty() {
            log_content.push('\n');
        }
        fs::write(run_dir.join("log.txt"), log_content)?;

        tracing::debug!(run_id = %manifest.run_id, records = records.len(), "run saved");
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_records(&self, run_id: &str) -> ResultsResult<Vec<BlockRecord>> {
        let records_path = self.run_dir(run_id).join("records.jsonl");

        if !records_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(records_path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }

    pub fn load_log(&self, run_id: &str) -> ResultsResult<Vec<String>> {
        let log_path = self.run_dir(run_id).join("log.txt");
        if !log_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(log_path)?;
        Ok(content.lines().map(str::to_string).collect())
    }

    /// Manifests of every stored run, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
