use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Where the all-time best score lives between sessions.
pub trait BestScoreStore {
    fn get_best_score(&self) -> u32;

    /// Stores `score` unless a higher value is already recorded.
    fn set_best_score(&mut self, score: u32);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryBestScoreStore {
    best: u32,
}

impl MemoryBestScoreStore {
    pub fn new(best: u32) -> Self {
        Self { best }
    }
}

impl BestScoreStore for MemoryBestScoreStore {
    fn get_best_score(&self) -> u32 {
        self.best
    }

    fn set_best_score(&mut self, score: u32) {
        self.best = self.best.max(score);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct BestScoreFile {
    version: u8,
    #[serde(rename = "bestScore")]
    best_score: u32,
    #[serde(rename = "updatedAt")]
    updated_at: String,
}

/// JSON-file backed store. Read and write failures are logged and otherwise
/// ignored; a missing or broken file reads as 0.
pub struct FileBestScoreStore {
    file_path: PathBuf,
    best: u32,
}

impl FileBestScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let best = load_best_score(&file_path);
        Self { file_path, best }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                eprintln!(
                    "[best-score-store] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        let payload = BestScoreFile {
            version: 1,
            best_score: self.best,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    eprintln!(
                        "[best-score-store] failed to write {}: {error}",
                        self.file_path.display()
                    );
                }
            }
            Err(error) => {
                eprintln!(
                    "[best-score-store] failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
            }
        }
    }
}

impl BestScoreStore for FileBestScoreStore {
    fn get_best_score(&self) -> u32 {
        self.best
    }

    fn set_best_score(&mut self, score: u32) {
        // Another process may have raised the stored value since startup.
        let stored = load_best_score(&self.file_path);
        let best = self.best.max(stored);
        if score <= best {
            self.best = best;
            return;
        }
        self.best = score;
        self.save();
    }
}

fn load_best_score(path: &Path) -> u32 {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                eprintln!(
                    "[best-score-store] failed to read {}: {error}",
                    path.display()
                );
            }
            return 0;
        }
    };
    match serde_json::from_str::<BestScoreFile>(&text) {
        Ok(value) if value.version == 1 => value.best_score,
        Ok(value) => {
            eprintln!(
                "[best-score-store] unsupported version {} at {}",
                value.version,
                path.display()
            );
            0
        }
        Err(error) => {
            eprintln!(
                "[best-score-store] failed to parse {}: {error}",
                path.display()
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "maze-chase-{name}-{}-{nanos}.json",
            std::process::id()
        ))
    }

    #[test]
    fn memory_store_never_lowers() {
        let mut store = MemoryBestScoreStore::new(500);
        store.set_best_score(300);
        assert_eq!(store.get_best_score(), 500);
        store.set_best_score(900);
        assert_eq!(store.get_best_score(), 900);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = temp_path("persist");
        {
            let mut store = FileBestScoreStore::new(path.clone());
            assert_eq!(store.get_best_score(), 0);
            store.set_best_score(1_230);
        }
        let mut store = FileBestScoreStore::new(path.clone());
        assert_eq!(store.get_best_score(), 1_230);

        store.set_best_score(10);
        let reloaded = FileBestScoreStore::new(path.clone());
        assert_eq!(reloaded.get_best_score(), 1_230);

        let text = fs::read_to_string(&path).expect("store file");
        let raw: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["bestScore"], 1_230);
        assert!(raw["updatedAt"].as_str().is_some_and(|value| value.ends_with('Z')));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_or_unknown_version_reads_as_zero() {
        let path = temp_path("broken");
        fs::write(&path, "{not json").expect("write");
        assert_eq!(FileBestScoreStore::new(path.clone()).get_best_score(), 0);

        fs::write(
            &path,
            r#"{"version": 2, "bestScore": 99, "updatedAt": "2024-01-01T00:00:00Z"}"#,
        )
        .expect("write");
        assert_eq!(FileBestScoreStore::new(path.clone()).get_best_score(), 0);

        fs::write(
            &path,
            r#"{"version": 1, "best_score": 77, "updated_at": "2024-01-01T00:00:00Z"}"#,
        )
        .expect("write");
        assert_eq!(FileBestScoreStore::new(path.clone()).get_best_score(), 0);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn concurrent_higher_value_is_not_overwritten() {
        let path = temp_path("race");
        let mut first = FileBestScoreStore::new(path.clone());
        let mut second = FileBestScoreStore::new(path.clone());
        first.set_best_score(800);
        second.set_best_score(500);
        assert_eq!(second.get_best_score(), 800);
        assert_eq!(FileBestScoreStore::new(path.clone()).get_best_score(), 800);
        let _ = fs::remove_file(path);
    }
}
