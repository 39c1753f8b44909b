//! 键值存储
//!
//! 浮动按钮的位置以 JSON 形式保存在一个键下。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 键值存储
pub trait KeyValueStore {
    fn get(&self, key: &str) -> TranslationResult<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> TranslationResult<()>;
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> TranslationResult<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| TranslationError::Storage("存储锁已损坏".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> TranslationResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| TranslationError::Storage("存储锁已损坏".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// 单个 JSON 对象文件，每次写入整体覆盖
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 平台数据目录下的默认位置
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mdtex-translator")
            .map(|dirs| dirs.data_dir().join(constants::POSITION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> TranslationResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(TranslationError::Storage(format!(
                "存储文件不是 JSON 对象: {}",
                self.path.display()
            ))),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> TranslationResult<Option<Value>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> TranslationResult<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(entries))?)?;
        tracing::debug!("已写入 {} -> {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));

        assert_eq!(store.get("floatingButtonPosition").unwrap(), None);

        store.set("theme", json!("dark")).unwrap();
        store.set("floatingButtonPosition", json!({"x": 10.0, "y": 20.0})).unwrap();

        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.get("theme").unwrap(), Some(json!("dark")));
        assert_eq!(
            reopened.get("floatingButtonPosition").unwrap(),
            Some(json!({"x": 10.0, "y": 20.0}))
        );
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = JsonFileStore::new(&path).get("x").unwrap_err();
        assert!(matches!(err, TranslationError::Storage(_)));
    }
}
