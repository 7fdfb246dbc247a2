use crate::utils::error::{AegisError, Result};
use serde::Deserialize;
use std::path::Path;

/// 分類器輸出索引與活動名稱的對應表
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    Bare(Vec<String>),
    Wrapped { classes: Vec<String> },
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(AegisError::ConfigError {
                message: "label encoder has no classes".to_string(),
            });
        }
        Ok(Self { classes })
    }

    /// 從 JSON 檔案載入 (字串陣列或 {"classes": [...]})
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AegisError::IoError)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let classes = match serde_json::from_str::<LabelFile>(content)? {
            LabelFile::Bare(classes) => classes,
            LabelFile::Wrapped { classes } => classes,
        };
        Self::new(classes)
    }

    pub fn inverse_transform(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                AegisError::inference(format!(
                    "y contains previously unseen label: {} (encoder has {} classes)",
                    index,
                    self.classes.len()
                ))
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
