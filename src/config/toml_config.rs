use crate::core::ConfigProvider;
use crate::utils::error::{AegisError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_models_dir")]
    pub dir: String,
    pub risk_model: Option<String>,
    pub activity_model: Option<String>,
    pub keyword_model: Option<String>,
    pub label_encoder: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_models_dir() -> String {
    "models".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            risk_model: None,
            activity_model: None,
            keyword_model: None,
            label_encoder: None,
        }
    }
}

impl ServerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AegisError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AegisError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MODELS_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AegisError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn model_file(&self, file: &Option<String>, default_name: &str) -> PathBuf {
        Path::new(&self.models.dir).join(file.as_deref().unwrap_or(default_name))
    }
}

impl ConfigProvider for ServerConfig {
    fn host(&self) -> &str {
        &self.server.host
    }

    fn port(&self) -> u16 {
        self.server.port
    }

    fn debug(&self) -> bool {
        self.server.debug
    }

    fn risk_model_path(&self) -> PathBuf {
        self.model_file(&self.models.risk_model, "risk_model.onnx")
    }

    fn activity_model_path(&self) -> PathBuf {
        self.model_file(&self.models.activity_model, "activity_classifier.onnx")
    }

    fn keyword_model_path(&self) -> PathBuf {
        self.model_file(&self.models.keyword_model, "keyword_model.onnx")
    }

    fn label_encoder_path(&self) -> PathBuf {
        self.model_file(&self.models.label_encoder, "label_encoder.json")
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_host("server.host", &self.server.host)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;
        validate_path("models.dir", &self.models.dir)?;

        let files = [
            ("models.risk_model", &self.models.risk_model),
            ("models.activity_model", &self.models.activity_model),
            ("models.keyword_model", &self.models.keyword_model),
            ("models.label_encoder", &self.models.label_encoder),
        ];
        for (field, file) in files {
            if let Some(file) = file {
                validate_non_empty_string(field, file)?;
                validate_path(field, file)?;
            }
        }

        tracing::debug!("Server configuration validation passed");
        Ok(())
    }
}
