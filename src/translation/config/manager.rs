//! 简化的配置管理器
//!
//! 加载顺序：`.env` 文件，首个存在的配置文件（TOML 或 JSON），环境变量覆盖，最后校验。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::core::messages::LangPair;
use crate::translation::error::{helpers, TranslationResult};
use crate::translation::pipeline::{ExtractorConfig, RepairOptions};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub source_lang: String,
    pub target_lang: String,
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    // 请求配置
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splitting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_alternatives: Option<u32>,

    // 界面配置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_file: Option<PathBuf>,

    // 流水线配置
    pub repair: RepairOptions,
    pub extractor: ExtractorConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,

            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
            splitting: Some(constants::DEFAULT_SPLITTING.to_string()),
            request_alternatives: None,

            position_file: None,

            repair: RepairOptions::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_lang: &str, api_url: Option<&str>) -> Self {
        let mut config = Self {
            target_lang: target_lang.to_string(),
            ..Self::default()
        };
        if let Some(url) = api_url {
            config.api_url = url.to_string();
        }
        config
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.target_lang.trim().is_empty() {
            return Err(helpers::config_error("目标语言不能为空"));
        }

        if self.timeout_secs == 0 {
            return Err(helpers::config_error("超时时间不能为0"));
        }

        let url = url::Url::parse(&self.api_url)
            .map_err(|e| helpers::config_error(format!("API 地址无效 '{}': {}", self.api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(helpers::config_error(format!(
                "API 地址必须使用 http 或 https: {}",
                self.api_url
            )));
        }

        if self.extractor.conventions.is_empty() {
            tracing::warn!("未启用任何公式渲染约定，渲染后的公式将按普通文本提取");
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{presentation, repair, translation, EnvVar};

        if translation::TargetLang::is_set() {
            match translation::TargetLang::get() {
                Ok(lang) => self.target_lang = lang,
                Err(e) => tracing::warn!("忽略环境变量: {}", e),
            }
        }

        if translation::SourceLang::is_set() {
            match translation::SourceLang::get() {
                Ok(lang) => self.source_lang = lang,
                Err(e) => tracing::warn!("忽略环境变量: {}", e),
            }
        }

        if translation::ApiUrl::is_set() {
            match translation::ApiUrl::get() {
                Ok(api_url) => {
                    self.api_url = api_url;
                    tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
                }
                Err(e) => tracing::warn!("忽略环境变量: {}", e),
            }
        }

        if let Ok(api_key) = translation::ApiKey::get() {
            self.api_key = Some(api_key);
        }

        if translation::TimeoutSecs::is_set() {
            match translation::TimeoutSecs::get() {
                Ok(timeout) => self.timeout_secs = timeout.as_secs(),
                Err(e) => tracing::warn!("忽略环境变量: {}", e),
            }
        }

        if translation::Splitting::is_set() {
            match translation::Splitting::get() {
                Ok(policy) if policy == "none" => self.splitting = None,
                Ok(policy) => self.splitting = Some(policy),
                Err(e) => tracing::warn!("忽略环境变量: {}", e),
            }
        }

        if repair::EscapeFormulaUnderscores::is_set() {
            if let Ok(enabled) = repair::EscapeFormulaUnderscores::get() {
                self.repair.escape_formula_underscores = enabled;
            }
        }

        if repair::CjkLatinSpacing::is_set() {
            if let Ok(enabled) = repair::CjkLatinSpacing::get() {
                self.repair.cjk_latin_spacing = enabled;
            }
        }

        if let Ok(path) = presentation::PositionFile::get() {
            self.position_file = Some(path);
        }
    }

    /// 客户端截止时间
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn lang_pair(&self) -> LangPair {
        LangPair::new(self.source_lang.clone(), self.target_lang.clone())
    }
}

/// 简化的配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TranslationConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 按默认搜索路径加载配置
    pub fn new() -> TranslationResult<Self> {
        Self::load(None)
    }

    /// 从指定文件加载配置
    pub fn load_from_path(path: impl AsRef<Path>) -> TranslationResult<Self> {
        Self::load(Some(path.as_ref()))
    }

    fn load(explicit: Option<&Path>) -> TranslationResult<Self> {
        Self::load_dotenv();

        let source = match explicit {
            Some(path) => Some(PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())),
            None => Self::find_config_file(),
        };

        let mut config = match &source {
            Some(path) => {
                tracing::info!("加载配置文件: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                tracing::info!("未找到配置文件，使用默认配置");
                TranslationConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config, source })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 实际读取的配置文件
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn find_config_file() -> Option<PathBuf> {
        constants::CONFIG_PATHS
            .iter()
            .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
            .find(|path| path.exists())
    }

    /// 从指定文件加载配置，按扩展名选择 TOML 或 JSON
    pub fn load_from_file(path: &Path) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| helpers::config_error(format!("读取配置文件失败 {}: {}", path.display(), e)))?;

        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            serde_json::from_str(&content)
                .map_err(|e| helpers::config_error(format!("解析JSON配置失败: {}", e)))
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: impl AsRef<Path>) -> TranslationResult<()> {
        let content = Self::example_config()?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| helpers::config_error(format!("写入配置文件失败: {}", e)))?;
        Ok(())
    }

    /// 示例配置文本
    pub fn example_config() -> TranslationResult<String> {
        toml::to_string_pretty(&TranslationConfig::default())
            .map_err(|e| helpers::config_error(format!("序列化配置失败: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::math::MathConvention;
    use crate::translation::error::TranslationError;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.lang_pair(), LangPair::auto("ZH"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = TranslationConfig::default_with_lang("", None);
        assert!(matches!(config.validate(), Err(TranslationError::Config(_))));

        config.target_lang = "EN".into();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.timeout_secs = 5;
        config.api_url = "ftp://example.com/translate".into();
        assert!(config.validate().is_err());

        config.api_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "target_lang = \"EN-US\"\ntimeout_secs = 10\n\n[repair]\ncjk_latin_spacing = false\n\n[extractor]\nconventions = [\"katex\"]"
        )
        .unwrap();

        let config = ConfigManager::load_from_file(file.path()).unwrap();
        assert_eq!(config.target_lang, "EN-US");
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.repair.cjk_latin_spacing);
        assert!(config.repair.escape_formula_underscores);
        assert_eq!(config.extractor.conventions, vec![MathConvention::KaTeX]);
        assert_eq!(config.source_lang, "auto");
    }

    #[test]
    fn test_json_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"target_lang": "DE", "splitting": null}}"#).unwrap();

        let config = ConfigManager::load_from_file(file.path()).unwrap();
        assert_eq!(config.target_lang, "DE");
        assert_eq!(config.splitting, None);
    }

    #[test]
    fn test_example_config_round_trips() {
        let example = ConfigManager::example_config().unwrap();
        let parsed: TranslationConfig = toml::from_str(&example).unwrap();
        assert_eq!(parsed, TranslationConfig::default());
    }
}
