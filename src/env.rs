//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。每个变量一个类型，
//! 名称、默认值和说明都挂在类型上，文档由 [`generate_env_docs`] 生成。

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 变量是否出现在环境中
    fn is_set() -> bool {
        env::var_os(Self::NAME).is_some()
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "MDTEX_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid log level '{}'. Use: trace, debug, info, warn, error", value),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何非空值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "MDTEX_TARGET_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("ZH".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Target language code, e.g. ZH, EN-US";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang_code(value, Self::NAME)
        }
    }

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "MDTEX_SOURCE_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("auto".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Source language code ('auto' for detection)";

        fn parse(value: &str) -> EnvResult<String> {
            if value.trim().eq_ignore_ascii_case("auto") {
                Ok("auto".to_string())
            } else {
                parse_lang_code(value, Self::NAME)
            }
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "MDTEX_API_URL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("https://api-free.deepl.com/v2/translate".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Translation provider endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// API 密钥
    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "MDTEX_API_KEY";
        const DEFAULT: Option<String> = None; // 无默认值，必须设置
        const DESCRIPTION: &'static str = "DeepL authentication key";

        fn parse(value: &str) -> EnvResult<String> {
            let key = value.trim();
            if key.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API key cannot be empty".to_string(),
                });
            }
            Ok(key.to_string())
        }
    }

    /// 请求超时
    pub struct TimeoutSecs;
    impl EnvVar<Duration> for TimeoutSecs {
        const NAME: &'static str = "MDTEX_TIMEOUT_SECS";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Client-side translation deadline in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds = parse_positive_usize(value, Self::NAME, 1, 300)?;
            Ok(Duration::from_secs(seconds as u64))
        }
    }

    /// 分句策略
    pub struct Splitting;
    impl EnvVar<String> for Splitting {
        const NAME: &'static str = "MDTEX_SPLITTING";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("newlines".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Provider splitting policy: newlines, punctuation, none";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                policy @ ("newlines" | "punctuation" | "none") => Ok(policy.to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid splitting policy '{}'. Use: newlines, punctuation, none", value),
                }),
            }
        }
    }
}

/// 译文修复相关环境变量
pub mod repair {
    use super::*;

    /// 行内公式下划线转义
    pub struct EscapeFormulaUnderscores;
    impl EnvVar<bool> for EscapeFormulaUnderscores {
        const NAME: &'static str = "MDTEX_ESCAPE_FORMULA_UNDERSCORES";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Escape underscores inside inline formulas";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 中英文间距
    pub struct CjkLatinSpacing;
    impl EnvVar<bool> for CjkLatinSpacing {
        const NAME: &'static str = "MDTEX_CJK_LATIN_SPACING";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Insert a space between CJK and Latin characters";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 界面相关环境变量
pub mod presentation {
    use super::*;

    /// 浮动按钮位置文件
    pub struct PositionFile;
    impl EnvVar<PathBuf> for PositionFile {
        const NAME: &'static str = "MDTEX_POSITION_FILE";
        const DEFAULT: Option<PathBuf> = None; // 默认由 directories 决定
        const DESCRIPTION: &'static str = "JSON file persisting the floating button position";

        fn parse(value: &str) -> EnvResult<PathBuf> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(PathBuf::from(shellexpand::tilde(path).as_ref()))
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 语言代码：两位字母，可带地区后缀（`EN-US`、`PT-BR`），统一为大写
fn parse_lang_code(value: &str, var_name: &str) -> EnvResult<String> {
    let code = value.trim().to_uppercase();
    let (lang, region) = match code.split_once('-') {
        Some((lang, region)) => (lang, Some(region)),
        None => (code.as_str(), None),
    };

    let valid = lang.len() == 2
        && lang.chars().all(|c| c.is_ascii_alphabetic())
        && region.map_or(true, |r| (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphabetic()));

    if valid {
        Ok(code)
    } else {
        Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Invalid language code '{}'. Use e.g. ZH, EN, EN-US", value),
        })
    }
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    // 核心配置
    pub log_level: String,
    pub no_color: bool,

    // 翻译配置
    pub target_lang: String,
    pub source_lang: String,
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub splitting: String,

    // 修复配置
    pub escape_formula_underscores: bool,
    pub cjk_latin_spacing: bool,

    // 界面配置
    pub position_file: Option<PathBuf>,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,
            no_color: core::NoColor::get()?,

            target_lang: translation::TargetLang::get()?,
            source_lang: translation::SourceLang::get()?,
            api_url: translation::ApiUrl::get()?,
            api_key: translation::ApiKey::get().ok(),
            timeout: translation::TimeoutSecs::get()?,
            splitting: translation::Splitting::get()?,

            escape_formula_underscores: repair::EscapeFormulaUnderscores::get()?,
            cjk_latin_spacing: repair::CjkLatinSpacing::get()?,

            position_file: presentation::PositionFile::get().ok(),
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        if self.source_lang.eq_ignore_ascii_case(&self.target_lang) {
            return Err(EnvError {
                variable: translation::TargetLang::NAME.to_string(),
                message: "Target language equals source language".to_string(),
            });
        }
        Ok(())
    }

    /// 打印配置摘要（隐藏敏感信息）
    pub fn print_summary(&self) {
        println!("Environment Configuration Summary:");
        println!("  Log Level: {}", self.log_level);
        println!("  Languages: {} -> {}", self.source_lang, self.target_lang);
        println!("  Endpoint: {}", self.api_url);
        println!("  Timeout: {}s", self.timeout.as_secs());
        println!("  Splitting: {}", self.splitting);
        println!(
            "  API Key: {}",
            if self.api_key.is_some() { "[configured]" } else { "[missing]" }
        );
        if let Some(path) = &self.position_file {
            println!("  Position File: {}", path.display());
        }
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    fn entry(name: &str, description: &str, default: &str) -> String {
        format!("- `{}`: {} (default: {})\n", name, description, default)
    }

    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&entry(core::LogLevel::NAME, core::LogLevel::DESCRIPTION, "info"));
    docs.push_str(&entry(core::NoColor::NAME, core::NoColor::DESCRIPTION, "unset"));

    docs.push_str("\n## Translation Configuration\n\n");
    docs.push_str(&entry(translation::TargetLang::NAME, translation::TargetLang::DESCRIPTION, "ZH"));
    docs.push_str(&entry(translation::SourceLang::NAME, translation::SourceLang::DESCRIPTION, "auto"));
    docs.push_str(&entry(
        translation::ApiUrl::NAME,
        translation::ApiUrl::DESCRIPTION,
        "https://api-free.deepl.com/v2/translate",
    ));
    docs.push_str(&entry(translation::ApiKey::NAME, translation::ApiKey::DESCRIPTION, "required"));
    docs.push_str(&entry(translation::TimeoutSecs::NAME, translation::TimeoutSecs::DESCRIPTION, "30"));
    docs.push_str(&entry(translation::Splitting::NAME, translation::Splitting::DESCRIPTION, "newlines"));

    docs.push_str("\n## Repair Configuration\n\n");
    docs.push_str(&entry(
        repair::EscapeFormulaUnderscores::NAME,
        repair::EscapeFormulaUnderscores::DESCRIPTION,
        "true",
    ));
    docs.push_str(&entry(repair::CjkLatinSpacing::NAME, repair::CjkLatinSpacing::DESCRIPTION, "true"));

    docs.push_str("\n## Presentation Configuration\n\n");
    docs.push_str(&entry(
        presentation::PositionFile::NAME,
        presentation::PositionFile::DESCRIPTION,
        "platform data directory",
    ));

    docs
}
