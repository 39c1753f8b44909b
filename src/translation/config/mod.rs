//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    // 语言
    pub const DEFAULT_SOURCE_LANG: &str = "auto";
    pub const DEFAULT_TARGET_LANG: &str = "ZH";

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "https://api-free.deepl.com/v2/translate";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_SPLITTING: &str = "newlines";

    // 浮动按钮
    pub const POSITION_KEY: &str = "floatingButtonPosition";
    pub const POSITION_FILE_NAME: &str = "position.json";
    pub const DRAG_THRESHOLD_PX: f64 = 5.0;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "mdtex-translator.toml",
        ".mdtex-translator.toml",
        "~/.config/mdtex-translator/config.toml",
    ];

    // 环境变量文件，按优先级排列
    pub const ENV_FILES: &[&str] = &[".env.local", ".env.development", ".env.production", ".env"];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}
