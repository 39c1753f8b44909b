//! 命令行入口
//!
//! 把一段选区 HTML 或文本走完整的提取、保护、翻译、还原、修复流程，
//! 输出修复后的 Markdown，或者渲染好的结果视图。

use std::path::PathBuf;
use std::process;

use clap::Parser;

use mdtex_translator::core::{
    extract_input, print_error_message, print_info_message, read_input, render_result_view,
    write_output,
};
use mdtex_translator::env::{self, EnvConfig, EnvVar};
use mdtex_translator::translation::{self, ConfigManager, TranslationConfig, TranslationResult};

#[derive(Parser, Debug)]
#[command(
    name = "mdtex-translator",
    version,
    about = "Translate selected Markdown/LaTeX content while keeping formulas intact"
)]
struct Cli {
    /// HTML fragment or text file to translate, `-` for stdin
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Charset of the input (detected from BOM or <meta> when omitted)
    #[arg(short, long, value_name = "CHARSET")]
    encoding: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target language code, e.g. ZH or EN-US
    #[arg(short = 't', long, value_name = "LANG")]
    target_lang: Option<String>,

    /// Source language code or `auto`
    #[arg(short = 's', long, value_name = "LANG")]
    source_lang: Option<String>,

    /// Translation endpoint
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Request deadline in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Only print the extracted text, do not translate
    #[arg(long)]
    extract_only: bool,

    /// Output the rendered result view instead of Markdown
    #[arg(short, long)]
    render: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "FILE")]
    init_config: Option<PathBuf>,

    /// Print documentation for environment variables and exit
    #[arg(long)]
    env_docs: bool,

    /// Print the configuration read from environment variables and exit
    #[arg(long)]
    show_env: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.env_docs {
        print!("{}", env::generate_env_docs());
        return;
    }

    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::debug!("{}", e.detail());
        print_error_message(&format!("Error: {}", e.user_message()));
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        env::core::LogLevel::get()
            .ok()
            .and_then(|level| level.parse().ok())
            .unwrap_or(tracing::Level::WARN)
    };
    let no_color = env::core::NoColor::get().unwrap_or(false);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> TranslationResult<()> {
    if let Some(path) = &cli.init_config {
        ConfigManager::generate_example_config(path)?;
        print_info_message(&format!("示例配置已写入 {}", path.display()));
        return Ok(());
    }

    if cli.show_env {
        match EnvConfig::from_env().and_then(|config| config.validate().map(|_| config)) {
            Ok(config) => config.print_summary(),
            Err(e) => print_error_message(&e.to_string()),
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    translation::init();

    let input = read_input(cli.input.as_deref(), cli.encoding.as_deref())?;
    let text = extract_input(&input, &config.extractor)?;

    if cli.extract_only {
        return write_output(cli.output.as_deref(), &text);
    }

    let outcome = translation::translate_text(&text, &config).await?;
    if let Some(lang) = &outcome.detected_source_lang {
        tracing::info!("检测到源语言: {}", lang);
    }

    let output = if cli.render {
        render_result_view(&outcome.text)
    } else {
        outcome.text
    };
    write_output(cli.output.as_deref(), &output)
}

/// 文件与环境变量之上再叠加命令行参数
fn load_config(cli: &Cli) -> TranslationResult<TranslationConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from_path(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.into_config();

    if let Some(lang) = &cli.target_lang {
        config.target_lang = lang.to_uppercase();
    }
    if let Some(lang) = &cli.source_lang {
        config.source_lang = lang.clone();
    }
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}
