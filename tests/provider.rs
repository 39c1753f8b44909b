//! 上游服务集成测试
//!
//! 在本地端口上起一个只应答一次的 HTTP 服务，检查 DeepL 请求格式和各类应答的映射

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use mdtex_translator::translation::core::{
    DeepLProvider, LangPair, LocalBus, SelectionTranslator, TranslationProvider,
};
use mdtex_translator::translation::{TranslationConfig, TranslationError};

/// 收到的一次请求
struct Captured {
    head: String,
    body: Value,
}

/// 接受一个连接，读完请求后返回固定应答
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        captured
    });

    (format!("http://{}/v2/translate", addr), handle)
}

async fn read_request(socket: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let (head_end, length) = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            break (end, length);
        }
    };

    while buf.len() < head_end + 4 + length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }

    Captured {
        head: String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase(),
        body: serde_json::from_slice(&buf[head_end + 4..head_end + 4 + length]).unwrap(),
    }
}

fn provider(endpoint: &str) -> DeepLProvider {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    DeepLProvider::with_client(client, endpoint, "test-key")
}

#[tokio::test]
async fn test_successful_translation() {
    let body = json!({
        "translations": [{"detected_source_language": "EN", "text": "你好 {{BLOCK_0}}"}]
    });
    let (endpoint, server) = serve_once("200 OK", body.to_string()).await;

    let translation = provider(&endpoint)
        .translate("Hello {{BLOCK_0}}", &LangPair::auto("ZH"))
        .await
        .unwrap();
    assert_eq!(translation.text, "你好 {{BLOCK_0}}");
    assert_eq!(translation.detected_source_language.as_deref(), Some("EN"));

    let captured = server.await.unwrap();
    assert!(captured.head.starts_with("post /v2/translate "));
    assert!(captured.head.contains("authorization: deepl-auth-key test-key"));
    assert_eq!(
        captured.body,
        json!({"text": ["Hello {{BLOCK_0}}"], "source_lang": null, "target_lang": "ZH"})
    );
}

#[tokio::test]
async fn test_explicit_source_language() {
    let body = json!({"translations": [{"text": "Hallo"}]});
    let (endpoint, server) = serve_once("200 OK", body.to_string()).await;

    let translation = provider(&endpoint)
        .translate("Hello", &LangPair::new("EN", "DE"))
        .await
        .unwrap();
    assert_eq!(translation.text, "Hallo");
    assert_eq!(translation.detected_source_language, None);

    let captured = server.await.unwrap();
    assert_eq!(captured.body["source_lang"], json!("EN"));
}

#[tokio::test]
async fn test_error_status_is_a_service_error() {
    let (endpoint, server) =
        serve_once("456 Quota Exceeded", r#"{"message":"Quota exceeded"}"#.to_string()).await;

    let err = provider(&endpoint)
        .translate("Hello", &LangPair::auto("ZH"))
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        TranslationError::TranslationService(message) => assert!(message.contains("Quota exceeded")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_translations_is_malformed() {
    let (endpoint, server) = serve_once("200 OK", r#"{"translations":[]}"#.to_string()).await;

    let err = provider(&endpoint)
        .translate("Hello", &LangPair::auto("ZH"))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, TranslationError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(&format!("http://{}/v2/translate", addr))
        .translate("Hello", &LangPair::auto("ZH"))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_selection_translator_over_deepl() {
    let body = json!({
        "translations": [{"detected_source_language": "EN", "text": "设{{BLOCK_0}}为给定值。"}]
    });
    let (endpoint, server) = serve_once("200 OK", body.to_string()).await;

    let config = TranslationConfig {
        api_url: endpoint.clone(),
        api_key: Some("test-key".to_string()),
        ..TranslationConfig::default()
    };
    let translator = SelectionTranslator::from_config(LocalBus::new(provider(&endpoint)), &config);

    let outcome = translator.translate_text("Let $x_1$ be given.").await.unwrap();
    assert_eq!(outcome.text, r"设 $x\_{1}$ 为给定值。");
    assert_eq!(outcome.detected_source_lang.as_deref(), Some("EN"));

    let captured = server.await.unwrap();
    assert_eq!(captured.body["text"], json!(["Let {{BLOCK_0}} be given."]));
}

#[test]
fn test_from_config_needs_a_key() {
    let mut config = TranslationConfig::default();
    assert!(matches!(
        DeepLProvider::from_config(&config),
        Err(TranslationError::Config(_))
    ));

    config.api_key = Some("  ".to_string());
    assert!(DeepLProvider::from_config(&config).is_err());

    config.api_key = Some("abc".to_string());
    let provider = DeepLProvider::from_config(&config).unwrap();
    assert_eq!(provider.endpoint(), "https://api-free.deepl.com/v2/translate");
}
