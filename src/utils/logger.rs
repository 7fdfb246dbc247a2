use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日誌輸出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 終端機用的單行格式
    Compact,
    /// 每個事件一行 JSON，附帶所屬的 HTTP request span
    Json,
}

/// `RUST_LOG` 未設定時的預設過濾規則。
/// verbose 時連同 tower_http 的 request/response 事件一起輸出。
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "aegis_inference=debug,tower_http=debug,info"
    } else {
        "aegis_inference=info,tower_http=info,warn"
    }
}

pub fn init_server_logger(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(verbose)
                    .with_line_number(verbose)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            )
            .init(),
    }
}
