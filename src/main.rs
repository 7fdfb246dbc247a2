use aegis_inference::utils::logger::{self, LogFormat};
use aegis_inference::utils::validation::Validate;
use aegis_inference::{server, CliArgs, InferenceService};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let verbose = args.verbose;
    let json_logs = args.json_logs;

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let format = if json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_server_logger(verbose || config.server.debug, format);

    tracing::info!("Starting aegis-inference server");
    tracing::debug!("Server config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    // 模型只在啟動時載入一次
    let service = match InferenceService::load(&config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("❌ Failed to load models: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    };

    server::serve(&config, service).await?;
    Ok(())
}
