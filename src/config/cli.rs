use super::toml_config::ServerConfig;
use crate::utils::error::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "aegis-inference")]
#[command(about = "HTTP inference server for the risk, activity and keyword models")]
pub struct CliArgs {
    #[arg(long, short = 'c', help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long, help = "Directory containing the model artifacts")]
    pub models_dir: Option<String>,

    #[arg(long, help = "Enable debug mode")]
    pub debug: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliArgs {
    /// 先讀取 TOML (若有指定)，再以命令列參數覆寫
    pub fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.models_dir {
            config.models.dir = dir;
        }
        if self.debug {
            config.server.debug = true;
        }

        Ok(config)
    }
}
