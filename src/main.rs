use anyhow::Result;
use exam_core::utils::logging;
use exam_core::{App, Config};
use std::path::Path;

/// 默认配置文件
const CONFIG_FILE: &str = "exam_core.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：命令行参数 > exam_core.toml > 环境变量与默认值
    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = if Path::new(&config_path).exists() {
        Config::from_toml_file(Path::new(&config_path))?
    } else {
        Config::from_env()
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
