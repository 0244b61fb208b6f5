//! # Access Gate 主程序
//!
//! - `serve`：运行访问码校验端点
//! - `digest`：计算访问码摘要，用于写入配置
//! - `verify`：以给定凭据文件对端点执行一次授权检查

use std::path::PathBuf;
use std::sync::Arc;

use access_gate::{
    Result,
    access::DigestAlgorithm,
    client::{
        AuthCheck, CheckOutcome, CredentialStore, HistoryNavigator, HttpConfigVerifier,
        Navigator, Trigger, sync_danger_config,
    },
    config::ConfigManager,
    endpoint::ConfigServer,
    lerror, linfo, lwarn,
    logging::{self, LogComponent, LogStage},
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "access-gate", version, about = "访问码校验端点与授权检查工具")]
struct Cli {
    /// 日志级别（被 RUST_LOG 覆盖）
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 运行校验端点
    Serve {
        /// 配置文件路径；缺省时读取 ACCESS_GATE_CONFIG_PATH 或 config/config.{RUST_ENV}.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// 输出访问码摘要
    Digest {
        code: String,
        #[arg(long, default_value = "md5")]
        algorithm: String,
    },
    /// 对端点执行一次授权检查
    Verify {
        /// 端点完整地址，例如 http://127.0.0.1:3000/api/config
        #[arg(long)]
        endpoint: String,
        /// 客户端凭据 JSON 文件
        #[arg(long)]
        state: PathBuf,
        /// 检查前写入的访问码
        #[arg(long)]
        code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_optimized_logging(cli.log_level.as_ref());

    if let Err(e) = run(cli.command).await {
        lerror!(
            "system",
            LogStage::Shutdown,
            LogComponent::Main,
            "command_failed",
            format!("{e}")
        );
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Serve { config } => serve(config).await,
        Command::Digest { code, algorithm } => {
            let algorithm: DigestAlgorithm = algorithm.parse()?;
            println!("{}", algorithm.digest(&code));
            Ok(())
        }
        Command::Verify {
            endpoint,
            state,
            code,
        } => verify(&endpoint, state, code).await,
    }
}

async fn serve(config: Option<PathBuf>) -> Result<()> {
    let manager = match config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );
    ConfigServer::new(&manager.config())?.serve().await?;
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn verify(endpoint: &str, state: PathBuf, code: Option<String>) -> Result<()> {
    let store = Arc::new(CredentialStore::load(state)?);
    if let Some(code) = code {
        store.set_field("accessCode", code)?;
    }

    let verifier = HttpConfigVerifier::new(endpoint)?;
    // 同步失败时沿用已保存的开关，客户端默认需要访问码
    if let Err(err) = sync_danger_config(&store, &verifier).await {
        lwarn!(
            "system",
            LogStage::Configuration,
            LogComponent::Main,
            "sync_danger_config",
            format!("读取公开配置失败，沿用本地开关: {err}")
        );
    }

    let navigator = Arc::new(HistoryNavigator::default());
    let check = AuthCheck::new(Arc::clone(&store), verifier, Arc::clone(&navigator));
    let outcome = check.on_trigger(Trigger::Mount).await;

    let verdict = match outcome {
        CheckOutcome::Authorized => "authorized",
        CheckOutcome::Unauthorized { .. } => "unauthorized",
        CheckOutcome::Dropped => "inconclusive",
    };
    println!("{verdict} (route: {})", navigator.current_route());
    Ok(())
}
