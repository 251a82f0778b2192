//! ASL Agent - API server entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "asl-agent", version, about = "ASL translation session API")]
struct Cli {
    /// 바인드 주소 (기본: ASL_AGENT_HOST 또는 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// 포트 (기본: ASL_AGENT_PORT / PORT 또는 8080)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite 파일 경로
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// 시작 시 샘플 규칙/세션 삽입
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env 는 설정을 처음 읽기 전에 로드
    asl_agent::load_env();
    let cli = Cli::parse();

    let mut settings = asl_agent::config::settings().clone();
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(db_path) = cli.db_path {
        settings.db_path = db_path;
    }

    match asl_agent::run(settings, cli.seed).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("asl-agent: {e}");
            ExitCode::FAILURE
        }
    }
}
