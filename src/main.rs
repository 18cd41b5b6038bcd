use clap::Parser;
use std::sync::Arc;
use taalhuizen_service::config::Command;
use taalhuizen_service::utils::monitor::SystemMonitor;
use taalhuizen_service::utils::{logger, validation::Validate};
use taalhuizen_service::{CliConfig, HttpGateway, ParticipationService, Settings, SweepReport};

const EXIT_FAILURE: i32 = 1;
const EXIT_ITEMS_FAILED: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting {} job", cli.command.job_name());
    tracing::debug!("CLI config: {:?}", cli);

    let settings = match Settings::from_file(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Failed to load config file '{}': {}", cli.config, e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        std::process::exit(EXIT_FAILURE);
    }

    let gateway = match HttpGateway::new(&settings.gateway) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            tracing::error!("❌ Cannot build gateway client: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    let mut monitor = SystemMonitor::new(cli.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }
    monitor.log_stats("start");

    let service = ParticipationService::new(gateway);
    let result = match cli.command {
        Command::ParticipationStatus => service.update_completed_participations().await,
        Command::Values => service.update_gateway_date_time_values().await,
    };

    monitor.log_stats("finished");

    match result {
        Ok(report) => std::process::exit(report_outcome(&report)),
        Err(e) if e.is_transport() => {
            tracing::error!(
                "❌ {} aborted, gateway unreachable or refused the listing: {}",
                cli.command.job_name(),
                e
            );
            std::process::exit(EXIT_FAILURE);
        }
        Err(e) => {
            tracing::error!("❌ {} aborted: {}", cli.command.job_name(), e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn report_outcome(report: &SweepReport) -> i32 {
    let rate = report.error_rate();
    println!(
        "{}: {} items, {} failed, error rate {}%",
        report.job, report.total, report.errors, rate
    );

    if rate == 0 {
        tracing::info!("✅ {} completed without errors", report.job);
        0
    } else {
        tracing::warn!("⚠️ {} completed with error rate {}%", report.job, rate);
        EXIT_ITEMS_FAILED
    }
}
