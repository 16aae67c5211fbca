/// Backend Health Probe Tool
///
/// Checks whether the ProcureFlow backend answers its health endpoint, the
/// same probe the notification service uses to leave degraded mode.
///
/// Usage: cargo run --bin tool_health_probe -- --url http://localhost:8080/actuator/health --wait 10
use clap::{Arg, ArgAction, Command};
use procureflow_realtime::config::HealthConfig;
use procureflow_realtime::logger::{self, LogTag};
use procureflow_realtime::realtime::{BackendHealthChecker, HealthProbe};
use std::process;
use std::time::Duration;

#[tokio::main]
async fn main() {
    logger::init();

    let defaults = HealthConfig::default();
    let matches = Command::new("Backend Health Probe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check the ProcureFlow backend health endpoint")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Health endpoint (default: http://localhost:8080/actuator/health)"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .value_name("MS")
                .help("Request timeout in milliseconds (default: 3000)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("wait")
                .short('w')
                .long("wait")
                .value_name("ATTEMPTS")
                .help("Keep checking until healthy, up to ATTEMPTS times")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("delay-ms")
                .long("delay-ms")
                .value_name("MS")
                .help("Delay between attempts with --wait")
                .value_parser(clap::value_parser!(u64))
                .default_value("2000"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the result as JSON")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let url = matches
        .get_one::<String>("url")
        .cloned()
        .unwrap_or(defaults.url.clone());
    let timeout_ms = matches
        .get_one::<u64>("timeout-ms")
        .copied()
        .unwrap_or(defaults.timeout_ms);
    let delay_ms = matches.get_one::<u64>("delay-ms").copied().unwrap_or(2000);

    let checker = BackendHealthChecker::new(&HealthConfig {
        url,
        timeout_ms,
        ..defaults
    });

    let available = match matches.get_one::<u32>("wait").copied() {
        Some(attempts) => {
            checker
                .wait_for_backend(attempts.max(1), Duration::from_millis(delay_ms))
                .await
        }
        None => checker.check_health().await.is_available,
    };

    match checker.last_check() {
        Some(status) if matches.get_flag("json") => {
            println!("{}", serde_json::to_string_pretty(&status).unwrap_or_default());
        }
        Some(status) => {
            let icon = if status.is_available { "✅" } else { "❌" };
            logger::info(
                LogTag::Health,
                &format!("{} {}: {}", icon, checker.url(), status.message),
            );
        }
        None => logger::error(LogTag::Health, "No health check was performed"),
    }

    if !available {
        process::exit(1);
    }
}
