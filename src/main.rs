use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Notify;
use tokio::time::{interval, sleep, Instant};

use procureflow_realtime::{
    arguments::{get_arg_value, get_arg_values, has_arg, patterns, print_debug_info, print_help},
    config::{get_config_clone, load_config_from_path, CONFIG_FILE_PATH},
    logger::{self, LogTag},
    realtime::{NotificationService, RealtimeMessage, Subscription, Topic},
};

/// Seconds between status lines
const STATUS_INTERVAL_SECS: u64 = 10;

/// How long `--send` waits for a connection before giving up
const SEND_WAIT_SECS: u64 = 15;

/// Realtime monitor for the ProcureFlow dashboard feed
///
/// Subscribes to the requested topics (all by default), logs every delivered
/// message and the connection status until Ctrl+C or `--duration-secs`.
#[tokio::main]
async fn main() -> Result<()> {
    logger::init();

    if patterns::is_help_requested() {
        print_help();
        return Ok(());
    }
    if patterns::is_version_requested() {
        println!("procureflow-realtime {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    print_debug_info();
    logger::info(LogTag::System, "ProcureFlow realtime monitor starting");

    let config_path = get_arg_value("--config").unwrap_or_else(|| CONFIG_FILE_PATH.to_string());
    load_config_from_path(&config_path).map_err(anyhow::Error::msg)?;
    logger::info(
        LogTag::Config,
        &format!("Configuration loaded from {}", config_path),
    );

    let mut config = get_config_clone().realtime;
    if has_arg("--simulated") {
        config.initial_transport = "simulated".to_string();
    }

    let duration = get_arg_value("--duration-secs")
        .map(|value| value.parse::<u64>())
        .transpose()
        .context("--duration-secs must be a whole number of seconds")?
        .map(Duration::from_secs);

    let outbound = match get_arg_value("--send") {
        Some(destination) => {
            let payload = match get_arg_value("--payload") {
                Some(raw) => serde_json::from_str(&raw).context("--payload must be valid JSON")?,
                None => serde_json::json!({}),
            };
            Some((destination, payload))
        }
        None => None,
    };

    let mut topics = get_arg_values("--topic");
    if topics.is_empty() {
        topics = Topic::ALL.iter().map(|t| t.code().to_string()).collect();
    }
    for topic in &topics {
        if Topic::from_code(topic).is_none() {
            logger::warning(
                LogTag::System,
                &format!("Topic '{}' is not produced by classification, no messages expected", topic),
            );
        }
    }

    let service = NotificationService::new(config);
    let subscriptions: Vec<Subscription> = topics
        .iter()
        .map(|topic| {
            let label = topic.clone();
            service.subscribe(topic, move |message| log_message(&label, message))
        })
        .collect();
    logger::info(
        LogTag::System,
        &format!("Subscribed to {}", topics.join(", ")),
    );

    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        logger::info(LogTag::System, "Shutdown signal received");
        signal.notify_one();
    })
    .context("failed to install Ctrl+C handler")?;

    if let Some((destination, payload)) = outbound {
        let sender = service.clone();
        tokio::spawn(async move {
            let deadline = Instant::now() + Duration::from_secs(SEND_WAIT_SECS);
            while !sender.is_connected() && Instant::now() < deadline {
                sleep(Duration::from_millis(200)).await;
            }
            sender.send_message(&destination, payload);
        });
    }

    let stop_after = async {
        match duration {
            Some(duration) => sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(stop_after);

    let mut status_ticker = interval(Duration::from_secs(STATUS_INTERVAL_SECS));
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = &mut stop_after => {
                logger::info(LogTag::System, "Duration elapsed, stopping");
                break;
            }
            _ = status_ticker.tick() => log_status(&service),
        }
    }

    for subscription in &subscriptions {
        subscription.unsubscribe();
    }
    service.disconnect();

    let metrics = serde_json::to_string(&service.metrics()).unwrap_or_default();
    logger::info(LogTag::System, &format!("Final metrics: {}", metrics));
    Ok(())
}

fn log_message(topic: &str, message: &RealtimeMessage) {
    match message {
        RealtimeMessage::Statistics(update) => logger::info(
            LogTag::Realtime,
            &format!(
                "[{}] {} total={} pending={}",
                topic,
                update.message_type,
                update.stat_i64("totalRequests").unwrap_or_default(),
                update.stat_i64("pendingRequests").unwrap_or_default()
            ),
        ),
        RealtimeMessage::Notification(notification) => logger::info(
            LogTag::Realtime,
            &format!(
                "[{}] {} {}: {}",
                topic, notification.message_type, notification.title, notification.message
            ),
        ),
    }
    logger::verbose(LogTag::Realtime, &message.to_value().to_string());
}

fn log_status(service: &NotificationService) {
    let status = service.status();
    let metrics = service.metrics();
    logger::info(
        LogTag::System,
        &format!(
            "Status: {} (reconnect={}, degraded={}) frames={} dispatched={} dropped={}",
            status.label(),
            status.reconnect_state,
            status.degraded,
            metrics.frames_received,
            metrics.messages_dispatched,
            metrics.frames_dropped
        ),
    );
}
