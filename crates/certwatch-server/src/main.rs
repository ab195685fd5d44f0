use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use certwatch_check::CertChecker;
use certwatch_notify::channels::noop::NoopNotifier;
use certwatch_notify::channels::{NotifierKind, WebhookNotifier};
use certwatch_notify::Notifier;
use certwatch_server::config::Config;
use certwatch_server::job::CheckCertJob;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  certwatch-server <config.toml>          Start the scheduled check job");
    eprintln!("  certwatch-server <config.toml> check    Run all checks once and exit");
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install default CryptoProvider: {e:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("certwatch=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = match args.get(1) {
        Some(path) => path.clone(),
        None => {
            print_usage();
            anyhow::bail!("missing <config.toml> argument");
        }
    };

    let config = Config::load(&config_path)?;

    let checker = Arc::new(CertChecker::new(config.connect_timeout_secs));
    let notifier = build_notifier(&config)?;

    let job = CheckCertJob::new(
        &config.schedule,
        &config.notification_level,
        config.warning_days,
        config.cert_items(),
        checker,
        Some(notifier),
    )?;

    match args.get(2).map(|s| s.as_str()) {
        Some("check") => {
            job.run_now().await;
            Ok(())
        }
        Some(other) => {
            print_usage();
            anyhow::bail!("unknown subcommand '{other}'");
        }
        None => {
            job.start();
            signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received");
            job.stop();
            Ok(())
        }
    }
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let notifier = &config.notifier;
    if notifier.kind.eq_ignore_ascii_case("none") {
        return Ok(Arc::new(NoopNotifier));
    }

    let kind: NotifierKind = notifier.kind.parse()?;
    let webhook_url = notifier.webhook_url.clone().ok_or_else(|| {
        anyhow::anyhow!("notifier kind '{}' requires a webhook_url", notifier.kind)
    })?;

    Ok(Arc::new(WebhookNotifier::new(
        kind,
        webhook_url,
        notifier.message_title.clone(),
        notifier.message_body.clone(),
        notifier.message_url.clone(),
        notifier.mentions.as_deref().unwrap_or(""),
    )))
}
