use crypto_tracker::{Config, init_tracing, scan_alerts_once};

fn print_usage(bin_name: &str) {
    eprintln!("Usage: {bin_name} scan-alerts");
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let mut args = std::env::args();
    let bin_name = args.next().unwrap_or_else(|| "cron".to_string());
    let command = args.next();

    if command.as_deref() != Some("scan-alerts") || args.next().is_some() {
        print_usage(&bin_name);
        std::process::exit(2);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level, config.logging.json_format);

    match scan_alerts_once(&config).await {
        Ok(report) => {
            println!(
                "Alert scan completed: matched={}, notified={}, send_failures={}, mark_failures={}",
                report.matched, report.notified, report.send_failures, report.mark_failures
            );
        }
        Err(err) => {
            eprintln!("Cron job failed: {err}");
            std::process::exit(1);
        }
    }
}
