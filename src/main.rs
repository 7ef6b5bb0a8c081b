use anyhow::Result;
use paydesk::{
    client::HttpPaymentsGateway,
    config::Config,
    models::QueryDescriptor,
    services::{NotificationDispatcher, PaymentWorkflow},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    println!("paydesk v{}", env!("CARGO_PKG_VERSION"));
    println!("===============");
    println!("API: {}", config.payments_api_url);
    println!();

    let gateway = Arc::new(HttpPaymentsGateway::new(
        &config.payments_api_url,
        Duration::from_secs(config.request_timeout_secs),
    )?);
    let notifier = Arc::new(NotificationDispatcher::new());
    let mut notifications = notifier.subscribe();
    let workflow = PaymentWorkflow::new(gateway, notifier.clone(), config.initial_query());

    // Optional search text and status filter from the command line.
    let search = std::env::args().nth(1).unwrap_or_default();
    let filter_status = std::env::args().nth(2).unwrap_or_default();
    let query = QueryDescriptor::compose(
        1,
        config.default_page_size,
        search,
        config.default_sort_order,
        filter_status,
    );

    let payments = workflow.apply_query(query).await?;

    println!("{} payment(s) on page 1:", payments.len());
    for payment in &payments {
        println!(
            "  {} {}: {} {:.2} due {} [{}]",
            payment.payee_first_name,
            payment.payee_last_name,
            payment.currency,
            payment.total_due,
            payment.payee_due_date,
            payment.payee_payment_status.as_str(),
        );
        if payment.evidence_file_id.is_some() {
            println!(
                "    evidence: {}",
                workflow.evidence_download_location(&payment.id)
            );
        }
    }

    while let Ok(note) = notifications.try_recv() {
        println!("[{:?}] {}", note.level, note.message);
    }

    Ok(())
}
