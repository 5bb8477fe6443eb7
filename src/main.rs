use std::env;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zipfill::page::{CITY_INPUT_ID, STATE_INPUT_ID};
use zipfill::{
    AutofillEvent, LookupSettled, MemoryPage, ZipAutofill, ZipLookupClient, spawn_autofill,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zipfill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: {} [base_url]", args[0]);
        eprintln!("  base_url: server hosting /api/zip/{{code}} (default: $ZIPFILL_BASE_URL or http://127.0.0.1:3000)");
        eprintln!("  Each line read from stdin replaces the zip field and counts as one keystroke.");
        return Ok(());
    }

    let client = match args.get(1) {
        Some(base_url) => ZipLookupClient::new(base_url)?,
        None => ZipLookupClient::from_env()?,
    };
    eprintln!("Looking up zip codes at {}", client.base_url());

    let page = MemoryPage::address_form();
    let widget = ZipAutofill::bind(&page).context("Address form is missing inputs")?;
    let mut handle = spawn_autofill(widget, client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                handle.input(line);
            }
            Some(event) = handle.next_event() => print_event(&page, &event),
        }
    }

    // Let lookups already in flight land before exiting
    handle.close_input();
    while let Some(event) = handle.next_event().await {
        print_event(&page, &event);
    }

    Ok(())
}

fn print_event(page: &MemoryPage, event: &AutofillEvent) {
    match event {
        AutofillEvent::Echoed { zip, lookup: Some(_) } => println!("zip: {} (looking up)", zip),
        AutofillEvent::Echoed { zip, lookup: None } => println!("zip: {}", zip),
        AutofillEvent::Settled(settled) => print_settled(page, settled),
    }
}

fn print_settled(page: &MemoryPage, settled: &LookupSettled) {
    let Some(fill) = &settled.fill else {
        println!("{}: no data", settled.code);
        return;
    };
    if fill.is_empty() {
        println!("{}: no matches", settled.code);
        return;
    }

    let city = page.value_of(CITY_INPUT_ID).unwrap_or_default();
    let state = page.value_of(STATE_INPUT_ID).unwrap_or_default();
    if fill.city.is_none() {
        println!("{}: state={} (city ambiguous, left as {:?})", settled.code, state, city);
    } else {
        println!("{}: city={} state={}", settled.code, city, state);
    }
}
