use anyhow::{anyhow, Result};
use eframe::{egui, NativeOptions};
use seller_console::{about, app::SellerApp, logging};
use seller_engine::{SellerConsole, WriteSimulator, config::SellerConfig};
use std::env;

const DEFAULT_CONFIG_PATH: &str = "seller.json";

fn option_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

fn main() -> Result<()> {
    logging::init_tracing("warn");

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }

    let config_path = option_value(&args, "--config").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = SellerConfig::load_or_default(&config_path)?;
    if let Some(leads) = option_value(&args, "--leads") {
        config.leads_source = leads;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("seller-writes")
        .enable_time()
        .build()?;
    let writer = WriteSimulator::from_config(&config.write, runtime.handle().clone());
    let console = SellerConsole::new(writer);

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Seller Console")
            .with_inner_size([1100.0, 700.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Seller Console",
        options,
        Box::new(move |cc| {
            let mut app = SellerApp::new(&cc.egui_ctx, console, &config);
            let location = app.leads_location().to_string();
            app.load_leads(&location);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("Could not start the console window: {e}"))?;

    drop(runtime);
    Ok(())
}
