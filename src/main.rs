use chatwidget::DisplayMode;
use chatwidget::core::config::{self, CliOverrides};
use chatwidget::widget;
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "chatwidget", about = "Webhook-backed chat widget")]
struct Args {
    /// Client identifier sent with every message
    #[arg(long)]
    client_id: Option<String>,

    /// Name shown on assistant messages
    #[arg(long)]
    client_name: Option<String>,

    /// Webhook that receives messages
    #[arg(long)]
    webhook_url: Option<String>,

    /// Placement of the widget
    #[arg(long, value_enum)]
    display_mode: Option<DisplayMode>,

    /// Open the widget on start
    #[arg(long)]
    auto_open: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            client_id: self.client_id.clone(),
            client_name: self.client_name.clone(),
            webhook_url: self.webhook_url.clone(),
            display_mode: self.display_mode,
            auto_open: self.auto_open,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to chatwidget.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("chatwidget.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable config: {}", e);
        config::WidgetFileConfig::default()
    });

    let resolved = match config::resolve(&file_config, &args.overrides()) {
        Ok(resolved) => resolved,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    log::info!("Chat widget starting up for client: {}", resolved.client_id);

    widget::run(resolved).await
}
