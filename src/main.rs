use clap::Parser;
use lead_intake::adapters::{
    DemoLeadStore, FileMemory, FixedLocator, NominatimGeocoder, SupabaseLeadStore, SystemClock,
    UnavailableLocator,
};
use lead_intake::config::LogFormat;
use lead_intake::core::{Clock, Geocoder, LeadStore, LocalMemory};
use lead_intake::utils::error::{ErrorSeverity, LeadError};
use lead_intake::utils::{logger, validation::Validate};
use lead_intake::{
    CliConfig, DisplayState, LocationStatus, SubmissionController, SubmitError, TomlConfig,
};
use std::sync::Arc;

const EXIT_REJECTED: i32 = 1;
const EXIT_BLOCKED: i32 = 2;
const EXIT_SYSTEM: i32 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }

    tracing::info!("Starting lead-intake CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        exit_with_config_error(&e);
    }

    // 載入 TOML 配置，沒有指定時使用預設值
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(EXIT_SYSTEM);
                }
            }
        }
        None => TomlConfig::default(),
    };

    if let Err(e) = config.validate() {
        exit_with_config_error(&e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    let geocoder = NominatimGeocoder::new(
        config.geocoder.endpoint.clone(),
        &config.geocoder.user_agent,
        config.geocoder_timeout(),
    )?;

    let store: Arc<dyn LeadStore> = match config.store_credentials() {
        Some((url, key)) => {
            tracing::info!("🗄️ Storing leads in Supabase table '{}'", config.store.table);
            Arc::new(SupabaseLeadStore::new(
                url,
                key,
                config.store.table.clone(),
                config.store_timeout(),
            )?)
        }
        None => Arc::new(DemoLeadStore::<SystemClock>::default()),
    };

    let memory_path = cli
        .memory_path
        .clone()
        .unwrap_or_else(|| config.memory.path.clone());
    let memory = FileMemory::new(memory_path);

    let business_id = cli.business_id();
    tracing::info!("Business ID: {}", business_id);

    let mut controller = SubmissionController::new(
        business_id,
        config.form_settings(),
        geocoder,
        store,
        memory,
        SystemClock,
    );

    for (field, value) in cli.field_values() {
        controller.set_field(field, value);
    }

    apply_location_choices(&cli, &mut controller).await?;

    if let Some(hint) = controller.form_hint() {
        tracing::debug!("Form hint before submit: {}", hint);
    }

    let outcome = controller.submit().await;
    match outcome {
        Ok(lead) => {
            println!("✅ Thank you! Your request has been received.");
            println!("📄 Reference: {}", lead.id);
            Ok(())
        }
        Err(SubmitError::ValidationFailed(errors)) => {
            eprintln!("❌ {}", SubmitError::ValidationFailed(errors.clone()));
            for (field, message) in errors.iter() {
                if controller.visible_error(field).is_some() {
                    eprintln!("   - {}: {}", field, message);
                }
            }
            std::process::exit(EXIT_BLOCKED);
        }
        Err(SubmitError::Busy) => {
            eprintln!("❌ {}", SubmitError::Busy);
            std::process::exit(EXIT_BLOCKED);
        }
        Err(e) => {
            let message = match controller.display_state() {
                DisplayState::Error { message } => message.clone(),
                _ => e.to_string(),
            };
            eprintln!("❌ Sending failed");
            eprintln!("   {}", message);
            std::process::exit(EXIT_REJECTED);
        }
    }
}

async fn apply_location_choices<G, S, M, C>(
    cli: &CliConfig,
    controller: &mut SubmissionController<G, S, M, C>,
) -> Result<(), LeadError>
where
    G: Geocoder,
    S: LeadStore,
    M: LocalMemory,
    C: Clock,
{
    let location = controller.location_mut();

    if let Some(fix) = cli.gps_fix()? {
        let age_ms = i64::try_from(cli.gps_age_ms).unwrap_or(i64::MAX);
        let locator = FixedLocator::with_clock(fix, SystemClock.now_ms().saturating_sub(age_ms), SystemClock);
        let status = location
            .request_gps(&locator)
            .await
            .map_err(|e| LeadError::LocationError {
                message: e.to_string(),
            })?;
        tracing::info!("📍 GPS location: {}", status);
    } else if cli.decline_gps {
        let _ = location.decline_gps();
    } else if cli.city.is_some() {
        // 命令列沒有定位裝置，走到城市清單
        let _ = location.request_gps(&UnavailableLocator).await;
    }

    if let Some(name) = &cli.city {
        let known: Vec<String> = location.catalog().iter().map(|c| c.name.clone()).collect();
        match location.select_city(name).cloned() {
            Ok(city) => tracing::info!("🏙️ City selected: {} ({})", city.name, city.coordinates()),
            Err(e) => {
                eprintln!("❌ {}", e);
                eprintln!("💡 Available cities: {}", known.join(", "));
                std::process::exit(EXIT_BLOCKED);
            }
        }
    }

    if controller.location().status() == LocationStatus::Error {
        tracing::info!("Location could not be fetched automatically, continuing without GPS");
    }

    Ok(())
}

fn exit_with_config_error(e: &LeadError) -> ! {
    tracing::error!(
        "❌ Configuration validation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => EXIT_BLOCKED,
        ErrorSeverity::High | ErrorSeverity::Critical => EXIT_SYSTEM,
    };
    std::process::exit(exit_code);
}
