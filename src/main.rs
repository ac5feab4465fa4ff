use clap::Parser;
use std::path::Path;
use transloadit_client::core::ConfigProvider;
use transloadit_client::utils::content_type::guess_content_type;
use transloadit_client::utils::{logger, validation::Validate};
use transloadit_client::{CliConfig, LocalStorage, Result, TransloaditError};

async fn run(config: &CliConfig) -> Result<()> {
    let mut client = config.build_client()?;

    if config.sign_only {
        let signed = client.signed_params()?;
        println!("{}", serde_json::to_string_pretty(&signed)?);
        return Ok(());
    }

    if !client.all_keys_are_set() {
        tracing::warn!("No template id or steps configured; the assembly may be rejected");
    }

    let path = config
        .file
        .as_deref()
        .ok_or_else(|| TransloaditError::MissingConfigError {
            field: "file".to_string(),
        })?;
    let name = config.name.clone().unwrap_or_else(|| {
        Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string()
    });
    let content_type = config
        .content_type
        .as_deref()
        .unwrap_or_else(|| guess_content_type(path));

    client.set_upload_progress(|progress| {
        tracing::info!(
            "⬆️  {:.0}% ({}/{} bytes)",
            progress.fraction() * 100.0,
            progress.total_bytes_written,
            progress.total_bytes_expected
        );
    });

    let storage = LocalStorage::default();
    let assembly = client
        .upload_file_at(&storage, path, &name, content_type)
        .await?;

    println!("{}", serde_json::to_string_pretty(&assembly)?);
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting transloadit-upload");
    tracing::debug!(
        "Endpoint: {}, file: {:?}, sign only: {}",
        config.endpoint(),
        config.file,
        config.sign_only
    );

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&config).await {
        tracing::error!(
            "❌ Upload failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        std::process::exit(e.severity().exit_code());
    } else {
        tracing::info!("✅ Done");
    }

    Ok(())
}
