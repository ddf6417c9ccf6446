//! Host installation: storage layout, default settings, empty registry

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{error, info};

use crate::logs::{init_logging, LogOptions};
use crate::registry::model::RegistryDocument;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::utils::version_info;

/// Run the installation process
pub async fn install(cli_args: &HashMap<String, String>) {
    match install_impl(cli_args).await {
        Ok(_) => {
            info!("Installation successful");
            println!("\n[SUCCESS] Slipway installed successfully!");
            println!("Start the daemon with: systemctl start slipway");
        }
        Err(e) => {
            error!("Installation failed: {:?}", e);
            eprintln!("\n[ERROR] Installation failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn install_impl(cli_args: &HashMap<String, String>) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize temporary logging
    let log_options = LogOptions {
        stdout: true,
        ..Default::default()
    };
    let _ = init_logging(log_options);

    println!("Slipway Installer");
    println!("=================");
    println!();

    // Setup storage layout
    let layout = match cli_args.get("base") {
        Some(base) => StorageLayout::new(PathBuf::from(base)),
        None => StorageLayout::default(),
    };
    println!("Setting up storage at: {:?}", layout.base_dir);
    layout.setup().await?;

    // Create the settings file unless the operator already has one
    let settings_file = layout.settings_file();
    if settings_file.exists().await {
        println!("Settings already present at: {:?}", settings_file.path());
    } else {
        let mut settings = Settings::default();
        settings.registry_file = Some(layout.registry_file().path().to_path_buf());
        settings_file.write_json(&settings).await?;
        println!("Settings saved to: {:?}", settings_file.path());
    }

    // Bootstrap an empty registry: a declared-but-missing registry file is a
    // startup error, so install always leaves a readable one behind
    let registry_file = layout.registry_file();
    if registry_file.exists().await {
        println!("Registry already present at: {:?}", registry_file.path());
    } else {
        registry_file.write_json(&RegistryDocument::default()).await?;
        registry_file.set_permissions_600().await?;
        println!("Empty registry created at: {:?}", registry_file.path());
    }

    // Print version info
    let version = version_info();
    println!();
    println!("Slipway version: {}", version.version);
    println!("Git hash: {}", version.git_hash);
    println!("Build time: {}", version.build_time);

    Ok(())
}
