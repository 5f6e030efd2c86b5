use anyhow::Context;
use clap::Parser;
use py_utils::utils::{logger, validation::Validate};
use py_utils::{app, CliConfig, UtilsConfig};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => UtilsConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => UtilsConfig::default(),
    };

    if cli.verbose && config.json_logs() {
        logger::init_json_logger(true);
    } else if cli.verbose {
        logger::init_cli_logger(true);
    } else {
        logger::init_from_level(config.log_level(), config.json_logs());
    }

    tracing::debug!("CLI args: {:?}", cli);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(e.exit_code());
    }

    match app::execute(&cli.command, &config) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Command failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
