use crate::config::Config;
use crate::cli::ConfigCommands;
use crate::utils::interactive::prompt_yes_no;
use crate::utils::output::{OutputStyle, print_success};
use anyhow::Result;
use std::path::Path;

pub fn handle_config_command(
    config: Config,
    config_path: &Path,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) => handle_show_command(&config, config_path),
        Some(ConfigCommands::Reset { force }) => handle_reset_command(config_path, force),
        Some(ConfigCommands::Path) => {
            println!("{}", config_path.display());
            Ok(())
        }
        None => handle_config_help(config_path),
    }
}

fn handle_show_command(config: &Config, config_path: &Path) -> Result<()> {
    OutputStyle::print_header("⚙️  Math Helper Configuration");
    let path = config_path.display().to_string();
    OutputStyle::print_field_colored("File", &path, OutputStyle::muted);
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

fn handle_config_help(config_path: &Path) -> Result<()> {
    println!("⚙️  Configuration Management");
    println!("==========================");
    println!("Available configuration commands:");
    println!("  mathhelper config show    - Show current configuration");
    println!("  mathhelper config reset   - Reset configuration to defaults");
    println!("  mathhelper config path    - Print configuration file path");
    println!();
    println!("Configuration file location: {}", config_path.display());
    Ok(())
}

fn handle_reset_command(config_path: &Path, force: bool) -> Result<()> {
    let question = "Are you sure you want to reset configuration to defaults? \
                    This will overwrite your current settings.";
    if force || prompt_yes_no(question)? {
        Config::default().save_to(config_path)?;
        print_success(&format!(
            "Configuration reset to defaults at {}",
            config_path.display()
        ));
    } else {
        println!("Reset cancelled.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_forced_reset_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nprecision = 4\n").unwrap();

        let reset = Some(ConfigCommands::Reset { force: true });
        handle_config_command(Config::default(), &path, reset).unwrap();
        assert_eq!(Config::load_custom(&path).unwrap(), Config::default());
    }
}
