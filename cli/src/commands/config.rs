//! Config commands

use crate::config::Config;
use crate::ConfigCommands;
use anyhow::Result;

pub fn handle(action: ConfigCommands, profile: Option<&str>) -> Result<()> {
    match action {
        ConfigCommands::Init => {
            let path = Config::default().save(profile)?;
            println!("Configuration initialized at {}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(profile)?;
            config.set(&key, value)?;
            config.save(profile)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(profile)?;
            let value = config.get(&key)?;
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(profile)?;
            for key in Config::KEYS {
                let value = config.get(key)?;
                println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
            }
        }
    }
    Ok(())
}
