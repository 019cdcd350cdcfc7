//! Print the effective settings

use anyhow::Result;
use sk_core::Settings;

pub fn run(settings: &Settings) -> Result<()> {
    print!("{}", settings.to_toml()?);
    Ok(())
}
