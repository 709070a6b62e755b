use anyhow::Result;

use crate::config;

pub fn run() -> Result<()> {
    let path = config::config_path()?;

    if config::ensure_template(&path)? {
        println!("Created a config template at {}", path.display());
    } else {
        println!("{}", path.display());
    }

    Ok(())
}
