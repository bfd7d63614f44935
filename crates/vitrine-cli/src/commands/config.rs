use std::path::Path;

use anyhow::Result;

use vitrine_core::AppConfig;

pub fn show(config: &AppConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn path(path: &Path) -> Result<()> {
    let state = if path.exists() { "" } else { " (not created, defaults in use)" };
    println!("{}{}", path.display(), state);
    Ok(())
}

pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    AppConfig::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_keeps_existing_file_unless_forced() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("vitrine").join("config.toml");

        init(&path, false).unwrap();
        let written = AppConfig::load_from(&path).unwrap();
        assert_eq!(written.navigator.settle_ms, 800);

        std::fs::write(&path, "[navigator]\nsettle_ms = 1200\n").unwrap();
        init(&path, false).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().navigator.settle_ms, 1200);

        init(&path, true).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().navigator.settle_ms, 800);
    }
}
