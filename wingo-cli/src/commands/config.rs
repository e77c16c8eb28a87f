use std::path::Path;

pub fn show_config(config_path: Option<&Path>) -> anyhow::Result<bool> {
    let config = crate::config::load(config_path)?;

    println!("{}", serde_json::to_string_pretty(&config.redacted())?);

    if let Err(e) = config.validate() {
        eprintln!("Warning: {}", e);
        return Ok(false);
    }

    Ok(true)
}
