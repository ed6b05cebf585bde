//! `taskforge init`: write the default config file.

use anyhow::Context;
use taskforge_config::AppConfig;

pub fn run(force: bool) -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("  TaskForge setup");
    println!("  ===============");
    println!();

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("creating {}", config_dir.display()))?;
        println!("  Created config directory: {}", config_dir.display());
    }

    if config_path.exists() && !force {
        println!("  Config already exists: {}", config_path.display());
        println!("  Use --force to overwrite it.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())
        .with_context(|| format!("writing {}", config_path.display()))?;
    println!("  Wrote {}", config_path.display());
    println!();
    println!("  Next: export GEMINI_API_KEY (or TASKFORGE_API_KEY) and try");
    println!("    taskforge run \"create hello.txt containing hi\"");
    println!();
    Ok(())
}
