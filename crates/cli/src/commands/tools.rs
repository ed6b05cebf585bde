//! `taskforge tools`: list the built-in tools.

use taskforge_agent::is_sensitive;
use taskforge_config::AppConfig;
use taskforge_tools::full_registry;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let registry = full_registry(config.tools.shell_timeout());

    println!();
    println!("  {:<18} {:<10} DESCRIPTION", "TOOL", "APPROVAL");
    for name in registry.names() {
        let Some(tool) = registry.get(name) else {
            continue;
        };
        let approval = if is_sensitive(name) { "required" } else { "-" };
        println!("  {:<18} {:<10} {}", name, approval, tool.description());
    }
    println!();
    println!("  The run command binds read_file, write_file, create_folder and run_command.");
    println!("  The plan command's tool specialist binds all of the above.");
    println!();
    Ok(())
}
