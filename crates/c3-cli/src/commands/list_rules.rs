//! List rules command implementation.

use c3::rules::Preset;

/// Runs the list-rules command.
pub fn run() {
    println!("Built-in presets:\n");

    for preset in Preset::ALL {
        println!("{}  - {}", preset.name(), preset.description());
        println!("  {:<32} {:<12} {:<8} Description", "Id", "Type", "Severity");
        println!("  {}", "-".repeat(78));
        for rule in preset.rules() {
            println!(
                "  {:<32} {:<12} {:<8} {}",
                rule.id,
                rule.rule_type.as_str(),
                rule.severity.to_string(),
                rule.description
            );
        }
        println!();
    }

    println!("Use `extends` in c3.toml to pick a preset, e.g.:");
    println!("  extends = [\"c3/strict\"]");
    println!("Override a rule with `[rules]`, e.g.:");
    println!("  consistent-naming = \"off\"");
}
