//! CLI output formatting

use crate::core::{ConfigField, Integration, ProviderDescriptor};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a provider for display
pub fn format_provider(provider: &ProviderDescriptor) -> String {
    let steps = provider.step_count();
    format!(
        "{} {} - {} step{} - {}",
        style(&provider.id).cyan(),
        style(&provider.name).bold(),
        steps,
        if steps == 1 { "" } else { "s" },
        style(&provider.signature()[..12]).dim()
    )
}

/// Format a config field for display
pub fn format_config_field(field: &ConfigField) -> String {
    let required = if field.required {
        style("required").yellow().to_string()
    } else {
        style("optional").dim().to_string()
    };
    format!(
        "{} ({:?}, {})",
        style(&field.name).bold(),
        field.field_type,
        required
    )
}

/// Format an installed integration for display
pub fn format_integration(integration: &Integration) -> String {
    format!(
        "{} {} - {} - added {}",
        style(&integration.id.to_string()[..8]).dim(),
        style(&integration.name).bold(),
        style(&integration.provider).cyan(),
        style(integration.date_added.format("%Y-%m-%d %H:%M")).dim()
    )
}
