//! `chorus models`: supported models and provider readiness.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use chorus_infra::secret::EnvSecretProvider;
use chorus_types::bot::ModelId;
use chorus_types::config::GlobalConfig;

#[derive(Debug, Serialize)]
struct ModelRow {
    model: ModelId,
    provider: String,
    enabled: bool,
    api_key_env: &'static str,
    api_key_set: bool,
}

fn model_rows(config: &GlobalConfig, secrets: &EnvSecretProvider) -> Vec<ModelRow> {
    ModelId::ALL
        .iter()
        .map(|&model| {
            let provider = model.provider_type();
            ModelRow {
                model,
                provider: provider.to_string(),
                enabled: config.enabled_providers.contains(&provider),
                api_key_env: provider.api_key_env(),
                api_key_set: secrets.get(provider.api_key_env()).is_some(),
            }
        })
        .collect()
}

/// Print every supported model with its provider and whether it can be used.
pub fn list_models(config: &GlobalConfig, json: bool) -> Result<()> {
    let rows = model_rows(config, &EnvSecretProvider::new());

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Model").fg(Color::White),
        Cell::new("Provider").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for row in &rows {
        let status = match (row.enabled, row.api_key_set) {
            (true, true) => Cell::new("● ready").fg(Color::Green),
            (true, false) => Cell::new(format!("○ set {}", row.api_key_env)).fg(Color::Yellow),
            (false, _) => Cell::new("◌ disabled").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(row.model).fg(Color::Cyan),
            Cell::new(&row.provider),
            status,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    let ready = rows.iter().filter(|r| r.enabled && r.api_key_set).count();
    println!(
        "  {} of {} models ready",
        style(ready).bold(),
        rows.len()
    );
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::llm::ProviderType;

    #[test]
    fn disabled_provider_marks_its_models() {
        let config = GlobalConfig {
            enabled_providers: vec![ProviderType::OpenAi],
            ..GlobalConfig::default()
        };
        let secrets = EnvSecretProvider::with_lookup(|key| {
            (key == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        });
        let rows = model_rows(&config, &secrets);
        assert_eq!(rows.len(), ModelId::ALL.len());

        let claude = rows
            .iter()
            .find(|r| r.model == ModelId::Claude35Sonnet)
            .unwrap();
        assert!(!claude.enabled);
        assert!(!claude.api_key_set);
        assert_eq!(claude.api_key_env, "ANTHROPIC_API_KEY");
        assert!(
            rows.iter()
                .filter(|r| r.enabled)
                .all(|r| r.provider == "openai" && r.api_key_set)
        );
    }
}
