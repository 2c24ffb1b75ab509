use crate::catalog::ModelInfo;

use super::{init_state, print_json};

fn print_models(models: &[ModelInfo]) {
    if models.is_empty() {
        println!("No models available.");
        return;
    }
    println!();
    for model in models {
        let context = model
            .max_context_tokens
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        println!(
            "  {:<10} {:<32} {:<24} context {}",
            model.provider, model.id, model.name, context
        );
    }
    println!();
}

pub fn run_models(
    data_dir: String,
    org: String,
    team: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let state = init_state(&data_dir)?;
    let models = state.settings.available_models(&org, team.as_deref())?;

    if json {
        print_json(&models)?;
    } else {
        print_models(&models);
    }
    Ok(())
}
