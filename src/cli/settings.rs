use crate::settings::{OrganizationSettingsUpdate, TeamSettingsUpdate, UserSettingsUpdate};
use crate::types::{EffectiveSettings, Patch};

use super::{OrgSettingsArgs, TeamSettingsArgs, UserSettingsArgs, init_state, print_json, yes_no};

fn clearable_list(values: Option<Vec<String>>, clear: bool) -> Option<Vec<String>> {
    if clear { Some(Vec::new()) } else { values }
}

fn print_effective(effective: &EffectiveSettings) {
    let max_tokens = effective
        .max_tokens
        .map_or_else(|| "provider default".to_string(), |t| t.to_string());

    println!();
    println!("  provider:              {}", effective.provider);
    println!("  model:                 {}", effective.model);
    println!("  temperature:           {}", effective.temperature);
    println!("  max tokens:            {max_tokens}");
    println!("  top p:                 {}", effective.top_p);
    println!("  source:                {}", effective.settings_source);
    println!("  can change model:      {}", yes_no(effective.can_change_model));
    println!("  can change parameters: {}", yes_no(effective.can_change_parameters));
    println!(
        "  per-request selection: {}",
        yes_no(effective.per_request_selection_allowed)
    );
    println!(
        "  providers:             {}",
        effective.available_providers.join(", ")
    );
    println!("  models available:      {}", effective.available_models.len());
    println!();
}

pub fn run_settings_effective(
    data_dir: String,
    user: String,
    org: String,
    team: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let state = init_state(&data_dir)?;
    let effective = state
        .settings
        .compute_effective(&user, &org, team.as_deref())?;

    if json {
        print_json(&effective)?;
    } else {
        print_effective(&effective);
    }
    Ok(())
}

pub fn run_settings_org(args: OrgSettingsArgs) -> anyhow::Result<()> {
    let state = init_state(&args.data_dir)?;

    let update = OrganizationSettingsUpdate {
        provider: args.provider,
        model: args.model,
        model_display_name: Patch::from_flags(args.display_name, args.clear_display_name),
        temperature: args.temperature,
        max_tokens: Patch::from_flags(args.max_tokens, args.clear_max_tokens),
        top_p: args.top_p,
        fallback_enabled: args.fallback_enabled,
        fallback_models: clearable_list(args.fallback_models, args.clear_fallback_models),
        allow_team_customization: args.allow_team_customization,
        allow_user_customization: args.allow_user_customization,
        allow_per_request_selection: args.allow_per_request_selection,
        enabled_providers: args.enabled_providers,
        disabled_models: clearable_list(args.disabled_models, args.clear_disabled_models),
    };

    let settings = state.settings.update_org_settings(&args.org, update)?;

    if args.json {
        print_json(&settings)?;
    } else {
        println!(
            "Organization {} uses {} / {}",
            settings.organization_id, settings.provider, settings.model
        );
    }
    Ok(())
}

pub fn run_settings_team(args: TeamSettingsArgs) -> anyhow::Result<()> {
    let state = init_state(&args.data_dir)?;

    let update = TeamSettingsUpdate {
        provider: Patch::from_flags(args.provider, args.clear_provider),
        model: Patch::from_flags(args.model, args.clear_model),
        temperature: Patch::from_flags(args.temperature, args.clear_temperature),
        max_tokens: Patch::from_flags(args.max_tokens, args.clear_max_tokens),
        allow_user_customization: args.allow_user_customization,
        disabled_models: clearable_list(args.disabled_models, args.clear_disabled_models),
    };

    let settings = state
        .settings
        .update_team_settings(&args.org, &args.team, update)?;

    if args.json {
        print_json(&settings)?;
    } else {
        println!(
            "Team {} overrides: provider {}, model {}",
            settings.team_id,
            settings.provider.as_deref().unwrap_or("inherited"),
            settings.model.as_deref().unwrap_or("inherited"),
        );
    }
    Ok(())
}

pub fn run_settings_user(args: UserSettingsArgs) -> anyhow::Result<()> {
    let state = init_state(&args.data_dir)?;

    let update = UserSettingsUpdate {
        preferred_provider: Patch::from_flags(args.provider, args.clear_provider),
        preferred_model: Patch::from_flags(args.model, args.clear_model),
        preferred_temperature: Patch::from_flags(args.temperature, args.clear_temperature),
    };

    let settings = state.settings.update_user_settings(&args.user, update)?;

    if args.json {
        print_json(&settings)?;
    } else {
        println!(
            "User {} preferences: provider {}, model {}",
            settings.user_id,
            settings.preferred_provider.as_deref().unwrap_or("inherited"),
            settings.preferred_model.as_deref().unwrap_or("inherited"),
        );
    }
    Ok(())
}
