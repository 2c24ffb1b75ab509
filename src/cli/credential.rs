use crate::types::{CredentialStatus, Provider};

use super::{init_state, print_json, yes_no};

fn scope_label(org: &str, team: Option<&str>) -> String {
    match team {
        Some(team) => format!("team {team} in organization {org}"),
        None => format!("organization {org}"),
    }
}

pub fn run_credential_set(
    data_dir: String,
    provider: String,
    org: String,
    team: Option<String>,
    value: String,
) -> anyhow::Result<()> {
    let provider: Provider = provider.parse()?;
    let state = init_state(&data_dir)?;

    state
        .credentials
        .set_credential(provider, &value, &org, team.as_deref())?;

    println!(
        "Stored {provider} API key for {}",
        scope_label(&org, team.as_deref())
    );
    Ok(())
}

pub fn run_credential_delete(
    data_dir: String,
    provider: String,
    org: String,
    team: Option<String>,
) -> anyhow::Result<()> {
    let provider: Provider = provider.parse()?;
    let state = init_state(&data_dir)?;

    let removed = state
        .credentials
        .delete_credential(provider, &org, team.as_deref())?;

    let scope = scope_label(&org, team.as_deref());
    if removed {
        println!("Deleted {provider} API key for {scope}");
    } else {
        println!("No {provider} API key stored for {scope}");
    }
    Ok(())
}

fn print_status(statuses: &[CredentialStatus]) {
    println!();
    for status in statuses {
        let level = status.level.map_or("not configured", |l| l.as_str());
        println!(
            "  {:<10} {:<15} team override: {:<3}  org key: {:<3}  env fallback: {}",
            status.provider.as_str(),
            level,
            yes_no(status.has_team_override),
            yes_no(status.has_org_key),
            yes_no(status.has_env_fallback),
        );
    }
    println!();
}

pub fn run_credential_status(
    data_dir: String,
    org: String,
    team: Option<String>,
    provider: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let provider = provider.map(|p| p.parse::<Provider>()).transpose()?;
    let state = init_state(&data_dir)?;

    let statuses = match provider {
        Some(provider) => vec![
            state
                .credentials
                .credential_status(provider, &org, team.as_deref())?,
        ],
        None => state
            .credentials
            .list_credential_status(&org, team.as_deref())?,
    };

    if json {
        print_json(&statuses)?;
    } else {
        print_status(&statuses);
    }
    Ok(())
}
