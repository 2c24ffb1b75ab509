use serde::Serialize;

use crate::store::path::normalize_path;

use super::{init_state, print_json};

#[derive(Serialize)]
struct SecretOutput {
    path: String,
    value: String,
}

pub fn run_secret_get(data_dir: String, path: String, json: bool) -> anyhow::Result<()> {
    let path = normalize_path(&path)?;
    let state = init_state(&data_dir)?;

    let Some(value) = state.cache.get(&path)? else {
        anyhow::bail!("No secret stored at {path}");
    };

    if json {
        print_json(&SecretOutput { path, value })?;
    } else {
        println!("{value}");
    }
    Ok(())
}

pub fn run_secret_set(data_dir: String, path: String, value: String) -> anyhow::Result<()> {
    let path = normalize_path(&path)?;
    let state = init_state(&data_dir)?;

    state.cache.set(&path, &value)?;
    println!("Stored secret at {path}");
    Ok(())
}

pub fn run_secret_delete(data_dir: String, path: String) -> anyhow::Result<()> {
    let path = normalize_path(&path)?;
    let state = init_state(&data_dir)?;

    if state.cache.delete(&path)? {
        println!("Deleted secret at {path}");
    } else {
        println!("No secret stored at {path}");
    }
    Ok(())
}
