use anyhow::{Context, Result};
use courier_core::controller::Crud;
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::print_json;
use crate::cli::CrudCommands;

/// Runs one of the generic entity commands against `controller`.
///
/// JSON arguments are decoded into the controller's own input types, so a
/// malformed body is reported before anything is sent to the backend.
pub async fn run_crud<C>(controller: &C, command: CrudCommands) -> Result<()>
where
    C: Crud,
    C::Record: Serialize,
    C::Create: DeserializeOwned,
    C::Update: DeserializeOwned,
    C::Filter: DeserializeOwned,
{
    let kind = controller.kind();
    match command {
        CrudCommands::Get { id } => print_json(&controller.get(&id).await?)?,
        CrudCommands::List { filter } => {
            let filter: Option<C::Filter> = filter
                .map(|text| parse_json(&text, "filter"))
                .transpose()?;
            print_json(&controller.list(filter.as_ref()).await?)?;
        }
        CrudCommands::Create { json } => {
            let input: C::Create = parse_json(&json, "input")?;
            print_json(&controller.create(&input).await?)?;
        }
        CrudCommands::Update { id, json } => {
            let data: C::Update = parse_json(&json, "update")?;
            print_json(&controller.update(&id, &data).await?)?;
        }
        CrudCommands::Delete { id, force } => {
            if !force && !confirm(format!("Delete {} {}?", kind, id)).await? {
                println!("Aborted.");
                return Ok(());
            }
            controller.delete(&id).await?;
            println!("Deleted {} {}", kind, id);
        }
    }
    Ok(())
}

fn parse_json<T: DeserializeOwned>(text: &str, what: &str) -> Result<T> {
    serde_json::from_str(text).with_context(|| format!("Invalid {} JSON: {}", what, text))
}

async fn confirm(prompt: String) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    })
    .await
    .context("Blocking task failed (panic)")??;
    Ok(answer)
}
