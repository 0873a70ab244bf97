//! CLI entry-point for requesting a diagnostic suggestion.

use std::sync::Arc;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    diagnosis::{DiagnosisService, OpenRouterClient},
};

/// Args for the `diagnose` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Current symptoms.
    #[arg(long)]
    pub symptoms: String,
    /// Past or chronic conditions.
    #[arg(long, default_value = "None documented")]
    pub conditions: String,
    /// Current medications.
    #[arg(long, default_value = "None documented")]
    pub medications: String,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let client = OpenRouterClient::from_settings(&settings)?;
    let service = DiagnosisService::new(Arc::new(client));
    let (reply, parsed) = service
        .suggest_parsed(&args.symptoms, &args.conditions, &args.medications)
        .await;
    println!("{reply}\n");
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
