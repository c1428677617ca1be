use crate::infra::{adapter_registry, ConfiguredStore};
use clap::Args;
use identity_proofing::config::ProofingConfig;
use identity_proofing::error::AppError;
use identity_proofing::proofing::{Applicant, ProofingRequest, ProofingService, Stage, VendorResult};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ProofArgs {
    /// Stage to run: address, resolution, state_id, financial or phone
    pub(crate) stage: Stage,
    /// JSON file holding the applicant's attributes
    #[arg(long, conflicts_with = "fields")]
    pub(crate) applicant: Option<PathBuf>,
    /// Applicant attribute as `name=value`; repeatable
    #[arg(long = "field", value_parser = parse_field)]
    pub(crate) fields: Vec<(String, String)>,
    /// Stage-specific vendor params as a JSON object
    #[arg(long, value_parser = parse_json)]
    pub(crate) vendor_params: Option<Value>,
}

pub(crate) async fn run_proof(args: ProofArgs) -> Result<(), AppError> {
    let config = ProofingConfig::from_env()?;
    let result = proof(&config, args).await?;
    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    println!("{rendered}");
    Ok(())
}

/// Run the stage inline against the configured adapters and store, whatever the topology.
pub(crate) async fn proof(
    config: &ProofingConfig,
    args: ProofArgs,
) -> Result<VendorResult, AppError> {
    let ProofArgs {
        stage,
        applicant,
        fields,
        vendor_params,
    } = args;

    let applicant = match applicant {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Applicant::from_json(&raw).map_err(|err| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, err)
            })?
        }
        None => Applicant::new(fields),
    };

    let service = ProofingService::from_config(
        config,
        adapter_registry(config)?,
        Arc::new(ConfiguredStore::from_config(config)?),
        None,
    );
    let request =
        ProofingRequest::new(applicant).with_vendor_params(vendor_params.unwrap_or(Value::Null));

    let (_, result) = service.run_inline(stage, request).await?;
    Ok(result)
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|err| err.to_string())
}
