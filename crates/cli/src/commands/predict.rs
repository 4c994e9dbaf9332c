//! Next-temperature prediction command

use anyhow::Result;
use serde_json::Value;

use crate::client::{ApiClient, PredictRequest, PredictionResponse};
use crate::output::{format_temperature, print_json, print_success, OutputFormat};

/// Numbers go over the wire as numbers; anything else is sent as given so
/// the server reports it.
fn to_sequence(values: &[String]) -> Vec<Value> {
    values
        .iter()
        .map(|raw| match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Value::from(v),
            _ => Value::String(raw.clone()),
        })
        .collect()
}

/// Ask the server for the next temperature
pub async fn predict(client: &ApiClient, values: &[String], format: OutputFormat) -> Result<()> {
    let request = PredictRequest {
        temp_sequence: to_sequence(values),
    };
    let response: PredictionResponse = client.post("predict", &request).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_success(&format!(
            "Predicted next temperature: {}",
            format_temperature(response.predicted_temperature)
        )),
    }

    Ok(())
}
