//! City listing and weather lookup commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, CityList, WeatherReport};
use crate::output::{format_condition, format_temperature, print_json, print_table, OutputFormat};

/// Row for the cities table
#[derive(Tabled)]
struct CityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Country")]
    country: String,
}

/// List the cities the server knows about
pub async fn list_cities(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: CityList = client.get("api/cities").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            let rows: Vec<CityRow> = result
                .cities
                .into_iter()
                .map(|c| CityRow {
                    id: c.id,
                    name: c.name,
                    country: c.country,
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}

/// Show current weather for a city
pub async fn show_weather(client: &ApiClient, city_id: &str, format: OutputFormat) -> Result<()> {
    let path = format!("api/weather/{}", city_id);
    let report: WeatherReport = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!(
                "{}",
                format!("{}, {}", report.city.name, report.city.country).bold()
            );
            println!("{}", "=".repeat(40));
            println!("Current:          {}", format_temperature(report.current).cyan());
            println!(
                "Condition:        {}",
                format_condition(report.city.condition.as_deref())
            );
            println!("Five-day avg max: {}", format_temperature(report.five_day_avg));
        }
    }

    Ok(())
}
