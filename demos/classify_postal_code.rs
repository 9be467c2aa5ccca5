//! Classifies the current heat conditions at a Singapore postal code.
//!
//! Needs the historical corpus at the configured `corpus_path` and, for OneMap, an
//! `ONEMAP_KEY` in the environment or a `.env` file.
//!
//! ```sh
//! cargo run --example classify_postal_code -- 238801
//! ```

use heatspot::{Heatspot, HeatspotConfig, HeatspotError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), HeatspotError> {
    let postal_code = env::args().nth(1).unwrap_or_else(|| "238801".to_string());

    let (config, source) = HeatspotConfig::load()?;
    println!("Using configuration from {}", source);

    let engine = Heatspot::from_config(&config).await?;
    let location = engine.locate_postal_code(&postal_code).await?;

    let assessment = engine
        .assess_location()
        .location(location)
        .call()
        .await?;

    println!(
        "{} ({:.4}, {:.4}): score {:.3}, threshold {:.3}, percentile {:.1} -> {}",
        postal_code,
        location.latitude(),
        location.longitude(),
        assessment.result.weighted_score,
        assessment.result.heat_threshold,
        assessment.result.percentile,
        if assessment.result.is_hotspot {
            "HOTSPOT"
        } else {
            "normal"
        }
    );
    for station in &assessment.stations {
        println!(
            "  {:>5} {:>6.2} km  weight {:.2}  {:.1}°C  heat stress {:.1}  wind {}",
            station.station.station_id(),
            station.station.distance,
            station.station.weight,
            station.station.station.reading.air_temp,
            station.heat_stress,
            station
                .wind_direction_dir
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    if let (Some(uv_index), Some(risk)) = (assessment.uv_index, assessment.uv_risk) {
        println!("UV index {} ({}): {}", uv_index, risk, risk.advice());
    }

    Ok(())
}
