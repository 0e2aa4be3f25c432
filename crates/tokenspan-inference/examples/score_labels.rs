use std::path::Path;

use tokenspan_core::ZeroShotOptions;
use tokenspan_inference::{ModelRegistry, RegistryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut config = if Path::new("tokenspan.yaml").exists() {
        RegistryConfig::from_file("tokenspan.yaml")?
    } else {
        RegistryConfig::default()
    };
    config.apply_env_overrides();

    let registry = ModelRegistry::new(config);

    let mut args = std::env::args().skip(1);
    let text = args
        .next()
        .unwrap_or_else(|| "The new chip doubles inference throughput.".to_string());
    let labels: Vec<String> = {
        let rest: Vec<String> = args.collect();
        if rest.is_empty() {
            vec![
                "technology".to_string(),
                "sports".to_string(),
                "politics".to_string(),
            ]
        } else {
            rest
        }
    };

    let result = registry
        .score_labels(&text, &labels, ZeroShotOptions::default())
        .await?;

    println!("{}", result.sequence);
    for (label, score) in result.labels.iter().zip(&result.scores) {
        println!("  {} {:.3}", label, score);
    }

    Ok(())
}
