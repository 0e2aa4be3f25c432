use std::path::Path;

use tokenspan_core::AggregationStrategy;
use tokenspan_inference::{group_entities, ModelRegistry, RegistryConfig};

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

    let text = std::env::args().nth(1).unwrap_or_else(|| {
        "Apple Inc. opened a new store in New York City while Tim Cook watched.".to_string()
    });

    let entities = registry
        .decode_entities(&text, AggregationStrategy::Simple)
        .await?;

    for entity in &entities {
        println!(
            "{} {:?} score={:.3} span={}..{}",
            entity.entity_group, entity.word, entity.score, entity.start, entity.end
        );
    }

    for (entity_type, groups) in group_entities(&entities) {
        for group in groups {
            println!("{}: {} x{}", entity_type, group.word, group.count);
        }
    }

    Ok(())
}
