use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yolopost::{AnchorTable, Detection, Partition, PostProcessor, SessionConfig, ANCHORS};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "yolopost CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PartitionConfig {
    #[default]
    EvenChunks,
    SpatialBlocks([usize; 3]),
}

impl From<PartitionConfig> for Partition {
    fn from(value: PartitionConfig) -> Self {
        match value {
            PartitionConfig::EvenChunks => Partition::EvenChunks,
            PartitionConfig::SpatialBlocks(splits) => Partition::SpatialBlocks { splits },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionConfigJson {
    model_size: usize,
    classes_number: usize,
    score_threshold: f32,
    nms_threshold: f32,
    worker_count: usize,
    anchors: AnchorTable,
    partition: PartitionConfig,
}

impl Default for SessionConfigJson {
    fn default() -> Self {
        let cfg = SessionConfig::default();
        Self {
            model_size: cfg.model_size,
            classes_number: cfg.classes_number,
            score_threshold: cfg.score_threshold,
            nms_threshold: cfg.nms_threshold,
            worker_count: cfg.worker_count,
            anchors: ANCHORS,
            partition: PartitionConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Config {
    head_paths: [String; 3],
    output_path: Option<String>,
    max_boxes: usize,
    session: SessionConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            head_paths: Default::default(),
            output_path: None,
            max_boxes: 300,
            session: SessionConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    xmin: f32,
    ymin: f32,
    xmax: f32,
    ymax: f32,
    class_id: u32,
    score: f32,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            xmin: value.xmin,
            ymin: value.ymin,
            xmax: value.xmax,
            ymax: value.ymax,
            class_id: value.class_id,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    detections: Vec<DetectionRecord>,
}

/// Reads a raw little-endian `f32` dump.
fn load_head(path: &str) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        let len = bytes.len();
        return Err(format!("{path}: {len} bytes is not a whole number of f32 values").into());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("yolopost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.head_paths.iter().any(String::is_empty) {
        return Err("head_paths must name three head files".into());
    }
    if config.max_boxes == 0 {
        return Err("max_boxes must be at least 1".into());
    }

    let heads = [
        load_head(&config.head_paths[0])?,
        load_head(&config.head_paths[1])?,
        load_head(&config.head_paths[2])?,
    ];

    let session = config.session;
    let mut post = PostProcessor::new(SessionConfig {
        model_size: session.model_size,
        classes_number: session.classes_number,
        score_threshold: session.score_threshold,
        nms_threshold: session.nms_threshold,
        worker_count: session.worker_count,
        anchors: session.anchors,
    })?
    .with_partition(session.partition.into())?;

    post.process(&heads[0], &heads[1], &heads[2])?;
    let detections: Vec<DetectionRecord> = post
        .detections()
        .into_iter()
        .take(config.max_boxes)
        .map(DetectionRecord::from)
        .collect();
    let output = Output {
        count: detections.len(),
        detections,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        assert_eq!(config.max_boxes, 300);
        assert_eq!(
            Partition::from(config.session.partition),
            Partition::SpatialBlocks { splits: [4, 2, 1] }
        );
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let session_typo = r#"{ "head_paths": ["a", "b", "c"], "session": { "worker_cout": 2 } }"#;
        assert!(serde_json::from_str::<Config>(session_typo).is_err());

        let top_level_typo = r#"{ "head_paths": ["a", "b", "c"], "max_box": 10 }"#;
        assert!(serde_json::from_str::<Config>(top_level_typo).is_err());
    }

    #[test]
    fn omitted_fields_use_session_defaults() {
        let config: Config = serde_json::from_str(r#"{ "head_paths": ["a", "b", "c"] }"#).unwrap();
        assert_eq!(config.session.worker_count, SessionConfig::default().worker_count);
        assert_eq!(Partition::from(config.session.partition), Partition::EvenChunks);
    }
}
