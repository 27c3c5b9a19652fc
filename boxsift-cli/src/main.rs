use boxsift::{
    decode_yolo, BBox, BoxCoords, ClassNames, Detections, FallbackMode, FallbackPolicy,
    NmsParams, OwnedPredictions, PostProcessConfig, PostProcessor, PredictionView,
    YoloDecodeConfig,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "BoxSift CLI (JSON config driven)")]
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
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NmsConfigJson {
    iou_threshold: f32,
    score_threshold: f32,
    max_output_per_class: usize,
}

impl Default for NmsConfigJson {
    fn default() -> Self {
        let cfg = NmsParams::default();
        Self {
            iou_threshold: cfg.iou_threshold,
            score_threshold: cfg.score_threshold,
            max_output_per_class: cfg.max_output_per_class,
        }
    }
}

impl From<NmsConfigJson> for NmsParams {
    fn from(value: NmsConfigJson) -> Self {
        Self {
            iou_threshold: value.iou_threshold,
            score_threshold: value.score_threshold,
            max_output_per_class: value.max_output_per_class,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FallbackConfigJson {
    enabled: bool,
    min_relative_score: f32,
    relative_score_factor: f32,
    min_objectness: f32,
}

impl Default for FallbackConfigJson {
    fn default() -> Self {
        let policy = FallbackPolicy::default();
        Self {
            enabled: true,
            min_relative_score: policy.min_relative_score,
            relative_score_factor: policy.relative_score_factor,
            min_objectness: policy.min_objectness,
        }
    }
}

impl From<FallbackConfigJson> for FallbackMode {
    fn from(value: FallbackConfigJson) -> Self {
        if !value.enabled {
            return FallbackMode::Disabled;
        }
        FallbackMode::Enabled(FallbackPolicy {
            min_relative_score: value.min_relative_score,
            relative_score_factor: value.relative_score_factor,
            min_objectness: value.min_objectness,
        })
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CoordsConfig {
    Normalized,
    Pixels,
}

impl From<CoordsConfig> for BoxCoords {
    fn from(value: CoordsConfig) -> Self {
        match value {
            CoordsConfig::Normalized => BoxCoords::Normalized,
            CoordsConfig::Pixels => BoxCoords::Pixels,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
struct YoloConfigJson {
    input_width: u32,
    input_height: u32,
    coords: CoordsConfig,
    clip: bool,
}

impl Default for YoloConfigJson {
    fn default() -> Self {
        let cfg = YoloDecodeConfig::default();
        Self {
            input_width: cfg.input_width,
            input_height: cfg.input_height,
            coords: match cfg.coords {
                BoxCoords::Normalized => CoordsConfig::Normalized,
                BoxCoords::Pixels => CoordsConfig::Pixels,
            },
            clip: cfg.clip,
        }
    }
}

impl From<YoloConfigJson> for YoloDecodeConfig {
    fn from(value: YoloConfigJson) -> Self {
        Self {
            input_width: value.input_width,
            input_height: value.input_height,
            coords: value.coords.into(),
            clip: value.clip,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    input_path: String,
    output_path: Option<String>,
    class_names: Option<Vec<String>>,
    background_slot: bool,
    parallel: bool,
    nms: NmsConfigJson,
    fallback: FallbackConfigJson,
    yolo: YoloConfigJson,
}

#[derive(Debug, Deserialize)]
struct YoloTensor {
    shape: [usize; 2],
    data: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ImageInput {
    image: String,
    /// Original image size, used to add pixel boxes to the summary.
    #[serde(default)]
    size: Option<[u32; 2]>,
    #[serde(default)]
    boxes: Option<Vec<[f32; 4]>>,
    #[serde(default)]
    class_probs: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    objectness: Option<Vec<f32>>,
    #[serde(default)]
    yolo: Option<YoloTensor>,
}

#[derive(Debug, Deserialize)]
struct InputFile {
    images: Vec<ImageInput>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    class_id: usize,
    class_name: String,
    score: f32,
    bbox: [f32; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    bbox_pixels: Option<[f32; 4]>,
}

#[derive(Debug, Serialize)]
struct ImageSummary {
    image: String,
    source: &'static str,
    detections: Vec<DetectionRecord>,
}

/// Builds owned predictions for one image; `None` when the model output is absent.
fn load_predictions(
    input: &ImageInput,
    config: &Config,
    class_names: &ClassNames,
) -> Result<Option<OwnedPredictions>, Box<dyn std::error::Error>> {
    if let Some(yolo) = &input.yolo {
        let yolo_cfg = YoloDecodeConfig::from(config.yolo);
        let [rows, cols] = yolo.shape;
        let owned = decode_yolo(&yolo.data, rows, cols, class_names.len(), &yolo_cfg)?;
        return Ok(Some(owned));
    }

    let (Some(boxes), Some(class_probs)) = (&input.boxes, &input.class_probs) else {
        return Ok(None);
    };
    let boxes: Vec<BBox> = boxes.iter().copied().map(BBox::from_array).collect();
    let mut owned = OwnedPredictions::from_rows(&boxes, class_probs)?;
    if let Some(objectness) = &input.objectness {
        owned = owned.with_objectness(objectness.clone())?;
    }
    if config.background_slot {
        owned = owned.with_background_slot()?;
    }
    Ok(Some(owned))
}

fn summarize(
    input: &ImageInput,
    detections: &Detections,
    class_names: &ClassNames,
) -> ImageSummary {
    let records = detections
        .items
        .iter()
        .map(|det| DetectionRecord {
            class_id: det.class_id,
            class_name: class_names
                .name(det.class_id)
                .map_or_else(|| format!("class_{}", det.class_id), str::to_owned),
            score: det.score,
            bbox: det.bbox.to_array(),
            bbox_pixels: input.size.map(|[w, h]| det.bbox.to_pixels(w, h)),
        })
        .collect();
    ImageSummary {
        image: input.image.clone(),
        source: detections.source.as_str(),
        detections: records,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("boxsift=info".parse()?))
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
    let mut config: Config = serde_json::from_str(&config_text)?;
    if config.input_path.is_empty() {
        return Err("input_path must be set in the config".into());
    }
    let class_names = match config.class_names.take() {
        Some(names) => ClassNames::new(names),
        None => ClassNames::waste(),
    };
    if class_names.is_empty() {
        return Err("class_names must not be empty".into());
    }

    let processor = PostProcessor::new(PostProcessConfig {
        nms: std::mem::take(&mut config.nms).into(),
        fallback: std::mem::take(&mut config.fallback).into(),
        parallel: config.parallel,
    })?;

    let input_text = fs::read_to_string(&config.input_path)?;
    let input: InputFile = serde_json::from_str(&input_text)?;

    let owned = input
        .images
        .iter()
        .map(|image| load_predictions(image, &config, &class_names))
        .collect::<Result<Vec<_>, _>>()?;
    let views: Vec<PredictionView<'_>> = owned
        .iter()
        .map(|pred| pred.as_ref().map_or_else(PredictionView::empty, OwnedPredictions::view))
        .collect();
    let results = processor.process_batch(&views);
    tracing::info!(images = results.len(), "post-processing finished");

    let summary: Vec<ImageSummary> = input
        .images
        .iter()
        .zip(&results)
        .map(|(image, detections)| summarize(image, detections, &class_names))
        .collect();
    let json = serde_json::to_string_pretty(&summary)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
