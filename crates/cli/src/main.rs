use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facecatalog_core::catalog::domain::catalog_store::CatalogStore;
use facecatalog_core::catalog::domain::shared_catalog::SharedCatalog;
use facecatalog_core::catalog::infrastructure::json_catalog_store::{
    catalog_path_in, default_catalog_path, JsonCatalogStore,
};
use facecatalog_core::corpus::domain::location_reader::LocationReader;
use facecatalog_core::corpus::infrastructure::exif_location_reader::ExifLocationReader;
use facecatalog_core::corpus::infrastructure::image_file_loader::ImageFileLoader;
use facecatalog_core::corpus::infrastructure::sniffing_image_classifier::SniffingImageClassifier;
use facecatalog_core::descriptor::similarity_comparator::{DistanceMetric, SimilarityComparator};
use facecatalog_core::detection::infrastructure::arcface_descriptor_source::ArcfaceDescriptorSource;
use facecatalog_core::detection::domain::face_detector::FaceDetector;
use facecatalog_core::detection::infrastructure::onnx_blazeface_detector::{
    self, OnnxBlazefaceDetector,
};
use facecatalog_core::detection::infrastructure::onnx_session::intra_threads_per_worker;
use facecatalog_core::detection::infrastructure::onnx_yolo_detector::{self, OnnxYoloDetector};
use facecatalog_core::pipeline::file_analyzer::FileAnalyzer;
use facecatalog_core::pipeline::infrastructure::threaded_ingestion_executor::ThreadedIngestionExecutor;
use facecatalog_core::pipeline::ingest_corpus_use_case::IngestCorpusUseCase;
use facecatalog_core::pipeline::ingestion_executor::{
    IngestionConfig, IngestionExecutor, SequentialIngestionExecutor,
};
use facecatalog_core::shared::constants::{
    BLAZEFACE_MODEL_NAME, DESCRIPTOR_MODEL_NAME, DESCRIPTOR_MODEL_URL, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};
use facecatalog_core::shared::model_resolver::{self, ModelSource};

/// Build a catalog of the distinct faces in a photo collection.
#[derive(Parser)]
#[command(name = "facecatalog")]
struct Cli {
    /// Ingest a single image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Ingest every image under a directory (recursive).
    #[arg(long)]
    path: Option<PathBuf>,

    /// Folder holding the catalog (default: platform data dir/FaceCatalog).
    #[arg(long)]
    app_folder: Option<PathBuf>,

    /// Leave out images the catalog already has faces from.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    skip_processed: bool,

    /// Distance metric for new catalogs: cosine or euclidean.
    #[arg(long, default_value = "cosine")]
    metric: String,

    /// Match threshold for new catalogs (default depends on the metric).
    #[arg(long)]
    threshold: Option<f64>,

    /// Face detector: yolo or blazeface.
    #[arg(long, default_value = "yolo")]
    detector: String,

    /// Face detection confidence threshold (0.0-1.0, default depends on the
    /// detector).
    #[arg(long)]
    confidence: Option<f64>,

    /// Parallel analysis workers (1 = sequential).
    #[arg(long, default_value = "1")]
    workers: usize,

    /// Do not read GPS locations from image metadata.
    #[arg(long)]
    no_location: bool,

    /// Directory searched for model files after the cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Face detector model file, bypassing model resolution.
    /// Required for blazeface unless the model is in the cache or
    /// --models-dir.
    #[arg(long)]
    detector_model: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let root = cli
        .image
        .clone()
        .or_else(|| cli.path.clone())
        .ok_or("One of --image or --path is required")?;

    let catalog_path = match &cli.app_folder {
        Some(folder) => catalog_path_in(folder),
        None => default_catalog_path()
            .ok_or("Could not determine the data directory; pass --app-folder")?,
    };
    let store = JsonCatalogStore::new(&catalog_path, requested_comparator(&cli)?);
    let catalog = store.load()?;
    warn_on_comparator_mismatch(&cli, catalog.comparator())?;

    let (detector_path, descriptor_path) = resolve_models(&cli)?;
    let executor = build_executor(&cli, detector_path, descriptor_path)?;

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rProcessing file {current}/{total}");
        true
    });
    let config = IngestionConfig {
        skip_already_processed: cli.skip_processed,
        on_progress: Some(progress),
        ..Default::default()
    };

    let shared = SharedCatalog::new(catalog);
    let mut use_case = IngestCorpusUseCase::new(executor, config);
    let stats = use_case.run(&root, &shared)?;
    eprintln!();

    let catalog = shared.into_inner();
    store.save(&catalog)?;
    log::info!("Catalog written to {}", catalog_path.display());

    println!("{stats}");
    println!("Catalog size:          {}", catalog.size());
    Ok(())
}

fn requested_comparator(cli: &Cli) -> Result<SimilarityComparator, Box<dyn std::error::Error>> {
    let metric = parse_metric(&cli.metric)?;
    Ok(SimilarityComparator::new(
        metric,
        cli.threshold.unwrap_or(metric.default_threshold()),
    ))
}

/// A stored catalog keeps the comparator it was built with; mixing
/// thresholds within one catalog would break its no-duplicates guarantee.
fn warn_on_comparator_mismatch(
    cli: &Cli,
    stored: &SimilarityComparator,
) -> Result<(), Box<dyn std::error::Error>> {
    let requested = requested_comparator(cli)?;
    if requested != *stored {
        log::warn!(
            "Catalog uses {} threshold {}; ignoring requested {} threshold {}",
            stored.metric(),
            stored.threshold(),
            requested.metric(),
            requested.threshold()
        );
    }
    Ok(())
}

fn resolve_models(cli: &Cli) -> Result<(PathBuf, PathBuf), Box<dyn std::error::Error>> {
    let bundled = cli.models_dir.as_deref();

    let detector_path = match &cli.detector_model {
        Some(path) => path.clone(),
        None => {
            let source = match parse_detector(&cli.detector)? {
                DetectorKind::Yolo => ModelSource {
                    name: YOLO_MODEL_NAME,
                    url: Some(YOLO_MODEL_URL),
                },
                DetectorKind::Blazeface => ModelSource {
                    name: BLAZEFACE_MODEL_NAME,
                    url: None,
                },
            };
            log::info!("Resolving model: {}", source.name);
            model_resolver::resolve(&source, bundled, Some(Box::new(download_progress)))?
        }
    };

    log::info!("Resolving model: {DESCRIPTOR_MODEL_NAME}");
    let descriptor_path = model_resolver::resolve(
        &ModelSource {
            name: DESCRIPTOR_MODEL_NAME,
            url: Some(DESCRIPTOR_MODEL_URL),
        },
        bundled,
        Some(Box::new(download_progress)),
    )?;

    Ok((detector_path, descriptor_path))
}

fn build_executor(
    cli: &Cli,
    detector_path: PathBuf,
    descriptor_path: PathBuf,
) -> Result<Box<dyn IngestionExecutor>, Box<dyn std::error::Error>> {
    let kind = parse_detector(&cli.detector)?;
    let confidence = cli.confidence.unwrap_or(kind.default_confidence());
    let read_location = !cli.no_location;
    let intra_threads = intra_threads_per_worker(cli.workers);

    if cli.workers <= 1 {
        let analyzer = build_analyzer(
            kind,
            &detector_path,
            &descriptor_path,
            confidence,
            read_location,
            intra_threads,
        )?;
        return Ok(Box::new(SequentialIngestionExecutor::new(analyzer)));
    }

    Ok(Box::new(ThreadedIngestionExecutor::new(
        cli.workers,
        Box::new(move || {
            build_analyzer(
                kind,
                &detector_path,
                &descriptor_path,
                confidence,
                read_location,
                intra_threads,
            )
        }),
    )))
}

fn build_analyzer(
    kind: DetectorKind,
    detector_path: &Path,
    descriptor_path: &Path,
    confidence: f64,
    read_location: bool,
    intra_threads: usize,
) -> Result<FileAnalyzer, Box<dyn std::error::Error>> {
    let location_reader: Option<Box<dyn LocationReader>> = if read_location {
        Some(Box::new(ExifLocationReader::new()))
    } else {
        None
    };
    Ok(FileAnalyzer::new(
        Box::new(SniffingImageClassifier::new()),
        Box::new(ImageFileLoader::new()),
        build_detector(kind, detector_path, confidence, intra_threads)?,
        Box::new(ArcfaceDescriptorSource::new(descriptor_path, intra_threads)?),
        location_reader,
    ))
}

fn build_detector(
    kind: DetectorKind,
    model_path: &Path,
    confidence: f64,
    intra_threads: usize,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let detector: Box<dyn FaceDetector> = match kind {
        DetectorKind::Yolo => Box::new(OnnxYoloDetector::new(
            model_path,
            confidence,
            intra_threads,
        )?),
        DetectorKind::Blazeface => Box::new(OnnxBlazefaceDetector::new(
            model_path,
            confidence,
            intra_threads,
        )?),
    };
    Ok(detector)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match (&cli.image, &cli.path) {
        (Some(_), Some(_)) => return Err("--image and --path are mutually exclusive".into()),
        (None, None) => return Err("One of --image or --path is required".into()),
        (Some(image), None) if !image.is_file() => {
            return Err(format!("Image file not found: {}", image.display()).into());
        }
        (None, Some(dir)) if !dir.is_dir() => {
            return Err(format!("Directory not found: {}", dir.display()).into());
        }
        _ => {}
    }
    parse_metric(&cli.metric)?;
    if let Some(threshold) = cli.threshold {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(format!(
                "Threshold must be a non-negative number, got {threshold}"
            )
            .into());
        }
    }
    parse_detector(&cli.detector)?;
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(
                format!("Confidence must be between 0.0 and 1.0, got {confidence}").into(),
            );
        }
    }
    if cli.workers == 0 {
        return Err("Workers must be at least 1".into());
    }
    if let Some(model) = &cli.detector_model {
        if !model.is_file() {
            return Err(format!("Detector model not found: {}", model.display()).into());
        }
    }
    Ok(())
}

fn parse_metric(metric: &str) -> Result<DistanceMetric, Box<dyn std::error::Error>> {
    match metric {
        "cosine" => Ok(DistanceMetric::Cosine),
        "euclidean" => Ok(DistanceMetric::Euclidean),
        other => {
            Err(format!("Metric must be 'cosine' or 'euclidean', got '{other}'").into())
        }
    }
}

#[derive(Clone, Copy)]
enum DetectorKind {
    Yolo,
    Blazeface,
}

impl DetectorKind {
    fn default_confidence(self) -> f64 {
        match self {
            DetectorKind::Yolo => onnx_yolo_detector::DEFAULT_CONFIDENCE,
            DetectorKind::Blazeface => onnx_blazeface_detector::DEFAULT_CONFIDENCE,
        }
    }
}

fn parse_detector(detector: &str) -> Result<DetectorKind, Box<dyn std::error::Error>> {
    match detector {
        "yolo" => Ok(DetectorKind::Yolo),
        "blazeface" => Ok(DetectorKind::Blazeface),
        other => {
            Err(format!("Detector must be 'yolo' or 'blazeface', got '{other}'").into())
        }
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
