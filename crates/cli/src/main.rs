use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use facematch_core::clustering::domain::face_clusterer::{describe, ClusterGroup};
use facematch_core::identity::domain::identity_store::IdentityStore;
use facematch_core::identity::infrastructure::json_file_repository::JsonFileRepository;
use facematch_core::matching::domain::attendance_matcher::MatchResult;
use facematch_core::perception::infrastructure::sidecar_face_analyzer::{
    sidecar_path, SidecarFaceAnalyzer,
};
use facematch_core::pipeline::cluster_faces_use_case::ClusterFacesUseCase;
use facematch_core::pipeline::face_engine::FaceEngine;
use facematch_core::pipeline::infrastructure::background_runner::BackgroundRunner;
use facematch_core::pipeline::register_identity_use_case::RegisterIdentityUseCase;
use facematch_core::pipeline::take_attendance_use_case::TakeAttendanceUseCase;
use facematch_core::pipeline::verify_faces_use_case::VerifyFacesUseCase;
use facematch_core::shared::engine_config::{default_registry_path, EngineConfig};

/// Face verification, attendance and clustering over exported face embeddings.
///
/// Images are read through their `<name>.faces.json` detection exports.
#[derive(Parser)]
#[command(name = "facematch")]
struct Cli {
    /// Registered identity store (JSON).
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Engine config file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register (or re-register) an identity from a single-face image.
    Register { label: String, image: PathBuf },

    /// Remove a registered identity.
    Remove { label: String },

    /// List registered identities.
    List,

    /// Check whether two images show the same person.
    Verify {
        first: PathBuf,
        second: PathBuf,

        /// Similarity threshold (-1.0 to 1.0).
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Match every face in a scene against the registry.
    Attendance {
        image: PathBuf,

        /// Similarity threshold (-1.0 to 1.0).
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Group faces from several images by person.
    Cluster {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Neighborhood radius in cosine distance (0.0-2.0).
        #[arg(long)]
        eps: Option<f64>,

        /// Neighbors (including itself) a face needs to seed a group.
        #[arg(long)]
        min_samples: Option<usize>,
    },
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
    let config = build_config(&cli)?;
    let registry_path = resolve_registry_path(cli.registry.as_deref())?;

    let store = Arc::new(IdentityStore::open(Box::new(JsonFileRepository::new(
        &registry_path,
    ))));
    let engine = Arc::new(FaceEngine::new(&config, store)?);

    match cli.command {
        Command::Register { label, image } => run_register(engine, &label, &image),
        Command::Remove { label } => run_remove(&engine, &label),
        Command::List => {
            run_list(&engine);
            Ok(())
        }
        Command::Verify { first, second, .. } => run_verify(engine, &first, &second),
        Command::Attendance { image, .. } => run_attendance(engine, &image),
        Command::Cluster { images, .. } => run_cluster(engine, &images),
    }
}

fn run_register(
    engine: Arc<FaceEngine>,
    label: &str,
    image: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    require_detections(image)?;
    let mut use_case = RegisterIdentityUseCase::new(Box::new(SidecarFaceAnalyzer::new()), engine);
    let identity = use_case.execute(label, image)?;
    println!("{} registered successfully", identity.label());
    Ok(())
}

fn run_remove(engine: &FaceEngine, label: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !engine.store().remove(label)? {
        return Err(format!("{label} is not registered").into());
    }
    println!("{label} removed");
    Ok(())
}

fn run_list(engine: &FaceEngine) {
    let identities = engine.store().lookup_all();
    for identity in identities.iter() {
        println!("{}", identity.label());
    }
    log::info!("{} registered identities", identities.len());
}

fn run_verify(
    engine: Arc<FaceEngine>,
    first: &Path,
    second: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    require_detections(first)?;
    require_detections(second)?;
    let mut use_case = VerifyFacesUseCase::new(Box::new(SidecarFaceAnalyzer::new()), engine);
    let result = use_case.execute(first, second)?;
    println!(
        "{} [faces {} / {}]",
        result.verification, result.first_index, result.second_index
    );
    Ok(())
}

fn run_attendance(engine: Arc<FaceEngine>, image: &Path) -> Result<(), Box<dyn std::error::Error>> {
    require_detections(image)?;
    let mut use_case = TakeAttendanceUseCase::new(Box::new(SidecarFaceAnalyzer::new()), engine);
    let (faces, report) = use_case.execute(image)?;

    for (i, (face, result)) in faces.iter().zip(&report.matches).enumerate() {
        let b = face.bbox();
        println!(
            "Face {i} [{}, {}, {}, {}]: {}",
            b.x1,
            b.y1,
            b.x2,
            b.y2,
            format_match(result)
        );
    }
    println!("Present: {}", report.present.join(", "));
    println!("Absent: {}", report.absent.join(", "));
    println!("Rate: {:.1}%", report.rate);
    Ok(())
}

fn run_cluster(engine: Arc<FaceEngine>, images: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    for image in images {
        require_detections(image)?;
    }
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rReading detections {current}/{total}");
        true
    });
    let mut use_case =
        ClusterFacesUseCase::new(Box::new(SidecarFaceAnalyzer::new()), engine, Some(progress));
    let mut handle = use_case.execute_in_background(images, &BackgroundRunner::default())?;
    eprintln!();

    let groups = loop {
        if let Some(result) = handle.wait_timeout(Duration::from_millis(250)) {
            break result?;
        }
        eprint!(".");
    };

    print_groups(&groups, images);
    println!("{}", describe(&groups));
    Ok(())
}

fn print_groups(groups: &[ClusterGroup], images: &[PathBuf]) {
    for group in groups {
        println!("Group {} ({} faces):", group.label + 1, group.len());
        for member in &group.members {
            let b = member.detection.bbox();
            println!(
                "  {}:{} [{}, {}, {}, {}]",
                images[member.image_index].display(),
                member.detection_index,
                b.x1,
                b.y1,
                b.x2,
                b.y2
            );
        }
    }
}

fn format_match(result: &MatchResult) -> String {
    match result {
        MatchResult::Matched { label, similarity } => format!("{label} ({similarity:.3})"),
        MatchResult::Unmatched {
            best_similarity: Some(s),
        } => format!("Unknown ({s:.3})"),
        MatchResult::Unmatched {
            best_similarity: None,
        } => "Unknown".to_string(),
    }
}

fn build_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match cli.config.as_deref() {
        Some(path) => EngineConfig::try_load(path)?,
        None => EngineConfig::default_path()
            .map(|path| EngineConfig::load(&path))
            .unwrap_or_default(),
    };

    match &cli.command {
        Command::Verify {
            threshold: Some(t), ..
        } => config.verify_threshold = *t,
        Command::Attendance {
            threshold: Some(t), ..
        } => config.match_threshold = *t,
        Command::Cluster {
            eps, min_samples, ..
        } => {
            if let Some(eps) = eps {
                config.cluster_eps = *eps;
            }
            if let Some(n) = min_samples {
                config.cluster_min_samples = *n;
            }
        }
        _ => {}
    }

    config.validate()?;
    Ok(config)
}

fn resolve_registry_path(explicit: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_registry_path()
            .ok_or_else(|| "Could not determine data directory; pass --registry".into()),
    }
}

fn require_detections(image: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = sidecar_path(image);
    if !path.exists() {
        return Err(format!(
            "No detections for {}: expected {}",
            image.display(),
            path.display()
        )
        .into());
    }
    Ok(())
}
