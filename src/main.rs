use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use opencv::core::Mat;
use pose_coach::{
    analysis::Analyzer,
    annotate::{annotate, write_image},
    config::AnalysisConfig,
    consensus::ClassOutcome,
    landmark::LandmarkSet,
    library::{ReferenceDirectory, ReferenceLibrary},
    provider::{Image, LandmarkProvider, Origin},
    report::{build_report, similarity_percentage},
    sidecar::SidecarProvider,
    video::VideoFrames,
};
use std::{
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::sync_channel,
        Arc,
    },
};
use structopt::StructOpt;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;

/// URL prefix the saved user frames are served from.
const USER_IMAGE_PREFIX: &str = "/user_pose_data";

/// A decoded frame kept alive for as long as some pose class refers to it.
#[derive(Clone)]
struct CapturedFrame {
    image: Rc<Mat>,
    landmarks: Option<LandmarkSet>,
}

#[derive(structopt::StructOpt)]
struct Opt {
    /// The recorded bowling video to analyse.
    video: PathBuf,

    /// Identifier of the user, used to name the output directory.
    user_id: String,

    /// Directory holding the pose{class}-{variant}.jpg reference images.
    #[structopt(short, long, default_value = "professional_poses")]
    references: PathBuf,

    /// Directory the selected user frames are written under.
    #[structopt(short, long, default_value = "user_pose_data")]
    output: PathBuf,

    /// JSON-lines landmark track of the video. Defaults to <video>.landmarks.jsonl.
    #[structopt(long)]
    landmarks: Option<PathBuf>,

    #[structopt(flatten)]
    analysis: AnalysisConfig,

    /// Decoded frames buffered ahead of the analysis.
    #[structopt(short, long, default_value = "64")]
    queue_size: usize,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short = "p", long)]
    show_progress: bool,

    /// Draw the detected skeleton on the saved frames.
    #[structopt(short, long)]
    annotate: bool,
}

fn progress_bar(frames: Option<u64>) -> ProgressBar {
    match frames {
        Some(frames) => ProgressBar::new(frames).with_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} frames {msg}"),
        ),
        None => ProgressBar::new_spinner().with_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                .template("{prefix:.bold.dim} {spinner} {pos} frames {wide_msg}"),
        ),
    }
}

/// Write the frame selected for `outcome` and return its public URL.
fn save_selected(
    outcome: &ClassOutcome<CapturedFrame>,
    dir: &Path,
    url_prefix: &str,
    timestamp: &str,
    annotated: bool,
) -> Option<String> {
    let selected = outcome.selected.as_ref()?;
    let file_name = format!("user_pose_{}_{}.jpg", outcome.class, timestamp);
    let path = dir.join(&file_name);

    let written = match (annotated, selected.frame.landmarks.as_ref()) {
        (true, Some(landmarks)) => {
            let label = format!(
                "pose {}: {}",
                outcome.class,
                similarity_percentage(selected.score())
            );
            annotate(&selected.frame.image, landmarks, &label)
                .and_then(|image| write_image(&path, &image))
        }
        _ => write_image(&path, &selected.frame.image),
    };

    match written {
        Ok(()) => {
            info!(message = "saved user frame", class = %outcome.class, ?path);
            Some(format!("{}/{}", url_prefix, file_name))
        }
        Err(error) => {
            error!(message = "failed to save user frame", class = %outcome.class, ?path, %error);
            None
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(opt.log_level),
    )?;

    let library = ReferenceLibrary::load(
        &ReferenceDirectory::new(&opt.references),
        SidecarProvider::new(),
    )
    .with_context(|| format!("failed loading reference poses from {:?}", opt.references))?;

    let track = opt
        .landmarks
        .clone()
        .unwrap_or_else(|| SidecarProvider::track_path(&opt.video));
    let mut provider = SidecarProvider::from_track(&track)
        .with_context(|| format!("failed loading landmark track {:?}", track))?;

    let frames = VideoFrames::open(&opt.video).context("failed opening video")?;
    let video_path = frames.path().to_path_buf();
    let pb = if opt.show_progress {
        Some(progress_bar(frames.frame_count()?))
    } else {
        None
    };

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let run_name = format!("{}_{}", opt.user_id, timestamp);
    let save_dir = opt.output.join(&run_name);
    fs::create_dir_all(&save_dir)
        .with_context(|| format!("failed creating output directory {:?}", save_dir))?;

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrl_c = running.clone();

    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    let mut analyzer = Analyzer::new(&library, opt.analysis).context("failed constructing analyzer")?;
    let (frames_tx, frames_rx) = sync_channel(opt.queue_size);

    crossbeam::thread::scope(|scope| {
        let running_read = running.clone();
        let reader = scope.spawn(move |_| {
            for frame in frames {
                if !running_read.load(Ordering::SeqCst) {
                    info!("interrupted, stopping decode");
                    break;
                }
                let failed = frame.is_err();
                if frames_tx.send(frame).is_err() || failed {
                    break;
                }
            }
        });

        for frame in frames_rx {
            let (index, mat) = match frame {
                Ok(frame) => frame,
                Err(error) => {
                    error!(
                        message = "failed decoding video, reporting the frames read so far",
                        path = ?video_path,
                        frames = analyzer.stats().frames,
                        %error,
                    );
                    break;
                }
            };
            let landmarks = match provider.detect(&Image {
                mat: &mat,
                origin: Origin::VideoFrame(index),
            }) {
                Ok(landmarks) => landmarks,
                Err(error) => {
                    warn!(message = "landmark detection failed", index, %error);
                    None
                }
            };
            let captured = CapturedFrame {
                image: Rc::new(mat),
                landmarks,
            };
            analyzer.process(&captured, captured.landmarks.as_ref());

            if let Some(pb) = pb.as_ref() {
                pb.inc(1);
            }
        }

        reader
            .join()
            .map_err(|_| anyhow!("frame reader thread panicked"))
    })
    .map_err(|_| anyhow!("frame reader scope panicked"))??;

    if let Some(pb) = pb.as_ref() {
        pb.finish_and_clear();
    }

    let analysis = analyzer.finish();
    let url_prefix = format!("{}/{}", USER_IMAGE_PREFIX, run_name);
    let report = build_report(&analysis.outcomes, |outcome| {
        save_selected(outcome, &save_dir, &url_prefix, &timestamp, opt.annotate)
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed serializing report")?
    );
    Ok(())
}
