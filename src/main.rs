//! Scripted zoom demo: clusters a handful of markers, zooms in and back
//! out on a simulated clock, and logs every transition.
//!
//! ```text
//! RUST_LOG=debug map-cluster [options.toml]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use map_cluster::animation::TransitionScheduler;
use map_cluster::controller::{ClusterSpec, MapClusterController};
use map_cluster::geo::Coordinate;
use map_cluster::marker::MarkerId;
use map_cluster::options::Options;
use map_cluster::ClusterError;
use web_time::Instant;

const FRAME: Duration = Duration::from_millis(16);

const CITIES: [(f64, f64); 6] = [
    (52.520, 13.405),
    (52.400, 13.060),
    (53.551, 9.993),
    (53.080, 8.800),
    (48.137, 11.575),
    (48.400, 10.900),
];

fn main() {
    env_logger::init();

    let options = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match Options::load(&path) {
            Ok(options) => {
                log::info!("loaded options from {}", path.display());
                options
            }
            Err(e) => {
                log::error!("{}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    if let Err(e) = run(&options) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), ClusterError> {
    let start = Instant::now();
    let mut controller = MapClusterController::with_scheduler(
        options.animation.build_animator()?,
        TransitionScheduler::starting_at(start),
    );
    log::info!("animator: {}", controller.animator().name());

    let markers = CITIES
        .iter()
        .map(|&(lat, lon)| controller.add_marker(Coordinate::new(lat, lon)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut now = start;
    let steps: [(&str, Vec<Vec<MarkerId>>); 3] = [
        ("country", vec![markers.clone()]),
        (
            "regions",
            markers.chunks(2).map(<[MarkerId]>::to_vec).collect(),
        ),
        ("country", vec![markers.clone()]),
    ];
    for (label, groups) in steps {
        let specs = groups
            .into_iter()
            .filter_map(|members| {
                ClusterSpec::at_centroid(controller.markers(), members)
            })
            .collect();
        let diff = controller.apply_clustering(specs, now)?;
        log::info!(
            "zoom to {label}: {} added, {} removed, {} kept",
            diff.added.len(),
            diff.removed.len(),
            diff.kept.len()
        );

        let mut frames = 0_u32;
        loop {
            now += FRAME;
            frames += 1;
            if !controller.update(now) {
                break;
            }
        }
        log::info!(
            "settled after {frames} frames, {} views on the map",
            controller.map_view().len()
        );
        for view in controller.map_view().iter() {
            log::debug!(
                "  {} {} {} alpha {:.2}",
                view.id(),
                view.marker(),
                view.state(),
                view.alpha()
            );
        }
    }
    Ok(())
}
