//! Headless orrery: a sun, a planet, a moon, and a camera circling them.
//!
//! Every frame the planet is swung around the sun, the moon spins on its own
//! axis, and the camera orbits the planet while looking at it. All nodes are
//! drawn into a [`DrawQueue`] and the world poses are logged.
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --frames 8 --radius 12
//! ```

use clap::Parser;
use log::info;

use pivot::{DrawQueue, NodeHooks, SceneGraph, TransformError, TransformNode, Trs, Vec3};

/// Pivot transform hierarchy demo
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 4)]
    frames: u32,

    /// Camera orbit radius around the planet.
    #[arg(long, default_value_t = 8.0)]
    radius: f32,

    /// Degrees advanced per frame.
    #[arg(long, default_value_t = 15.0)]
    speed: f32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), TransformError> {
    let mut graph = SceneGraph::new();

    let sun = graph.spawn_with(Trs::new().uniform_scale(2.0));
    let planet = graph.spawn_child(sun, Trs::from_position(Vec3::new(10.0, 0.0, 0.0)))?;
    let moon = graph.insert(TransformNode::new().with_hooks(
        NodeHooks::new().on_orientation_changed(|q| log::debug!("moon orientation {:?}", q)),
    ));
    graph.set_parent(moon, planet, false)?;
    graph.node_mut(moon)?.set_position(Vec3::new(0.0, 0.0, 2.0));
    let camera = graph.spawn();

    let mut queue = DrawQueue::new();
    for frame in 0..cli.frames {
        let angle = cli.speed * frame as f32;

        let sun_position = graph.global_position(sun)?;
        graph.rotate_around_by_degrees(planet, cli.speed, Vec3::Y, sun_position)?;
        graph.node_mut(moon)?.pan(cli.speed * 2.0);
        graph.orbit_node(camera, angle, 20.0, cli.radius, planet)?;

        for id in [sun, planet, moon, camera] {
            graph.draw(id, &mut queue)?;
        }

        info!(
            "frame {frame}: planet {:?} moon {:?} camera {:?} facing {:?}",
            graph.global_position(planet)?,
            graph.global_position(moon)?,
            graph.global_position(camera)?,
            graph.node(camera)?.look_at_dir(),
        );
        info!("frame {frame}: {} draw instances", queue.instances().len());
        queue.clear_queue();
    }
    Ok(())
}
