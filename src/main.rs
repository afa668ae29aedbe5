use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use engine::prelude::*;

pub const APP_NAME: &str = "fogview";

#[derive(Parser, Debug)]
#[command(version, about = "Run fog of war updates and print the map")]
struct Args {
    #[arg(long, help = "IDM fog config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "ASCII obstacle map, '#' blocks sight")]
    map: Option<PathBuf>,

    #[arg(long, help = "Grid width, defaults to map or config width")]
    width: Option<i32>,

    #[arg(long, help = "Grid height, defaults to map or config height")]
    height: Option<i32>,

    #[arg(long, help = "World units per cell")]
    cell_size: Option<f32>,

    #[arg(
        long = "source",
        value_name = "X,Y,R[,OWNER]",
        help = "Vision source in world units, can be repeated"
    )]
    sources: Vec<VisionSource>,

    #[arg(long, help = "Owner whose view is shown")]
    owner: Option<u32>,

    #[arg(long, default_value_t = 1, help = "Number of updates to run")]
    ticks: u32,

    #[arg(
        long,
        value_name = "DX,DY",
        value_parser = parse_step,
        help = "Move every source by this much between updates"
    )]
    step: Option<Vec2>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More logging")]
    verbose: u8,
}

fn parse_step(s: &str) -> Result<Vec2> {
    let Ok((v, _)) = util::parse::values::<f32>(s, ',') else {
        bail!("bad step {s:?}");
    };
    match v[..] {
        [x, y] if x.is_finite() && y.is_finite() => Ok(vec2(x, y)),
        _ => bail!("bad step {s:?}, expected dx,dy"),
    }
}

fn start_logger(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{APP_NAME} {} {}] {message}",
                record.level(),
                record.target()
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn load_map(path: &Path) -> Result<ObstacleMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("can't read map {}", path.display()))?;
    ObstacleMap::from_ascii(&text)
        .with_context(|| format!("bad map {}", path.display()))
}

/// Fog map with obstacles drawn over the cell states.
fn render(coordinator: &VisibilityCoordinator) -> String {
    let grid = coordinator.grid();
    let mut ret = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let p = ivec2(x, y);
            if coordinator.obstacles().is_some_and(|o| o.is_obstacle(p)) {
                ret.push('#');
            } else {
                ret.push(coordinator.state(p).to_char());
            }
        }
        ret.push('\n');
    }
    ret
}

fn main() -> Result<()> {
    let args = Args::parse();
    start_logger(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => FogConfig::load(path)?,
        None => FogConfig::default(),
    };

    let obstacles = args.map.as_deref().map(load_map).transpose()?;
    if let Some(obstacles) = &obstacles {
        config.width = obstacles.width();
        config.height = obstacles.height();
    }

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(cell_size) = args.cell_size {
        config.cell_size = cell_size;
    }
    if let Some(owner) = args.owner {
        config.local_owner = OwnerId(owner);
    }

    let mut coordinator = VisibilityCoordinator::new(&config)?;
    if let Some(obstacles) = obstacles {
        coordinator = coordinator.with_obstacles(obstacles)?;
    }

    let sources: Vec<_> =
        args.sources.into_iter().map(VisionSource::shared).collect();
    for source in &sources {
        coordinator.register_source(source);
    }
    log::info!("{} sources, local owner {}", sources.len(), config.local_owner);

    for i in 0..args.ticks {
        if let Some(step) = args.step.filter(|_| i > 0) {
            for source in &sources {
                source.borrow_mut().position += step;
            }
        }
        coordinator.force_update();
    }

    print!("{}", render(&coordinator));
    let census = coordinator.grid().census();
    println!(
        "visible {}, explored {}, unexplored {}",
        census.visible, census.explored, census.unexplored
    );

    Ok(())
}
