use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, Sender, select, tick, unbounded};
use env_logger::Env;
use log::{debug, info, warn};
use nalgebra::{Vector3, Vector4};
use notify::Watcher;
use strum::IntoEnumIterator;

use projective::{
    expr::{Polynomial, Var, parse},
    mesh::{Mesh, Settings, ThreadPool},
    rebuild::{Rebuilder, Submit},
};

/// Polynomial surfaces in real projective space
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prints the intermediate forms of a polynomial
    Show {
        /// Polynomial in `x`, `y`, `z` (and optionally `w`)
        expr: String,
    },

    /// Evaluates a polynomial and its gradient at a homogeneous point
    Eval {
        /// Polynomial in `x`, `y`, `z` (and optionally `w`)
        expr: String,

        #[clap(allow_negative_numbers = true)]
        x: f64,
        #[clap(allow_negative_numbers = true)]
        y: f64,
        #[clap(allow_negative_numbers = true)]
        z: f64,
        #[clap(allow_negative_numbers = true)]
        w: f64,
    },

    /// Meshes a polynomial across all four patches
    Mesh {
        /// Polynomial in `x`, `y`, `z` (and optionally `w`)
        expr: String,

        #[clap(flatten)]
        settings: MeshSettings,

        /// Number of times to mesh (for benchmarking)
        #[clap(short = 'N', default_value_t = 1)]
        n: usize,
    },

    /// Watches a text file, remeshing whenever its polynomial changes
    Watch {
        /// File containing a polynomial
        target: PathBuf,

        #[clap(flatten)]
        settings: MeshSettings,
    },
}

#[derive(Parser)]
struct MeshSettings {
    /// Subdivision depth
    #[clap(short, long, default_value_t = 6)]
    depth: u8,

    /// Subdivisions per axis at the top level
    #[clap(long, default_value_t = 2)]
    initial_branch: u8,

    /// Subdivisions per axis below the top level
    #[clap(long, default_value_t = 2)]
    branch: u8,

    /// Number of threads to use
    ///
    /// Uses the global pool if omitted; `0` meshes patches one at a time on
    /// the calling thread.
    #[clap(short, long)]
    threads: Option<usize>,

    /// Lower corner of the sampling box, as `x,y,z`
    #[clap(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_value = "-1,-1,-1"
    )]
    min: Vec<f64>,

    /// Upper corner of the sampling box, as `x,y,z`
    #[clap(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_value = "1,1,1"
    )]
    max: Vec<f64>,

    /// Name of a `.stl` file to write
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Collect cell outlines along with the mesh
    #[clap(long)]
    debug_lines: bool,
}

impl MeshSettings {
    fn pool(&self) -> Result<Option<ThreadPool>> {
        Ok(match self.threads {
            None => Some(ThreadPool::Global),
            Some(0) => None,
            Some(n) => Some(ThreadPool::Custom(
                rayon::ThreadPoolBuilder::new().num_threads(n).build()?,
            )),
        })
    }

    fn settings<'a>(
        &self,
        threads: Option<&'a ThreadPool>,
    ) -> Result<Settings<'a>> {
        let corner = |name: &str, v: &[f64]| -> Result<Vector3<f64>> {
            ensure!(v.len() == 3, "--{name} needs 3 values, got {}", v.len());
            Ok(Vector3::from_column_slice(v))
        };
        let settings = Settings {
            depth: self.depth,
            initial_branch_factor: self.initial_branch,
            branch_factor: self.branch,
            min: corner("min", &self.min)?,
            max: corner("max", &self.max)?,
            threads,
            debug_lines: self.debug_lines,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn run_show(text: &str) -> Result<()> {
    let e = parse(text)?;
    println!("parsed:      {e}");
    let (h, degree) = e.homogenize()?;
    println!("homogenized: {h}");
    println!("degree:      {degree}");

    let poly = Polynomial::from_expr(&e)?;
    println!("simplified:  {}", poly.expr());
    for v in Var::iter() {
        println!("  d/d{v}: {}", poly.partial(v));
    }
    Ok(())
}

fn run_eval(text: &str, p: Vector4<f64>) -> Result<()> {
    let poly = Polynomial::new(text)?;
    println!("value:    {}", poly.eval_at(p));
    let g = poly.grad(p);
    println!("gradient: ({}, {}, {}, {})", g.x, g.y, g.z, g.w);
    Ok(())
}

fn report(mesh: &Mesh) {
    info!(
        "mesh has {} triangles ({} debug lines)",
        mesh.triangle_count(),
        mesh.debug.vertices.len() / 2
    );
}

fn save(mesh: &Mesh, out: &Path) -> Result<()> {
    let mut handle = std::fs::File::create(out)
        .with_context(|| format!("could not create {out:?}"))?;
    mesh.write_stl(&mut handle)?;
    info!("wrote {out:?}");
    Ok(())
}

fn run_mesh(text: &str, settings: &MeshSettings, n: usize) -> Result<()> {
    let start = Instant::now();
    let poly = Polynomial::new(text)?;
    info!("built polynomial (degree {}) in {:?}", poly.degree(), start.elapsed());

    let pool = settings.pool()?;
    let cfg = settings.settings(pool.as_ref())?;
    let start = Instant::now();
    let mut mesh = Mesh::new();
    for _ in 0..n {
        mesh = Mesh::build(&poly, &cfg)?;
    }
    info!(
        "meshed {n}x at {:?} ms/mesh",
        start.elapsed().as_micros() as f64 / 1000.0 / (n.max(1) as f64)
    );
    report(&mesh);
    if let Some(out) = &settings.out {
        save(&mesh, out)?;
    }
    Ok(())
}

/// Reads the polynomial text from a file, retrying while it's mid-write
///
/// Gives up at once if the file is gone, or after a few failed attempts.
fn read_text(path: &Path) -> std::io::Result<String> {
    const RETRIES: usize = 10;
    let mut attempt = 0;
    loop {
        match std::fs::read_to_string(path) {
            Ok(s) => return Ok(s.trim().to_owned()),
            Err(e)
                if e.kind() == ErrorKind::NotFound || attempt == RETRIES =>
            {
                return Err(e);
            }
            Err(e) => {
                debug!("could not read {path:?}: {e}; retrying");
                attempt += 1;
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

/// Forwards the file's text whenever a change notification leaves it
/// different from the last text sent
fn reader_thread(
    path: &Path,
    changed: Receiver<()>,
    texts: Sender<String>,
) -> Result<()> {
    let mut last = read_text(path)
        .with_context(|| format!("could not read {path:?}"))?;
    texts.send(last.clone())?;
    while changed.recv().is_ok() {
        let text = match read_text(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("could not read {path:?}: {e}; waiting for a change");
                continue;
            }
        };
        if text != last {
            debug!("{path:?} now contains {text:?}");
            texts.send(text.clone())?;
            last = text;
        }
    }
    Ok(())
}

fn run_watch(target: &Path, settings: &MeshSettings) -> Result<()> {
    // The rebuilder's worker threads outlive any borrow we could hand them,
    // and the pool lives until the process exits anyway
    let pool = settings.pool()?.map(|p| {
        let p: &'static ThreadPool = Box::leak(Box::new(p));
        p
    });
    let mut rebuilder = Rebuilder::new(settings.settings(pool)?);

    // `notify` events wake the reader thread, which sends new text to this
    // thread; this thread owns the rebuilder
    let (changed_tx, changed_rx) = unbounded();
    let (text_tx, text_rx) = unbounded();

    let path = target.to_owned();
    std::thread::spawn(move || {
        if let Err(e) = reader_thread(&path, changed_rx, text_tx) {
            warn!("reader thread failed: {e}");
        }
    });

    let mut watcher = notify::recommended_watcher(
        move |event: notify::Result<notify::Event>| match event {
            Ok(_) => {
                let _ = changed_tx.send(());
            }
            Err(e) => warn!("watch error: {e}"),
        },
    )?;
    watcher.watch(target, notify::RecursiveMode::NonRecursive)?;

    // Text which arrived while a build was running
    let mut pending: Option<String> = None;
    let ticker = tick(Duration::from_millis(50));
    loop {
        select! {
            recv(text_rx) -> msg => {
                let Ok(text) = msg else {
                    info!("reader thread is gone; exiting");
                    return Ok(());
                };
                match rebuilder.submit(&text) {
                    Ok(Submit::Started) => info!("rebuilding {text:?}"),
                    Ok(Submit::Busy) => pending = Some(text),
                    Err(e) => warn!("keeping current surface: {e}"),
                }
            }
            recv(ticker) -> _ => {
                match rebuilder.poll() {
                    Some(Ok(())) => {
                        if let Some(s) = rebuilder.active() {
                            report(s.mesh());
                            if let Some(out) = &settings.out {
                                save(s.mesh(), out)?;
                            }
                        }
                    }
                    Some(Err(e)) => warn!("rebuild failed: {e}"),
                    None => (),
                }
                if !rebuilder.is_building() {
                    if let Some(text) = pending.take() {
                        if let Ok(Submit::Started) = rebuilder.submit(&text) {
                            info!("rebuilding {text:?}");
                        }
                    }
                }
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();
    let args = Args::parse();

    match args.cmd {
        Command::Show { expr } => run_show(&expr),
        Command::Eval { expr, x, y, z, w } => {
            run_eval(&expr, Vector4::new(x, y, z, w))
        }
        Command::Mesh { expr, settings, n } => run_mesh(&expr, &settings, n),
        Command::Watch { target, settings } => run_watch(&target, &settings),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mesh_settings(args: &[&str]) -> MeshSettings {
        let args = ["projective-cli", "mesh", "x"]
            .into_iter()
            .chain(args.iter().copied());
        match Args::try_parse_from(args).unwrap().cmd {
            Command::Mesh { settings, .. } => settings,
            _ => panic!("expected the mesh command"),
        }
    }

    #[test]
    fn test_default_bounds() {
        let s = mesh_settings(&[]);
        let cfg = s.settings(None).unwrap();
        assert_eq!(cfg.min, Vector3::repeat(-1.0));
        assert_eq!(cfg.max, Vector3::repeat(1.0));
        assert_eq!(cfg.depth, 6);
    }

    #[test]
    fn test_custom_bounds() {
        let s = mesh_settings(&["--min", "-2,-2.5,-3", "--max", "2,1,0.5"]);
        let cfg = s.settings(None).unwrap();
        assert_eq!(cfg.min, Vector3::new(-2.0, -2.5, -3.0));
        assert_eq!(cfg.max, Vector3::new(2.0, 1.0, 0.5));

        let s = mesh_settings(&["--min", "-2,-2"]);
        assert!(s.settings(None).is_err());

        // Empty boxes are rejected
        let s = mesh_settings(&["--min", "1,1,1"]);
        assert!(s.settings(None).is_err());
    }

    #[test]
    fn test_read_missing_file() {
        let path = std::env::temp_dir().join("projective-cli-missing.txt");
        let _ = std::fs::remove_file(&path);
        let start = Instant::now();
        let err = read_text(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_read_text() {
        let path = std::env::temp_dir()
            .join(format!("projective-cli-{}.txt", std::process::id()));
        std::fs::write(&path, "  x^2 + y^2 - 1\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "x^2 + y^2 - 1");
        std::fs::remove_file(&path).unwrap();
    }
}
