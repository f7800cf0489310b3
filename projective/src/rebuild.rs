//! Background replacement of the active surface
//!
//! Building a mesh is far too slow to do between frames of an interactive
//! viewer.  A [`Rebuilder`] owns the surface currently being shown and runs
//! the full pipeline (parse, homogenize, differentiate, mesh) for its
//! replacement on a worker thread.  The front-end keeps drawing the old
//! surface and calls [`Rebuilder::poll`] once per frame; the new surface is
//! swapped in the first time `poll` sees that the worker is done.
//!
//! ```
//! use projective::{mesh::Settings, rebuild::{Rebuilder, Submit}};
//!
//! let mut r = Rebuilder::new(Settings { depth: 3, ..Default::default() });
//! assert!(r.active().is_none());
//!
//! // Bad text is rejected up front, without starting a build
//! assert!(r.submit("x + ").is_err());
//!
//! assert_eq!(r.submit("x^2 + y^2 + z^2 - 1")?, Submit::Started);
//! r.wait().unwrap()?;
//! assert_eq!(r.active().unwrap().text(), "x^2 + y^2 + z^2 - 1");
//! # Ok::<(), projective::Error>(())
//! ```
use crate::{
    Error,
    expr::{Polynomial, parse},
    mesh::{Mesh, Settings},
};
use log::{info, warn};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::JoinHandle,
};

/// A polynomial, the text it came from, and its mesh
#[derive(Clone, Debug)]
pub struct Surface {
    text: String,
    poly: Polynomial,
    mesh: Mesh,
}

impl Surface {
    /// Runs the whole pipeline on the calling thread
    pub fn build(text: &str, settings: &Settings) -> Result<Self, Error> {
        let poly = Polynomial::new(text)?;
        let mesh = Mesh::build(&poly, settings)?;
        Ok(Self {
            text: text.to_owned(),
            poly,
            mesh,
        })
    }

    /// Returns the text that this surface was built from
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the surface's polynomial
    pub fn poly(&self) -> &Polynomial {
        &self.poly
    }

    /// Returns the surface's mesh
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

/// Shared state between the front-end and the worker thread
enum State {
    Idle,
    Building,
    Ready(Result<Surface, Error>),
}

/// Observable state of a [`Rebuilder`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// No build is outstanding
    Idle,
    /// A worker thread is building a new surface
    Building,
    /// A new surface (or error) is waiting to be picked up by `poll`
    Ready,
}

/// Result of [`Rebuilder::submit`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Submit {
    /// A worker thread was started
    Started,
    /// A build is already outstanding, so the text was ignored
    Busy,
}

/// Owner of the active surface and its (at most one) pending replacement
pub struct Rebuilder {
    settings: Settings<'static>,
    state: Arc<Mutex<State>>,
    worker: Option<JoinHandle<()>>,
    active: Option<Surface>,
}

impl Rebuilder {
    /// Builds a rebuilder with no active surface
    pub fn new(settings: Settings<'static>) -> Self {
        Self {
            settings,
            state: Arc::new(Mutex::new(State::Idle)),
            worker: None,
            active: None,
        }
    }

    /// Builds a rebuilder with an initial surface, built on this thread
    pub fn with_surface(
        text: &str,
        settings: Settings<'static>,
    ) -> Result<Self, Error> {
        let mut out = Self::new(settings);
        out.active = Some(Surface::build(text, &out.settings)?);
        Ok(out)
    }

    /// Returns the surface currently being shown
    pub fn active(&self) -> Option<&Surface> {
        self.active.as_ref()
    }

    /// Returns the settings used for every build
    pub fn settings(&self) -> &Settings<'static> {
        &self.settings
    }

    /// Returns the current state of the background build
    pub fn status(&self) -> Status {
        match *self.lock() {
            State::Idle => Status::Idle,
            State::Building => Status::Building,
            State::Ready(..) => Status::Ready,
        }
    }

    /// Checks whether a build is outstanding (running or not yet polled)
    pub fn is_building(&self) -> bool {
        self.worker.is_some()
    }

    /// Starts building a replacement surface from the given text
    ///
    /// The text is parsed and homogenized on the calling thread; if that
    /// fails, the error is returned and nothing changes.  Otherwise, if a
    /// build is already outstanding, the text is dropped and
    /// [`Submit::Busy`] is returned.  Derivatives and meshing happen on the
    /// worker thread.
    pub fn submit(&mut self, text: &str) -> Result<Submit, Error> {
        parse(text)
            .and_then(|e| e.homogenize())
            .inspect_err(|e| warn!("rejected {text:?}: {e}"))?;
        if self.is_building() {
            return Ok(Submit::Busy);
        }
        *self.lock() = State::Building;

        let text = text.to_owned();
        let state = self.state.clone();
        let settings = self.settings;
        self.worker = Some(std::thread::spawn(move || {
            let out = Surface::build(&text, &settings);
            *state.lock().unwrap_or_else(PoisonError::into_inner) =
                State::Ready(out);
        }));
        Ok(Submit::Started)
    }

    /// Swaps in a finished surface, if there is one
    ///
    /// Returns `None` if no build has finished since the last call.  If a
    /// build failed, its error is returned and the active surface is kept.
    pub fn poll(&mut self) -> Option<Result<(), Error>> {
        if !self.worker.as_ref().is_some_and(|h| h.is_finished()) {
            return None;
        }
        let handle = self.worker.take()?;
        Some(self.finish(handle))
    }

    /// Blocks until the outstanding build is done, then swaps it in
    ///
    /// Returns `None` if there was no outstanding build.
    pub fn wait(&mut self) -> Option<Result<(), Error>> {
        let handle = self.worker.take()?;
        Some(self.finish(handle))
    }

    fn finish(&mut self, handle: JoinHandle<()>) -> Result<(), Error> {
        let joined = handle.join();
        let state = std::mem::replace(&mut *self.lock(), State::Idle);
        match (joined, state) {
            (Ok(()), State::Ready(Ok(s))) => {
                info!("swapped in {:?}", s.text);
                self.active = Some(s);
                Ok(())
            }
            (Ok(()), State::Ready(Err(e))) => {
                warn!("rebuild failed: {e}");
                Err(e)
            }
            (Err(p), _) => {
                let msg = p
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| p.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "worker panicked".to_owned());
                Err(Error::RebuildFailed(msg))
            }
            (Ok(()), _) => Err(Error::RebuildFailed(
                "worker exited without a result".to_owned(),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
