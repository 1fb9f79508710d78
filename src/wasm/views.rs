use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::DVec2;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use super::audio::WebAudioOutput;
use super::canvas::CanvasSurface;
use super::events::EventListener;
use super::render::FrameLoop;
use super::speech;
use crate::config::{DemoConfig, GridParams};
use crate::grid::GridBackground;
use crate::playback::{AudioPipeline, PlayOutcome, PlaybackState};
use crate::surface::Viewport;
use crate::waveform::WaveformRenderer;

type Pipeline = AudioPipeline<WebAudioOutput>;

/// DOM nodes the demo player binds to.
pub struct PlayerElements {
    pub canvas: HtmlCanvasElement,
    pub button: HtmlElement,
    pub readout: Option<HtmlElement>,
    pub status: Option<HtmlElement>,
}

/// Demo player: waveform canvas, play/pause button and time-code readout.
/// Dropping it stops playback and closes the audio context.
pub struct PlayerView {
    pipeline: Rc<RefCell<Pipeline>>,
    config: Rc<DemoConfig>,
    _frame: FrameLoop,
    _listeners: Vec<EventListener>,
}

impl PlayerView {
    pub fn mount(elements: PlayerElements, config: Rc<DemoConfig>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let pipeline = Rc::new(RefCell::new(AudioPipeline::new(WebAudioOutput::new(
            config.analyser,
        ))));

        let surface = Rc::new(RefCell::new(CanvasSurface::new(elements.canvas)?));
        surface.borrow_mut().fit_to_element()?;

        let press = {
            let pipeline = Rc::downgrade(&pipeline);
            let config = config.clone();
            EventListener::new(&elements.button, "click", move |_| {
                if let Some(pipeline) = pipeline.upgrade() {
                    press(&pipeline, &config);
                }
            })?
        };

        let resize = {
            let surface = surface.clone();
            EventListener::new(&window, "resize", move |_| {
                if let Err(e) = surface.borrow_mut().fit_to_element() {
                    log::warn!("waveform resize failed: {:?}", e);
                }
            })?
        };

        let frame = {
            let pipeline = Rc::downgrade(&pipeline);
            let mut renderer = WaveformRenderer::new(config.waveform.clone());
            let mut labels = Labels::new(elements.button, elements.readout, elements.status);
            FrameLoop::start(move |_| {
                let Some(shared) = pipeline.upgrade() else {
                    return;
                };
                let mut pipeline = shared.borrow_mut();
                renderer.frame(&mut *pipeline, &mut *surface.borrow_mut());
                labels.update(&pipeline, &renderer);
            })?
        };

        log::info!("demo player mounted");
        Ok(Self {
            pipeline,
            config,
            _frame: frame,
            _listeners: vec![press, resize],
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.pipeline.borrow().state()
    }

    pub fn can_retry(&self) -> bool {
        self.pipeline.borrow().can_retry()
    }

    /// Whether a press has created the audio context yet.
    pub fn audio_unlocked(&self) -> bool {
        self.pipeline.borrow().output().is_unlocked()
    }

    /// Same as pressing the button.
    pub fn press(&self) {
        press(&self.pipeline, &self.config);
    }

    /// Discard the cached audio so the next play fetches it again.
    pub fn regenerate(&self) {
        self.pipeline.borrow_mut().reset();
    }
}

fn press(pipeline: &Rc<RefCell<Pipeline>>, config: &Rc<DemoConfig>) {
    let mut guard = pipeline.borrow_mut();
    // Still inside the click handler: Safari only lets a context start here.
    if guard.can_retry() && guard.state() != PlaybackState::Playing {
        guard.output_mut().unlock();
    }
    let outcome = guard.toggle();
    drop(guard);
    log::debug!("play button: {:?}", outcome);
    if let PlayOutcome::Loading(ticket) = outcome {
        // Weak so an unmounted player is not kept alive by the request.
        let pipeline: Weak<RefCell<Pipeline>> = Rc::downgrade(pipeline);
        let config = config.clone();
        spawn_local(async move {
            let result = speech::acquire(&config).await;
            match pipeline.upgrade() {
                Some(pipeline) => {
                    pipeline.borrow_mut().complete_synthesis(ticket, result);
                }
                None => log::debug!("player unmounted before audio arrived"),
            }
        });
    }
}

/// Text bound to playback state, written only when it changes.
struct Labels {
    button: HtmlElement,
    readout: Option<HtmlElement>,
    status: Option<HtmlElement>,
    last: (Option<(PlaybackState, bool)>, String, String),
}

impl Labels {
    fn new(button: HtmlElement, readout: Option<HtmlElement>, status: Option<HtmlElement>) -> Self {
        Self {
            button,
            readout,
            status,
            last: (None, String::new(), String::new()),
        }
    }

    fn update(&mut self, pipeline: &Pipeline, renderer: &WaveformRenderer) {
        let state = pipeline.state();
        let retry = pipeline.can_retry();
        if self.last.0 != Some((state, retry)) {
            let label = match state {
                PlaybackState::Playing => "Pause Demo",
                PlaybackState::Loading => "Loading...",
                PlaybackState::Errored if retry => "Try Again",
                PlaybackState::Errored => "Demo Unavailable",
                PlaybackState::Idle | PlaybackState::Paused => "Play Sample Call",
            };
            self.button.set_text_content(Some(label));
            self.button
                .set_attribute("data-state", &format!("{:?}", state).to_lowercase())
                .ok();
            if retry {
                self.button.remove_attribute("disabled").ok();
            } else {
                self.button.set_attribute("disabled", "").ok();
            }
            self.last.0 = Some((state, retry));
        }

        let readout = renderer.readout();
        if readout != self.last.1 {
            if let Some(el) = &self.readout {
                el.set_text_content(Some(&readout));
            }
            self.last.1 = readout;
        }

        let status = pipeline.error().map(|e| e.to_string()).unwrap_or_default();
        if status != self.last.2 {
            if let Some(el) = &self.status {
                el.set_text_content(Some(&status));
            }
            self.last.2 = status;
        }
    }
}

fn window_viewport(window: &Window) -> Viewport {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(width, height, window.device_pixel_ratio())
}

/// Full-window grid background following the pointer.
pub struct GridView {
    grid: Rc<RefCell<GridBackground>>,
    frame: FrameLoop,
    listeners: Vec<EventListener>,
}

impl GridView {
    pub fn mount(canvas: HtmlCanvasElement, params: GridParams) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let viewport = window_viewport(&window);

        let surface = Rc::new(RefCell::new(CanvasSurface::new(canvas.clone())?));
        surface.borrow_mut().fit(viewport)?;
        let grid = Rc::new(RefCell::new(GridBackground::new(params, viewport)));

        let resize = {
            let (grid, surface) = (grid.clone(), surface.clone());
            let win = window.clone();
            EventListener::new(&window, "resize", move |_| {
                let viewport = window_viewport(&win);
                if let Err(e) = surface.borrow_mut().fit(viewport) {
                    log::warn!("grid resize failed: {:?}", e);
                }
                grid.borrow_mut().resize(viewport);
            })?
        };

        let pointer = {
            let grid = grid.clone();
            EventListener::new(&window, "pointermove", move |event| {
                let Ok(event) = event.dyn_into::<MouseEvent>() else {
                    return;
                };
                let rect = canvas.get_bounding_client_rect();
                grid.borrow_mut().set_pointer(DVec2::new(
                    event.client_x() as f64 - rect.left(),
                    event.client_y() as f64 - rect.top(),
                ));
            })?
        };

        let frame = {
            let grid = grid.clone();
            FrameLoop::start(move |_| {
                grid.borrow_mut().render(&mut *surface.borrow_mut());
            })?
        };

        log::info!("grid mounted at {}x{}", viewport.width, viewport.height);
        Ok(Self {
            grid,
            frame,
            listeners: vec![resize, pointer],
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.grid.borrow().viewport()
    }

    pub fn pointer(&self) -> Option<DVec2> {
        self.grid.borrow().pointer()
    }

    pub fn is_running(&self) -> bool {
        self.frame.is_running()
    }

    /// Number of window listeners still attached.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stop animating and detach from the window. The last frame stays on
    /// the canvas.
    pub fn cancel(&mut self) {
        self.frame.cancel();
        self.listeners.clear();
        log::info!("grid stopped");
    }
}
