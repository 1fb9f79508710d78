//! Browser bindings: mounts the grid background and the demo player onto
//! the page and exposes a few calls to JavaScript.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlCanvasElement, HtmlElement};

use crate::config::DemoConfig;
use crate::roi::RevenueEstimate;

pub mod audio;
pub mod canvas;
pub mod events;
pub mod render;
pub mod speech;
pub mod views;

pub use views::{GridView, PlayerElements, PlayerView};

pub const GRID_CANVAS_ID: &str = "blueprint-grid";
pub const WAVEFORM_CANVAS_ID: &str = "demo-waveform";
pub const PLAY_BUTTON_ID: &str = "demo-play";
pub const READOUT_ID: &str = "demo-timecode";
pub const STATUS_ID: &str = "demo-status";
pub const CONFIG_ID: &str = "demo-config";

/// Everything mounted on the page. Dropping it tears both views down.
pub struct Site {
    pub grid: Option<GridView>,
    pub player: Option<PlayerView>,
}

thread_local! {
    static SITE: RefCell<Option<Site>> = const { RefCell::new(None) };
}

impl Site {
    /// Mount whichever views have their elements on the page.
    pub fn mount(document: &Document, config: DemoConfig) -> Result<Self, JsValue> {
        let config = Rc::new(config);

        let grid = match element::<HtmlCanvasElement>(document, GRID_CANVAS_ID) {
            Some(canvas) => Some(GridView::mount(canvas, config.grid.clone())?),
            None => {
                log::info!("no #{GRID_CANVAS_ID}, grid disabled");
                None
            }
        };

        let player = match (
            element::<HtmlCanvasElement>(document, WAVEFORM_CANVAS_ID),
            element::<HtmlElement>(document, PLAY_BUTTON_ID),
        ) {
            (Some(canvas), Some(button)) => {
                let elements = PlayerElements {
                    canvas,
                    button,
                    readout: element(document, READOUT_ID),
                    status: element(document, STATUS_ID),
                };
                Some(PlayerView::mount(elements, config)?)
            }
            _ => {
                log::info!("no #{WAVEFORM_CANVAS_ID}/#{PLAY_BUTTON_ID}, player disabled");
                None
            }
        };

        Ok(Self { grid, player })
    }
}

fn element<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document.get_element_by_id(id)?.dyn_into::<T>().ok()
}

/// Defaults, overridden by a JSON `<script id="demo-config">` if present.
fn load_config(document: &Document) -> DemoConfig {
    let Some(json) = document
        .get_element_by_id(CONFIG_ID)
        .and_then(|el| el.text_content())
    else {
        return DemoConfig::default();
    };
    match DemoConfig::from_json(&json) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring #{CONFIG_ID}: {e}");
            DemoConfig::default()
        }
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();

    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let config = load_config(&document);
    let site = Site::mount(&document, config)?;
    SITE.with(|slot| *slot.borrow_mut() = Some(site));
    Ok(())
}

/// Stop both animations, remove listeners and release audio.
#[wasm_bindgen]
pub fn unmount() {
    if SITE.with(|slot| slot.borrow_mut().take()).is_some() {
        log::info!("site unmounted");
    }
}

/// Yearly revenue lost to unanswered calls.
#[wasm_bindgen]
pub fn estimate_lost_revenue(avg_job_value: u32, missed_calls_per_week: u32) -> u32 {
    RevenueEstimate::compute(avg_job_value, missed_calls_per_week).yearly
}
