use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{error, info};
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response, Storage};

use crate::controller::{CardController, ClickOutcome, ResumePolicy};
use crate::fetch::questions_url;
use crate::geometry::ButtonRole;
use crate::input::{InputState, PointerEvent};
use crate::layout::CardLayout;
use crate::question::{parse_questions, Question};
use crate::scene::{VisualGroup, VisualKind};
use crate::store::{KeyValueStore, QuestionStore};
use crate::text::{MonospaceMetrics, TypefaceFont};
use crate::viewport::{SharedViewport, ViewportProvider};

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    let _ = wasm_logger::init(wasm_logger::Config::default());
}

fn js_error(value: JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:?}"))
}

/// `window.localStorage`, one JSON string per key.
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no window available"))?;
        let storage = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| anyhow!("localStorage is disabled"))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(text) = self.storage.get_item(key).map_err(js_error)? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&text)
            .with_context(|| format!("localStorage[{key}] does not contain valid JSON"))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.storage
            .set_item(key, &text)
            .map_err(js_error)
            .with_context(|| format!("unable to write localStorage[{key}]"))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

async fn try_fetch(host: &str) -> Result<Vec<Question>> {
    let url = questions_url(host);
    let init = RequestInit::new();
    init.set_method("GET");
    init.set_mode(RequestMode::Cors);
    let request = Request::new_with_str_and_init(&url, &init).map_err(js_error)?;

    let window = web_sys::window().ok_or_else(|| anyhow!("no window available"))?;
    let reply = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)
        .with_context(|| format!("request to {url} failed"))?;
    let response: Response = reply.dyn_into().map_err(js_error)?;
    if response.status() != 200 {
        return Err(anyhow!("{url} answered {} instead of 200 OK", response.status()));
    }
    let body = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    let body = body
        .as_string()
        .ok_or_else(|| anyhow!("{url} returned a non-text body"))?;
    parse_questions(&body).with_context(|| format!("{url} did not return a question list"))
}

/// Browser counterpart of the native fetch: logs failures and yields `None`.
pub async fn fetch_questions(host: &str) -> Option<Vec<Question>> {
    match try_fetch(host).await {
        Ok(questions) => {
            info!("fetched {} question(s) from {host}", questions.len());
            Some(questions)
        }
        Err(err) => {
            error!("question fetch failed: {err:?}");
            None
        }
    }
}

/// Fetches the questions and stores them under `Questions`. Returns how many
/// were stored; zero when the fetch failed.
#[wasm_bindgen]
pub async fn seed_questions(host: String) -> Result<u32, JsValue> {
    let Some(questions) = fetch_questions(&host).await else {
        return Ok(0);
    };
    let store = QuestionStore::new(LocalStorage::open().map_err(to_js)?);
    store.save_questions(&questions).map_err(to_js)?;
    Ok(questions.len() as u32)
}

fn role_label(role: ButtonRole) -> String {
    match role {
        ButtonRole::Affirmative => "affirmative".to_string(),
        ButtonRole::Negative => "negative".to_string(),
    }
}

fn millis(now_ms: f64) -> Duration {
    Duration::from_secs_f64(now_ms.max(0.0) / 1000.0)
}

/// Card handle for the page script. Times are `performance.now()` values.
#[wasm_bindgen]
pub struct QuizCard {
    controller: CardController,
    viewport: SharedViewport,
    input: InputState,
}

#[wasm_bindgen]
impl QuizCard {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, fresh: bool) -> Result<QuizCard, JsValue> {
        let store = QuestionStore::new(LocalStorage::open().map_err(to_js)?);
        let policy = if fresh {
            ResumePolicy::Discard
        } else {
            ResumePolicy::Resume
        };
        let controller =
            CardController::with_policy(CardLayout::default(), store, VisualGroup::new(), policy)
                .map_err(to_js)?;
        Ok(Self {
            controller,
            viewport: SharedViewport::new(width, height),
            input: InputState::new(),
        })
    }

    /// Installs a typeface JSON font. A broken font leaves the card without text.
    pub fn load_font(&mut self, json: &str) -> Result<(), JsValue> {
        match TypefaceFont::from_json(json) {
            Ok(font) => self.controller.attach_font(Arc::new(font)).map_err(to_js),
            Err(err) => {
                self.controller.font_failed(&err);
                Ok(())
            }
        }
    }

    pub fn use_fallback_font(&mut self) -> Result<(), JsValue> {
        self.controller
            .attach_font(Arc::new(MonospaceMetrics::default()))
            .map_err(to_js)
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.viewport.update(width, height);
    }

    /// Handles a click at pixel `(x, y)`. Returns `answered`, `restarted`,
    /// `exit` or `undefined` when no button was hit.
    pub fn click(&mut self, x: f32, y: f32, now_ms: f64) -> Result<Option<String>, JsValue> {
        let event = self.input.apply(PointerEvent::click(x, y));
        let outcome = self
            .controller
            .handle_pointer_click(event.position, self.viewport.viewport_size(), millis(now_ms))
            .map_err(to_js)?;
        Ok(outcome.map(|outcome| {
            match outcome {
                ClickOutcome::Answered(_) => "answered",
                ClickOutcome::Restarted => "restarted",
                ClickOutcome::ExitRequested => "exit",
            }
            .to_string()
        }))
    }

    pub fn hover(&self, x: f32, y: f32) -> Option<String> {
        let event = self.input.apply(PointerEvent::moved(x, y));
        self.controller
            .update_hover(event.position, self.viewport.viewport_size())
            .map(role_label)
    }

    /// The pointer left the canvas.
    pub fn leave(&self) {
        self.input.clear();
        self.controller
            .update_hover(Vec2::new(-1.0, -1.0), self.viewport.viewport_size());
    }

    pub fn tick(&mut self, now_ms: f64) {
        if !self.controller.tick(millis(now_ms)).is_empty() {
            self.controller
                .refresh_hover(&self.input, self.viewport.viewport_size());
        }
    }

    /// Vertex buffer (position + normal, `f32` x 6 per vertex) of a panel or
    /// button mesh, or an empty array for text and unknown names.
    pub fn mesh_vertices(&self, name: &str) -> Vec<u8> {
        self.controller
            .group()
            .get(name)
            .and_then(|visual| visual.mesh)
            .map(|mesh| mesh.vertex_bytes().to_vec())
            .unwrap_or_default()
    }

    /// `u32` index buffer matching [`mesh_vertices`](Self::mesh_vertices).
    pub fn mesh_indices(&self, name: &str) -> Vec<u8> {
        self.controller
            .group()
            .get(name)
            .and_then(|visual| visual.mesh)
            .map(|mesh| mesh.index_bytes().to_vec())
            .unwrap_or_default()
    }

    pub fn display_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.display()).map_err(|err| to_js(err.into()))
    }

    pub fn session_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.controller.state().session()).map_err(|err| to_js(err.into()))
    }

    /// Every visual the page should draw, relative to the card transform.
    pub fn visuals_json(&self) -> Result<String, JsValue> {
        let group = self.controller.group();
        let visuals: Vec<Value> = group
            .all_visuals()
            .into_iter()
            .map(|visual| {
                let text = match &visual.kind {
                    VisualKind::Text(_, text) => Some(json!({
                        "text": text.text,
                        "size": text.style.size,
                        "depth": text.style.depth,
                    })),
                    _ => None,
                };
                json!({
                    "name": visual.name,
                    "position": visual.position,
                    "scale": visual.scale,
                    "color": visual.color,
                    "text": text,
                })
            })
            .collect();
        let payload = json!({
            "transform": group.transform().to_cols_array(),
            "visuals": visuals,
        });
        serde_json::to_string(&payload).map_err(|err| to_js(err.into()))
    }
}
