//! WASM bindings for the qassist review and merge engine.
//!
//! The browser performs the HTTP call to the extraction service itself;
//! [`ExtractionSessionJs::begin`] hands out the request body and a
//! generation number, and [`ExtractionSessionJs::complete`] takes the
//! response back. Responses for an abandoned generation are ignored.

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use qassist_core::{
    Completion, CompletionStatus, ExtractionError, ExtractionResult, ExtractionSession, FieldApplication,
    FieldPath, QassistConfig, SourceHint,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Serialize with plain JS objects instead of `Map`s.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(js_err)
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(js_err)
}

fn parse(path: &str) -> Result<FieldPath, JsValue> {
    FieldPath::parse(path).map_err(js_err)
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Generations cross the boundary as plain JS numbers, not BigInt. Only
/// whole numbers in the safe integer range are accepted.
fn generation_from_js(value: f64) -> Result<u64, JsValue> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_SAFE_INTEGER {
        Ok(value as u64)
    } else {
        Err(JsValue::from_str(&format!("invalid generation: {value}")))
    }
}

/// Confidence tier ("high", "medium", "low") for a score.
#[wasm_bindgen]
pub fn classify(score: f64) -> String {
    qassist_core::classify(score).label().to_string()
}

/// Whether a field with this score may be applied on its own.
#[wasm_bindgen(js_name = canAutoApply)]
pub fn can_auto_apply(score: f64) -> bool {
    qassist_core::can_auto_apply(score)
}

/// Canonical form of a field path; throws on malformed paths.
#[wasm_bindgen(js_name = parsePath)]
pub fn parse_path(path: &str) -> Result<String, JsValue> {
    parse(path).map(|p| p.to_string())
}

/// Value at `path` in `model`, or `undefined`.
#[wasm_bindgen(js_name = getPath)]
pub fn get_path(model: JsValue, path: &str) -> Result<JsValue, JsValue> {
    let model: Value = from_js(model)?;
    match qassist_core::path::get(&model, &parse(path)?) {
        Some(value) => to_js(value),
        None => Ok(JsValue::UNDEFINED),
    }
}

/// Copy of `model` with `value` written at `path`.
#[wasm_bindgen(js_name = setPath)]
pub fn set_path(model: JsValue, path: &str, value: JsValue) -> Result<JsValue, JsValue> {
    let model: Value = from_js(model)?;
    let value: Value = from_js(value)?;
    to_js(&qassist_core::path::set(&model, &parse(path)?, value))
}

/// Merge every candidate field of `result` (service response shape) into `form`.
#[wasm_bindgen(js_name = applyAll)]
pub fn apply_all(form: JsValue, result: JsValue) -> Result<JsValue, JsValue> {
    let form: Value = from_js(form)?;
    let result: ExtractionResult = from_js(result)?;
    to_js(&qassist_core::apply_all(&form, &result))
}

/// Apply one field of `result` into `form`, honoring the confidence gate.
#[wasm_bindgen(js_name = applyField)]
pub fn apply_field(form: JsValue, result: JsValue, path: &str) -> Result<JsValue, JsValue> {
    let form: Value = from_js(form)?;
    let result: ExtractionResult = from_js(result)?;
    let application = qassist_core::apply_field(&form, &result, path).map_err(js_err)?;
    to_js(&FieldApplyJs::from(application))
}

/// Single-field apply result as seen from JavaScript.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum FieldApplyJs {
    Applied { model: Value },
    WholeCandidate { model: Value },
    Blocked { path: String, score: f64 },
}

impl From<FieldApplication> for FieldApplyJs {
    fn from(application: FieldApplication) -> Self {
        match application {
            FieldApplication::Applied(model) => FieldApplyJs::Applied { model },
            FieldApplication::WholeCandidate(model) => FieldApplyJs::WholeCandidate { model },
            FieldApplication::Blocked { path, score } => FieldApplyJs::Blocked {
                path: path.to_string(),
                score,
            },
        }
    }
}

#[derive(Serialize)]
struct BeginJs<'a> {
    generation: u64,
    request: &'a qassist_core::ExtractionRequest,
}

/// Extraction session for one form instance.
#[wasm_bindgen]
pub struct ExtractionSessionJs {
    session: ExtractionSession,
}

#[wasm_bindgen]
impl ExtractionSessionJs {
    /// Create a session. `config` is an optional qassist config object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ExtractionSessionJs, JsValue> {
        let session = if config.is_undefined() || config.is_null() {
            ExtractionSession::new()
        } else {
            let config: QassistConfig = from_js(config)?;
            config.validate().map_err(js_err)?;
            ExtractionSession::from_config(&config)
        };
        Ok(Self { session })
    }

    /// Current state: "idle", "extracting" or "reviewing".
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        self.session.state().name().to_string()
    }

    #[wasm_bindgen(js_name = isVisible)]
    pub fn is_visible(&self) -> bool {
        self.session.is_visible()
    }

    #[wasm_bindgen]
    pub fn show(&mut self) {
        self.session.show();
    }

    #[wasm_bindgen]
    pub fn hide(&mut self) {
        self.session.hide();
    }

    /// Start an extraction. Returns `{generation, request}`; send `request`
    /// to the service and pass the answer to `complete` with `generation`.
    #[wasm_bindgen]
    pub fn begin(&mut self, raw_text: &str, source_hint: &str) -> Result<JsValue, JsValue> {
        let hint: SourceHint = source_hint.parse().map_err(js_err)?;
        let pending = self.session.begin(raw_text, hint).map_err(js_err)?;
        to_js(&BeginJs {
            generation: pending.generation(),
            request: pending.request(),
        })
    }

    /// Hand back the service response. Returns "reviewing" or "stale";
    /// throws if the response is unusable (the session is then idle) or if
    /// `generation` is not a whole number.
    #[wasm_bindgen]
    pub fn complete(&mut self, generation: f64, response: JsValue) -> Result<String, JsValue> {
        let generation = generation_from_js(generation)?;
        let outcome = serde_wasm_bindgen::from_value::<ExtractionResult>(response)
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()));
        let status = self
            .session
            .complete(Completion::new(generation, outcome))
            .map_err(js_err)?;
        Ok(status_name(status).to_string())
    }

    /// Report a failed service call. Returns "idle" or "stale"; throws if
    /// `generation` is not a whole number.
    #[wasm_bindgen]
    pub fn fail(&mut self, generation: f64, message: &str) -> Result<String, JsValue> {
        let generation = generation_from_js(generation)?;
        let outcome = Err(ExtractionError::Transport(message.to_string()));
        let status = match self.session.complete(Completion::new(generation, outcome)) {
            Ok(status) => status_name(status),
            Err(_) => "idle",
        };
        Ok(status.to_string())
    }

    /// The candidate under review in service response shape, or `undefined`.
    #[wasm_bindgen]
    pub fn result(&self) -> Result<JsValue, JsValue> {
        match self.session.result() {
            Some(result) => to_js(result),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Review rows for the candidate against `form`.
    #[wasm_bindgen]
    pub fn rows(&self, form: JsValue) -> Result<JsValue, JsValue> {
        let form: Value = from_js(form)?;
        let rows = self.session.rows(&form).map_err(js_err)?;
        to_js(&rows)
    }

    /// Merge the whole candidate into `form` and close the session.
    #[wasm_bindgen(js_name = applyAll)]
    pub fn apply_all(&mut self, form: JsValue) -> Result<JsValue, JsValue> {
        let form: Value = from_js(form)?;
        let merged = self.session.apply_all(&form).map_err(js_err)?;
        to_js(&merged)
    }

    /// Apply one field; the session stays open.
    #[wasm_bindgen(js_name = applyField)]
    pub fn apply_field(&mut self, form: JsValue, path: &str) -> Result<JsValue, JsValue> {
        let form: Value = from_js(form)?;
        let application = self.session.apply_field(&form, path).map_err(js_err)?;
        to_js(&FieldApplyJs::from(application))
    }

    /// Discard the candidate.
    #[wasm_bindgen]
    pub fn reject(&mut self) {
        self.session.reject();
    }

    /// Tear down; any in-flight extraction becomes stale.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.session.reset();
    }
}

fn status_name(status: CompletionStatus) -> &'static str {
    match status {
        CompletionStatus::Reviewing => "reviewing",
        CompletionStatus::Stale => "stale",
    }
}
