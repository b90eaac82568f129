use chess_music::{ChessMusicError, PlaybackConfig, SoundEvent};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct BindingError {
    message: String,
    line: Option<usize>,
    column: Option<usize>,
}

impl From<ChessMusicError> for BindingError {
    fn from(e: ChessMusicError) -> Self {
        match e {
            ChessMusicError::ParseError {
                line,
                column,
                message,
            } => BindingError {
                message,
                line: Some(line),
                column: Some(column),
            },
            other => BindingError {
                message: other.to_string(),
                line: None,
                column: None,
            },
        }
    }
}

fn to_js_error(e: ChessMusicError) -> JsValue {
    let error = BindingError::from(e);
    let json = serde_json::to_string(&error).unwrap_or_else(|_| error.message.clone());
    JsValue::from_str(&json)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Sound for a single move written in SAN, as JSON
#[wasm_bindgen]
pub fn map_move(notation: &str) -> Result<String, JsValue> {
    to_json(&SoundEvent::from_move(0, notation, 0))
}

/// Sound events for every move of a PGN game, as a JSON array
#[wasm_bindgen]
pub fn plan(pgn: &str, note_delay_ms: Option<u32>) -> Result<String, JsValue> {
    let delay = note_delay_ms.map_or(PlaybackConfig::default().note_delay_ms, u64::from);
    let events = chess_music::plan(pgn, delay).map_err(to_js_error)?;
    to_json(&events)
}

/// Render a whole game to WAV bytes. `config_yaml` may be empty.
/// Returns an empty array for a game without moves.
#[wasm_bindgen]
pub fn render(pgn: &str, config_yaml: Option<String>) -> Result<Vec<u8>, JsValue> {
    let config = match config_yaml.as_deref() {
        Some(yaml) => PlaybackConfig::from_yaml(yaml).map_err(to_js_error)?,
        None => PlaybackConfig::default(),
    };
    let download = chess_music::render(pgn, &config).map_err(to_js_error)?;
    Ok(download.map(|d| d.bytes).unwrap_or_default())
}
