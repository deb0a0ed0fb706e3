use anyhow::{Context, Result};
use env_logger::Env;
use luckydraw_core::{
    Event, Key, LotteryError, LotterySession, LotteryStatus, SessionSnapshot, SilentAudio,
    StoreError, Viewport,
};
use luckydraw_data::{
    clock_seed, load_settings, resolve_data_dir, resolve_seed, FileStore, LOG_ENV,
};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tiny_http::{Header, Method, Response, Server, StatusCode};

const DEFAULT_ADDR: &str = "0.0.0.0:7878";

fn main() {
    env_logger::Builder::from_env(Env::new().filter_or(LOG_ENV, "info")).init();
    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut addr = DEFAULT_ADDR.to_string();
    let mut data_dir = None;
    let mut seed = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match (args[idx].as_str(), args.get(idx + 1)) {
            ("--addr", Some(value)) => addr = value.clone(),
            ("--data", Some(value)) => data_dir = Some(PathBuf::from(value)),
            ("--seed", Some(value)) => seed = value.parse::<u64>().ok(),
            _ => {
                idx += 1;
                continue;
            }
        }
        idx += 2;
    }

    let data_dir = resolve_data_dir(data_dir);
    let seed = resolve_seed(seed).unwrap_or_else(clock_seed);
    let mut state = AppState::open(&data_dir, seed)?;
    let server = Server::http(addr.as_str())
        .map_err(|err| anyhow::anyhow!(err.to_string()))
        .with_context(|| format!("bind {addr}"))?;
    log::info!("lucky draw api on http://{addr} (seed {seed})");
    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, &mut state) {
            log::warn!("request error: {err:#}");
        }
    }
    Ok(())
}

struct AppState {
    session: LotterySession<FileStore, SilentAudio>,
    last_request: Instant,
}

impl AppState {
    fn open(data_dir: &Path, seed: u64) -> Result<Self> {
        let config = load_settings(data_dir).context("load settings")?;
        let store = FileStore::open(data_dir).context("load persons and prizes")?;
        let mut session = LotterySession::new(config, store, SilentAudio::default(), seed);
        session
            .mount()
            .map_err(|err| anyhow::anyhow!(err.to_string()))
            .context("mount lottery")?;
        Ok(Self {
            session,
            last_request: Instant::now(),
        })
    }

    /// Brings the virtual clock up to wall time.
    fn catch_up(&mut self) {
        let elapsed = self.last_request.elapsed();
        self.last_request = Instant::now();
        self.session.advance(elapsed.as_millis() as u64);
    }
}

#[derive(Serialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
    /// Set when the action was a no-op (busy or wrong status).
    ignored: Option<String>,
    state: SessionSnapshot,
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct ActionRequest {
    action: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    viewport: Option<Viewport>,
}

#[derive(Debug, Default)]
struct Outcome {
    error: Option<String>,
    ignored: Option<String>,
}

fn handle_request(mut request: tiny_http::Request, state: &mut AppState) -> Result<()> {
    let url = request.url().to_string();
    match (request.method(), url.as_str()) {
        (&Method::Get, "/api/state") => {
            state.catch_up();
            let response = build_response(state, Outcome::default());
            respond_json(request, &response, 200)?;
        }
        (&Method::Post, "/api/action") => {
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .context("read request body")?;
            let action: ActionRequest = match serde_json::from_str(&body) {
                Ok(action) => action,
                Err(err) => {
                    let outcome = Outcome {
                        error: Some(format!("bad request: {err}")),
                        ignored: None,
                    };
                    let response = build_response(state, outcome);
                    return respond_json(request, &response, 400);
                }
            };
            state.catch_up();
            let outcome = apply_action(state, action);
            let response = build_response(state, outcome);
            respond_json(request, &response, 200)?;
        }
        _ => {
            request
                .respond(Response::empty(StatusCode(404)))
                .context("respond 404")?;
        }
    }
    Ok(())
}

fn respond_json(request: tiny_http::Request, response: &ApiResponse, status: u16) -> Result<()> {
    let body = serde_json::to_vec_pretty(response).context("serialize response")?;
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| anyhow::anyhow!("invalid content type header"))?;
    request
        .respond(
            Response::from_data(body)
                .with_status_code(StatusCode(status))
                .with_header(header),
        )
        .context("write response")?;
    Ok(())
}

fn build_response(state: &mut AppState, outcome: Outcome) -> ApiResponse {
    ApiResponse {
        ok: outcome.error.is_none(),
        error: outcome.error,
        ignored: outcome.ignored,
        state: state.session.snapshot(),
        events: state.session.drain_events(),
    }
}

fn lottery_outcome(result: Result<(), LotteryError>) -> Outcome {
    match result {
        Ok(()) => Outcome::default(),
        Err(err) if err.is_ignored() => Outcome {
            error: None,
            ignored: Some(err.to_string()),
        },
        Err(err) => Outcome {
            error: Some(err.to_string()),
            ignored: None,
        },
    }
}

fn store_outcome<T>(result: Result<T, StoreError>) -> Outcome {
    Outcome {
        error: result.err().map(|err| err.to_string()),
        ignored: None,
    }
}

fn apply_action(state: &mut AppState, req: ActionRequest) -> Outcome {
    let session = &mut state.session;
    match req.action.as_str() {
        "enter" => lottery_outcome(session.enter()),
        "start" => lottery_outcome(session.start()),
        "stop" => lottery_outcome(session.stop()),
        "continue" => lottery_outcome(session.continue_round()),
        "quit" => lottery_outcome(session.quit()),
        "space" => lottery_outcome(session.press(Key::Space)),
        "escape" => lottery_outcome(session.press(Key::Escape)),
        "resize" => match req.viewport {
            Some(viewport) if session.resize(viewport) => Outcome::default(),
            Some(_) => Outcome {
                error: None,
                ignored: Some("resize listener detached".to_string()),
            },
            None => Outcome {
                error: Some("resize needs a viewport".to_string()),
                ignored: None,
            },
        },
        "select" | "toggle" | "back" | "reset-winners" => {
            let idle = matches!(
                session.status(),
                LotteryStatus::Init | LotteryStatus::Ready
            ) && !session.is_busy();
            if !idle {
                return Outcome {
                    error: None,
                    ignored: Some("a round is in progress".to_string()),
                };
            }
            let target = req.target.unwrap_or_default();
            let store = session.store_mut();
            match req.action.as_str() {
                "select" => store_outcome(store.select_prize(&target)),
                "toggle" => store_outcome(store.toggle_prize(&target)),
                "back" => match target.parse::<u64>() {
                    Ok(person) => store_outcome(store.move_to_pool(person)),
                    Err(_) => Outcome {
                        error: Some(format!("bad person id {target:?}")),
                        ignored: None,
                    },
                },
                _ => store_outcome(store.reset_winners()),
            }
        }
        other => Outcome {
            error: Some(format!("unknown action {other}")),
            ignored: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luckydraw_data::{load_store, PERSONS_FILE, PRIZES_FILE, SETTINGS_FILE};
    use std::fs;

    struct Scratch {
        dir: PathBuf,
        state: AppState,
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn scratch(tag: &str) -> Scratch {
        let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("assets");
        let dir = std::env::temp_dir().join(format!("luckydraw-web-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        for file in [PERSONS_FILE, PRIZES_FILE, SETTINGS_FILE] {
            fs::copy(assets.join(file), dir.join(file)).expect("copy asset");
        }
        let state = AppState::open(&dir, 11).expect("open");
        Scratch { dir, state }
    }

    fn act(state: &mut AppState, action: &str, target: Option<&str>) -> Outcome {
        apply_action(
            state,
            ActionRequest {
                action: action.to_string(),
                target: target.map(str::to_string),
                viewport: None,
            },
        )
    }

    #[test]
    fn full_round_over_the_api() {
        let mut scratch = scratch("round");
        let state = &mut scratch.state;
        state.session.advance(2000);
        assert!(act(state, "enter", None).error.is_none());
        state.session.advance(2000);
        assert!(act(state, "start", None).error.is_none());
        assert!(act(state, "stop", None).error.is_none());
        state.session.advance(1200);
        let response = build_response(state, Outcome::default());
        assert_eq!(response.state.status, LotteryStatus::End);
        assert_eq!(response.state.winners.len(), 5);
        assert_eq!(response.state.text, state.session.config.display.text_style());
        assert!(response
            .events
            .iter()
            .any(|event| matches!(event, Event::Revealed { .. })));

        assert!(act(state, "continue", None).error.is_none());
        let saved = load_store(&scratch.dir).expect("reload");
        assert_eq!(saved.winners().count(), 5);
    }

    #[test]
    fn wrong_status_is_reported_as_ignored() {
        let mut scratch = scratch("ignored");
        let state = &mut scratch.state;
        state.session.advance(2000);
        let outcome = act(state, "stop", None);
        assert!(outcome.error.is_none());
        assert!(outcome.ignored.is_some());
    }

    #[test]
    fn admin_actions_validate_targets() {
        let mut scratch = scratch("admin");
        let state = &mut scratch.state;
        state.session.advance(2000);
        assert!(act(state, "select", Some("004")).error.is_none());
        assert!(act(state, "select", Some("nope")).error.is_some());
        assert!(act(state, "back", Some("abc")).error.is_some());
        assert!(act(state, "dance", None).error.is_some());
    }

    #[test]
    fn request_body_parses() {
        let req: ActionRequest =
            serde_json::from_str(r#"{"action":"resize","viewport":{"width":800,"height":600}}"#)
                .expect("parse");
        assert_eq!(req.viewport.map(|view| view.width), Some(800.0));
    }
}
