//! HTTP server for the interactive viewer
//!
//! `scriptlens serve movie.json` → starts server, opens browser, shows the movie
//!
//! The server owns a single session. Uploading a document through
//! `POST /api/movie` replaces it; every other endpoint computes its view from
//! the current session on demand.

use crate::movie::{DocumentError, Movie};
use crate::session::{CharacterRow, MovieSummary, Session, Settings};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::PathBuf;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("ui.html");

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to listen on {addr}: {reason}")]
    Bind { addr: String, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    fn failure(error: impl ToString) -> Self {
        Self { ok: false, data: None, error: Some(error.to_string()) }
    }
}

#[derive(Deserialize, Debug)]
struct CharacterParams {
    name: String,
}

#[derive(Deserialize, Debug)]
struct PairParams {
    a: String,
    b: String,
}

/// What the viewer needs right after a document is loaded
#[derive(Serialize)]
struct MovieOverview<'a> {
    source: &'a str,
    summary: MovieSummary,
    settings: Settings,
    characters: Vec<CharacterRow>,
    selectable: Vec<&'a str>,
    default_pair: Option<(&'a str, &'a str)>,
}

/// Server-side state: the current session and where it came from
pub struct Viewer {
    session: Option<Session>,
    source: String,
    settings: Settings,
}

/// A response ready to be sent
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html", body }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"data":null,"error":"serialization failed: {}"}}"#, e)
        });
        Self { status, content_type: "application/json", body }
    }

    fn ok<T: Serialize>(data: T) -> Self {
        Self::json(200, &ApiResponse::success(data))
    }

    fn error(status: u16, message: impl ToString) -> Self {
        Self::json(status, &ApiResponse::failure(message))
    }
}

impl Viewer {
    pub fn new(settings: Settings) -> Self {
        Self { session: None, source: String::new(), settings }
    }

    pub fn with_movie(movie: Movie, source: String, settings: Settings) -> Self {
        Self { session: Some(Session::new(movie, settings)), source, settings }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn replace_movie(&mut self, movie: Movie, source: String) {
        log::info!("session replaced by {} ({} entries)", source, movie.entries.len());
        self.session = Some(Session::new(movie, self.settings));
        self.source = source;
    }

    fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if let Some(session) = self.session.as_mut() {
            session.set_settings(settings);
        }
    }

    fn overview(&self) -> Reply {
        let Some(session) = self.session.as_ref() else {
            return Reply::error(404, "no document loaded");
        };
        Reply::ok(MovieOverview {
            source: &self.source,
            summary: session.summary(),
            settings: session.settings(),
            characters: session.character_table(),
            selectable: session.selectable_characters(),
            default_pair: session.default_pair(),
        })
    }

    /// Dispatch one request. `url` includes the query string.
    pub fn route(&mut self, method: &Method, url: &str, body: &str) -> Reply {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };

        match (method, path) {
            (Method::Get, "/") => Reply::html(UI_HTML.to_string()),

            (Method::Get, "/api/movie") => self.overview(),

            (Method::Post, "/api/movie") => match Movie::from_json(body) {
                Ok(movie) => {
                    let source = serde_urlencoded::from_str::<Vec<(String, String)>>(query)
                        .ok()
                        .and_then(|q| q.into_iter().find(|(k, _)| k == "name").map(|(_, v)| v))
                        .unwrap_or_else(|| "upload".to_string());
                    self.replace_movie(movie, source);
                    self.overview()
                }
                Err(e) => Reply::error(400, e),
            },

            (Method::Get, "/api/settings") => Reply::ok(self.settings),

            (Method::Post, "/api/settings") => match parse_params::<Settings>(query, body) {
                Some(settings) => {
                    self.set_settings(settings);
                    Reply::ok(self.settings)
                }
                None => Reply::error(400, "invalid settings"),
            },

            (Method::Get, "/api/character") => {
                let Some(session) = self.session.as_ref() else {
                    return Reply::error(404, "no document loaded");
                };
                match parse_params::<CharacterParams>(query, body) {
                    Some(p) => match session.breakdown(&p.name) {
                        Some(b) => Reply::ok(b),
                        None => Reply::error(404, format!("unknown character '{}'", p.name)),
                    },
                    None => Reply::error(400, "expected ?name="),
                }
            }

            (Method::Get, "/api/interactions") => {
                let Some(session) = self.session.as_ref() else {
                    return Reply::error(404, "no document loaded");
                };
                match parse_params::<PairParams>(query, body) {
                    Some(p) => Reply::ok(session.interactions(&p.a, &p.b)),
                    None => Reply::error(400, "expected ?a=&b="),
                }
            }

            (Method::Get, "/api/directions") => match self.session.as_ref() {
                Some(session) => Reply::ok(session.directions()),
                None => Reply::error(404, "no document loaded"),
            },

            (Method::Get, "/api/graph") => match self.session.as_ref() {
                Some(session) => Reply::ok(session.social_graph()),
                None => Reply::error(404, "no document loaded"),
            },

            _ => Reply { status: 404, content_type: "text/plain", body: "Not found".to_string() },
        }
    }
}

/// Query string first, then a JSON body
fn parse_params<T: for<'de> Deserialize<'de>>(query: &str, body: &str) -> Option<T> {
    if !query.is_empty() {
        return serde_urlencoded::from_str::<T>(query).ok();
    }
    if !body.is_empty() {
        return serde_json::from_str::<T>(body).ok();
    }
    // Fall back to field defaults, if the type has them
    serde_json::from_str::<T>("{}").ok()
}

/// Start server, open browser, serve UI
pub fn start(port: u16, path: Option<PathBuf>, settings: Settings) -> Result<(), ServeError> {
    let mut viewer = match path {
        Some(path) => {
            let movie = Movie::load(&path)?;
            let source = path.canonicalize().unwrap_or(path).display().to_string();
            Viewer::with_movie(movie, source, settings)
        }
        None => Viewer::new(settings),
    };

    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| ServeError::Bind {
        addr: addr.clone(),
        reason: e.to_string(),
    })?;

    let url = format!("http://localhost:{}", port);
    eprintln!("\n\x1b[1;32mScriptlens\x1b[0m");
    eprintln!("   {}", url);
    if !viewer.source.is_empty() {
        eprintln!("   Viewing: {}\n", viewer.source);
    }

    // Open browser
    if let Err(e) = open::that(&url) {
        log::warn!("could not open browser: {}", e);
    }

    // Handle requests
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut viewer) {
            log::error!("request failed: {}", e);
        }
    }

    Ok(())
}

fn handle_request(mut request: Request, viewer: &mut Viewer) -> io::Result<()> {
    let url = request.url().to_string();
    let method = request.method().clone();

    let mut body = String::new();
    if method == Method::Post {
        request.as_reader().read_to_string(&mut body)?;
    }

    let reply = viewer.route(&method, &url, &body);
    log::info!("{} {} -> {}", method, url, reply.status);

    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(header);
    }
    request.respond(response)
}
