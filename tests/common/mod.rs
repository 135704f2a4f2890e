//! In-process mock of the report service for integration tests.
//!
//! Runs an actix-web server on an ephemeral port in its own thread and
//! answers every request through a test-supplied handler.

#![allow(dead_code)]

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::web::{self, Bytes};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer};
use futures_util::{stream, StreamExt};
use report_probe::api::ApiClient;
use report_probe::probe::{ProbeOptions, ProbeRunner, RunSummary};
use report_probe::ui::Console;
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// One multipart form part as the service received it.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub filename: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub fields: Vec<FormField>,
}

impl Request {
    pub fn form_field(&self, name: &str) -> Option<String> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.clone())
    }

    /// Client-side file name of the `file` part.
    pub fn upload_filename(&self) -> Option<String> {
        self.fields
            .iter()
            .find(|f| f.name == "file")
            .and_then(|f| f.filename.clone())
    }
}

pub enum Reply {
    Json(u16, Value),
    Raw(u16, String),
    /// Start a response and abort the connection mid-body.
    Hangup,
}

type Handler = Box<dyn Fn(&Request) -> Reply + Send + Sync>;

struct MockState {
    handler: Handler,
    requests: Mutex<Vec<Request>>,
}

pub struct MockService {
    addr: SocketAddr,
    state: web::Data<MockState>,
}

impl MockService {
    /// Start the mock on an ephemeral port. The server lives for the
    /// rest of the test process.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let addr = listener.local_addr().expect("mock service addr");
        let state = web::Data::new(MockState {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        });

        let app_state = state.clone();
        thread::spawn(move || {
            let _ = actix_web::rt::System::new().block_on(async move {
                HttpServer::new(move || {
                    App::new()
                        .app_data(app_state.clone())
                        .default_service(web::to(dispatch))
                })
                .workers(1)
                .listen(listener)?
                .disable_signals()
                .run()
                .await
            });
        });

        MockService { addr, state }
    }

    /// Mock of the report service with `seeded` reports already stored.
    pub fn report_service(seeded: usize) -> Self {
        let reports: Mutex<Vec<Value>> = Mutex::new(
            (0..seeded)
                .map(|i| {
                    json!({
                        "id": i + 1,
                        "department": "Finance",
                        "report_date": "2024-01-10",
                        "filename": "weekly.txt",
                        "file_type": "text",
                        "word_count": 120
                    })
                })
                .collect(),
        );
        MockService::start(move |req| match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/") => Reply::Json(200, json!({ "message": "Report Analyzer with Simple AI" })),
            ("GET", "/api/health") => Reply::Json(200, json!({ "status": "healthy" })),
            ("GET", "/api/stats") => {
                let reports = reports.lock().unwrap();
                let mut departments: Vec<&str> = reports
                    .iter()
                    .filter_map(|r| r["department"].as_str())
                    .collect();
                departments.sort_unstable();
                departments.dedup();
                Reply::Json(
                    200,
                    json!({
                        "total_reports": reports.len(),
                        "total_departments": departments.len(),
                        "today_reports": 0,
                        "ai_enabled": true
                    }),
                )
            }
            ("POST", "/api/upload") => {
                let (Some(department), Some(date), Some(filename), Some(content)) = (
                    req.form_field("department"),
                    req.form_field("date"),
                    req.upload_filename(),
                    req.form_field("file"),
                ) else {
                    return Reply::Json(200, json!({ "success": false, "error": "missing form fields" }));
                };
                let word_count = content.split_whitespace().count();
                let mut reports = reports.lock().unwrap();
                let id = reports.len() + 1;
                reports.insert(
                    0,
                    json!({
                        "id": id,
                        "department": department,
                        "report_date": date,
                        "filename": filename,
                        "file_type": "csv",
                        "word_count": word_count
                    }),
                );
                Reply::Json(
                    200,
                    json!({
                        "success": true,
                        "filename": filename,
                        "department": department,
                        "file_type": "csv",
                        "word_count": word_count
                    }),
                )
            }
            ("GET", "/api/reports") => {
                let reports = reports.lock().unwrap();
                Reply::Json(200, json!({ "reports": reports.as_slice(), "count": reports.len() }))
            }
            _ => Reply::Json(404, json!({ "detail": "Not Found" })),
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

async fn dispatch(req: HttpRequest, payload: Multipart, state: web::Data<MockState>) -> HttpResponse {
    let fields = read_form(payload).await;
    let request = Request {
        method: req.method().to_string(),
        path: req.path().to_string(),
        fields,
    };
    let reply = (state.handler)(&request);
    state.requests.lock().unwrap().push(request);
    into_response(reply)
}

// Requests without a multipart body yield an error on the first field,
// which ends the loop with no fields.
async fn read_form(mut payload: Multipart) -> Vec<FormField> {
    let mut fields = Vec::new();
    while let Some(Ok(mut field)) = payload.next().await {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let mut value = Vec::new();
        while let Some(Ok(chunk)) = field.next().await {
            value.extend_from_slice(&chunk);
        }
        fields.push(FormField {
            name,
            filename,
            value: String::from_utf8_lossy(&value).into_owned(),
        });
    }
    fields
}

fn into_response(reply: Reply) -> HttpResponse {
    match reply {
        Reply::Json(status, value) => HttpResponse::build(status_code(status)).json(value),
        Reply::Raw(status, text) => HttpResponse::build(status_code(status))
            .content_type("application/json")
            .body(text),
        Reply::Hangup => HttpResponse::Ok()
            .content_type("application/json")
            .streaming(stream::once(async {
                Err::<Bytes, _>(std::io::Error::new(
                    std::io::ErrorKind::ConnectionAborted,
                    "mock service hung up",
                ))
            })),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Run the probe against `service`, writing the fixture into `dir`.
pub fn run_probe(service: &MockService, dir: &Path, check_health: bool) -> (RunSummary, String) {
    let api = ApiClient::new(&service.url(), Some(Duration::from_secs(10))).expect("api client");
    let options = ProbeOptions {
        fixture_path: dir.join("system_test.csv"),
        check_health,
    };
    let (summary, console) = ProbeRunner::new(api, Console::plain(Vec::new()), options)
        .run()
        .expect("report written");
    let out = String::from_utf8(console.into_inner()).expect("utf8 report");
    (summary, out)
}

/// Asserts that `needles` occur in `haystack` in the given order.
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match haystack[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!("expected {:?} after byte {} in:\n{}", needle, from, haystack),
        }
    }
}
