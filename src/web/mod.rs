//! Local dashboard server.
//!
//! Hosts the dashboard page over HTTP (sync, via `tiny_http`) so it can be
//! used from a browser:
//! - `GET /`: the current page
//! - `POST /login`: form field `adminKey`
//! - `POST /logout`
//! - `GET /refresh?days=N`: pick a period and refresh now
//!
//! Launched via `shopdash serve` (default: `http://127.0.0.1:9747`).
//! A single thread handles requests and drives the refresh timer between
//! them, so the client is never touched concurrently.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::DashboardApi;
use crate::controller::DashboardClient;
use crate::credential::CredentialStore;
use crate::logging::EventLog;

/// Longest the loop blocks waiting for a request, so the error region
/// still clears on time when nobody is browsing.
const MAX_IDLE_WAIT: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Serve the dashboard on `addr` until the process is stopped.
pub fn serve<A, S>(addr: &str, client: &mut DashboardClient<A, S>, log: &EventLog) -> Result<()>
where
    A: DashboardApi,
    S: CredentialStore,
{
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("shopdash dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");
    log.info(&format!("serving dashboard on {addr}"));

    client.start()?;

    loop {
        let wait = client
            .next_refresh()
            .saturating_duration_since(Instant::now())
            .min(MAX_IDLE_WAIT);

        if let Some(mut request) = server
            .recv_timeout(wait)
            .context("failed to receive HTTP request")?
        {
            let method = request.method().clone();
            let url = request.url().to_string();

            let body = read_body(request.as_reader(), &method);
            let response = handle(client, &method, &url, body, log);
            let status = response.status_code().0;
            let _ = request.respond(response);

            println!(
                "{} {} {} {}",
                method,
                redact_query(&url),
                status,
                chrono::Local::now().format("%H:%M:%S")
            );
            log.debug(&format!("{method} {} -> {status}", redact_query(&url)));
        }

        client.tick(Instant::now())?;
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Read the form body of a POST. Other methods carry none.
fn read_body(reader: &mut dyn Read, method: &Method) -> io::Result<Option<String>> {
    if *method != Method::Post {
        return Ok(None);
    }
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    Ok(Some(buf))
}

/// Turn one request into a response: 400 for an unreadable body, 500 when
/// the client fails, otherwise whatever [`dispatch`] answers.
fn handle<A, S>(
    client: &mut DashboardClient<A, S>,
    method: &Method,
    url: &str,
    body: io::Result<Option<String>>,
    log: &EventLog,
) -> Response<Cursor<Vec<u8>>>
where
    A: DashboardApi,
    S: CredentialStore,
{
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            log.warn(&format!("{method} {} unreadable body: {e}", redact_query(url)));
            return text_response(400, "request body must be UTF-8 form data");
        }
    };

    match dispatch(client, method, url, body.as_deref()) {
        Ok(resp) => resp,
        Err(e) => {
            log.error(&format!("{method} {} failed: {e:#}", redact_query(url)));
            text_response(500, &format!("internal error: {e}"))
        }
    }
}

/// Route one request against the client.
pub fn dispatch<A, S>(
    client: &mut DashboardClient<A, S>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>>
where
    A: DashboardApi,
    S: CredentialStore,
{
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            Ok(html_response(&client.page().to_html()))
        }

        (&Method::Post, "/login") => {
            let form = parse_form(body.unwrap_or(""));
            let key = form.get("adminKey").map(String::as_str).unwrap_or("");
            client.authenticate(key)?;
            Ok(redirect_home())
        }

        (&Method::Post, "/logout") => {
            client.logout()?;
            Ok(redirect_home())
        }

        (&Method::Get, "/refresh") => {
            if let Some(days) = parse_form(query).get("days").and_then(|d| d.parse().ok()) {
                client.select_period(days);
            }
            client.refresh_dashboard()?;
            Ok(redirect_home())
        }

        _ => Ok(text_response(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Form / query parsing
// ---------------------------------------------------------------------------

/// Parse `application/x-www-form-urlencoded` pairs (also used for query
/// strings). Later duplicates win; undecodable pairs are skipped.
pub fn parse_form(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let k = urlencoding::decode(&k.replace('+', " ")).ok()?.into_owned();
            let v = urlencoding::decode(&v.replace('+', " ")).ok()?.into_owned();
            Some((k, v))
        })
        .collect()
}

/// Strip the query string for logging. Query values are user input and
/// may one day carry the key.
fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn html_response(html: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(html.as_bytes().to_vec())
        .with_header(header("Content-Type", "text/html; charset=utf-8"))
        .with_status_code(StatusCode(200))
}

fn text_response(status: u16, text: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(text.as_bytes().to_vec())
        .with_header(header("Content-Type", "text/plain; charset=utf-8"))
        .with_status_code(StatusCode(status))
}

/// 303 back to the page after a form post (post/redirect/get).
fn redirect_home() -> Response<Cursor<Vec<u8>>> {
    Response::from_data(Vec::new())
        .with_header(header("Location", "/"))
        .with_status_code(StatusCode(303))
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name, value).expect("static header is valid ASCII")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
