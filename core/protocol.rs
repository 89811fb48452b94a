//! JSON-lines request/response surface over a [`Session`].
//!
//! Each input line is one [`Request`]; each produces exactly one [`Response`]
//! line. Malformed lines are answered with an `InvalidRequest` error and the
//! loop keeps going.

use crate::config::expand_path;
use crate::error::{AppError, Result};
use crate::session::Session;
use log;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Load {
        root: String,
        #[serde(default)]
        exclusions: Vec<String>,
    },
    SetSelection {
        path: String,
        selected: bool,
    },
    Count,
    GetFileContent {
        path: String,
    },
    Export {
        #[serde(default, rename = "fileName")]
        file_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(kind: &str, message: impl Into<String>) -> Self {
        Response {
            ok: false,
            data: None,
            error: Some(ErrorBody {
                kind: kind.to_string(),
                message: message.into(),
            }),
        }
    }
}

impl From<AppError> for Response {
    fn from(err: AppError) -> Self {
        Response::failure(err.kind(), err.to_string())
    }
}

pub fn handle_request(session: &mut Session, request: Request) -> Response {
    log::debug!("Handling request: {:?}", request);
    match dispatch(session, request) {
        Ok(data) => Response::success(data),
        Err(e) => {
            log::info!("Request failed: {}", e);
            Response::from(e)
        }
    }
}

fn dispatch(session: &mut Session, request: Request) -> Result<Value> {
    match request {
        Request::Load { root, exclusions } => {
            let tree = session.load(&expand_path(&root), exclusions)?;
            Ok(serde_json::to_value(tree)?)
        }
        Request::SetSelection { path, selected } => {
            let resolved = session.set_selected(&path, selected);
            Ok(json!({
                "path": path,
                "selected": selected,
                "resolved": resolved,
                "selectedFileCount": session.selected_file_count(),
            }))
        }
        Request::Count => Ok(json!({ "count": session.selected_file_count() })),
        Request::GetFileContent { path } => {
            let content = session.file_content(&path)?;
            Ok(json!({ "path": path, "content": content }))
        }
        Request::Export { file_name } => {
            let result = session.export(file_name.as_deref())?;
            Ok(serde_json::to_value(result)?)
        }
    }
}

pub fn handle_line(session: &mut Session, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle_request(session, request),
        Err(e) => {
            log::warn!("Malformed request: {}", e);
            Response::failure("InvalidRequest", e.to_string())
        }
    }
}

/// Answers requests from `reader` until EOF. Blank lines are ignored.
pub fn serve<R: BufRead, W: Write>(session: &mut Session, reader: R, mut writer: W) -> Result<()> {
    log::info!("Serving requests (output dir: {})", session.output_dir().display());
    let mut handled = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(session, &line);
        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        handled += 1;
    }
    log::info!("Input closed after {} request(s)", handled);
    Ok(())
}
