//! unitext line protocol host
//!
//! Reads one JSON request per line on stdin and writes one JSON response per
//! line on stdout. Logs go to stderr.
//!
//! Methods:
//! - annotate: annotate a node list (`nodes`) or a plain `text`
//! - presend: expand pre-send tags in an outgoing message
//! - convert: convert a single value
//! - units: list quantities with their units
//! - settings: report the effective preferences and any problems
//! - stats: conversion cache counters
//!
//! Every method accepts an optional `settings` object that overrides the
//! startup preferences (`UNITEXT_SETTINGS`) for that request only.
//! Requests without an `id` are notifications and get no response.

use std::env;
use std::io::{self, BufRead, Write};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use unitext::grammar::parse_value;
use unitext::{ConversionCache, ConversionError, Engine, Segment};
use unitext_core::{convert_unit, Preferences, QuantityType, UNITS};

const SERVER_NAME: &str = "unitext";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const SETTINGS_ENV: &str = "UNITEXT_SETTINGS";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const CONVERSION_FAILED: i32 = -32000;

#[derive(Debug, Deserialize)]
struct Request {
    id: Option<JsonValue>,
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ProtocolError>,
}

#[derive(Debug, Serialize)]
struct ProtocolError {
    code: i32,
    message: String,
}

impl ProtocolError {
    fn invalid_params(message: impl Into<String>) -> Self {
        ProtocolError { code: INVALID_PARAMS, message: message.into() }
    }
}

impl From<ConversionError> for ProtocolError {
    fn from(e: ConversionError) -> Self {
        ProtocolError { code: CONVERSION_FAILED, message: e.to_string() }
    }
}

/// A node as the host sent it
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum HostNode {
    Plain(String),
    Element(HostElement),
    Known(Segment),
    /// Anything else is handed back untouched
    Unknown(JsonValue),
}

/// Element whose children may include shapes the engine does not know
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum HostElement {
    Element {
        tag: String,
        #[serde(default)]
        children: Vec<HostNode>,
    },
}

struct Host {
    engine: Engine,
    prefs: Preferences,
}

impl Host {
    fn new(prefs: Preferences) -> Self {
        Host { engine: Engine::new(), prefs }
    }

    fn handle_request(&mut self, request: &Request) -> Response {
        let params = &request.params;
        let result = match request.method.as_str() {
            "annotate" => self.handle_annotate(params),
            "presend" => self.handle_presend(params),
            "convert" => self.handle_convert(params),
            "units" => handle_units(params),
            "settings" => self.handle_settings(params),
            "stats" => Ok(json!(self.engine.cache().stats())),
            _ => Err(ProtocolError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {}", request.method),
            }),
        };

        match result {
            Ok(r) => Response { id: request.id.clone(), result: Some(r), error: None },
            Err(e) => Response { id: request.id.clone(), result: None, error: Some(e) },
        }
    }

    /// Startup preferences with the request's `settings` laid over them
    fn request_preferences(&self, params: &Option<JsonValue>) -> Result<Preferences, ProtocolError> {
        let Some(overrides) = params.as_ref().and_then(|p| p.get("settings")) else {
            return Ok(self.prefs.clone());
        };
        let Some(overrides) = overrides.as_object() else {
            return Err(ProtocolError::invalid_params("settings must be an object"));
        };

        let mut merged = json!(self.prefs);
        if let Some(base) = merged.as_object_mut() {
            for (key, value) in overrides {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(merged)
            .map_err(|e| ProtocolError::invalid_params(format!("invalid settings: {}", e)))
    }

    fn handle_annotate(&mut self, params: &Option<JsonValue>) -> Result<JsonValue, ProtocolError> {
        let prefs = self.request_preferences(params)?.sanitized();
        let args = params.as_ref().ok_or_else(|| ProtocolError::invalid_params("missing params"))?;

        if let Some(text) = args.get("text").and_then(JsonValue::as_str) {
            let segments = self.engine.transform(vec![Segment::text(text)], &prefs);
            return Ok(json!({ "segments": segments }));
        }

        let nodes = args
            .get("nodes")
            .ok_or_else(|| ProtocolError::invalid_params("expected `text` or `nodes`"))?;
        let nodes: Vec<HostNode> = serde_json::from_value(nodes.clone())
            .map_err(|e| ProtocolError::invalid_params(format!("invalid nodes: {}", e)))?;

        Ok(json!({ "nodes": self.annotate_nodes(nodes, &prefs) }))
    }

    /// Annotate host nodes, recursing into elements and keeping unknown shapes
    fn annotate_nodes(&mut self, nodes: Vec<HostNode>, prefs: &Preferences) -> Vec<HostNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            let segment = match node {
                HostNode::Plain(text) => Segment::text(text),
                HostNode::Known(segment) => segment,
                HostNode::Element(HostElement::Element { tag, children }) => {
                    let children = self.annotate_nodes(children, prefs);
                    out.push(HostNode::Element(HostElement::Element { tag, children }));
                    continue;
                }
                HostNode::Unknown(value) => {
                    debug!("passing through unrecognised node");
                    out.push(HostNode::Unknown(value));
                    continue;
                }
            };
            out.extend(self.engine.transform(vec![segment], prefs).into_iter().map(HostNode::Known));
        }
        out
    }

    fn handle_presend(&mut self, params: &Option<JsonValue>) -> Result<JsonValue, ProtocolError> {
        let prefs = self.request_preferences(params)?.sanitized();
        let text = params
            .as_ref()
            .and_then(|p| p.get("text"))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ProtocolError::invalid_params("missing `text`"))?;
        Ok(json!({ "text": self.engine.presend(text, &prefs) }))
    }

    fn handle_convert(&mut self, params: &Option<JsonValue>) -> Result<JsonValue, ProtocolError> {
        let prefs = self.request_preferences(params)?.sanitized();
        let args = params.as_ref().ok_or_else(|| ProtocolError::invalid_params("missing params"))?;

        let value = match args.get("value") {
            Some(JsonValue::Number(n)) => n.as_f64(),
            Some(JsonValue::String(s)) => {
                Some(parse_value(s).ok_or_else(|| ConversionError::InvalidNumber(s.clone()))?)
            }
            _ => None,
        }
        .ok_or_else(|| ProtocolError::invalid_params("missing `value`"))?;

        let from = args
            .get("from")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ProtocolError::invalid_params("missing `from`"))?;
        let (quantity, from) = UNITS.resolve(from)?;
        let to = match args.get("to").and_then(JsonValue::as_str) {
            Some(name) => UNITS.resolve(name)?.1,
            None => prefs.preferred_unit(quantity),
        };

        let result = convert_unit(quantity, value, from, to, &prefs.format_options())?;
        Ok(json!({
            "quantity": quantity,
            "from": from,
            "to": to,
            "original": result.original,
            "converted": result.converted,
        }))
    }

    fn handle_settings(&mut self, params: &Option<JsonValue>) -> Result<JsonValue, ProtocolError> {
        let requested = self.request_preferences(params)?;
        let problem = requested.validate().err().map(|e| e.to_string());
        Ok(json!({
            "settings": requested.sanitized(),
            "problem": problem,
        }))
    }
}

fn handle_units(params: &Option<JsonValue>) -> Result<JsonValue, ProtocolError> {
    let filter = match params.as_ref().and_then(|p| p.get("quantity")).and_then(JsonValue::as_str) {
        Some(letter) => {
            let mut chars = letter.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(QuantityType::try_from(c)?),
                _ => return Err(ProtocolError::invalid_params("quantity must be a single letter")),
            }
        }
        None => None,
    };

    let quantities: Vec<JsonValue> = QuantityType::ALL
        .into_iter()
        .filter(|q| filter.map_or(true, |f| f == *q))
        .map(|q| {
            json!({
                "quantity": q,
                "letter": q.letter().to_string(),
                "settingKey": q.setting_key(),
                "defaultUnit": q.default_unit(),
                "baseUnit": q.base_unit(),
                "units": q.units().iter().map(|u| u.definition()).collect::<Vec<_>>(),
            })
        })
        .collect();

    Ok(json!({
        "quantities": quantities,
        "names": UNITS.names_longest_first(),
    }))
}

fn startup_preferences() -> Preferences {
    let Ok(path) = env::var(SETTINGS_ENV) else {
        return Preferences::default();
    };
    match Preferences::load(&path) {
        Ok(prefs) => {
            if let Err(e) = prefs.validate() {
                warn!(%path, problem = %e, "settings adjusted");
            }
            info!(%path, "loaded settings");
            prefs.sanitized()
        }
        Err(e) => {
            warn!(%path, error = %e, "could not load settings, using defaults");
            Preferences::default()
        }
    }
}

fn write_response(response: &Response) -> io::Result<()> {
    let line = serde_json::to_string(response)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut host = Host::new(startup_preferences());
    info!(version = SERVER_VERSION, "{} ready, waiting for requests", SERVER_NAME);

    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("input closed");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let request: Request = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(error = %e, "unparseable request");
                        let response = Response {
                            id: None,
                            result: None,
                            error: Some(ProtocolError {
                                code: PARSE_ERROR,
                                message: format!("Parse error: {}", e),
                            }),
                        };
                        if let Err(e) = write_response(&response) {
                            error!(error = %e, "failed to write response");
                            break;
                        }
                        continue;
                    }
                };

                debug!(method = %request.method, bytes = line.len(), "processing request");
                let response = host.handle_request(&request);

                if request.id.is_none() {
                    debug!(method = %request.method, "notification processed, no response");
                    continue;
                }
                if let Err(e) = write_response(&response) {
                    error!(error = %e, "failed to write response");
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        }
    }

    info!("{} shutting down", SERVER_NAME);
}

#[cfg(test)]
mod tests {
    use super::*;
    use unitext_core::Unit;

    fn call(host: &mut Host, method: &str, params: JsonValue) -> Response {
        let request = Request {
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        };
        host.handle_request(&request)
    }

    fn result(response: Response) -> JsonValue {
        assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
        response.result.unwrap()
    }

    #[test]
    fn test_annotate_text() {
        let mut host = Host::new(Preferences::default());
        let r = result(call(&mut host, "annotate", json!({
            "text": "I ran 100km",
            "settings": { "preferredDistance": "mi" }
        })));
        let segments = r["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1]["type"], "annotation");
        assert_eq!(segments[1]["display"], "62,14mi");
        assert_eq!(segments[1]["caption"]["original"], "100,00km");
    }

    #[test]
    fn test_annotate_nodes_passes_unknown_through() {
        let mut host = Host::new(Preferences::default());
        let r = result(call(&mut host, "annotate", json!({
            "nodes": [
                "5kg",
                { "type": "code", "text": "5kg" },
                { "kind": "emoji", "name": "apple" }
            ]
        })));
        let nodes = r["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0]["display"], "5,00kg");
        assert_eq!(nodes[1], json!({ "type": "code", "text": "5kg" }));
        assert_eq!(nodes[2], json!({ "kind": "emoji", "name": "apple" }));
    }

    #[test]
    fn test_annotate_element_with_unknown_child() {
        let mut host = Host::new(Preferences::default().with_preferred(Unit::Mile));
        let r = result(call(&mut host, "annotate", json!({
            "nodes": [{
                "type": "element",
                "tag": "strong",
                "children": [
                    "100km",
                    { "kind": "emoji" },
                    { "type": "element", "tag": "em", "children": [{ "type": "text", "text": "5 km" }] }
                ]
            }]
        })));
        let element = &r["nodes"][0];
        assert_eq!(element["type"], "element");
        assert_eq!(element["tag"], "strong");
        let children = element["children"].as_array().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0]["type"], "annotation");
        assert_eq!(children[0]["display"], "62,14mi");
        assert_eq!(children[1], json!({ "kind": "emoji" }));
        assert_eq!(children[2]["children"][0]["display"], "3,11mi");
    }

    #[test]
    fn test_presend() {
        let mut host = Host::new(Preferences::default().with_decimals(1, true, 1));
        let r = result(call(&mut host, "presend", json!({ "text": "<u:14km:mi,m>" })));
        assert_eq!(r["text"], "14km\u{200B} (8,7mi & 14000m)");
    }

    #[test]
    fn test_convert() {
        let mut host = Host::new(Preferences::default());
        let r = result(call(&mut host, "convert", json!({ "value": "0,5", "from": "KG", "to": "lb" })));
        assert_eq!(r["original"], "0,50kg");
        assert_eq!(r["converted"], "1,10lb");

        let r = result(call(&mut host, "convert", json!({ "value": 212, "from": "F" })));
        assert_eq!(r["to"], "C");
        assert_eq!(r["converted"], "100,00°C");
    }

    #[test]
    fn test_convert_errors() {
        let mut host = Host::new(Preferences::default());
        let r = call(&mut host, "convert", json!({ "value": 1, "from": "km", "to": "kg" }));
        assert_eq!(r.error.unwrap().code, CONVERSION_FAILED);

        let r = call(&mut host, "convert", json!({ "value": 1, "from": "parsec" }));
        assert!(r.error.unwrap().message.contains("parsec"));

        let r = call(&mut host, "convert", json!({ "value": "abc", "from": "km" }));
        assert!(r.error.unwrap().message.contains("invalid number"));
    }

    #[test]
    fn test_units() {
        let r = handle_units(&Some(json!({ "quantity": "t" }))).unwrap();
        let quantities = r["quantities"].as_array().unwrap();
        assert_eq!(quantities.len(), 1);
        assert_eq!(quantities[0]["quantity"], "temperature");
        assert_eq!(quantities[0]["units"].as_array().unwrap().len(), 3);
        assert_eq!(r["names"].as_array().unwrap().len(), 23);

        let err = handle_units(&Some(json!({ "quantity": "x" }))).unwrap_err();
        assert_eq!(err.code, CONVERSION_FAILED);
    }

    #[test]
    fn test_settings_report() {
        let mut host = Host::new(Preferences::default());
        let r = result(call(&mut host, "settings", json!({
            "settings": { "decimalPlaces": 4, "maxDecimalPlaces": 2 }
        })));
        assert_eq!(r["settings"]["maxDecimalPlaces"], 4);
        assert!(r["problem"].as_str().unwrap().contains("maxDecimalPlaces"));

        let r = call(&mut host, "settings", json!({ "settings": { "preferredWeight": "stone" } }));
        assert_eq!(r.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn test_unknown_method() {
        let mut host = Host::new(Preferences::default());
        let r = call(&mut host, "render", json!({}));
        assert_eq!(r.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[test]
    fn test_stats_after_annotate() {
        let mut host = Host::new(Preferences::default());
        call(&mut host, "annotate", json!({ "text": "5km 5km" }));
        let r = result(call(&mut host, "stats", json!({})));
        assert_eq!(r["hits"], 1);
        assert_eq!(r["entries"], 1);
    }
}
