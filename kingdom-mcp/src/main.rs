use anyhow::{Context, Result};
use kingdom_core::{format_listings, Config, FoilFilter, ParsePolicy, PriceSearch, SearchOptions};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};

// ============ MCP stdio framing ============

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FramingMode { Lsp, Lines }

/// One framed payload. Bad JSON inside intact framing is reported, not fatal.
#[derive(Debug)]
enum Incoming {
    Message(Value),
    Malformed(serde_json::Error),
}

fn decode(bytes: &[u8]) -> Incoming {
    match serde_json::from_slice(bytes) {
        Ok(v) => Incoming::Message(v),
        Err(e) => Incoming::Malformed(e),
    }
}

/// Read one message. Two framings are accepted:
/// 1) LSP-style headers with Content-Length and a blank line
/// 2) newline-delimited JSON
/// Only I/O failures are errors; `None` means stdin closed.
fn read_message(stdin: &mut impl BufRead) -> Result<Option<(Incoming, FramingMode)>> {
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 { return Ok(None); }

    if line.trim_start().starts_with('{') {
        log::trace!("[lines] {}", line.trim_end());
        return Ok(Some((decode(line.trim_end().as_bytes()), FramingMode::Lines)));
    }

    // Header block: the first line is already in hand, stop at the blank separator or EOF
    let mut content_length: Option<usize> = None;
    while !line.trim().is_empty() {
        log::trace!("[hdr] {}", line.trim_end());
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().ok();
            }
        }
        line.clear();
        if stdin.read_line(&mut line)? == 0 { break; }
    }

    let Some(len) = content_length.filter(|n| *n > 0) else {
        return Ok(Some((Incoming::Message(Value::Null), FramingMode::Lsp)));
    };
    let mut body = vec![0u8; len];
    stdin.read_exact(&mut body)?;
    Ok(Some((decode(&body), FramingMode::Lsp)))
}

fn write_message(stdout: &mut impl Write, v: &Value, mode: FramingMode) -> Result<()> {
    match mode {
        FramingMode::Lines => {
            let body = serde_json::to_string(v)?;
            writeln!(stdout, "{}", body)?;
            stdout.flush()?;
            log::trace!("[send-lines] {} chars", body.len());
        }
        FramingMode::Lsp => {
            let body = serde_json::to_vec(v)?;
            write!(
                stdout,
                "Content-Length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n",
                body.len()
            )?;
            stdout.write_all(&body)?;
            stdout.flush()?;
            log::trace!("[send-lsp] {} bytes", body.len());
        }
    }
    Ok(())
}

/// Requests carry an id; notifications do not and fail to deserialize here.
#[derive(Deserialize)]
struct Request {
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

// ============ Tool handlers ============

fn handle_initialize(id: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "protocolVersion": "2024-11-05",
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "kingdom-mcp", "version": env!("CARGO_PKG_VERSION") }
        }
    })
}

fn tools_list() -> Vec<Value> {
    vec![tool(
        "search_prices",
        "Search for card prices on Card Kingdom with advanced filters",
        json!({"type":"object","properties":{
            "query":{"type":"string","description":"The name of the card to search for"},
            "set_code":{"type":"string","description":"Optional: set code to filter by (e.g. 'MH2'). Unknown codes are tried as an edition name (e.g. 'Commander'), else all sets are searched."},
            "is_foil":{"type":"boolean","description":"Optional: true for foil only, false for non-foil only. If omitted, returns both."},
            "variant":{"type":"string","description":"Optional: filter by variant type (e.g. 'Borderless', 'Etched', 'Showcase', 'Extended Art')"},
            "strict":{"type":"boolean","description":"Optional: drop listings whose price or stock could not be read instead of reporting them as zero"}
        },"required":["query"]}),
    )]
}

fn tool(name: &str, description: &str, input_schema: Value) -> Value {
    json!({"name": name, "description": description, "inputSchema": input_schema })
}

fn handle_tools_list(id: Value) -> Value {
    json!({"jsonrpc":"2.0","id":id,"result": {"tools": tools_list()}})
}

fn tool_text(id: Value, text: String, is_error: bool) -> Value {
    json!({"jsonrpc":"2.0","id": id, "result": { "content": [{"type":"text","text": text}], "isError": is_error }})
}

/// Type-check the `search_prices` argument bag. Only `query` is required;
/// optional fields of the wrong type are ignored.
fn parse_search_args(args: &Value) -> std::result::Result<SearchOptions, String> {
    let query = match args.get("query") {
        Some(Value::String(s)) => s,
        Some(_) => return Err("Invalid query: \"query\" must be a string".to_string()),
        None => return Err("Invalid query: required argument \"query\" not found".to_string()),
    };
    let opts = SearchOptions::new(query).map_err(|e| format!("Invalid query: {}", e))?;
    let str_arg = |key: &str| args.get(key).and_then(|v| v.as_str()).map(str::to_string);
    let policy = match args.get("strict").and_then(|v| v.as_bool()) {
        Some(true) => ParsePolicy::Strict,
        _ => ParsePolicy::Lenient,
    };
    Ok(opts
        .with_set_code(str_arg("set_code"))
        .with_foil(FoilFilter::from_flag(args.get("is_foil").and_then(|v| v.as_bool())))
        .with_variant(str_arg("variant"))
        .with_parse_policy(policy))
}

fn handle_call(id: Value, params: &Value, search: &PriceSearch) -> Value {
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or(json!({}));
    if name != "search_prices" {
        return tool_text(id, format!("Unknown tool: {}", name), true);
    }
    let opts = match parse_search_args(&args) {
        Ok(o) => o,
        Err(msg) => return tool_text(id, msg, true),
    };
    match search.search(&opts) {
        Ok(prices) => {
            let text = format_listings(&opts.query, &prices);
            json!({"jsonrpc":"2.0","id": id, "result": {
                "content": [{"type":"text","text": text}],
                "isError": false,
                "_meta": { "count": prices.len(), "listings": prices }
            }})
        }
        Err(e) => {
            log::warn!("search_prices {:?} failed: {}", opts.query, e);
            tool_text(id, format!("Failed to search prices: {}", e), true)
        }
    }
}

fn dispatch(req: Request, search: &PriceSearch) -> Value {
    match req.method.as_str() {
        "initialize" => handle_initialize(req.id),
        "tools/list" => handle_tools_list(req.id),
        "tools/call" => handle_call(req.id, &req.params, search),
        "ping" => json!({"jsonrpc":"2.0","id":req.id,"result":{}}),
        _ => json!({"jsonrpc":"2.0","id":req.id,"error":{"code": -32601, "message":"Method not found"}}),
    }
}

fn init_logging() {
    let level = if kingdom_core::config::debug_enabled() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn parse_error(e: &serde_json::Error) -> Value {
    json!({"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":format!("Parse error: {}", e)}})
}

/// Answer messages until stdin closes.
fn serve(stdin: &mut impl BufRead, stdout: &mut impl Write, search: &PriceSearch) -> Result<()> {
    while let Some((incoming, mode)) = read_message(stdin)? {
        let msg = match incoming {
            Incoming::Message(v) => v,
            Incoming::Malformed(e) => {
                log::warn!("[recv] unparsable message: {}", e);
                write_message(stdout, &parse_error(&e), mode)?;
                continue;
            }
        };
        match serde_json::from_value::<Request>(msg) {
            Ok(req) => {
                log::debug!("[recv] method={} id={}", req.method, req.id);
                let resp = dispatch(req, search);
                write_message(stdout, &resp, mode)?;
            }
            Err(_) => log::debug!("[recv] non-request/ignored"),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let config = Config::from_env();
    let search = PriceSearch::from_config(&config).context("initializing catalog search")?;
    log::info!("kingdom-mcp ready (catalog {}, set cache {})", config.catalog_url, search.resolver().cache_path().display());

    let stdin = std::io::stdin();
    let mut stdin = BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout();
    serve(&mut stdin, &mut stdout, &search)
}
