//! Swagger Client CLI
//!
//! Command-line interface for sending requests described by a Swagger document.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Map, Value};
use swagger_client::{
    lint, ApiDocument, Call, Client, ClientConfig, Dispatch, DocumentOverrides, DocumentSource,
    RequestInput, Severity,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "swagger-client")]
#[command(about = "Send HTTP requests described by a Swagger 2.0 document")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every operation in the document
    Operations {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Call an operation by operationId, or a path by HTTP verb
    Call {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// operationId, or a verb (get, post, ...); append "Async" for the async flavor
        name: String,

        /// Request path for verb calls (default: /)
        path: Option<String>,

        /// Parameter as name=value (value parsed as JSON when possible)
        #[arg(long = "param", short = 'p', value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Raw transport options as a JSON object (e.g. '{"headers":{"X-Trace":"abc"}}')
        #[arg(long)]
        http: Option<String>,

        /// Print the prepared request instead of sending it
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Check the document's operations and parameters for errors
    Lint {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Scheme to use (required when the document allows several)
    #[arg(long)]
    scheme: Option<String>,

    /// Host override
    #[arg(long)]
    host: Option<String>,

    /// basePath override
    #[arg(long)]
    base_path: Option<String>,

    /// Full base URI, bypassing scheme/host/basePath
    #[arg(long)]
    base_uri: Option<String>,

    /// Transport option as key=value (e.g. timeout=5)
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE")]
    options: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Operations { document, json } => run_operations(&document, json),

        Commands::Call {
            document,
            name,
            path,
            params,
            http,
            dry_run,
            target,
        } => run_call(CallArgs {
            document,
            name,
            path,
            params,
            http,
            dry_run,
            target,
        }),

        Commands::Lint {
            document,
            format,
            strict,
        } => run_lint(&document, &format, strict),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load(document: &str) -> Result<ApiDocument, u8> {
    ApiDocument::load(DocumentSource::from(document), &DocumentOverrides::default()).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_operations(document: &str, json_output: bool) -> Result<(), u8> {
    let document = load(document)?;
    let operations = document.operations();

    if json_output {
        let listing: Vec<Value> = operations
            .iter()
            .map(|op| {
                json!({
                    "method": op.method,
                    "path": op.path,
                    "operationId": op.operation_id(),
                })
            })
            .collect();
        println!("{}", Value::from(listing));
    } else {
        for op in operations {
            println!(
                "{:<7} {} {}",
                op.method.to_uppercase(),
                op.path,
                op.operation_id().unwrap_or("-")
            );
        }
    }
    Ok(())
}

struct CallArgs {
    document: String,
    name: String,
    path: Option<String>,
    params: Vec<String>,
    http: Option<String>,
    dry_run: bool,
    target: TargetArgs,
}

fn run_call(args: CallArgs) -> Result<(), u8> {
    let CallArgs {
        document,
        name,
        path,
        params,
        http,
        dry_run,
        target,
    } = args;

    let input = build_input(&params, http.as_deref())?;
    let config = build_config(document, target)?;

    if dry_run {
        // No transport is ever built for a dry run
        let client = Client::with_transport(config, |_, _| Ok(())).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        let call = Call::parse(&name);
        let prepared = client
            .prepare_call(&call, path.as_deref(), Some(input))
            .map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
        let url = url::Url::parse(client.base_uri())
            .and_then(|base| prepared.url(&base))
            .map(|url| url.to_string())
            .map_err(|e| {
                eprintln!("Error: invalid URL: {}", e);
                2u8
            })?;

        let output = json!({
            "method": prepared.method.to_uppercase(),
            "url": url,
            "async": call.is_async(),
            "options": prepared.options,
        });
        println!("{}", output);
        return Ok(());
    }

    let client = Client::new(config).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let dispatched = client
        .call(&name, path.as_deref(), Some(input))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let body = match dispatched {
        Dispatch::Ready(response) => response.text().map_err(|e| {
            eprintln!("Error reading response: {}", e);
            3u8
        })?,
        Dispatch::Pending(pending) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    eprintln!("Error starting runtime: {}", e);
                    3u8
                })?;
            runtime.block_on(async {
                let response = pending.await.map_err(|e| {
                    eprintln!("Error: {}", e);
                    e.exit_code() as u8
                })?;
                let text = response.text().await.map_err(|e| {
                    eprintln!("Error reading response: {}", e);
                    3u8
                })?;
                Ok::<_, u8>(text)
            })?
        }
    };

    if !body.is_empty() {
        println!("{}", body);
    }
    Ok(())
}

/// Parse `-p name=value` pairs and the `--http` object into request input.
fn build_input(params: &[String], http: Option<&str>) -> Result<RequestInput, u8> {
    let mut input = RequestInput::new();
    for (name, value) in parse_pairs(params, "--param")? {
        input.insert(name, value);
    }

    if let Some(raw) = http {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => input = input.http(value),
            Ok(_) | Err(_) => {
                eprintln!("Error: --http must be a JSON object");
                return Err(2);
            }
        }
    }
    Ok(input)
}

fn build_config(document: String, target: TargetArgs) -> Result<ClientConfig, u8> {
    let TargetArgs {
        scheme,
        host,
        base_path,
        base_uri,
        options,
    } = target;

    let mut config = ClientConfig::new(document);
    config.scheme = scheme;
    config.host = host;
    config.base_path = base_path;
    config.base_uri = base_uri;
    config.transport = parse_pairs(&options, "--option")?.into_iter().collect::<Map<_, _>>();
    Ok(config)
}

fn parse_pairs(pairs: &[String], flag: &str) -> Result<Vec<(String, Value)>, u8> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), parse_value(value))),
            None => {
                eprintln!("Error: {} expects KEY=VALUE, got \"{}\"", flag, pair);
                Err(2)
            }
        })
        .collect()
}

/// JSON when the text parses as JSON, otherwise a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn run_lint(document: &str, format: &str, strict: bool) -> Result<(), u8> {
    let document = load(document)?;
    let result = lint(&document);
    let passed = result.is_ok() && (!strict || result.warnings == 0);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        for diag in &result.diagnostics {
            let (color, label) = match diag.severity {
                Severity::Error => ("\x1b[31m", "error"),
                Severity::Warning => ("\x1b[33m", "warning"),
            };
            println!(
                "  {}{}[{}]\x1b[0m: {} {} - {}",
                color, label, diag.code, diag.operation, diag.pointer, diag.message
            );
        }

        if passed {
            println!(
                "\x1b[32m✓ {} operations checked, all passed\x1b[0m",
                result.operations_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} operations checked ({} errors, {} warnings)\x1b[0m",
                result.operations_checked, result.errors, result.warnings
            );
        }
    }

    if passed {
        Ok(())
    } else {
        Err(1)
    }
}
