//! textgen-cli: talk to a local text-generation backend from the shell.
//!
//! Usage:
//!   textgen-cli generate [--class <c>] <prompt...>   Generate a complete response
//!   textgen-cli stream [--class <c>] <prompt...>     Stream a response as it is produced
//!   textgen-cli models                               List installed models
//!   textgen-cli health                               Check that the backend answers
//!   textgen-cli codes [SERVICE]                      List error codes
//!   textgen-cli explain <CODE>                       Describe one error code

use anyhow::{bail, Context};
use futures::StreamExt;
use std::io::Write;
use textgen_client::error_code;
use textgen_client::{
    classify, ClientBuilder, Error, GenerationClient, QueryClassification, Settings,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let rest = &args[2..];
    let outcome = match args[1].as_str() {
        "generate" => cmd_generate(rest).await,
        "stream" => cmd_stream(rest).await,
        "models" => cmd_models(rest).await,
        "health" => cmd_health(rest).await,
        "codes" => cmd_codes(rest),
        "explain" => cmd_explain(rest),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        report(&e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"textgen-cli: client for local text-generation backends

USAGE:
    textgen-cli <COMMAND> [OPTIONS]

COMMANDS:
    generate [--class <c>] <prompt...>   Generate a complete response
    stream [--class <c>] <prompt...>     Stream a response as it is produced
    models                               List installed models
    health                               Check that the backend answers
    codes [SERVICE]                      List error codes (LLM, VCE, CAD, VIS, NET, DB)
    explain <CODE>                       Describe one error code
    version                              Show version information
    help                                 Show this help message

OPTIONS:
    --config <file>                      YAML settings file
    --class <c>                          general, code, technical, error, mathematical, creative

ENVIRONMENT:
    TEXTGEN_BASE_URL, TEXTGEN_TIMEOUT_SECS, TEXTGEN_MAX_RETRIES, TEXTGEN_RETRY_DELAY_MS,
    TEXTGEN_ALTERNATE_ENDPOINTS, TEXTGEN_API_KEY, RUST_LOG"#
    );
}

fn cmd_version() {
    println!("textgen-cli {}", env!("CARGO_PKG_VERSION"));
}

/// Flags shared by the network commands; everything else is the prompt.
struct Invocation {
    config: Option<String>,
    class: QueryClassification,
    words: Vec<String>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Invocation> {
    let mut inv = Invocation {
        config: None,
        class: QueryClassification::default(),
        words: Vec::new(),
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                inv.config = Some(iter.next().context("--config needs a file path")?.clone());
            }
            "--class" => {
                let raw = iter.next().context("--class needs a value")?;
                inv.class = raw.parse()?;
            }
            _ => inv.words.push(arg.clone()),
        }
    }
    Ok(inv)
}

fn build_client(inv: &Invocation) -> anyhow::Result<GenerationClient> {
    let builder = match &inv.config {
        Some(path) => ClientBuilder::new().settings(
            Settings::from_file(path).with_context(|| format!("loading {path}"))?,
        ),
        None => ClientBuilder::from_env(),
    };
    Ok(builder.build()?)
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

fn prompt_of(inv: &Invocation) -> anyhow::Result<String> {
    let prompt = inv.words.join(" ");
    if prompt.trim().is_empty() {
        bail!("a prompt is required");
    }
    Ok(prompt)
}

async fn cmd_generate(args: &[String]) -> anyhow::Result<()> {
    let inv = parse_args(args)?;
    let prompt = prompt_of(&inv)?;
    let client = build_client(&inv)?;
    let cancel = cancel_on_ctrl_c();

    let text = client.generate(&prompt, inv.class, &cancel).await?;
    println!("{text}");
    Ok(())
}

async fn cmd_stream(args: &[String]) -> anyhow::Result<()> {
    let inv = parse_args(args)?;
    let prompt = prompt_of(&inv)?;
    let client = build_client(&inv)?;
    let cancel = cancel_on_ctrl_c();

    let mut chunks = client.stream_generate(&prompt, inv.class, &cancel).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        write!(stdout, "{}", chunk.text)?;
        stdout.flush()?;
    }
    println!();
    Ok(())
}

async fn cmd_models(args: &[String]) -> anyhow::Result<()> {
    let inv = parse_args(args)?;
    let client = build_client(&inv)?;
    let cancel = cancel_on_ctrl_c();

    let models = client.list_models(&cancel).await?;
    if models.is_empty() {
        println!("No models installed.");
        return Ok(());
    }
    println!("{:<40} {:>14}  {}", "NAME", "SIZE", "DIGEST");
    for m in models {
        println!(
            "{:<40} {:>14}  {}",
            m.name,
            m.size.as_deref().unwrap_or("-"),
            m.digest.as_deref().map(short_digest).unwrap_or("-"),
        );
    }
    Ok(())
}

async fn cmd_health(args: &[String]) -> anyhow::Result<()> {
    let inv = parse_args(args)?;
    let client = build_client(&inv)?;
    let cancel = cancel_on_ctrl_c();

    let base_url = client.config().base_url.clone();
    if client.is_available(&cancel).await {
        println!("OK  {base_url}");
    } else {
        println!("DOWN  {base_url}");
        std::process::exit(2);
    }

    let mut missing = Vec::new();
    for model in client.model_policy().models() {
        if !client.has_model(model, &cancel).await {
            missing.push(model.to_string());
        }
    }
    if !missing.is_empty() {
        println!("Models not installed: {}", missing.join(", "));
    }
    Ok(())
}

fn cmd_codes(args: &[String]) -> anyhow::Result<()> {
    let wanted = match args.first() {
        Some(raw) => Some(
            error_code::Service::parse(&raw.to_ascii_uppercase())
                .with_context(|| format!("unknown service '{raw}'"))?,
        ),
        None => None,
    };

    for code in error_code::all_codes() {
        let service = error_code::get_service_from_code(code).and_then(error_code::Service::parse);
        if wanted.is_some() && service != wanted {
            continue;
        }
        println!("{code:<14} {}", error_code::get_message(code, None));
    }
    Ok(())
}

fn cmd_explain(args: &[String]) -> anyhow::Result<()> {
    let code = args.first().context("explain needs an error code")?;
    if !error_code::is_valid_code(code) {
        bail!("'{code}' is not of the form SERVICE-CATEGORY-NNN");
    }
    println!("Code:     {code}");
    println!(
        "Service:  {}",
        error_code::get_service_from_code(code).unwrap_or("-")
    );
    println!(
        "Category: {}",
        error_code::get_category_from_code(code).unwrap_or("-")
    );
    println!("Message:  {}", error_code::get_message(code, None));
    if let Some(action) = error_code::suggested_action(code) {
        println!("Action:   {action}");
    }
    Ok(())
}

/// Print a classified failure when the client produced it, the plain chain otherwise.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<Error>() {
        Some(raw) => {
            let record = classify(raw, Some("cli"));
            eprintln!("{record}");
            if let Some(action) = record.suggested_action() {
                eprintln!("  -> {action}");
            }
            eprintln!("  ({})", record.technical_details());
        }
        None => eprintln!("Error: {err:#}"),
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
