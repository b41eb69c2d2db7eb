//! CLI command implementations.

use std::io::{self, Read};
use std::path::Path;

use checkq::graphite;
use checkq::query::Field;
use checkq::{Config, Error, GroupLimit, Query};

/// Read the positional argument, or all of stdin when it is absent.
fn read_arg_or_stdin(arg: Option<&str>) -> io::Result<String> {
    match arg {
        Some(value) => Ok(value.to_string()),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Read a file, with "-" meaning stdin.
fn read_file_or_stdin(path: &str) -> io::Result<String> {
    if path == "-" {
        read_arg_or_stdin(None)
    } else {
        std::fs::read_to_string(path)
    }
}

fn load_config(path: Option<&Path>) -> checkq::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Commands that act on a query treat "no query" as a missing metric.
fn require_query(raw: &str) -> checkq::Result<Query> {
    checkq::parse(raw)?.ok_or_else(|| Error::MissingRequiredField(Field::Metric.name().to_string()))
}

fn group_limit_label(group_limit: &GroupLimit) -> String {
    match group_limit {
        GroupLimit::None => "none".to_string(),
        GroupLimit::All => "all".to_string(),
        GroupLimit::Any => "any".to_string(),
        GroupLimit::Comparison(c) => c.to_string(),
    }
}

/// Decode a query and print it.
pub fn parse(raw: &str, format: &str) -> checkq::Result<()> {
    let parsed = checkq::parse(raw)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        _ => {
            let Some(q) = parsed else {
                println!("no query");
                return Ok(());
            };
            let limits: Vec<String> = q.limit.iter().map(ToString::to_string).collect();
            println!("{:<22} {}", "from:", q.from);
            println!("{:<22} {}", "until:", q.until);
            println!("{:<22} {}", "limit:", limits.join(", "));
            println!("{:<22} {}", "group_limit:", group_limit_label(&q.group_limit));
            println!("{:<22} {}", "include_empty_targets:", q.include_empty_targets);
            println!("metric:");
            for line in checkq::indent(&q.metric).lines() {
                println!("  {}", line);
            }
        }
    }

    Ok(())
}

/// Encode a JSON query record.
pub fn serialize(file: Option<&str>, absolute: bool, config: Option<&Path>) -> checkq::Result<()> {
    let json = match file {
        Some(path) => read_file_or_stdin(path)?,
        None => read_arg_or_stdin(None)?,
    };
    let q: Query = serde_json::from_str(&json)?;

    if absolute {
        println!("{}", load_config(config)?.check_url(&q));
    } else {
        println!("{}", checkq::serialize(&q));
    }
    Ok(())
}

/// Parse and re-serialize a query.
pub fn normalize(raw: &str) -> checkq::Result<()> {
    match checkq::parse(raw)? {
        Some(q) => println!("{}", checkq::serialize(&q)),
        None => println!(),
    }
    Ok(())
}

/// Pretty-print a metric expression.
pub fn indent(expr: Option<&str>, strict: bool) -> checkq::Result<()> {
    let input = read_arg_or_stdin(expr)?;
    // Accept already-indented input
    let flat = checkq::dedent(&input);
    if strict {
        checkq::check_balance(&flat)?;
    }
    println!("{}", checkq::indent(&flat));
    Ok(())
}

/// Flatten a metric expression.
pub fn dedent(expr: Option<&str>) -> checkq::Result<()> {
    let input = read_arg_or_stdin(expr)?;
    println!("{}", checkq::dedent(&input));
    Ok(())
}

/// Print the Graphite URL for a query.
pub fn render_url(raw: &str, chart: bool, config: Option<&Path>) -> checkq::Result<()> {
    let q = require_query(raw)?;
    let config = load_config(config)?;
    if chart {
        println!("{}", graphite::chart_url(&config, &q));
    } else {
        println!("{}", graphite::render_url(&config, &q));
    }
    Ok(())
}

/// Evaluate a query against saved render output. Returns whether the check
/// passed.
pub fn eval(raw: &str, data: &str, format: &str, config: Option<&Path>) -> checkq::Result<bool> {
    let q = require_query(raw)?;
    let body = read_file_or_stdin(data)?;
    let series = graphite::parse_response(&body)?;
    let outcome = checkq::evaluate(&q, &series);
    tracing::info!(ok = outcome.ok, targets = series.len(), "evaluated check");

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&outcome)?),
        _ => {
            println!("{}", outcome);
            if !outcome.ok {
                let config = load_config(config)?;
                println!("Chart: {}", graphite::chart_url(&config, &q));
            }
        }
    }

    Ok(outcome.ok)
}
