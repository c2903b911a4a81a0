use kelp::model::Connection;
use kelp::path::path_d;
use kelp::{Commit, EntityId, NodeId, Point, Shape, TreeChart, TreeConfig};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Kelp(kelp::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Kelp(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<kelp::Error> for CliError {
    fn from(value: kelp::Error) -> Self {
        Self::Kelp(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Render,
    Snapshot,
}

#[derive(Debug, Clone)]
enum Step {
    Expand(usize),
    Collapse(usize),
    Toggle(NodeId),
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    verbose: bool,
    width: Option<f64>,
    height: Option<f64>,
    pixels_per_node: Option<f64>,
    steps: Vec<Step>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathOut<'a> {
    entity: &'a EntityId,
    d: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitOut<'a> {
    #[serde(flatten)]
    commit: &'a Commit,
    paths: Vec<PathOut<'a>>,
}

fn usage() -> &'static str {
    "kelp-cli\n\
\n\
USAGE:\n\
  kelp-cli [layout] [OPTIONS] [<path>|-]\n\
  kelp-cli render [OPTIONS] [<path>|-]\n\
  kelp-cli snapshot [OPTIONS] [<path>|-]\n\
\n\
OPTIONS:\n\
  --pretty                 pretty-print JSON output\n\
  --width <w>              outer canvas width\n\
  --height <h>             fixed outer canvas height\n\
  --pixels-per-node <n>    auto-height pixels per visible row (0 disables)\n\
  --expand <depth>         open nodes shallower than <depth>\n\
  --collapse <depth>       close nodes at depth >= <depth>\n\
  --toggle <id>            flip one node\n\
  --verbose                log to stderr\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a hierarchy object, or {\"tree\": ..., \"connections\": [...], \"config\": {...}}.\n\
  - Commands are applied in argument order; render prints one commit per command plus the\n\
    initial one.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_f64(s: &str) -> Result<f64, CliError> {
    s.parse::<f64>().map_err(|_| CliError::Usage(usage()))
}

fn parse_depth(s: &str) -> Result<usize, CliError> {
    s.parse::<usize>().map_err(|_| CliError::Usage(usage()))
}

fn parse_node_id(s: &str) -> NodeId {
    match s.parse::<u64>() {
        Ok(v) => NodeId::Int(v),
        Err(_) => NodeId::Name(s.to_string()),
    }
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "snapshot" => args.command = Command::Snapshot,
            "--pretty" => args.pretty = true,
            "--verbose" => args.verbose = true,
            "--width" => args.width = Some(parse_f64(next_value(&mut it)?)?),
            "--height" => args.height = Some(parse_f64(next_value(&mut it)?)?),
            "--pixels-per-node" => args.pixels_per_node = Some(parse_f64(next_value(&mut it)?)?),
            "--expand" => args
                .steps
                .push(Step::Expand(parse_depth(next_value(&mut it)?)?)),
            "--collapse" => args
                .steps
                .push(Step::Collapse(parse_depth(next_value(&mut it)?)?)),
            "--toggle" => args
                .steps
                .push(Step::Toggle(parse_node_id(next_value(&mut it)?))),
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

/// Splits the input document into the hierarchy, extra connections and config.
fn split_document(doc: Value) -> Result<(Value, Option<Vec<Connection>>, TreeConfig), CliError> {
    let Value::Object(mut map) = doc else {
        return Ok((doc, None, TreeConfig::default()));
    };
    let Some(tree) = map.remove("tree") else {
        return Ok((Value::Object(map), None, TreeConfig::default()));
    };
    let connections = match map.remove("connections") {
        Some(v) => Some(serde_json::from_value::<Vec<Connection>>(v)?),
        None => None,
    };
    let config = match map.get("config") {
        Some(v) => TreeConfig::from_json(v)?,
        None => TreeConfig::default(),
    };
    Ok((tree, connections, config))
}

fn apply(chart: &mut TreeChart, step: &Step) {
    match step {
        Step::Expand(depth) => chart.expand(Some(*depth)),
        Step::Collapse(depth) => chart.collapse(Some(*depth)),
        Step::Toggle(id) => {
            if !chart.toggle(id) {
                tracing::info!(%id, "toggle had no effect");
            }
        }
    }
}

fn paths(commit: &Commit, margin: f64) -> Vec<PathOut<'_>> {
    let offset = Point::new(margin, margin);
    commit
        .instructions
        .iter()
        .filter_map(|ins| match &ins.transition_to {
            Shape::Path(g) => Some(PathOut {
                entity: &ins.entity,
                d: path_d(g, offset),
            }),
            Shape::Circle { .. } => None,
        })
        .collect()
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let doc: Value = serde_json::from_str(&text)?;
    let (tree, connections, mut config) = split_document(doc)?;
    if let Some(w) = args.width {
        config.width = w;
    }
    if args.height.is_some() {
        config.height = args.height;
    }
    if let Some(n) = args.pixels_per_node {
        config.pixels_per_node = n;
    }

    let mut chart = TreeChart::new(config)?;
    chart.bind(tree)?;
    if let (Some(connections), Some(model)) = (connections, chart.model_mut()) {
        model.set_connections(connections);
    }

    match args.command {
        Command::Layout => {
            for step in &args.steps {
                apply(&mut chart, step);
            }
            let Some(layout) = chart.layout() else {
                return Ok(());
            };
            write_json(&layout, args.pretty)
        }
        Command::Snapshot => {
            for step in &args.steps {
                apply(&mut chart, step);
            }
            write_json(&chart.snapshot_open_state(), args.pretty)
        }
        Command::Render => {
            let margin = chart.config().margin;
            let mut commits: Vec<Commit> = Vec::with_capacity(args.steps.len() + 1);
            commits.extend(chart.render());
            for step in &args.steps {
                apply(&mut chart, step);
                commits.extend(chart.render());
            }
            let out: Vec<CommitOut<'_>> = commits
                .iter()
                .map(|commit| CommitOut {
                    commit,
                    paths: paths(commit, margin),
                })
                .collect();
            write_json(&out, args.pretty)
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
