//! viz CLI entry point: DOT text in, rendered graph out.

use std::fs;
use std::io::{self, Read, Write};
use std::process;

use clap::Parser;
use tracing::Level;

use viz_component::{RenderConfig, get_graphviz_version, get_plugin_list, render_with_config};

/// Lay out and render a DOT graph.
#[derive(Parser, Debug)]
#[command(name = "viz", about = "Lay out and render a DOT graph")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<String>,

    /// Layout engine (dot, neato, fdp, circo)
    #[arg(short = 'K', long = "engine", default_value = "dot")]
    engine: String,

    /// Output format (svg, dot, gv, canon, plain, json)
    #[arg(short = 'T', long = "format", default_value = "svg")]
    format: String,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Report y growing downwards in dot, plain and json output
    #[arg(long = "y-invert")]
    y_invert: bool,

    /// Leave isolated nodes out of force-directed layouts
    #[arg(long = "reduce")]
    reduce: bool,

    /// Print the engine version and exit
    #[arg(long = "version-info")]
    version_info: bool,

    /// List the plugins of one kind (layout, render, device) and exit
    #[arg(long = "list", value_name = "KIND")]
    list: Option<String>,

    /// Log engine activity to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .init();

    if cli.version_info {
        println!("{}", get_graphviz_version());
        return;
    }
    if let Some(kind) = cli.list.as_deref() {
        let names = get_plugin_list(kind);
        if names.is_empty() {
            fail(format!("no plugins of kind '{}'", kind));
        }
        println!("{}", names.join(" "));
        return;
    }

    // Read input from file or stdin
    let text = if let Some(ref path) = cli.input {
        match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => fail(format!("cannot read '{}': {}", path, e)),
        }
    } else {
        let mut buf = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut buf) {
            fail(format!("cannot read stdin: {}", e));
        }
        buf
    };

    let config = RenderConfig {
        engine: cli.engine,
        format: cli.format,
        y_invert: cli.y_invert,
        reduce: cli.reduce,
    };
    let rendered = match render_with_config(&text, &config) {
        Ok(bytes) => bytes,
        Err(e) => fail(e),
    };

    if let Some(ref path) = cli.output {
        if let Err(e) = fs::write(path, &rendered) {
            fail(format!("cannot write '{}': {}", path, e));
        }
    } else {
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(&rendered).and_then(|()| stdout.flush()) {
            fail(format!("cannot write stdout: {}", e));
        }
    }
}
