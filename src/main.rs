use std::{
    fs::read_to_string,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use toy::{
    backend::ir::IrBackend,
    config::{parse_operator, Config},
    toplevel::{Outcome, Session},
};

/// Parses toy programs, generates code for each top-level construct and
/// evaluates bare expressions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Source file to read. Reads standard input when absent.
    file: Option<PathBuf>,

    /// Name of the generated module.
    #[arg(long, default_value = "toy jit")]
    module_name: String,

    /// Extra binary operator precedence, written as `<char>=<precedence>`.
    #[arg(long = "operator", value_parser = parse_operator)]
    operators: Vec<(char, i32)>,

    /// Generate top-level expressions without evaluating them.
    #[arg(long)]
    no_eval: bool,

    /// Report constructs without their generated code.
    #[arg(long)]
    quiet_ir: bool,

    /// Maximum call nesting while evaluating.
    #[arg(long, default_value_t = 256)]
    max_call_depth: usize,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config {
            module_name: args.module_name.clone(),
            operators: args.operators.clone(),
            print_ir: !args.quiet_ir,
            evaluate: !args.no_eval,
            max_call_depth: args.max_call_depth,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let (source, file_name) = match &args.file {
        Some(path) => {
            let source = read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            (source, Some(file_name))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read standard input")?;
            (source, None)
        }
    };

    let config = Config::from(&args);
    let backend = IrBackend::new(&config);
    let mut session = Session::from_source(&source, file_name, backend, config);

    let failures = session.run(|outcome, text| match outcome {
        Outcome::Failed(_) => eprintln!("{}", text),
        _ => println!("{}", text),
    });

    log::debug!("finished with {} failed constructs", failures);

    Ok(())
}
