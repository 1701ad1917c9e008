use anyhow::anyhow;
use clap::Parser;
use retrofit_engine::output::FileOutput;
use retrofit_engine::run_assessment;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct RetrofitArgs {
    #[arg(help = "Path to an assessment request in .json format")]
    input_file: String,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
    #[clap(
        long,
        default_value_t = false,
        help = "Only log warnings and errors"
    )]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = RetrofitArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let max_level = if args.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::TRACE
        };
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(max_level);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .map_err(|e| anyhow!("setting tracing subscriber failed: {e}"))?;

    let input_file = Path::new(args.input_file.as_str());
    let input_file_stem = input_file.with_extension("");
    let input_file_name = input_file_stem
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Input file name '{}' is not valid", args.input_file))?;

    let mut output_path = PathBuf::new();
    output_path.push(format!("{}__results", input_file_stem.display()));
    fs::create_dir_all(&output_path)?;
    let file_output = FileOutput::new(output_path.clone(), format!("{input_file_name}__{{}}.json"));

    let results = run_assessment(BufReader::new(File::open(input_file)?), &file_output)?;

    info!(
        scenarios = results.scenarios.len(),
        performance = results.performance.is_some(),
        building_lca = results.building_lca.is_some(),
        "results written to {}",
        output_path.display()
    );

    Ok(())
}
