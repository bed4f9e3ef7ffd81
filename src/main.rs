use prjunnamed_netlist::Design;
use std::process::ExitCode;
use std::sync::Arc;

use lutmap::cm::{self, MapOptions};
use lutmap::target::LutTarget;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut input_fn = String::new();
    let mut output_fn = String::new();
    let mut no_dual_output = false;
    let mut max_iterations = 10usize;

    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Map primitive combinational gates onto LUT6/LUT6D cells.");
        parser
            .refer(&mut input_fn)
            .add_argument("INPUT", argparse::Store, "Input netlist")
            .required();
        parser
            .refer(&mut output_fn)
            .add_argument("OUTPUT", argparse::Store, "Output netlist")
            .required();
        parser.refer(&mut no_dual_output).add_option(
            &["--no-dual-output"],
            argparse::StoreTrue,
            "Disable dual-output LUT pairing",
        );
        parser.refer(&mut max_iterations).add_option(
            &["--max-iterations"],
            argparse::Store,
            "Maximum area-flow iterations",
        );
        parser.parse_args_or_exit();
    }

    let target = Arc::new(LutTarget::new());

    let source = match std::fs::read_to_string(&input_fn) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("cannot read {input_fn}: {error}");
            return ExitCode::from(1);
        }
    };
    let mut design: Design = match prjunnamed_netlist::parse(Some(target.clone()), &source) {
        Ok(design) => design,
        Err(error) => {
            eprintln!("cannot parse {input_fn}: {error}");
            return ExitCode::from(1);
        }
    };
    if let Some(target) = design.target() {
        if let Err(error) = target.import(&mut design) {
            eprintln!("cannot import target cells: {error:?}");
            return ExitCode::from(1);
        }
    }

    let options = MapOptions {
        dual_output: !no_dual_output,
        max_area_iterations: max_iterations,
        ..MapOptions::default()
    };
    match cm::map(&design, target, &options) {
        Ok(stats) => {
            eprintln!(
                "mapped {} gates into {} LUT6 + {} LUT6D ({} area-flow iterations)",
                stats.initial_gates, stats.single_luts, stats.double_luts, stats.area_iterations
            );
        }
        Err(error) => {
            eprintln!("mapping failed: {error}");
            return ExitCode::from(1);
        }
    }
    design.compact();

    if let Err(error) = std::fs::write(&output_fn, format!("{design}")) {
        eprintln!("cannot write {output_fn}: {error}");
        return ExitCode::from(1);
    }

    eprintln!("Output cell statistics:");
    for (kind, amount) in design.statistics() {
        eprintln!("{:>7} {}", amount, kind);
    }
    ExitCode::SUCCESS
}
