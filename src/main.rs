mod cli;
mod demo;

use libtrimode::engine::Engine;
use libtrimode::event::TraceDisplay;
use std::io::{self, Read};
use structopt::StructOpt;

fn main() -> io::Result<()> {
    let options = cli::Options::from_args();

    let input = match &options.input_file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let source = input.trim_end();

    let demo = demo::arithmetic().expect("the built-in demo grammar is well-formed");
    let engine = Engine::new(&demo.grammar);

    let run = match engine.parse(demo.start, source) {
        Ok(run) => run,
        Err(diagnostic) => {
            eprintln!("{}", diagnostic);
            std::process::exit(1);
        }
    };

    match options.mode.as_str() {
        "parse" => println!("{}", TraceDisplay::new(&run.events, &demo.grammar)),
        "roundtrip" => match engine.unparse(demo.start, &run.events) {
            Ok(text) => println!("{}", text),
            Err(diagnostic) => {
                eprintln!("{}", diagnostic);
                std::process::exit(1);
            }
        },
        "check" => match engine.match_trace(demo.start, &run.events) {
            Ok(()) => println!("ok: {} events", run.events.len()),
            Err(diagnostic) => {
                eprintln!("{}", diagnostic);
                std::process::exit(1);
            }
        },
        other => unreachable!("structopt rejects mode `{}`", other),
    }

    if options.stats {
        eprintln!(
            "rule calls: {} ({} executed), decompositions: {}, grow steps: {}",
            run.stats.reference_calls,
            run.stats.reference_executions,
            run.stats.decompositions,
            run.stats.grow_steps,
        );
    }

    Ok(())
}
