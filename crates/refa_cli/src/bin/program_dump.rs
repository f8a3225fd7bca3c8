use std::process::ExitCode;

use clap::Parser;
use refa::{Options, Regex};

/// Print the compiled program of a pattern
#[derive(Parser, Debug)]
#[command(name = "program_dump")]
struct Args {
    pattern: String,

    /// Compile with case folding
    #[arg(short = 'i', long)]
    ignore_case: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let options = Options::default().case_insensitive(args.ignore_case);
    match Regex::with_options(&args.pattern, options) {
        Ok(regex) => {
            let program = regex.program();
            println!("=== Pattern: {} ===", regex.as_str());
            println!(
                "insts: {}, classes: {}, groups: {}, slots: {}",
                program.len(),
                program.classes.len(),
                regex.group_count(),
                program.slot_count
            );
            for (name, index) in regex.group_names() {
                println!("group {} = {}", index, name);
            }
            println!();
            print!("{}", program);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::from(1)
        }
    }
}
