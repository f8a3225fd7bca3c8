use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use refa::{Encoding, Options, Regex};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Print lines that match a regular expression
#[derive(Parser, Debug)]
#[command(name = "refa")]
#[command(version, about, long_about = None)]
struct Args {
    /// Regular expression to search for
    pattern: String,

    /// Files to search; reads standard input when none are given
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Ignore case distinctions
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Only select lines that match in full
    #[arg(short = 'x', long)]
    line_regexp: bool,

    /// Print only the matched parts of a line
    #[arg(short = 'o', long)]
    only_matching: bool,

    /// Print a count of matching lines instead of the lines
    #[arg(short = 'c', long)]
    count: bool,

    /// Treat input and pattern as Latin-1 rather than UTF-8
    #[arg(long)]
    latin1: bool,

    /// Prefer the longest match at the leftmost position
    #[arg(long)]
    longest: bool,
}

impl Args {
    fn options(&self) -> Options {
        let encoding = if self.latin1 {
            Encoding::Latin1
        } else {
            Encoding::Utf8
        };
        Options::default()
            .case_insensitive(self.ignore_case)
            .encoding(encoding)
            .longest_match(self.longest)
    }
}

/// How matching lines are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Lines,
    OnlyMatching,
    Count,
}

struct Grep<'a> {
    regex: &'a Regex,
    full_line: bool,
    output: Output,
}

impl Grep<'_> {
    /// Scan `reader` line by line, writing results to `out`. `label` prefixes
    /// each output line when several inputs are searched. Returns the number
    /// of matching lines.
    fn run<R: BufRead, W: Write>(&self, mut reader: R, label: Option<&str>, out: &mut W) -> io::Result<u64> {
        let mut matched = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
            if !self.line_matches(line) {
                continue;
            }
            matched += 1;
            match self.output {
                Output::Count => {}
                Output::Lines => {
                    write_prefix(out, label)?;
                    out.write_all(line)?;
                    out.write_all(b"\n")?;
                }
                Output::OnlyMatching => self.write_matches(line, label, out)?,
            }
        }
        if self.output == Output::Count {
            write_prefix(out, label)?;
            writeln!(out, "{}", matched)?;
        }
        Ok(matched)
    }

    fn line_matches(&self, line: &[u8]) -> bool {
        if self.full_line {
            self.regex.test_full_match(line)
        } else {
            self.regex.test_search(line)
        }
    }

    /// Every non-overlapping match, one per output line. Empty matches are
    /// skipped.
    fn write_matches<W: Write>(&self, line: &[u8], label: Option<&str>, out: &mut W) -> io::Result<()> {
        if self.full_line {
            write_prefix(out, label)?;
            out.write_all(line)?;
            return out.write_all(b"\n");
        }
        let mut at = 0;
        while at <= line.len() {
            let Some(m) = self.regex.search_at(line, at as isize, line.len() as isize) else {
                break;
            };
            let span = m.span();
            if !span.is_empty() {
                write_prefix(out, label)?;
                out.write_all(&line[span.range()])?;
                out.write_all(b"\n")?;
            }
            at = if span.is_empty() { span.end + 1 } else { span.end };
        }
        Ok(())
    }
}

fn write_prefix<W: Write>(out: &mut W, label: Option<&str>) -> io::Result<()> {
    match label {
        Some(label) => write!(out, "{}:", label),
        None => Ok(()),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<bool> {
    let regex = Regex::with_options(&args.pattern, args.options())
        .with_context(|| format!("invalid pattern `{}`", args.pattern))?;
    debug!(pattern = %args.pattern, groups = regex.group_count(), "pattern ready");

    let output = if args.count {
        Output::Count
    } else if args.only_matching {
        Output::OnlyMatching
    } else {
        Output::Lines
    };
    let grep = Grep {
        regex: &regex,
        full_line: args.line_regexp,
        output,
    };

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut matched = 0;
    if args.files.is_empty() {
        matched += grep.run(io::stdin().lock(), None, &mut out)?;
    } else {
        let labelled = args.files.len() > 1;
        for path in &args.files {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let name = path.to_string_lossy();
            let label = labelled.then_some(&*name);
            matched += grep
                .run(BufReader::new(file), label, &mut out)
                .with_context(|| format!("failed to read {}", path.display()))?;
        }
    }
    out.flush()?;
    Ok(matched > 0)
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("refa: {:#}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grep(pattern: &str, options: Options, full_line: bool, output: Output, input: &str) -> (u64, String) {
        let regex = Regex::with_options(pattern, options).unwrap();
        let grep = Grep {
            regex: &regex,
            full_line,
            output,
        };
        let mut out = Vec::new();
        let n = grep.run(input.as_bytes(), None, &mut out).unwrap();
        (n, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_lines() {
        let (n, out) = grep("o+", Options::default(), false, Output::Lines, "foo\nbar\nboo\n");
        assert_eq!(n, 2);
        assert_eq!(out, "foo\nboo\n");
    }

    #[test]
    fn test_full_line() {
        let (n, out) = grep("ba.", Options::default(), true, Output::Lines, "bar\nbarn\nbaz");
        assert_eq!(n, 2);
        assert_eq!(out, "bar\nbaz\n");
    }

    #[test]
    fn test_only_matching() {
        let (_, out) = grep(r"\d+", Options::default(), false, Output::OnlyMatching, "a1b22\nnone\n333\n");
        assert_eq!(out, "1\n22\n333\n");
    }

    #[test]
    fn test_only_matching_skips_empty() {
        let (n, out) = grep("x*", Options::default(), false, Output::OnlyMatching, "axxbx\n");
        assert_eq!(n, 1);
        assert_eq!(out, "xx\nx\n");
    }

    #[test]
    fn test_count() {
        let options = Options::default().case_insensitive(true);
        let (n, out) = grep("err", options, false, Output::Count, "ERR 1\nok\nerr 2\n");
        assert_eq!(n, 2);
        assert_eq!(out, "2\n");
    }

    #[test]
    fn test_label() {
        let regex = Regex::new("b").unwrap();
        let grep = Grep {
            regex: &regex,
            full_line: false,
            output: Output::Lines,
        };
        let mut out = Vec::new();
        grep.run(&b"ab\ncd\n"[..], Some("f.txt"), &mut out).unwrap();
        assert_eq!(out, b"f.txt:ab\n");
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["refa", "-i", "-c", "--latin1", "pat", "a.txt", "b.txt"]).unwrap();
        assert!(args.ignore_case && args.count && args.latin1);
        assert_eq!(args.files.len(), 2);
        let options = args.options();
        assert!(options.case_insensitive);
        assert_eq!(options.encoding, Encoding::Latin1);
    }
}
