use std::collections::HashSet;
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

use htmlstrip_core::{CharSource, DEFAULT_READ_AHEAD, HtmlStripFilter, SourceError, Utf8Source};

fn main() {
    let mut input: Option<String> = None;
    let mut reserved: HashSet<String> = HashSet::new();
    let mut read_ahead = DEFAULT_READ_AHEAD;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--reserved" => match args.next() {
                Some(tag) => {
                    reserved.insert(tag);
                }
                None => {
                    eprintln!("--reserved expects a tag name");
                    print_usage();
                    process::exit(2);
                }
            },
            "--read-ahead" => match args.next().as_deref().map(str::parse::<usize>) {
                Some(Ok(n)) => read_ahead = n,
                _ => {
                    eprintln!("--read-ahead expects a number of characters");
                    print_usage();
                    process::exit(2);
                }
            },
            _ => {
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    print_usage();
                    process::exit(2);
                }
            }
        }
    }

    let result = match input {
        Some(path) => match File::open(&path) {
            Ok(file) => strip_to_stdout(
                Utf8Source::new(BufReader::new(file)),
                reserved,
                read_ahead,
            ),
            Err(err) => {
                eprintln!("failed to open {}: {}", path, err);
                process::exit(1);
            }
        },
        None => strip_to_stdout(Utf8Source::new(io::stdin().lock()), reserved, read_ahead),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn strip_to_stdout<S: CharSource>(
    source: S,
    reserved: HashSet<String>,
    read_ahead: usize,
) -> Result<(), SourceError> {
    let mut filter = HtmlStripFilter::with_read_ahead(source, reserved, read_ahead);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut chunk = String::with_capacity(8 * 1024);
    while let Some(ch) = filter.read()? {
        chunk.push(ch);
        if chunk.len() >= 8 * 1024 {
            out.write_all(chunk.as_bytes())?;
            chunk.clear();
        }
    }
    out.write_all(chunk.as_bytes())?;
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: htmlstrip-cli [--reserved TAG]... [--read-ahead N] [input]");
}
