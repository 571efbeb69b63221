#![forbid(unsafe_code)]
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::{env, ffi, fs, io, process};

use lzss::decode::Decoder;
use lzss::encode::Encoder;
use lzss::{Fill, Strategy};

fn main() -> CodingResult {
    env_logger::init();
    CodingResult::catch_panic(|| {
        let flags = Flags::from_args(env::args_os()).unwrap_or_else(|ParamError| explain());
        run_coding(flags)
    })
}

fn run_coding(flags: Flags) -> Result<(), io::Error> {
    let input: Box<dyn BufRead> = match flags.input {
        Input::File(path) => Box::new(io::BufReader::with_capacity(1 << 20, fs::File::open(path)?)),
        Input::Stdin => Box::new(io::BufReader::with_capacity(1 << 20, io::stdin())),
    };

    let output: Box<dyn Write> = match flags.output {
        Output::File(path) => Box::new(io::BufWriter::new(fs::File::create(path)?)),
        Output::Stdout => Box::new(io::BufWriter::new(io::stdout())),
    };

    let status = match flags.operation {
        Operation::Encode => {
            let mut encoder = Encoder::with_fill(flags.strategy, flags.fill);
            encoder.into_stream(output).encode_all(input).status
        }
        Operation::Decode => {
            let mut decoder = if flags.strict {
                Decoder::strict()
            } else {
                Decoder::new()
            };
            decoder.into_stream(output).decode_all(input).status
        }
    };

    status.map_err(io::Error::from)
}

struct Flags {
    operation: Operation,
    input: Input,
    output: Output,
    strategy: Strategy,
    fill: Fill,
    strict: bool,
}

struct ParamError;

#[derive(Debug)]
enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Debug)]
enum Output {
    File(PathBuf),
    Stdout,
}

#[derive(Debug)]
enum Operation {
    Encode,
    Decode,
}

fn explain<T>() -> T {
    println!(
        "Usage: lzss encode [-s <strategy>] [--pad zeros|ones] <input> <output>\n       \
        lzss decode [--strict] <input> <output>\n\
        Arguments:\n\
        -s\t match finding strategy: brute, list, hash, tree (default) or kmp\n\
        --pad\t bits completing the last byte (default zeros)\n\
        --strict\t fail on an incomplete final unit\n\
        <input>\tfilepath or '-' for stdin\n\
        <output>\tfilepath or '-' for stdout"
    );
    process::exit(1);
}

fn files() -> [clap::Arg<'static>; 2] {
    [
        clap::Arg::new("input")
            .required(true)
            .value_parser(clap::builder::ValueParser::path_buf()),
        clap::Arg::new("output")
            .required(true)
            .value_parser(clap::builder::ValueParser::path_buf()),
    ]
}

fn command() -> clap::Command<'static> {
    let names: Vec<&'static str> = Strategy::ALL.iter().map(|s| s.name()).collect();

    clap::Command::new("lzss")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compress and decompress files with LZSS")
        .subcommand_required(true)
        .subcommand(
            clap::Command::new("encode")
                .about("Compress <input> into <output>")
                .arg(
                    clap::Arg::new("strategy")
                        .short('s')
                        .long("strategy")
                        .takes_value(true)
                        .default_value("tree")
                        .value_parser(clap::builder::PossibleValuesParser::new(names)),
                )
                .arg(
                    clap::Arg::new("pad")
                        .long("pad")
                        .takes_value(true)
                        .default_value("zeros")
                        .value_parser(["zeros", "ones"]),
                )
                .args(files()),
        )
        .subcommand(
            clap::Command::new("decode")
                .about("Decompress <input> into <output>")
                .arg(
                    clap::Arg::new("strict")
                        .long("strict")
                        .takes_value(false),
                )
                .args(files()),
        )
}

impl Flags {
    fn from_args(args: impl Iterator<Item = ffi::OsString>) -> Result<Self, ParamError> {
        let matches = match command().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(err) => match err.kind() {
                clap::ErrorKind::DisplayHelp | clap::ErrorKind::DisplayVersion => err.exit(),
                _ => {
                    eprintln!("{}", err);
                    return Err(ParamError);
                }
            },
        };

        let (operation, matches) = match matches.subcommand() {
            Some(("encode", sub)) => (Operation::Encode, sub),
            Some(("decode", sub)) => (Operation::Decode, sub),
            _ => return Err(ParamError),
        };

        let mut flags = Flags {
            operation,
            input: Input::Stdin,
            output: Output::Stdout,
            strategy: Strategy::default(),
            fill: Fill::default(),
            strict: false,
        };

        if let Some(name) = matches.try_get_one::<String>("strategy").ok().flatten() {
            flags.strategy = name.parse().unwrap_or_else(|_| unreachable!("unparsed strategy"));
        }

        match matches.try_get_one::<String>("pad").ok().flatten().map(String::as_str) {
            Some("zeros") => flags.fill = Fill::Zeros,
            Some("ones") => flags.fill = Fill::Ones,
            Some(_) => unreachable!("unparsed padding"),
            None => {}
        }

        flags.strict = matches.try_contains_id("strict").unwrap_or(false);

        match matches.get_one::<PathBuf>("input") {
            None => return Err(ParamError),
            Some(p) if *p == PathBuf::from("-") => flags.input = Input::Stdin,
            Some(p) => flags.input = Input::File(p.clone()),
        }

        match matches.get_one::<PathBuf>("output") {
            None => return Err(ParamError),
            Some(p) if *p == PathBuf::from("-") => flags.output = Output::Stdout,
            Some(p) => flags.output = Output::File(p.clone()),
        }

        Ok(flags)
    }
}

enum CodingResult {
    Ok,
    Err(io::Error),
    Panic,
}

impl CodingResult {
    fn catch_panic(op: fn() -> Result<(), io::Error>) -> Self {
        std::panic::catch_unwind(|| match op() {
            Ok(()) => CodingResult::Ok,
            Err(err) => CodingResult::Err(err),
        })
        .unwrap_or(CodingResult::Panic)
    }
}

impl std::process::Termination for CodingResult {
    fn report(self) -> std::process::ExitCode {
        match self {
            CodingResult::Ok => std::process::ExitCode::SUCCESS,
            CodingResult::Err(err) => {
                eprintln!("{}", err);
                std::process::ExitCode::FAILURE
            }
            CodingResult::Panic => {
                eprintln!(
                    "The process failed irrecoverably! This should never happen and is a bug."
                );
                std::process::ExitCode::from(128)
            }
        }
    }
}
