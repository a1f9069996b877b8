//! ChoctoObj command-line entry point. Ports
//! `examples/original_source/choctoobj.c`'s `main`/`process_file`: opens the
//! model/index/output files, selects a raw or LZW-compressed reader, runs
//! the index walker, and reports timing/errors.

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::info;

use choctoobj::cli::{Args, Options};
use choctoobj::error::ChocResult;
use choctoobj::index::{choc_to_obj, RunReport};
use choctoobj::objwriter::ObjEmitter;
use choctoobj::reader::{FileReader, LzwReader, RawReader};
use choctoobj::wavefront_obj_io::IoObjWriter;

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let opts = match Options::try_from(args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn open_model_reader(opts: &Options) -> ChocResult<FileReader<File>> {
    if opts.verbose {
        info!("Opening model data file '{}'", opts.model_file.display());
    }
    let file = File::open(&opts.model_file)?;
    if opts.raw {
        Ok(FileReader::Raw(RawReader::new(file)))
    } else {
        Ok(FileReader::Lzw(LzwReader::new(file)?))
    }
}

/// Reads the whole index stream into memory (a file or stdin) before
/// decoding: unlike the model data, the index is a short flat list of
/// addresses, so there is no benefit to streaming it.
fn open_index_reader(opts: &Options) -> ChocResult<FileReader<Cursor<Vec<u8>>>> {
    let mut bytes = Vec::new();
    match &opts.index_file {
        Some(path) => {
            if opts.verbose {
                info!("Opening index file '{}'", path.display());
            }
            File::open(path)?.read_to_end(&mut bytes)?;
        }
        None => {
            eprintln!("Reading from stdin...");
            io::stdin().read_to_end(&mut bytes)?;
        }
    }
    if opts.raw {
        Ok(FileReader::Raw(RawReader::new(Cursor::new(bytes))))
    } else {
        Ok(FileReader::Lzw(LzwReader::new(Cursor::new(bytes))?))
    }
}

fn run(opts: &Options) -> ChocResult<()> {
    let start = Instant::now();

    let mut model_reader = open_model_reader(opts)?;
    let mut index_reader = open_index_reader(opts)?;

    let list_or_summary = opts.list || opts.summary;

    let report = if list_or_summary {
        let writer: IoObjWriter<Vec<u8>, f64> = IoObjWriter::new(Vec::new());
        let mut emitter = ObjEmitter::new(writer, opts);
        choc_to_obj(&mut index_reader, &mut model_reader, opts, &mut emitter)
    } else if let Some(path) = &opts.output_file {
        if opts.verbose {
            info!("Opening output file '{}'", path.display());
        }
        let file = File::create(path)?;
        let writer: IoObjWriter<BufWriter<File>, f64> = IoObjWriter::new(BufWriter::new(file));
        let mut emitter = ObjEmitter::new(writer, opts);
        let result = choc_to_obj(&mut index_reader, &mut model_reader, opts, &mut emitter).and_then(move |report| {
            emitter
                .into_inner()
                .into_inner()
                .into_inner()
                .map(|_| report)
                .map_err(|e| e.into_error().into())
        });
        if result.is_err() && !opts.verbose {
            let _ = std::fs::remove_file(path);
        }
        result
    } else {
        let writer: IoObjWriter<io::Stdout, f64> = IoObjWriter::new(io::stdout());
        let mut emitter = ObjEmitter::new(writer, opts);
        choc_to_obj(&mut index_reader, &mut model_reader, opts, &mut emitter)
    };

    report_outcome(opts, &report);

    if opts.time {
        println!("Time taken: {:.2} seconds", start.elapsed().as_secs_f64());
    }

    report.map(|_| ())
}

fn report_outcome(opts: &Options, report: &ChocResult<RunReport>) {
    let Ok(report) = report else { return };
    if opts.list {
        for row in &report.rows {
            println!(
                "{:>4}  {:<24} vertices={:<5} primitives={}",
                row.object_index, row.name, row.nvertices, row.nprimitives
            );
        }
    } else if opts.summary {
        println!("{} object(s) matched", report.rows.len());
    }
}
