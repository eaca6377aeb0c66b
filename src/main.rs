use clap::{arg, crate_version, Command};
use threedo_lzss::compress::{compress_to_vec, Compressor};
use threedo_lzss::decompress::{decompress_to_vec, Decompressor};
use threedo_lzss::{words_from_bytes, Error};

const RCH: &str = "unreachable was reached";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let long_help = "Examples:
---------
Compress:      `threedo-lzss compress wavetable.aiff`
Decompress:    `threedo-lzss decompress wavetable.aiff.compressed wavetable2.aiff`
Self test:     `threedo-lzss check`";

    let mut main_cmd = Command::new("threedo-lzss")
        .about("Compress and expand files in the 3DO SDK LZSS format")
        .after_long_help(long_help)
        .subcommand_required(true)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("compress")
            .arg(arg!(<input> "path to input file"))
            .arg(arg!([output] "path to output file (default: input + '.compressed')"))
            .about("compress a file"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("decompress")
            .arg(arg!(<input> "path to input file"))
            .arg(arg!([output] "path to output file (default: input + '.decompressed')"))
            .about("expand a compressed file"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("check").about("check the codec against known streams and round trips"),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = match cmd.get_one::<String>("output") {
            Some(p) => p.clone(),
            None => format!("{}.compressed", path_in),
        };
        compress_file(path_in, &path_out)?;
    }

    if let Some(cmd) = matches.subcommand_matches("decompress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = match cmd.get_one::<String>("output") {
            Some(p) => p.clone(),
            None => format!("{}.decompressed", path_in),
        };
        decompress_file(path_in, &path_out)?;
    }

    if matches.subcommand_matches("check").is_some() {
        check()?;
    }

    Ok(())
}

fn compress_file(path_in: &str, path_out: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(path_in)?;
    if data.len() % 4 != 0 {
        eprintln!(
            "WARNING - input file is not a multiple of 4 bytes. \
             Expanding the compressed file will yield a file padded with zeros."
        );
    }
    let mut out: Vec<u8> = Vec::new();
    let mut comp = Compressor::new(|w| out.extend_from_slice(&w.to_be_bytes()));
    comp.feed(&words_from_bytes(&data));
    comp.finish();
    std::fs::write(path_out, &out)?;
    report(path_in, data.len(), path_out, out.len());
    Ok(())
}

fn decompress_file(path_in: &str, path_out: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(path_in)?;
    if data.len() % 4 != 0 {
        eprintln!(
            "WARNING - input file is not a multiple of 4 bytes. \
             The file may be corrupted or not a 3DO compressed file."
        );
    }
    let mut out: Vec<u8> = Vec::new();
    let mut decomp = Decompressor::new(|w| out.extend_from_slice(&w.to_be_bytes()));
    decomp.feed(&words_from_bytes(&data));
    match decomp.finish() {
        Ok(()) => {}
        Err(Error::DataRemains) => {
            eprintln!("WARNING - data remained after the end of the compressed stream.")
        }
        Err(Error::DataMissing) => {
            eprintln!("WARNING - the stream ended early; the output may be truncated.")
        }
        Err(e) => return Err(Box::new(e)),
    }
    std::fs::write(path_out, &out)?;
    report(path_in, data.len(), path_out, out.len());
    Ok(())
}

fn report(path_in: &str, in_bytes: usize, path_out: &str, out_bytes: usize) {
    println!(
        "- input:\n  - filepath: {}\n  - size_in_bytes: {}\n  - size_in_words: {}\n\
         - output:\n  - filepath: {}\n  - size_in_bytes: {}\n  - size_in_words: {}",
        path_in,
        in_bytes,
        in_bytes / 4,
        path_out,
        out_bytes,
        out_bytes / 4
    );
}

/// Self test: known streams, round trips, and feed-chunking equivalence.
fn check() -> Result<(), Box<dyn std::error::Error>> {
    let mut failures = 0;
    let mut run = |name: &str, pass: bool| {
        println!("{} - {}", if pass { "ok    " } else { "FAILED" }, name);
        if !pass {
            failures += 1;
        }
    };

    // streams verified against the original library's output
    run(
        "known stream: empty input",
        compress_to_vec(&[]) == vec![0x8040_0000],
    );
    run(
        "known stream: 'ABCD'",
        compress_to_vec(&[0x4142_4344]) == vec![0xa0d0_a874, 0x4804_0000, 0x0000_0000],
    );
    run(
        "known stream expands: 'ABCD'",
        decompress_to_vec(&[0xa0d0_a874, 0x4804_0000, 0x0000_0000]) == Ok(vec![0x4142_4344]),
    );

    // round trips over assorted shapes of data
    let corpora: Vec<(&str, Vec<u8>)> = vec![
        ("round trip: run of one byte", vec![b'A'; 5000]),
        (
            "round trip: repeating phrase",
            b"correct horse battery staple ".repeat(300),
        ),
        ("round trip: counter bytes", (0..=255u8).cycle().take(4096).collect()),
        ("round trip: pseudo-random", {
            let mut state = 0xdecafbadu32;
            (0..20000)
                .map(|_| {
                    state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                    (state >> 24) as u8
                })
                .collect()
        }),
    ];
    for (name, data) in corpora {
        let source = words_from_bytes(&data);
        let round = decompress_to_vec(&compress_to_vec(&source));
        run(name, round == Ok(source));
    }

    // chunked feeding must not change the stream
    let source = words_from_bytes(&b"how is the codec fed should never matter ".repeat(40));
    let whole = compress_to_vec(&source);
    let mut chunked = Vec::new();
    let mut comp = Compressor::new(|w| chunked.push(w));
    for chunk in source.chunks(3) {
        comp.feed(chunk);
    }
    comp.finish();
    run("split feed equivalence", chunked == whole);

    if failures > 0 {
        return Err(format!("{} check(s) failed", failures).into());
    }
    println!("all checks passed");
    Ok(())
}
