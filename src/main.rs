use stardict_reader::{CaseFolding, OpenOptions, SegmentContent, StarDict};
use std::env;

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} <path-to-ifo-file> [--ignore-case] [--encoding <LABEL>] [--prefix <PREFIX>] [--limit <N>] [WORD...]",
        program
    );
    std::process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage(&args[0]);
    }

    let ifo_path = &args[1];
    let mut options = OpenOptions::new();
    let mut prefix: Option<String> = None;
    let mut limit = 20usize;
    let mut words: Vec<&str> = Vec::new();

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--ignore-case" => options = options.case_folding(CaseFolding::Insensitive),
            "--encoding" => match rest.next().map(|label| options.clone().encoding_label(label)) {
                Some(Ok(with_encoding)) => options = with_encoding,
                Some(Err(e)) => {
                    eprintln!("ERROR: {}", e);
                    std::process::exit(1);
                }
                None => {
                    eprintln!("ERROR: --encoding flag requires an argument.");
                    std::process::exit(1);
                }
            },
            "--prefix" => match rest.next() {
                Some(p) => prefix = Some(p.clone()),
                None => {
                    eprintln!("ERROR: --prefix flag requires an argument.");
                    std::process::exit(1);
                }
            },
            "--limit" => match rest.next().and_then(|n| n.parse().ok()) {
                Some(n) => limit = n,
                None => {
                    eprintln!("ERROR: --limit flag requires a number.");
                    std::process::exit(1);
                }
            },
            flag if flag.starts_with("--") => usage(&args[0]),
            word => words.push(word),
        }
    }

    println!("Reading StarDict dictionary: {}", ifo_path);
    println!("{}", "=".repeat(60));

    let dict = match StarDict::open(ifo_path, &options) {
        Ok(dict) => dict,
        Err(e) => {
            eprintln!("\nERROR: Failed to open dictionary");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let meta = dict.metadata();
    println!("\nDictionary Information:");
    println!("  Name: {}", meta.book_name);
    println!("  Version: {}", meta.version);
    println!("  Offset bits: {:?}", meta.idx_offset_bits);
    if let Some(seq) = &meta.same_type_sequence {
        let tags: String = seq.iter().map(|t| t.tag()).collect();
        println!("  Same type sequence: {}", tags);
    }
    if let Some(desc) = &meta.description {
        println!("  Description: {}", desc);
    }

    println!("\nStatistics:");
    println!("  Index records: {}", dict.word_count());
    println!("  Synonyms: {}", dict.synonym_count());

    if let Some(prefix) = &prefix {
        println!("\nHeadwords starting with {:?} (limit {}):", prefix, limit);
        for (i, headword) in dict.prefix_search(prefix, limit).iter().enumerate() {
            println!("  {}. {}", i + 1, headword);
        }
    }

    if words.is_empty() && prefix.is_none() {
        println!("\nSample Headwords (first 10):");
        for (i, record) in dict.records().iter().take(10).enumerate() {
            println!("  {}. [{}+{}] {}", i + 1, record.data_offset, record.data_size, record.headword);
        }
    }

    for word in words {
        println!("\n{}", "=".repeat(60));
        match dict.lookup(word) {
            Ok(lookup) if lookup.is_empty() => println!("{}: not found", word),
            Ok(lookup) => {
                for entry in &lookup.entries {
                    println!("{}", entry.headword);
                    for segment in &entry.segments {
                        match &segment.content {
                            SegmentContent::Text(text) => {
                                println!("  [{}] {}", segment.entry_type.tag(), text)
                            }
                            SegmentContent::Binary(data) => {
                                println!("  [{}] <{} bytes>", segment.entry_type.tag(), data.len())
                            }
                        }
                    }
                }
                for failure in &lookup.failures {
                    eprintln!("  WARNING: {}", failure);
                }
            }
            Err(e) => {
                eprintln!("ERROR: lookup of {:?} failed: {}", word, e);
                std::process::exit(1);
            }
        }
    }
}
