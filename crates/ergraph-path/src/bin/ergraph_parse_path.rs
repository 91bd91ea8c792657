use std::env;

use ergraph_path::parse_path;

fn main() {
    let mut args = env::args().skip(1);
    let Some(text) = args.next() else {
        eprintln!("usage: ergraph-parse-path <expression>");
        std::process::exit(2);
    };
    if args.next().is_some() {
        eprintln!("usage: ergraph-parse-path <expression>");
        std::process::exit(2);
    }

    match parse_path(&text) {
        Ok(path) => {
            println!("ok: {path}");
            println!("{path:#?}");
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
