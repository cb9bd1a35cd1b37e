mod advent;
mod shared;

use argparse::{ArgumentParser, StoreOption, StoreTrue};
use std::process;

fn main() {
    let mut day: Option<usize> = None;
    let mut input_path: Option<String> = None;
    let mut debug = false;
    {
        let mut parser = ArgumentParser::new();
        parser.set_description("Advent of Code 2018: wrist device programs");
        parser.refer(&mut day)
              .add_option(&["-d", "--day"], StoreOption,
                          "number of challenge to run (16, 19 or 21)");
        parser.refer(&mut debug)
              .add_option(&["--debug"], StoreTrue,
                          "print CPU state before every instruction");
        parser.refer(&mut input_path)
              .add_argument("input", StoreOption,
                            "input file (default: input/dayNN.txt)");
        parser.parse_args_or_exit();
    }
    let options = advent::Options {
        input_path: input_path,
        debug: debug,
    };
    match day {
        Some(day) => {
            if let Err(e) = advent::solve(day, &options) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => {
            eprintln!("--day is required");
            process::exit(1);
        },
    }
}
