use anyhow::{Error, format_err};
use std::fs::File;
use std::io::Read;

mod day16;
mod day19;
mod day21;

pub struct Options {
    pub input_path: Option<String>,
    pub debug: bool,
}

impl Options {
    pub fn input_path(&self, day: usize) -> String {
        match self.input_path {
            Some(ref path) => path.clone(),
            None => format!("input/day{:02}.txt", day),
        }
    }
}

pub trait AdventSolver {
    fn solve(&mut self, text: &str, debug: bool) -> Result<(), Error>;
}

pub fn solve(day: usize, options: &Options) -> Result<(), Error> {
    let mut solver: Box<dyn AdventSolver> = match day {
        16 => Box::new(day16::Solver::default()),
        19 => Box::new(day19::Solver::default()),
        21 => Box::new(day21::Solver::default()),
        _ => return Err(format_err!("No solution for day {}", day)),
    };
    let path = options.input_path(day);
    let mut text = String::new();
    File::open(&path)
        .and_then(|mut f| f.read_to_string(&mut text))
        .map_err(|e| format_err!("Cannot open {}: {}", path, e))?;
    solver.solve(&text, options.debug)
}
