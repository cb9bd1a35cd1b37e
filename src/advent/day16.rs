use crate::advent::AdventSolver;
use crate::shared::device::Cpu;
use crate::shared::inference::{Manual, SAMPLE_REGISTERS};
use anyhow::Error;

#[derive(Default)]
pub struct Solver;

impl AdventSolver for Solver {
    fn solve(&mut self, text: &str, debug: bool) -> Result<(), Error> {
        let manual = Manual::from_string(text)?;
        let (part1, part2) = Self::run(&manual, debug)?;
        println!("Part 1: Samples behaving like three or more opcodes: {}",
                 part1);
        println!("Part 2: Register 0 after the test program: {}", part2);
        Ok(())
    }
}

impl Solver {
    fn run(manual: &Manual, debug: bool) -> Result<(usize, isize), Error> {
        let (matrix, three_or_more) = manual.matrix()?;
        if debug {
            println!("Candidates: {:?}", matrix);
        }
        let mapping = matrix.resolve()?;
        let mut cpu = Cpu::new(SAMPLE_REGISTERS, mapping.decode(&manual.program)?);
        let result = if debug { cpu.debug()? } else { cpu.run()? };
        Ok((three_or_more, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::device::Op;
    use crate::shared::inference::tests::samples_for;

    // Writes a manual where encoded number n is Op::ALL[15 - n], with enough
    // samples to pin every number down, followed by the given program.
    fn manual_text(program: &[(Op, isize, isize, isize)]) -> String {
        let encode = |op: Op| 15 - op.number();
        let mut text = String::new();
        for &op in Op::ALL.iter() {
            for sample in samples_for(encode(op), op) {
                text += &format!("Before: {:?}\n{} {} {} {}\nAfter:  {:?}\n\n",
                                 sample.before, sample.inst.op,
                                 sample.inst.a, sample.inst.b, sample.inst.c,
                                 sample.after);
            }
        }
        text += "\n\n";
        for &(op, a, b, c) in program {
            text += &format!("{} {} {} {}\n", encode(op), a, b, c);
        }
        text
    }

    #[test]
    fn test_full_manual() {
        let text = manual_text(&[
            (Op::Seti, 5, 0, 0),
            (Op::Seti, 3, 0, 1),
            (Op::Mulr, 0, 1, 2),
            (Op::Addi, 2, 4, 0),
        ]);
        let manual = Manual::from_string(&text).unwrap();
        assert_eq!(16 * 24, manual.samples.len());
        assert_eq!(4, manual.program.len());

        let (part1, part2) = Solver::run(&manual, false).unwrap();
        assert_eq!(19, part2);

        let expected = manual.samples.iter()
                                     .filter(|s| s.possible_ops().count_ones() >= 3)
                                     .count();
        assert_eq!(expected, part1);
        assert!(part1 > 0);
    }

    #[test]
    fn test_seti_program() {
        let manual = Manual::from_string(&manual_text(&[(Op::Seti, 5, 0, 0)]))
            .unwrap();
        let (_, part2) = Solver::run(&manual, false).unwrap();
        assert_eq!(5, part2);
    }

    #[test]
    fn test_insufficient_samples() {
        let text = "\
Before: [3, 2, 1, 1]
9 2 1 2
After:  [3, 2, 2, 1]



9 5 0 0
";
        let manual = Manual::from_string(text).unwrap();
        assert!(Solver::run(&manual, false).is_err());
    }
}
