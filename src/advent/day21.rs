use crate::advent::AdventSolver;
use crate::shared::device::{Cpu, Op};
use anyhow::{Error, format_err};
use std::collections::HashSet;

#[derive(Default)]
pub struct Solver;

const REGISTER_COUNT: usize = 6;

impl AdventSolver for Solver {
    fn solve(&mut self, text: &str, debug: bool) -> Result<(), Error> {
        let mut cpu = Cpu::from_string(text, REGISTER_COUNT)?;
        cpu.set_trace(debug);
        let (first, last) = Self::halting_values(&mut cpu)?;
        println!("Part 1: Register 0 halting after the fewest instructions: {}",
                 first);
        println!("Part 2: Register 0 halting after the most instructions: {}",
                 last);
        Ok(())
    }
}

impl Solver {
    // The only instruction reading register 0 compares it against a
    // generated value and halts when they are equal.
    fn halt_check(cpu: &Cpu) -> Result<(isize, isize), Error> {
        cpu.program()
           .iter()
           .enumerate()
           .filter(|(_, inst)| inst.op == Op::Eqrr)
           .find_map(|(ip, inst)| match (inst.a, inst.b) {
               (0, reg) | (reg, 0) => Some((ip as isize, reg)),
               _ => None,
           })
           .ok_or_else(|| format_err!("No eqrr instruction reads register 0"))
    }

    // Collects the generated values at the halt check until one repeats.
    // The first value halts soonest, and the last one before the sequence
    // cycles halts latest.
    fn halting_values(cpu: &mut Cpu) -> Result<(isize, isize), Error> {
        let (check_ip, reg) = Self::halt_check(cpu)?;
        let mut seen = HashSet::new();
        let mut first = None;
        let mut last = None;
        let mut running = cpu.ip() == check_ip || cpu.run_until(check_ip)?;
        while running {
            let value = cpu.registers().get(reg)?;
            if !seen.insert(value) {
                break;
            }
            first = first.or(Some(value));
            last = Some(value);
            running = cpu.run_until(check_ip)?;
        }
        match (first, last) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(format_err!("Program halted before reaching ip {}",
                                 check_ip)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Generates x = ((5x + 3) & 15) | 16 and halts once x equals register 0.
    // From x = 0 the values are 19, 18, 29, ..., 25, 16 and then 19 again.
    const GENERATOR: &str = "\
#ip 5
seti 0 0 1
muli 1 5 1
addi 1 3 1
bani 1 15 1
bori 1 16 1
eqrr 1 0 2
addr 2 5 5
seti 0 0 5
";

    #[test]
    fn test_halt_check() {
        let cpu = Cpu::from_string(GENERATOR, REGISTER_COUNT).unwrap();
        assert_eq!((5, 1), Solver::halt_check(&cpu).unwrap());
    }

    #[test]
    fn test_generator() {
        let mut cpu = Cpu::from_string(GENERATOR, REGISTER_COUNT).unwrap();
        assert_eq!((19, 16), Solver::halting_values(&mut cpu).unwrap());
    }

    #[test]
    fn test_answers_halt() {
        for &r0 in [19, 16].iter() {
            let mut cpu = Cpu::from_string(GENERATOR, REGISTER_COUNT).unwrap();
            cpu.registers_mut().set(0, r0).unwrap();
            assert_eq!(r0, cpu.run().unwrap());
            assert!(!cpu.is_running());
        }
    }

    #[test]
    fn test_no_halt_check() {
        let mut cpu = Cpu::from_string("#ip 5\neqrr 1 2 3\n", REGISTER_COUNT)
            .unwrap();
        assert!(Solver::halting_values(&mut cpu).is_err());

        // The check is never reached before the program ends.
        let mut cpu = Cpu::from_string("#ip 5\nseti 9 0 5\neqrr 1 0 2\n",
                                       REGISTER_COUNT).unwrap();
        let err = Solver::halting_values(&mut cpu).unwrap_err().to_string();
        assert!(err.contains("halted before reaching ip 1"), "{}", err);
    }
}
