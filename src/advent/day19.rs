use crate::advent::AdventSolver;
use crate::shared::device::{Cpu, Op};
use anyhow::Error;
use num_integer::{Integer, Roots};

#[derive(Default)]
pub struct Solver;

const REGISTER_COUNT: usize = 6;

// Where the divisor-summing loop starts, and the instruction that names the
// register holding the number whose divisors are summed.
const LOOP_IP: isize = 1;
const TARGET_INST: usize = 4;

impl AdventSolver for Solver {
    fn solve(&mut self, text: &str, debug: bool) -> Result<(), Error> {
        let mut cpu = Self::read_program(text)?;
        cpu.set_trace(debug);
        println!("Part 1: Register 0 when the background process halts: {}",
                 Self::run_with_shortcut(&mut cpu)?);
        cpu.reset();
        cpu.registers_mut().set(0, 1)?;
        println!("Part 2: Register 0 when started with register 0 = 1: {}",
                 Self::run_with_shortcut(&mut cpu)?);
        Ok(())
    }
}

impl Solver {
    fn read_program(text: &str) -> Result<Cpu, Error> {
        Cpu::from_string(text, REGISTER_COUNT)
    }

    // The program sets up a target number and then slowly sums its divisors
    // into register 0. Once the loop is reached the target is final, so the
    // sum is computed here instead. Programs without that loop are simply
    // run to completion.
    fn run_with_shortcut(cpu: &mut Cpu) -> Result<isize, Error> {
        let target_reg = cpu.program()
                            .get(TARGET_INST)
                            .filter(|inst| inst.op == Op::Eqrr)
                            .map(|inst| inst.b);
        let target_reg = match target_reg {
            Some(reg) => reg,
            None => return cpu.run(),
        };
        if !cpu.run_until(LOOP_IP)? {
            return Ok(cpu.registers()[0]);
        }
        let target = cpu.registers().get(target_reg)?;
        Ok(Self::sum_of_divisors(target))
    }

    fn sum_of_divisors(n: isize) -> isize {
        if n < 1 {
            return 0;
        }
        let mut sum = 0;
        for d in 1..=Roots::sqrt(&n) {
            if Integer::is_multiple_of(&n, &d) {
                sum += d;
                if d * d != n {
                    sum += n / d;
                }
            }
        }
        sum
    }
}
