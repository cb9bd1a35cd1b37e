// The wrist device: sixteen three-operand operations over a small register
// file, plus a CPU that steps through a program of them.

use anyhow::{Error, format_err};
use lazy_static::lazy_static;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use regex::Regex;
use std::fmt;
use std::ops::Index;

pub const OP_COUNT: usize = 16;

lazy_static! {
    static ref IP_REGEX: Regex = Regex::new(r"^#ip (?P<reg>\d+)$").unwrap();
    static ref INST_REGEX: Regex =
        Regex::new(r"^(?P<op>[a-z]{4}) (?P<a>-?\d+) (?P<b>-?\d+) (?P<c>-?\d+)$")
              .unwrap();
}

#[derive(Clone,Copy,Debug,Eq,FromPrimitive,Hash,PartialEq)]
pub enum Op {
    Addr,
    Addi,
    Mulr,
    Muli,
    Banr,
    Bani,
    Borr,
    Bori,
    Setr,
    Seti,
    Gtir,
    Gtri,
    Gtrr,
    Eqir,
    Eqri,
    Eqrr,
}

impl Op {
    pub const ALL: [Op; OP_COUNT] = [
        Op::Addr, Op::Addi, Op::Mulr, Op::Muli,
        Op::Banr, Op::Bani, Op::Borr, Op::Bori,
        Op::Setr, Op::Seti,
        Op::Gtir, Op::Gtri, Op::Gtrr,
        Op::Eqir, Op::Eqri, Op::Eqrr,
    ];

    pub fn from_number(number: usize) -> Result<Op, Error> {
        Op::from_usize(number)
            .ok_or_else(|| format_err!("Unknown operation: {}", number))
    }

    pub fn from_mnemonic(s: &str) -> Result<Op, Error> {
        Op::ALL.iter()
               .copied()
               .find(|op| op.mnemonic() == s)
               .ok_or_else(|| format_err!("Unknown operation: {}", s))
    }

    pub fn number(&self) -> usize {
        *self as usize
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Addr => "addr",
            Op::Addi => "addi",
            Op::Mulr => "mulr",
            Op::Muli => "muli",
            Op::Banr => "banr",
            Op::Bani => "bani",
            Op::Borr => "borr",
            Op::Bori => "bori",
            Op::Setr => "setr",
            Op::Seti => "seti",
            Op::Gtir => "gtir",
            Op::Gtri => "gtri",
            Op::Gtrr => "gtrr",
            Op::Eqir => "eqir",
            Op::Eqri => "eqri",
            Op::Eqrr => "eqrr",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

// An instruction whose opcode is either still encoded (usize) or resolved (Op).
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub struct Instruction<T> {
    pub op: T,
    pub a: isize,
    pub b: isize,
    pub c: isize,
}

impl<T> Instruction<T> {
    pub fn new(op: T, a: isize, b: isize, c: isize) -> Self {
        Instruction {
            op: op,
            a: a,
            b: b,
            c: c,
        }
    }

    pub fn with_op<U>(&self, op: U) -> Instruction<U> {
        Instruction::new(op, self.a, self.b, self.c)
    }
}

impl<T: fmt::Display> fmt::Display for Instruction<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} {}", self.op, self.a, self.b, self.c)
    }
}

#[derive(Clone,Eq,PartialEq)]
pub struct Registers(Vec<isize>);

impl Registers {
    pub fn new(count: usize) -> Self {
        Registers(vec![0; count])
    }

    pub fn from_values(values: &[isize]) -> Self {
        Registers(values.to_vec())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn values(&self) -> &[isize] {
        &self.0
    }

    // Reads a register, treating the operand as a register number.
    pub fn get(&self, reg: isize) -> Result<isize, Error> {
        Ok(self.0[self.index_of(reg)?])
    }

    pub fn set(&mut self, reg: isize, value: isize) -> Result<(), Error> {
        let index = self.index_of(reg)?;
        self.0[index] = value;
        Ok(())
    }

    pub fn clear(&mut self) {
        for value in self.0.iter_mut() {
            *value = 0;
        }
    }

    fn index_of(&self, reg: isize) -> Result<usize, Error> {
        if reg >= 0 && (reg as usize) < self.0.len() {
            Ok(reg as usize)
        } else {
            Err(format_err!("Invalid register: {}", reg))
        }
    }
}

impl Index<usize> for Registers {
    type Output = isize;

    fn index(&self, index: usize) -> &isize {
        &self.0[index]
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.0.iter()
                                .map(|r| r.to_string())
                                .collect::<Vec<String>>()
                                .join(", "))
    }
}

fn flag(condition: bool) -> isize {
    if condition { 1 } else { 0 }
}

// Applies one operation. Only register c is written; on error (bad register,
// arithmetic overflow) the registers are left untouched.
pub fn execute(op: Op, a: isize, b: isize, c: isize,
               regs: &mut Registers) -> Result<(), Error> {
    let value = match op {
        Op::Addr => regs.get(a)?.checked_add(regs.get(b)?),
        Op::Addi => regs.get(a)?.checked_add(b),
        Op::Mulr => regs.get(a)?.checked_mul(regs.get(b)?),
        Op::Muli => regs.get(a)?.checked_mul(b),
        Op::Banr => Some(regs.get(a)? & regs.get(b)?),
        Op::Bani => Some(regs.get(a)? & b),
        Op::Borr => Some(regs.get(a)? | regs.get(b)?),
        Op::Bori => Some(regs.get(a)? | b),
        Op::Setr => Some(regs.get(a)?),
        Op::Seti => Some(a),
        Op::Gtir => Some(flag(a > regs.get(b)?)),
        Op::Gtri => Some(flag(regs.get(a)? > b)),
        Op::Gtrr => Some(flag(regs.get(a)? > regs.get(b)?)),
        Op::Eqir => Some(flag(a == regs.get(b)?)),
        Op::Eqri => Some(flag(regs.get(a)? == b)),
        Op::Eqrr => Some(flag(regs.get(a)? == regs.get(b)?)),
    };
    let value = value.ok_or_else(|| {
        format_err!("Arithmetic overflow: {} {} {} {}", op, a, b, c)
    })?;
    regs.set(c, value)
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub enum CpuState {
    Running,
    Halted,
}

#[derive(Clone)]
pub struct Cpu {
    program: Vec<Instruction<Op>>,
    regs: Registers,
    ip: isize,
    ip_reg: Option<usize>,
    state: CpuState,
    trace: bool,
}

impl Cpu {
    pub fn new(register_count: usize, program: Vec<Instruction<Op>>) -> Self {
        Cpu {
            program: program,
            regs: Registers::new(register_count),
            ip: 0,
            ip_reg: None,
            state: CpuState::Running,
            trace: false,
        }
    }

    // Reads a listing of mnemonic instructions whose first line is the
    // "#ip N" directive.
    pub fn from_string(text: &str,
                       register_count: usize) -> Result<Self, Error> {
        let mut lines = text.lines()
                            .map(|l| l.trim())
                            .enumerate()
                            .filter(|(_, l)| !l.is_empty());
        let ip_reg = match lines.next() {
            Some((i, line)) => match IP_REGEX.captures(line) {
                Some(caps) => caps["reg"].parse::<usize>()?,
                None => return Err(format_err!("Line {}: expected #ip: {}",
                                               i+1, line)),
            },
            None => return Err(format_err!("Empty program")),
        };
        let program = lines.map(|(i, line)| Self::parse_instruction(i, line))
                           .collect::<Result<Vec<Instruction<Op>>, _>>()?;
        Cpu::new(register_count, program).with_ip_register(ip_reg)
    }

    fn parse_instruction(line_index: usize,
                         line: &str) -> Result<Instruction<Op>, Error> {
        match INST_REGEX.captures(line) {
            Some(caps) => {
                Ok(Instruction::new(Op::from_mnemonic(&caps["op"])?,
                                    caps["a"].parse::<isize>()?,
                                    caps["b"].parse::<isize>()?,
                                    caps["c"].parse::<isize>()?))
            },
            None => {
                Err(format_err!("Line {}: bad instruction: {}",
                                line_index+1, line))
            },
        }
    }

    // Binds the instruction pointer to a register (the "#ip N" directive).
    pub fn with_ip_register(mut self, reg: usize) -> Result<Self, Error> {
        if reg >= self.regs.len() {
            return Err(format_err!("Invalid ip register: {}", reg));
        }
        self.ip_reg = Some(reg);
        Ok(self)
    }

    pub fn ip(&self) -> isize {
        self.ip
    }

    pub fn program(&self) -> &[Instruction<Op>] {
        &self.program
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    pub fn reset(&mut self) {
        self.regs.clear();
        self.ip = 0;
        self.state = CpuState::Running;
    }

    // Print CPU state before each instruction is executed.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    // Same as run, but displays CPU state at each step.
    pub fn debug(&mut self) -> Result<isize, Error> {
        self.set_trace(true);
        self.run()
    }

    pub fn run(&mut self) -> Result<isize, Error> {
        while self.is_running() {
            self.step()?;
        }
        Ok(self.regs[0])
    }

    // Steps until the next instruction to execute is at `ip`, or the CPU
    // halts. Returns whether the CPU is still running.
    pub fn run_until(&mut self, ip: isize) -> Result<bool, Error> {
        self.step()?;
        while self.is_running() && self.ip != ip {
            self.step()?;
        }
        Ok(self.is_running())
    }

    fn current(&self) -> Option<&Instruction<Op>> {
        if self.ip < 0 {
            None
        } else {
            self.program.get(self.ip as usize)
        }
    }

    pub fn step(&mut self) -> Result<(), Error> {
        let inst = match self.current().copied() {
            Some(inst) => inst,
            None => {
                self.state = CpuState::Halted;
                return Ok(());
            },
        };
        if self.trace {
            println!("{:?}", self);
        }
        if let Some(reg) = self.ip_reg {
            self.regs.set(reg as isize, self.ip)?;
        }
        execute(inst.op, inst.a, inst.b, inst.c, &mut self.regs)
            .map_err(|e| format_err!("ip={}: {}: {}", self.ip, inst, e))?;
        if let Some(reg) = self.ip_reg {
            self.ip = self.regs[reg];
        }
        self.ip += 1;
        Ok(())
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ip={} {:?}", self.ip, self.regs)?;
        if let Some(inst) = self.current() {
            write!(f, " {}", inst)?;
        }
        Ok(())
    }
}
