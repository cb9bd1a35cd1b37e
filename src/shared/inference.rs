// Opcode inference: works out which encoded opcode number belongs to which
// operation from before/after samples of the device's registers.

use super::device::{execute, Instruction, Op, OP_COUNT, Registers};
use anyhow::{Error, format_err};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref BEFORE_REGEX: Regex =
        Regex::new(r"^Before:\s*\[(?P<regs>[^\]]*)\]$").unwrap();
    static ref AFTER_REGEX: Regex =
        Regex::new(r"^After:\s*\[(?P<regs>[^\]]*)\]$").unwrap();
}

pub const SAMPLE_REGISTERS: usize = 4;

const ALL_OPS: u16 = 0xffff;

#[derive(Clone,Debug,PartialEq)]
pub struct Sample {
    pub before: Registers,
    pub inst: Instruction<usize>,
    pub after: Registers,
}

impl Sample {
    // Bitmask of the operations that turn `before` into `after`.
    pub fn possible_ops(&self) -> u16 {
        let mut mask = 0;
        for &op in Op::ALL.iter() {
            let mut regs = self.before.clone();
            let inst = &self.inst;
            if execute(op, inst.a, inst.b, inst.c, &mut regs).is_ok()
                && regs == self.after {
                mask |= 1 << op.number();
            }
        }
        mask
    }
}

// One candidate mask per encoded opcode number. Bit i of a mask is set while
// Op number i is still consistent with every sample using that number.
#[derive(Clone,Copy,Eq,PartialEq)]
pub struct CompatibilityMatrix {
    columns: [u16; OP_COUNT],
}

impl CompatibilityMatrix {
    pub fn new() -> Self {
        CompatibilityMatrix {
            columns: [ALL_OPS; OP_COUNT],
        }
    }

    pub fn from_columns(columns: [u16; OP_COUNT]) -> Self {
        CompatibilityMatrix {
            columns: columns,
        }
    }

    #[cfg(test)]
    pub fn candidates(&self, number: usize) -> u16 {
        self.columns[number]
    }

    #[cfg(test)]
    pub fn is_possible(&self, op: Op, number: usize) -> bool {
        self.columns[number] & (1 << op.number()) != 0
    }

    // Narrows the sample's column, returning how many operations the sample
    // alone behaves like.
    pub fn add_sample(&mut self, sample: &Sample) -> Result<usize, Error> {
        let number = sample.inst.op;
        if number >= OP_COUNT {
            return Err(format_err!("Unknown operation: {}", number));
        }
        let possible = sample.possible_ops();
        self.columns[number] &= possible;
        Ok(possible.count_ones() as usize)
    }

    // Resolves the matrix into a bijection by repeatedly fixing a number with
    // a single candidate and striking that operation from every other number.
    pub fn resolve(&self) -> Result<OpcodeMapping, Error> {
        let mut columns = self.columns;
        let mut mapping: [Option<Op>; OP_COUNT] = [None; OP_COUNT];
        for _ in 0..OP_COUNT {
            let found = (0..OP_COUNT).find(|&number| {
                mapping[number].is_none() && columns[number].count_ones() == 1
            });
            let number = match found {
                Some(number) => number,
                None => return Err(format_err!(
                    "Cannot reduce the constraints: {:?}",
                    CompatibilityMatrix::from_columns(columns))),
            };
            let bit = columns[number];
            let op = Op::from_number(bit.trailing_zeros() as usize)?;
            mapping[number] = Some(op);
            for (other, column) in columns.iter_mut().enumerate() {
                if other != number {
                    *column &= !bit;
                }
            }
        }
        let mut ops = [Op::Addr; OP_COUNT];
        for (number, op) in mapping.iter().enumerate() {
            ops[number] = op.ok_or_else(|| {
                format_err!("Opcode {} left unresolved", number)
            })?;
        }
        Ok(OpcodeMapping { ops: ops })
    }
}

impl fmt::Debug for CompatibilityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (number, column) in self.columns.iter().enumerate() {
            let names = Op::ALL.iter()
                               .filter(|op| column & (1 << op.number()) != 0)
                               .map(|op| op.mnemonic())
                               .collect::<Vec<&str>>();
            write!(f, "{}: [{}] ", number, names.join(" "))?;
        }
        Ok(())
    }
}

#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub struct OpcodeMapping {
    ops: [Op; OP_COUNT],
}

impl OpcodeMapping {
    #[cfg(test)]
    pub fn from_ops(ops: [Op; OP_COUNT]) -> Self {
        OpcodeMapping { ops: ops }
    }

    pub fn op(&self, number: usize) -> Result<Op, Error> {
        self.ops.get(number)
                .copied()
                .ok_or_else(|| format_err!("Unknown operation: {}", number))
    }

    pub fn decode(&self, program: &[Instruction<usize>])
        -> Result<Vec<Instruction<Op>>, Error>
    {
        program.iter()
               .map(|inst| Ok::<_, Error>(inst.with_op(self.op(inst.op)?)))
               .collect()
    }
}

// The two sections of the day 16 input.
#[derive(Debug)]
pub struct Manual {
    pub samples: Vec<Sample>,
    pub program: Vec<Instruction<usize>>,
}

impl Manual {
    pub fn from_string(text: &str) -> Result<Self, Error> {
        let mut samples = Vec::new();
        let mut program = Vec::new();
        let mut lines = text.lines().enumerate();
        while let Some((i, line)) = lines.next() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(caps) = BEFORE_REGEX.captures(line) {
                if !program.is_empty() {
                    return Err(format_err!(
                        "Line {}: sample after program start", i+1));
                }
                let before = parse_sample_registers(i, &caps["regs"])?;
                let (i, line) = lines.next()
                    .ok_or_else(|| format_err!("Line {}: truncated sample", i+1))?;
                let inst = parse_instruction(i, line.trim())?;
                let (i, line) = lines.next()
                    .ok_or_else(|| format_err!("Line {}: truncated sample", i+1))?;
                let after = match AFTER_REGEX.captures(line.trim()) {
                    Some(caps) => parse_sample_registers(i, &caps["regs"])?,
                    None => return Err(format_err!(
                        "Line {}: expected After: {}", i+1, line)),
                };
                samples.push(Sample {
                    before: before,
                    inst: inst,
                    after: after,
                });
            } else {
                program.push(parse_instruction(i, line)?);
            }
        }
        Ok(Manual {
            samples: samples,
            program: program,
        })
    }

    pub fn matrix(&self) -> Result<(CompatibilityMatrix, usize), Error> {
        let mut matrix = CompatibilityMatrix::new();
        let mut three_or_more = 0;
        for sample in self.samples.iter() {
            if matrix.add_sample(sample)? >= 3 {
                three_or_more += 1;
            }
        }
        Ok((matrix, three_or_more))
    }
}

fn parse_sample_registers(line_index: usize,
                          text: &str) -> Result<Registers, Error> {
    let values = text.split(',')
                     .map(|s| s.trim().parse::<isize>())
                     .collect::<Result<Vec<isize>, _>>()
                     .map_err(|e| format_err!("Line {}: bad registers [{}]: {}",
                                              line_index+1, text, e))?;
    if values.len() != SAMPLE_REGISTERS {
        return Err(format_err!("Line {}: expected {} registers, got {}",
                               line_index+1, SAMPLE_REGISTERS, values.len()));
    }
    Ok(Registers::from_values(&values))
}

fn parse_instruction(line_index: usize,
                     line: &str) -> Result<Instruction<usize>, Error> {
    let fields = line.split_whitespace().collect::<Vec<&str>>();
    let bad = || format_err!("Line {}: bad instruction: {}", line_index+1, line);
    if fields.len() != 4 {
        return Err(bad());
    }
    let op = fields[0].parse::<usize>().map_err(|_| bad())?;
    let operands = fields[1..].iter()
                              .map(|s| s.parse::<isize>())
                              .collect::<Result<Vec<isize>, _>>()
                              .map_err(|_| bad())?;
    Ok(Instruction::new(op, operands[0], operands[1], operands[2]))
}
