//! Single-instruction disassembler, the inverse of the instruction
//! encoder. Used by the debug driver to show the instruction the CPU
//! is about to execute; output is not guaranteed to match the original
//! source spelling (aliases, collapsed zero operands).

use std::fmt::Write as _;

use crate::ops::{Opcode, ParamMode, SpecOp};

/// Decode one instruction from the front of `bytes`, returning the
/// rendered text and the number of bytes consumed (1 or 2).
pub fn disasm(bytes: &[u8]) -> (String, usize) {
    let Some(&instr) = bytes.first() else {
        return ("OOB".to_string(), 1);
    };

    let op = Opcode::from_bits(instr >> 3);
    let mode = ParamMode::from_bits(instr & 0x07);

    match op {
        Opcode::Special => {
            let text = match SpecOp::from_bits(mode.bits()) {
                Some(SpecOp::Nop) => "NOP",
                Some(SpecOp::Lsr) => "LSR",
                Some(SpecOp::Ror) => "ROR",
                Some(SpecOp::Inc) => "INC",
                None => "BAD SPECIAL",
            };
            return (text.to_string(), 1);
        }
        Opcode::Pop => {
            let text = match mode.bits() {
                0b000 => "POP VOID",
                0b001 => "POP %X",
                0b010 => "POP %Y",
                0b011 => "POP %A",
                _ => "BAD POP",
            };
            return (text.to_string(), 1);
        }
        _ => (),
    }

    let mut out = op.mnemonic().to_string();

    let next = if mode.has_immediate() {
        match bytes.get(1) {
            Some(&next) => next,
            None => {
                out.push_str(" OOB");
                return (out, 1);
            }
        }
    } else {
        0
    };

    let len = match mode {
        ParamMode::Zero => {
            out.push_str(" 0");
            1
        }
        ParamMode::X => {
            out.push_str(" %X");
            1
        }
        ParamMode::Y => {
            out.push_str(" %Y");
            1
        }
        ParamMode::Acc => {
            out.push_str(" %A");
            1
        }
        ParamMode::Imm => {
            let _ = write!(out, " {next}");
            2
        }
        ParamMode::XImm => {
            let _ = write!(out, " %X + {next}");
            2
        }
        ParamMode::YImm => {
            let _ = write!(out, " %Y + {next}");
            2
        }
        ParamMode::AccImm => {
            let _ = write!(out, " %A + {next}");
            2
        }
    };

    (out, len)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn specials() {
        assert_eq!(disasm(&[0x00]), ("NOP".to_string(), 1));
        assert_eq!(disasm(&[0x01]), ("LSR".to_string(), 1));
        assert_eq!(disasm(&[0x02]), ("ROR".to_string(), 1));
        assert_eq!(disasm(&[0x03]), ("INC".to_string(), 1));
        assert_eq!(disasm(&[0x04, 0]), ("BAD SPECIAL".to_string(), 1));
    }

    #[test]
    fn pop_destinations() {
        assert_eq!(disasm(&[0xF8]), ("POP VOID".to_string(), 1));
        assert_eq!(disasm(&[0xFB]), ("POP %A".to_string(), 1));
        assert_eq!(disasm(&[0xFC]), ("BAD POP".to_string(), 1));
    }

    #[test]
    fn parameter_rendering() {
        assert_eq!(disasm(&[0x50]), ("MVA 0".to_string(), 1));
        assert_eq!(disasm(&[0x51]), ("MVA %X".to_string(), 1));
        assert_eq!(disasm(&[0x52]), ("MVA %Y".to_string(), 1));
        assert_eq!(disasm(&[0x53]), ("MVA %A".to_string(), 1));
        assert_eq!(disasm(&[0x54, 5]), ("MVA 5".to_string(), 2));
        assert_eq!(disasm(&[0x7D, 4]), ("LDA %X + 4".to_string(), 2));
        assert_eq!(disasm(&[0x96, 255]), ("STA %Y + 255".to_string(), 2));
    }

    #[test]
    fn out_of_bounds() {
        assert_eq!(disasm(&[]), ("OOB".to_string(), 1));
        assert_eq!(disasm(&[0x54]), ("MVA OOB".to_string(), 1));
    }

    #[test]
    fn shift_left_bytes_decode_as_adds() {
        assert_eq!(disasm(&[0x0B]), ("ADD %A".to_string(), 1));
        assert_eq!(disasm(&[0x1B]), ("ADC %A".to_string(), 1));
    }

    #[test]
    fn assembled_mnemonics_survive() {
        use crate::assembler::Assembler;
        use crate::linker::link;

        let src = "START:\nMVA 5\nADD %X\nLDA %Y + 2\nB START\nPOP VOID";
        let mut a = Assembler::new(src).assemble().unwrap();
        link(&mut a, src).unwrap();

        let mut at = 0;
        let mut names = Vec::new();
        while at < a.text.content.len() {
            let (text, len) = disasm(&a.text.content[at..]);
            names.push(text.split(' ').next().unwrap().to_string());
            at += len;
        }
        assert_eq!(names, vec!["MVA", "ADD", "LDA", "B", "POP"]);
    }
}
