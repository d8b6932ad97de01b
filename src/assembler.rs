//! Line-oriented assembler. Each line is independently scanned for a
//! comment, an optional label definition, a directive, or an
//! instruction; emitted bytes append to the currently selected section
//! and label operands become relocation records for the linker.

use miette::Result;

use crate::error;
use crate::lexer::{self, Cursor};
use crate::ops::{special, Opcode, ParamMode, Relativity};
use crate::span::{Idx, Span};
use crate::symbol::{Assembly, RelocKind, Relocation, SectionId};

/// Transforms source text into an [`Assembly`].
pub struct Assembler {
    /// Reference to the source file
    src: &'static str,
    asm: Assembly,
}

impl Assembler {
    pub fn new(src: &'static str) -> Self {
        Assembler {
            src,
            asm: Assembly::new(),
        }
    }

    /// Populate sections, labels, defines and relocations from the
    /// source. Consumes self to return the assembly.
    pub fn assemble(mut self) -> Result<Assembly> {
        let mut base = 0;
        for raw_line in self.src.split('\n') {
            // Truncate at comment
            let line = match raw_line.find(';') {
                Some(idx) => &raw_line[..idx],
                None => raw_line,
            };
            self.line(line, base)?;
            base += raw_line.len() + 1;
        }
        Ok(self.asm)
    }

    fn line(&mut self, line: &str, base: usize) -> Result<()> {
        let mut cur = Cursor::new(line, base);
        cur.skip_space();
        if cur.is_eof() {
            return Ok(());
        }

        let start = cur.pos();
        if lexer::is_initial_ident(cur.first()) || cur.first() == b'.' {
            cur.bump();
            cur.take_while(lexer::is_ident);
        }
        let op_span = cur.span_from(start);
        let op = cur.get_range(start..cur.pos()).to_ascii_uppercase();

        cur.skip_space();

        // Label definition: the token, a colon, and nothing else
        if cur.first() == b':' {
            if !lexer::str_is_ident(&op) {
                return Err(error::asm_invalid_label(op_span, self.src));
            }
            cur.bump();
            cur.skip_space();
            if !cur.is_eof() {
                return Err(error::asm_trailing_after_label(cur.span_rest(), self.src));
            }
            if self.asm.insert_label(op).is_some() {
                return Err(error::asm_duplicate_label(op_span, self.src));
            }
            return Ok(());
        }

        // The remainder of the line, right-trimmed, is the parameter.
        // Directives see it case-preserved for quoted strings.
        let param_start = cur.pos();
        let param = cur.rest().trim_end_matches([' ', '\t', '\r', '\n']);
        let param_span = Span::new(Idx((base + param_start) as u32), param.len() as u16);

        if op.starts_with('.') {
            self.directive(&op, op_span, param, param_span)
        } else {
            let param = param.to_ascii_uppercase();
            self.instruction(&op, op_span, &param, param_span)
        }
    }

    fn directive(
        &mut self,
        op: &str,
        op_span: Span,
        param: &str,
        param_span: Span,
    ) -> Result<()> {
        match op {
            ".TEXT" | ".DATA" => {
                if !param.is_empty() {
                    return Err(error::asm_no_param_expected(param_span, self.src));
                }
                self.asm.current = if op == ".TEXT" {
                    SectionId::Text
                } else {
                    SectionId::Data
                };
                Ok(())
            }
            ".ASCII" => self.string(param, param_span, false),
            ".STRING" => self.string(param, param_span, true),
            ".BYTE" => {
                if !lexer::str_is_numeric(param) {
                    return Err(error::asm_invalid_value(param_span, self.src));
                }
                self.asm.emit(lexer::parse_numeric(param) as u8);
                Ok(())
            }
            ".WORD" => {
                if !lexer::str_is_numeric(param) {
                    return Err(error::asm_invalid_value(param_span, self.src));
                }
                let num = lexer::parse_numeric(param) as u16;
                self.asm.emit((num & 0x00ff) as u8);
                self.asm.emit((num >> 8) as u8);
                Ok(())
            }
            ".DEFINE" => self.define(param, param_span),
            _ => Err(error::asm_invalid_directive(op_span, self.src)),
        }
    }

    /// `.ASCII`/`.STRING` body: a double-quoted literal with C-style
    /// escapes, raw bytes appended to the current section.
    fn string(&mut self, param: &str, param_span: Span, terminate: bool) -> Result<()> {
        let mut cur = Cursor::new(param, param_span.offs());
        if cur.first() != b'"' {
            return Err(error::asm_expected_quote(param_span, self.src));
        }
        cur.bump();

        loop {
            let Some(ch) = cur.bump() else {
                return Err(error::asm_unterminated_string(param_span, self.src));
            };
            if ch == b'"' {
                break;
            }

            if ch == b'\\' {
                let esc_start = cur.pos() - 1;
                let Some(esc) = cur.bump() else {
                    return Err(error::asm_unterminated_string(param_span, self.src));
                };
                let byte = match esc {
                    b'\\' => b'\\',
                    b'"' => b'"',
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'0' => 0,
                    _ => return Err(error::asm_bad_escape(cur.span_from(esc_start), self.src)),
                };
                self.asm.emit(byte);
            } else {
                self.asm.emit(ch);
            }
        }

        cur.skip_space();
        if !cur.is_eof() {
            return Err(error::asm_trailing_garbage(cur.span_rest(), self.src));
        }

        if terminate {
            self.asm.emit(0);
        }
        Ok(())
    }

    fn define(&mut self, param: &str, param_span: Span) -> Result<()> {
        let mut cur = Cursor::new(param, param_span.offs());
        if !lexer::is_initial_ident(cur.first()) {
            return Err(error::asm_invalid_define_name(param_span, self.src));
        }

        let start = cur.pos();
        cur.bump();
        cur.take_while(lexer::is_ident);
        let key_span = cur.span_from(start);
        let key = cur.get_range(start..cur.pos()).to_ascii_uppercase();

        cur.skip_space();
        let val = cur.rest();
        if !lexer::str_is_numeric(val) {
            return Err(error::asm_invalid_value(cur.span_rest(), self.src));
        }

        if self.asm.defines.contains_key(&key) {
            return Err(error::asm_duplicate_define(key_span, self.src));
        }
        self.asm.defines.insert(key, lexer::parse_numeric(val));
        Ok(())
    }

    fn instruction(
        &mut self,
        op: &str,
        op_span: Span,
        param: &str,
        param_span: Span,
    ) -> Result<()> {
        match op {
            "NOP" => self.special(special::NOP, param, param_span),
            "LSR" => self.special(special::LSR, param, param_span),
            "LSL" => self.special(special::LSL, param, param_span),
            "ROR" => self.special(special::ROR, param, param_span),
            "INC" => self.special(special::INC, param, param_span),
            "ROL" => self.special(special::ROL, param, param_span),
            "POP" => self.pop(param, op_span, param_span),
            _ => match Opcode::from_mnemonic(op) {
                Some(opcode) => self.normal(opcode, param, op_span, param_span),
                None => Err(error::asm_unknown_instruction(op_span, self.src)),
            },
        }
    }

    /// Zero-parameter mnemonics with a pre-combined instruction byte.
    fn special(&mut self, byte: u8, param: &str, param_span: Span) -> Result<()> {
        if !param.is_empty() {
            return Err(error::asm_no_param_expected(param_span, self.src));
        }
        self.asm.emit(byte);
        Ok(())
    }

    /// POP reuses the mode field as a destination selector.
    fn pop(&mut self, param: &str, op_span: Span, param_span: Span) -> Result<()> {
        let dest = match param {
            "VOID" => 0b000,
            "%X" => 0b001,
            "%Y" => 0b010,
            "%A" => 0b011,
            "" => return Err(error::asm_param_expected(op_span, self.src)),
            _ => return Err(error::asm_bad_pop(param_span, self.src)),
        };
        self.asm.emit(Opcode::Pop.bits() << 3 | dest);
        Ok(())
    }

    fn normal(
        &mut self,
        opcode: Opcode,
        param: &str,
        op_span: Span,
        param_span: Span,
    ) -> Result<()> {
        let hi = opcode.bits() << 3;

        match param {
            "" => return Err(error::asm_param_expected(op_span, self.src)),
            "%X" => {
                self.asm.emit(hi | ParamMode::X.bits());
                return Ok(());
            }
            "%Y" => {
                self.asm.emit(hi | ParamMode::Y.bits());
                return Ok(());
            }
            "%A" => {
                self.asm.emit(hi | ParamMode::Acc.bits());
                return Ok(());
            }
            _ => (),
        }

        // Constant number literal; zero collapses to the one-byte form
        if lexer::str_is_numeric(param) {
            let num = lexer::parse_numeric(param);
            if num == 0 {
                self.asm.emit(hi | ParamMode::Zero.bits());
            } else {
                self.asm.emit(hi | ParamMode::Imm.bits());
                self.asm.emit(num as u8);
            }
            return Ok(());
        }

        // Constant label or define
        if lexer::str_is_ident(param) {
            self.asm.emit(hi | ParamMode::Imm.bits());
            self.ident_operand(param, param_span, opcode.relativity());
            return Ok(());
        }

        // Register + constant
        if param.starts_with('%') {
            return self.indexed(hi, param, param_span);
        }

        Err(error::asm_unsupported_param(param_span, self.src))
    }

    /// Emit the immediate byte for an identifier operand: the define's
    /// value if one exists, otherwise a zero placeholder plus a
    /// relocation for the linker to patch.
    fn ident_operand(&mut self, ident: &str, span: Span, rel: Relativity) {
        if let Some(val) = self.asm.defines.get(ident).copied() {
            self.asm.emit(val as u8);
            return;
        }

        let index = self.asm.current_mut().len();
        let kind = match rel {
            Relativity::Relative => RelocKind::Relative {
                label: ident.to_string(),
                offset: -1,
            },
            Relativity::Absolute => RelocKind::Absolute {
                label: ident.to_string(),
            },
        };
        self.asm.relocations.push(Relocation { index, span, kind });
        self.asm.emit(0);
    }

    /// `%R + n` and `%R + label` operands.
    fn indexed(&mut self, hi: u8, param: &str, param_span: Span) -> Result<()> {
        let mut cur = Cursor::new(param, param_span.offs());
        cur.bump();

        let mode = match cur.first() {
            b'X' => ParamMode::XImm,
            b'Y' => ParamMode::YImm,
            b'A' => ParamMode::AccImm,
            _ => return Err(error::asm_bad_register(param_span, self.src)),
        };
        self.asm.emit(hi | mode.bits());
        cur.bump();

        cur.skip_space();
        if cur.first() != b'+' {
            return Err(error::asm_unsupported_param(param_span, self.src));
        }
        cur.bump();
        cur.skip_space();

        let rest = cur.rest();
        let rest_span = cur.span_rest();

        if lexer::str_is_ident(rest) {
            // Indexed label references are always absolute
            self.ident_operand(rest, rest_span, Relativity::Absolute);
            return Ok(());
        }

        if lexer::str_is_numeric(rest) {
            // A zero offset still emits its immediate byte; the mode
            // byte for the indexed form is already out.
            self.asm.emit(lexer::parse_numeric(rest) as u8);
            return Ok(());
        }

        Err(error::asm_unsupported_param(param_span, self.src))
    }
}
