use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

// Assembler errors

pub fn asm_invalid_label(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::label",
        help = "label names start with a letter, '_', '-' or '$'.",
        labels = vec![LabeledSpan::at(span, "invalid label name")],
        "Invalid label name",
    )
    .with_source_code(src)
}

pub fn asm_trailing_after_label(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::label",
        help = "a label definition must be alone on its line.",
        labels = vec![LabeledSpan::at(span, "trailing characters")],
        "Unexpected characters after label definition",
    )
    .with_source_code(src)
}

pub fn asm_duplicate_label(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::duplicate_label",
        help = "each label may only be defined once per file.",
        labels = vec![LabeledSpan::at(span, "duplicate label")],
        "Duplicate label",
    )
    .with_source_code(src)
}

pub fn asm_unknown_instruction(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::instruction",
        help = "check the mnemonic against the instruction listing.",
        labels = vec![LabeledSpan::at(span, "unknown instruction")],
        "Unknown instruction",
    )
    .with_source_code(src)
}

pub fn asm_invalid_directive(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::directive",
        help = "available directives: .TEXT .DATA .ASCII .STRING .BYTE .WORD .DEFINE",
        labels = vec![LabeledSpan::at(span, "invalid directive")],
        "Invalid directive",
    )
    .with_source_code(src)
}

pub fn asm_no_param_expected(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::param",
        help = "this form takes no parameter.",
        labels = vec![LabeledSpan::at(span, "unexpected parameter")],
        "No parameter expected",
    )
    .with_source_code(src)
}

pub fn asm_param_expected(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::param",
        help = "this instruction needs a register, literal or label operand.",
        labels = vec![LabeledSpan::at(span, "missing parameter")],
        "Parameter expected",
    )
    .with_source_code(src)
}

pub fn asm_unsupported_param(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::param",
        help = "operands are %X, %Y, %A, a literal, a label, or %R + offset.",
        labels = vec![LabeledSpan::at(span, "unsupported parameter")],
        "Unsupported parameter",
    )
    .with_source_code(src)
}

pub fn asm_bad_register(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::param",
        help = "indexed operands use %X, %Y or %A as the base.",
        labels = vec![LabeledSpan::at(span, "bad register")],
        "Bad register",
    )
    .with_source_code(src)
}

pub fn asm_bad_pop(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::param",
        help = "POP accepts VOID, %X, %Y or %A.",
        labels = vec![LabeledSpan::at(span, "bad destination")],
        "Unknown POP parameter",
    )
    .with_source_code(src)
}

pub fn asm_expected_quote(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::str_lit",
        help = "string directives take a double-quoted literal.",
        labels = vec![LabeledSpan::at(span, "expected '\"'")],
        "Expected '\"'",
    )
    .with_source_code(src)
}

pub fn asm_unterminated_string(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::str_lit",
        help = "make sure to close string literals with a \" character.",
        labels = vec![LabeledSpan::at(span, "unterminated literal")],
        "Unexpected end of string literal",
    )
    .with_source_code(src)
}

pub fn asm_bad_escape(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::str_lit",
        help = r#"supported escapes: \\ \" \n \r \t \0"#,
        labels = vec![LabeledSpan::at(span, "unknown escape")],
        "Unexpected escape",
    )
    .with_source_code(src)
}

pub fn asm_trailing_garbage(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::str_lit",
        help = "nothing may follow the closing quote.",
        labels = vec![LabeledSpan::at(span, "trailing characters")],
        "Trailing garbage",
    )
    .with_source_code(src)
}

pub fn asm_invalid_value(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::literal",
        help = "expected a signed decimal literal.",
        labels = vec![LabeledSpan::at(span, "invalid value")],
        "Invalid value",
    )
    .with_source_code(src)
}

pub fn asm_invalid_define_name(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::define",
        help = ".DEFINE takes an identifier followed by a decimal value.",
        labels = vec![LabeledSpan::at(span, "invalid identifier")],
        "Invalid identifier",
    )
    .with_source_code(src)
}

pub fn asm_duplicate_define(span: Span, src: &'static str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::define",
        help = "each constant may only be defined once per file.",
        labels = vec![LabeledSpan::at(span, "duplicate define")],
        "Duplicate define",
    )
    .with_source_code(src)
}

// Linker errors

pub fn link_unknown_label(span: Span, src: &'static str, label: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "link::unresolved",
        help = "every referenced label must be defined in .TEXT or .DATA.",
        labels = vec![LabeledSpan::at(span, "unresolved reference")],
        "Invalid relocation: no label named {label}",
    )
    .with_source_code(src)
}

pub fn link_absolute_range(span: Span, src: &'static str, value: i64) -> Report {
    miette!(
        severity = Severity::Error,
        code = "link::range",
        help = "absolute addresses must fit in an unsigned byte (0..=255).",
        labels = vec![LabeledSpan::at(span, "target out of range")],
        "Absolute relocation out of range ({value})",
    )
    .with_source_code(src)
}

pub fn link_relative_range(span: Span, src: &'static str, value: i64) -> Report {
    miette!(
        severity = Severity::Error,
        code = "link::range",
        help = "branch displacements must fit in a signed byte (-128..=127).",
        labels = vec![LabeledSpan::at(span, "target out of range")],
        "Relative relocation out of range ({value})",
    )
    .with_source_code(src)
}
