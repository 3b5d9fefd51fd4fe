use {
    derive_more::Display,
    std::{
        fmt,
        io::{self, Write},
    },
};

const INDENT_WIDTH: usize = 8;

static SLUG_NAMES: &[(char, &str)] = &[
    ('?', "_quest_"),
    ('!', "_bang_"),
    ('$', "_dollar_"),
    ('%', "_percent_"),
    ('+', "_plus_"),
    ('-', "_dash_"),
    ('=', "_equals_"),
    ('^', "_caret_"),
    ('&', "_amper_"),
    ('*', "_star_"),
    ('@', "_at_"),
    ('~', "_tilde_"),
    (',', "_comma_"),
    (':', "_colon_"),
    ('<', "_lt_"),
    ('>', "_gt_"),
    ('.', "_dot_"),
    ('/', "_fslash_"),
    ('\\', "_bslash_"),
    ('|', "_pipe_"),
];

/// Replaces punctuation that assemblers reject in label names.
pub fn slug(name: &str) -> String {
    let mut slugged = String::with_capacity(name.len());
    for c in name.chars() {
        match SLUG_NAMES.iter().find(|&&(from, _)| from == c) {
            Some((_, to)) => slugged.push_str(to),
            None => slugged.push(c),
        }
    }
    slugged
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct Label(String);

impl Label {
    /// Label visible outside the unit. Dots separating a type from its
    /// method are kept.
    pub fn export(name: &str) -> Self {
        let slugged = name.split('.').map(slug).collect::<Vec<_>>().join(".");
        Label(format!(".{slugged}"))
    }
}

/// A numeric or string operand written inline in an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Immediate {
    Number(f64),
    Str(String),
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            // always carries a decimal point: `2.0`, `-0.5`
            Immediate::Number(n) => write!(f, "{n:?}"),
            Immediate::Str(ref s) => write!(f, "{s:?}"),
        }
    }
}

/// Line-oriented assembly writer.
pub struct Emitter<W> {
    out: W,
    indent: usize,
    next_label: usize,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            indent: 0,
            next_label: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn unindent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn line(&mut self, text: impl fmt::Display) -> io::Result<()> {
        writeln!(
            self.out,
            "{:width$}{text}",
            "",
            width = self.indent * INDENT_WIDTH
        )
    }

    pub fn emit(&mut self, mnemonic: &str, operands: &[&dyn fmt::Display]) -> io::Result<()> {
        let mut text = mnemonic.to_string();
        for operand in operands {
            text.push(' ');
            text.push_str(&operand.to_string());
        }
        self.line(text)
    }

    pub fn label(&mut self, label: &Label) -> io::Result<()> {
        self.line(format_args!("{label}:"))
    }

    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        if !text.contains('\n') {
            return self.line(format_args!("// {}", text.trim()));
        }
        self.line("/*")?;
        self.indent();
        let result = text
            .lines()
            .try_for_each(|line| self.line(line.trim().replace("*/", "*/ /*")));
        self.unindent();
        result?;
        self.line("*/")
    }

    /// A label unique within this emitter, of the form `@_<prefix>_<n>__`.
    pub fn fresh_label(&mut self, prefix: &str) -> Label {
        let n = self.next_label;
        self.next_label += 1;
        Label(format!("@_{}_{n}__", slug(prefix)))
    }
}
