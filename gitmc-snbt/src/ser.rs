//! SNBT serializer: writes an [`NbtTag`] tree back to stringified NBT text.
//!
//! Two layout modes (minified / expanded) and a handful of cosmetic
//! sub-options are exposed through [`SnbtWriteOptions`]. Most combinations
//! keep `parse(serialize(tree, opts)) == tree`; the two that don't
//! ([`SnbtWriteOptions::array_prefixes`]` == false` and
//! [`NewlineHandling::Sentinel`]) are documented as display presets the
//! translation engine itself never selects. See `DESIGN.md`.

use gitmc_nbt::{NbtCompound, NbtList, NbtTag, TagId};

/// Minified has no whitespace beyond the separators a value needs;
/// expanded indents four spaces per nesting level with one entry per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Minified,
    Expanded,
}

/// How a compound key or string value picks its quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotingPolicy {
    /// Quote only when needed, preferring `"` unless the text contains a
    /// `"` and no `'` (then use `'` to avoid escaping).
    Auto,
    AlwaysDouble,
    AlwaysSingle,
}

/// How a literal `\n` inside a string value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewlineHandling {
    /// `\n` escape sequence (round-trips).
    Escape,
    /// A visible placeholder character instead of a real line break. This
    /// is a display preset for humans skimming a mirror file; it does not
    /// round-trip (the parser has no way to turn the placeholder back into
    /// a newline), so the translation engine never selects it.
    Sentinel,
    /// An actual line break inside the quoted string (round-trips).
    Literal,
}

pub const NEWLINE_SENTINEL: char = '\u{2424}'; // SYMBOL FOR NEWLINE (␤)

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnbtWriteOptions {
    pub mode: Mode,
    /// Toggles the `d` suffix on an otherwise-unambiguous Double literal.
    /// Byte/Short/Long/Float suffixes are always written regardless of this
    /// toggle: without them those tags parse back as Int, breaking the
    /// round-trip invariant.
    pub number_suffixes: bool,
    /// Toggles the `[B;`/`[I;`/`[L;` array-type prefix. Turning this off is
    /// a deliberately lossy display preset, like [`NewlineHandling::Sentinel`]:
    /// a typed array written without its prefix parses back as a plain
    /// List, not the original array tag. The translation engine always
    /// leaves this on.
    pub array_prefixes: bool,
    pub key_quoting: QuotingPolicy,
    pub string_quoting: QuotingPolicy,
    pub newline_handling: NewlineHandling,
}

impl Default for SnbtWriteOptions {
    /// The translation engine's own default: expanded, diff-friendly
    /// output with escaped newlines, since the mirror tree is meant to be
    /// committed to git.
    fn default() -> Self {
        Self {
            mode: Mode::Expanded,
            number_suffixes: true,
            array_prefixes: true,
            key_quoting: QuotingPolicy::Auto,
            string_quoting: QuotingPolicy::Auto,
            newline_handling: NewlineHandling::Escape,
        }
    }
}

pub fn write(tag: &NbtTag, opts: &SnbtWriteOptions) -> String {
    let mut w = Writer { opts, out: String::new() };
    w.write_value(tag, 0);
    w.out
}

fn is_bare_safe(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-'))
}

fn is_primitive_numeric(element_type: TagId) -> bool {
    matches!(
        element_type,
        TagId::Byte | TagId::Short | TagId::Int | TagId::Long | TagId::Float | TagId::Double
    )
}

struct Writer<'a> {
    opts: &'a SnbtWriteOptions,
    out: String,
}

impl<'a> Writer<'a> {
    fn indent(&mut self, depth: usize) {
        if self.opts.mode == Mode::Expanded {
            self.out.push('\n');
            for _ in 0..depth {
                self.out.push_str("    ");
            }
        }
    }

    fn choose_quote(&self, policy: QuotingPolicy, s: &str) -> char {
        match policy {
            QuotingPolicy::AlwaysDouble => '"',
            QuotingPolicy::AlwaysSingle => '\'',
            QuotingPolicy::Auto => {
                if s.contains('"') && !s.contains('\'') {
                    '\''
                } else {
                    '"'
                }
            }
        }
    }

    fn write_quoted(&mut self, s: &str, quote: char) {
        self.out.push(quote);
        for c in s.chars() {
            match c {
                '\\' => self.out.push_str("\\\\"),
                '\n' => match self.opts.newline_handling {
                    NewlineHandling::Escape => self.out.push_str("\\n"),
                    NewlineHandling::Sentinel => self.out.push(NEWLINE_SENTINEL),
                    NewlineHandling::Literal => self.out.push('\n'),
                },
                c if c == quote => {
                    self.out.push('\\');
                    self.out.push(c);
                }
                c => self.out.push(c),
            }
        }
        self.out.push(quote);
    }

    fn write_key(&mut self, key: &str) {
        if self.opts.key_quoting == QuotingPolicy::Auto && is_bare_safe(key) {
            self.out.push_str(key);
            return;
        }
        let quote = self.choose_quote(self.opts.key_quoting, key);
        self.write_quoted(key, quote);
    }

    fn write_string(&mut self, s: &str) {
        // A bare-safe string is only safe to leave unquoted if the parser
        // wouldn't read it back as a number/bool atom instead of a String
        // (e.g. "123", "1b", "2.5", "true") — otherwise this breaks
        // parse(serialize(T)) == T.
        if self.opts.string_quoting == QuotingPolicy::Auto
            && is_bare_safe(s)
            && crate::parser::parse_exact_atom(s).is_none()
        {
            self.out.push_str(s);
            return;
        }
        let quote = self.choose_quote(self.opts.string_quoting, s);
        self.write_quoted(s, quote);
    }

    fn write_f32(&mut self, v: f32) {
        if v.is_nan() {
            self.out.push_str("NaN");
        } else if v.is_infinite() {
            self.out.push_str(if v.is_sign_negative() { "-Infinity" } else { "Infinity" });
        } else {
            let mut buf = ryu::Buffer::new();
            self.out.push_str(buf.format(v));
        }
        self.out.push('f');
    }

    fn write_f64(&mut self, v: f64) {
        if v.is_nan() {
            self.out.push_str("NaN");
        } else if v.is_infinite() {
            self.out.push_str(if v.is_sign_negative() { "-Infinity" } else { "Infinity" });
        } else {
            let mut buf = ryu::Buffer::new();
            self.out.push_str(buf.format(v));
        }
        if self.opts.number_suffixes {
            self.out.push('d');
        }
    }

    fn write_compound(&mut self, compound: &NbtCompound, depth: usize) {
        if compound.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push('{');
        for (i, (key, value)) in compound.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
                if self.opts.mode == Mode::Minified {
                    self.out.push(' ');
                }
            }
            self.indent(depth + 1);
            self.write_key(key);
            self.out.push(':');
            self.out.push(' ');
            self.write_value(value, depth + 1);
        }
        self.indent(depth);
        self.out.push('}');
    }

    fn write_list(&mut self, list: &NbtList, depth: usize) {
        let flat = self.opts.mode == Mode::Minified || is_primitive_numeric(list.element_type());
        self.out.push('[');
        for (i, value) in list.values().iter().enumerate() {
            if i > 0 {
                self.out.push(',');
                if flat {
                    self.out.push(' ');
                }
            }
            if !flat {
                self.indent(depth + 1);
            }
            self.write_value(value, depth + 1);
        }
        if !flat && !list.is_empty() {
            self.indent(depth);
        }
        self.out.push(']');
    }

    fn write_typed_array<T: std::fmt::Display>(&mut self, prefix: char, suffix: &str, values: &[T]) {
        if self.opts.array_prefixes {
            self.out.push('[');
            self.out.push(prefix);
            self.out.push(';');
            self.out.push(' ');
        } else {
            self.out.push('[');
        }
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&v.to_string());
            self.out.push_str(suffix);
        }
        self.out.push(']');
    }

    fn write_value(&mut self, tag: &NbtTag, depth: usize) {
        match tag {
            NbtTag::Byte(v) => {
                self.out.push_str(&v.to_string());
                self.out.push('b');
            }
            NbtTag::Short(v) => {
                self.out.push_str(&v.to_string());
                self.out.push('s');
            }
            NbtTag::Int(v) => self.out.push_str(&v.to_string()),
            NbtTag::Long(v) => {
                self.out.push_str(&v.to_string());
                self.out.push('L');
            }
            NbtTag::Float(v) => self.write_f32(*v),
            NbtTag::Double(v) => self.write_f64(*v),
            NbtTag::ByteArray(v) => self.write_typed_array('B', "b", v),
            NbtTag::String(v) => self.write_string(v),
            NbtTag::List(v) => self.write_list(v, depth),
            NbtTag::Compound(v) => self.write_compound(v, depth),
            NbtTag::IntArray(v) => self.write_typed_array('I', "", v),
            NbtTag::LongArray(v) => self.write_typed_array('L', "L", v),
        }
    }
}
