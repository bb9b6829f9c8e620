// This module defines the typed emission stream that every tier emitter writes into. Instead
// of concatenating indented text, emitters push Token values: verbatim lines, wrappable
// statements, paired Indent/Dedent markers, exit labels and preprocessor directives. The
// CodeBuffer wraps the token vector with the small vocabulary the emitters need to open and
// close C blocks, split an if/else, and lay down the shared fn_exit/fn_fail epilogue. Only
// the formatter resolves depth, label placement and wrapping.

//! Typed emission tokens and the buffer that accumulates them.

use std::fmt;

/// Exit labels shared by every emitted function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    FnExit,
    FnFail,
    Fallback,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::FnExit => "fn_exit",
            Label::FnFail => "fn_fail",
            Label::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.as_str())
    }
}

/// One atomic element of the output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Emitted as-is at the current depth, never wrapped.
    Line(String),
    /// Statement or signature that may be wrapped at argument commas.
    Stmt(String),
    /// Empty line.
    Blank,
    Indent,
    Dedent,
    /// Flush-left label.
    Label(Label),
    /// `#if`/`#endif` style line, exempt from indentation.
    Directive(String),
}

/// Ordered accumulator of emission tokens.
#[derive(Debug, Default, Clone)]
pub struct CodeBuffer {
    tokens: Vec<Token>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.tokens.push(Token::Line(text.into()));
    }

    pub fn stmt(&mut self, text: impl Into<String>) {
        self.tokens.push(Token::Stmt(text.into()));
    }

    pub fn blank(&mut self) {
        self.tokens.push(Token::Blank);
    }

    pub fn directive(&mut self, text: impl Into<String>) {
        self.tokens.push(Token::Directive(text.into()));
    }

    pub fn label(&mut self, label: Label) {
        self.tokens.push(Token::Label(label));
    }

    pub fn indent(&mut self) {
        self.tokens.push(Token::Indent);
    }

    pub fn dedent(&mut self) {
        self.tokens.push(Token::Dedent);
    }

    /// Emit a line that opens a block and push one level.
    pub fn open(&mut self, text: impl Into<String>) {
        self.line(text);
        self.indent();
    }

    /// Pop one level and emit the closing line.
    pub fn close(&mut self, text: impl Into<String>) {
        self.dedent();
        self.line(text);
    }

    /// `} else {` between two blocks of the same depth.
    pub fn else_branch(&mut self) {
        self.dedent();
        self.line("} else {");
        self.indent();
    }

    /// Shared epilogue: `fn_exit` returns the status, `fn_fail` falls through to it.
    pub fn fn_exit(&mut self) {
        self.blank();
        self.label(Label::FnExit);
        self.line("return mpi_errno;");
        self.label(Label::FnFail);
        self.line("goto fn_exit;");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_pairs_markers() {
        let mut buf = CodeBuffer::new();
        buf.open("if (x) {");
        buf.stmt("y();");
        buf.else_branch();
        buf.stmt("z();");
        buf.close("}");

        let indents = buf.tokens().iter().filter(|t| **t == Token::Indent).count();
        let dedents = buf.tokens().iter().filter(|t| **t == Token::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(indents, dedents);
    }

    #[test]
    fn test_fn_exit_labels() {
        let mut buf = CodeBuffer::new();
        buf.fn_exit();
        assert!(buf.tokens().contains(&Token::Label(Label::FnExit)));
        assert!(buf.tokens().contains(&Token::Label(Label::FnFail)));
        assert_eq!(Label::Fallback.to_string(), "fallback:");
    }
}
