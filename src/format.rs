// This module turns the run-wide accumulators into the two output artifacts. It is the only
// place that resolves indentation depth from Indent/Dedent markers, places exit labels flush
// left, exempts preprocessor conditionals from indentation and wraps long statements at their
// argument-list commas. The body budget shrinks by one indent width per nesting level; header
// prototypes use their own fixed budget. Underflowing or leftover depth is a fatal error since
// it means an emitter produced an unbalanced block.

//! Output formatter for the implementation source and prototype header.

use crate::core::{GenError, GenResult, PrototypeSet, Token};

/// Layout parameters of the rendered artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Column budget of body statements at depth zero.
    pub body_width: usize,
    /// Column budget of header prototypes.
    pub proto_width: usize,
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Comment lines at the top of both artifacts.
    pub banner: Vec<String>,
    pub header_guard: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            body_width: 100,
            proto_width: 80,
            indent_width: 4,
            banner: vec![
                "/*".to_string(),
                " * This file was generated by collgen; do not edit.".to_string(),
                " */".to_string(),
            ],
            header_guard: "COLL_ALGOS_H_INCLUDED".to_string(),
        }
    }
}

/// Break `line` at `", "` so each piece fits in `width` columns when possible.
///
/// Continuation pieces align after the first `(`, or use a four-space lead
/// when that alignment itself would not fit.
pub fn wrap_at_commas(line: &str, width: usize) -> Vec<String> {
    let align = line.find('(').map(|pos| pos + 1).unwrap_or(12);
    let mut out = Vec::new();
    let mut current = String::new();

    for (i, segment) in line.split(", ").enumerate() {
        if i == 0 {
            current.push_str(segment);
        } else if current.len() + 2 + segment.len() <= width {
            current.push_str(", ");
            current.push_str(segment);
        } else {
            current.push(',');
            out.push(std::mem::take(&mut current));
            let lead = if align + segment.len() <= width { align } else { 4 };
            current = format!("{}{}", " ".repeat(lead), segment);
        }
    }
    out.push(current);
    out
}

fn is_conditional(line: &str) -> bool {
    line.starts_with("#if") || line.starts_with("#endif")
}

/// Verify that every Indent is matched and depth never goes negative.
pub fn check_balance(tokens: &[Token]) -> GenResult<()> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::Indent => depth += 1,
            Token::Dedent => {
                depth = depth.checked_sub(1).ok_or_else(|| GenError::Unbalanced {
                    reason: format!("dedent below zero at token {}", idx),
                })?
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GenError::Unbalanced {
            reason: format!("{} unclosed indentation level(s) at end of stream", depth),
        });
    }
    Ok(())
}

fn push_banner(out: &mut String, style: &Style) {
    for line in &style.banner {
        out.push_str(line);
        out.push('\n');
    }
}

/// Render the implementation source.
pub fn render_source(tokens: &[Token], style: &Style) -> GenResult<String> {
    check_balance(tokens)?;

    let mut out = String::new();
    push_banner(&mut out, style);

    let mut depth = 0usize;
    for token in tokens {
        match token {
            Token::Indent => depth += 1,
            Token::Dedent => depth -= 1,
            Token::Blank => out.push('\n'),
            Token::Label(label) => {
                out.push_str(&label.to_string());
                out.push('\n');
            }
            Token::Directive(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Token::Line(text) => {
                if !is_conditional(text) {
                    out.push_str(&" ".repeat(style.indent_width * depth));
                }
                out.push_str(text);
                out.push('\n');
            }
            Token::Stmt(text) => {
                let lead = style.indent_width * depth;
                let width = style.body_width.saturating_sub(lead);
                for piece in wrap_at_commas(text, width) {
                    out.push_str(&" ".repeat(lead));
                    out.push_str(&piece);
                    out.push('\n');
                }
            }
        }
    }
    Ok(out)
}

/// Render the prototype header, one wrapped declaration per function.
pub fn render_header(prototypes: &PrototypeSet, style: &Style) -> String {
    let mut out = String::new();
    push_banner(&mut out, style);
    out.push_str(&format!("#ifndef {}\n", style.header_guard));
    out.push_str(&format!("#define {}\n\n", style.header_guard));
    for sig in prototypes.iter() {
        for piece in wrap_at_commas(&format!("{};", sig), style.proto_width) {
            out.push_str(&piece);
            out.push('\n');
        }
    }
    out.push_str(&format!("#endif /* {} */\n", style.header_guard));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CodeBuffer, FnSig, Label};

    fn bare_style() -> Style {
        Style {
            banner: Vec::new(),
            ..Style::default()
        }
    }

    #[test]
    fn test_short_line_untouched() {
        assert_eq!(wrap_at_commas("f(a, b);", 80), ["f(a, b);"]);
    }

    #[test]
    fn test_wrap_aligns_after_paren() {
        let pieces = wrap_at_commas("int f(int alpha, int beta, int gamma)", 24);
        assert_eq!(pieces, ["int f(int alpha,", "      int beta,", "      int gamma)"]);
        for piece in &pieces {
            assert!(piece.len() <= 24);
        }
    }

    #[test]
    fn test_wrap_keeps_line_at_exact_width() {
        let line = format!("f({}, {});", "a".repeat(47), "b".repeat(47));
        assert_eq!(line.len(), 100);
        assert_eq!(wrap_at_commas(&line, 100), [line.clone()]);
        assert_eq!(wrap_at_commas(&line, 99).len(), 2);
    }

    #[test]
    fn test_wrap_falls_back_to_short_lead() {
        let line = format!("{}(aa, bbbbbbbbbb)", "x".repeat(20));
        let pieces = wrap_at_commas(&line, 24);
        assert_eq!(pieces[1], "    bbbbbbbbbb)");
    }

    #[test]
    fn test_render_indentation_and_labels() {
        let mut buf = CodeBuffer::new();
        buf.stmt("int f(void)");
        buf.open("{");
        buf.open("if (x) {");
        buf.line("#if defined(HAVE_X)");
        buf.stmt("y();");
        buf.line("#endif");
        buf.close("}");
        buf.label(Label::Fallback);
        buf.line("return 0;");
        buf.close("}");

        let text = render_source(buf.tokens(), &bare_style()).unwrap();
        assert_eq!(
            text,
            "int f(void)\n{\n    if (x) {\n#if defined(HAVE_X)\n        y();\n#endif\n    }\nfallback:\n    return 0;\n}\n"
        );
    }

    #[test]
    fn test_body_width_shrinks_with_depth() {
        let mut buf = CodeBuffer::new();
        buf.open("{");
        buf.open("{");
        let call = format!("mpi_errno = g({});", vec!["argument_xx"; 8].join(", "));
        buf.stmt(call);
        buf.close("}");
        buf.close("}");

        let text = render_source(buf.tokens(), &bare_style()).unwrap();
        for line in text.lines() {
            assert!(line.len() <= 100, "{:?}", line);
        }
        assert!(text.lines().filter(|l| l.contains("argument_xx")).count() > 1);
    }

    #[test]
    fn test_unbalanced_streams_rejected() {
        assert!(matches!(
            check_balance(&[Token::Dedent]),
            Err(GenError::Unbalanced { .. })
        ));
        assert!(render_source(&[Token::Indent], &bare_style()).is_err());
    }

    #[test]
    fn test_header_guard_and_wrapping() {
        let mut protos = PrototypeSet::new();
        protos.add(FnSig::new(
            "MPIR_Allgatherv_intra_recursive_doubling",
            "const void *sendbuf, MPI_Aint sendcount, MPI_Datatype sendtype, void *recvbuf",
        ));
        let header = render_header(&protos, &bare_style());
        assert!(header.starts_with("#ifndef COLL_ALGOS_H_INCLUDED\n#define COLL_ALGOS_H_INCLUDED\n"));
        assert!(header.trim_end().ends_with("#endif /* COLL_ALGOS_H_INCLUDED */"));
        for line in header.lines() {
            assert!(line.len() <= 80, "{:?}", line);
        }
        assert!(header.contains("void *recvbuf);"));
    }
}
