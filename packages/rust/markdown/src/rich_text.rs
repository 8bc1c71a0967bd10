//! Rich text run rendering.

use spoketome_shared::RichText;

/// Render a list of runs to inline Markdown.
///
/// Each run is wrapped innermost-first: code, bold, italic, strikethrough, then
/// the link. Underline has no Markdown form and is dropped.
pub fn render_rich_text(runs: &[RichText]) -> String {
    runs.iter().map(render_run).collect()
}

fn render_run(run: &RichText) -> String {
    let a = &run.annotations;
    let mut s = run.plain_text.clone();

    if a.code {
        s = format!("`{s}`");
    }
    if a.bold {
        s = format!("**{s}**");
    }
    if a.italic {
        s = format!("*{s}*");
    }
    if a.strikethrough {
        s = format!("~~{s}~~");
    }
    if let Some(href) = &run.href {
        s = format!("[{s}]({href})");
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoketome_shared::blocks::Annotations;

    fn run(text: &str, annotations: Annotations, href: Option<&str>) -> RichText {
        RichText {
            plain_text: text.into(),
            href: href.map(String::from),
            annotations,
        }
    }

    #[test]
    fn plain_runs_concatenate() {
        let runs = vec![RichText::plain("Hello, "), RichText::plain("world")];
        assert_eq!(render_rich_text(&runs), "Hello, world");
    }

    #[test]
    fn single_styles() {
        let bold = Annotations {
            bold: true,
            ..Default::default()
        };
        let code = Annotations {
            code: true,
            ..Default::default()
        };
        let strike = Annotations {
            strikethrough: true,
            ..Default::default()
        };
        assert_eq!(render_rich_text(&[run("b", bold, None)]), "**b**");
        assert_eq!(render_rich_text(&[run("c", code, None)]), "`c`");
        assert_eq!(render_rich_text(&[run("s", strike, None)]), "~~s~~");
    }

    #[test]
    fn code_and_italic_nest_code_inside() {
        let a = Annotations {
            code: true,
            italic: true,
            ..Default::default()
        };
        assert_eq!(render_rich_text(&[run("x", a, None)]), "*`x`*");
    }

    #[test]
    fn all_styles_with_link_have_fixed_nesting() {
        let all = Annotations {
            bold: true,
            italic: true,
            strikethrough: true,
            underline: true,
            code: true,
        };
        let out = render_rich_text(&[run("text", all, Some("https://example.com"))]);
        assert_eq!(out, "[~~***`text`***~~](https://example.com)");
    }

    #[test]
    fn underline_only_is_plain() {
        let a = Annotations {
            underline: true,
            ..Default::default()
        };
        assert_eq!(render_rich_text(&[run("u", a, None)]), "u");
    }

    #[test]
    fn runs_are_styled_independently() {
        let bold = Annotations {
            bold: true,
            ..Default::default()
        };
        let runs = vec![
            run("Read ", Annotations::default(), None),
            run("the docs", bold, Some("https://docs")),
            run(".", Annotations::default(), None),
        ];
        assert_eq!(render_rich_text(&runs), "Read [**the docs**](https://docs).");
    }

    #[test]
    fn empty_runs_render_empty() {
        assert_eq!(render_rich_text(&[]), "");
    }
}
