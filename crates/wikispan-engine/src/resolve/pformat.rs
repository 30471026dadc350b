//! Pretty printing of templates and parser functions.
//!
//! Works on a private copy of the node's text, like plain-text rendering.
//! Templates are laid out innermost first: one argument per line, `=`
//! signs aligned, positional arguments turned into keyword ones while that
//! cannot change their meaning. Parser functions follow outermost first and
//! are looked up again after each one, since formatting a function
//! replaces the functions inside its arguments.

use std::sync::Arc;

use unicode_width::UnicodeWidthStr;

use crate::document::{Document, NodeRef};
use crate::error::Result;
use crate::nodes::{Argument, ParserFunction, Template, WS, WikiNode};

/// Parser functions whose arguments are whitespace-sensitive.
const VERBATIM_FUNCTIONS: &[&str] = &["#tag", "#invoke", ""];

fn strip(s: &str) -> &str {
    s.trim_matches(WS)
}

/// Display width of an argument name. Lam followed by alef is drawn as one
/// ligature.
fn name_width(name: &str) -> usize {
    name.replace("\u{644}\u{627}", "?").width()
}

/// Appends `text` to the value of `arg`.
fn append(arg: &Argument, text: &str) -> Result<()> {
    let len = arg.value()?.len();
    arg.replace_value(len..len, text)
}

struct ArgLayout {
    name: String,
    positional: bool,
    width: usize,
}

fn format_template(template: &Template, indent: &str) -> Result<()> {
    let raw_name = template.name()?;
    let stripped = strip(&raw_name);
    // `{{ {{t}} }}` must not collapse into a parameter.
    let name = if stripped.starts_with('{') {
        format!(" {stripped} ")
    } else {
        stripped.to_string()
    };
    // A colon may make this a parser function, whose arguments keep their
    // form.
    let convertible = !stripped.contains(':');

    let args = template.arguments()?;
    let Some((last, rest)) = args.split_last() else {
        return template.set_name(&name);
    };
    let level = template.nesting_level()? + 1;
    let newline_indent = format!("\n{}", indent.repeat(level));
    let closing_indent = format!("\n{}", indent.repeat(level - 1));
    template.set_name(&format!("{name}{newline_indent}"))?;

    let mut layout = Vec::with_capacity(args.len());
    for arg in &args {
        let positional = arg.positional()?;
        let name = strip(&arg.name()?).to_string();
        let width = if positional { 0 } else { name_width(&name) };
        layout.push(ArgLayout { name, positional, width });
    }
    let max_width = layout.iter().map(|a| a.width).max().unwrap_or(0);
    let align = |arg: &Argument, layout: &ArgLayout, value: &str| -> Result<()> {
        let padding = " ".repeat(max_width - layout.width);
        arg.set_name(&format!(" {} {padding}", layout.name))?;
        arg.set_value(value)
    };

    let last_comment_indent = if level == 1 {
        "<!--\n-->".to_string()
    } else {
        format!("<!--\n{} -->", indent.repeat(level - 2))
    };
    let last_layout = &layout[rest.len()];
    let value = last.value()?;
    let stripped_value = strip(&value);
    let mut keep_positional = true;
    if last_layout.positional && value != stripped_value {
        if !value.ends_with(&closing_indent) {
            append(last, &last_comment_indent)?;
        }
    } else if convertible {
        keep_positional = false;
        align(last, last_layout, &format!(" {stripped_value}{closing_indent}"))?;
    } else if last_layout.positional {
        append(last, &last_comment_indent)?;
    } else {
        let name = last.name()?;
        last.set_name(&format!(" {}", name.trim_start_matches(WS)))?;
        if !value.ends_with(&closing_indent) {
            last.set_value(&format!("{} {last_comment_indent}", value.trim_end_matches(WS)))?;
        }
    }

    // Once a positional argument has to keep its whitespace, every earlier
    // argument stays as written; comments line up the rest.
    let comment_indent = format!("<!--\n{} -->", indent.repeat(level - 1));
    for (arg, layout) in rest.iter().zip(&layout).rev() {
        let value = arg.value()?;
        let stripped_value = strip(&value);
        if layout.positional && value != stripped_value {
            keep_positional = true;
        }
        if keep_positional {
            if !value.ends_with(&newline_indent) {
                append(arg, &comment_indent)?;
            }
        } else {
            align(arg, layout, &format!(" {stripped_value}{newline_indent}"))?;
        }
    }
    Ok(())
}

fn format_parser_function(function: &ParserFunction, indent: &str) -> Result<()> {
    let name = function.name()?;
    let name = name.trim_start_matches(WS);
    function.set_name(name)?;
    if VERBATIM_FUNCTIONS.contains(&name.to_lowercase().as_str()) {
        return Ok(());
    }

    let args = function.arguments()?;
    let level = function.nesting_level()? + 1;
    let short_indent = format!("\n{}", indent.repeat(level - 1));
    let newline_indent = format!("{short_indent}{indent}");
    let last = args.len().saturating_sub(1);
    for (k, arg) in args.iter().enumerate() {
        let lead = if k == 0 { newline_indent.as_str() } else { " " };
        let tail = if k == last { short_indent.as_str() } else { newline_indent.as_str() };
        if arg.positional()? {
            let value = arg.value()?;
            arg.set_value(&format!("{lead}{}{tail}", strip(&value)))?;
        } else {
            // `=` may be plain text here, so no spaces go around it.
            let name = arg.name()?;
            arg.set_name(&format!("{lead}{}", name.trim_start_matches(WS)))?;
            let value = arg.value()?;
            arg.set_value(&format!("{}{tail}", value.trim_end_matches(WS)))?;
        }
    }
    Ok(())
}

/// Formatted text of `node`; the node itself is left unchanged.
///
/// Comments holding only whitespace are dropped, and every comment when
/// `remove_comments` is set.
pub fn render(node: &NodeRef, indent: &str, remove_comments: bool) -> Result<String> {
    let text = node.string()?;
    let doc = Document::parse_with_config(&text, Arc::new(node.config()));

    for comment in doc.comments()? {
        if remove_comments || strip(&comment.contents()?).is_empty() {
            comment.delete()?;
        }
    }
    for template in doc.templates()?.iter().rev() {
        format_template(template, indent)?;
    }
    let mut i = 0;
    while let Some(function) = doc.parser_functions()?.get(i) {
        format_parser_function(function, indent)?;
        i += 1;
    }
    log::debug!("formatted {} bytes into {}", text.len(), doc.text().len());
    Ok(doc.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn pformat(text: &str) -> String {
        Document::parse(text).pformat("    ", false).expect("format")
    }

    #[rstest]
    #[case("{{a|b=b|c=c|d=d|e=e}}", "{{a\n    | b = b\n    | c = c\n    | d = d\n    | e = e\n}}")]
    #[case("{{t|a|b|c}}", "{{t\n    | 1 = a\n    | 2 = b\n    | 3 = c\n}}")]
    #[case(
        "{{t|long_argument_name=1|2=2}}",
        "{{t\n    | long_argument_name = 1\n    | 2                  = 2\n}}"
    )]
    #[case("{{ t }}", "{{t}}")]
    #[case("{{{{t}} }}", "{{ {{t}} }}")]
    #[case("{{ {{t}}|a=b}}", "{{ {{t}} \n    | a = b\n}}")]
    fn templates_get_one_argument_per_line(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(pformat(text), expected);
    }

    #[rstest]
    #[case("{{t|a| b }}", "{{t\n    |a<!--\n -->| b <!--\n-->}}")]
    #[case("{{t| a |b|c}}", "{{t\n    | a <!--\n -->| 2 = b\n    | 3 = c\n}}")]
    #[case("{{en:text|text}}", "{{en:text\n    |text<!--\n-->}}")]
    #[case("{{en:text|1|2=v}}", "{{en:text\n    |1<!--\n -->| 2=v <!--\n-->}}")]
    #[case("{{en:text|n=v\n}}", "{{en:text\n    | n=v\n}}")]
    fn whitespace_sensitive_arguments_keep_their_form(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(pformat(text), expected);
    }

    #[test]
    fn formatting_again_changes_nothing() {
        let once = "{{t\n    | a <!--\n -->| 2 = b\n    | 3 = c\n}}";
        assert_eq!(pformat(once), once);
    }

    #[rstest]
    #[case("{{#if:c|abcde = f| g=h}}", "{{#if:\n    c\n    | abcde = f\n    | g=h\n}}")]
    #[case("{{#switch:case|a|b}}", "{{#switch:\n    case\n    | a\n    | b\n}}")]
    #[case("{{#if: a }}", "{{#if:\n    a\n}}")]
    #[case("{{#if: a= b }}", "{{#if:\n    a= b\n}}")]
    #[case("{{#expr: 2  =   3}}", "{{#expr:\n    2  =   3\n}}")]
    #[case("{{#iferror:<t a=\"\">|yes|no}}", "{{#iferror:\n    <t a=\"\">\n    | yes\n    | no\n}}")]
    #[case("{{#if:\u{200c}}}", "{{#if:\n    \u{200c}\n}}")]
    fn parser_function_arguments_are_stripped(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(pformat(text), expected);
    }

    #[rstest]
    #[case("{{#tag:ref||name=\"n1\"}}")]
    #[case("{{#tag:foo| }}")]
    #[case("{{#invoke:module|func|arg}}")]
    fn verbatim_functions_are_untouched(#[case] text: &str) {
        assert_eq!(pformat(text), text);
    }

    #[test]
    fn nesting_deepens_the_indent() {
        assert_eq!(
            pformat("{{t|a= {{#if:I|I}} }}"),
            "{{t\n    | a = {{#if:\n        I\n        | I\n    }}\n}}"
        );
        assert_eq!(
            pformat("{{#f:c|e|{{t|a={{#g:b|c}}}}}}"),
            "{{#f:\n    c\n    | e\n    | {{t\n        | a = {{#g:\n            b\n            | c\n        }}\n    }}\n}}"
        );
        assert_eq!(
            pformat("{{t|{{#ifeq:||yes}}|a2}}"),
            "{{t\n    | 1 = {{#ifeq:\n        \n        | \n        | yes\n    }}\n    | 2 = a2\n}}"
        );
    }

    #[test]
    fn names_align_by_display_width() {
        assert_eq!(
            pformat("{{ا|نیم\u{200c}فاصله=۱|بدون نیم فاصله=۲}}"),
            "{{ا\n    | نیم\u{200c}فاصله       = ۱\n    | بدون نیم فاصله = ۲\n}}"
        );
        assert_eq!(pformat("{{ا|الف=۱|لا=۲}}"), "{{ا\n    | الف = ۱\n    | لا   = ۲\n}}");
    }

    #[test]
    fn comments_and_indent() {
        let doc = Document::parse("{{a|<!--b=b|c=c|d=d|-->e=e}}");
        assert_eq!(doc.pformat("  ", true).as_deref(), Ok("{{a\n  | e = e\n}}"));
        assert_eq!(pformat("{{a|b=<!-- -->b}}"), "{{a\n    | b = b\n}}");
        assert_eq!(pformat("{{a|b=<!--x-->b}}"), "{{a\n    | b = <!--x-->b\n}}");
    }

    #[test]
    fn nodes_format_on_their_own_and_stay_unchanged() {
        let doc = Document::parse("{{a|{{b|{{c}}}}}}");
        let templates = doc.templates().expect("query");
        let expected = "{{a\n    | 1 = {{b\n        | 1 = {{c}}\n    }}\n}}";
        assert_eq!(templates[0].pformat("    ", false).as_deref(), Ok(expected));
        assert_eq!(templates[0].pformat("    ", false).as_deref(), Ok(expected));
        assert_eq!(templates[1].pformat("    ", false).as_deref(), Ok("{{b\n    | 1 = {{c}}\n}}"));
        assert_eq!(doc.text(), "{{a|{{b|{{c}}}}}}");
        assert!(templates.iter().all(|t| t.is_alive()));
    }
}
