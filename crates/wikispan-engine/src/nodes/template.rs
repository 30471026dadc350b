//! Templates, parser functions and their arguments.

use std::ops::Range;

use crate::document::{NodeRef, inner};
use crate::error::{Error, Result};
use crate::nodes::{WikiNode, construct, default_config, find_byte, region_shadow, strip_comments, unsupported};
use crate::recognize::braces::split_arguments;
use crate::registry::{Detail, NodeKind};
use crate::resolve::dup_args;

wrapper!(
    /// `{{name|arg|...}}`.
    Template,
    NodeKind::Template
);

wrapper!(
    /// `{{#name:arg|...}}` or a magic word such as `{{PAGENAME}}`.
    ParserFunction,
    NodeKind::ParserFunction
);

wrapper!(
    /// One `|`- or `:`-introduced segment of a template or parser function.
    Argument,
    NodeKind::Argument
);

/// Name and argument layout of a brace construct, local to its text.
struct Body {
    text: String,
    name: Range<usize>,
    args: Vec<Range<usize>>,
}

fn body(node: &NodeRef, parser_function: bool) -> Result<Body> {
    let text = node.string()?;
    let region = inner(text.len(), 2, 2);
    let s = region_shadow(node, &text, region.clone());
    let args = split_arguments(&s, region.clone(), parser_function);
    let name_end = args.first().map_or(region.end, |a| a.start);
    Ok(Body {
        name: region.start..name_end,
        args,
        text,
    })
}

/// Registers the arguments of a brace construct.
fn arguments(node: &NodeRef, body: &Body) -> Result<Vec<Argument>> {
    let start = node.span()?.start;
    Ok(body
        .args
        .iter()
        .filter_map(|a| node.register(NodeKind::Argument, (start + a.start..start + a.end).into(), Detail::None))
        .map(Argument::from)
        .collect())
}

fn nesting_level(node: &NodeRef) -> Result<usize> {
    Ok(node
        .ancestors_of(None)?
        .iter()
        .filter(|a| matches!(a.kind(), NodeKind::Template | NodeKind::ParserFunction))
        .count())
}

/// Options for [`Template::normal_name`].
#[derive(Debug, Clone)]
pub struct NormalName {
    /// Namespace prefixes removed from the name, compared case-insensitively.
    pub namespaces: Vec<String>,
    /// A language prefix removed before the namespace.
    pub code: Option<String>,
    pub capitalize: bool,
}

impl Default for NormalName {
    fn default() -> Self {
        NormalName {
            namespaces: vec!["Template".to_string()],
            code: None,
            capitalize: false,
        }
    }
}

/// Placement of an argument added by [`Template::set_arg`].
#[derive(Debug, Clone, Default)]
pub struct SetArg<'a> {
    /// `Some(true)` adds a positional argument; an existing argument loses
    /// its name.
    pub positional: Option<bool>,
    /// Insert before the argument with this name.
    pub before: Option<&'a str>,
    /// Insert after the argument with this name, unless `before` is set.
    pub after: Option<&'a str>,
}

/// Drops a leading `prefix:` when `matches(prefix)`.
fn strip_prefix(name: &str, matches: impl Fn(&str) -> bool) -> String {
    let mut name = name.to_string();
    if let Some(rest) = name.strip_prefix(':') {
        name = rest.trim_matches(' ').to_string();
    }
    match name.split_once(':') {
        Some((head, tail)) if !head.is_empty() && matches(head.trim_matches(' ')) => {
            tail.trim_matches(' ').to_string()
        }
        _ => name,
    }
}

impl Template {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Template)
    }

    pub fn name(&self) -> Result<String> {
        let body = body(&self.node, false)?;
        Ok(body.text[body.name].to_string())
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        let body = body(&self.node, false)?;
        self.node.edit_within(body.name, name)
    }

    /// The name with comments, namespace, anchor and redundant whitespace
    /// removed and underscores read as spaces.
    pub fn normal_name(&self, options: &NormalName) -> Result<String> {
        let max_scan = self.node.config().max_unclosed_scan;
        let mut name = strip_comments(&self.name()?, max_scan).trim().to_string();
        if let Some(code) = &options.code {
            name = strip_prefix(&name, |head| head.eq_ignore_ascii_case(code));
        }
        name = strip_prefix(&name, |head| {
            options
                .namespaces
                .iter()
                .any(|ns| ns.to_lowercase() == head.to_lowercase())
        });
        name = name.replace('_', " ");
        if options.capitalize {
            let mut chars = name.chars();
            if let Some(first) = chars.next() {
                name = first.to_uppercase().chain(chars).collect();
            }
        }
        let name = name.split('#').next().unwrap_or_default();
        Ok(name.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    pub fn arguments(&self) -> Result<Vec<Argument>> {
        arguments(&self.node, &body(&self.node, false)?)
    }

    /// The last argument named `name` (whitespace-insensitive).
    pub fn get_arg(&self, name: &str) -> Result<Option<Argument>> {
        for arg in self.arguments()?.into_iter().rev() {
            if arg.name()?.trim() == name.trim() {
                return Ok(Some(arg));
            }
        }
        Ok(None)
    }

    /// True when the last argument named `name` exists and, if `value` is
    /// given, has that value. Keyword values compare trimmed.
    pub fn has_arg(&self, name: &str, value: Option<&str>) -> Result<bool> {
        let Some(arg) = self.get_arg(name)? else {
            return Ok(false);
        };
        let Some(value) = value else {
            return Ok(true);
        };
        let current = arg.value()?;
        Ok(if arg.positional()? {
            current == value
        } else {
            current.trim() == value.trim()
        })
    }

    /// Sets the value of argument `name`, adding it when missing.
    pub fn set_arg(&self, name: &str, value: &str, options: SetArg<'_>) -> Result<()> {
        if let Some(arg) = self.get_arg(name)? {
            if options.positional == Some(true) {
                arg.set_positional(true)?;
            }
            let current = arg.value()?;
            let core = current.trim();
            let lead = current.len() - current.trim_start().len();
            return arg.replace_value(lead..lead + core.len(), value);
        }

        let positional = options.positional.unwrap_or(name.is_empty());
        let addition = if positional {
            format!("|{value}")
        } else {
            format!("|{name}={value}")
        };
        let start = self.span()?.start;
        let anchor = match (options.before, options.after) {
            (Some(before), _) => self.get_arg(before)?.map(|a| a.span().map(|s| s.start)),
            (None, Some(after)) => self.get_arg(after)?.map(|a| a.span().map(|s| s.end)),
            (None, None) => None,
        };
        let at = match anchor {
            Some(at) => at? - start,
            None => self.span()?.len().saturating_sub(2),
        };
        self.node.insert(at, &addition)
    }

    /// Deletes every argument named `name`.
    pub fn del_arg(&self, name: &str) -> Result<()> {
        for arg in self.arguments()?.into_iter().rev() {
            if arg.name()?.trim() == name.trim() {
                arg.delete()?;
            }
        }
        Ok(())
    }

    /// Removes every argument that a later argument of the same name
    /// overrides.
    pub fn rm_first_of_dup_args(&self) -> Result<()> {
        dup_args::rm_first_of_dup_args(self)
    }

    /// Removes duplicate arguments whose removal cannot change the result:
    /// duplicates with an empty or an identical value. `tag` is appended to
    /// the kept duplicates.
    pub fn rm_dup_args_safe(&self, tag: Option<&str>) -> Result<()> {
        dup_args::rm_dup_args_safe(self, tag)
    }

    /// Number of enclosing templates and parser functions.
    pub fn nesting_level(&self) -> Result<usize> {
        nesting_level(&self.node)
    }
}

impl ParserFunction {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::ParserFunction)
    }

    /// Text between `{{` and the first `:` (or the whole body of a magic
    /// word).
    pub fn name(&self) -> Result<String> {
        let body = body(&self.node, true)?;
        Ok(body.text[body.name].to_string())
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        let body = body(&self.node, true)?;
        self.node.edit_within(body.name, name)
    }

    /// Arguments; the first one is introduced by `:`.
    pub fn arguments(&self) -> Result<Vec<Argument>> {
        arguments(&self.node, &body(&self.node, true)?)
    }

    pub fn nesting_level(&self) -> Result<usize> {
        nesting_level(&self.node)
    }
}

/// Position of the top-level `=` of an argument text.
fn equals(node: &NodeRef, text: &str) -> Option<usize> {
    let s = region_shadow(node, text, inner(text.len(), 1, 0));
    find_byte(&s, 1..s.len(), b'=')
}

impl Argument {
    /// Builds a standalone argument such as `|name=value`.
    pub fn new(text: &str) -> Result<Self> {
        if !(text.starts_with('|') || text.starts_with(':')) {
            return Err(Error::malformed(NodeKind::Argument, "an argument starts with `|` or `:`"));
        }
        let node = NodeRef::standalone(text, NodeKind::Argument, default_config());
        let s = region_shadow(&node, text, 1..text.len());
        if find_byte(&s, 1..s.len(), b'|').is_some() {
            return Err(Error::malformed(
                NodeKind::Argument,
                format!("{text:?} holds more than one argument"),
            ));
        }
        Ok(Argument::from(node))
    }

    fn equals(&self) -> Result<(String, Option<usize>)> {
        let text = self.string()?;
        let eq = equals(&self.node, &text);
        Ok((text, eq))
    }

    pub fn positional(&self) -> Result<bool> {
        Ok(self.equals()?.1.is_none())
    }

    /// The explicit name, or the 1-based position among the positional
    /// arguments of the enclosing template.
    pub fn name(&self) -> Result<String> {
        let (text, eq) = self.equals()?;
        if let Some(eq) = eq {
            return Ok(text[1..eq].to_string());
        }
        let own = self.span()?;
        let owner = self
            .node
            .ancestors_of(None)?
            .into_iter()
            .find(|n| matches!(n.kind(), NodeKind::Template | NodeKind::ParserFunction));
        let Some(owner) = owner else {
            return Ok("1".to_string());
        };
        let parser_function = owner.kind() == NodeKind::ParserFunction;
        let siblings = arguments(&owner, &body(&owner, parser_function)?)?;
        let mut index = 1;
        for arg in siblings {
            if arg.span()?.start >= own.start {
                break;
            }
            if arg.positional()? {
                index += 1;
            }
        }
        Ok(index.to_string())
    }

    /// Renames the argument; a positional argument becomes a keyword one.
    pub fn set_name(&self, name: &str) -> Result<()> {
        let (text, eq) = self.equals()?;
        match eq {
            Some(eq) => self.node.edit_within(1..eq, name),
            None => {
                let sep = &text[..1];
                self.node.edit_within(0..1, &format!("{sep}{name}="))
            }
        }
    }

    fn value_range(&self) -> Result<Range<usize>> {
        let (text, eq) = self.equals()?;
        Ok(eq.map_or(1, |eq| eq + 1).min(text.len())..text.len())
    }

    pub fn value(&self) -> Result<String> {
        let range = self.value_range()?;
        Ok(self.string()?[range].to_string())
    }

    pub fn set_value(&self, value: &str) -> Result<()> {
        let range = self.value_range()?;
        self.node.edit_within(range, value)
    }

    /// Replaces `local`, relative to the value, with `text`.
    pub(crate) fn replace_value(&self, local: Range<usize>, text: &str) -> Result<()> {
        let value = self.value_range()?;
        self.node
            .edit_within(value.start + local.start..value.start + local.end, text)
    }

    /// `set_positional(true)` drops the name. A positional argument cannot
    /// become a keyword argument without one; use [`Argument::set_name`].
    pub fn set_positional(&self, positional: bool) -> Result<()> {
        match (self.equals()?.1, positional) {
            (Some(eq), true) => self.node.edit_within(1..eq + 1, ""),
            (Some(_), false) | (None, true) => Ok(()),
            (None, false) => unsupported(NodeKind::Argument, "set_positional(false) without a name"),
        }
    }
}
