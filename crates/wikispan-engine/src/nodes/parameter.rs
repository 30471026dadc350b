use std::ops::Range;

use crate::document::inner;
use crate::error::Result;
use crate::nodes::{WikiNode, construct, find_byte, region_shadow};
use crate::registry::NodeKind;

wrapper!(
    /// `{{{name|default}}}`.
    Parameter,
    NodeKind::Parameter
);

/// Local layout of a parameter: its name and the position of the pipe.
struct Layout {
    text: String,
    name: Range<usize>,
    pipe: Option<usize>,
    body_end: usize,
}

impl Parameter {
    pub fn new(text: &str) -> Result<Self> {
        construct(text, NodeKind::Parameter)
    }

    fn layout(&self) -> Result<Layout> {
        let text = self.string()?;
        let body = inner(text.len(), 3, 3);
        let s = region_shadow(&self.node, &text, body.clone());
        let pipe = find_byte(&s, body.clone(), b'|');
        Ok(Layout {
            name: body.start..pipe.unwrap_or(body.end),
            pipe,
            body_end: body.end,
            text,
        })
    }

    pub fn name(&self) -> Result<String> {
        let layout = self.layout()?;
        Ok(layout.text[layout.name].to_string())
    }

    pub fn set_name(&self, name: &str) -> Result<()> {
        self.node.edit_within(self.layout()?.name, name)
    }

    /// `"|"` when the parameter has a default, `""` otherwise.
    pub fn pipe(&self) -> Result<&'static str> {
        Ok(if self.layout()?.pipe.is_some() { "|" } else { "" })
    }

    pub fn default(&self) -> Result<Option<String>> {
        let layout = self.layout()?;
        Ok(layout
            .pipe
            .map(|pipe| layout.text[pipe + 1..layout.body_end].to_string()))
    }

    pub fn set_default(&self, default: &str) -> Result<()> {
        let layout = self.layout()?;
        match layout.pipe {
            Some(pipe) => self.node.edit_within(pipe + 1..layout.body_end, default),
            None => self.node.insert(layout.body_end, &format!("|{default}")),
        }
    }

    /// Removes the default together with its pipe.
    pub fn delete_default(&self) -> Result<()> {
        let layout = self.layout()?;
        match layout.pipe {
            Some(pipe) => self.node.edit_within(pipe..layout.body_end, ""),
            None => Ok(()),
        }
    }

    /// Adds `{{{new}}}` as the default of the innermost parameter of the
    /// default chain, keeping the old default as its fallback. Nothing
    /// changes when the chain already names `new`.
    pub fn append_default(&self, new: &str) -> Result<()> {
        let wanted = new.trim();
        if self.name()?.trim() == wanted {
            return Ok(());
        }
        let mut innermost = self.clone();
        loop {
            let Some(default) = innermost.default()? else {
                break;
            };
            let mut next = None;
            for p in innermost.parameters()? {
                if p.string()? == default {
                    if p.name()?.trim() == wanted {
                        return Ok(());
                    }
                    next = Some(p);
                }
            }
            match next {
                Some(p) => innermost = p,
                None => break,
            }
        }

        match innermost.default()? {
            None => {
                let layout = innermost.layout()?;
                innermost
                    .node
                    .insert(layout.body_end, &format!("|{{{{{{{new}}}}}}}"))
            }
            Some(old) => innermost.set_default(&format!("{{{{{{{new}|{old}}}}}}}")),
        }
    }
}
