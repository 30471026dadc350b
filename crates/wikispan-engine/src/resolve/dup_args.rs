//! Duplicate template arguments.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::nodes::{Argument, Template, WikiNode};

/// Removes every argument overridden by a later one with the same name.
///
/// Arguments are visited last to first, so removing a positional argument
/// never renames one that is still to be visited.
pub fn rm_first_of_dup_args(template: &Template) -> Result<()> {
    let mut seen = HashSet::new();
    for arg in template.arguments()?.into_iter().rev() {
        let name = arg.name()?.trim().to_string();
        if !seen.insert(name) {
            arg.delete()?;
        }
    }
    Ok(())
}

/// Removes duplicates only when the rendered result cannot change: an
/// empty duplicate, or one repeating a value already kept. Other earlier
/// duplicates stay, with `tag` appended to their value.
pub fn rm_dup_args_safe(template: &Template, tag: Option<&str>) -> Result<()> {
    let mut kept: HashMap<String, (Argument, Vec<String>)> = HashMap::new();
    for arg in template.arguments()?.into_iter().rev() {
        let name = arg.name()?.trim().to_string();
        let value = arg.value()?;
        // Keyword values are trimmed when expanded; positional ones are not.
        let value = if arg.positional()? { value } else { value.trim().to_string() };

        let Some((last, values)) = kept.get_mut(&name) else {
            kept.insert(name, (arg, vec![value]));
            continue;
        };
        if value.is_empty() || values.contains(&value) {
            arg.delete()?;
        } else if values.iter().any(String::is_empty) {
            // Only the last occurrence can still be empty here.
            last.delete()?;
            values.remove(0);
        } else {
            values.push(value);
            if let Some(tag) = tag {
                arg.set_value(&format!("{}{tag}", arg.value()?))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn template(text: &str) -> Template {
        Template::new(text).expect("valid template")
    }

    #[rstest]
    #[case("{{t|a=a|a=b|a=a}}", "{{t|a=a}}")]
    #[case("{{template|year=9999|year=2000}}", "{{template|year=2000}}")]
    #[case("{{cite|{{t1}}|{{t1}}}}", "{{cite|{{t1}}|{{t1}}}}")]
    #[case("{{template|url=||work=|accessdate=}}", "{{template|url=||work=|accessdate=}}")]
    #[case("{{t|1=v|v}}", "{{t|v}}")]
    #[case("{{t|1=v|v|1=v}}", "{{t|1=v}}")]
    fn first_of_duplicates(#[case] text: &str, #[case] expected: &str) {
        let t = template(text);
        rm_first_of_dup_args(&t).expect("edit");
        assert_eq!(t.string().as_deref(), Ok(expected));
    }

    #[rstest]
    #[case("{{cite|{{t1}}|{{t1}}}}", None, "{{cite|{{t1}}|{{t1}}}}")]
    #[case("{{template|year=9999|year=2000}}", None, "{{template|year=9999|year=2000}}")]
    #[case("{{t|1=|}}", None, "{{t|}}")]
    #[case("{{t|n=v|  n=v  }}", None, "{{t|  n=v  }}")]
    #[case("{{t| v |1=v}}", None, "{{t| v |1=v}}")]
    #[case("{{t|1=|||}}", None, "{{t|||}}")]
    #[case("{{t|1=v|v|1=v}}", None, "{{t|1=v}}")]
    #[case("{{t|1=v|v|1=u}}", None, "{{t|v|1=u}}")]
    #[case("{{t|1=v|v|1=v}}", Some("<!-- dup -->"), "{{t|1=v}}")]
    #[case("{{t|1=v|v|1=u}}", Some("<!-- dup -->"), "{{t|v<!-- dup -->|1=u}}")]
    #[case("{{t|b|1=c|1=}}", None, "{{t|b|1=c}}")]
    fn safe_duplicates(#[case] text: &str, #[case] tag: Option<&str>, #[case] expected: &str) {
        let t = template(text);
        rm_dup_args_safe(&t, tag).expect("edit");
        assert_eq!(t.string().as_deref(), Ok(expected));
    }
}
