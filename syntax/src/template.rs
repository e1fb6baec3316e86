use anyhow::Result;

#[derive(Debug, thiserror::Error)]
#[error("invalid template: {msg} at position {pos} while parsing '{text}'")]
pub struct Error {
    msg: String,
    pos: usize,
    text: String,
}

impl Error {
    /// Byte offset of the failure in the original template string.
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// One piece of a template: a literal text run, or a variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Text(String),
    Var(String),
}

/// A parsed template string, e.g. `-L%{library_path}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    chunks: Vec<Chunk>,
    referenced: Vec<String>,
}

impl Template {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Names of all variables referenced by this template,
    /// deduplicated, in order of first reference.
    pub fn referenced_vars(&self) -> &[String] {
        &self.referenced
    }
}

/// Parse a template into its chunks.
///
/// Text runs are literal; `%{name}` is a variable reference; `%%` encodes a
/// literal `%`. A lone `%` followed by anything else is an error, as is an
/// empty or unterminated variable name.
pub fn parse(text: &str) -> Result<Template> {
    use combine::EasyParser;
    let (chunks, rest) = grammar::chunks().easy_parse(text).map_err(|e| Error {
        pos: e.position.translate_position(text),
        // since converting combine's errors is a lifetime nightmare,
        // we just stringify the error before returning it.
        msg: format!("{}", e),
        text: text.to_owned(),
    })?;
    if !rest.is_empty() {
        return Err(Error {
            pos: text.len() - rest.len(),
            msg: "stray '%' (use '%%' for a literal percent)".to_owned(),
            text: text.to_owned(),
        }
        .into());
    }

    let mut referenced = Vec::new();
    for chunk in &chunks {
        if let Chunk::Var(name) = chunk {
            if !referenced.iter().any(|v| v == name) {
                referenced.push(name.clone());
            }
        }
    }
    Ok(Template { chunks, referenced })
}

mod grammar {
    use super::Chunk;
    use combine::parser::char::{char, string};
    use combine::parser::range::recognize;
    use combine::*;

    p! {
        text_run() -> &'a str, {
            recognize(skip_many1(none_of("%".chars())))
        }
    }

    p! {
        escape() -> &'a str, {
            attempt(string("%%"))
        }
    }

    // variable names may contain anything but the closing brace,
    // including dots for structure field access.
    p! {
        var_ref() -> &'a str, {
            attempt(string("%{"))
                .with(recognize(skip_many1(none_of("}".chars()))))
                .skip(char('}'))
        }
    }

    p! {
        chunk() -> Chunk, {
            choice!(
                escape().map(|_| Chunk::Text("%".to_owned())),
                var_ref().map(|name| Chunk::Var(name.to_owned())),
                text_run().map(|text| Chunk::Text(text.to_owned()))
            )
        }
    }

    p! {
        chunks() -> Vec<Chunk>, {
            many(chunk())
        }
    }
}

#[cfg(test)]
mod test {
    use super::{parse, Chunk};
    use anyhow::Result;

    fn text(s: &str) -> Chunk {
        Chunk::Text(s.to_owned())
    }

    fn var(s: &str) -> Chunk {
        Chunk::Var(s.to_owned())
    }

    #[test]
    fn test_literal_only() -> Result<()> {
        let tpl = parse("-Wall")?;
        assert_eq!(&[text("-Wall")], tpl.chunks());
        assert!(tpl.referenced_vars().is_empty());
        Ok(())
    }

    #[test]
    fn test_empty() -> Result<()> {
        let tpl = parse("")?;
        assert!(tpl.chunks().is_empty());
        Ok(())
    }

    #[test]
    fn test_variables() -> Result<()> {
        let tpl = parse("-f %{var1}/%{var2}")?;
        assert_eq!(
            &[text("-f "), var("var1"), text("/"), var("var2")],
            tpl.chunks()
        );
        assert_eq!(&["var1", "var2"], tpl.referenced_vars());
        Ok(())
    }

    #[test]
    fn test_repeated_reference_deduplicated() -> Result<()> {
        let tpl = parse("%{v}%{v}")?;
        assert_eq!(&["v"], tpl.referenced_vars());
        Ok(())
    }

    #[test]
    fn test_dotted_name() -> Result<()> {
        let tpl = parse("%{lib.name}")?;
        assert_eq!(&[var("lib.name")], tpl.chunks());
        Ok(())
    }

    #[test]
    fn test_escape() -> Result<()> {
        let tpl = parse("100%%")?;
        assert_eq!(&[text("100"), text("%")], tpl.chunks());
        // escaped reference stays literal:
        let tpl = parse("%%{x}")?;
        assert_eq!(&[text("%"), text("{x}")], tpl.chunks());
        assert!(tpl.referenced_vars().is_empty());
        Ok(())
    }

    #[test]
    fn test_stray_percent() {
        let e = parse("abc%").unwrap_err();
        let e = e.downcast_ref::<super::Error>().unwrap();
        assert_eq!(3, e.position());
        assert!(parse("abc%def").is_err());
    }

    #[test]
    fn test_empty_variable_name() {
        assert!(parse("%{}").is_err());
    }

    #[test]
    fn test_unterminated_variable() {
        assert!(parse("%{name").is_err());
    }
}
