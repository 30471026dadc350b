use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Tag extensions whose contents are themselves wikitext.
pub const PARSABLE_TAG_EXTENSIONS: &[&str] = &[
    "categorytree",
    "gallery",
    "imagemap",
    "includeonly",
    "indicator",
    "inputbox",
    "noinclude",
    "onlyinclude",
    "poem",
    "ref",
    "references",
    "section",
];

/// Tag extensions whose contents are opaque to the recognizer.
pub const UNPARSABLE_TAG_EXTENSIONS: &[&str] = &[
    "ce",
    "charinsert",
    "chem",
    "graph",
    "hiero",
    "languages",
    "mapframe",
    "maplink",
    "math",
    "nowiki",
    "pagelist",
    "pagequality",
    "pages",
    "pre",
    "score",
    "source",
    "syntaxhighlight",
    "templatedata",
    "templatestyles",
    "timeline",
];

pub const HTML_TAG_NAMES: &[&str] = &[
    "abbr",
    "b",
    "bdi",
    "bdo",
    "big",
    "blockquote",
    "br",
    "caption",
    "center",
    "cite",
    "code",
    "data",
    "dd",
    "del",
    "dfn",
    "div",
    "dl",
    "dt",
    "em",
    "font",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "i",
    "ins",
    "kbd",
    "li",
    "mark",
    "ol",
    "p",
    "q",
    "rb",
    "rp",
    "rt",
    "rtc",
    "ruby",
    "s",
    "samp",
    "small",
    "span",
    "strike",
    "strong",
    "sub",
    "sup",
    "table",
    "td",
    "th",
    "time",
    "tr",
    "tt",
    "u",
    "ul",
    "var",
    "wbr",
];

/// Magic words that act as parser functions even without a `:`.
pub const MAGIC_WORDS: &[&str] = &[
    "ARTICLEPAGENAME",
    "ARTICLEPAGENAMEE",
    "ARTICLESPACE",
    "ARTICLESPACEE",
    "BASEPAGENAME",
    "BASEPAGENAMEE",
    "CASCADINGSOURCES",
    "CONTENTLANG",
    "CONTENTLANGUAGE",
    "CURRENTDAY",
    "CURRENTDAY2",
    "CURRENTDAYNAME",
    "CURRENTDOW",
    "CURRENTHOUR",
    "CURRENTMONTH",
    "CURRENTMONTH1",
    "CURRENTMONTHABBREV",
    "CURRENTMONTHNAME",
    "CURRENTMONTHNAMEGEN",
    "CURRENTTIME",
    "CURRENTTIMESTAMP",
    "CURRENTVERSION",
    "CURRENTWEEK",
    "CURRENTYEAR",
    "DEFAULTCATEGORYSORT",
    "DEFAULTSORT",
    "DEFAULTSORTKEY",
    "DIRECTIONMARK",
    "DIRMARK",
    "DISPLAYTITLE",
    "FULLPAGENAME",
    "FULLPAGENAMEE",
    "LOCALDAY",
    "LOCALDAY2",
    "LOCALDAYNAME",
    "LOCALDOW",
    "LOCALHOUR",
    "LOCALMONTH",
    "LOCALMONTH1",
    "LOCALMONTHABBREV",
    "LOCALMONTHNAME",
    "LOCALMONTHNAMEGEN",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "LOCALWEEK",
    "LOCALYEAR",
    "NAMESPACE",
    "NAMESPACEE",
    "NAMESPACENUMBER",
    "NUMBERINGROUP",
    "NUMBEROFACTIVEUSERS",
    "NUMBEROFADMINS",
    "NUMBEROFARTICLES",
    "NUMBEROFEDITS",
    "NUMBEROFFILES",
    "NUMBEROFPAGES",
    "NUMBEROFUSERS",
    "NUMBEROFVIEWS",
    "NUMINGROUP",
    "PAGEID",
    "PAGELANGUAGE",
    "PAGENAME",
    "PAGENAMEE",
    "PAGESINCAT",
    "PAGESINCATEGORY",
    "PAGESINNAMESPACE",
    "PAGESINNS",
    "PAGESIZE",
    "PROTECTIONEXPIRY",
    "PROTECTIONLEVEL",
    "REVISIONDAY",
    "REVISIONDAY2",
    "REVISIONID",
    "REVISIONMONTH",
    "REVISIONMONTH1",
    "REVISIONTIMESTAMP",
    "REVISIONUSER",
    "REVISIONYEAR",
    "ROOTPAGENAME",
    "ROOTPAGENAMEE",
    "SCRIPTPATH",
    "SERVER",
    "SERVERNAME",
    "SITENAME",
    "STYLEPATH",
    "SUBJECTPAGENAME",
    "SUBJECTPAGENAMEE",
    "SUBJECTSPACE",
    "SUBJECTSPACEE",
    "SUBPAGENAME",
    "SUBPAGENAMEE",
    "TALKPAGENAME",
    "TALKPAGENAMEE",
    "TALKSPACE",
    "TALKSPACEE",
];

/// Parser functions that only exist in `name:` form.
pub const PARSER_FUNCTIONS: &[&str] = &[
    "anchorencode",
    "canonicalurl",
    "filepath",
    "formatnum",
    "fullurl",
    "gender",
    "grammar",
    "int",
    "lc",
    "lcfirst",
    "localurl",
    "msg",
    "msgnw",
    "ns",
    "nse",
    "padleft",
    "padright",
    "plural",
    "raw",
    "safesubst",
    "subst",
    "uc",
    "ucfirst",
    "urlencode",
];

pub const URL_SCHEMES: &[&str] = &[
    "bitcoin:",
    "ftp://",
    "ftps://",
    "geo:",
    "git://",
    "gopher://",
    "http://",
    "https://",
    "irc://",
    "ircs://",
    "magnet:",
    "mailto:",
    "mms://",
    "news:",
    "nntp://",
    "redis://",
    "sftp://",
    "sip:",
    "sips:",
    "sms:",
    "ssh://",
    "svn://",
    "tel:",
    "telnet://",
    "urn:",
    "worldwind://",
    "xmpp:",
];

pub const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "djvu", "gif", "jpeg", "jpg", "pdf", "png", "svg", "tif", "tiff", "webp", "xcf",
];

/// Upper bound, in bytes, on how far the recognizer looks for the end of an
/// unclosed comment or extension tag.
pub const DEFAULT_MAX_UNCLOSED_SCAN: usize = 1 << 20;

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parsable_tag_extensions: Vec<String>,
    pub unparsable_tag_extensions: Vec<String>,
    pub html_tag_names: Vec<String>,
    pub parser_functions: Vec<String>,
    pub magic_words: Vec<String>,
    pub url_schemes: Vec<String>,
    pub image_extensions: Vec<String>,
    pub max_unclosed_scan: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parsable_tag_extensions: owned(PARSABLE_TAG_EXTENSIONS),
            unparsable_tag_extensions: owned(UNPARSABLE_TAG_EXTENSIONS),
            html_tag_names: owned(HTML_TAG_NAMES),
            parser_functions: owned(PARSER_FUNCTIONS),
            magic_words: owned(MAGIC_WORDS),
            url_schemes: owned(URL_SCHEMES),
            image_extensions: owned(IMAGE_EXTENSIONS),
            max_unclosed_scan: DEFAULT_MAX_UNCLOSED_SCAN,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/wikispan");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expand `~` and environment variables in a user supplied path.
    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    pub fn is_parsable_tag(&self, name: &str) -> bool {
        contains_ignore_case(&self.parsable_tag_extensions, name)
    }

    pub fn is_extension_tag(&self, name: &str) -> bool {
        self.is_parsable_tag(name) || contains_ignore_case(&self.unparsable_tag_extensions, name)
    }

    pub fn is_html_tag(&self, name: &str) -> bool {
        contains_ignore_case(&self.html_tag_names, name)
    }

    /// True when `name` followed by `:` starts a parser function.
    ///
    /// Names starting with `#` are always parser functions; magic words
    /// also accept the colon form (`{{PAGENAME:Foo}}`).
    pub fn is_parser_function(&self, name: &str) -> bool {
        name.starts_with('#')
            || self.parser_functions.iter().any(|f| f == name)
            || self.is_magic_word(name)
    }

    pub fn is_magic_word(&self, name: &str) -> bool {
        self.magic_words.iter().any(|w| w == name)
    }

    /// Length of the URL scheme `text` starts with, matched case-insensitively.
    pub fn url_scheme_len(&self, text: &str) -> Option<usize> {
        self.url_schemes
            .iter()
            .filter(|scheme| {
                text.len() >= scheme.len()
                    && text.as_bytes()[..scheme.len()].eq_ignore_ascii_case(scheme.as_bytes())
            })
            .map(String::len)
            .max()
    }

    /// True when the last `.`-separated component of `target` is an image
    /// extension.
    pub fn has_image_extension(&self, target: &str) -> bool {
        match target.trim().rsplit_once('.') {
            Some((_, ext)) => contains_ignore_case(&self.image_extensions, ext.trim()),
            None => false,
        }
    }
}

fn contains_ignore_case(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/wikispan/config.toml"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            max_unclosed_scan: 42,
            ..Config::default()
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("parser_functions = [\"invoke\"]").unwrap();

        assert_eq!(config.parser_functions, vec!["invoke".to_string()]);
        assert_eq!(config.magic_words, Config::default().magic_words);
        assert_eq!(config.max_unclosed_scan, DEFAULT_MAX_UNCLOSED_SCAN);
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("WIKISPAN_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$WIKISPAN_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("WIKISPAN_TEST_VAR");
        }
    }

    #[test]
    fn test_load_from_nonexistent_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&config_path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.parsable_tag_extensions.push("tabber".to_string());
        config.save_to_path(&config_path).unwrap();

        let loaded = Config::load_from_path(&config_path).unwrap().unwrap();
        assert!(loaded.is_parsable_tag("tabber"));
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "max_unclosed_scan = \"lots\"").unwrap();

        let err = Config::load_from_path(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[rstest]
    #[case("ref", true, true)]
    #[case("REF", true, true)]
    #[case("nowiki", false, true)]
    #[case("span", false, false)]
    fn tag_extension_lookup(#[case] name: &str, #[case] parsable: bool, #[case] extension: bool) {
        let config = Config::default();
        assert_eq!(config.is_parsable_tag(name), parsable);
        assert_eq!(config.is_extension_tag(name), extension);
    }

    #[rstest]
    #[case("#if", true)]
    #[case("lc", true)]
    #[case("PAGENAME", true)]
    #[case("LC", false)]
    #[case("cite", false)]
    fn parser_function_lookup(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(Config::default().is_parser_function(name), expected);
    }

    #[rstest]
    #[case("https://example.org", Some(8))]
    #[case("HTTP://example.org", Some(7))]
    #[case("mailto:me@example.org", Some(7))]
    #[case("example.org", None)]
    fn url_scheme_prefix(#[case] text: &str, #[case] expected: Option<usize>) {
        assert_eq!(Config::default().url_scheme_len(text), expected);
    }

    #[rstest]
    #[case("File:Example.JPG", true)]
    #[case("Image:diagram.svg ", true)]
    #[case("Main Page", false)]
    #[case("Version 1.2", false)]
    fn image_extension_detection(#[case] target: &str, #[case] expected: bool) {
        assert_eq!(Config::default().has_image_extension(target), expected);
    }
}
