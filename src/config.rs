//! Filter configuration files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::filter::{FilterBuilder, ParseMode, SubnetFilter};
use crate::trace::Tracer;

/// Configuration for a [`SubnetFilter`], usually loaded from YAML.
///
/// ```yaml
/// subnets:
///   - 192.168.1.0/24
///   - 10.0.0.0/8
/// column: src_ip
/// strict: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Subnets in CIDR notation
    pub subnets: Vec<String>,
    /// Column holding the addresses to test
    #[serde(default)]
    pub column: Option<String>,
    /// Reject subnets with host bits set
    #[serde(default)]
    pub strict: bool,
}

impl FilterConfig {
    /// Create a config for the given subnets with default settings.
    pub fn new<I, S>(subnets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subnets: subnets.into_iter().map(Into::into).collect(),
            column: None,
            strict: false,
        }
    }

    /// Parse a config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::debug!("Loaded filter config from {:?}", path);
        Self::from_yaml_str(&content)
    }

    /// Load an optional config file and merge command line options into it.
    ///
    /// Extra subnets are appended after the file's subnets; `strict` can only
    /// switch strict parsing on.
    pub fn load(path: Option<&Path>, extra_subnets: &[String], strict: bool) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.subnets.extend(extra_subnets.iter().cloned());
        config.strict |= strict;

        if config.subnets.is_empty() {
            log::warn!("No subnets given, nothing will be selected");
        }
        Ok(config)
    }

    /// Pick the column to read: `column` when given, else the configured one.
    pub fn resolve_column(&self, column: Option<String>) -> Result<String> {
        column.or_else(|| self.column.clone()).ok_or_else(|| {
            Error::Config("no column given, use --column or set `column` in the config".to_string())
        })
    }

    /// Get the parse mode selected by this config.
    pub fn mode(&self) -> ParseMode {
        ParseMode::from_strict(self.strict)
    }

    /// Build a filter from this config.
    pub fn build_filter(&self, tracer: Arc<dyn Tracer>) -> Result<SubnetFilter> {
        let filter = FilterBuilder::new()
            .mode(self.mode())
            .shared_tracer(tracer)
            .build(&self.subnets)?;
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NoopTracer;
    use std::io::Write;

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
subnets:
  - 192.168.1.0/24
  - 10.0.0.0/8
column: src_ip
"#;

        let config = FilterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.subnets, ["192.168.1.0/24", "10.0.0.0/8"]);
        assert_eq!(config.column.as_deref(), Some("src_ip"));
        assert!(!config.strict);
        assert_eq!(config.mode(), ParseMode::Loose);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = "subnets: []\nnetworks: [10.0.0.0/8]\n";
        assert!(matches!(FilterConfig::from_yaml_str(yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_build_filter() {
        let config = FilterConfig::new(["10.0.0.0/8", "fc00::/7"]);
        let filter = config.build_filter(Arc::new(NoopTracer)).unwrap();

        assert_eq!(filter.len(), 2);
        assert!(filter.matches("fd00::1"));
    }

    #[test]
    fn test_build_filter_strict() {
        let mut config = FilterConfig::new(["10.1.0.0/8"]);
        assert!(config.build_filter(Arc::new(NoopTracer)).is_ok());

        config.strict = true;
        let err = config.build_filter(Arc::new(NoopTracer)).unwrap_err();
        assert!(matches!(err, Error::InvalidSubnet(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "subnets: ['2001:db8::/32']\nstrict: true").unwrap();

        let config = FilterConfig::from_path(file.path()).unwrap();
        assert_eq!(config.subnets, ["2001:db8::/32"]);
        assert!(config.strict);
    }

    #[test]
    fn test_from_missing_path() {
        let result = FilterConfig::from_path("/nonexistent/ipfilter.yml");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_load_merges_options() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "subnets: [10.0.0.0/8]\ncolumn: src").unwrap();

        let extra = vec!["fc00::/7".to_string()];
        let config = FilterConfig::load(Some(file.path()), &extra, true).unwrap();

        assert_eq!(config.subnets, ["10.0.0.0/8", "fc00::/7"]);
        assert_eq!(config.column.as_deref(), Some("src"));
        assert!(config.strict);
    }

    #[test]
    fn test_load_without_file() {
        let extra = vec!["192.168.0.0/16".to_string()];
        let config = FilterConfig::load(None, &extra, false).unwrap();

        assert_eq!(config.subnets, ["192.168.0.0/16"]);
        assert_eq!(config.column, None);
        assert!(!config.strict);
    }

    #[test]
    fn test_resolve_column() {
        let mut config = FilterConfig::new(["10.0.0.0/8"]);
        assert!(matches!(config.resolve_column(None), Err(Error::Config(_))));

        config.column = Some("src".to_string());
        assert_eq!(config.resolve_column(None).unwrap(), "src");
        assert_eq!(config.resolve_column(Some("dst".to_string())).unwrap(), "dst");
    }
}
