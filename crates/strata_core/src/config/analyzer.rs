use std::collections::HashMap;
use std::sync::LazyLock;

use strata_error::{DbError, ErrorKind, Result};

use crate::arrays::scalar::ScalarValue;

/// Configuration for the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Max passes over a fixed-point batch before erroring.
    pub max_iterations: usize,
    pub enable_subquery_caching: bool,
    pub enable_join_caching: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            enable_subquery_caching: true,
            enable_join_caching: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn set_from_scalar(&mut self, name: &str, value: ScalarValue) -> Result<()> {
        let func = get_setting(name)?;
        (func.set)(value, self)
    }

    pub fn get_as_scalar(&self, name: &str) -> Result<ScalarValue> {
        let func = get_setting(name)?;
        Ok((func.get)(self))
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let func = get_setting(name)?;
        let scalar = (func.get)(&Self::default());
        (func.set)(scalar, self)
    }

    /// Names of all settings, sorted.
    pub fn setting_names() -> Vec<&'static str> {
        let mut names: Vec<_> = GET_SET_FUNCTIONS.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn setting_description(name: &str) -> Result<&'static str> {
        Ok(get_setting(name)?.description)
    }
}

fn get_setting(name: &str) -> Result<&'static SettingFunctions> {
    GET_SET_FUNCTIONS.get(name).ok_or_else(|| {
        DbError::with_kind(
            ErrorKind::InvalidArgument,
            format!("Missing setting for '{name}'"),
        )
    })
}

struct SettingFunctions {
    set: fn(scalar: ScalarValue, conf: &mut AnalyzerConfig) -> Result<()>,
    get: fn(conf: &AnalyzerConfig) -> ScalarValue,
    description: &'static str,
}

impl SettingFunctions {
    const fn new<S: AnalyzerSetting>() -> Self {
        SettingFunctions {
            set: S::set_from_scalar as _,
            get: S::get_as_scalar as _,
            description: S::DESCRIPTION,
        }
    }
}

fn insert_setting<S: AnalyzerSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<MaxIterations>(&mut map);
    insert_setting::<EnableSubqueryCaching>(&mut map);
    insert_setting::<EnableJoinCaching>(&mut map);

    map
});

pub trait AnalyzerSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_scalar(scalar: ScalarValue, conf: &mut AnalyzerConfig) -> Result<()>;
    fn get_as_scalar(conf: &AnalyzerConfig) -> ScalarValue;
}

pub const DEFAULT_MAX_ITERATIONS: usize = 8;

const MIN_MAX_ITERATIONS: usize = 1;
const MAX_MAX_ITERATIONS: usize = 1000;

pub struct MaxIterations;

impl MaxIterations {
    pub fn validate_value(val: usize) -> Result<()> {
        if val < MIN_MAX_ITERATIONS {
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                format!("Max iterations cannot be less than {MIN_MAX_ITERATIONS}"),
            ));
        }

        if val > MAX_MAX_ITERATIONS {
            return Err(DbError::with_kind(
                ErrorKind::InvalidArgument,
                format!("Max iterations cannot be greater than {MAX_MAX_ITERATIONS}"),
            ));
        }

        Ok(())
    }
}

impl AnalyzerSetting for MaxIterations {
    const NAME: &'static str = "analyzer_max_iterations";
    const DESCRIPTION: &'static str = "Max passes over a batch of rules before erroring";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut AnalyzerConfig) -> Result<()> {
        let val = scalar.try_as_usize()?;
        Self::validate_value(val)?;
        conf.max_iterations = val;
        Ok(())
    }

    fn get_as_scalar(conf: &AnalyzerConfig) -> ScalarValue {
        (conf.max_iterations as i64).into()
    }
}

pub struct EnableSubqueryCaching;

impl AnalyzerSetting for EnableSubqueryCaching {
    const NAME: &'static str = "enable_subquery_caching";
    const DESCRIPTION: &'static str =
        "Controls if results of cacheable subquery expressions are cached";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut AnalyzerConfig) -> Result<()> {
        conf.enable_subquery_caching = scalar.try_as_bool()?;
        Ok(())
    }

    fn get_as_scalar(conf: &AnalyzerConfig) -> ScalarValue {
        conf.enable_subquery_caching.into()
    }
}

pub struct EnableJoinCaching;

impl AnalyzerSetting for EnableJoinCaching {
    const NAME: &'static str = "enable_join_caching";
    const DESCRIPTION: &'static str = "Controls if subqueries used as join inputs are cached";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut AnalyzerConfig) -> Result<()> {
        conf.enable_join_caching = scalar.try_as_bool()?;
        Ok(())
    }

    fn get_as_scalar(conf: &AnalyzerConfig) -> ScalarValue {
        conf.enable_join_caching.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut conf = AnalyzerConfig::default();
        conf.set_from_scalar("analyzer_max_iterations", 20.into())
            .unwrap();
        assert_eq!(20, conf.max_iterations);
        assert_eq!(
            ScalarValue::Int64(20),
            conf.get_as_scalar("analyzer_max_iterations").unwrap()
        );

        conf.set_from_scalar("enable_join_caching", false.into())
            .unwrap();
        assert!(!conf.enable_join_caching);

        conf.reset("analyzer_max_iterations").unwrap();
        assert_eq!(DEFAULT_MAX_ITERATIONS, conf.max_iterations);
    }

    #[test]
    fn invalid_values() {
        let mut conf = AnalyzerConfig::default();
        let err = conf
            .set_from_scalar("analyzer_max_iterations", 0.into())
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
        conf.set_from_scalar("analyzer_max_iterations", 1001.into())
            .unwrap_err();
        conf.set_from_scalar("enable_join_caching", "yes".into())
            .unwrap_err();

        let err = conf.get_as_scalar("does_not_exist").unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
        assert_eq!(AnalyzerConfig::default(), conf);
    }

    #[test]
    fn names_sorted() {
        assert_eq!(
            vec![
                "analyzer_max_iterations",
                "enable_join_caching",
                "enable_subquery_caching",
            ],
            AnalyzerConfig::setting_names()
        );
        assert!(!AnalyzerConfig::setting_description("enable_join_caching")
            .unwrap()
            .is_empty());
    }
}
