//! Builtin component catalog.
//!
//! Components are [`Value`]s produced by the factories of the `builtin`
//! module. The root scope starts with the [standard components]; any other
//! builtin function can be referenced on demand as `@name`.
//!
//! [standard components]: standard_components

use std::{
    f64::consts::{E, PI, TAU},
    fmt,
};

use groupscope::{
    config::ComponentConfig,
    loader::FactoryLoader,
    reference::ModuleReferenceConfig,
};

/// Module name of the builtin factories.
pub const BUILTIN: &str = "builtin";

/// Slot holding every component.
pub const COMPONENTS: &str = "components";

/// A loaded component.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Flag(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{number}"),
            Value::Text(text) => write!(f, "{text:?}"),
            Value::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// The factory table of the `builtin` module.
///
/// Parameterized functions: `number`, `text` and `flag`. Constants: `pi`,
/// `e`, `tau` and `empty`.
pub fn builtin_loader() -> FactoryLoader<Value> {
    FactoryLoader::new()
        .with_function(BUILTIN, "number", |params: &[String]| {
            single(params)?
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|err| format!("invalid number: {err}"))
        })
        .with_function(BUILTIN, "text", |params: &[String]| {
            Ok(Value::Text(params.join(" ")))
        })
        .with_function(BUILTIN, "flag", |params: &[String]| {
            single(params)?
                .parse::<bool>()
                .map(Value::Flag)
                .map_err(|err| format!("invalid flag: {err}"))
        })
        .with_function(BUILTIN, "pi", |_: &[String]| Ok(Value::Number(PI)))
        .with_function(BUILTIN, "e", |_: &[String]| Ok(Value::Number(E)))
        .with_function(BUILTIN, "tau", |_: &[String]| Ok(Value::Number(TAU)))
        .with_function(BUILTIN, "empty", |_: &[String]| {
            Ok(Value::Text(String::new()))
        })
}

/// Components every root scope starts with: `true` and `false`.
pub fn standard_components() -> Vec<ComponentConfig> {
    ["true", "false"]
        .into_iter()
        .map(|name| {
            ComponentConfig::new(ModuleReferenceConfig {
                ref_name: name.to_string(),
                module: BUILTIN.to_string(),
                function: Some("flag".to_string()),
                params: vec![name.to_string()],
                ..Default::default()
            })
        })
        .collect()
}

fn single(params: &[String]) -> Result<&str, String> {
    match params {
        [param] => Ok(param.as_str()),
        _ => Err(format!("expected one parameter, got {}", params.len())),
    }
}
