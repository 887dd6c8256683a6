//! Binding of call arguments to declared parameter names.
//!
//! A [`Signature`] declares a callable's parameters the way a dynamic
//! language would: positional-only, positional-or-keyword, a variadic
//! positional collector, keyword-only, and a variadic keyword collector, each
//! with an optional default. [`Signature::bind`] applies the standard binding
//! rules to a [`Call`]; [`map_args`] then shapes the bound values into the
//! argument map a journal record carries.

use crate::datum::{Datum, DatumMap};
use crate::error::{BindingError, JournalError, Result};

/// Parameter names identifying the bound object or class of a method.
pub const RECEIVER_NAMES: [&str; 2] = ["self", "cls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    default: Option<Datum>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Datum) -> Self {
        self.default = Some(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    fn accepts_position(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword
        )
    }

    fn accepts_keyword(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
        )
    }
}

/// Declared name and parameter list of a callable.
///
/// Parameters are expected in declaration order: positional-only,
/// positional-or-keyword, variadic positional, keyword-only, variadic
/// keyword.
///
/// ```
/// use callable_journal::{Call, Signature, ToDatum};
///
/// let signature = Signature::new("scale")
///     .param("value")
///     .param_with_default("factor", 2.to_datum());
///
/// let bound = signature.bind(Call::new().arg(10.to_datum())).unwrap();
/// assert_eq!(bound.get("factor"), Some(&2.to_datum()));
/// ```
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    params: Vec<Param>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn positional_only(self, name: impl Into<String>) -> Self {
        self.with(Param::new(name, ParamKind::PositionalOnly))
    }

    /// A positional-or-keyword parameter.
    pub fn param(self, name: impl Into<String>) -> Self {
        self.with(Param::new(name, ParamKind::PositionalOrKeyword))
    }

    pub fn param_with_default(self, name: impl Into<String>, default: Datum) -> Self {
        self.with(Param::new(name, ParamKind::PositionalOrKeyword).with_default(default))
    }

    pub fn var_positional(self, name: impl Into<String>) -> Self {
        self.with(Param::new(name, ParamKind::VarPositional))
    }

    pub fn keyword_only(self, name: impl Into<String>) -> Self {
        self.with(Param::new(name, ParamKind::KeywordOnly))
    }

    pub fn keyword_only_with_default(self, name: impl Into<String>, default: Datum) -> Self {
        self.with(Param::new(name, ParamKind::KeywordOnly).with_default(default))
    }

    pub fn var_keyword(self, name: impl Into<String>) -> Self {
        self.with(Param::new(name, ParamKind::VarKeyword))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Binds `call` to the declared parameters.
    ///
    /// Defaults fill unset parameters, extra positional values are collected
    /// into the variadic positional parameter as a sequence and unknown
    /// keywords into the variadic keyword parameter as a mapping. The result
    /// lists parameters in declaration order.
    pub fn bind(&self, call: Call) -> std::result::Result<DatumMap, BindingError> {
        let mut bound = DatumMap::new();
        let positional_params: Vec<&Param> =
            self.params.iter().filter(|p| p.accepts_position()).collect();
        let var_positional = self.find_kind(ParamKind::VarPositional);
        let var_keyword = self.find_kind(ParamKind::VarKeyword);

        let given = call.positional.len();
        let mut extra_positional = Vec::new();
        for (index, value) in call.positional.into_iter().enumerate() {
            match positional_params.get(index) {
                Some(param) => {
                    bound.insert(param.name.as_str(), value);
                }
                None if var_positional.is_some() => extra_positional.push(value),
                None => {
                    return Err(BindingError::TooManyPositional {
                        expected: positional_params.len(),
                        given,
                    });
                }
            }
        }

        let mut extra_keyword = DatumMap::new();
        for (name, value) in call.keyword {
            let param = self
                .params
                .iter()
                .find(|p| p.name == name && p.accepts_keyword());
            match param {
                Some(_) if bound.contains_key(&name) => {
                    return Err(BindingError::MultipleValues(name));
                }
                Some(param) => {
                    bound.insert(param.name.as_str(), value);
                }
                None if var_keyword.is_some() => {
                    if extra_keyword.insert(name.as_str(), value).is_some() {
                        return Err(BindingError::MultipleValues(name));
                    }
                }
                None if self
                    .params
                    .iter()
                    .any(|p| p.name == name && p.kind == ParamKind::PositionalOnly) =>
                {
                    return Err(BindingError::PositionalOnlyAsKeyword(name));
                }
                None => return Err(BindingError::UnexpectedKeyword(name)),
            }
        }

        let mut ordered = DatumMap::new();
        let mut missing = Vec::new();
        for param in &self.params {
            let value = match param.kind {
                ParamKind::VarPositional => Some(Datum::Seq(std::mem::take(&mut extra_positional))),
                ParamKind::VarKeyword => Some(Datum::Map(std::mem::take(&mut extra_keyword))),
                _ => bound.remove(&param.name).or_else(|| param.default.clone()),
            };
            match value {
                Some(value) => {
                    ordered.insert(param.name.as_str(), value);
                }
                None => missing.push(param.name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(BindingError::MissingArguments(missing));
        }
        Ok(ordered)
    }

    fn find_kind(&self, kind: ParamKind) -> Option<&Param> {
        self.params.iter().find(|p| p.kind == kind)
    }
}

/// Raw arguments of one call.
#[derive(Debug, Clone, Default)]
pub struct Call {
    positional: Vec<Datum>,
    keyword: Vec<(String, Datum)>,
}

impl Call {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: Datum) -> Self {
        self.positional.push(value);
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: Datum) -> Self {
        self.keyword.push((name.into(), value));
        self
    }
}

/// Arguments to replace with a deep copy taken at binding time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyArgs {
    Names(Vec<String>),
    All,
}

/// Copy every bound argument.
pub const COPY_ALL: CopyArgs = CopyArgs::All;

impl Default for CopyArgs {
    fn default() -> Self {
        CopyArgs::Names(Vec::new())
    }
}

impl From<&str> for CopyArgs {
    fn from(name: &str) -> Self {
        CopyArgs::Names(vec![name.to_owned()])
    }
}

impl<const N: usize> From<[&str; N]> for CopyArgs {
    fn from(names: [&str; N]) -> Self {
        CopyArgs::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for CopyArgs {
    fn from(names: Vec<String>) -> Self {
        CopyArgs::Names(names)
    }
}

/// Binds `call` against `signature` and shapes the result for journaling:
/// receiver parameters are removed, the `copy_args` selection is replaced by
/// deep copies and `drop_args` are removed. Names that are not bound are
/// ignored by both selections.
pub fn map_args(
    signature: &Signature,
    call: Call,
    copy_args: &CopyArgs,
    drop_args: &[String],
) -> Result<DatumMap> {
    let mut arguments = signature
        .bind(call)
        .map_err(|source| JournalError::ArgumentBinding {
            callable: signature.name.clone(),
            source,
        })?;

    for receiver in RECEIVER_NAMES {
        arguments.remove(receiver);
    }

    match copy_args {
        CopyArgs::All => {
            for value in arguments.values_mut() {
                *value = value.deep_copy();
            }
        }
        CopyArgs::Names(names) => {
            for name in names {
                if let Some(value) = arguments.get_mut(name) {
                    *value = value.deep_copy();
                }
            }
        }
    }

    for name in drop_args {
        arguments.remove(name);
    }

    Ok(arguments)
}
