//! Explicit binding between a host record type and the Names of a data file.
//!
//! Each bound Name carries a getter and a setter exchanging a [`Value`] of the
//! Name's shape. Shapes are checked once, when the binding is added.

use crate::config::CodecConfig;
use crate::decode::Decoder;
use crate::domain::{
    AtomRecord, BindingError, Bounds, CodecError, CodecResult, KeyResult, LinkRecord, Name, Value,
    ValueShape,
};
use crate::encode::Encoder;
use crate::key::AtomStyle;
use crate::registry::{Diagnostic, Registry};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use tracing::warn;

type Getter<T> = Box<dyn Fn(&T) -> Value>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> KeyResult<()>>;

pub struct FieldBinding<T> {
    shape: ValueShape,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldBinding<T> {
    /// Untyped binding; `get` must produce, and `set` accept, values of `shape`.
    pub fn new(
        shape: ValueShape,
        get: impl Fn(&T) -> Value + 'static,
        set: impl Fn(&mut T, Value) -> KeyResult<()> + 'static,
    ) -> Self {
        Self {
            shape,
            get: Box::new(get),
            set: Box::new(set),
        }
    }

    pub fn text(
        get: impl Fn(&T) -> String + 'static,
        set: impl Fn(&mut T, String) + 'static,
    ) -> Self {
        Self::new(
            ValueShape::Text,
            move |record| Value::Text(get(record)),
            move |record, value| {
                set(record, value.into_text()?);
                Ok(())
            },
        )
    }

    pub fn count(get: impl Fn(&T) -> i64 + 'static, set: impl Fn(&mut T, i64) + 'static) -> Self {
        Self::new(
            ValueShape::Count,
            move |record| Value::Count(get(record)),
            move |record, value| {
                set(record, value.into_count()?);
                Ok(())
            },
        )
    }

    pub fn bounds(
        get: impl Fn(&T) -> Bounds + 'static,
        set: impl Fn(&mut T, Bounds) + 'static,
    ) -> Self {
        Self::new(
            ValueShape::Bounds,
            move |record| Value::Bounds(get(record)),
            move |record, value| {
                set(record, value.into_bounds()?);
                Ok(())
            },
        )
    }

    pub fn masses(
        get: impl Fn(&T) -> BTreeMap<i64, f64> + 'static,
        set: impl Fn(&mut T, BTreeMap<i64, f64>) + 'static,
    ) -> Self {
        Self::new(
            ValueShape::Masses,
            move |record| Value::Masses(get(record)),
            move |record, value| {
                set(record, value.into_masses()?);
                Ok(())
            },
        )
    }

    pub fn coeffs(
        get: impl Fn(&T) -> BTreeMap<i64, Vec<f64>> + 'static,
        set: impl Fn(&mut T, BTreeMap<i64, Vec<f64>>) + 'static,
    ) -> Self {
        Self::new(
            ValueShape::Coeffs,
            move |record| Value::Coeffs(get(record)),
            move |record, value| {
                set(record, value.into_coeffs()?);
                Ok(())
            },
        )
    }

    pub fn atoms(
        get: impl Fn(&T) -> BTreeMap<i64, AtomRecord> + 'static,
        set: impl Fn(&mut T, BTreeMap<i64, AtomRecord>) + 'static,
    ) -> Self {
        Self::new(
            ValueShape::Atoms,
            move |record| Value::Atoms(get(record)),
            move |record, value| {
                set(record, value.into_atoms()?);
                Ok(())
            },
        )
    }

    pub fn links(
        get: impl Fn(&T) -> BTreeMap<i64, LinkRecord> + 'static,
        set: impl Fn(&mut T, BTreeMap<i64, LinkRecord>) + 'static,
    ) -> Self {
        Self::new(
            ValueShape::Links,
            move |record| Value::Links(get(record)),
            move |record, value| {
                set(record, value.into_links()?);
                Ok(())
            },
        )
    }

    pub fn shape(&self) -> ValueShape {
        self.shape
    }
}

impl<T> std::fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// The set of Names a host record exchanges with data files.
#[derive(Debug)]
pub struct Schema<T> {
    config: CodecConfig,
    bindings: Vec<(Name, FieldBinding<T>)>,
    diagnostics: Vec<Diagnostic>,
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema<T> {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            bindings: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn atom_style(mut self, atom_style: AtomStyle) -> Self {
        self.config.atom_style = atom_style;
        self
    }

    /// Selects the atom style by its textual name; unknown styles keep the
    /// current one and are recorded as a diagnostic.
    pub fn atom_style_str(mut self, atom_style: &str) -> Self {
        match AtomStyle::parse(atom_style) {
            Some(style) => self.config.atom_style = style,
            None => {
                warn!(style = atom_style, "unknown atom style ignored");
                self.diagnostics
                    .push(Diagnostic::UnknownAtomStyle(atom_style.to_string()));
            }
        }
        self
    }

    pub fn bind(mut self, name: Name, binding: FieldBinding<T>) -> CodecResult<Self> {
        if name.shape() != binding.shape {
            return Err(BindingError::ShapeMismatch {
                name,
                expected: name.shape(),
                found: binding.shape,
            }
            .into());
        }
        if self.bindings.iter().any(|(bound, _)| *bound == name) {
            return Err(BindingError::DuplicateName(name).into());
        }
        self.bindings.push((name, binding));
        Ok(self)
    }

    /// Binds by textual Name; unknown Names are dropped with a diagnostic.
    pub fn bind_str(mut self, name: &str, binding: FieldBinding<T>) -> CodecResult<Self> {
        match Name::parse(name) {
            Some(parsed) => self.bind(parsed, binding),
            None => {
                warn!(name, "unknown name dropped from schema");
                self.diagnostics
                    .push(Diagnostic::UnknownName(name.to_string()));
                Ok(self)
            }
        }
    }

    pub fn names(&self) -> Vec<Name> {
        self.bindings.iter().map(|(name, _)| *name).collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// A fresh Registry holding every bound Name and its dependencies.
    pub fn registry(&self) -> CodecResult<Registry> {
        Registry::build(&self.names(), self.config.atom_style)
    }

    /// Decodes and validates a document, then hands each bound value to `target`.
    pub fn decode_into<R: BufRead>(&self, reader: R, target: &mut T) -> CodecResult<()> {
        let mut registry = self.registry()?;
        Decoder::new(reader).decode(&mut registry)?;
        for (name, binding) in &self.bindings {
            let value = registry.value(*name)?;
            (binding.set)(&mut *target, value).map_err(|source| CodecError::key(*name, source))?;
        }
        Ok(())
    }

    pub fn decode<R: BufRead>(&self, reader: R) -> CodecResult<T>
    where
        T: Default,
    {
        let mut target = T::default();
        self.decode_into(reader, &mut target)?;
        Ok(target)
    }

    /// Assigns every bound value from `record`, then encodes it to `writer`.
    pub fn encode<W: Write>(&self, record: &T, writer: W) -> CodecResult<W> {
        let mut registry = self.registry()?;
        for (name, binding) in &self.bindings {
            let value = (binding.get)(record);
            if value.shape() != binding.shape {
                return Err(BindingError::ShapeMismatch {
                    name: *name,
                    expected: binding.shape,
                    found: value.shape(),
                }
                .into());
            }
            registry.assign(*name, value)?;
        }
        Encoder::new(writer)
            .with_config(&self.config)
            .encode(&mut registry)
    }
}
