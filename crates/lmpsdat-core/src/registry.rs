use crate::domain::{CodecError, CodecResult, Document, KeyError, Name, Value};
use crate::key::{AtomStyle, DependencyRef, Key, Line, LineSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::io::BufRead;
use tracing::{debug, warn};

/// Non-fatal problem found while resolving textual Names or styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    UnknownName(String),
    UnknownAtomStyle(String),
}

impl Diagnostic {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownName(_) => "BINDING.UNKNOWN_NAME",
            Self::UnknownAtomStyle(_) => "BINDING.UNKNOWN_ATOM_STYLE",
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownName(name) => write!(
                f,
                "WARNING: [{}] unknown name '{}' dropped",
                self.code(),
                name
            ),
            Self::UnknownAtomStyle(style) => write!(
                f,
                "WARNING: [{}] unknown atom style '{}', using '{}'",
                self.code(),
                style,
                AtomStyle::default()
            ),
        }
    }
}

/// The Keys of one document, wired with their dependencies.
///
/// Keys live in an arena in creation order. Every dependency is created before
/// its first dependent, so a Key's Counters always sit at lower slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    atom_style: AtomStyle,
    keys: Vec<Key>,
    slots: HashMap<Name, usize>,
    requested: Vec<Name>,
    diagnostics: Vec<Diagnostic>,
}

impl Registry {
    pub fn build(requested: &[Name], atom_style: AtomStyle) -> CodecResult<Self> {
        let mut registry = Self {
            atom_style,
            keys: Vec::new(),
            slots: HashMap::new(),
            requested: Vec::new(),
            diagnostics: Vec::new(),
        };
        for &name in requested {
            if registry.requested.contains(&name) {
                continue;
            }
            registry.requested.push(name);
            registry.instantiate(name)?;
        }
        debug!(
            requested = registry.requested.len(),
            keys = registry.keys.len(),
            style = %atom_style,
            "built registry"
        );
        Ok(registry)
    }

    /// Builds from textual Names and style; unknown entries are dropped and
    /// recorded in [`Registry::diagnostics`].
    pub fn build_from_strs(requested: &[&str], atom_style: &str) -> CodecResult<Self> {
        let mut diagnostics = Vec::new();
        let style = match AtomStyle::parse(atom_style) {
            Some(style) => style,
            None => {
                warn!(style = atom_style, "unknown atom style, falling back to default");
                diagnostics.push(Diagnostic::UnknownAtomStyle(atom_style.to_string()));
                AtomStyle::default()
            }
        };

        let mut names = Vec::with_capacity(requested.len());
        for text in requested {
            match Name::parse(text) {
                Some(name) => names.push(name),
                None => {
                    warn!(name = *text, "unknown name dropped");
                    diagnostics.push(Diagnostic::UnknownName((*text).to_string()));
                }
            }
        }

        let mut registry = Self::build(&names, style)?;
        registry.diagnostics = diagnostics;
        Ok(registry)
    }

    fn instantiate(&mut self, name: Name) -> CodecResult<usize> {
        if let Some(&slot) = self.slots.get(&name) {
            return Ok(slot);
        }

        let mut deps = Vec::with_capacity(name.dependencies().len());
        for &dependency in name.dependencies() {
            let slot = self.instantiate(dependency)?;
            deps.push(DependencyRef::new(slot, &self.keys[slot]));
        }

        let mut key = Key::for_name(name, self.atom_style);
        key.declare_dependencies(&deps)
            .map_err(|source| CodecError::key(name, source))?;

        let slot = self.keys.len();
        self.keys.push(key);
        self.slots.insert(name, slot);
        Ok(slot)
    }

    pub fn atom_style(&self) -> AtomStyle {
        self.atom_style
    }

    pub fn key(&self, name: Name) -> Option<&Key> {
        self.slot(name).and_then(|slot| self.keys.get(slot))
    }

    /// All Keys in creation order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn slot(&self, name: Name) -> Option<usize> {
        self.slots.get(&name).copied()
    }

    pub fn contains(&self, name: Name) -> bool {
        self.slots.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Names in creation order.
    pub fn names(&self) -> Vec<Name> {
        self.keys.iter().map(Key::name).collect()
    }

    /// Names as requested, deduplicated, without implied dependencies.
    pub fn requested(&self) -> &[Name] {
        &self.requested
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Slots of the Keys `name` was wired to.
    pub fn dependency_slots(&self, name: Name) -> Option<Vec<usize>> {
        self.slot(name)?;
        name.dependencies()
            .iter()
            .map(|dependency| self.slot(*dependency))
            .collect()
    }

    pub fn dependencies(&self, name: Name) -> Option<&'static [Name]> {
        self.contains(name).then(|| name.dependencies())
    }

    fn slot_for(&self, name: Name) -> CodecResult<usize> {
        self.slot(name).ok_or(CodecError::NotRegistered(name))
    }

    pub fn assign(&mut self, name: Name, value: Value) -> CodecResult<()> {
        let slot = self.slot_for(name)?;
        self.keys[slot]
            .assign(value)
            .map_err(|source| CodecError::key(name, source))
    }

    pub fn value(&self, name: Name) -> CodecResult<Value> {
        let slot = self.slot_for(name)?;
        Ok(self.keys[slot].value())
    }

    /// Pushes the counts implied by `name`'s records into its Counters.
    ///
    /// Scalar Keys answer `Unsupported`; Counters that were decoded or assigned
    /// keep their value so validation can report a mismatch.
    pub fn propagate_derived_value(&mut self, name: Name) -> CodecResult<()> {
        let slot = self.slot_for(name)?;
        let derived = self.keys[slot]
            .derived_counts()
            .map_err(|source| CodecError::key(name, source))?;

        for (counter, count) in derived {
            let Some(target) = self
                .keys
                .get_mut(counter.slot())
                .and_then(Key::as_counter_mut)
            else {
                return Err(CodecError::key(
                    name,
                    KeyError::MissingDependency(counter.name()),
                ));
            };
            if target.derive(count) {
                debug!(from = %name, counter = %counter.name(), count, "propagated derived count");
            }
        }
        Ok(())
    }

    pub fn propagate_derived_values(&mut self) -> CodecResult<()> {
        for name in self.names() {
            match self.propagate_derived_value(name) {
                Err(error) if error.key_error().is_some_and(KeyError::is_unsupported) => {}
                other => other?,
            }
        }
        Ok(())
    }

    /// Validates every Key in creation order, stopping at the first failure.
    pub fn validate(&self) -> CodecResult<()> {
        for key in &self.keys {
            key.validate(self.keys.as_slice())
                .map_err(|source| CodecError::key(key.name(), source))?;
        }
        Ok(())
    }

    pub fn to_document(&self) -> Document {
        self.keys.iter().fold(Document::new(self.atom_style), |document, key| {
            document.with_value(key.name(), key.value())
        })
    }

    /// Builds a Registry requesting every Name of `document` and assigns its values.
    pub fn from_document(document: &Document) -> CodecResult<Self> {
        let names: Vec<Name> = document.values.keys().copied().collect();
        let mut registry = Self::build(&names, document.atom_style)?;
        for (name, value) in &document.values {
            registry.assign(*name, value.clone())?;
        }
        Ok(registry)
    }

    /// Header Names in creation order, the order the decoder tries them in.
    pub(crate) fn header_names(&self) -> Vec<Name> {
        self.names_where(|key| key.kind().is_header())
    }

    pub(crate) fn table_names(&self) -> Vec<Name> {
        self.names_where(|key| key.kind().is_table())
    }

    fn names_where(&self, keep: impl Fn(&Key) -> bool) -> Vec<Name> {
        self.keys
            .iter()
            .filter(|key| keep(key))
            .map(Key::name)
            .collect()
    }

    pub(crate) fn matches_header(&mut self, name: Name, line: &str) -> bool {
        match self.slot(name) {
            Some(slot) => self.keys[slot].matches_header(line),
            None => false,
        }
    }

    /// Decodes the Key registered under `name`, reading Counters from the lower slots.
    pub(crate) fn decode_key<R: BufRead>(
        &mut self,
        name: Name,
        line: &Line,
        source: &mut LineSource<R>,
    ) -> CodecResult<()> {
        let slot = self.slot_for(name)?;
        let (counters, rest) = self.keys.split_at_mut(slot);
        let Some((key, _)) = rest.split_first_mut() else {
            return Err(CodecError::NotRegistered(name));
        };
        key.decode(line, source, &*counters)
            .map_err(|source| CodecError::key(name, source))
    }
}
