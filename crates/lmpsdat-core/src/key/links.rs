use super::lines::{
    LineSource, announced_rows, ensure_field_count, match_section_title, parse_int,
    read_table_rows,
};
use super::{
    CounterRef, CounterValues, DependencyRef, check_count, check_range, expect_dependencies,
    required, row_total, wired,
};
use crate::domain::{KeyError, KeyResult, LinkRecord, Name};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use tracing::debug;

/// `Bonds`, `Angles`, `Dihedrals` or `Impropers`: id -> type and atom list.
#[derive(Debug, Clone, PartialEq)]
pub struct LinksKey {
    name: Name,
    arity: usize,
    links: BTreeMap<i64, LinkRecord>,
    atoms: Option<CounterRef>,
    count: Option<CounterRef>,
    types: Option<CounterRef>,
}

impl LinksKey {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            arity: name.link_arity().unwrap_or(2),
            links: BTreeMap::new(),
            atoms: None,
            count: None,
            types: None,
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    /// Atom identifiers per row.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn links(&self) -> &BTreeMap<i64, LinkRecord> {
        &self.links
    }

    pub fn set_links(&mut self, links: BTreeMap<i64, LinkRecord>) {
        self.links = links;
    }

    fn count_role(&self) -> Name {
        self.name.count_counter().unwrap_or(Name::BondCount)
    }

    fn type_role(&self) -> Name {
        self.name.type_counter().unwrap_or(Name::BondTypes)
    }

    pub(crate) fn matches_header(&mut self, line: &str) -> bool {
        match_section_title(line, self.name.as_str())
    }

    pub(crate) fn declare_dependencies(&mut self, deps: &[DependencyRef]) -> KeyResult<()> {
        let roles = [Name::AtomCount, self.count_role(), self.type_role()];
        let wired = expect_dependencies(self.name, deps, &roles)?;
        self.atoms = wired.first().copied();
        self.count = wired.get(1).copied();
        self.types = wired.get(2).copied();
        Ok(())
    }

    pub(crate) fn derived_counts(&self) -> KeyResult<Vec<(CounterRef, i64)>> {
        let count = wired(self.count, self.count_role())?;
        Ok(vec![(count, row_total(self.links.len()))])
    }

    pub(crate) fn decode<R: BufRead, C: CounterValues + ?Sized>(
        &mut self,
        source: &mut LineSource<R>,
        counts: &C,
    ) -> KeyResult<()> {
        let rows = announced_rows(required(counts, self.count, self.count_role())?);
        let table = self.name.as_str();
        let arity = self.arity;
        let links = &mut self.links;
        links.clear();
        let read = read_table_rows(source, rows, |line, fields| {
            ensure_field_count(fields, arity + 2, line, table)?;
            let id = parse_int(fields[0], line, "id")?;
            let link_type = parse_int(fields[1], line, "type")?;
            let atoms = fields[2..arity + 2]
                .iter()
                .map(|token| parse_int(token, line, "atom id"))
                .collect::<Result<Vec<_>, _>>()?;
            links.insert(id, LinkRecord::new(link_type, atoms));
            Ok(())
        })?;
        debug!(table, rows = read, announced = rows, "decoded links");
        Ok(())
    }

    pub(crate) fn encode<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.links.is_empty() {
            return Ok(());
        }
        write!(writer, "{}\n\n", self.name)?;
        for (id, link) in &self.links {
            write!(writer, "{} {}", id, link.link_type)?;
            for atom in &link.atoms {
                write!(writer, " {}", atom)?;
            }
            writeln!(writer)?;
        }
        writeln!(writer)
    }

    pub(crate) fn validate<C: CounterValues + ?Sized>(&self, counts: &C) -> KeyResult<()> {
        let atoms = required(counts, self.atoms, Name::AtomCount)?;
        let count = required(counts, self.count, self.count_role())?;
        let types = required(counts, self.types, self.type_role())?;
        check_count(count, self.links.len())?;

        for (&id, link) in &self.links {
            check_range("id", id, id, count)?;
            check_range("type", id, link.link_type, types)?;
            if link.atoms.len() != self.arity {
                return Err(KeyError::LinkArity {
                    id,
                    expected: self.arity,
                    found: link.atoms.len(),
                });
            }
            for &atom in &link.atoms {
                check_range("atom", id, atom, atoms)?;
            }
        }
        Ok(())
    }
}
