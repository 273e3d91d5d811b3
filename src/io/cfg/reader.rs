use super::{IDENTIFICATION, State, classify};
use crate::io::error::Error;
use crate::model::configuration::{Cell, Configuration, Vector3, cell_volume};
use crate::model::mapping::TypeMapping;
use crate::model::stress::Stress;
use std::io::BufRead;
use tracing::{debug, trace};

/// Upper bound on rows reserved up front; `Size` is read from the stream and not trusted.
const MAX_RESERVED_ROWS: usize = 4096;

/// Reads every block in the stream, in order.
pub fn read<R: BufRead, M: TypeMapping>(reader: R, types: M) -> Result<Vec<Configuration>, Error> {
    Frames::new(reader, types).collect()
}

/// Streaming iterator over the configurations of a CFG stream.
///
/// Yields one item per `BEGIN_CFG … END_CFG` block. After the first error the
/// iterator is exhausted; a broken block is never partially recovered.
pub struct Frames<R, M> {
    lines: LineSource<R>,
    types: M,
    done: bool,
}

impl<R: BufRead, M: TypeMapping> Frames<R, M> {
    pub fn new(reader: R, types: M) -> Self {
        Self {
            lines: LineSource::new(reader),
            types,
            done: false,
        }
    }

    fn next_block(&mut self) -> Result<Option<Configuration>, Error> {
        let Some(begin_line) = self.seek_begin()? else {
            return Ok(None);
        };
        debug!(line = begin_line, "entering CFG block");

        let mut block = Block::new();
        loop {
            let Some((line_no, line)) = self.lines.next_line()? else {
                return Err(Error::malformed(
                    block.state,
                    self.lines.line_no(),
                    format!("stream ended inside the block opened at line {begin_line}"),
                ));
            };

            match classify(&line) {
                None => block.data_line(line_no, &line)?,
                Some(State::End) => return block.finish(line_no).map(Some),
                Some(State::Begin) => {
                    return Err(Error::malformed(
                        block.state,
                        line_no,
                        format!("BEGIN_CFG before END_CFG of the block opened at line {begin_line}"),
                    ));
                }
                Some(state) => self.enter(&mut block, state, line_no, &line)?,
            }
        }
    }

    /// The `None` state: skip to the next `BEGIN_CFG`, rejecting stray keywords.
    fn seek_begin(&mut self) -> Result<Option<usize>, Error> {
        while let Some((line_no, line)) = self.lines.next_line()? {
            match classify(&line) {
                Some(State::Begin) => return Ok(Some(line_no)),
                Some(state) => {
                    return Err(Error::malformed(
                        State::None,
                        line_no,
                        format!("'{}' outside of a BEGIN_CFG block", state.keyword()),
                    ));
                }
                None => trace!(line = line_no, "ignoring line outside of a block"),
            }
        }
        Ok(None)
    }

    fn enter(
        &mut self,
        block: &mut Block,
        state: State,
        line_no: usize,
        line: &str,
    ) -> Result<(), Error> {
        block.state = state;
        match state {
            State::Size => self.read_size(block, line_no),
            State::Cell => {
                if block.saw_cell {
                    return Err(duplicate(state, line_no));
                }
                block.saw_cell = true;
                Ok(())
            }
            State::Atom => self.read_atoms(block, line_no, line),
            State::Energy => self.read_energy(block, line_no),
            State::Stress => self.read_stress(block, line_no),
            State::Feature => block.feature(line_no, line),
            State::None | State::Begin | State::End => Ok(()),
        }
    }

    fn read_size(&mut self, block: &mut Block, line_no: usize) -> Result<(), Error> {
        if block.atom_count.is_some() {
            return Err(duplicate(State::Size, line_no));
        }
        let (ln, value) = self.lines.required(State::Size, "the atom count")?;
        let count = value
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<usize>().ok())
            .ok_or_else(|| Error::malformed(State::Size, ln, "invalid atom count"))?;
        if count == 0 {
            return Err(Error::malformed(State::Size, ln, "atom count must be positive"));
        }
        block.atom_count = Some(count);
        Ok(())
    }

    fn read_atoms(&mut self, block: &mut Block, line_no: usize, header: &str) -> Result<(), Error> {
        if block.atoms.is_some() {
            return Err(duplicate(State::Atom, line_no));
        }
        let count = block.atom_count.ok_or_else(|| {
            Error::malformed(State::Atom, line_no, "AtomData appears before Size")
        })?;
        let has_forces = header.contains("fx");

        let mut atoms = AtomRows::with_capacity(count, has_forces);
        for row in 0..count {
            let (ln, line) = self.lines.required(State::Atom, "an AtomData row")?;
            if classify(&line).is_some() {
                return Err(Error::malformed(
                    State::Atom,
                    ln,
                    format!("AtomData section ended after {row} of {count} rows"),
                ));
            }
            atoms.push(&line, ln, &self.types)?;
        }

        block.atoms = Some(atoms);
        Ok(())
    }

    fn read_energy(&mut self, block: &mut Block, line_no: usize) -> Result<(), Error> {
        if block.energy.is_some() {
            return Err(duplicate(State::Energy, line_no));
        }
        let (ln, value) = self.lines.required(State::Energy, "the energy value")?;
        let energy = value
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<f64>().ok())
            .ok_or_else(|| Error::malformed(State::Energy, ln, "invalid energy value"))?;
        block.energy = Some(energy);
        Ok(())
    }

    fn read_stress(&mut self, block: &mut Block, line_no: usize) -> Result<(), Error> {
        if block.saw_stress {
            return Err(duplicate(State::Stress, line_no));
        }
        block.saw_stress = true;

        let (ln, value) = self.lines.required(State::Stress, "the PlusStress values")?;
        let fields: Vec<_> = value.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(Error::malformed(
                State::Stress,
                ln,
                format!("expected 6 stress components, found {}", fields.len()),
            ));
        }
        let wire: [f64; 6] = parse_floats(&fields, State::Stress, ln, "stress component")?;

        if block.periodic_rank < 3 {
            debug!(
                line = ln,
                rank = block.periodic_rank,
                "dropping PlusStress of a partially periodic cell"
            );
            return Ok(());
        }
        let volume = cell_volume(&block.cell);
        if volume == 0.0 {
            return Err(Error::malformed(
                State::Stress,
                ln,
                "cannot convert stress: cell volume is zero",
            ));
        }
        block.stress = Some(Stress::from_wire(wire, volume));
        Ok(())
    }
}

impl<R: BufRead, M: TypeMapping> Iterator for Frames<R, M> {
    type Item = Result<Configuration, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_block() {
            Ok(Some(config)) => Some(Ok(config)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Line fetcher that tracks 1-based line numbers and skips blank lines.
struct LineSource<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> LineSource<R> {
    fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }

    fn line_no(&self) -> usize {
        self.line_no
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>, Error> {
        loop {
            let mut buf = String::new();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let content = buf.trim_end_matches(['\n', '\r']);
            if content.trim().is_empty() {
                continue;
            }
            return Ok(Some((self.line_no, content.to_string())));
        }
    }

    /// Fetches the value line a keyword promises; end of stream is a malformed record.
    fn required(&mut self, state: State, what: &str) -> Result<(usize, String), Error> {
        self.next_line()?.ok_or_else(|| {
            Error::malformed(
                state,
                self.line_no,
                format!("unexpected end of stream while reading {what}"),
            )
        })
    }
}

/// Per-block accumulator, discarded at every `END_CFG`.
struct Block {
    state: State,
    atom_count: Option<usize>,
    saw_cell: bool,
    cell: Cell,
    periodic_rank: usize,
    atoms: Option<AtomRows>,
    energy: Option<f64>,
    saw_stress: bool,
    stress: Option<Stress>,
    identification: Option<i64>,
}

impl Block {
    fn new() -> Self {
        Self {
            state: State::Begin,
            atom_count: None,
            saw_cell: false,
            cell: [[0.0; 3]; 3],
            periodic_rank: 0,
            atoms: None,
            energy: None,
            saw_stress: false,
            stress: None,
            identification: None,
        }
    }

    /// Non-keyword lines: lattice vectors while in `Supercell`, ignored elsewhere.
    fn data_line(&mut self, line_no: usize, line: &str) -> Result<(), Error> {
        if self.state != State::Cell {
            trace!(line = line_no, state = %self.state, "ignoring unrecognized line");
            return Ok(());
        }
        if self.periodic_rank == 3 {
            return Err(Error::malformed(
                State::Cell,
                line_no,
                "more than three lattice vectors",
            ));
        }
        let fields: Vec<_> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(Error::malformed(
                State::Cell,
                line_no,
                "lattice vector needs 3 components",
            ));
        }
        self.cell[self.periodic_rank] =
            parse_floats(&fields[..3], State::Cell, line_no, "lattice vector component")?;
        self.periodic_rank += 1;
        Ok(())
    }

    fn feature(&mut self, line_no: usize, line: &str) -> Result<(), Error> {
        let mut fields = line.split_whitespace().skip(1);
        if fields.next() != Some(IDENTIFICATION) {
            trace!(line = line_no, "ignoring feature");
            return Ok(());
        }
        if self.identification.is_some() {
            return Err(Error::malformed(
                State::Feature,
                line_no,
                "duplicate identification feature",
            ));
        }
        let id = fields
            .next()
            .and_then(|token| token.parse::<i64>().ok())
            .ok_or_else(|| Error::malformed(State::Feature, line_no, "invalid identification"))?;
        self.identification = Some(id);
        Ok(())
    }

    fn finish(self, line_no: usize) -> Result<Configuration, Error> {
        let atoms = self
            .atoms
            .ok_or_else(|| Error::malformed(State::End, line_no, "block has no AtomData section"))?;

        let config = Configuration::builder()
            .expected_atoms(self.atom_count.unwrap_or_default())
            .atoms(atoms.species, atoms.positions)
            .forces_opt(atoms.forces)
            .cell(self.cell, self.periodic_rank)
            .energy_opt(self.energy)
            .stress_opt(self.stress)
            .identification_opt(self.identification)
            .build()
            .map_err(|e| Error::malformed(State::End, line_no, e.to_string()))?;

        debug!(
            line = line_no,
            atoms = config.atom_count(),
            rank = config.periodic_rank,
            forces = config.has_forces(),
            energy = config.energy.is_some(),
            stress = config.stress.is_some(),
            "finished CFG block"
        );
        Ok(config)
    }
}

struct AtomRows {
    species: Vec<String>,
    positions: Vec<Vector3>,
    forces: Option<Vec<Vector3>>,
}

impl AtomRows {
    fn with_capacity(count: usize, has_forces: bool) -> Self {
        let count = count.min(MAX_RESERVED_ROWS);
        Self {
            species: Vec::with_capacity(count),
            positions: Vec::with_capacity(count),
            forces: has_forces.then(|| Vec::with_capacity(count)),
        }
    }

    fn push<M: TypeMapping>(&mut self, line: &str, line_no: usize, types: &M) -> Result<(), Error> {
        let fields: Vec<_> = line.split_whitespace().collect();
        let needed = if self.forces.is_some() { 8 } else { 5 };
        if fields.len() < needed {
            return Err(Error::malformed(
                State::Atom,
                line_no,
                format!("expected {needed} columns, found {}", fields.len()),
            ));
        }

        let type_id = fields[1]
            .parse::<u32>()
            .map_err(|_| Error::malformed(State::Atom, line_no, "invalid type ID"))?;
        let label = types
            .label(type_id)
            .ok_or(Error::UnknownTypeId {
                line: line_no,
                type_id,
            })?;

        let position: Vector3 = parse_floats(&fields[2..5], State::Atom, line_no, "coordinate")?;
        if let Some(forces) = self.forces.as_mut() {
            forces.push(parse_floats(&fields[5..8], State::Atom, line_no, "force component")?);
        }
        self.species.push(label.to_string());
        self.positions.push(position);
        Ok(())
    }
}

fn parse_floats<const N: usize>(
    fields: &[&str],
    state: State,
    line_no: usize,
    what: &str,
) -> Result<[f64; N], Error> {
    let mut values = [0.0; N];
    for (value, field) in values.iter_mut().zip(fields) {
        *value = field
            .parse::<f64>()
            .map_err(|_| Error::malformed(state, line_no, format!("invalid {what} '{field}'")))?;
    }
    Ok(values)
}

fn duplicate(state: State, line_no: usize) -> Error {
    Error::malformed(
        state,
        line_no,
        format!("duplicate {} record in one block", state.keyword()),
    )
}
