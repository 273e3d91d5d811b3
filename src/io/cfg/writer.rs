use super::{
    ATOM_DATA, BEGIN_CFG, END_CFG, ENERGY, FEATURE, IDENTIFICATION, PLUS_STRESS, SIZE, SUPERCELL,
};
use crate::io::error::Error;
use crate::model::configuration::Configuration;
use crate::model::mapping::TypeMapping;
use crate::model::stress::Stress;
use std::io::{self, Write};
use tracing::debug;

const POSITION_COLUMNS: &str = "id type cartes_x cartes_y cartes_z";
const FORCE_COLUMNS: &str = "fx fy fz";

/// Writes one block per configuration, in order.
///
/// Each block is validated and fully formatted before any of it reaches `writer`, so
/// an invalid configuration or an unmapped species leaves the output ending at the
/// previous block. `writer` is not flushed; that is left to the caller.
pub fn write<'a, W, M, I>(mut writer: W, frames: I, types: &M) -> Result<(), Error>
where
    W: Write,
    M: TypeMapping + ?Sized,
    I: IntoIterator<Item = &'a Configuration>,
{
    for (frame, config) in frames.into_iter().enumerate() {
        let block = format_block(frame, config, types)?;
        writer.write_all(&block)?;
        debug!(
            frame,
            atoms = config.atom_count(),
            rank = config.periodic_rank,
            "wrote CFG block"
        );
    }
    Ok(())
}

fn format_block<M: TypeMapping + ?Sized>(
    frame: usize,
    config: &Configuration,
    types: &M,
) -> Result<Vec<u8>, Error> {
    config
        .validate()
        .map_err(|source| Error::InvalidConfiguration { frame, source })?;

    let type_ids = config
        .species
        .iter()
        .map(|label| {
            types.type_id(label).ok_or_else(|| Error::UnknownSpecies {
                frame,
                label: label.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::new();

    writeln!(out, "{BEGIN_CFG}")?;
    writeln!(out, "{SIZE}")?;
    writeln!(out, "{}", config.atom_count())?;

    if config.periodic_rank > 0 {
        writeln!(out, "{SUPERCELL}")?;
        for row in &config.cell[..config.periodic_rank] {
            write_values(&mut out, row)?;
        }
    }

    match &config.forces {
        Some(forces) => {
            writeln!(out, "{ATOM_DATA}: {POSITION_COLUMNS} {FORCE_COLUMNS}")?;
            for (i, ((type_id, position), force)) in type_ids
                .iter()
                .zip(&config.positions)
                .zip(forces)
                .enumerate()
            {
                write!(out, "{} {} ", i + 1, type_id)?;
                write_values(
                    &mut out,
                    &[
                        position[0],
                        position[1],
                        position[2],
                        force[0],
                        force[1],
                        force[2],
                    ],
                )?;
            }
        }
        None => {
            writeln!(out, "{ATOM_DATA}: {POSITION_COLUMNS}")?;
            for (i, (type_id, position)) in type_ids.iter().zip(&config.positions).enumerate() {
                write!(out, "{} {} ", i + 1, type_id)?;
                write_values(&mut out, position)?;
            }
        }
    }

    if let Some(energy) = config.energy {
        writeln!(out, "{ENERGY}")?;
        write_values(&mut out, &[energy])?;
    }

    if let Some(stress) = &config.stress {
        writeln!(out, "{PLUS_STRESS}: {}", Stress::COMPONENTS.join(" "))?;
        write_values(&mut out, &stress.to_wire(config.volume()))?;
    }

    if let Some(id) = config.identification {
        writeln!(out, "{FEATURE} {IDENTIFICATION} {id}")?;
    }

    writeln!(out, "{END_CFG}")?;
    Ok(out)
}

/// Writes space-separated values in shortest round-trip form, ending the line.
fn write_values(out: &mut Vec<u8>, values: &[f64]) -> io::Result<()> {
    for (i, &value) in values.iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        // -0 prints as "-0"; the sign carries no information here.
        let value = if value == 0.0 { 0.0 } else { value };
        write!(out, "{value}")?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::configuration::ConfigurationError;
    use crate::model::mapping::TypeMap;

    fn types() -> TypeMap {
        TypeMap::from_labels(["A", "B"]).unwrap()
    }

    fn dimer() -> Configuration {
        Configuration::new(
            vec!["A".into(), "B".into()],
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        )
    }

    fn cubic_cell() -> Configuration {
        let mut config = Configuration::new(vec!["A".into()], vec![[0.0, 0.0, 0.0]]);
        config.cell = [[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 3.0]];
        config.periodic_rank = 3;
        config.energy = Some(-5.0);
        config.stress = Some(Stress::new([1.0, 1.0, 1.0, 0.0, 0.0, 0.0]));
        config
    }

    fn write_to_string(frames: &[Configuration]) -> String {
        let mut buf = Vec::new();
        write(&mut buf, frames, &types()).expect("write cfg");
        String::from_utf8(buf).expect("utf-8 output")
    }

    #[test]
    fn non_periodic_dimer_has_no_supercell_or_force_columns() {
        let text = write_to_string(&[dimer()]);
        assert_eq!(
            text,
            "BEGIN_CFG\n\
             Size\n\
             2\n\
             AtomData: id type cartes_x cartes_y cartes_z\n\
             1 1 0 0 0\n\
             2 2 1 0 0\n\
             END_CFG\n"
        );
    }

    #[test]
    fn periodic_cell_with_energy_and_stress() {
        let text = write_to_string(&[cubic_cell()]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[3], "Supercell");
        assert_eq!(lines[4], "3 0 0");
        assert_eq!(lines[5], "0 3 0");
        assert_eq!(lines[6], "0 0 3");
        assert_eq!(lines[9], "Energy");
        assert_eq!(lines[10], "-5");
        assert_eq!(lines[11], "PlusStress: xx yy zz yz xz xy");
        assert_eq!(lines[12], "-27 -27 -27 0 0 0");
        assert_eq!(lines[13], "END_CFG");
    }

    #[test]
    fn supercell_rows_match_periodic_rank() {
        for rank in 1..=3 {
            let mut config = dimer();
            config.cell = [[4.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 6.0]];
            config.periodic_rank = rank;
            let text = write_to_string(&[config]);
            let lines: Vec<_> = text.lines().collect();
            let start = lines.iter().position(|l| *l == "Supercell").unwrap() + 1;
            let end = lines.iter().position(|l| l.starts_with("AtomData")).unwrap();
            assert_eq!(end - start, rank, "rank {rank}");
        }
    }

    #[test]
    fn forces_extend_header_and_rows() {
        let mut config = dimer();
        config.forces = Some(vec![[0.5, -0.5, 0.0], [-0.5, 0.5, 0.25]]);
        let text = write_to_string(&[config]);
        assert!(text.contains("AtomData: id type cartes_x cartes_y cartes_z fx fy fz\n"));
        assert!(text.contains("1 1 0 0 0 0.5 -0.5 0\n"));
        assert!(text.contains("2 2 1 0 0 -0.5 0.5 0.25\n"));
    }

    #[test]
    fn identification_is_written_as_feature() {
        let mut config = dimer();
        config.identification = Some(42);
        let text = write_to_string(&[config]);
        assert!(text.ends_with("Feature identification 42\nEND_CFG\n"));
    }

    #[test]
    fn absent_properties_emit_no_keywords() {
        let text = write_to_string(&[dimer()]);
        for keyword in ["Supercell", "Energy", "PlusStress", "Feature", "fx"] {
            assert!(!text.contains(keyword), "unexpected {keyword}");
        }
    }

    #[test]
    fn frames_are_written_in_order() {
        let mut first = dimer();
        first.identification = Some(1);
        let mut second = cubic_cell();
        second.identification = Some(2);
        let text = write_to_string(&[first, second]);
        assert_eq!(text.matches("BEGIN_CFG").count(), 2);
        let one = text.find("identification 1").unwrap();
        let two = text.find("identification 2").unwrap();
        assert!(one < two);
    }

    #[test]
    fn unknown_species_fails_before_block_is_emitted() {
        let mut bad = dimer();
        bad.species[1] = "C".into();

        let mut buf = Vec::new();
        let err = write(&mut buf, &[dimer(), bad], &types()).unwrap_err();
        match err {
            Error::UnknownSpecies { frame, label } => {
                assert_eq!(frame, 1);
                assert_eq!(label, "C");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.matches("BEGIN_CFG").count(), 1);
        assert!(text.ends_with("END_CFG\n"));
    }

    #[test]
    fn invalid_configuration_is_rejected_without_output() {
        let mut bad = dimer();
        bad.forces = Some(vec![[0.0; 3]]);

        let mut buf = Vec::new();
        let err = write(&mut buf, &[bad], &types()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfiguration {
                frame: 0,
                source: ConfigurationError::LengthMismatch { field: "forces", .. }
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn stress_on_partial_periodicity_is_still_written() {
        let mut config = cubic_cell();
        config.periodic_rank = 2;
        let text = write_to_string(&[config]);
        assert!(text.contains("PlusStress: xx yy zz yz xz xy\n-27 -27 -27 0 0 0\n"));
    }

    #[derive(Default)]
    struct FlushCounter {
        buf: Vec<u8>,
        flushes: usize,
    }

    impl Write for FlushCounter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn blocks_are_written_without_flushing() {
        let mut out = FlushCounter::default();
        for _ in 0..3 {
            write(&mut out, &[dimer()], &types()).unwrap();
        }
        assert_eq!(out.flushes, 0);
        let text = String::from_utf8(out.buf).unwrap();
        assert_eq!(text.matches("END_CFG").count(), 3);
    }

    #[test]
    fn write_values_normalizes_negative_zero() {
        let mut out = Vec::new();
        write_values(&mut out, &[-0.0, 1.5, -2.0]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 1.5 -2\n");
    }
}
