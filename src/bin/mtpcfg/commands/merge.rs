use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use mtp_cfg::{CfgReader, CfgWriter, TypeMapping};

use crate::cli::MergeArgs;
use crate::config::{build_type_map, describe_type_map};
use crate::display::{Context as DisplayContext, Progress};
use crate::io::{create_output, open_input};

const TOTAL_STEPS: u8 = 2;

pub fn run_merge(args: MergeArgs, ctx: DisplayContext) -> Result<()> {
    if let Some(output) = &args.output {
        if let Some(clash) = args.input.iter().find(|p| same_file(p, output)) {
            bail!(
                "Output file {} is also an input. Write to a new file instead.",
                clash.display()
            );
        }
    }

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Loading type map");
    let types = build_type_map(&args.types)?;
    let mapping = describe_type_map(&types);
    progress.complete_step("Loading type map", &[mapping.as_str()]);

    progress.step(&format!("Merging {} files", args.input.len()));
    let output = create_output(args.output.as_deref(), args.append)?;
    let mut writer = CfgWriter::new(output, &types);

    let mut counts = Vec::with_capacity(args.input.len());
    let mut total = 0;
    for path in &args.input {
        let input = open_input(Some(path.as_path()))?;
        let frames = copy_frames(input, &mut writer, &types, |n| {
            progress.frames_done(total + n)
        })
        .with_context(|| format!("Failed to merge {}", path.display()))?;
        info!(path = %path.display(), frames, "merged input");
        total += frames;
        counts.push((path.clone(), frames));
    }
    writer.into_inner().flush().context("Failed to flush output")?;

    let substeps: Vec<String> = counts
        .iter()
        .map(|(path, n)| format!("{}: {} frames", path.display(), n))
        .collect();
    let substeps_ref: Vec<&str> = substeps.iter().map(|s| s.as_str()).collect();
    progress.complete_step(&format!("Merging {} files", args.input.len()), &substeps_ref);

    let destination = args
        .output
        .as_ref()
        .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
    progress.finish(&format!("{} frames → {}", total, truncate_path(&destination)));

    Ok(())
}

/// Streams every frame of `input` through the codec into `writer`. Returns the
/// number of frames copied.
fn copy_frames<R, W, M>(
    input: R,
    writer: &mut CfgWriter<W, M>,
    types: M,
    mut on_frame: impl FnMut(usize),
) -> Result<usize>
where
    R: BufRead,
    W: Write,
    M: TypeMapping,
{
    let mut copied = 0;
    for frame in CfgReader::new(input, types).frames() {
        let config = frame.with_context(|| format!("Frame {} is invalid", copied + 1))?;
        writer
            .write_one(&config)
            .with_context(|| format!("Failed to write frame {}", copied + 1))?;
        copied += 1;
        on_frame(copied);
    }
    Ok(copied)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn truncate_path(path: &str) -> String {
    crate::util::text::truncate(path, 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtp_cfg::{Configuration, TypeMap, WriteMode, read_cfg_file, write_cfg_file};
    use std::io::Cursor;

    fn types() -> TypeMap {
        TypeMap::from_labels(["Si", "O"]).unwrap()
    }

    fn frame(id: i64) -> Configuration {
        Configuration::builder()
            .atom("Si", [0.0, 0.0, 0.0])
            .atom("O", [1.6, 0.0, 0.0])
            .identification(id)
            .build()
            .unwrap()
    }

    #[test]
    fn frames_are_copied_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let types = types();
        let a = dir.path().join("a.cfg");
        let b = dir.path().join("b.cfg");
        write_cfg_file(&a, &[frame(1), frame(2)], &types, WriteMode::Truncate).unwrap();
        write_cfg_file(&b, &[frame(3)], &types, WriteMode::Truncate).unwrap();

        let mut writer = CfgWriter::new(Vec::new(), &types);
        let mut seen = Vec::new();
        for path in [&a, &b] {
            let input = open_input(Some(path.as_path())).unwrap();
            copy_frames(input, &mut writer, &types, |n| seen.push(n)).unwrap();
        }
        assert_eq!(seen, vec![1, 2, 1]);

        let merged = dir.path().join("merged.cfg");
        std::fs::write(&merged, writer.into_inner()).unwrap();
        let ids: Vec<_> = read_cfg_file(&merged, &types)
            .unwrap()
            .iter()
            .map(|c| c.identification)
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn unmapped_type_stops_the_merge() {
        let stream = "BEGIN_CFG\nSize\n1\nAtomData: id type cartes_x cartes_y cartes_z\n1 3 0 0 0\nEND_CFG\n";
        let types = types();
        let mut writer = CfgWriter::new(Vec::new(), &types);

        let err = copy_frames(Cursor::new(stream), &mut writer, &types, |_| {})
            .err()
            .unwrap();
        assert!(err.to_string().contains("Frame 1"));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn same_file_detects_identical_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cfg");
        std::fs::write(&path, "").unwrap();
        let dotted = dir.path().join(".").join("a.cfg");
        assert!(same_file(&path, &dotted));
        assert!(!same_file(&path, &dir.path().join("b.cfg")));
    }
}
