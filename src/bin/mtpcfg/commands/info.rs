use std::collections::HashMap;
use std::io::{self, BufRead};

use anyhow::{Context, Result, bail};
use tracing::info;

use mtp_cfg::{CfgReader, TypeMapping};

use crate::cli::InfoArgs;
use crate::config::{build_type_map, describe_type_map};
use crate::display::{
    Context as DisplayContext, FrameSummary, Progress, print_frame_table,
    print_species_distribution, print_stream_summary,
};
use crate::io::{open_input, stdin_is_tty};

const TOTAL_STEPS: u8 = 2;

pub fn run_info(args: InfoArgs, ctx: DisplayContext) -> Result<()> {
    if args.input.is_none() && stdin_is_tty() {
        bail!(
            "No input file specified and stdin is a terminal.\n\nUsage: mtpcfg info -i <FILE> or pipe a CFG stream via stdin."
        );
    }

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Loading type map");
    let types = build_type_map(&args.types)?;
    let mapping = describe_type_map(&types);
    progress.complete_step("Loading type map", &[mapping.as_str()]);

    progress.step("Reading configurations");
    let source = args
        .input
        .as_ref()
        .map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
    let input = open_input(args.input.as_deref())?;
    let stats = summarize(input, &types, |n| progress.frames_done(n))
        .with_context(|| format!("Failed to read {}", source))?;
    info!(source = %source, frames = stats.frames.len(), "read CFG stream");

    let read_substep = format!("{} frames from {}", stats.frames.len(), source);
    progress.complete_step("Reading configurations", &[read_substep.as_str()]);
    progress.finish("Info complete");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_stream_summary(&mut out, &stats.frames);
    print_frame_table(&mut out, &stats.frames);
    print_species_distribution(&mut out, &stats.species);

    Ok(())
}

struct StreamStats {
    frames: Vec<FrameSummary>,
    /// Atom count per species, most frequent first.
    species: Vec<(String, usize)>,
}

fn summarize<R, M>(input: R, types: M, mut on_frame: impl FnMut(usize)) -> Result<StreamStats>
where
    R: BufRead,
    M: TypeMapping,
{
    let mut frames = Vec::new();
    let mut species: HashMap<String, usize> = HashMap::new();

    for (index, frame) in CfgReader::new(input, types).frames().enumerate() {
        let config = frame.with_context(|| format!("Frame {} is invalid", index + 1))?;
        for label in &config.species {
            *species.entry(label.clone()).or_insert(0) += 1;
        }
        frames.push(FrameSummary::new(index, &config));
        on_frame(index + 1);
    }

    let mut species: Vec<_> = species.into_iter().collect();
    species.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(StreamStats { frames, species })
}
