use std::collections::BTreeMap;
use std::io::Write;

use mtp_cfg::Configuration;

use crate::util::text::{or_dash, truncate, yes_no};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

/// Rows shown before the frame table is cut short.
const MAX_FRAME_ROWS: usize = 20;
const MAX_SPECIES_ROWS: usize = 15;

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Column {
    title: &'static str,
    width: usize,
    align: Align,
}

impl Column {
    const fn left(title: &'static str, width: usize) -> Self {
        Self {
            title,
            width,
            align: Align::Left,
        }
    }

    const fn right(title: &'static str, width: usize) -> Self {
        Self {
            title,
            width,
            align: Align::Right,
        }
    }

    fn cell(&self, value: &str) -> String {
        let value = truncate(value, self.width);
        match self.align {
            Align::Left => format!("{:<w$}", value, w = self.width),
            Align::Right => format!("{:>w$}", value, w = self.width),
        }
    }
}

fn rule(columns: &[Column], left: &str, mid: &str, right: &str) -> String {
    let inner: Vec<String> = columns.iter().map(|c| "─".repeat(c.width + 2)).collect();
    format!("{INDENT}{left}{}{right}", inner.join(mid))
}

fn row(columns: &[Column], values: &[String]) -> String {
    let cells: Vec<String> = columns
        .iter()
        .zip(values)
        .map(|(c, v)| c.cell(v))
        .collect();
    format!("{INDENT}│ {} │", cells.join(" │ "))
}

fn print_grid(out: &mut impl Write, title: &str, columns: &[Column], rows: &[Vec<String>]) {
    let headers: Vec<String> = columns.iter().map(|c| c.title.to_string()).collect();

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", rule(columns, "┌", "┬", "┐"));
    let _ = writeln!(out, "{}", row(columns, &headers));
    let _ = writeln!(out, "{}", rule(columns, "├", "┼", "┤"));
    for values in rows {
        let _ = writeln!(out, "{}", row(columns, values));
    }
    let _ = writeln!(out, "{}", rule(columns, "└", "┴", "┘"));
}

/// One line of the per-frame table.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub index: usize,
    pub atoms: usize,
    pub pbc: [bool; 3],
    pub energy: Option<f64>,
    pub forces: bool,
    pub stress: bool,
    pub identification: Option<i64>,
}

impl FrameSummary {
    pub fn new(index: usize, config: &Configuration) -> Self {
        Self {
            index,
            atoms: config.atom_count(),
            pbc: config.pbc(),
            energy: config.energy,
            forces: config.has_forces(),
            stress: config.stress.is_some(),
            identification: config.identification,
        }
    }
}

fn pbc_flags(pbc: [bool; 3]) -> String {
    pbc.iter().map(|&p| if p { 'T' } else { 'F' }).collect()
}

pub fn print_frame_table(out: &mut impl Write, frames: &[FrameSummary]) {
    const COLUMNS: [Column; 7] = [
        Column::right("#", 5),
        Column::right("Atoms", 6),
        Column::left("PBC", 3),
        Column::right("Energy", 12),
        Column::left("F", 3),
        Column::left("S", 3),
        Column::right("ID", 6),
    ];

    let mut rows: Vec<Vec<String>> = frames
        .iter()
        .take(MAX_FRAME_ROWS)
        .map(|f| {
            vec![
                (f.index + 1).to_string(),
                f.atoms.to_string(),
                pbc_flags(f.pbc),
                or_dash(f.energy.map(|e| format!("{e:.6}"))),
                yes_no(f.forces).to_string(),
                yes_no(f.stress).to_string(),
                or_dash(f.identification),
            ]
        })
        .collect();

    if frames.len() > MAX_FRAME_ROWS {
        let mut more = vec!["...".to_string(); COLUMNS.len()];
        more[3] = format!("+{} frames", frames.len() - MAX_FRAME_ROWS);
        rows.push(more);
    }

    print_grid(out, "Frames", &COLUMNS, &rows);
}

pub fn print_stream_summary(out: &mut impl Write, frames: &[FrameSummary]) {
    let total_atoms: usize = frames.iter().map(|f| f.atoms).sum();
    let min_atoms = frames.iter().map(|f| f.atoms).min();
    let max_atoms = frames.iter().map(|f| f.atoms).max();
    let count = |pred: fn(&FrameSummary) -> bool| frames.iter().filter(|f| pred(f)).count();

    let mut rank_counts: BTreeMap<usize, usize> = BTreeMap::new();
    for frame in frames {
        let rank = frame.pbc.iter().filter(|&&p| p).count();
        *rank_counts.entry(rank).or_insert(0) += 1;
    }
    let ranks = rank_counts
        .iter()
        .map(|(rank, n)| format!("{rank}D×{n}"))
        .collect::<Vec<_>>()
        .join(" ");

    let rows = vec![
        ("Frames", frames.len().to_string()),
        ("Total Atoms", total_atoms.to_string()),
        (
            "Atoms / Frame",
            match (min_atoms, max_atoms) {
                (Some(lo), Some(hi)) if lo == hi => lo.to_string(),
                (Some(lo), Some(hi)) => format!("{lo} – {hi}"),
                _ => "-".to_string(),
            },
        ),
        ("Periodicity", if ranks.is_empty() { "-".into() } else { ranks }),
        ("With Energy", count(|f| f.energy.is_some()).to_string()),
        ("With Forces", count(|f| f.forces).to_string()),
        ("With Stress", count(|f| f.stress).to_string()),
        ("With ID", count(|f| f.identification.is_some()).to_string()),
    ];

    print_kv_table(out, "Stream Summary", &rows);
}

/// `counts` is ordered by descending count by the caller.
pub fn print_species_distribution(out: &mut impl Write, counts: &[(String, usize)]) {
    let total: usize = counts.iter().map(|(_, n)| n).sum();

    let name_w = 10usize;
    let count_w = 8usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);
    let max_bar_width = dist_w.saturating_sub(8).min(20);

    let columns = [
        Column::left("Species", name_w),
        Column::right("Atoms", count_w),
        Column::left("Distribution", dist_w),
    ];

    let mut rows: Vec<Vec<String>> = counts
        .iter()
        .take(MAX_SPECIES_ROWS)
        .map(|(name, count)| {
            let pct = if total == 0 {
                0.0
            } else {
                (*count as f64 / total as f64) * 100.0
            };
            vec![
                name.clone(),
                count.to_string(),
                format!("{}  {:>5.1}%", make_bar(pct, max_bar_width), pct),
            ]
        })
        .collect();

    if counts.len() > MAX_SPECIES_ROWS {
        rows.push(vec![
            "...".to_string(),
            "...".to_string(),
            format!("({} more species)", counts.len() - MAX_SPECIES_ROWS),
        ]);
    }

    print_grid(out, "Species Distribution", &columns, &rows);
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let columns = [Column::left("Metric", key_w), Column::right("Value", val_w)];
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|(key, val)| vec![key.to_string(), val.clone()])
        .collect();

    print_grid(out, title, &columns, &rows);
}

fn make_bar(pct: f64, max_width: usize) -> String {
    let filled = ((pct / 100.0) * max_width as f64).round() as usize;
    let empty = max_width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
