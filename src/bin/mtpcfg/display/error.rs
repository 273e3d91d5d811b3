use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    if let Some(hints) = HintCollector::collect(err) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn new() -> Self {
        Self {
            hints: Vec::new(),
            has_typed_hints: false,
        }
    }

    fn collect(err: &Error) -> Option<Vec<String>> {
        let mut collector = Self::new();

        collector.collect_codec_hints(err);
        collector.collect_type_map_hints(err);

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        if collector.hints.is_empty() {
            None
        } else {
            Some(collector.hints)
        }
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_codec_hints(&mut self, err: &Error) {
        use mtp_cfg::io::{Error as CfgError, State};

        let Some(cfg_err) = err.chain().find_map(|e| e.downcast_ref::<CfgError>()) else {
            return;
        };

        self.mark_typed();

        match cfg_err {
            CfgError::Io { source } => {
                self.collect_std_io_hints(source);
            }

            CfgError::Malformed { line, state, .. } => {
                self.add(format!(
                    "Reader stopped at line {} while in the {} section",
                    line, state
                ));
                self.add("Inspect the file around that line for a truncated or misplaced record");
                match state {
                    State::None => {
                        self.add("Every record must sit between BEGIN_CFG and END_CFG");
                    }
                    State::Size => {
                        self.add("Size must be followed by a positive integer atom count");
                    }
                    State::Cell => {
                        self.add("Supercell holds at most three rows of three numbers");
                    }
                    State::Atom => {
                        self.add("AtomData rows need id, type and three coordinates, plus fx fy fz when declared");
                        self.add("The number of rows must match the Size value");
                    }
                    State::Stress => {
                        self.add("PlusStress needs exactly six values: xx yy zz yz xz xy");
                    }
                    _ => {}
                }
            }

            CfgError::UnknownTypeId { type_id, .. } => {
                self.add(format!("Type ID {} has no species label", type_id));
                self.add("Extend --types or the [types] table of --type-map to cover it");
                self.add("--types numbers labels from 1 in the order given");
            }

            CfgError::UnknownSpecies { label, .. } => {
                self.add(format!("Species '{}' has no type ID", label));
                self.add("Add it to --types or to the [types] table of --type-map");
            }

            CfgError::InvalidConfiguration { source, .. } => {
                self.add(format!("Configuration rejected: {}", source));
                self.add("Check that positions, species and forces have one entry per atom");
            }
        }
    }

    fn collect_type_map_hints(&mut self, err: &Error) {
        use mtp_cfg::TypeMapError;

        let Some(map_err) = err.chain().find_map(|e| e.downcast_ref::<TypeMapError>()) else {
            return;
        };

        self.mark_typed();

        match map_err {
            TypeMapError::Io(source) => {
                self.collect_std_io_hints(source);
            }

            TypeMapError::Parse(_) => {
                self.add("Type map file has invalid TOML syntax");
                self.add("Expected a [types] table such as: Si = 1, O = 2");
            }

            TypeMapError::EmptyLabel => {
                self.add("A species label is empty");
                self.add("Check for doubled or trailing commas in --types");
            }

            TypeMapError::DuplicateLabel(label) => {
                self.add(format!("Species '{}' is listed more than once", label));
            }

            TypeMapError::DuplicateTypeId { type_id, .. } => {
                self.add(format!("Type ID {} is assigned to two species", type_id));
                self.add("Each species needs its own type ID");
            }
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }

            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }

            ErrorKind::InvalidData => {
                self.add("File contains invalid data (not UTF-8 text?)");
                self.add("Verify the file is a CFG text file and not truncated");
            }

            ErrorKind::WriteZero => {
                self.add("Failed to write data (disk full?)");
                self.add("Check available disk space");
            }

            ErrorKind::BrokenPipe => {
                self.add("Output consumer terminated before all frames were written");
            }

            _ => {
                self.add("I/O operation failed");
                self.add("Check file path, permissions, and disk space");
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("stdin") || msg.contains("terminal") {
            self.add("Provide input via -i/--input or pipe a CFG stream to stdin");
            return;
        }

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("Check that the file path is correct");
            self.add("Verify the file exists and is readable");
            return;
        }

        if msg.contains("type map") || msg.contains("--types") {
            self.add("Pass --types Si,O or --type-map types.toml");
        }
    }
}

fn error_chain_text(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}
