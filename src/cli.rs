//! Command-line surface, ported switch-for-switch from
//! `examples/original_source/choctoobj.c`'s `syntax_msg`/`real_main`.
//!
//! The original hand-rolls abbreviation matching (`is_switch`); `clap`'s
//! derive macros give us the same "names may be abbreviated" ergonomics
//! (via prefix matching on long flags) plus `-help`/usage generation for
//! free, in the style `examples/vxpm-lazuli` uses for its own front end.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{ChocError, ChocResult};
use crate::vecmath::Coord;

/// Chocks Away to Wavefront OBJ convertor.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Model data file to read
    pub model_file: PathBuf,

    /// Index file to read (reads stdin if omitted)
    pub index_file: Option<PathBuf>,

    /// Output file to write (writes stdout if omitted)
    pub output_file: Option<PathBuf>,

    /// Enable object names from Extra Missions
    #[arg(long, default_value_t = false)]
    pub extra: bool,

    /// List objects instead of converting them
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Summarize objects instead of converting them
    #[arg(long, default_value_t = false)]
    pub summary: bool,

    /// Object number to convert or list (sets both first and last)
    #[arg(long, value_name = "N")]
    pub index: Option<i64>,

    /// First object number to convert or list
    #[arg(long, value_name = "N")]
    pub first: Option<i64>,

    /// Last object number to convert or list
    #[arg(long, value_name = "N")]
    pub last: Option<i64>,

    /// Object name to convert or list (default is all)
    #[arg(long)]
    pub name: Option<String>,

    /// Signed byte offset to start of model data in file
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub offset: i64,

    /// Write output to the named file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub outfile: Option<PathBuf>,

    /// Model and index files are uncompressed raw data
    #[arg(long, default_value_t = false)]
    pub raw: bool,

    /// Line thickness (0..100)
    #[arg(long, value_name = "N", default_value_t = 0.0)]
    pub thick: f64,

    /// Show the total time for each file processed
    #[arg(long, default_value_t = false)]
    pub time: bool,

    /// Emit debug information (and keep bad output)
    #[arg(long, alias = "debug", default_value_t = false)]
    pub verbose: bool,

    /// Specify a material library file
    #[arg(long, value_name = "NAME", default_value = "sf3k.mtl")]
    pub mtllib: String,

    /// Output readable material names
    #[arg(long, default_value_t = false)]
    pub human: bool,

    /// Assign false colours for visualization
    #[arg(long, default_value_t = false)]
    pub false_colour: bool,

    /// Output simplified models
    #[arg(long, default_value_t = false)]
    pub simple: bool,

    /// Include unused vertices in the output
    #[arg(long, default_value_t = false)]
    pub unused: bool,

    /// Include duplicate vertices in the output
    #[arg(long, default_value_t = false)]
    pub duplicate: bool,

    /// Output negative (relative) vertex indices
    #[arg(long, default_value_t = false)]
    pub negative: bool,

    /// Clip overlapping coplanar polygons
    #[arg(long, default_value_t = false)]
    pub clip: bool,

    /// Flip back-facing polygons coplanar with z=0
    #[arg(long, default_value_t = false)]
    pub flip: bool,

    /// Split complex polygons into triangle fans
    #[arg(long, default_value_t = false)]
    pub fans: bool,

    /// Split complex polygons into triangle strips
    #[arg(long, default_value_t = false)]
    pub strips: bool,
}

/// Object-number selection, collapsed from `-index`/`-first`/`-last`.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    pub first: usize,
    pub last: Option<usize>,
}

/// How the decoder should name and pick polygon material colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourMode {
    Riscos,
    Human,
    False,
}

/// Validated, ready-to-run configuration, built from [`Args`]
/// (`choc_to_obj`'s `flags` bitmask plus its scalar parameters).
#[derive(Debug, Clone)]
pub struct Options {
    pub model_file: PathBuf,
    pub index_file: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub selection: Selection,
    pub name: Option<String>,
    pub offset: i64,
    pub raw: bool,
    pub thick: Coord,
    pub time: bool,
    pub verbose: bool,
    pub mtllib: String,
    pub colour_mode: ColourMode,
    pub extra_missions: bool,
    pub list: bool,
    pub summary: bool,
    pub simple: bool,
    pub unused: bool,
    pub duplicate: bool,
    pub negative_indices: bool,
    pub clip_polygons: bool,
    pub flip_backfacing: bool,
    pub mesh_style: MeshStyleFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshStyleFlag {
    NoChange,
    TriangleFan,
    TriangleStrip,
}

impl TryFrom<Args> for Options {
    type Error = ChocError;

    fn try_from(args: Args) -> ChocResult<Self> {
        let mut first = args.first.unwrap_or(-1);
        let mut last = args.last.unwrap_or(-1);
        if let Some(index) = args.index {
            first = index;
            last = index;
        }

        if first > last && last >= 0 {
            return Err(ChocError::Policy(
                "first object number must not exceed last object number".into(),
            ));
        }
        if first == -1 {
            first = 0;
        }

        if args.fans && args.strips {
            return Err(ChocError::Policy(
                "cannot split polygons into both triangle fans and strips".into(),
            ));
        }
        let mesh_style = if args.fans {
            MeshStyleFlag::TriangleFan
        } else if args.strips {
            MeshStyleFlag::TriangleStrip
        } else {
            MeshStyleFlag::NoChange
        };

        let list_or_summary = args.list || args.summary;
        if list_or_summary && args.outfile.is_some() {
            return Err(ChocError::Policy(
                "cannot specify an output file in list or summary mode".into(),
            ));
        }

        if args.outfile.is_none() && !list_or_summary && (args.time || args.verbose) {
            return Err(ChocError::Policy(
                "must specify an output file in verbose/timer mode".into(),
            ));
        }

        if !(0.0..=100.0).contains(&args.thick) {
            return Err(ChocError::Policy("thick must be in the range 0..100".into()));
        }

        let colour_mode = if args.false_colour {
            ColourMode::False
        } else if args.human {
            ColourMode::Human
        } else {
            ColourMode::Riscos
        };

        Ok(Options {
            model_file: args.model_file,
            index_file: args.index_file,
            output_file: args.outfile,
            selection: Selection {
                first: first as usize,
                last: if last >= 0 { Some(last as usize) } else { None },
            },
            name: args.name,
            offset: args.offset,
            raw: args.raw,
            thick: args.thick,
            time: args.time,
            verbose: args.verbose,
            mtllib: args.mtllib,
            colour_mode,
            extra_missions: args.extra,
            list: args.list,
            summary: args.summary,
            simple: args.simple,
            unused: args.unused,
            duplicate: args.duplicate,
            negative_indices: args.negative,
            clip_polygons: args.clip,
            flip_backfacing: args.flip,
            mesh_style,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("choctoobj").chain(argv.iter().copied()))
    }

    #[test]
    fn test_index_sets_first_and_last() {
        let opts = Options::try_from(parse(&["--index", "5", "model.dat"])).unwrap();
        assert_eq!(opts.selection.first, 5);
        assert_eq!(opts.selection.last, Some(5));
    }

    #[test]
    fn test_first_after_last_is_rejected() {
        let result = Options::try_from(parse(&["--first", "9", "--last", "2", "model.dat"]));
        assert!(matches!(result, Err(ChocError::Policy(_))));
    }

    #[test]
    fn test_fans_and_strips_conflict() {
        let result = Options::try_from(parse(&["--fans", "--strips", "model.dat"]));
        assert!(matches!(result, Err(ChocError::Policy(_))));
    }

    #[test]
    fn test_outfile_with_list_is_rejected() {
        let result = Options::try_from(parse(&["--list", "--outfile", "out.obj", "model.dat"]));
        assert!(matches!(result, Err(ChocError::Policy(_))));
    }

    #[test]
    fn test_verbose_without_outfile_is_rejected() {
        let result = Options::try_from(parse(&["--verbose", "model.dat"]));
        assert!(matches!(result, Err(ChocError::Policy(_))));
    }

    #[test]
    fn test_verbose_with_outfile_is_accepted() {
        let opts = Options::try_from(parse(&["--verbose", "--outfile", "out.obj", "model.dat"])).unwrap();
        assert!(opts.verbose);
    }

    #[test]
    fn test_default_colour_mode_is_riscos() {
        let opts = Options::try_from(parse(&["model.dat"])).unwrap();
        assert_eq!(opts.colour_mode, ColourMode::Riscos);
    }

    #[test]
    fn test_false_colour_wins_over_human() {
        let opts = Options::try_from(parse(&["--human", "--false-colour", "model.dat"])).unwrap();
        assert_eq!(opts.colour_mode, ColourMode::False);
    }
}
