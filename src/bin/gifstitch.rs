use clap::{crate_name, crate_version, value_parser, Arg, ArgAction, Command};

use gifstitch::progress::{NoProgress, ProgressReporter};
use gifstitch::{Settings, NAMED_BACKGROUNDS};
use pbr::ProgressBar;
use rgb::RGB8;

use std::env;
use std::error::Error;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

fn bin_main() -> BinResult<()> {
    let matches = Command::new(crate_name!())
                        .version(crate_version!())
                        .about("Stitches ordered PNG stills into a looping animated GIF")
                        .arg_required_else_help(true)
                        .arg(Arg::new("output")
                            .long("output")
                            .short('o')
                            .help("Destination file to write to; \"-\" means stdout")
                            .value_name("out.gif")
                            .value_parser(value_parser!(OsString))
                            .required(true))
                        .arg(Arg::new("delay")
                            .long("delay")
                            .short('d')
                            .help("How long every frame stays on screen, in milliseconds")
                            .value_name("ms")
                            .value_parser(value_parser!(u32).range(100..=10_000))
                            .default_value("1000"))
                        .arg(Arg::new("bg")
                            .long("bg")
                            .help("Canvas fill behind frames that don't cover the whole canvas: \
                                   white, black, blue, red, green, gray, or #rrggbb")
                            .value_name("color")
                            .default_value("white"))
                        .arg(Arg::new("nosort")
                            .long("no-sort")
                            .action(ArgAction::SetTrue)
                            .help("Use files exactly in the order given, rather than sorted"))
                        .arg(Arg::new("quiet")
                            .long("quiet")
                            .short('q')
                            .action(ArgAction::SetTrue)
                            .help("Do not display anything on standard output/console"))
                        .arg(Arg::new("FILE")
                            .help("PNG image files, one per animation frame")
                            .num_args(1..)
                            .required(true))
                        .get_matches_from(wild::args_os());

    let mut frames: Vec<&str> = matches.get_many::<String>("FILE").ok_or("Missing files")?.map(String::as_str).collect();
    if !matches.get_flag("nosort") {
        frames.sort_by(|a, b| natord::compare(a, b));
    }
    let frames: Vec<PathBuf> = frames.into_iter().map(PathBuf::from).collect();

    let output_path = DestPath::new(matches.get_one::<OsString>("output").ok_or("Missing output")?);
    let delay_ms = *matches.get_one::<u32>("delay").ok_or("Missing delay")?;
    let background = parse_background(matches.get_one::<String>("bg").ok_or("Missing background")?)?;
    let quiet = matches.get_flag("quiet") || output_path == DestPath::Stdout;

    check_if_paths_exist(&frames)?;
    for path in &frames {
        match file_type(path)? {
            FileType::PNG => {},
            FileType::JPEG => return Err("JPEG format is unsuitable for conversion to GIF.\n\n\
                JPEG's compression artifacts and color space are very problematic for palette-based\n\
                compression. Please re-export your frames using the PNG format.".into()),
            FileType::Other => return Err(format!("\"{}\" is not a PNG file", path.display()).into()),
        }
    }

    let settings = Settings { delay_ms, background };

    let mut pb;
    let mut nopb = NoProgress {};
    let progress: &mut dyn ProgressReporter = if quiet {
        &mut nopb
    } else {
        pb = ProgressBar::new(frames.len() as u64);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.format(" #_. ");
        pb.message("Frame ");
        pb.set_max_refresh_rate(Some(Duration::from_millis(250)));
        &mut pb
    };

    let (collector, writer) = gifstitch::new(settings)?;
    for (frame_index, path) in frames.iter().enumerate() {
        collector.add_frame_png_file(frame_index, path.clone())?;
    }
    drop(collector);

    match output_path {
        DestPath::Path(p) => {
            let file = File::create(p)
                .map_err(|e| format!("Can't write to {}: {}", p.display(), e))?;
            if let Err(e) = writer.write(BufWriter::new(file), progress) {
                let _ = fs::remove_file(p);
                return Err(e.into());
            }
        },
        DestPath::Stdout => {
            writer.write(io::stdout().lock(), progress)?;
        },
    };
    progress.done(&format!("gifstitch created {output_path}"));

    Ok(())
}

enum FileType {
    PNG, JPEG, Other,
}

fn file_type(path: &Path) -> BinResult<FileType> {
    let mut file = File::open(path)
        .map_err(|e| format!("Can't open {}: {}", path.display(), e))?;
    let mut buf = [0; 4];
    file.read_exact(&mut buf)?;

    if &buf == b"\x89PNG" {
        return Ok(FileType::PNG);
    }
    if buf[..2] == [0xFF, 0xD8] {
        return Ok(FileType::JPEG);
    }
    Ok(FileType::Other)
}

fn check_if_paths_exist(paths: &[PathBuf]) -> BinResult<()> {
    for path in paths {
        if !path.exists() {
            let mut msg = format!("Unable to find the input file: \"{}\"", path.display());
            if path.to_str().map_or(false, |p| p.contains('*')) {
                msg += "\nThe path contains a literal \"*\" character. If you want to select multiple files, don't put the special wildcard characters in quotes.";
            } else if path.is_relative() {
                msg += &format!(" (searched in \"{}\")", env::current_dir()?.display());
            }
            return Err(msg.into());
        }
    }
    Ok(())
}

fn parse_background(color: &str) -> BinResult<RGB8> {
    let color = color.trim();
    if let Some((_, rgb)) = NAMED_BACKGROUNDS.iter().find(|(name, _)| name.eq_ignore_ascii_case(color)) {
        return Ok(*rgb);
    }
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() == 6 && hex.is_char_boundary(2) && hex.is_char_boundary(4) {
            let r = u8::from_str_radix(&hex[0..2], 16)?;
            let g = u8::from_str_radix(&hex[2..4], 16)?;
            let b = u8::from_str_radix(&hex[4..6], 16)?;
            return Ok(RGB8 { r, g, b });
        }
    }
    Err(format!("Invalid background color \"{color}\". Use one of white/black/blue/red/green/gray, or #rrggbb").into())
}

#[derive(PartialEq)]
enum DestPath<'a> {
    Path(&'a Path),
    Stdout,
}

impl<'a> DestPath<'a> {
    pub fn new(path: &'a OsStr) -> Self {
        if path == "-" {
            Self::Stdout
        } else {
            Self::Path(Path::new(path))
        }
    }
}

impl fmt::Display for DestPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Path(orig_path) => {
                let abs_path = dunce::canonicalize(orig_path);
                abs_path.as_ref().map(|p| p.as_path()).unwrap_or(orig_path).display().fmt(f)
            },
            Self::Stdout => f.write_str("stdout"),
        }
    }
}
