use seamblend::dump::{dump_level, ensure_dir, load_rgb, save};
use seamblend::{
    feather_blend, make_soft_masks, mean_abs_difference, BlendOptions, Device, MultibandBlender,
    Result,
};
use std::process;

extern crate clap;
extern crate env_logger;
extern crate log;

use clap::{App, Arg, ArgMatches};
use log::{error, info};

fn parse_number<T: std::str::FromStr>(value: String) -> std::result::Result<(), String> {
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|_| format!("'{}' is not a valid number", value))
}

fn options_from(matches: &ArgMatches) -> Result<BlendOptions> {
    let defaults = BlendOptions::default();
    let options = BlendOptions {
        levels: matches
            .value_of("levels")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.levels),
        overlap_width: matches
            .value_of("overlap")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.overlap_width),
    };
    options.validate()?;
    Ok(options)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let options = options_from(matches)?;
    let device = Device::detect()?;

    // Both are required arguments; clap has already rejected a missing one.
    let left_path = matches.value_of("left").unwrap_or_default();
    let right_path = matches.value_of("right").unwrap_or_default();
    let left = load_rgb(left_path)?;
    let right = load_rgb(right_path)?;

    let masks = make_soft_masks(&left, &right, options.overlap_width)?;
    if let Some(dir) = matches.value_of("masks-dir") {
        let dir = ensure_dir(dir)?;
        save(&masks.left, dir.join("mask_left.png"))?;
        save(&masks.right, dir.join("mask_right.png"))?;
    }

    let blender = MultibandBlender::new(device, options.levels)?;
    let dump_dir = match matches.value_of("dump-dir") {
        Some(dir) => Some(ensure_dir(dir)?),
        None => None,
    };
    let mut dump_failure = None;
    let blended = blender.blend_with(&left, &right, &masks.left, |index, level| {
        if dump_failure.is_some() {
            return;
        }
        if let Some(dir) = &dump_dir {
            if let Err(err) = dump_level(dir, "blended", index, level) {
                dump_failure = Some(err);
            }
        }
    })?;
    if let Some(err) = dump_failure {
        return Err(err);
    }

    let output = matches.value_of("output").unwrap_or("blended.png");
    save(&blended, output)?;
    info!("wrote {}", output);

    if let Some(path) = matches.value_of("feather") {
        let feathered = feather_blend(&left, &right, &masks)?;
        save(&feathered.image, path)?;
        let difference = mean_abs_difference(&blended, &feathered.image)?;
        info!(
            "wrote {}; mean difference to multiband: {:.3} levels",
            path, difference
        );
    }
    Ok(())
}

fn main() {
    let matches = App::new("seamblend")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Multiband blending of two images across a vertical seam")
        .arg(
            Arg::with_name("left")
                .help("The image on the left of the seam")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("right")
                .help("The image on the right of the seam")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("output")
                .help("Where to write the blended image")
                .short("o")
                .long("output")
                .takes_value(true)
                .default_value("blended.png"),
        )
        .arg(
            Arg::with_name("levels")
                .help("Number of pyramid levels")
                .short("l")
                .long("levels")
                .takes_value(true)
                .validator(parse_number::<usize>),
        )
        .arg(
            Arg::with_name("overlap")
                .help("Width in columns of the blend band")
                .short("w")
                .long("overlap")
                .takes_value(true)
                .validator(parse_number::<u32>),
        )
        .arg(
            Arg::with_name("feather")
                .help("Also write a single-band feather blend here, for comparison")
                .long("feather")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("dump-dir")
                .help("Write every blended pyramid level into this directory")
                .long("dump-dir")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("masks-dir")
                .help("Write the seam masks into this directory")
                .long("masks-dir")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .help("More logging; repeat for more")
                .short("v")
                .multiple(true),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(&matches) {
        error!("{}", err);
        process::exit(1);
    }
}
