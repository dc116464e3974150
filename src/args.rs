use clap::{value_parser, Arg, ArgMatches, Command};

use crate::scale::{TuningParams, PRESETS};

pub fn parse_args() -> ArgMatches {
    Command::new("edo-tuner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compute and audition equal-division-of-the-octave scales.")
        .args([
            Arg::new("base-frequency")
                .short('b')
                .long("base-frequency")
                .help("Base frequency of the scale in Hz (50-2000)")
                .value_parser(value_parser!(f32))
                .default_value("440"),
            Arg::new("divisions")
                .short('d')
                .long("divisions")
                .help("Equal divisions per octave (5-53)")
                .value_parser(value_parser!(i64))
                .default_value("12"),
            Arg::new("notes")
                .short('n')
                .long("notes")
                .help("Number of scale steps to derive (1-divisions)")
                .value_parser(value_parser!(i64))
                .default_value("12"),
            Arg::new("preset")
                .short('p')
                .long("preset")
                .help("Preset name setting the division count, overrides -d (ex: `19-EDO`)"),
            Arg::new("output-device")
                .short('o')
                .long("output-device")
                .help("Output device to play through, matched by name similarity")
                .default_value("default"),
        ])
        .get_matches()
}

/// Builds the starting tuning parameters from the command line.
/// Out of range values are clamped by [`TuningParams`], never rejected.
pub fn initial_params(args: &ArgMatches) -> TuningParams {
    let mut params = TuningParams::new(
        *args.get_one::<f32>("base-frequency").unwrap(),
        *args.get_one::<i64>("divisions").unwrap(),
        *args.get_one::<i64>("notes").unwrap(),
    );

    if let Some(preset) = args.get_one::<String>("preset") {
        let wanted = preset.to_lowercase();
        let found = PRESETS
            .iter()
            .find(|(name, _)| name.to_lowercase().contains(&wanted));

        match found {
            Some((_, divisions)) => params.set_divisions(*divisions as i64),
            None => eprintln!("[-] Unknown preset `{preset}`, ignoring"),
        }
    }

    params
}
