use clap::{App, Arg, ArgMatches};

#[derive(Debug)]
pub struct Args {
    pub commands: Vec<String>,
    pub mount_proc: bool,
    pub debug: bool,
}

fn app() -> App<'static, 'static> {
    App::new("nanoinit")
        .version(crate_version!())
        .about("Minimal init for process-namespace containers")
        .arg(Arg::with_name("withproc")
                 .help("Mount /proc inside the container (Docker doesn't need this)")
                 .long("withproc"))
        .arg(Arg::with_name("verbose")
                 .help("Print debugging messages to stderr")
                 .short("v")
                 .long("verbose"))
        .arg(Arg::with_name("command")
                 .help("Executable to launch, one process per argument")
                 .multiple(true)
                 .required(true))
}

pub fn get_args() -> Args {
    parse(&app().get_matches())
}

fn parse(args: &ArgMatches) -> Args {
    let commands = values_t!(args.values_of("command"), String).unwrap_or_else(|e| e.exit());

    Args {
        commands,
        mount_proc: args.is_present("withproc"),
        debug: args.is_present("verbose"),
    }
}
