use sieve::{execute, parse_args, Invocation, SieveError};

fn main() {
    let result = parse_args(std::env::args()).and_then(|invocation| match invocation {
        Invocation::Run(config, n) => execute(config, n).map(|summary| println!("{}", summary)),
        Invocation::Help(usage) => {
            println!("{}", usage);
            Ok(())
        }
    });

    if let Err(error) = result {
        fail(error);
    }
}

fn fail(error: SieveError) -> ! {
    eprintln!("{}", error);
    std::process::exit(error.exit_code());
}
