use std::process::exit;

use log::error;

fn main() {
    let args = nanoinit::cli::get_args();

    match nanoinit::run(args) {
        Ok(code) => exit(code),
        Err(err) => {
            error!("{}", err);
            exit(1);
        }
    }
}
