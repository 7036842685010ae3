use std::env;
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    process::exit(awaken::cli::run_with_args(&args));
}
