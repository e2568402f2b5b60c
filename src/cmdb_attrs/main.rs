mod cli;

fn main() {
    if let Err(e) = cli::run() {
        cli::print_error(&e.to_string());
        std::process::exit(1);
    }
}
