fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = pianola::cli::parse_args(&args).and_then(pianola::cli::run);
    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
