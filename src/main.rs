fn main() {
    if let Err(e) = blockscript::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
