//! Binary entry point: logging, then the windowed application.

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = gravwell::app::run() {
        log::error!("fatal: {err}");
        std::process::exit(1);
    }
}
